use egui::{Color32, CornerRadius, Stroke};
use flamelens_core::Theme;
use flamelens_protocol::{Color, ThemeMode, ThemeToken};

pub fn to_color32(color: Color) -> Color32 {
    let [r, g, b, a] = color.to_array().map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8);
    Color32::from_rgba_unmultiplied(r, g, b, a)
}

pub fn resolve(theme: &Theme, token: ThemeToken) -> Color32 {
    to_color32(theme.resolve(token))
}

// ── Typography scale ───────────────────────────────────────────────────────

pub const FONT_TITLE: f32 = 18.0;
pub const FONT_BODY: f32 = 12.0;
pub const FONT_CAPTION: f32 = 11.0;

/// Height of one flamegraph row in logical points.
pub const ROW_HEIGHT: f32 = 20.0;

// ── egui visual presets ────────────────────────────────────────────────────

/// Widget colors that have no theme token of their own.
struct WidgetShades {
    inactive: Color32,
    hovered: Color32,
    stroke: Color32,
}

fn shades(mode: ThemeMode) -> WidgetShades {
    match mode {
        // Catppuccin Mocha Surface1, Surface2, Subtext1
        ThemeMode::Dark => WidgetShades {
            inactive: Color32::from_rgb(0x45, 0x47, 0x5a),
            hovered: Color32::from_rgb(0x58, 0x5b, 0x70),
            stroke: Color32::from_rgb(0xba, 0xc2, 0xde),
        },
        ThemeMode::Light => WidgetShades {
            inactive: Color32::from_rgb(230, 230, 235),
            hovered: Color32::from_rgb(220, 220, 228),
            stroke: Color32::from_rgb(60, 60, 70),
        },
    }
}

/// egui visuals matching the flamegraph palette of `theme`.
pub fn visuals(theme: &Theme) -> egui::Visuals {
    let mut v = match theme.mode {
        ThemeMode::Dark => egui::Visuals::dark(),
        ThemeMode::Light => egui::Visuals::light(),
    };
    let shades = shades(theme.mode);
    let accent = resolve(theme, ThemeToken::FlameCold);

    v.panel_fill = resolve(theme, ThemeToken::StatusBarBackground);
    v.window_fill = resolve(theme, ThemeToken::TooltipBackground);
    v.extreme_bg_color = resolve(theme, ThemeToken::Background);
    v.faint_bg_color = resolve(theme, ThemeToken::Background);

    v.widgets.noninteractive.fg_stroke = Stroke::new(1.0, shades.stroke);
    v.widgets.noninteractive.bg_stroke = Stroke::new(1.0, shades.inactive);
    v.widgets.inactive.bg_fill = shades.inactive;
    v.widgets.inactive.fg_stroke = Stroke::new(1.0, shades.stroke);
    v.widgets.hovered.bg_fill = shades.hovered;
    v.widgets.hovered.fg_stroke = Stroke::new(1.0, resolve(theme, ThemeToken::TextPrimary));
    v.widgets.active.bg_fill = accent;
    v.widgets.active.fg_stroke = Stroke::new(1.0, resolve(theme, ThemeToken::Background));

    v.selection.bg_fill = resolve(theme, ThemeToken::SelectionHighlight);
    v.selection.stroke = Stroke::new(1.0, accent);
    v.hyperlink_color = accent;
    v.warn_fg_color = resolve(theme, ThemeToken::FlameWarm);
    v.error_fg_color = resolve(theme, ThemeToken::FlameHot);

    v.window_corner_radius = CornerRadius::same(6);
    v.menu_corner_radius = CornerRadius::same(6);
    for widget in [
        &mut v.widgets.noninteractive,
        &mut v.widgets.inactive,
        &mut v.widgets.hovered,
        &mut v.widgets.active,
        &mut v.widgets.open,
    ] {
        widget.corner_radius = CornerRadius::same(5);
    }
    v
}

/// Apply the viewer's typography scale to egui styles.
pub fn apply_typography(ctx: &egui::Context) {
    let mut style = (*ctx.style()).clone();
    style.text_styles.insert(
        egui::TextStyle::Heading,
        egui::FontId::proportional(FONT_TITLE),
    );
    style
        .text_styles
        .insert(egui::TextStyle::Body, egui::FontId::proportional(FONT_BODY));
    style.text_styles.insert(
        egui::TextStyle::Button,
        egui::FontId::proportional(FONT_BODY),
    );
    style.text_styles.insert(
        egui::TextStyle::Small,
        egui::FontId::proportional(FONT_CAPTION),
    );
    style.text_styles.insert(
        egui::TextStyle::Monospace,
        egui::FontId::monospace(FONT_CAPTION),
    );
    style.spacing.item_spacing = egui::vec2(8.0, 6.0);
    style.spacing.button_padding = egui::vec2(8.0, 4.0);
    style.spacing.interact_size.y = 24.0;
    ctx.set_style(style);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opaque_colors_convert_exactly() {
        let c = to_color32(Color::from_rgb8(0x89, 0xb4, 0xfa));
        assert_eq!(c, Color32::from_rgb(0x89, 0xb4, 0xfa));
    }

    #[test]
    fn visuals_follow_mode() {
        assert!(visuals(&Theme::dark()).dark_mode);
        assert!(!visuals(&Theme::light()).dark_mode);
    }
}

use flamelens_protocol::{Color, ThemeMode, ThemeToken};
use serde::{Deserialize, Serialize};

const fn rgb(r: u8, g: u8, b: u8) -> [u8; 4] {
    [r, g, b, 255]
}

const fn rgba(r: u8, g: u8, b: u8, a: u8) -> [u8; 4] {
    [r, g, b, a]
}

fn to_color([r, g, b, a]: [u8; 4]) -> Color {
    Color::from_rgb8(r, g, b).with_alpha(f32::from(a) / 255.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Theme {
    pub mode: ThemeMode,
}

impl Theme {
    pub fn dark() -> Self {
        Self {
            mode: ThemeMode::Dark,
        }
    }

    pub fn light() -> Self {
        Self {
            mode: ThemeMode::Light,
        }
    }

    pub fn resolve(&self, token: ThemeToken) -> Color {
        to_color(match self.mode {
            ThemeMode::Dark => resolve_dark(token),
            ThemeMode::Light => resolve_light(token),
        })
    }

    pub fn flame_palette(&self) -> [Color; 4] {
        ThemeToken::FLAME_PALETTE.map(|token| self.resolve(token))
    }
}

fn resolve_dark(token: ThemeToken) -> [u8; 4] {
    // Catppuccin Mocha palette
    use ThemeToken::*;
    match token {
        FlameHot => rgb(0xf3, 0x8b, 0xa8),     // Red
        FlameWarm => rgb(0xfa, 0xb3, 0x87),    // Peach
        FlameCold => rgb(0x89, 0xb4, 0xfa),    // Blue
        FlameNeutral => rgb(0xcb, 0xa6, 0xf7), // Mauve
        FlameMissing => rgb(0x6c, 0x70, 0x86), // Overlay0

        Background => rgb(0x1e, 0x1e, 0x2e),  // Base

        TextPrimary => rgb(0xcd, 0xd6, 0xf4), // Text
        TextMuted => rgb(0xa6, 0xad, 0xc8),   // Subtext0
        LabelOnFrame => rgb(0x11, 0x11, 0x1b),

        SearchHighlight => rgba(0xf9, 0xe2, 0xaf, 120), // Yellow
        HoverHighlight => rgba(0xcd, 0xd6, 0xf4, 25),
        SelectionHighlight => rgba(0x89, 0xb4, 0xfa, 80),

        TooltipBackground => rgb(0x18, 0x18, 0x25), // Mantle
        StatusBarBackground => rgb(0x18, 0x18, 0x25),
    }
}

fn resolve_light(token: ThemeToken) -> [u8; 4] {
    use ThemeToken::*;
    match token {
        FlameHot => rgb(220, 60, 20),
        FlameWarm => rgb(230, 150, 20),
        FlameCold => rgb(40, 120, 200),
        FlameNeutral => rgb(120, 140, 170),
        FlameMissing => rgb(190, 190, 200),

        Background => rgb(250, 250, 252),

        TextPrimary => rgb(20, 20, 30),
        TextMuted => rgb(100, 100, 110),
        LabelOnFrame => rgb(20, 20, 30),

        SearchHighlight => rgba(255, 200, 50, 100),
        HoverHighlight => rgba(0, 0, 0, 15),
        SelectionHighlight => rgba(66, 135, 245, 60),

        TooltipBackground => rgb(245, 245, 248),
        StatusBarBackground => rgb(240, 240, 245),
    }
}

/// Renderer configuration, loadable from partial JSON.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Outline every frame with a one-pixel border.
    pub draw_border: bool,
    pub clear_color: Color,
    /// Opacity multiplier for frames that miss an active search.
    pub search_dim_alpha: f32,
}

impl RenderOptions {
    pub fn for_theme(theme: &Theme) -> Self {
        Self {
            clear_color: theme.resolve(ThemeToken::Background),
            ..Self::default()
        }
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            draw_border: true,
            clear_color: Theme::default().resolve(ThemeToken::Background),
            search_dim_alpha: 0.35,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modes_resolve_differently() {
        let dark = Theme::dark().resolve(ThemeToken::Background);
        let light = Theme::light().resolve(ThemeToken::Background);
        assert_ne!(dark, light);
        assert_eq!(dark, Color::from_rgb8(0x1e, 0x1e, 0x2e));
    }

    #[test]
    fn alpha_is_normalized() {
        let c = Theme::dark().resolve(ThemeToken::SearchHighlight);
        assert!((c.a - 120.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn options_fill_missing_fields() {
        let opts: RenderOptions = serde_json::from_str(r#"{"draw_border":false}"#).expect("parses");
        assert!(!opts.draw_border);
        assert!((opts.search_dim_alpha - 0.35).abs() < f32::EPSILON);
        assert_eq!(opts.clear_color, RenderOptions::default().clear_color);
    }

    #[test]
    fn theme_defaults_to_dark() {
        let theme: Theme = serde_json::from_str("{}").expect("parses");
        assert_eq!(theme, Theme::dark());
        assert_eq!(RenderOptions::for_theme(&Theme::light()).clear_color, Theme::light().resolve(ThemeToken::Background));
    }
}

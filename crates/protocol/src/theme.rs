use serde::{Deserialize, Serialize};

/// Semantic color tokens resolved by the active theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ThemeToken {
    FlameHot,
    FlameWarm,
    FlameCold,
    FlameNeutral,
    FlameMissing,

    Background,

    TextPrimary,
    TextMuted,
    LabelOnFrame,

    SearchHighlight,
    HoverHighlight,
    SelectionHighlight,

    TooltipBackground,
    StatusBarBackground,
}

impl ThemeToken {
    /// The rotating palette used for frame fills.
    pub const FLAME_PALETTE: [ThemeToken; 4] = [
        ThemeToken::FlameHot,
        ThemeToken::FlameWarm,
        ThemeToken::FlameCold,
        ThemeToken::FlameNeutral,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ThemeMode {
    #[default]
    Dark,
    Light,
}

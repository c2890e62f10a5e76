use std::collections::HashMap;

use flamelens_protocol::{Color, ThemeToken};

use crate::model::{FlattenedFrames, FrameKey};
use crate::theme::Theme;

/// Fill color per frame, with a fallback for frames the map does not know.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorMap {
    colors: HashMap<FrameKey, Color>,
    fallback: Color,
}

impl ColorMap {
    pub fn new(fallback: Color) -> Self {
        Self {
            colors: HashMap::new(),
            fallback,
        }
    }

    /// Cycle the theme's flame palette by stack depth.
    pub fn by_depth(frames: &FlattenedFrames<'_>, theme: &Theme) -> Self {
        let palette = theme.flame_palette();
        let mut map = Self::new(theme.resolve(ThemeToken::FlameMissing));
        for frame in frames.iter() {
            map.insert(frame.key, palette[frame.depth as usize % palette.len()]);
        }
        map
    }

    /// Color by name, so every call to the same function shares a color.
    pub fn by_name(frames: &FlattenedFrames<'_>, theme: &Theme) -> Self {
        let palette = theme.flame_palette();
        let mut map = Self::new(theme.resolve(ThemeToken::FlameMissing));
        for frame in frames.iter() {
            let hash = fnv1a(frame.name.as_str().as_bytes());
            let base = palette[(hash % palette.len() as u64) as usize];
            // 0.75..=1.0 in 16 steps
            let shade = 0.75 + ((hash >> 16) % 16) as f32 / 60.0;
            map.insert(
                frame.key,
                Color::rgba(base.r * shade, base.g * shade, base.b * shade, base.a),
            );
        }
        map
    }

    pub fn insert(&mut self, key: FrameKey, color: Color) {
        self.colors.insert(key, color);
    }

    pub fn get(&self, key: FrameKey) -> Option<Color> {
        self.colors.get(&key).copied()
    }

    pub fn color_for(&self, key: FrameKey) -> Color {
        self.get(key).unwrap_or(self.fallback)
    }

    pub fn fallback(&self) -> Color {
        self.fallback
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0xcbf2_9ce4_8422_2325, |hash, &b| {
        (hash ^ u64::from(b)).wrapping_mul(0x0100_0000_01b3)
    })
}

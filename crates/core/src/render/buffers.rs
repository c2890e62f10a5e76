//! Per-vertex buffer contents. Every frame becomes two triangles covering
//! `[start, end] × [depth, depth + 1]` in config space, so every buffer
//! holds six entries per frame in flattened order.
//!
//! Coordinates are narrowed to `f32`, which keeps about seven significant
//! digits. Frame times are expected relative to the start of the profile
//! (config space begins at 0); absolute epoch timestamps would collapse
//! neighbouring edges and must be rebased by the loader.

use flamelens_protocol::Color;

use crate::colors::ColorMap;
use crate::model::FlattenedFrames;
use crate::search::SearchResults;

pub const VERTICES_PER_FRAME: usize = 6;
pub const POSITION_COMPONENTS: u8 = 2;
pub const BOUNDS_COMPONENTS: u8 = 4;
pub const COLOR_COMPONENTS: u8 = 4;
pub const SEARCH_COMPONENTS: u8 = 1;

/// `N · 12` floats: `(x, y)` for each vertex.
pub fn build_positions(frames: &FlattenedFrames<'_>) -> Vec<f32> {
    let mut out = Vec::with_capacity(frames.len() * VERTICES_PER_FRAME * POSITION_COMPONENTS as usize);
    for frame in frames.iter() {
        let (x0, x1) = (frame.start as f32, frame.end as f32);
        let y0 = frame.depth as f32;
        let y1 = y0 + 1.0;
        out.extend_from_slice(&[x0, y0, x1, y0, x0, y1, x0, y1, x1, y0, x1, y1]);
    }
    out
}

/// `N · 24` floats: the frame box `(left, top, right, bottom)` repeated for
/// each vertex, so the fragment stage sees exact edges.
pub fn build_bounds(frames: &FlattenedFrames<'_>) -> Vec<f32> {
    let mut out = Vec::with_capacity(frames.len() * VERTICES_PER_FRAME * BOUNDS_COMPONENTS as usize);
    for frame in frames.iter() {
        let depth = frame.depth as f32;
        let bounds = [frame.start as f32, depth, frame.end as f32, depth + 1.0];
        for _ in 0..VERTICES_PER_FRAME {
            out.extend_from_slice(&bounds);
        }
    }
    out
}

/// `N · 24` floats of RGBA. Also returns how many frames had no entry in
/// `colors` and got its fallback.
pub fn build_colors(frames: &FlattenedFrames<'_>, colors: &ColorMap) -> (Vec<f32>, usize) {
    let mut out = Vec::with_capacity(frames.len() * VERTICES_PER_FRAME * COLOR_COMPONENTS as usize);
    let mut missing = 0;
    for frame in frames.iter() {
        let color = colors.get(frame.key).unwrap_or_else(|| {
            missing += 1;
            colors.fallback()
        });
        push_color(&mut out, color);
    }
    (out, missing)
}

fn push_color(out: &mut Vec<f32>, color: Color) {
    let rgba = color.to_array();
    for _ in 0..VERTICES_PER_FRAME {
        out.extend_from_slice(&rgba);
    }
}

/// `N · 6` floats, `1.0` on every vertex of a matching frame.
pub fn build_search_flags(frames: &FlattenedFrames<'_>, results: Option<&SearchResults>) -> Vec<f32> {
    let mut out = Vec::with_capacity(frames.len() * VERTICES_PER_FRAME);
    for frame in frames.iter() {
        let hit = results.is_some_and(|r| r.contains(frame.key));
        let flag = if hit { 1.0 } else { 0.0 };
        out.extend_from_slice(&[flag; VERTICES_PER_FRAME]);
    }
    out
}

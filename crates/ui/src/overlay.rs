//! Frame labels, search highlights and hover marks painted with egui on
//! top of the GL frames.

use egui::{Align2, CornerRadius, FontId, Painter, Pos2};
use flamelens_core::search::highlight_ranges;
use flamelens_core::text::fit_text_to_width;
use flamelens_core::{Frame, PhysicalSize, SearchResults, TrimmedText};
use flamelens_protocol::{Mat3, Rect};

/// Frames narrower than this many physical pixels get no label, and
/// neither do their children.
const MIN_LABEL_WIDTH: f64 = 24.0;

/// Text measurements in physical pixels, for a monospace label font.
#[derive(Debug, Clone, Copy)]
pub struct LabelMetrics {
    pub char_width: f64,
    pub padding: f64,
}

#[derive(Debug)]
pub struct FrameLabel<'a> {
    pub frame: &'a Frame,
    /// The frame's box in physical pixels.
    pub rect: Rect,
    pub text: TrimmedText,
    /// Highlighted character ranges of `text`.
    pub highlights: Vec<[usize; 2]>,
}

/// Lay out the label of every frame wide enough to show one.
pub fn layout_labels<'a>(
    roots: &'a [Frame],
    to_physical: &Mat3,
    physical: PhysicalSize,
    metrics: LabelMetrics,
    results: Option<&SearchResults>,
) -> Vec<FrameLabel<'a>> {
    let canvas = physical.to_rect();
    let mut labels = Vec::new();
    let mut stack: Vec<&Frame> = roots.iter().rev().collect();
    while let Some(frame) = stack.pop() {
        let rect = frame.config_rect().transform_rect(to_physical);
        if rect.width < MIN_LABEL_WIDTH || !rect.overlaps_x(&canvas) {
            continue;
        }
        stack.extend(frame.children.iter().rev());
        if !rect.overlaps_y(&canvas) {
            continue;
        }

        // Frames running off the left edge label from the canvas edge.
        let left = rect.left().max(0.0);
        let room = rect.right().min(canvas.right()) - left - 2.0 * metrics.padding;
        let Some(text) = fit_text_to_width(frame.name.as_str(), room, |s| {
            s.chars().count() as f64 * metrics.char_width
        }) else {
            continue;
        };

        let highlights = match results.and_then(|r| r.get(frame.key)) {
            Some(m) => highlight_ranges(&m.ranges, &text.trim).unwrap_or_else(|err| {
                log::warn!("highlight for {:?} dropped: {err}", frame.key);
                Vec::new()
            }),
            None => Vec::new(),
        };

        labels.push(FrameLabel {
            frame,
            rect: Rect::from_bounds(left, rect.top(), rect.right(), rect.bottom()),
            text,
            highlights,
        });
    }
    labels
}

/// Physical-pixel rect to logical egui coordinates inside `canvas`.
pub fn to_logical(rect: &Rect, canvas: egui::Rect, pixels_per_point: f32) -> egui::Rect {
    let point = |x: f64, y: f64| {
        Pos2::new(
            canvas.min.x + x as f32 / pixels_per_point,
            canvas.min.y + y as f32 / pixels_per_point,
        )
    };
    egui::Rect::from_min_max(point(rect.left(), rect.top()), point(rect.right(), rect.bottom()))
}

pub struct LabelPaint {
    pub font: FontId,
    pub text: egui::Color32,
    pub highlight: egui::Color32,
}

pub fn paint_labels(
    painter: &Painter,
    canvas: egui::Rect,
    pixels_per_point: f32,
    metrics: LabelMetrics,
    labels: &[FrameLabel<'_>],
    style: &LabelPaint,
) {
    let char_width = metrics.char_width as f32 / pixels_per_point;
    let padding = metrics.padding as f32 / pixels_per_point;
    for label in labels {
        let rect = to_logical(&label.rect, canvas, pixels_per_point);
        let clip = rect.intersect(canvas);
        if !clip.is_positive() {
            continue;
        }
        let painter = painter.with_clip_rect(clip);
        let text_left = rect.left() + padding;

        for &[start, end] in &label.highlights {
            let span = egui::Rect::from_min_max(
                Pos2::new(text_left + start as f32 * char_width, rect.top() + 2.0),
                Pos2::new(text_left + end as f32 * char_width, rect.bottom() - 2.0),
            );
            painter.rect_filled(span, CornerRadius::same(2), style.highlight);
        }

        painter.text(
            Pos2::new(text_left, rect.center().y),
            Align2::LEFT_CENTER,
            &label.text.text,
            style.font.clone(),
            style.text,
        );
    }
}

/// Tint the hovered frame's box.
pub fn paint_hover(
    painter: &Painter,
    canvas: egui::Rect,
    pixels_per_point: f32,
    frame: &Frame,
    to_physical: &Mat3,
    color: egui::Color32,
) {
    let rect = frame.config_rect().transform_rect(to_physical);
    let rect = to_logical(&rect, canvas, pixels_per_point).intersect(canvas);
    if rect.is_positive() {
        painter.rect_filled(rect, CornerRadius::ZERO, color);
    }
}

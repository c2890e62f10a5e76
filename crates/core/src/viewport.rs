//! The visible region of config space and the zoom strategies that move it.

use std::str::FromStr;

use flamelens_protocol::{Mat3, Point, Rect};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{Frame, FrameTree};
use crate::resize::PhysicalSize;

#[derive(Debug, Error, PartialEq)]
pub enum ViewError {
    #[error("view rect {0:?} has non-numeric geometry")]
    InvalidGeometry(Rect),
    #[error("unknown zoom strategy {0:?}")]
    UnknownStrategy(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

impl Range {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Clamp into `[min, max]`; `max` wins if the range is inverted.
    pub fn clamp(&self, v: f64) -> f64 {
        v.max(self.min).min(self.max)
    }
}

/// Allowed view extents on each axis, in config units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewBounds {
    pub width: Range,
    pub height: Range,
}

impl ViewBounds {
    /// Bounds covering a whole tree: up to its end time horizontally and
    /// every row vertically, zooming in no further than `min_width`.
    pub fn for_tree(tree: &FrameTree, min_width: f64) -> Self {
        let rows = if tree.is_empty() {
            1.0
        } else {
            f64::from(tree.max_depth()) + 1.0
        };
        Self {
            width: Range::new(min_width, tree.end().max(min_width)),
            height: Range::new(1.0, rows),
        }
    }

    pub fn full_rect(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width.max, self.height.max)
    }
}

/// Clamp `requested` so its extents respect `bounds` and it never leaves
/// `[0, max]` on either axis.
pub fn compute_clamped_config_view(requested: &Rect, bounds: &ViewBounds) -> Result<Rect, ViewError> {
    if !requested.is_valid() {
        return Err(ViewError::InvalidGeometry(*requested));
    }

    let width = bounds.width.clamp(requested.width);
    let height = bounds.height.clamp(requested.height);

    let max_x = bounds.width.max - width;
    let max_y = if height >= bounds.height.max {
        0.0
    } else {
        bounds.height.max - height
    };

    let x = requested.x.min(max_x).max(0.0);
    let y = requested.y.min(max_y).max(0.0);

    Ok(Rect::new(x, y, width, height))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoomStrategy {
    /// Fit the view to the frame's horizontal extent.
    #[default]
    Exact,
    /// Move the view as little as possible to bring the frame into it.
    Min,
}

impl FromStr for ZoomStrategy {
    type Err = ViewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "exact" => Ok(Self::Exact),
            "min" => Ok(Self::Min),
            other => Err(ViewError::UnknownStrategy(other.to_string())),
        }
    }
}

/// The view that brings `frame` into focus from `view`. The result is not
/// clamped.
pub fn compute_config_view_with_strategy(strategy: ZoomStrategy, view: &Rect, frame: &Rect) -> Rect {
    let exact = frame.with_height(view.height);
    match strategy {
        ZoomStrategy::Exact => exact,
        ZoomStrategy::Min => {
            if view.contains_rect(frame) {
                return *view;
            }
            if view.width < frame.width {
                return exact;
            }

            let dx = if frame.left() < view.left() {
                frame.left() - view.left()
            } else if frame.right() > view.right() {
                frame.right() - view.right()
            } else {
                0.0
            };
            let dy = if frame.top() < view.top() {
                frame.top() - view.top()
            } else if frame.bottom() > view.bottom() {
                frame.bottom() - view.bottom()
            } else {
                0.0
            };
            view.translate(dx, dy)
        }
    }
}

/// The transform placing `view` over the whole canvas.
pub fn config_to_physical(view: &Rect, physical: PhysicalSize) -> Mat3 {
    Mat3::between(view, &physical.to_rect())
}

/// Extent in config units of one physical pixel on each axis, or `None`
/// when the transform cannot be inverted.
pub fn physical_border_size(config_to_physical: &Mat3) -> Option<(f64, f64)> {
    let physical_to_config = config_to_physical.invert()?;
    let unit = Rect::new(0.0, 0.0, 1.0, 1.0).transform_rect(&physical_to_config);
    Some((unit.width, unit.height))
}

/// View state of one flamegraph canvas.
///
/// With a row height set, the visible height always shows
/// `physical.height / row_height` rows and the bounds grow to allow it.
/// An inverted view draws depth 0 at the bottom of the canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct FlamegraphView {
    bounds: ViewBounds,
    physical: PhysicalSize,
    row_height: Option<f64>,
    inverted: bool,
    config_view: Rect,
}

impl FlamegraphView {
    pub fn new(bounds: ViewBounds, physical: PhysicalSize) -> Self {
        let mut view = Self {
            bounds,
            physical,
            row_height: None,
            inverted: false,
            config_view: bounds.full_rect(),
        };
        view.reset_config_view();
        view
    }

    pub fn config_view(&self) -> Rect {
        self.config_view
    }

    pub fn bounds(&self) -> ViewBounds {
        self.bounds
    }

    pub fn physical(&self) -> PhysicalSize {
        self.physical
    }

    pub fn is_inverted(&self) -> bool {
        self.inverted
    }

    pub fn set_inverted(&mut self, inverted: bool) {
        self.inverted = inverted;
    }

    /// Row height in physical pixels; `None` stretches the rows to the view.
    pub fn set_row_height(&mut self, row_height: Option<f64>) {
        self.row_height = row_height;
        self.reclamp();
    }

    fn visible_rows(&self) -> Option<f64> {
        let row_height = self.row_height.filter(|h| *h > 0.0)?;
        (self.physical.height > 0).then(|| f64::from(self.physical.height) / row_height)
    }

    fn effective_bounds(&self) -> ViewBounds {
        match self.visible_rows() {
            Some(rows) => ViewBounds {
                width: self.bounds.width,
                height: Range::new(rows, self.bounds.height.max.max(rows)),
            },
            None => self.bounds,
        }
    }

    pub fn set_config_view(&mut self, requested: Rect) -> Result<(), ViewError> {
        let requested = match self.visible_rows() {
            Some(rows) => requested.with_height(rows),
            None => requested,
        };
        self.config_view = compute_clamped_config_view(&requested, &self.effective_bounds())?;
        Ok(())
    }

    /// Show everything: full width, from the top row.
    pub fn reset_config_view(&mut self) {
        let full = self.effective_bounds().full_rect();
        self.config_view = compute_clamped_config_view(&full, &self.effective_bounds()).unwrap_or(full);
    }

    pub fn set_bounds(&mut self, bounds: ViewBounds) {
        self.bounds = bounds;
        self.reclamp();
    }

    /// Track a new canvas size, keeping the config view where possible.
    pub fn resize(&mut self, physical: PhysicalSize) {
        if physical == self.physical {
            return;
        }
        self.physical = physical;
        self.reclamp();
    }

    fn reclamp(&mut self) {
        if self.set_config_view(self.config_view).is_err() {
            self.reset_config_view();
        }
    }

    /// Move the content by a drag of `(dx, dy)` physical pixels.
    pub fn pan_physical(&mut self, dx: f64, dy: f64) {
        let Some(to_config) = self.config_to_physical().invert() else {
            return;
        };
        let cx = dx * to_config.m00() + dy * to_config.m10();
        let cy = dx * to_config.m01() + dy * to_config.m11();
        let moved = self.config_view.translate(-cx, -cy);
        if let Err(err) = self.set_config_view(moved) {
            log::debug!("pan ignored: {err}");
        }
    }

    /// Scale the view width by `factor` (below 1 zooms in) around the
    /// physical point `anchor`, which keeps its config-space position.
    pub fn zoom_at(&mut self, factor: f64, anchor: Point) {
        let Some(anchor) = self.physical_to_config(anchor) else {
            return;
        };
        let view = self.config_view;
        let bounds = self.effective_bounds();
        let width = bounds.width.clamp(view.width * factor);
        let ratio = width / view.width;
        if !ratio.is_finite() {
            return;
        }
        let x = anchor.x - (anchor.x - view.x) * ratio;
        if let Err(err) = self.set_config_view(Rect::new(x, view.y, width, view.height)) {
            log::debug!("zoom ignored: {err}");
        }
    }

    pub fn zoom_into_frame(&mut self, frame: &Frame, strategy: ZoomStrategy) -> Result<(), ViewError> {
        let target = compute_config_view_with_strategy(strategy, &self.config_view, &frame.config_rect());
        self.set_config_view(target)
    }

    pub fn config_to_physical(&self) -> Mat3 {
        let place = config_to_physical(&self.config_view, self.physical);
        if self.inverted {
            place.multiply(&self.config_view.invert_y_transform())
        } else {
            place
        }
    }

    /// Config-space position under a physical point, as used for
    /// hit-testing the cursor.
    pub fn physical_to_config(&self, point: Point) -> Option<Point> {
        self.config_to_physical()
            .invert()
            .map(|m| m.transform_point(point))
    }

    pub fn border_size(&self) -> Option<(f64, f64)> {
        physical_border_size(&self.config_to_physical())
    }

    pub fn encode(&self) -> String {
        self.config_view.encode()
    }

    /// Restore a view produced by [`FlamegraphView::encode`]. Malformed or
    /// invalid input resets to the default view and returns `false`.
    pub fn restore(&mut self, encoded: &str) -> bool {
        let restored = Rect::decode(encoded).map(|rect| self.set_config_view(rect));
        match restored {
            Some(Ok(())) => true,
            _ => {
                log::warn!("ignoring invalid persisted view {encoded:?}");
                self.reset_config_view();
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FrameKey;

    fn bounds() -> ViewBounds {
        ViewBounds {
            width: Range::new(10.0, 1000.0),
            height: Range::new(1.0, 20.0),
        }
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn clamp_keeps_extents_in_bounds() {
        let b = bounds();
        for requested in [
            Rect::new(-50.0, -3.0, 5.0, 0.5),
            Rect::new(990.0, 19.0, 100.0, 5.0),
            Rect::new(200.0, 2.0, 5000.0, 50.0),
            Rect::new(500.0, 10.0, 600.0, 15.0),
        ] {
            let v = compute_clamped_config_view(&requested, &b).expect("valid");
            assert!(v.width >= b.width.min && v.width <= b.width.max, "{v:?}");
            assert!(v.height >= b.height.min && v.height <= b.height.max, "{v:?}");
            assert!(v.x >= 0.0 && v.right() <= b.width.max + 1e-9, "{v:?}");
            assert!(v.y >= 0.0 && v.bottom() <= b.height.max + 1e-9, "{v:?}");
        }
    }

    #[test]
    fn full_height_pins_to_top() {
        let v = compute_clamped_config_view(&Rect::new(0.0, 7.0, 100.0, 30.0), &bounds()).expect("valid");
        assert!(approx(v.y, 0.0));
        assert!(approx(v.height, 20.0));
    }

    #[test]
    fn clamp_rejects_nan() {
        let bad = Rect::new(f64::NAN, 0.0, 1.0, 1.0);
        assert_eq!(
            compute_clamped_config_view(&bad, &bounds()).map_err(|_| ()),
            Err(())
        );
    }

    #[test]
    fn clamp_tolerates_inverted_bounds() {
        let b = ViewBounds {
            width: Range::new(100.0, 50.0),
            height: Range::new(1.0, 1.0),
        };
        let v = compute_clamped_config_view(&Rect::new(10.0, 0.0, 70.0, 1.0), &b).expect("valid");
        assert!(approx(v.width, 50.0));
        assert!(approx(v.x, 0.0));
    }

    #[test]
    fn parse_strategy() {
        assert_eq!("exact".parse::<ZoomStrategy>(), Ok(ZoomStrategy::Exact));
        assert_eq!("min".parse::<ZoomStrategy>(), Ok(ZoomStrategy::Min));
        assert!("max".parse::<ZoomStrategy>().is_err());
    }

    #[test]
    fn exact_uses_view_height() {
        let view = Rect::new(0.0, 0.0, 100.0, 8.0);
        let frame = Rect::new(30.0, 4.0, 5.0, 1.0);
        assert_eq!(
            compute_config_view_with_strategy(ZoomStrategy::Exact, &view, &frame),
            frame.with_height(view.height)
        );
    }

    #[test]
    fn min_keeps_view_when_frame_visible() {
        let view = Rect::new(0.0, 0.0, 100.0, 8.0);
        let frame = Rect::new(30.0, 4.0, 5.0, 1.0);
        assert_eq!(compute_config_view_with_strategy(ZoomStrategy::Min, &view, &frame), view);
    }

    #[test]
    fn min_falls_back_to_exact_when_too_narrow() {
        let view = Rect::new(0.0, 0.0, 10.0, 8.0);
        let frame = Rect::new(50.0, 2.0, 40.0, 1.0);
        assert_eq!(
            compute_config_view_with_strategy(ZoomStrategy::Min, &view, &frame),
            frame.with_height(8.0)
        );
    }

    #[test]
    fn min_translates_minimally() {
        let view = Rect::new(100.0, 5.0, 50.0, 4.0);

        let right = Rect::new(160.0, 6.0, 10.0, 1.0);
        assert_eq!(
            compute_config_view_with_strategy(ZoomStrategy::Min, &view, &right),
            Rect::new(120.0, 5.0, 50.0, 4.0)
        );

        let left_and_up = Rect::new(90.0, 2.0, 10.0, 1.0);
        assert_eq!(
            compute_config_view_with_strategy(ZoomStrategy::Min, &view, &left_and_up),
            Rect::new(90.0, 2.0, 50.0, 4.0)
        );

        let below = Rect::new(110.0, 12.0, 10.0, 1.0);
        assert_eq!(
            compute_config_view_with_strategy(ZoomStrategy::Min, &view, &below),
            Rect::new(100.0, 9.0, 50.0, 4.0)
        );
    }

    #[test]
    fn border_is_one_physical_pixel() {
        let m = config_to_physical(&Rect::new(0.0, 0.0, 100.0, 10.0), PhysicalSize::new(1000, 200));
        let (w, h) = physical_border_size(&m).expect("invertible");
        assert!(approx(w, 0.1));
        assert!(approx(h, 0.05));
        assert!(physical_border_size(&Mat3::from_scaling(0.0, 1.0)).is_none());
    }

    #[test]
    fn zoom_keeps_anchor_fixed() {
        let mut view = FlamegraphView::new(bounds(), PhysicalSize::new(1000, 200));
        let anchor = Point::new(250.0, 100.0);
        let before = view.physical_to_config(anchor).expect("invertible");
        view.zoom_at(0.5, anchor);
        let after = view.physical_to_config(anchor).expect("invertible");
        assert!(approx(before.x, after.x));
        assert!(approx(view.config_view().width, 500.0));
    }

    #[test]
    fn zoom_stops_at_min_width() {
        let mut view = FlamegraphView::new(bounds(), PhysicalSize::new(1000, 200));
        for _ in 0..50 {
            view.zoom_at(0.5, Point::new(500.0, 0.0));
        }
        assert!(approx(view.config_view().width, 10.0));
    }

    #[test]
    fn pan_moves_against_the_drag() {
        let mut view = FlamegraphView::new(bounds(), PhysicalSize::new(1000, 200));
        view.zoom_at(0.1, Point::new(500.0, 0.0));
        let x0 = view.config_view().x;
        // 100 px of a 100-unit-wide view on 1000 px is 10 units.
        view.pan_physical(100.0, 0.0);
        assert!(approx(view.config_view().x, x0 - 10.0));
    }

    #[test]
    fn row_height_fixes_visible_rows() {
        let mut view = FlamegraphView::new(bounds(), PhysicalSize::new(1000, 200));
        view.set_row_height(Some(20.0));
        assert!(approx(view.config_view().height, 10.0));
        view.resize(PhysicalSize::new(1000, 1000));
        assert!(approx(view.config_view().height, 50.0));
        assert!(approx(view.config_view().y, 0.0));
    }

    #[test]
    fn inverted_puts_roots_at_bottom() {
        let mut view = FlamegraphView::new(bounds(), PhysicalSize::new(1000, 200));
        view.set_inverted(true);
        let top_row = view.config_to_physical().transform_point(Point::new(0.0, 0.0));
        assert!(approx(top_row.y, 200.0));
        let cursor = view.physical_to_config(Point::new(0.0, 195.0)).expect("invertible");
        assert!(cursor.y > 0.0 && cursor.y < 1.0);
    }

    #[test]
    fn zoom_into_frame_with_exact() {
        let mut view = FlamegraphView::new(bounds(), PhysicalSize::new(1000, 200));
        let frame = Frame {
            key: FrameKey(1),
            name: "work".into(),
            start: 200.0,
            end: 300.0,
            depth: 3,
            children: vec![],
        };
        view.zoom_into_frame(&frame, ZoomStrategy::Exact).expect("valid");
        let v = view.config_view();
        assert!(approx(v.x, 200.0));
        assert!(approx(v.width, 100.0));
    }

    #[test]
    fn encode_and_restore() {
        let mut view = FlamegraphView::new(bounds(), PhysicalSize::new(1000, 200));
        view.set_config_view(Rect::new(100.0, 2.0, 300.0, 5.0)).expect("valid");
        let encoded = view.encode();
        assert_eq!(encoded, "100,2,300,5");

        let mut other = FlamegraphView::new(bounds(), PhysicalSize::new(1000, 200));
        assert!(other.restore(&encoded));
        assert_eq!(other.config_view(), view.config_view());

        assert!(!other.restore("1,2,3"));
        assert_eq!(other.config_view(), bounds().full_rect());
    }
}

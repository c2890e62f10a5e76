use serde::{Deserialize, Serialize};

use crate::transform::Mat3;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle in either config space (time × depth) or
/// physical pixel space.
///
/// `Rect` is a value type: every operation that looks like a mutation
/// returns a new rectangle. After any transform the width and height are
/// non-negative; a reflected extent is folded back by moving the origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn empty() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0)
    }

    pub fn from_bounds(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self::new(left, top, right - left, bottom - top)
    }

    pub fn left(&self) -> f64 {
        self.x
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn top(&self) -> f64 {
        self.y
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center_x(&self) -> f64 {
        self.x + self.width / 2.0
    }

    pub fn center_y(&self) -> f64 {
        self.y + self.height / 2.0
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// False when any scalar of the rect, or any edge derived from it, is NaN.
    ///
    /// Degenerate geometry must be rejected with this check before it reaches
    /// clamping or transform code.
    pub fn is_valid(&self) -> bool {
        [
            self.x,
            self.y,
            self.width,
            self.height,
            self.left(),
            self.right(),
            self.top(),
            self.bottom(),
        ]
        .iter()
        .all(|v| !v.is_nan())
    }

    pub fn with_x(&self, x: f64) -> Self {
        Self { x, ..*self }
    }

    pub fn with_y(&self, y: f64) -> Self {
        Self { y, ..*self }
    }

    pub fn with_width(&self, width: f64) -> Self {
        Self { width, ..*self }
    }

    pub fn with_height(&self, height: f64) -> Self {
        Self { height, ..*self }
    }

    pub fn translate(&self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    pub fn scale(&self, sx: f64, sy: f64) -> Self {
        Self::new(self.x * sx, self.y * sy, self.width * sx, self.height * sy)
    }

    /// Apply an affine transform to the origin and the extents.
    ///
    /// A negative resulting extent (reflection) is reported as its absolute
    /// value with the origin shifted by the excess, so the rect covers the
    /// same area with non-negative width and height.
    pub fn transform_rect(&self, m: &Mat3) -> Self {
        let mut x = self.x * m.m00() + self.y * m.m10() + m.m20();
        let mut y = self.x * m.m01() + self.y * m.m11() + m.m21();
        let mut width = self.width * m.m00() + self.height * m.m10();
        let mut height = self.width * m.m01() + self.height * m.m11();

        if width < 0.0 {
            x += width;
            width = width.abs();
        }
        if height < 0.0 {
            y += height;
            height = height.abs();
        }

        Self::new(x, y, width, height)
    }

    /// Whether `other` lies entirely within `[left,right) × [top,bottom)`.
    pub fn contains_rect(&self, other: &Rect) -> bool {
        self.left() <= other.left()
            && other.right() <= self.right()
            && self.top() <= other.top()
            && other.bottom() <= self.bottom()
    }

    pub fn overlaps_x(&self, other: &Rect) -> bool {
        self.left() < other.right() && other.left() < self.right()
    }

    pub fn overlaps_y(&self, other: &Rect) -> bool {
        self.top() < other.bottom() && other.top() < self.bottom()
    }

    pub fn overlaps(&self, other: &Rect) -> bool {
        self.overlaps_x(other) && self.overlaps_y(other)
    }

    /// The shared region of two rects, `None` when they do not overlap.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        if !self.overlaps(other) {
            return None;
        }
        Some(Rect::from_bounds(
            self.left().max(other.left()),
            self.top().max(other.top()),
            self.right().min(other.right()),
            self.bottom().min(other.bottom()),
        ))
    }

    pub fn has_intersection_with(&self, other: &Rect) -> bool {
        self.intersection(other).is_some()
    }

    /// Matrix that mirrors the Y axis about this rect's vertical center:
    /// `y' = -y + 2·self.y + self.height`.
    pub fn invert_y_transform(&self) -> Mat3 {
        Mat3::from_values([
            1.0,
            0.0,
            0.0,
            0.0,
            -1.0,
            0.0,
            0.0,
            2.0 * self.y + self.height,
            1.0,
        ])
    }

    /// Serialize to `"x,y,width,height"`, each field rounded to an integer.
    pub fn encode(&self) -> String {
        format!(
            "{},{},{},{}",
            self.x.round(),
            self.y.round(),
            self.width.round(),
            self.height.round()
        )
    }

    /// Parse the form produced by [`Rect::encode`].
    ///
    /// Returns `None` for a wrong field count, an unparsable field, or a rect
    /// that fails [`Rect::is_valid`].
    pub fn decode(encoded: &str) -> Option<Rect> {
        let fields: Vec<&str> = encoded.split(',').collect();
        if fields.len() != 4 {
            return None;
        }
        let mut values = [0.0; 4];
        for (slot, field) in values.iter_mut().zip(&fields) {
            *slot = field.trim().parse::<f64>().ok()?;
        }
        let rect = Rect::new(values[0], values[1], values[2], values[3]);
        rect.is_valid().then_some(rect)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Build from 8-bit channels, fully opaque.
    pub fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(
            f32::from(r) / 255.0,
            f32::from(g) / 255.0,
            f32::from(b) / 255.0,
            1.0,
        )
    }

    pub fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn edges() {
        let r = Rect::new(10.0, 2.0, 30.0, 4.0);
        assert!(approx(r.left(), 10.0));
        assert!(approx(r.right(), 40.0));
        assert!(approx(r.top(), 2.0));
        assert!(approx(r.bottom(), 6.0));
        assert!(approx(r.center_x(), 25.0));
    }

    #[test]
    fn nan_rect_is_invalid() {
        assert!(Rect::new(0.0, 0.0, 1.0, 1.0).is_valid());
        assert!(!Rect::new(f64::NAN, 0.0, 1.0, 1.0).is_valid());
        assert!(!Rect::new(0.0, 0.0, 1.0, f64::NAN).is_valid());
        // inf - inf in a derived edge
        assert!(!Rect::new(f64::INFINITY, 0.0, f64::NEG_INFINITY, 1.0).is_valid());
    }

    #[test]
    fn identity_transform_keeps_rect() {
        let r = Rect::new(3.0, 4.0, 5.0, 6.0);
        assert_eq!(r.transform_rect(&Mat3::identity()), r);
    }

    #[test]
    fn reflected_transform_keeps_extents_positive() {
        let r = Rect::new(2.0, 1.0, 4.0, 3.0);
        let flipped = r.transform_rect(&Mat3::from_scaling(-1.0, -2.0));
        assert!(approx(flipped.width, 4.0));
        assert!(approx(flipped.height, 6.0));
        // x' = -2, w' = -4 -> x = -6
        assert!(approx(flipped.x, -6.0));
        // y' = -2, h' = -6 -> y = -8
        assert!(approx(flipped.y, -8.0));
    }

    #[test]
    fn transform_applies_translation_to_origin_only() {
        let r = Rect::new(1.0, 1.0, 2.0, 2.0);
        let t = r.transform_rect(&Mat3::from_translation(10.0, 20.0));
        assert_eq!(t, Rect::new(11.0, 21.0, 2.0, 2.0));
    }

    #[test]
    fn invert_y_mirrors_about_center() {
        let r = Rect::new(0.0, 10.0, 100.0, 20.0);
        let m = r.invert_y_transform();
        let top = m.transform_point(Point::new(0.0, 10.0));
        let bottom = m.transform_point(Point::new(0.0, 30.0));
        assert!(approx(top.y, 30.0));
        assert!(approx(bottom.y, 10.0));
        // Applying the mirror to the rect itself is a no-op.
        assert_eq!(r.transform_rect(&m), r);
    }

    #[test]
    fn containment_and_overlap_are_half_open() {
        let outer = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(outer.contains_rect(&Rect::new(0.0, 0.0, 10.0, 10.0)));
        assert!(outer.contains_rect(&Rect::new(2.0, 2.0, 3.0, 3.0)));
        assert!(!outer.contains_rect(&Rect::new(8.0, 2.0, 3.0, 3.0)));

        let touching = Rect::new(10.0, 0.0, 5.0, 5.0);
        assert!(!outer.overlaps_x(&touching));
        assert!(!outer.overlaps(&touching));
        assert!(!outer.has_intersection_with(&touching));

        let crossing = Rect::new(9.0, 9.0, 5.0, 5.0);
        assert!(outer.overlaps(&crossing));
        assert_eq!(
            outer.intersection(&crossing),
            Some(Rect::new(9.0, 9.0, 1.0, 1.0))
        );
    }

    #[test]
    fn encode_rounds_fields() {
        assert_eq!(Rect::new(1.4, 2.6, 100.2, 7.5).encode(), "1,3,100,8");
    }

    #[test]
    fn decode_encode_reconstructs_up_to_rounding() {
        let r = Rect::new(12.3, 4.0, 980.7, 15.2);
        let decoded = Rect::decode(&r.encode()).expect("decodes");
        assert_eq!(decoded, Rect::new(12.0, 4.0, 981.0, 15.0));
    }

    #[test]
    fn decode_rejects_malformed_input() {
        assert!(Rect::decode("").is_none());
        assert!(Rect::decode("1,2,3").is_none());
        assert!(Rect::decode("1,2,3,4,5").is_none());
        assert!(Rect::decode("1,2,x,4").is_none());
        assert!(Rect::decode("1,2,NaN,4").is_none());
        assert_eq!(Rect::decode("1,2,3,4"), Some(Rect::new(1.0, 2.0, 3.0, 4.0)));
    }

    #[test]
    fn color_from_rgb8() {
        let c = Color::from_rgb8(255, 0, 51);
        assert!((c.r - 1.0).abs() < f32::EPSILON);
        assert!((c.b - 0.2).abs() < 1e-6);
        assert!((c.a - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn rect_serde_roundtrip() {
        let r = Rect::new(1.0, 2.0, 3.0, 4.0);
        let json = serde_json::to_string(&r).expect("serialize");
        let back: Rect = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, r);
    }
}

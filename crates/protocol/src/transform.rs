use serde::{Deserialize, Serialize};

use crate::types::{Point, Rect};

/// A 3×3 affine matrix stored column-major, the layout GL `mat3` uniforms
/// expect.
///
/// Element `mRC` is row `R`, column `C` of the `[x y 1]` row-vector
/// convention used throughout: `x' = x·m00 + y·m10 + m20`,
/// `y' = x·m01 + y·m11 + m21`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Mat3([f64; 9]);

impl Mat3 {
    pub fn identity() -> Self {
        Self([1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0])
    }

    pub fn from_values(values: [f64; 9]) -> Self {
        Self(values)
    }

    pub fn from_translation(tx: f64, ty: f64) -> Self {
        Self([1.0, 0.0, 0.0, 0.0, 1.0, 0.0, tx, ty, 1.0])
    }

    pub fn from_scaling(sx: f64, sy: f64) -> Self {
        Self([sx, 0.0, 0.0, 0.0, sy, 0.0, 0.0, 0.0, 1.0])
    }

    /// Maps `from` onto `to`: the origin of `from` lands on the origin of
    /// `to` and the extents are scaled to match.
    pub fn between(from: &Rect, to: &Rect) -> Self {
        let sx = to.width / from.width;
        let sy = to.height / from.height;
        Self([
            sx,
            0.0,
            0.0,
            0.0,
            sy,
            0.0,
            to.x - from.x * sx,
            to.y - from.y * sy,
            1.0,
        ])
    }

    /// Pixel space → clip space for a canvas of the given size. The Y axis is
    /// flipped so pixel row 0 is the top of the canvas.
    pub fn projection(width: f64, height: f64) -> Self {
        Self([
            2.0 / width,
            0.0,
            0.0,
            0.0,
            -2.0 / height,
            0.0,
            -1.0,
            1.0,
            1.0,
        ])
    }

    pub fn values(&self) -> &[f64; 9] {
        &self.0
    }

    pub fn m00(&self) -> f64 {
        self.0[0]
    }
    pub fn m01(&self) -> f64 {
        self.0[1]
    }
    pub fn m10(&self) -> f64 {
        self.0[3]
    }
    pub fn m11(&self) -> f64 {
        self.0[4]
    }
    pub fn m20(&self) -> f64 {
        self.0[6]
    }
    pub fn m21(&self) -> f64 {
        self.0[7]
    }

    /// `self · other`: applying the result equals applying `other` first,
    /// then `self`.
    pub fn multiply(&self, other: &Mat3) -> Mat3 {
        let a = &self.0;
        let b = &other.0;
        let mut out = [0.0; 9];
        for col in 0..3 {
            for row in 0..3 {
                out[col * 3 + row] = (0..3).map(|k| a[k * 3 + row] * b[col * 3 + k]).sum();
            }
        }
        Mat3(out)
    }

    /// The inverse transform, or `None` for a singular matrix.
    pub fn invert(&self) -> Option<Mat3> {
        let [a00, a01, a02, a10, a11, a12, a20, a21, a22] = self.0;

        let b01 = a22 * a11 - a12 * a21;
        let b11 = -a22 * a10 + a12 * a20;
        let b21 = a21 * a10 - a11 * a20;

        let det = a00 * b01 + a01 * b11 + a02 * b21;
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        let inv = 1.0 / det;

        Some(Mat3([
            b01 * inv,
            (-a22 * a01 + a02 * a21) * inv,
            (a12 * a01 - a02 * a11) * inv,
            b11 * inv,
            (a22 * a00 - a02 * a20) * inv,
            (-a12 * a00 + a02 * a10) * inv,
            b21 * inv,
            (-a21 * a00 + a01 * a20) * inv,
            (a11 * a00 - a01 * a10) * inv,
        ]))
    }

    pub fn transform_point(&self, p: Point) -> Point {
        Point::new(
            p.x * self.m00() + p.y * self.m10() + self.m20(),
            p.x * self.m01() + p.y * self.m11() + self.m21(),
        )
    }

    /// Column-major `f32` values for a `mat3` uniform.
    pub fn to_f32_array(&self) -> [f32; 9] {
        self.0.map(|v| v as f32)
    }
}

impl Default for Mat3 {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_mat_eq(a: &Mat3, b: &Mat3) {
        for (x, y) in a.values().iter().zip(b.values()) {
            assert!((x - y).abs() < 1e-9, "{a:?} != {b:?}");
        }
    }

    #[test]
    fn multiply_by_identity() {
        let m = Mat3::from_translation(3.0, 4.0).multiply(&Mat3::from_scaling(2.0, 5.0));
        assert_mat_eq(&m.multiply(&Mat3::identity()), &m);
        assert_mat_eq(&Mat3::identity().multiply(&m), &m);
    }

    #[test]
    fn multiply_applies_right_operand_first() {
        let m = Mat3::from_translation(10.0, 0.0).multiply(&Mat3::from_scaling(2.0, 2.0));
        let p = m.transform_point(Point::new(1.0, 1.0));
        assert!((p.x - 12.0).abs() < 1e-9);
        assert!((p.y - 2.0).abs() < 1e-9);
    }

    #[test]
    fn invert_roundtrip() {
        let m = Mat3::from_translation(-7.0, 3.0).multiply(&Mat3::from_scaling(0.5, 4.0));
        let inv = m.invert().expect("invertible");
        assert_mat_eq(&m.multiply(&inv), &Mat3::identity());
    }

    #[test]
    fn singular_matrix_has_no_inverse() {
        assert!(Mat3::from_scaling(0.0, 1.0).invert().is_none());
    }

    #[test]
    fn between_maps_rect_onto_rect() {
        let from = Rect::new(100.0, 2.0, 50.0, 10.0);
        let to = Rect::new(0.0, 0.0, 500.0, 200.0);
        let m = Mat3::between(&from, &to);
        assert_eq!(from.transform_rect(&m), to);
    }

    #[test]
    fn projection_maps_canvas_corners_to_clip_space() {
        let m = Mat3::projection(200.0, 100.0);
        let top_left = m.transform_point(Point::new(0.0, 0.0));
        let bottom_right = m.transform_point(Point::new(200.0, 100.0));
        assert!((top_left.x + 1.0).abs() < 1e-9 && (top_left.y - 1.0).abs() < 1e-9);
        assert!((bottom_right.x - 1.0).abs() < 1e-9 && (bottom_right.y + 1.0).abs() < 1e-9);
    }
}

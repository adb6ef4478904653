use core::ops::Mul;

use super::Vec2;

/// Column-major 4x4 transform matrix.
///
/// Only the 2D affine subset is ever built by this crate (translation, rotation
/// about +Z, non-uniform scale in X/Y) plus the orthographic projection, but the
/// full 4x4 layout is kept so matrices can be uploaded to shaders unchanged.
///
/// Composition convention: `a * b` applies `b` first, then `a`. The helpers
/// [`translate`](Self::translate), [`rotate`](Self::rotate) and
/// [`scale`](Self::scale) post-multiply, so successive calls compose in local
/// space.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Mat4 {
    pub cols: [[f32; 4]; 4],
}

impl Mat4 {
    pub const IDENTITY: Mat4 = Mat4 {
        cols: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    #[inline]
    pub const fn identity() -> Self {
        Self::IDENTITY
    }

    /// Pure translation by `(x, y)`.
    pub fn translation(x: f32, y: f32) -> Self {
        let mut m = Self::IDENTITY;
        m.cols[3][0] = x;
        m.cols[3][1] = y;
        m
    }

    /// Pure rotation about +Z by `degrees` (counter-clockwise in y-up space).
    pub fn rotation(degrees: f32) -> Self {
        let (sin, cos) = degrees.to_radians().sin_cos();
        let mut m = Self::IDENTITY;
        m.cols[0][0] = cos;
        m.cols[0][1] = sin;
        m.cols[1][0] = -sin;
        m.cols[1][1] = cos;
        m
    }

    /// Pure scale by `(x, y)`; Z is left untouched.
    pub fn scaling(x: f32, y: f32) -> Self {
        let mut m = Self::IDENTITY;
        m.cols[0][0] = x;
        m.cols[1][1] = y;
        m
    }

    /// Orthographic projection mapping `[left, right] x [bottom, top]` to clip space,
    /// with depth range `[-1, 1]`.
    pub fn ortho(left: f32, right: f32, bottom: f32, top: f32) -> Self {
        let (near, far) = (-1.0f32, 1.0f32);
        let mut m = Self::IDENTITY;
        m.cols[0][0] = 2.0 / (right - left);
        m.cols[1][1] = 2.0 / (top - bottom);
        m.cols[2][2] = -2.0 / (far - near);
        m.cols[3][0] = -(right + left) / (right - left);
        m.cols[3][1] = -(top + bottom) / (top - bottom);
        m.cols[3][2] = -(far + near) / (far - near);
        m
    }

    /// Returns `self * translation(x, y)`.
    #[inline]
    pub fn translate(&self, x: f32, y: f32) -> Self {
        *self * Self::translation(x, y)
    }

    /// Returns `self * rotation(degrees)`.
    #[inline]
    pub fn rotate(&self, degrees: f32) -> Self {
        *self * Self::rotation(degrees)
    }

    /// Returns `self * scaling(x, y)`.
    #[inline]
    pub fn scale(&self, x: f32, y: f32) -> Self {
        *self * Self::scaling(x, y)
    }

    /// The X/Y components of the translation column.
    #[inline]
    pub fn translation_xy(&self) -> Vec2 {
        Vec2::new(self.cols[3][0], self.cols[3][1])
    }

    /// Transforms a point (z = 0, w = 1) and drops Z/W.
    #[inline]
    pub fn transform_point(&self, p: Vec2) -> Vec2 {
        let c = &self.cols;
        Vec2::new(
            c[0][0] * p.x + c[1][0] * p.y + c[3][0],
            c[0][1] * p.x + c[1][1] * p.y + c[3][1],
        )
    }

    /// Component-wise comparison with an absolute tolerance.
    pub fn approx_eq(&self, other: &Mat4, eps: f32) -> bool {
        self.cols
            .iter()
            .flatten()
            .zip(other.cols.iter().flatten())
            .all(|(a, b)| (a - b).abs() <= eps)
    }
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul for Mat4 {
    type Output = Mat4;

    fn mul(self, rhs: Mat4) -> Mat4 {
        let mut out = [[0.0f32; 4]; 4];
        for (c, out_col) in out.iter_mut().enumerate() {
            for (r, cell) in out_col.iter_mut().enumerate() {
                *cell = (0..4).map(|k| self.cols[k][r] * rhs.cols[c][k]).sum();
            }
        }
        Mat4 { cols: out }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    #[test]
    fn identity_is_neutral() {
        let m = Mat4::translation(3.0, 4.0).rotate(30.0).scale(2.0, 5.0);
        assert!((m * Mat4::IDENTITY).approx_eq(&m, EPS));
        assert!((Mat4::IDENTITY * m).approx_eq(&m, EPS));
    }

    #[test]
    fn translate_on_identity_sets_translation_column() {
        let m = Mat4::IDENTITY.translate(12.5, -7.0);
        assert_eq!(m.translation_xy(), Vec2::new(12.5, -7.0));
    }

    #[test]
    fn post_multiplication_composes_in_local_space() {
        // Translate then scale: the scale must not affect the earlier translation.
        let m = Mat4::IDENTITY.translate(10.0, 20.0).scale(2.0, 3.0);
        let p = m.transform_point(Vec2::new(1.0, 1.0));
        assert!((p.x - 12.0).abs() < EPS);
        assert!((p.y - 23.0).abs() < EPS);
    }

    #[test]
    fn rotate_quarter_turn_is_counter_clockwise() {
        let p = Mat4::rotation(90.0).transform_point(Vec2::new(1.0, 0.0));
        assert!(p.x.abs() < EPS);
        assert!((p.y - 1.0).abs() < EPS);
    }

    #[test]
    fn ortho_maps_window_corners_to_clip_corners() {
        let m = Mat4::ortho(0.0, 800.0, 0.0, 600.0);
        let bl = m.transform_point(Vec2::new(0.0, 0.0));
        let tr = m.transform_point(Vec2::new(800.0, 600.0));
        assert!((bl.x + 1.0).abs() < EPS && (bl.y + 1.0).abs() < EPS);
        assert!((tr.x - 1.0).abs() < EPS && (tr.y - 1.0).abs() < EPS);
    }
}

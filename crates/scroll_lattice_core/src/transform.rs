//! Homogeneous 3D transforms.
//!
//! A `Transform` is a 4×4 homogeneous matrix over (y, x, z, 1). It is only ever built from rotations, uniform scales and
//! translations, so it is always invertible and its linear block is always a rotation times a scale.

use crate::{Axis3, Point3f, PointN};

use nalgebra::{Matrix3, Matrix4, Vector4};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct Transform {
    matrix: Matrix4<f64>,
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    pub fn identity() -> Self {
        Self {
            matrix: Matrix4::identity(),
        }
    }

    pub fn translation(offset: Point3f) -> Self {
        let mut matrix = Matrix4::identity();
        for i in 0..3 {
            matrix[(i, 3)] = offset.at(i);
        }

        Self { matrix }
    }

    pub fn uniform_scale(factor: f64) -> Self {
        assert!(factor.is_finite() && factor > 0.0);

        let mut matrix = Matrix4::identity();
        for i in 0..3 {
            matrix[(i, i)] = factor;
        }

        Self { matrix }
    }

    /// Rotation by `radians` in the plane orthogonal to `axis`, turning the first axis of `axis.orthogonal_plane()` towards
    /// the second.
    pub fn rotation(axis: Axis3, radians: f64) -> Self {
        let (cos, sin) = (radians.cos(), radians.sin());

        Self::plane_rotation(axis, cos, sin)
    }

    /// Rotation by `quarter_turns * 90°` about `axis`. The entries are exactly 0 or ±1, so composing four quarter turns is
    /// exactly the identity.
    pub fn quarter_turn(axis: Axis3, quarter_turns: i32) -> Self {
        let (cos, sin) = match quarter_turns.rem_euclid(4) {
            0 => (1.0, 0.0),
            1 => (0.0, 1.0),
            2 => (-1.0, 0.0),
            _ => (0.0, -1.0),
        };

        Self::plane_rotation(axis, cos, sin)
    }

    fn plane_rotation(axis: Axis3, cos: f64, sin: f64) -> Self {
        let (a, b) = axis.orthogonal_plane();
        let (a, b) = (a.index(), b.index());

        let mut matrix = Matrix4::identity();
        matrix[(a, a)] = cos;
        matrix[(a, b)] = -sin;
        matrix[(b, a)] = sin;
        matrix[(b, b)] = cos;

        Self { matrix }
    }

    /// The transform that applies `rhs` first, then `self`.
    #[inline]
    pub fn compose(&self, rhs: &Self) -> Self {
        Self {
            matrix: self.matrix * rhs.matrix,
        }
    }

    /// Transforms built by this module are always invertible, so this only returns `None` after numeric breakdown (for
    /// example after zooming by many orders of magnitude).
    #[inline]
    pub fn invert(&self) -> Option<Self> {
        self.matrix.try_inverse().map(|matrix| Self { matrix })
    }

    #[inline]
    pub fn apply_to_point(&self, p: Point3f) -> Point3f {
        let h = self.matrix * Vector4::new(p.y(), p.x(), p.z(), 1.0);

        PointN([h[0], h[1], h[2]])
    }

    /// Applies only the linear part, ignoring translation.
    #[inline]
    pub fn apply_to_vector(&self, v: Point3f) -> Point3f {
        let h = self.matrix * Vector4::new(v.y(), v.x(), v.z(), 0.0);

        PointN([h[0], h[1], h[2]])
    }

    /// The image of the origin.
    #[inline]
    pub fn translation_part(&self) -> Point3f {
        PointN([self.matrix[(0, 3)], self.matrix[(1, 3)], self.matrix[(2, 3)]])
    }

    /// The same transform with its translation column zeroed.
    #[inline]
    pub fn without_translation(&self) -> Self {
        let mut matrix = self.matrix;
        for i in 0..3 {
            matrix[(i, 3)] = 0.0;
        }

        Self { matrix }
    }

    fn linear_block(&self) -> Matrix3<f64> {
        self.matrix.fixed_view::<3, 3>(0, 0).into_owned()
    }

    /// The uniform scale factor of the linear block, i.e. the length every unit vector is stretched to.
    #[inline]
    pub fn scale_factor(&self) -> f64 {
        self.linear_block().determinant().abs().cbrt()
    }

    /// The orthonormal part of the linear block, in row-major (y, x, z) order.
    pub fn rotation_block(&self) -> [[f64; 3]; 3] {
        let rotation = self.linear_block() / self.scale_factor();
        let mut rows = [[0.0; 3]; 3];
        for (i, row) in rows.iter_mut().enumerate() {
            for (j, value) in row.iter_mut().enumerate() {
                *value = rotation[(i, j)];
            }
        }

        rows
    }

    /// Returns `true` iff every matrix entry is within `epsilon` of the matching entry of `other`.
    pub fn abs_diff_eq(&self, other: &Self, epsilon: f64) -> bool {
        self.matrix
            .iter()
            .zip(other.matrix.iter())
            .all(|(a, b)| (a - b).abs() <= epsilon)
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn four_quarter_turns_are_exactly_identity() {
        for &axis in Axis3::ALL.iter() {
            let quarter = Transform::quarter_turn(axis, 1);
            let mut t = Transform::rotation(Axis3::Z, 0.3);
            let start = t;
            for _ in 0..4 {
                t = t.compose(&quarter);
            }
            assert_eq!(t, start);
        }
    }

    #[test]
    fn quarter_turn_maps_plane_axes() {
        let t = Transform::quarter_turn(Axis3::Z, 1);
        let y = PointN([1.0, 0.0, 0.0]);

        assert_eq!(t.apply_to_vector(y), PointN([0.0, 1.0, 0.0]));
    }

    #[test]
    fn compose_applies_right_hand_side_first() {
        let t = Transform::uniform_scale(2.0).compose(&Transform::translation(PointN([1.0, 0.0, 0.0])));

        assert_eq!(t.apply_to_point(Point3f::ZERO), PointN([2.0, 0.0, 0.0]));
        assert_eq!(t.translation_part(), PointN([2.0, 0.0, 0.0]));
    }

    #[test]
    fn invert_undoes_transform() {
        let t = Transform::rotation(Axis3::X, 0.7)
            .compose(&Transform::uniform_scale(1.1))
            .compose(&Transform::translation(PointN([3.0, -2.0, 5.0])));
        let p = PointN([10.0, 20.0, -30.0]);

        let back = t.invert().unwrap().apply_to_point(t.apply_to_point(p));

        assert!((back - p).norm() < 1e-9);
    }

    #[test]
    fn scale_factor_ignores_rotation() {
        let t = Transform::rotation(Axis3::Y, 1.2).compose(&Transform::uniform_scale(4.0));

        assert!((t.scale_factor() - 4.0).abs() < 1e-12);
        let r = t.rotation_block();
        let det = r[0][0] * (r[1][1] * r[2][2] - r[1][2] * r[2][1])
            - r[0][1] * (r[1][0] * r[2][2] - r[1][2] * r[2][0])
            + r[0][2] * (r[1][0] * r[2][1] - r[1][1] * r[2][0]);
        assert!((det - 1.0).abs() < 1e-12);
    }
}

use crate::{Point3i, PointN};

use serde::{Deserialize, Serialize};

/// Either the Y, X, or Z axis. The discriminant is the component index in (y, x, z) order.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum Axis3 {
    Y = 0,
    X = 1,
    Z = 2,
}

impl Axis3 {
    pub const ALL: [Axis3; 3] = [Axis3::Y, Axis3::X, Axis3::Z];

    /// The index for a point's component on this axis.
    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn get_unit_vector(&self) -> Point3i {
        match self {
            Axis3::Y => PointN([1, 0, 0]),
            Axis3::X => PointN([0, 1, 0]),
            Axis3::Z => PointN([0, 0, 1]),
        }
    }

    /// The two axes orthogonal to `self`, in cyclic order, so that a positive rotation about `self` turns the first into the
    /// second.
    pub fn orthogonal_plane(&self) -> (Axis3, Axis3) {
        match self {
            Axis3::Y => (Axis3::X, Axis3::Z),
            Axis3::X => (Axis3::Z, Axis3::Y),
            Axis3::Z => (Axis3::Y, Axis3::X),
        }
    }
}

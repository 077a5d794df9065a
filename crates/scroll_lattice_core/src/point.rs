//! Points on the volume lattice.
//!
//! # Axis order
//!
//! Every 3D quantity in this workspace uses the **(y, x, z)** component order: component 0 is the height (`y`), component 1
//! is the width (`x`) and component 2 is the slice index (`z`). This is the order of the on-disk datasets, of dense arrays
//! (row-major with `z` varying fastest) and of the rows and columns of every `Transform` matrix. Nothing else in the crate
//! reorders axes.
//!
//! ```
//! use scroll_lattice_core::prelude::*;
//!
//! let p = PointN([1, 2, 3]);
//! assert_eq!((p.y(), p.x(), p.z()), (1, 2, 3));
//!
//! assert_eq!(p + Point3i::fill(1), PointN([2, 3, 4]));
//! assert_eq!(p * 2, PointN([2, 4, 6]));
//! ```
//!
//! Points are partially ordered: `a < b` iff every component of `a` is less than the matching component of `b`. That makes
//! containment checks read naturally:
//!
//! ```
//! # use scroll_lattice_core::prelude::*;
//! let min = Point3i::ZERO;
//! let lub = Point3i::fill(3);
//! assert!(min <= PointN([0, 1, 2]) && PointN([0, 1, 2]) < lub);
//! ```

use core::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};
use num::Integer;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// An N-dimensional point, which is just a primitive array of type `N`.
#[derive(Copy, Clone, Debug, Deserialize, Default, Eq, Hash, PartialEq, Serialize)]
pub struct PointN<N>(pub N);

/// A 3-dimensional point with scalar type `T`, in (y, x, z) order.
pub type Point3<T> = PointN<[T; 3]>;
/// A 3-dimensional point with scalar type `i32`.
pub type Point3i = PointN<[i32; 3]>;
/// A 3-dimensional point with scalar type `f64`.
pub type Point3f = PointN<[f64; 3]>;

impl<T> Point3<T>
where
    T: Copy,
{
    #[inline]
    pub fn fill(value: T) -> Self {
        PointN([value; 3])
    }

    /// Height.
    #[inline]
    pub fn y(&self) -> T {
        self.0[0]
    }

    /// Width.
    #[inline]
    pub fn x(&self) -> T {
        self.0[1]
    }

    /// Slice index.
    #[inline]
    pub fn z(&self) -> T {
        self.0[2]
    }

    /// Returns the component specified by index, in (y, x, z) order.
    #[inline]
    pub fn at(&self, component_index: usize) -> T {
        self.0[component_index]
    }

    /// Returns the point after applying `f` component-wise.
    #[inline]
    pub fn map_components<S>(&self, f: impl Fn(T) -> S) -> Point3<S> {
        PointN([f(self.0[0]), f(self.0[1]), f(self.0[2])])
    }

    /// Applies `f` to matching components of `self` and `other`.
    #[inline]
    pub fn zip_components<S>(&self, other: &Self, f: impl Fn(T, T) -> S) -> Point3<S> {
        PointN([
            f(self.0[0], other.0[0]),
            f(self.0[1], other.0[1]),
            f(self.0[2], other.0[2]),
        ])
    }
}

impl Point3i {
    pub const ZERO: Self = PointN([0; 3]);
    pub const ONES: Self = PointN([1; 3]);

    /// Component-wise maximum.
    #[inline]
    pub fn join(&self, other: &Self) -> Self {
        self.zip_components(other, std::cmp::max)
    }

    /// Component-wise minimum.
    #[inline]
    pub fn meet(&self, other: &Self) -> Self {
        self.zip_components(other, std::cmp::min)
    }

    /// Product of all components.
    #[inline]
    pub fn volume(&self) -> i64 {
        self.0.iter().map(|&c| c as i64).product()
    }

    /// Floored division of every component by `rhs`.
    #[inline]
    pub fn scalar_div_floor(&self, rhs: i32) -> Self {
        self.map_components(|c| Integer::div_floor(&c, &rhs))
    }

    /// Ceiled division of every component by `rhs`.
    #[inline]
    pub fn scalar_div_ceil(&self, rhs: i32) -> Self {
        self.map_components(|c| -(Integer::div_floor(&-c, &rhs)))
    }

    /// Floored component-wise division.
    #[inline]
    pub fn vector_div_floor(&self, rhs: &Self) -> Self {
        self.zip_components(rhs, |a, b| Integer::div_floor(&a, &b))
    }

    #[inline]
    pub fn as_f64(&self) -> Point3f {
        self.map_components(f64::from)
    }
}

impl Point3f {
    pub const ZERO: Self = PointN([0.0; 3]);

    #[inline]
    pub fn round(&self) -> Point3i {
        self.map_components(|c| c.round() as i32)
    }

    #[inline]
    pub fn floor(&self) -> Point3i {
        self.map_components(|c| c.floor() as i32)
    }

    #[inline]
    pub fn dot(&self, other: &Self) -> f64 {
        self.y() * other.y() + self.x() * other.x() + self.z() * other.z()
    }

    #[inline]
    pub fn norm(&self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Component-wise maximum.
    #[inline]
    pub fn join(&self, other: &Self) -> Self {
        self.zip_components(other, f64::max)
    }

    /// Component-wise minimum.
    #[inline]
    pub fn meet(&self, other: &Self) -> Self {
        self.zip_components(other, f64::min)
    }
}

impl From<Point3i> for Point3f {
    #[inline]
    fn from(p: Point3i) -> Self {
        p.as_f64()
    }
}

impl<T> PartialOrd for Point3<T>
where
    T: Copy + PartialOrd,
{
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.eq(other) {
            Some(Ordering::Equal)
        } else if self.lt(other) {
            Some(Ordering::Less)
        } else if self.gt(other) {
            Some(Ordering::Greater)
        } else {
            None
        }
    }

    #[inline]
    fn lt(&self, other: &Self) -> bool {
        self.0.iter().zip(other.0.iter()).all(|(a, b)| a < b)
    }

    #[inline]
    fn gt(&self, other: &Self) -> bool {
        self.0.iter().zip(other.0.iter()).all(|(a, b)| a > b)
    }

    #[inline]
    fn le(&self, other: &Self) -> bool {
        self.0.iter().zip(other.0.iter()).all(|(a, b)| a <= b)
    }

    #[inline]
    fn ge(&self, other: &Self) -> bool {
        self.0.iter().zip(other.0.iter()).all(|(a, b)| a >= b)
    }
}

impl<T> Add for Point3<T>
where
    T: Copy + Add<Output = T>,
{
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        self.zip_components(&rhs, |a, b| a + b)
    }
}

impl<T> Sub for Point3<T>
where
    T: Copy + Sub<Output = T>,
{
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        self.zip_components(&rhs, |a, b| a - b)
    }
}

impl<T> Mul<T> for Point3<T>
where
    T: Copy + Mul<Output = T>,
{
    type Output = Self;

    #[inline]
    fn mul(self, rhs: T) -> Self {
        self.map_components(|c| c * rhs)
    }
}

impl<T> Mul for Point3<T>
where
    T: Copy + Mul<Output = T>,
{
    type Output = Self;

    #[inline]
    fn mul(self, rhs: Self) -> Self {
        self.zip_components(&rhs, |a, b| a * b)
    }
}

// Use specialized implementation for integers because the default Div impl rounds towards zero, which is not what lattice
// coordinates want.
impl Div<i32> for Point3i {
    type Output = Self;

    #[inline]
    fn div(self, rhs: i32) -> Self {
        self.scalar_div_floor(rhs)
    }
}

impl Div<f64> for Point3f {
    type Output = Self;

    #[inline]
    fn div(self, rhs: f64) -> Self {
        self.map_components(|c| c / rhs)
    }
}

impl<T> Neg for Point3<T>
where
    T: Copy + Neg<Output = T>,
{
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        self.map_components(|c| -c)
    }
}

impl<T> AddAssign for Point3<T>
where
    T: Copy + Add<Output = T>,
{
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl<T> SubAssign for Point3<T>
where
    T: Copy + Sub<Output = T>,
{
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
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
    fn floor_and_ceil_division_handle_negatives() {
        let p = PointN([-3, 3, 4]);

        assert_eq!(p.scalar_div_floor(2), PointN([-2, 1, 2]));
        assert_eq!(p.scalar_div_ceil(2), PointN([-1, 2, 2]));
    }

    #[test]
    fn partial_order_requires_all_components() {
        let a = PointN([0, 0, 0]);
        let b = PointN([1, 1, 0]);

        assert!(a <= b);
        assert!(!(a < b));
        assert_eq!(a.partial_cmp(&PointN([1, -1, 0])), None);
    }

    #[test]
    fn rounding_to_lattice() {
        let p = PointN([1.5, -0.4, 2.49]);

        assert_eq!(p.round(), PointN([2, 0, 2]));
        assert_eq!(p.floor(), PointN([1, -1, 2]));
    }
}

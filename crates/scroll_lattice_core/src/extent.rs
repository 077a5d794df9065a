use crate::{Point3, Point3i, PointN};

use core::ops::Range;
use itertools::{iproduct, ConsTuples, Product};
use serde::{Deserialize, Serialize};

/// A box of lattice points in (y, x, z) order.
pub type Extent3<T> = ExtentN<[T; 3]>;
pub type Extent3i = ExtentN<[i32; 3]>;

/// An axis-aligned box given by its minimum corner and its shape, half-open on every axis: `[minimum, minimum + shape)`.
/// Every box read from or written to a volume is described by one of these.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct ExtentN<N> {
    /// Inclusive corner.
    pub minimum: PointN<N>,
    pub shape: PointN<N>,
}

impl<N> ExtentN<N> {
    #[inline]
    pub fn from_min_and_shape(minimum: PointN<N>, shape: PointN<N>) -> Self {
        Self { minimum, shape }
    }
}

impl Extent3i {
    /// The box `[minimum, least_upper_bound)`, empty if any upper bound is below its minimum.
    #[inline]
    pub fn from_min_and_lub(minimum: Point3i, least_upper_bound: Point3i) -> Self {
        let shape = (least_upper_bound - minimum).join(&Point3i::ZERO);

        Self { minimum, shape }
    }

    /// Exclusive corner.
    #[inline]
    pub fn least_upper_bound(&self) -> Point3i {
        self.minimum + self.shape
    }

    /// Inclusive far corner. Only meaningful for nonempty extents.
    #[inline]
    pub fn max(&self) -> Point3i {
        self.least_upper_bound() - Point3i::ONES
    }

    #[inline]
    pub fn contains(&self, p: Point3i) -> bool {
        self.minimum <= p && p < self.least_upper_bound()
    }

    #[inline]
    pub fn num_points(&self) -> usize {
        self.shape.join(&Point3i::ZERO).volume() as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.num_points() == 0
    }

    /// The overlap of two boxes, possibly empty.
    #[inline]
    pub fn intersection(&self, other: &Self) -> Self {
        let minimum = self.minimum.join(&other.minimum);
        let lub = self.least_upper_bound().meet(&other.least_upper_bound());

        Self::from_min_and_lub(minimum, lub)
    }

    /// Empty extents are subsets of everything.
    #[inline]
    pub fn is_subset_of(&self, other: &Self) -> bool {
        self.is_empty() || self.intersection(other).eq(self)
    }

    /// Grows the box by `pad_amount` on each of its six faces.
    #[inline]
    pub fn padded(&self, pad_amount: i32) -> Self {
        Self::from_min_and_shape(
            self.minimum - Point3i::fill(pad_amount),
            self.shape + Point3i::fill(2 * pad_amount),
        )
    }

    /// The smallest extent containing every point `p` such that `p * scale` lies in `self`, i.e. the extent `self` covers on a
    /// lattice that is `scale` times coarser.
    #[inline]
    pub fn coarsened(&self, scale: i32) -> Self {
        Self::from_min_and_lub(
            self.minimum.scalar_div_floor(scale),
            self.least_upper_bound().scalar_div_ceil(scale),
        )
    }

    /// Iterate over all points in the extent, in (y, x, z) row-major order: `z` varies fastest.
    /// ```
    /// # use scroll_lattice_core::prelude::*;
    /// let extent = Extent3i::from_min_and_shape(PointN([0, 0, 0]), PointN([2, 1, 2]));
    /// assert_eq!(extent.iter_points().collect::<Vec<_>>(), vec![
    ///     PointN([0, 0, 0]), PointN([0, 0, 1]), PointN([1, 0, 0]), PointN([1, 0, 1])
    /// ]);
    /// ```
    #[inline]
    pub fn iter_points(&self) -> Extent3PointIter<i32> {
        let lub = self.least_upper_bound();

        Extent3PointIter {
            product_iter: iproduct!(
                self.minimum.y()..lub.y(),
                self.minimum.x()..lub.x(),
                self.minimum.z()..lub.z()
            ),
        }
    }
}

/// Row-major iterator returned by `Extent3i::iter_points`.
pub struct Extent3PointIter<T>
where
    T: Clone,
    Range<T>: Iterator<Item = T>,
{
    product_iter: ConsTuples<RangeProduct3<T>, ((T, T), T)>,
}

type RangeProduct2<T> = Product<Range<T>, Range<T>>;
type RangeProduct3<T> = Product<RangeProduct2<T>, Range<T>>;

impl<T> Iterator for Extent3PointIter<T>
where
    T: Clone,
    Range<T>: Iterator<Item = T>,
{
    type Item = Point3<T>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.product_iter.next().map(|(y, x, z)| PointN([y, x, z]))
    }
}

// ████████╗███████╗███████╗████████╗███████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝
//    ██║   █████╗  ███████╗   ██║   ███████╗
//    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║
//    ██║   ███████╗███████║   ██║   ███████║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝

//! Dense 3D arrays located in the volume's lattice.
//!
//! An `Array3` contains data at exactly the set of points in its `Extent3i`, and no more. The extent's minimum is the
//! array's position in the ambient volume, so a decoded tile "knows" its own origin and a box read from a level dataset keeps
//! its level coordinates.
//!
//! Values are stored row-major over (y, x, z), with `z` varying fastest, which is the order used everywhere in this workspace.
//!
//! ```
//! use scroll_lattice_core::prelude::*;
//! use scroll_lattice_storage::prelude::*;
//!
//! let extent = Extent3i::from_min_and_shape(PointN([10, 0, 0]), Point3i::fill(4));
//! let mut array = Array3::fill(extent, 0u16);
//!
//! // Indexing uses global (ambient) coordinates.
//! *array.get_mut(PointN([11, 2, 3])) = 7;
//! assert_eq!(array.get(PointN([11, 2, 3])), 7);
//! assert_eq!(array.get_local(PointN([1, 2, 3])), 7);
//! ```

use scroll_lattice_core::prelude::*;

use serde::{Deserialize, Serialize};

/// A map from lattice location `Point3i` to data `T`, stored as a flat array on the heap.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Array3<T> {
    values: Vec<T>,
    extent: Extent3i,
}

impl<T> Array3<T> {
    /// Create a new `Array3` directly from the extent and values. This asserts that the number of points in the extent matches
    /// the length of the values `Vec`.
    pub fn new(extent: Extent3i, values: Vec<T>) -> Self {
        assert_eq!(extent.num_points(), values.len());

        Self { values, extent }
    }

    /// Creates an array that fills the entire `extent` with the same `value`.
    pub fn fill(extent: Extent3i, value: T) -> Self
    where
        T: Clone,
    {
        Self::new(extent, vec![value; extent.num_points()])
    }

    /// Create a new array for `extent` where each point's value is determined by the `filler` function.
    pub fn fill_with(extent: Extent3i, filler: impl FnMut(Point3i) -> T) -> Self {
        let values = extent.iter_points().map(filler).collect();

        Self::new(extent, values)
    }

    #[inline]
    pub fn extent(&self) -> &Extent3i {
        &self.extent
    }

    #[inline]
    pub fn values_slice(&self) -> &[T] {
        &self.values
    }

    #[inline]
    pub fn values_mut_slice(&mut self) -> &mut [T] {
        &mut self.values
    }

    /// Returns `true` iff this array contains point `p`.
    #[inline]
    pub fn contains(&self, p: Point3i) -> bool {
        self.extent.contains(p)
    }

    /// The flat offset of an extent-local point.
    #[inline]
    pub fn stride_from_local_point(&self, p: Point3i) -> usize {
        let s = self.extent.shape;

        ((p.y() as usize * s.x() as usize) + p.x() as usize) * s.z() as usize + p.z() as usize
    }

    /// The value at global point `p`. Panics if `p` is out of bounds.
    #[inline]
    pub fn get(&self, p: Point3i) -> T
    where
        T: Copy,
    {
        self.get_local(p - self.extent.minimum)
    }

    /// The value at extent-local point `p`. Panics if `p` is out of bounds.
    #[inline]
    pub fn get_local(&self, p: Point3i) -> T
    where
        T: Copy,
    {
        debug_assert!(Point3i::ZERO <= p && p < self.extent.shape);

        self.values[self.stride_from_local_point(p)]
    }

    /// Mutable access to the value at global point `p`. Panics if `p` is out of bounds.
    #[inline]
    pub fn get_mut(&mut self, p: Point3i) -> &mut T {
        let local = p - self.extent.minimum;
        debug_assert!(Point3i::ZERO <= local && local < self.extent.shape);
        let stride = self.stride_from_local_point(local);

        &mut self.values[stride]
    }

    /// Fill `extent` (clipped to this array) with `value`.
    pub fn fill_extent(&mut self, extent: &Extent3i, value: T)
    where
        T: Clone,
    {
        let in_bounds = extent.intersection(&self.extent);
        if in_bounds == self.extent {
            self.values.iter_mut().for_each(|v| *v = value.clone());
        } else {
            for p in in_bounds.iter_points() {
                *self.get_mut(p) = value.clone();
            }
        }
    }

    /// Copies the part of `src` that overlaps `extent` into `self`. Points outside of either array are skipped.
    pub fn copy_extent_from(&mut self, src: &Array3<T>, extent: &Extent3i)
    where
        T: Copy,
    {
        let overlap = extent
            .intersection(&self.extent)
            .intersection(src.extent());
        if overlap.is_empty() {
            return;
        }

        // Copy whole z runs at once, since z is the contiguous axis of both arrays.
        let run = overlap.shape.z() as usize;
        let lub = overlap.least_upper_bound();
        for y in overlap.minimum.y()..lub.y() {
            for x in overlap.minimum.x()..lub.x() {
                let start = PointN([y, x, overlap.minimum.z()]);
                let src_offset = src.stride_from_local_point(start - src.extent.minimum);
                let dst_offset = self.stride_from_local_point(start - self.extent.minimum);
                self.values[dst_offset..dst_offset + run]
                    .copy_from_slice(&src.values[src_offset..src_offset + run]);
            }
        }
    }

    /// A new array containing a copy of the values in `extent`, which must be a subset of this array's extent.
    pub fn extract(&self, extent: &Extent3i) -> Array3<T>
    where
        T: Copy + Default,
    {
        debug_assert!(extent.is_subset_of(&self.extent));

        let mut dst = Array3::fill(*extent, T::default());
        dst.copy_extent_from(self, extent);

        dst
    }

    /// Visit every point and value, in row-major order.
    pub fn for_each(&self, mut f: impl FnMut(Point3i, T))
    where
        T: Copy,
    {
        for (p, v) in self.extent.iter_points().zip(self.values.iter()) {
            f(p, *v);
        }
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

    use pretty_assertions::assert_eq;

    #[test]
    fn fill_with_visits_points_in_storage_order() {
        let extent = Extent3i::from_min_and_shape(PointN([1, 2, 3]), PointN([2, 3, 4]));
        let array = Array3::fill_with(extent, |p| p);

        array.for_each(|p, v| assert_eq!(p, v));
        assert_eq!(array.values_slice()[1], PointN([1, 2, 4]));
    }

    #[test]
    fn copy_extent_between_offset_arrays() {
        let src_extent = Extent3i::from_min_and_shape(Point3i::ZERO, Point3i::fill(8));
        let src = Array3::fill_with(src_extent, |p| (p.y() * 100 + p.x() * 10 + p.z()) as u16);

        let dst_extent = Extent3i::from_min_and_shape(Point3i::fill(4), Point3i::fill(8));
        let mut dst = Array3::fill(dst_extent, 0u16);
        dst.copy_extent_from(&src, &dst_extent);

        dst.for_each(|p, v| {
            if src_extent.contains(p) {
                assert_eq!(v, src.get(p));
            } else {
                assert_eq!(v, 0);
            }
        });
    }

    #[test]
    fn extract_keeps_global_coordinates() {
        let extent = Extent3i::from_min_and_shape(Point3i::ZERO, Point3i::fill(6));
        let array = Array3::fill_with(extent, |p| p.z());

        let sub_extent = Extent3i::from_min_and_shape(PointN([1, 2, 3]), PointN([2, 2, 2]));
        let sub = array.extract(&sub_extent);

        assert_eq!(sub.extent(), &sub_extent);
        assert_eq!(sub.get(PointN([2, 3, 4])), 4);
    }

    #[test]
    fn fill_extent_clips_to_array() {
        let extent = Extent3i::from_min_and_shape(Point3i::ZERO, Point3i::fill(4));
        let mut array = Array3::fill(extent, 0u8);

        array.fill_extent(&Extent3i::from_min_and_shape(PointN([3, 3, 3]), Point3i::fill(5)), 1);

        assert_eq!(array.values_slice().iter().filter(|&&v| v == 1).count(), 1);
        assert_eq!(array.get(PointN([3, 3, 3])), 1);
    }
}

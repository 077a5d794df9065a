use crate::Array3;

use scroll_lattice_core::prelude::*;

/// Produces the level-`scale` version of an array of base-resolution voxels.
pub trait Downsampler<T> {
    /// Samples `src` onto a lattice that is `scale` times coarser. The returned array is positioned in level coordinates, at
    /// `floor(src.minimum / scale)`, with shape `ceil(src.shape / scale)`.
    fn downsample(&self, src: &Array3<T>, scale: i32) -> Array3<T>;
}

/// Every output voxel is the mean of the `scale³` block of source voxels it covers. Blocks are anchored at the source array's
/// minimum, and the partial blocks at the far faces are averaged over only the voxels they contain.
#[derive(Clone, Copy, Debug, Default)]
pub struct AreaDownsampler;

impl Downsampler<u16> for AreaDownsampler {
    fn downsample(&self, src: &Array3<u16>, scale: i32) -> Array3<u16> {
        assert!(scale > 0);

        let src_extent = *src.extent();
        let dst_extent = Extent3i::from_min_and_shape(
            src_extent.minimum.scalar_div_floor(scale),
            src_extent.shape.scalar_div_ceil(scale),
        );
        if scale == 1 {
            return Array3::new(dst_extent, src.values_slice().to_vec());
        }

        let block_shape = Point3i::fill(scale);
        let src_local = Extent3i::from_min_and_shape(Point3i::ZERO, src_extent.shape);
        let dst_local = Extent3i::from_min_and_shape(Point3i::ZERO, dst_extent.shape);

        // PERF: the access pattern here might not be very cache friendly
        let values = dst_local
            .iter_points()
            .map(|p_dst| {
                let block = Extent3i::from_min_and_shape(p_dst * scale, block_shape).intersection(&src_local);
                let mut sum = 0u64;
                for p_src in block.iter_points() {
                    sum += u64::from(src.get_local(p_src));
                }
                let count = block.num_points() as u64;

                // Round half up.
                ((sum + count / 2) / count) as u16
            })
            .collect();

        Array3::new(dst_extent, values)
    }
}

/// Takes the first voxel of every block. Much cheaper than `AreaDownsampler`, and useful for previews.
#[derive(Clone, Copy, Debug, Default)]
pub struct PointDownsampler;

impl<T> Downsampler<T> for PointDownsampler
where
    T: Copy,
{
    fn downsample(&self, src: &Array3<T>, scale: i32) -> Array3<T> {
        assert!(scale > 0);

        let src_extent = *src.extent();
        let dst_extent = Extent3i::from_min_and_shape(
            src_extent.minimum.scalar_div_floor(scale),
            src_extent.shape.scalar_div_ceil(scale),
        );
        let dst_local = Extent3i::from_min_and_shape(Point3i::ZERO, dst_extent.shape);
        let values = dst_local
            .iter_points()
            .map(|p_dst| src.get_local(p_dst * scale))
            .collect();

        Array3::new(dst_extent, values)
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝

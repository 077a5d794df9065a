use scroll_lattice_core::prelude::*;
use scroll_lattice_storage::{Array3, StoreError, VolumeStore};

use tracing::{debug, info_span};

/// A cube of voxels around the viewpoint, loaded from one resolution level, that every frame is resampled from until the
/// next recenter.
///
/// The cube has `2 * pad + 1` voxels per side and is centered on `center` (level coordinates). Parts of the cube outside
/// the level are zero.
#[derive(Clone, Debug)]
pub struct CacheWindow {
    scale: i32,
    center: Point3i,
    pad: i32,
    voxels: Array3<u16>,
}

impl CacheWindow {
    /// The smallest pad such that a display square of half-extent `canvas_pad`, rotated arbitrarily about its center, stays
    /// inside the window: `ceil(sqrt(3 * canvas_pad²))`.
    pub fn pad_for_canvas(canvas_pad: i32) -> i32 {
        let c = f64::from(canvas_pad);

        (3.0 * c * c).sqrt().ceil() as i32
    }

    pub fn window_extent(center: Point3i, pad: i32) -> Extent3i {
        Extent3i::from_min_and_shape(center, Point3i::ONES).padded(pad)
    }

    /// Reads the window from level `scale` of `store`, clamping the read to the level's bounds. If `face_marker` is given,
    /// the six outermost faces of the cube are overwritten with it.
    pub fn load(
        store: &VolumeStore,
        scale: i32,
        center: Point3i,
        pad: i32,
        face_marker: Option<u16>,
    ) -> Result<Self, StoreError> {
        let span = info_span!("load_cache_window", scale, center = ?center.0, pad);
        let _guard = span.enter();

        let bounds = store
            .dataset(scale)
            .ok_or(StoreError::UnknownLevel(scale))?
            .bounds();
        let extent = Self::window_extent(center, pad);
        let mut voxels = Array3::fill(extent, 0);

        let in_bounds = extent.intersection(&bounds);
        if !in_bounds.is_empty() {
            let read = store.read_box(scale, &in_bounds)?;
            voxels.copy_extent_from(&read, &in_bounds);
        }
        debug!("Loaded {:?} of window {:?}", in_bounds, extent);

        let mut window = Self {
            scale,
            center,
            pad,
            voxels,
        };
        if let Some(marker) = face_marker {
            window.mark_faces(marker);
        }

        Ok(window)
    }

    /// Wraps existing voxels, which must cover exactly the window around `center`.
    pub fn from_voxels(scale: i32, center: Point3i, pad: i32, voxels: Array3<u16>) -> Self {
        assert_eq!(*voxels.extent(), Self::window_extent(center, pad));

        Self {
            scale,
            center,
            pad,
            voxels,
        }
    }

    fn mark_faces(&mut self, marker: u16) {
        let extent = *self.voxels.extent();
        for &axis in Axis3::ALL.iter() {
            let i = axis.index();
            let mut face_shape = extent.shape;
            face_shape.0[i] = 1;

            let low = Extent3i::from_min_and_shape(extent.minimum, face_shape);
            let mut high_min = extent.minimum;
            high_min.0[i] = extent.max().at(i);
            let high = Extent3i::from_min_and_shape(high_min, face_shape);

            self.voxels.fill_extent(&low, marker);
            self.voxels.fill_extent(&high, marker);
        }
    }

    pub fn scale(&self) -> i32 {
        self.scale
    }

    /// The window center, in level coordinates.
    pub fn center(&self) -> Point3i {
        self.center
    }

    pub fn pad(&self) -> i32 {
        self.pad
    }

    pub fn voxels(&self) -> &Array3<u16> {
        &self.voxels
    }

    /// The voxel at integer offset `offset` from the center, or 0 outside of the window.
    #[inline]
    pub fn get(&self, offset: Point3i) -> u16 {
        let p = self.center + offset;
        if self.voxels.contains(p) {
            self.voxels.get(p)
        } else {
            0
        }
    }

    /// Trilinear interpolation at `offset` from the center. Corners outside of the window count as 0.
    pub fn sample(&self, offset: Point3f) -> f64 {
        let base = offset.floor();
        let t = offset - base.as_f64();

        let mut value = 0.0;
        for &dy in [0, 1].iter() {
            let wy = if dy == 0 { 1.0 - t.y() } else { t.y() };
            for &dx in [0, 1].iter() {
                let wx = if dx == 0 { 1.0 - t.x() } else { t.x() };
                for &dz in [0, 1].iter() {
                    let wz = if dz == 0 { 1.0 - t.z() } else { t.z() };
                    let weight = wy * wx * wz;
                    if weight != 0.0 {
                        value += weight * f64::from(self.get(base + PointN([dy, dx, dz])));
                    }
                }
            }
        }

        value
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝

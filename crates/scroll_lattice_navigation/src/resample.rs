//! Resampling oblique slices out of a cache window.
//!
//! Every output pixel `(i, j)` of an `(rows, cols)` raster is the display point `(i - (rows - 1) / 2, j - (cols - 1) / 2, 0)`.
//! The sampling transform pulls it back into the window, where it is trilinearly interpolated.

use crate::CacheWindow;

use scroll_lattice_core::prelude::*;

use serde::{Deserialize, Serialize};

/// A row-major 2D image.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Raster<T> {
    rows: usize,
    cols: usize,
    pixels: Vec<T>,
}

impl<T> Raster<T> {
    pub fn new(rows: usize, cols: usize, pixels: Vec<T>) -> Self {
        assert_eq!(rows * cols, pixels.len());

        Self { rows, cols, pixels }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn pixels(&self) -> &[T] {
        &self.pixels
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> &T {
        &self.pixels[row * self.cols + col]
    }

    pub fn map<S>(&self, f: impl Fn(&T) -> S) -> Raster<S> {
        Raster::new(self.rows, self.cols, self.pixels.iter().map(f).collect())
    }
}

/// The display coordinates of output pixel `(row, col)`.
#[inline]
pub fn display_point(row: usize, col: usize, output_size: (usize, usize)) -> Point3f {
    let (rows, cols) = output_size;
    let half_rows = (rows as f64 - 1.0) / 2.0;
    let half_cols = (cols as f64 - 1.0) / 2.0;

    PointN([row as f64 - half_rows, col as f64 - half_cols, 0.0])
}

/// Samples a `(rows, cols)` slice from `window`. `transform` maps display coordinates to offsets from the window center, in
/// the window's level coordinates. Pixels that land outside of the window are 0.
pub fn render(window: &CacheWindow, transform: &Transform, output_size: (usize, usize)) -> Raster<u16> {
    let (rows, cols) = output_size;
    let mut pixels = Vec::with_capacity(rows * cols);

    // The transform is affine, so step along each row instead of transforming every pixel.
    let col_step = transform.apply_to_vector(PointN([0.0, 1.0, 0.0]));
    for row in 0..rows {
        let mut p = transform.apply_to_point(display_point(row, 0, output_size));
        for _ in 0..cols {
            let value = window.sample(p).round();
            pixels.push(value.max(0.0).min(f64::from(u16::MAX)) as u16);
            p += col_step;
        }
    }

    Raster::new(rows, cols, pixels)
}

/// The component-wise minimum and maximum of the window offsets that `render` would sample for `output_size`.
pub fn source_bounds(transform: &Transform, output_size: (usize, usize)) -> (Point3f, Point3f) {
    let (rows, cols) = output_size;
    let last_row = rows.saturating_sub(1);
    let last_col = cols.saturating_sub(1);

    // An affine image of a rectangle is bounded by the images of its corners.
    let corners = [(0, 0), (0, last_col), (last_row, 0), (last_row, last_col)];
    let mut points = corners
        .iter()
        .map(|&(row, col)| transform.apply_to_point(display_point(row, col, output_size)));
    let first = points
        .next()
        .unwrap_or_else(|| transform.apply_to_point(Point3f::ZERO));

    points.fold((first, first), |(min, max), p| (min.meet(&p), max.join(&p)))
}

/// Maps the `[min, max]` range of voxel values linearly onto the full 8-bit display range, clamping values outside of it.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ColorWindow {
    pub min: u16,
    pub max: u16,
}

impl Default for ColorWindow {
    fn default() -> Self {
        Self {
            min: 100 * 256,
            max: 230 * 256,
        }
    }
}

impl ColorWindow {
    #[inline]
    pub fn map_value(&self, value: u16) -> u8 {
        if self.max <= self.min {
            return if value > self.min { u8::MAX } else { 0 };
        }
        let clamped = value.max(self.min).min(self.max);
        let numerator = u32::from(clamped - self.min) * 255;
        let range = u32::from(self.max - self.min);

        ((numerator + range / 2) / range) as u8
    }

    pub fn apply(&self, raster: &Raster<u16>) -> Raster<u8> {
        raster.map(|&v| self.map_value(v))
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
    use rand::Rng;
    use scroll_lattice_storage::Array3;

    fn ramp_window(pad: i32) -> CacheWindow {
        let center = Point3i::fill(50);
        let extent = CacheWindow::window_extent(center, pad);
        let voxels = Array3::fill_with(extent, |p| (p.y() + 2 * p.x() + 3 * p.z()) as u16);

        CacheWindow::from_voxels(1, center, pad, voxels)
    }

    #[test]
    fn identity_render_is_the_center_slice() {
        let window = ramp_window(10);

        let raster = render(&window, &Transform::identity(), (5, 7));

        assert_eq!((raster.rows(), raster.cols()), (5, 7));
        for row in 0..5 {
            for col in 0..7 {
                let p = PointN([48 + row as i32, 47 + col as i32, 50]);
                assert_eq!(*raster.get(row, col), (p.y() + 2 * p.x() + 3 * p.z()) as u16);
            }
        }
    }

    #[test]
    fn pixels_outside_window_are_zero() {
        let window = ramp_window(2);

        let raster = render(&window, &Transform::identity(), (9, 1));

        assert_eq!(*raster.get(0, 0), 0);
        assert_eq!(*raster.get(1, 0), 0);
        assert!(*raster.get(4, 0) > 0);
        assert_eq!(*raster.get(8, 0), 0);
    }

    #[test]
    fn rotated_canvas_stays_in_padded_window() {
        let canvas_pad = 150;
        let pad = CacheWindow::pad_for_canvas(canvas_pad) as f64;
        let size = (2 * canvas_pad as usize + 1, 2 * canvas_pad as usize + 1);
        let mut rng = rand::thread_rng();

        for _ in 0..100 {
            let mut t = Transform::identity();
            for &axis in Axis3::ALL.iter() {
                t = t.compose(&Transform::rotation(axis, rng.gen_range(-1.0..1.0) * std::f64::consts::FRAC_PI_2));
            }
            let (min, max) = source_bounds(&t, size);
            assert!(min >= Point3f::fill(-pad) && max <= Point3f::fill(pad), "{:?} {:?}", min, max);
        }
    }

    #[test]
    fn source_bounds_of_identity() {
        let (min, max) = source_bounds(&Transform::identity(), (301, 201));

        assert_eq!(min, PointN([-150.0, -100.0, 0.0]));
        assert_eq!(max, PointN([150.0, 100.0, 0.0]));
    }

    #[test]
    fn color_window_clamps_and_rescales() {
        let color = ColorWindow::default();

        assert_eq!(color.map_value(0), 0);
        assert_eq!(color.map_value(100 * 256), 0);
        assert_eq!(color.map_value(165 * 256), 128);
        assert_eq!(color.map_value(230 * 256), 255);
        assert_eq!(color.map_value(u16::MAX), 255);

        let raster = Raster::new(1, 2, vec![0, u16::MAX]);
        assert_eq!(color.apply(&raster).pixels(), &[0, 255]);
    }
}

use scroll_lattice_core::prelude::*;
use scroll_lattice_storage::{encode_raw_tile, Array3};

use std::io;
use std::path::Path;

/// A linear ramp that is different along every axis, so transposed or shifted data never matches by accident.
pub fn gradient_value(p: Point3i) -> u16 {
    (p.y() + 2 * p.x() + 3 * p.z()) as u16
}

pub fn gradient_volume(extent: Extent3i) -> Array3<u16> {
    Array3::fill_with(extent, gradient_value)
}

/// Writes the raw artifact of every tile covering `roi`, clipped to `volume`, filled with the gradient.
pub fn write_gradient_tiles(
    dir: &Path,
    grid: TileGrid,
    roi: &Roi,
    volume: &Extent3i,
    extension: &str,
) -> io::Result<usize> {
    let mut count = 0;
    for key in grid.tiles_covering(roi) {
        let extent = grid.clipped_tile_extent(key, volume);
        let name = key
            .file_name(extension)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;
        std::fs::write(dir.join(name), encode_raw_tile(&gradient_volume(extent)))?;
        count += 1;
    }

    Ok(count)
}

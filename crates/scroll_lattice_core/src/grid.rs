//! Addressing of the fixed-size tiles a volume is fetched in.
//!
//! A tile with grid coordinates `(gy, gx, gz)` covers the base-resolution voxels `[g * edge, (g + 1) * edge)` on every axis,
//! clipped to the volume. Tiles are named `cell_yxz_{gy+1:03}_{gx+1:03}_{gz+1:03}`, which is the only link between a fetched
//! artifact and its place in the volume.

use crate::{Extent3i, Point3i, PointN};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The tile edge length of the reference volumes.
pub const TILE_EDGE: i32 = 500;

const TILE_NAME_PREFIX: &str = "cell_yxz_";

#[derive(Debug, Error, Eq, PartialEq)]
pub enum AddressingError {
    #[error("negative tile coordinates are not addressable: {0:?}")]
    NegativeCoordinate([i32; 3]),
    #[error("not a tile name: {0:?}")]
    MalformedTileName(String),
    #[error("invalid region of interest {0:?}, expected x0-x1,y0-y1,z0-z1")]
    InvalidRoi(String),
    #[error("invalid volume shape {0:?}, expected x,y,z")]
    InvalidShape(String),
}

/// The grid coordinates `(gy, gx, gz)` of one tile.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct TileKey(pub [i32; 3]);

impl TileKey {
    #[inline]
    pub fn new(gy: i32, gx: i32, gz: i32) -> Self {
        Self([gy, gx, gz])
    }

    #[inline]
    pub fn grid_point(&self) -> Point3i {
        PointN(self.0)
    }

    /// The deterministic name of this tile, without extension.
    pub fn name(&self) -> Result<String, AddressingError> {
        let [gy, gx, gz] = self.0;

        tile_id_to_name(gy, gx, gz)
    }

    /// The name of this tile's source artifact, e.g. `cell_yxz_001_001_002.tif`.
    pub fn file_name(&self, extension: &str) -> Result<String, AddressingError> {
        Ok(format!("{}.{}", self.name()?, extension))
    }
}

/// Geometry of the tile grid laid over the base resolution.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct TileGrid {
    pub tile_edge: i32,
}

impl Default for TileGrid {
    fn default() -> Self {
        Self {
            tile_edge: TILE_EDGE,
        }
    }
}

impl TileGrid {
    pub fn new(tile_edge: i32) -> Self {
        assert!(tile_edge > 0);

        Self { tile_edge }
    }

    /// The base-resolution corner of `key`.
    #[inline]
    pub fn tile_origin(&self, key: TileKey) -> Point3i {
        key.grid_point() * self.tile_edge
    }

    /// The unclipped base-resolution extent of `key`.
    #[inline]
    pub fn tile_extent(&self, key: TileKey) -> Extent3i {
        Extent3i::from_min_and_shape(self.tile_origin(key), Point3i::fill(self.tile_edge))
    }

    /// The part of `key` that lies inside `volume`.
    #[inline]
    pub fn clipped_tile_extent(&self, key: TileKey, volume: &Extent3i) -> Extent3i {
        self.tile_extent(key).intersection(volume)
    }

    /// Every tile needed to cover `roi`, in lexicographic (y, x, z) order, without duplicates.
    pub fn tiles_covering(&self, roi: &Roi) -> TilesCovering {
        let grid_extent = if roi.extent.is_empty() {
            Extent3i::from_min_and_shape(Point3i::ZERO, Point3i::ZERO)
        } else {
            Extent3i::from_min_and_lub(
                roi.extent.minimum.scalar_div_floor(self.tile_edge).join(&Point3i::ZERO),
                roi.extent
                    .least_upper_bound()
                    .scalar_div_ceil(self.tile_edge),
            )
        };

        TilesCovering::new(grid_extent)
    }
}

/// A region of interest in base-resolution coordinates, half-open on every axis.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Roi {
    pub extent: Extent3i,
}

impl Roi {
    pub fn new(y0: i32, y1: i32, x0: i32, x1: i32, z0: i32, z1: i32) -> Self {
        Self {
            extent: Extent3i::from_min_and_lub(PointN([y0, x0, z0]), PointN([y1, x1, z1])),
        }
    }

    /// Parses the command line notation `x0-x1,y0-y1,z0-z1`. Note that the text lists x first.
    pub fn parse_xyz(text: &str) -> Result<Self, AddressingError> {
        let invalid = || AddressingError::InvalidRoi(text.to_string());

        let ranges = text
            .split(',')
            .map(|range| {
                let (lo, hi) = range.trim().split_once('-').ok_or_else(invalid)?;
                let lo: i32 = lo.trim().parse().map_err(|_| invalid())?;
                let hi: i32 = hi.trim().parse().map_err(|_| invalid())?;
                if hi < lo {
                    return Err(invalid());
                }

                Ok((lo, hi))
            })
            .collect::<Result<Vec<_>, _>>()?;

        match ranges[..] {
            [(x0, x1), (y0, y1), (z0, z1)] => Ok(Self::new(y0, y1, x0, x1, z0, z1)),
            _ => Err(invalid()),
        }
    }
}

/// Parses a full volume shape given as `width,height,slices` into (y, x, z) order.
pub fn parse_shape_xyz(text: &str) -> Result<Point3i, AddressingError> {
    let invalid = || AddressingError::InvalidShape(text.to_string());

    let dims = text
        .split(',')
        .map(|d| match d.trim().parse::<i32>() {
            Ok(d) if d > 0 => Ok(d),
            _ => Err(invalid()),
        })
        .collect::<Result<Vec<_>, _>>()?;

    match dims[..] {
        [x, y, z] => Ok(PointN([y, x, z])),
        _ => Err(invalid()),
    }
}

/// Tiles covering `roi` on the reference 500-voxel grid.
pub fn tiles_covering(roi: &Roi) -> TilesCovering {
    TileGrid::default().tiles_covering(roi)
}

/// The 1-based, zero-padded name of the tile at `(gy, gx, gz)`.
pub fn tile_id_to_name(gy: i32, gx: i32, gz: i32) -> Result<String, AddressingError> {
    if gy < 0 || gx < 0 || gz < 0 {
        return Err(AddressingError::NegativeCoordinate([gy, gx, gz]));
    }

    Ok(format!(
        "{}{:03}_{:03}_{:03}",
        TILE_NAME_PREFIX,
        gy + 1,
        gx + 1,
        gz + 1
    ))
}

/// Parses a name produced by `tile_id_to_name`, with or without a file extension.
pub fn tile_name_to_id(name: &str) -> Result<TileKey, AddressingError> {
    let malformed = || AddressingError::MalformedTileName(name.to_string());

    let stem = name.split('.').next().unwrap_or(name);
    let coords = stem.strip_prefix(TILE_NAME_PREFIX).ok_or_else(malformed)?;

    let parsed = coords
        .split('_')
        .map(|c| match c.parse::<i32>() {
            Ok(one_based) if one_based >= 1 => Ok(one_based - 1),
            _ => Err(malformed()),
        })
        .collect::<Result<Vec<_>, _>>()?;

    let key = match parsed[..] {
        [gy, gx, gz] => TileKey::new(gy, gx, gz),
        _ => return Err(malformed()),
    };

    // Only the canonical zero-padding is accepted, so that names and keys are in bijection.
    if key.name()? != stem {
        return Err(malformed());
    }

    Ok(key)
}

/// A restartable iterator over the tiles of a grid extent. Clone it to iterate again from the same position.
#[derive(Clone, Debug)]
pub struct TilesCovering {
    grid_extent: Extent3i,
    next_index: usize,
    end_index: usize,
}

impl TilesCovering {
    fn new(grid_extent: Extent3i) -> Self {
        Self {
            grid_extent,
            next_index: 0,
            end_index: grid_extent.num_points(),
        }
    }

    /// The extent of grid coordinates being visited.
    pub fn grid_extent(&self) -> &Extent3i {
        &self.grid_extent
    }

    fn key_at(&self, index: usize) -> TileKey {
        let shape = self.grid_extent.shape;
        let (sx, sz) = (shape.x() as usize, shape.z() as usize);
        let offset = PointN([
            (index / (sx * sz)) as i32,
            ((index / sz) % sx) as i32,
            (index % sz) as i32,
        ]);

        TileKey((self.grid_extent.minimum + offset).0)
    }
}

impl Iterator for TilesCovering {
    type Item = TileKey;

    fn next(&mut self) -> Option<TileKey> {
        if self.next_index >= self.end_index {
            return None;
        }
        let key = self.key_at(self.next_index);
        self.next_index += 1;

        Some(key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.end_index - self.next_index;

        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for TilesCovering {}

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
    use rand::prelude::*;
    use std::collections::HashSet;

    #[test]
    fn tiles_are_lexicographic() {
        let tiles: Vec<_> = tiles_covering(&Roi::new(0, 1000, 499, 501, 0, 1)).collect();

        assert_eq!(
            tiles,
            vec![
                TileKey::new(0, 0, 0),
                TileKey::new(0, 1, 0),
                TileKey::new(1, 0, 0),
                TileKey::new(1, 1, 0),
            ]
        );
    }

    #[test]
    fn empty_roi_has_no_tiles() {
        assert_eq!(tiles_covering(&Roi::new(250, 250, 0, 10, 0, 10)).len(), 0);
    }

    #[test]
    fn negative_minimum_is_clamped_to_first_tile() {
        let tiles: Vec<_> = tiles_covering(&Roi::new(-700, 10, 0, 10, 0, 10)).collect();

        assert_eq!(tiles, vec![TileKey::new(0, 0, 0)]);
    }

    #[test]
    fn iteration_is_restartable() {
        let mut tiles = tiles_covering(&Roi::new(0, 1500, 0, 1000, 0, 600));
        tiles.next();
        let resumed = tiles.clone();

        assert_eq!(tiles.collect::<Vec<_>>(), resumed.collect::<Vec<_>>());
    }

    #[test]
    fn random_rois_are_covered_exactly_once() {
        let grid = TileGrid::default();
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..50 {
            let mut range = || {
                let lo = rng.gen_range(0..2000);
                (lo, lo + rng.gen_range(1..1200))
            };
            let ((y0, y1), (x0, x1), (z0, z1)) = (range(), range(), range());
            let roi = Roi::new(y0, y1, x0, x1, z0, z1);

            let tiles: Vec<_> = grid.tiles_covering(&roi).collect();
            let unique: HashSet<_> = tiles.iter().cloned().collect();
            assert_eq!(unique.len(), tiles.len());

            // Every tile touches the ROI.
            for &tile in tiles.iter() {
                assert!(!grid.tile_extent(tile).intersection(&roi.extent).is_empty());
            }

            // Spot check that ROI corners land in exactly one tile.
            for corner in [roi.extent.minimum, roi.extent.max()].iter() {
                let containing = tiles
                    .iter()
                    .filter(|&&t| grid.tile_extent(t).contains(*corner))
                    .count();
                assert_eq!(containing, 1);
            }

            let covered: i64 = tiles
                .iter()
                .map(|&t| grid.tile_extent(t).intersection(&roi.extent).num_points() as i64)
                .sum();
            assert_eq!(covered, roi.extent.shape.volume());
        }
    }

    #[test]
    fn tile_names_are_one_based_and_padded() {
        assert_eq!(
            tile_id_to_name(0, 4, 12),
            Ok("cell_yxz_001_005_013".to_string())
        );
        assert_eq!(
            TileKey::new(1, 2, 3).file_name("tif"),
            Ok("cell_yxz_002_003_004.tif".to_string())
        );
    }

    #[test]
    fn negative_tile_coordinates_are_rejected() {
        assert_eq!(
            tile_id_to_name(0, -1, 0),
            Err(AddressingError::NegativeCoordinate([0, -1, 0]))
        );
    }

    #[test]
    fn tile_names_round_trip() {
        let mut seen = HashSet::new();
        for key in tiles_covering(&Roi::new(0, 6000, 0, 1500, 0, 1000)) {
            let name = key.file_name("tif").unwrap();
            assert!(seen.insert(name.clone()));
            assert_eq!(tile_name_to_id(&name), Ok(key));
        }
        assert_eq!(
            tile_name_to_id("cell_yxz_1000_001_001"),
            Ok(TileKey::new(999, 0, 0))
        );
    }

    #[test]
    fn non_canonical_tile_names_are_rejected() {
        for name in ["cell_yxz_1_1_1", "cell_yxz_000_001_001", "cell_xyz_001_001_001", "cell_yxz_001_001"].iter() {
            assert!(tile_name_to_id(name).is_err(), "{}", name);
        }
    }

    #[test]
    fn parse_roi_in_xyz_notation() {
        assert_eq!(
            Roi::parse_xyz("0-1000,10-700,0-50"),
            Ok(Roi::new(10, 700, 0, 1000, 0, 50))
        );
        assert!(Roi::parse_xyz("0-1000,10-700").is_err());
        assert!(Roi::parse_xyz("5-1,0-1,0-1").is_err());
    }

    #[test]
    fn parse_shape_in_xyz_notation() {
        assert_eq!(parse_shape_xyz("8096,7888,14376"), Ok(PointN([7888, 8096, 14376])));
        assert!(parse_shape_xyz("8096,0,14376").is_err());
    }
}

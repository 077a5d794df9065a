//! Assembly of fetched tiles into the multi-resolution store.
//!
//! Every tile is written verbatim into the base level and downsampled into every coarser level. Assembly is a write-only pass:
//! nothing is read back, and where two tiles' downsampled footprints overlap, the later write wins.

use crate::{
    Array3, ArtifactStatus, AreaDownsampler, DatasetSchema, Downsampler, FetchError, DecodeError,
    ResolutionLevel, StoreError, TileArtifacts, TileDecoder, TileFetcher, VolumeStore,
    DEFAULT_CHUNK_EDGE,
};

use scroll_lattice_core::{prelude::*, AddressingError, TILE_EDGE};

use serde::{Deserialize, Serialize};
use std::time::Instant;
use thiserror::Error;
use tracing::{info, info_span};

#[derive(Debug, Error)]
pub enum AssemblyError {
    #[error(transparent)]
    Addressing(#[from] AddressingError),
    #[error("failed to fetch tile: {0}")]
    Fetch(#[from] FetchError),
    #[error("failed to decode tile {tile:?}: {source}")]
    Decode {
        tile: TileKey,
        #[source]
        source: DecodeError,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("tile {tile:?} decoded to {actual:?}, expected {expected:?}")]
    TileShapeMismatch {
        tile: TileKey,
        expected: Extent3i,
        actual: Extent3i,
    },
    #[error("the container has no base dataset, so the volume shape must be given")]
    MissingVolumeShape,
    #[error("{0:?} writes to the store, but no store was opened")]
    NoStore(AssemblyMode),
}

/// The geometry of a pyramid.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct PyramidConfig {
    /// Name of the base dataset. Coarser levels get a `_scale_{S}` suffix.
    pub base_name: String,
    /// Strictly increasing scale factors, starting at 1.
    pub scales: Vec<i32>,
    pub tile_edge: i32,
    pub chunk_shape: Point3i,
}

impl Default for PyramidConfig {
    fn default() -> Self {
        Self {
            base_name: "scroll".to_string(),
            scales: vec![1, 2, 4],
            tile_edge: TILE_EDGE,
            chunk_shape: Point3i::fill(DEFAULT_CHUNK_EDGE),
        }
    }
}

impl PyramidConfig {
    pub fn levels(&self) -> Vec<ResolutionLevel> {
        ResolutionLevel::sequence(&self.base_name, &self.scales)
    }

    pub fn grid(&self) -> TileGrid {
        TileGrid::new(self.tile_edge)
    }

    /// The shape of the level-`scale` dataset for a volume of `base_shape`.
    pub fn level_shape(base_shape: Point3i, scale: i32) -> Point3i {
        base_shape.scalar_div_ceil(scale)
    }
}

/// What an ROI pass does with each tile.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum AssemblyMode {
    /// Fetch missing artifacts, never touch the store.
    FetchOnly,
    /// Fetch missing artifacts and assemble only the newly fetched ones.
    FetchAndApply,
    /// Assemble every tile of the ROI from local artifacts, which must all be present.
    Apply,
    /// Log what would be done, without fetching or writing.
    DryRun,
}

impl AssemblyMode {
    pub fn allows_fetch(&self) -> bool {
        matches!(self, AssemblyMode::FetchOnly | AssemblyMode::FetchAndApply)
    }

    pub fn writes_store(&self) -> bool {
        matches!(self, AssemblyMode::FetchAndApply | AssemblyMode::Apply)
    }

    fn should_assemble(&self, status: ArtifactStatus) -> bool {
        match self {
            AssemblyMode::Apply => true,
            AssemblyMode::FetchAndApply => status == ArtifactStatus::Fetched,
            AssemblyMode::FetchOnly | AssemblyMode::DryRun => false,
        }
    }
}

/// Tile counts of one ROI pass.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct AssemblyReport {
    pub visited: usize,
    pub fetched: usize,
    pub assembled: usize,
    pub skipped: usize,
}

/// Writes decoded tiles into every level of a `VolumeStore`.
pub struct PyramidAssembler<'a, D = AreaDownsampler> {
    store: &'a VolumeStore,
    config: PyramidConfig,
    base_bounds: Extent3i,
    levels: Vec<(i32, DatasetSchema)>,
    downsampler: D,
}

impl<'a> PyramidAssembler<'a> {
    pub fn new(
        store: &'a mut VolumeStore,
        config: PyramidConfig,
        base_shape: Option<Point3i>,
    ) -> Result<Self, AssemblyError> {
        Self::with_downsampler(store, config, base_shape, AreaDownsampler)
    }
}

impl<'a, D> PyramidAssembler<'a, D>
where
    D: Downsampler<u16>,
{
    /// Declares the configured levels on `store` and opens or creates one dataset per level. `base_shape` may be omitted
    /// when the container already has a base dataset.
    pub fn with_downsampler(
        store: &'a mut VolumeStore,
        config: PyramidConfig,
        base_shape: Option<Point3i>,
        downsampler: D,
    ) -> Result<Self, AssemblyError> {
        if config.scales.first() != Some(&1) {
            return Err(StoreError::UnknownLevel(1).into());
        }
        store.declare_levels(&config.levels())?;

        let base_shape = match (base_shape, store.dataset(1)) {
            (Some(shape), _) => shape,
            (None, Some(existing)) => existing.shape,
            (None, None) => return Err(AssemblyError::MissingVolumeShape),
        };

        let mut levels = Vec::with_capacity(config.scales.len());
        for &scale in config.scales.iter() {
            let shape = PyramidConfig::level_shape(base_shape, scale);
            info!("Opening dataset for scale {}, shape {:?}", scale, shape);
            let schema = store.open_or_create(scale, shape, config.chunk_shape)?;
            levels.push((scale, schema));
        }

        Ok(Self {
            store,
            base_bounds: Extent3i::from_min_and_shape(Point3i::ZERO, base_shape),
            config,
            levels,
            downsampler,
        })
    }

    pub fn config(&self) -> &PyramidConfig {
        &self.config
    }

    pub fn store(&self) -> &VolumeStore {
        self.store
    }

    /// Writes a decoded tile into every level. The tile must cover exactly its grid cell, clipped to the volume.
    pub fn assemble_tile(&self, key: TileKey, tile: &Array3<u16>) -> Result<(), AssemblyError> {
        let expected = self
            .config
            .grid()
            .clipped_tile_extent(key, &self.base_bounds);
        if *tile.extent() != expected {
            return Err(AssemblyError::TileShapeMismatch {
                tile: key,
                expected,
                actual: *tile.extent(),
            });
        }

        for (scale, schema) in self.levels.iter() {
            info!("Writing zoom 1/{}", scale);
            if *scale == 1 {
                self.store.write_box(1, tile)?;
                continue;
            }

            // floor(o / S) + ceil(n / S) <= ceil((o + n) / S), so even clipped tiles whose edges are not multiples of the
            // scale stay inside the level.
            let level_tile = self.downsampler.downsample(tile, *scale);
            debug_assert!(level_tile.extent().is_subset_of(&schema.bounds()));
            self.store.write_box(*scale, &level_tile)?;
        }

        Ok(())
    }

    /// Runs an ROI pass that writes into this assembler's store.
    pub fn assemble_roi<F, C>(
        &self,
        roi: &Roi,
        mode: AssemblyMode,
        artifacts: &TileArtifacts<F>,
        decoder: &C,
    ) -> Result<AssemblyReport, AssemblyError>
    where
        F: TileFetcher,
        C: TileDecoder,
    {
        process_roi(self.config.grid(), roi, mode, artifacts, decoder, Some(self))
    }
}

/// Visits every tile covering `roi` in grid order, fetching and assembling according to `mode`. Modes that write to the store
/// need an `assembler`. The first error aborts the pass.
pub fn process_roi<F, C, D>(
    grid: TileGrid,
    roi: &Roi,
    mode: AssemblyMode,
    artifacts: &TileArtifacts<F>,
    decoder: &C,
    assembler: Option<&PyramidAssembler<D>>,
) -> Result<AssemblyReport, AssemblyError>
where
    F: TileFetcher,
    C: TileDecoder,
    D: Downsampler<u16>,
{
    if mode.writes_store() && assembler.is_none() {
        return Err(AssemblyError::NoStore(mode));
    }

    let tiles = grid.tiles_covering(roi);
    let total = tiles.len();
    info!("ROI {:?} covers {} tiles", roi.extent, total);

    let mut report = AssemblyReport::default();
    for (count, key) in tiles.enumerate() {
        let span = info_span!("tile", key = ?key.0);
        let _guard = span.enter();

        let start = Instant::now();
        let status = artifacts.ensure(key, mode.allows_fetch(), mode == AssemblyMode::DryRun)?;
        if status == ArtifactStatus::Fetched {
            report.fetched += 1;
            info!(
                "Fetched {} in {:.2}s",
                key.name()?,
                start.elapsed().as_secs_f64()
            );
        }

        match assembler {
            Some(assembler) if mode.should_assemble(status) => {
                let bytes = artifacts.read(key)?;
                let tile = decoder
                    .decode(&bytes, grid.tile_origin(key))
                    .map_err(|source| AssemblyError::Decode { tile: key, source })?;
                assembler.assemble_tile(key, &tile)?;
                report.assembled += 1;
            }
            _ => report.skipped += 1,
        }
        report.visited += 1;

        info!(
            "Done {:?}, {} / {} in {:.2}s",
            key.0,
            count + 1,
            total,
            start.elapsed().as_secs_f64()
        );
    }

    Ok(report)
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝

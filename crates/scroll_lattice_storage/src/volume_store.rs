//! The persistent, multi-resolution volume container.
//!
//! A container is one `sled` database directory. Each resolution level is its own dataset, stored in its own tree of
//! compressed chunks (see `ChunkDb`). A metadata tree records the declared level sequence and the schema of every dataset,
//! so that re-opening a container with a different geometry is caught instead of silently corrupting data.
//!
//! All levels share the coordinate origin: the level-`S` voxel `q` covers the base voxels `[q * S, (q + 1) * S)`.
//!
//! ```
//! use scroll_lattice_core::prelude::*;
//! use scroll_lattice_storage::prelude::*;
//!
//! let mut store = VolumeStore::open(&StoreConfig::temporary()).unwrap();
//! store.declare_levels(&ResolutionLevel::sequence("scroll", &[1, 2])).unwrap();
//! store.open_or_create(1, PointN([20, 20, 20]), Point3i::fill(8)).unwrap();
//!
//! let extent = Extent3i::from_min_and_shape(PointN([5, 5, 5]), Point3i::fill(4));
//! store.write_box(1, &Array3::fill(extent, 9)).unwrap();
//! assert_eq!(store.read_box(1, &extent).unwrap().values_slice(), &[9; 64][..]);
//! ```

use crate::{Array3, ChunkCompression, ChunkDb, ChunkDbError, Lz4};

use scroll_lattice_core::prelude::*;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info};

/// The default chunk shape of every dataset.
pub const DEFAULT_CHUNK_EDGE: i32 = 250;

const META_TREE: &str = "__scroll_lattice_meta";
const LEVELS_KEY: &[u8] = b"levels";
const DATASET_KEY_PREFIX: &str = "dataset/";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("schema mismatch in dataset {dataset:?}: {reason}")]
    SchemaMismatch { dataset: String, reason: String },
    #[error("store I/O error: {0}")]
    StoreIo(#[from] ChunkDbError),
    #[error("store metadata is unreadable: {0}")]
    Metadata(#[from] bincode::Error),
    #[error("{extent:?} is outside of dataset {dataset:?} with bounds {bounds:?}")]
    OutOfRange {
        dataset: String,
        extent: Extent3i,
        bounds: Extent3i,
    },
    #[error("no resolution level with scale factor {0}")]
    UnknownLevel(i32),
    #[error("container {0:?} has no datasets")]
    EmptyContainer(PathBuf),
}

impl From<sled::Error> for StoreError {
    fn from(e: sled::Error) -> Self {
        StoreError::StoreIo(ChunkDbError::Sled(e))
    }
}

/// How to open the `sled` database backing a `VolumeStore`.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct StoreConfig {
    /// Container directory. Ignored when `temporary` is set and this is `None`.
    pub path: Option<PathBuf>,
    /// Delete the container when the store is dropped.
    pub temporary: bool,
    /// Size of sled's page cache, in bytes.
    pub cache_capacity: u64,
    pub lz4_level: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: None,
            temporary: false,
            cache_capacity: 1 << 30,
            lz4_level: Lz4::default().level,
        }
    }
}

impl StoreConfig {
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            ..Default::default()
        }
    }

    /// An in-memory container that is discarded on drop. Handy for tests.
    pub fn temporary() -> Self {
        Self {
            temporary: true,
            cache_capacity: 64 << 20,
            ..Default::default()
        }
    }

    fn sled_config(&self) -> sled::Config {
        let mut config = sled::Config::default()
            .temporary(self.temporary)
            .cache_capacity(self.cache_capacity)
            .use_compression(false);
        if let Some(path) = &self.path {
            config = config.path(path);
        }

        config
    }
}

/// A scale factor and the name of the dataset storing that level.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct ResolutionLevel {
    pub scale: i32,
    pub dataset: String,
}

impl ResolutionLevel {
    /// `base_name` for the base resolution, `{base_name}_scale_{scale}` otherwise.
    pub fn new(base_name: &str, scale: i32) -> Self {
        let dataset = if scale == 1 {
            base_name.to_string()
        } else {
            format!("{}_scale_{}", base_name, scale)
        };

        Self { scale, dataset }
    }

    pub fn sequence(base_name: &str, scales: &[i32]) -> Vec<Self> {
        scales.iter().map(|&s| Self::new(base_name, s)).collect()
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum VoxelType {
    U16,
}

/// Geometry and element type of one dataset.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct DatasetSchema {
    pub shape: Point3i,
    pub chunk_shape: Point3i,
    pub voxel_type: VoxelType,
}

impl DatasetSchema {
    pub fn bounds(&self) -> Extent3i {
        Extent3i::from_min_and_shape(Point3i::ZERO, self.shape)
    }
}

struct Dataset {
    level: ResolutionLevel,
    schema: DatasetSchema,
    chunks: ChunkDb<Lz4>,
}

/// One chunked `u16` array per resolution level, persisted in a `sled` database.
///
/// The store supports a single writer and many readers. Reads are not isolated from concurrent writes, so callers must not
/// assemble and navigate the same container at the same time.
pub struct VolumeStore {
    db: sled::Db,
    meta: sled::Tree,
    path: PathBuf,
    compression: Lz4,
    levels: Vec<ResolutionLevel>,
    datasets: Vec<Dataset>,
}

impl VolumeStore {
    /// Opens the container described by `config`, creating an empty one if it doesn't exist.
    pub fn open(config: &StoreConfig) -> Result<Self, StoreError> {
        let db = config.sled_config().open()?;
        let meta = db.open_tree(META_TREE)?;
        let compression = Lz4 {
            level: config.lz4_level,
        };

        let mut store = Self {
            path: config.path.clone().unwrap_or_default(),
            db,
            meta,
            compression,
            levels: Vec::new(),
            datasets: Vec::new(),
        };
        store.load_metadata()?;

        Ok(store)
    }

    /// Opens a container that must already hold at least one dataset.
    pub fn open_existing(config: &StoreConfig) -> Result<Self, StoreError> {
        let store = Self::open(config)?;
        if store.datasets.is_empty() {
            return Err(StoreError::EmptyContainer(store.path));
        }

        Ok(store)
    }

    fn load_metadata(&mut self) -> Result<(), StoreError> {
        if let Some(bytes) = self.meta.get(LEVELS_KEY)? {
            self.levels = bincode::deserialize(&bytes)?;
        }
        for level in self.levels.clone().into_iter() {
            if let Some(bytes) = self.meta.get(dataset_key(&level.dataset))? {
                let schema: DatasetSchema = bincode::deserialize(&bytes)?;
                self.attach_dataset(level, schema)?;
            }
        }

        Ok(())
    }

    fn attach_dataset(&mut self, level: ResolutionLevel, schema: DatasetSchema) -> Result<(), StoreError> {
        let tree = self.db.open_tree(&level.dataset)?;
        let chunks = ChunkDb::new(tree, ChunkCompression::new(self.compression));
        self.datasets.push(Dataset {
            level,
            schema,
            chunks,
        });
        self.datasets.sort_by_key(|d| d.level.scale);

        Ok(())
    }

    /// Fixes the resolution levels of this container. The first call on a new container records `levels`, which must have
    /// strictly increasing positive scales. Later calls must pass the same sequence.
    pub fn declare_levels(&mut self, levels: &[ResolutionLevel]) -> Result<(), StoreError> {
        if !self.levels.is_empty() {
            if self.levels.as_slice() != levels {
                return Err(StoreError::SchemaMismatch {
                    dataset: META_TREE.to_string(),
                    reason: format!(
                        "container declares levels {:?}, requested {:?}",
                        self.levels, levels
                    ),
                });
            }
            return Ok(());
        }

        let increasing = levels.windows(2).all(|w| w[0].scale < w[1].scale);
        if levels.is_empty() || levels[0].scale < 1 || !increasing {
            return Err(StoreError::SchemaMismatch {
                dataset: META_TREE.to_string(),
                reason: format!("scales must be positive and strictly increasing, got {:?}", levels),
            });
        }

        self.meta.insert(LEVELS_KEY, bincode::serialize(levels)?)?;
        self.levels = levels.to_vec();
        info!("Declared resolution levels {:?}", self.levels.iter().map(|l| l.scale).collect::<Vec<_>>());

        Ok(())
    }

    /// Makes sure the dataset for level `scale` exists with the given geometry. Idempotent; an existing dataset with a
    /// different geometry fails with `SchemaMismatch`.
    pub fn open_or_create(
        &mut self,
        scale: i32,
        shape: Point3i,
        chunk_shape: Point3i,
    ) -> Result<DatasetSchema, StoreError> {
        let level = self
            .levels
            .iter()
            .find(|l| l.scale == scale)
            .cloned()
            .ok_or(StoreError::UnknownLevel(scale))?;
        let schema = DatasetSchema {
            shape,
            chunk_shape,
            voxel_type: VoxelType::U16,
        };

        if let Some(existing) = self.datasets.iter().find(|d| d.level.scale == scale) {
            if existing.schema != schema {
                return Err(StoreError::SchemaMismatch {
                    dataset: level.dataset,
                    reason: format!("existing {:?}, requested {:?}", existing.schema, schema),
                });
            }
            return Ok(schema);
        }

        if !(shape >= Point3i::ZERO && chunk_shape > Point3i::ZERO) {
            return Err(StoreError::SchemaMismatch {
                dataset: level.dataset,
                reason: format!("invalid geometry {:?}", schema),
            });
        }

        self.meta
            .insert(dataset_key(&level.dataset), bincode::serialize(&schema)?)?;
        info!(
            "Created dataset {:?} with shape {:?} and chunk shape {:?}",
            level.dataset, shape, chunk_shape
        );
        self.attach_dataset(level, schema)?;

        Ok(schema)
    }

    /// The declared levels, in increasing scale order.
    pub fn levels(&self) -> &[ResolutionLevel] {
        &self.levels
    }

    /// The schema of level `scale`, if that dataset exists.
    pub fn dataset(&self, scale: i32) -> Option<&DatasetSchema> {
        self.datasets
            .iter()
            .find(|d| d.level.scale == scale)
            .map(|d| &d.schema)
    }

    /// The chunk database backing level `scale`, for inspecting or repairing stored chunks directly.
    pub fn chunk_db(&self, scale: i32) -> Option<&ChunkDb<Lz4>> {
        self.datasets
            .iter()
            .find(|d| d.level.scale == scale)
            .map(|d| &d.chunks)
    }

    /// Level scales that have a dataset, in increasing order.
    pub fn dataset_scales(&self) -> Vec<i32> {
        self.datasets.iter().map(|d| d.level.scale).collect()
    }

    /// The largest scale `S` with a dataset such that `S <= 1 / zoom`, or the smallest scale if there is none.
    pub fn level_for_zoom(&self, zoom: f64) -> Option<i32> {
        let max_scale = 1.0 / zoom;
        let chosen = self
            .datasets
            .iter()
            .map(|d| d.level.scale)
            .filter(|&s| f64::from(s) <= max_scale + 1e-9)
            .last()
            .or_else(|| self.datasets.first().map(|d| d.level.scale));
        debug!("Zoom {} selects level {:?}", zoom, chosen);

        chosen
    }

    fn get_dataset(&self, scale: i32) -> Result<&Dataset, StoreError> {
        self.datasets
            .iter()
            .find(|d| d.level.scale == scale)
            .ok_or(StoreError::UnknownLevel(scale))
    }

    /// Reads the dense contents of `extent` from level `scale`. Chunks that were never written read as zero.
    pub fn read_box(&self, scale: i32, extent: &Extent3i) -> Result<Array3<u16>, StoreError> {
        let dataset = self.get_dataset(scale)?;
        dataset.check_in_bounds(extent)?;

        let mut dst = Array3::fill(*extent, 0);
        for chunk_coords in dataset.chunks_overlapping(extent).iter_points() {
            let chunk_extent = dataset.chunk_extent(chunk_coords);
            if let Some(chunk) = dataset.chunks.read_chunk::<u16>(chunk_coords, chunk_extent)? {
                dst.copy_extent_from(&chunk, extent);
            }
        }

        Ok(dst)
    }

    /// Writes `src` to level `scale` at `src.extent().minimum`. The whole array must lie in the dataset's bounds. All chunks
    /// touched by one call are replaced in a single atomic batch.
    pub fn write_box(&self, scale: i32, src: &Array3<u16>) -> Result<(), StoreError> {
        let dataset = self.get_dataset(scale)?;
        let extent = *src.extent();
        dataset.check_in_bounds(&extent)?;

        let mut dirty_chunks = Vec::new();
        for chunk_coords in dataset.chunks_overlapping(&extent).iter_points() {
            let chunk_extent = dataset.chunk_extent(chunk_coords);
            let mut chunk = if chunk_extent.is_subset_of(&extent) {
                Array3::fill(chunk_extent, 0)
            } else {
                dataset
                    .chunks
                    .read_chunk::<u16>(chunk_coords, chunk_extent)?
                    .unwrap_or_else(|| Array3::fill(chunk_extent, 0))
            };
            chunk.copy_extent_from(src, &extent);
            dirty_chunks.push((chunk_coords, chunk));
        }

        debug!(
            "Writing {} chunks of {:?} for {:?}",
            dirty_chunks.len(),
            dataset.level.dataset,
            extent
        );
        dataset
            .chunks
            .write_chunks(dirty_chunks.iter().map(|(k, v)| (*k, v)))?;

        Ok(())
    }

    /// Blocks until all buffered writes are durable.
    pub fn flush(&self) -> Result<(), StoreError> {
        for dataset in self.datasets.iter() {
            dataset.chunks.flush()?;
        }
        self.db.flush()?;

        Ok(())
    }

    /// Flushes and releases the container.
    pub fn close(self) -> Result<(), StoreError> {
        self.flush()?;
        info!("Closed volume store {:?}", self.path);

        Ok(())
    }
}

impl Dataset {
    fn check_in_bounds(&self, extent: &Extent3i) -> Result<(), StoreError> {
        let bounds = self.schema.bounds();
        if extent.is_subset_of(&bounds) {
            Ok(())
        } else {
            Err(StoreError::OutOfRange {
                dataset: self.level.dataset.clone(),
                extent: *extent,
                bounds,
            })
        }
    }

    /// The chunk coordinates of every chunk overlapping `extent`.
    fn chunks_overlapping(&self, extent: &Extent3i) -> Extent3i {
        if extent.is_empty() {
            return Extent3i::from_min_and_shape(Point3i::ZERO, Point3i::ZERO);
        }
        let chunk_shape = self.schema.chunk_shape;
        let lub = extent.least_upper_bound() + chunk_shape - Point3i::ONES;

        Extent3i::from_min_and_lub(
            extent.minimum.vector_div_floor(&chunk_shape),
            lub.vector_div_floor(&chunk_shape),
        )
    }

    fn chunk_extent(&self, chunk_coords: Point3i) -> Extent3i {
        let chunk_shape = self.schema.chunk_shape;

        Extent3i::from_min_and_shape(chunk_coords * chunk_shape, chunk_shape)
    }
}

fn dataset_key(dataset: &str) -> Vec<u8> {
    format!("{}{}", DATASET_KEY_PREFIX, dataset).into_bytes()
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

    fn small_store() -> VolumeStore {
        let mut store = VolumeStore::open(&StoreConfig::temporary()).unwrap();
        store
            .declare_levels(&ResolutionLevel::sequence("scroll", &[1, 2, 4]))
            .unwrap();
        store
            .open_or_create(1, PointN([40, 30, 20]), Point3i::fill(8))
            .unwrap();

        store
    }

    #[test]
    fn dataset_names_follow_scale() {
        let levels = ResolutionLevel::sequence("scroll", &[1, 2, 4]);
        let names: Vec<_> = levels.iter().map(|l| l.dataset.as_str()).collect();

        assert_eq!(names, vec!["scroll", "scroll_scale_2", "scroll_scale_4"]);
    }

    #[test]
    fn unwritten_voxels_read_as_zero() {
        let store = small_store();

        let extent = Extent3i::from_min_and_shape(PointN([3, 5, 7]), PointN([10, 10, 10]));
        let read = store.read_box(1, &extent).unwrap();

        assert_eq!(read, Array3::fill(extent, 0));
    }

    #[test]
    fn write_then_read_random_boxes() {
        let store = small_store();
        let bounds = store.dataset(1).unwrap().bounds();
        let mut rng = rand::thread_rng();
        let mut reference = Array3::fill(bounds, 0u16);

        for _ in 0..20 {
            let min = PointN([
                rng.gen_range(0..30),
                rng.gen_range(0..20),
                rng.gen_range(0..10),
            ]);
            let shape = PointN([rng.gen_range(1..11), rng.gen_range(1..11), rng.gen_range(1..11)]);
            let extent = Extent3i::from_min_and_shape(min, shape);
            let src = Array3::fill_with(extent, |_| rng.gen());

            store.write_box(1, &src).unwrap();
            reference.copy_extent_from(&src, &extent);
        }

        assert_eq!(store.read_box(1, &bounds).unwrap(), reference);
    }

    #[test]
    fn out_of_range_boxes_are_rejected() {
        let store = small_store();
        let extent = Extent3i::from_min_and_shape(PointN([35, 0, 0]), Point3i::fill(10));

        assert!(matches!(
            store.read_box(1, &extent),
            Err(StoreError::OutOfRange { .. })
        ));
        assert!(matches!(
            store.write_box(1, &Array3::fill(extent, 1)),
            Err(StoreError::OutOfRange { .. })
        ));
        let negative = Extent3i::from_min_and_shape(PointN([-1, 0, 0]), Point3i::fill(2));
        assert!(matches!(
            store.read_box(1, &negative),
            Err(StoreError::OutOfRange { .. })
        ));
    }

    #[test]
    fn open_or_create_is_idempotent_and_checks_schema() {
        let mut store = small_store();

        assert!(store
            .open_or_create(1, PointN([40, 30, 20]), Point3i::fill(8))
            .is_ok());
        assert!(matches!(
            store.open_or_create(1, PointN([40, 30, 21]), Point3i::fill(8)),
            Err(StoreError::SchemaMismatch { .. })
        ));
        assert!(matches!(
            store.open_or_create(3, PointN([10, 10, 10]), Point3i::fill(8)),
            Err(StoreError::UnknownLevel(3))
        ));
        assert!(matches!(
            store.read_box(2, &Extent3i::from_min_and_shape(Point3i::ZERO, Point3i::ONES)),
            Err(StoreError::UnknownLevel(2))
        ));
    }

    #[test]
    fn redeclaring_different_levels_fails() {
        let mut store = small_store();

        assert!(store
            .declare_levels(&ResolutionLevel::sequence("scroll", &[1, 2, 4]))
            .is_ok());
        assert!(matches!(
            store.declare_levels(&ResolutionLevel::sequence("scroll", &[1, 2])),
            Err(StoreError::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn reopened_container_keeps_levels_and_data() {
        let dir = tempdir::TempDir::new("volume_store").unwrap();
        let config = StoreConfig::at_path(dir.path().join("container"));
        let extent = Extent3i::from_min_and_shape(PointN([2, 3, 4]), Point3i::fill(5));

        {
            let mut store = VolumeStore::open(&config).unwrap();
            assert!(matches!(
                VolumeStore::open_existing(&StoreConfig::at_path(dir.path().join("empty"))),
                Err(StoreError::EmptyContainer(_))
            ));
            store
                .declare_levels(&ResolutionLevel::sequence("scroll", &[1, 2]))
                .unwrap();
            store.open_or_create(1, Point3i::fill(16), Point3i::fill(4)).unwrap();
            store.write_box(1, &Array3::fill(extent, 42)).unwrap();
            store.close().unwrap();
        }

        let store = VolumeStore::open_existing(&config).unwrap();
        assert_eq!(store.levels(), &ResolutionLevel::sequence("scroll", &[1, 2])[..]);
        assert_eq!(store.dataset_scales(), vec![1]);
        assert_eq!(store.read_box(1, &extent).unwrap(), Array3::fill(extent, 42));
    }

    #[test]
    fn levels_must_increase() {
        let mut store = VolumeStore::open(&StoreConfig::temporary()).unwrap();

        assert!(store
            .declare_levels(&ResolutionLevel::sequence("scroll", &[1, 4, 2]))
            .is_err());
    }

    #[test]
    fn zoom_selects_coarsest_sufficient_level() {
        let mut store = small_store();
        store.open_or_create(2, PointN([20, 15, 10]), Point3i::fill(8)).unwrap();
        store.open_or_create(4, PointN([10, 8, 5]), Point3i::fill(8)).unwrap();

        assert_eq!(store.level_for_zoom(1.0), Some(1));
        assert_eq!(store.level_for_zoom(2.0), Some(1));
        assert_eq!(store.level_for_zoom(0.5), Some(2));
        assert_eq!(store.level_for_zoom(0.3), Some(2));
        assert_eq!(store.level_for_zoom(0.25), Some(4));
        assert_eq!(store.level_for_zoom(0.01), Some(4));
    }
}

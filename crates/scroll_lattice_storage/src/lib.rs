//! Persistent, chunked, multi-resolution storage for scroll volumes.
//!
//! The core storage types are:
//!   - `Array3`: dense 3D array positioned in the volume's lattice
//!   - `ChunkDb`: a `sled` tree of LZ4-compressed chunks keyed by Morton code
//!   - `VolumeStore`: one chunked dataset per resolution level, with the level layout recorded in the container
//!
//! Pyramids are filled by the `PyramidAssembler`, which writes each fetched tile at the base resolution and downsamples it into
//! the coarser levels through the `Downsampler` trait. Tiles come from a `TileFetcher` and are decoded by a `TileDecoder`.

pub mod array;
pub mod compression;
pub mod database;
pub mod pyramid;
pub mod sampling;
pub mod tile_source;
pub mod volume_store;

pub use array::*;
pub use compression::*;
pub use database::*;
pub use pyramid::*;
pub use sampling::*;
pub use tile_source::*;
pub use volume_store::*;

pub mod prelude {
    pub use super::{
        Array3, AreaDownsampler, AssemblyMode, AssemblyReport, ChunkDb, DatasetSchema, Downsampler,
        Lz4, PyramidAssembler, PyramidConfig, ResolutionLevel, StoreConfig, TileArtifacts,
        TileDecoder, TileFetcher, VolumeStore,
    };
}

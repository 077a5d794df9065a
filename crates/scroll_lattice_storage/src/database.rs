use crate::{Array3, BytesCompression, ChunkCompression};

use scroll_lattice_core::prelude::*;

use bytemuck::Pod;
use sled::{IVec, Tree};
use std::io;

pub use sled;

/// A persistent, crash-consistent key-value store of compressed chunks for one dataset, backed by a `sled` tree.
///
/// The keys are Morton codes of the chunk coordinates (chunk minimum divided by chunk shape). This keeps chunks that are close
/// in the volume close in the B+ tree as well.
///
/// Writes of many chunks are applied as one atomic batch. Reads are not isolated from concurrent writes; callers serialize
/// the assembly and navigation phases.
pub struct ChunkDb<B> {
    tree: Tree,
    compression: ChunkCompression<B>,
}

impl<B> ChunkDb<B>
where
    B: BytesCompression,
{
    pub fn new(tree: Tree, compression: ChunkCompression<B>) -> Self {
        Self { tree, compression }
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// Compress and atomically insert a set of chunks, keyed by chunk coordinates. Pre-existing chunks are overwritten.
    pub fn write_chunks<'a, T: Pod>(
        &self,
        chunks: impl Iterator<Item = (Point3i, &'a Array3<T>)>,
    ) -> Result<(), ChunkDbError> {
        let mut compressed_chunks = chunks
            .map(|(chunk_coords, chunk)| {
                Ok((Morton3::from(chunk_coords), self.compression.compress(chunk)?))
            })
            .collect::<Result<Vec<_>, io::Error>>()?;
        // Sort them by the Ord key.
        compressed_chunks.sort_by_key(|(k, _)| *k);

        let mut batch = sled::Batch::default();
        for (key, bytes) in compressed_chunks.into_iter() {
            // PERF: IVec will copy the bytes instead of moving, because it needs to also allocate room for an internal header
            batch.insert(&key.to_be_bytes()[..], IVec::from(bytes));
        }
        self.tree.apply_batch(batch)?;

        Ok(())
    }

    /// Read and decompress the chunk at `chunk_coords`, which must have `extent` when decompressed.
    pub fn read_chunk<T: Pod>(
        &self,
        chunk_coords: Point3i,
        extent: Extent3i,
    ) -> Result<Option<Array3<T>>, ChunkDbError> {
        let key = Morton3::from(chunk_coords).to_be_bytes();
        match self.tree.get(&key[..])? {
            Some(bytes) => Ok(Some(self.compression.decompress(bytes.as_ref(), extent)?)),
            None => Ok(None),
        }
    }

    /// All chunk coordinates present in the tree, in Morton order.
    pub fn chunk_coords(&self) -> Result<Vec<Point3i>, ChunkDbError> {
        self.tree
            .iter()
            .keys()
            .map(|key| {
                let key = key?;
                Morton3::from_be_bytes(key.as_ref())
                    .map(Point3i::from)
                    .ok_or(ChunkDbError::CorruptKey)
            })
            .collect()
    }

    pub fn flush(&self) -> Result<usize, ChunkDbError> {
        Ok(self.tree.flush()?)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ChunkDbError {
    #[error("database error: {0}")]
    Sled(#[from] sled::Error),
    #[error("chunk codec error: {0}")]
    Codec(#[from] io::Error),
    #[error("chunk key is not a Morton code")]
    CorruptKey,
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝

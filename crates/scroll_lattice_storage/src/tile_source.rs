//! Where tile artifacts come from, and how they turn into voxels.
//!
//! A tile's artifact is an opaque file named after the tile (see `TileKey::file_name`). Fetching is delegated to a
//! `TileFetcher`, and the local copy in the download directory doubles as the "already fetched" marker: there is no
//! manifest. Decoding is delegated to a `TileDecoder`.

use crate::Array3;

use scroll_lattice_core::{prelude::*, AddressingError};

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("tile artifact {0:?} is not available from the remote")]
    NotFound(String),
    #[error("tile artifact {0:?} does not exist locally, and fetching is not allowed")]
    NotAllowed(PathBuf),
    #[error("download directory {0:?} does not exist or is not a directory")]
    MissingDirectory(PathBuf),
    #[error(transparent)]
    Addressing(#[from] AddressingError),
    #[error("tile I/O error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Error, Eq, PartialEq)]
pub enum DecodeError {
    #[error("tile artifact is {actual} bytes, expected {expected}")]
    Truncated { expected: usize, actual: usize },
    #[error("tile artifact has an invalid header")]
    BadHeader,
}

/// Retrieves the bytes of a tile artifact from some remote.
pub trait TileFetcher {
    fn fetch(&self, file_name: &str) -> Result<Vec<u8>, FetchError>;
}

impl<F: TileFetcher + ?Sized> TileFetcher for &F {
    fn fetch(&self, file_name: &str) -> Result<Vec<u8>, FetchError> {
        (**self).fetch(file_name)
    }
}

/// A remote that is just a directory, e.g. a mounted share or a `file://` URL prefix.
#[derive(Clone, Debug)]
pub struct LocalMirror {
    pub root: PathBuf,
}

impl LocalMirror {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Accepts either a plain path or a `file://` URL.
    pub fn from_url(url: &str) -> Self {
        Self::new(url.strip_prefix("file://").unwrap_or(url))
    }
}

impl TileFetcher for LocalMirror {
    fn fetch(&self, file_name: &str) -> Result<Vec<u8>, FetchError> {
        let path = self.root.join(file_name);
        debug!("Fetching {:?}", path);

        fs::read(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => FetchError::NotFound(file_name.to_string()),
            _ => FetchError::Io(e),
        })
    }
}

/// The outcome of making sure a tile artifact is present locally.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ArtifactStatus {
    AlreadyPresent,
    Fetched,
    /// The artifact is missing, but this was a dry run.
    Missing,
}

/// The local directory of tile artifacts, filled on demand from a `TileFetcher`.
pub struct TileArtifacts<F> {
    dir: PathBuf,
    extension: String,
    fetcher: F,
}

impl<F> TileArtifacts<F>
where
    F: TileFetcher,
{
    /// `dir` must be an existing directory.
    pub fn new(dir: impl Into<PathBuf>, extension: &str, fetcher: F) -> Result<Self, FetchError> {
        let dir = dir.into();
        if !dir.is_dir() {
            return Err(FetchError::MissingDirectory(dir));
        }

        Ok(Self {
            dir,
            extension: extension.to_string(),
            fetcher,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, key: TileKey) -> Result<PathBuf, FetchError> {
        Ok(self.dir.join(key.file_name(&self.extension)?))
    }

    pub fn is_present(&self, key: TileKey) -> Result<bool, FetchError> {
        Ok(self.path(key)?.is_file())
    }

    /// Fetches the artifact for `key` unless it is already present.
    pub fn ensure(
        &self,
        key: TileKey,
        allow_fetch: bool,
        dry_run: bool,
    ) -> Result<ArtifactStatus, FetchError> {
        let path = self.path(key)?;
        if path.is_file() {
            debug!("{:?} already exists, not fetching", path);
            return Ok(ArtifactStatus::AlreadyPresent);
        }
        if dry_run {
            info!("Dry run, not fetching {:?}", path);
            return Ok(ArtifactStatus::Missing);
        }
        if !allow_fetch {
            return Err(FetchError::NotAllowed(path));
        }

        let file_name = key.file_name(&self.extension)?;
        let bytes = self.fetcher.fetch(&file_name)?;

        // Never leave a partial artifact under the final name, since presence alone marks a tile as fetched.
        let partial = path.with_extension("part");
        fs::write(&partial, &bytes)?;
        fs::rename(&partial, &path)?;

        Ok(ArtifactStatus::Fetched)
    }

    pub fn read(&self, key: TileKey) -> Result<Vec<u8>, FetchError> {
        Ok(fs::read(self.path(key)?)?)
    }
}

/// Turns artifact bytes into a dense array of base-resolution voxels.
pub trait TileDecoder {
    /// The returned array must be in (y, x, z) order and positioned at `origin`.
    fn decode(&self, bytes: &[u8], origin: Point3i) -> Result<Array3<u16>, DecodeError>;
}

/// A stack of slices stored as raw little-endian `u16`, preceded by its dimensions as three little-endian `u32`s in
/// (slices, height, width) order. Slices are the outermost axis on disk, so decoding transposes them into (y, x, z) order.
#[derive(Clone, Copy, Debug, Default)]
pub struct RawTileDecoder;

const RAW_HEADER_LEN: usize = 12;

impl TileDecoder for RawTileDecoder {
    fn decode(&self, bytes: &[u8], origin: Point3i) -> Result<Array3<u16>, DecodeError> {
        if bytes.len() < RAW_HEADER_LEN {
            return Err(DecodeError::BadHeader);
        }
        let mut dims = [0usize; 3];
        for (i, dim) in dims.iter_mut().enumerate() {
            let mut word = [0; 4];
            word.copy_from_slice(&bytes[4 * i..4 * (i + 1)]);
            *dim = u32::from_le_bytes(word) as usize;
        }
        let [depth, height, width] = dims;
        if dims.iter().any(|&d| d > i32::MAX as usize) {
            return Err(DecodeError::BadHeader);
        }

        let body = &bytes[RAW_HEADER_LEN..];
        let expected = depth
            .checked_mul(height)
            .and_then(|n| n.checked_mul(width))
            .and_then(|n| n.checked_mul(2))
            .and_then(|n| n.checked_add(RAW_HEADER_LEN))
            .ok_or(DecodeError::BadHeader)?;
        if bytes.len() != expected {
            return Err(DecodeError::Truncated {
                expected,
                actual: bytes.len(),
            });
        }

        let shape = PointN([height as i32, width as i32, depth as i32]);
        let extent = Extent3i::from_min_and_shape(origin, shape);
        let mut tile = Array3::fill(extent, 0);
        let values = tile.values_mut_slice();
        for (i, pair) in body.chunks_exact(2).enumerate() {
            let z = i / (height * width);
            let y = (i / width) % height;
            let x = i % width;
            values[(y * width + x) * depth + z] = u16::from_le_bytes([pair[0], pair[1]]);
        }

        Ok(tile)
    }
}

/// Encodes `tile` in the format read by `RawTileDecoder`.
pub fn encode_raw_tile(tile: &Array3<u16>) -> Vec<u8> {
    let shape = tile.extent().shape;
    let (height, width, depth) = (shape.y() as usize, shape.x() as usize, shape.z() as usize);

    let mut bytes = Vec::with_capacity(RAW_HEADER_LEN + 2 * tile.extent().num_points());
    for &dim in [depth, height, width].iter() {
        bytes.extend_from_slice(&(dim as u32).to_le_bytes());
    }
    let values = tile.values_slice();
    for z in 0..depth {
        for y in 0..height {
            for x in 0..width {
                bytes.extend_from_slice(&values[(y * width + x) * depth + z].to_le_bytes());
            }
        }
    }

    bytes
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝

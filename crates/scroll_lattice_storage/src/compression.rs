//! Compression of chunk values before they hit the database.

use crate::Array3;

use scroll_lattice_core::prelude::*;

use bytemuck::Pod;
use serde::{Deserialize, Serialize};
use std::io;

/// A compression algorithm that acts directly on a slice of bytes.
pub trait BytesCompression {
    fn compress_bytes(&self, bytes: &[u8], compressed_bytes: impl io::Write) -> io::Result<()>;
    fn decompress_bytes(compressed_bytes: &[u8], bytes: &mut impl io::Write) -> io::Result<()>;
}

/// The [LZ4 compression algorithm](https://en.wikipedia.org/wiki/LZ4_(compression_algorithm)).
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Lz4 {
    /// The compression level, from 0 to 10. 0 is fastest and least aggressive. 10 is slowest and
    /// most aggressive.
    pub level: u32,
}

impl Default for Lz4 {
    fn default() -> Self {
        Self { level: 4 }
    }
}

impl BytesCompression for Lz4 {
    fn compress_bytes(&self, bytes: &[u8], compressed_bytes: impl io::Write) -> io::Result<()> {
        let mut encoder = lz4::EncoderBuilder::new()
            .level(self.level)
            .build(compressed_bytes)?;
        io::copy(&mut io::Cursor::new(bytes), &mut encoder)?;
        let (_output, result) = encoder.finish();

        result
    }

    fn decompress_bytes(compressed_bytes: &[u8], bytes: &mut impl io::Write) -> io::Result<()> {
        let mut decoder = lz4::Decoder::new(compressed_bytes)?;
        io::copy(&mut decoder, bytes)?;

        Ok(())
    }
}

/// Compresses the values of a chunk array, leaving out the extent. The extent of a stored chunk is implied by its key and
/// the dataset's chunk shape.
///
/// For performance, this reinterprets the values as bytes without accounting for endianness, so a database is only readable
/// on machines with the same byte order as the one that wrote it.
#[derive(Clone, Copy, Debug, Default)]
pub struct ChunkCompression<B> {
    pub bytes_compression: B,
}

impl<B> ChunkCompression<B>
where
    B: BytesCompression,
{
    pub fn new(bytes_compression: B) -> Self {
        Self { bytes_compression }
    }

    pub fn compress<T: Pod>(&self, chunk: &Array3<T>) -> io::Result<Vec<u8>> {
        let mut compressed_bytes = Vec::new();
        self.bytes_compression.compress_bytes(
            bytemuck::cast_slice(chunk.values_slice()),
            &mut compressed_bytes,
        )?;

        Ok(compressed_bytes)
    }

    pub fn decompress<T: Pod>(&self, compressed: &[u8], extent: Extent3i) -> io::Result<Array3<T>> {
        let num_points = extent.num_points();

        // Allocate the vector with element type T so the alignment is correct.
        let mut values = vec![T::zeroed(); num_points];
        {
            let mut bytes: &mut [u8] = bytemuck::cast_slice_mut(&mut values[..]);
            B::decompress_bytes(compressed, &mut bytes)?;
            if !bytes.is_empty() {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "compressed chunk is shorter than its extent",
                ));
            }
        }

        Ok(Array3::new(extent, values))
    }
}

// ████████╗███████╗███████╗████████╗███████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝
//    ██║   █████╗  ███████╗   ██║   ███████╗
//    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║
//    ██║   ███████╗███████║   ██║   ███████║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝

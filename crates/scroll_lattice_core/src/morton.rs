use crate::Point3i;

use morton_encoding::{morton_decode, morton_encode};
use std::fmt;

/// The Z-order code of a `Point3i`, interleaving the bits of y, x and z (in that order). All of `i32` is supported, so the
/// code needs 96 bits.
///
/// Chunk coordinates are stored under these codes so that chunks which are close on the lattice are also close in key space.
#[derive(Clone, Copy, Eq, Ord, PartialEq, PartialOrd)]
pub struct Morton3(pub u128);

impl Morton3 {
    /// Although a `Morton3` uses a `u128`, it only uses the least significant 96 bits (12 bytes).
    pub const NUM_BYTES: usize = 12;

    #[inline]
    pub fn to_be_bytes(self) -> [u8; Self::NUM_BYTES] {
        let mut bytes = [0; Self::NUM_BYTES];
        bytes.copy_from_slice(&self.0.to_be_bytes()[4..]);

        bytes
    }

    /// Returns `None` if `bytes` is not exactly `NUM_BYTES` long.
    #[inline]
    pub fn from_be_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != Self::NUM_BYTES {
            return None;
        }
        let mut morton_bytes = [0; 16];
        morton_bytes[4..16].copy_from_slice(bytes);

        Some(Self(u128::from_be_bytes(morton_bytes)))
    }
}

impl fmt::Debug for Morton3 {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Morton3({:#026x})", self.0)
    }
}

impl From<Point3i> for Morton3 {
    #[inline]
    fn from(p: Point3i) -> Self {
        Self(morton_encode([
            to_unsigned(p.y()) as u32,
            to_unsigned(p.x()) as u32,
            to_unsigned(p.z()) as u32,
        ]))
    }
}

impl From<Morton3> for Point3i {
    #[inline]
    fn from(m: Morton3) -> Self {
        let yxz: [u32; 3] = morton_decode(m.0);

        crate::PointN([
            from_unsigned(yxz[0] as i32),
            from_unsigned(yxz[1] as i32),
            from_unsigned(yxz[2] as i32),
        ])
    }
}

/// Shifts `i32` onto `u32` so that the order of codes matches the order of coordinates.
#[inline]
fn to_unsigned(x: i32) -> i32 {
    x.wrapping_sub(i32::MIN)
}

#[inline]
fn from_unsigned(x: i32) -> i32 {
    x.wrapping_add(i32::MIN)
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝

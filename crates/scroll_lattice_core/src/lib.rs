//! The core data types for addressing a chunked scroll volume:
//! - `PointN`: lattice points, most importantly `Point3i` in (y, x, z) order
//! - `ExtentN`: half-open boxes, most importantly `Extent3i`
//! - `TileKey` and `TileGrid`: the fixed-size tiles a volume is fetched in, and their names
//! - `Transform`: homogeneous 4×4 transforms used for navigating oblique slices

pub mod axis;
pub mod extent;
pub mod grid;
pub mod morton;
pub mod point;
pub mod transform;

pub use axis::Axis3;
pub use extent::{Extent3, Extent3PointIter, Extent3i, ExtentN};
pub use grid::{
    parse_shape_xyz, tile_id_to_name, tile_name_to_id, tiles_covering, AddressingError, Roi,
    TileGrid, TileKey, TilesCovering, TILE_EDGE,
};
pub use morton::Morton3;
pub use point::{Point3, Point3f, Point3i, PointN};
pub use transform::Transform;

pub use nalgebra;
pub use num;

pub mod prelude {
    pub use super::{
        Axis3, Extent3, Extent3i, ExtentN, Morton3, Point3, Point3f, Point3i, PointN, Roi,
        TileGrid, TileKey, Transform,
    };
}

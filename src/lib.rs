//! Multi-resolution storage and navigation for volumetric CT scans of scrolls.
//!
//! This library is organized into several crates:
//! - **core**: lattice points and extents in (y, x, z) order, tile addressing, homogeneous transforms
//! - **storage**: the chunked `sled` volume store, downsampling, and assembly of fetched tiles into a resolution pyramid
//! - **navigation**: the oblique-slice navigation state machine, cache windows, resampling, and the render-tick driver
//!
//! Two binaries drive them: `scroll-assemble` fills a container from tile artifacts, and `scroll-navigate` replays an event
//! script against a container and writes the rendered frames.

pub use scroll_lattice_core as core;
pub use scroll_lattice_navigation as navigation;
pub use scroll_lattice_storage as storage;

pub mod prelude {
    pub use super::core::prelude::*;
    pub use super::navigation::prelude::*;
    pub use super::storage::prelude::*;
}

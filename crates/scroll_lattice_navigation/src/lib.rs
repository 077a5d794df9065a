//! Interactive navigation of oblique slices through a multi-resolution scroll volume.
//!
//! A `NavigationState` turns `InputEvent`s into a homogeneous transform. On a recenter, a `CacheWindow` of voxels around the
//! viewed point is loaded from the coarsest level of the `VolumeStore` that still resolves the current zoom, and every frame
//! is `render`ed from that window until the next recenter. The `Navigator` ties these together behind the `EventSource` and
//! `Presenter` traits, so no particular GUI toolkit is assumed.

pub mod cache_window;
pub mod config;
pub mod input;
pub mod navigator;
pub mod resample;
pub mod state;

pub use cache_window::*;
pub use config::*;
pub use input::*;
pub use navigator::*;
pub use resample::*;
pub use state::*;

pub mod prelude {
    pub use super::{
        CacheWindow, ColorWindow, EventSource, FrameOutcome, InputEvent, Modifiers,
        NavigationState, Navigator, NavigatorConfig, Presenter, Raster,
    };
}

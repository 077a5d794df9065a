use crate::{ColorWindow, NavigationError};

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Zooms outside `[MIN_ZOOM, MAX_ZOOM]` display pixels per base voxel are never reached; scroll steps past them clamp.
pub const MIN_ZOOM: f64 = 1e-4;
pub const MAX_ZOOM: f64 = 1e4;

/// Frames are at most `2 * MAX_CANVAS_PAD + 1` pixels square.
pub const MAX_CANVAS_PAD: i32 = 4096;

/// Everything that tunes the navigator. Each navigator gets its own copy; there is no shared default state.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct NavigatorConfig {
    /// Half the edge length of the displayed square, in display pixels. Rendered frames are `2 * canvas_pad + 1` pixels
    /// square.
    pub canvas_pad: i32,
    /// One scroll step scales the view by this factor.
    pub zoom_factor: f64,
    /// One scroll step of sideways rotation, in degrees.
    pub rotation_step_degrees: f64,
    /// One scroll step of movement along the viewing axis, in display units.
    pub dolly_step: f64,
    pub drag_degrees_per_pixel: f64,
    pub tick_interval: Duration,
    pub color_window: ColorWindow,
    /// The value written onto the six faces of every freshly loaded cache window, if any.
    pub face_marker: Option<u16>,
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        Self {
            canvas_pad: 150,
            zoom_factor: 1.1,
            rotation_step_degrees: 5.0,
            dolly_step: 10.0,
            drag_degrees_per_pixel: 1.0,
            tick_interval: Duration::from_millis(100),
            color_window: ColorWindow::default(),
            face_marker: Some(u16::MAX),
        }
    }
}

impl NavigatorConfig {
    pub fn validate(&self) -> Result<(), NavigationError> {
        if !(0..=MAX_CANVAS_PAD).contains(&self.canvas_pad) {
            return Err(NavigationError::InvalidCanvasPad(self.canvas_pad));
        }
        if !(self.zoom_factor.is_finite() && self.zoom_factor > 0.0) {
            return Err(NavigationError::InvalidZoomFactor(self.zoom_factor));
        }

        Ok(())
    }

    /// Rows and columns of every rendered frame.
    pub fn output_size(&self) -> (usize, usize) {
        let edge = 2 * self.canvas_pad.max(0) as usize + 1;

        (edge, edge)
    }
}

/// Whether `zoom` can be the starting zoom of a navigator.
pub fn is_valid_zoom(zoom: f64) -> bool {
    (MIN_ZOOM..=MAX_ZOOM).contains(&zoom)
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

    #[test]
    fn default_config_is_valid() {
        assert!(NavigatorConfig::default().validate().is_ok());
        assert_eq!(NavigatorConfig::default().output_size(), (301, 301));
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let config = |canvas_pad, zoom_factor| NavigatorConfig {
            canvas_pad,
            zoom_factor,
            ..Default::default()
        };

        assert!(matches!(
            config(-1, 1.1).validate(),
            Err(NavigationError::InvalidCanvasPad(-1))
        ));
        assert!(matches!(
            config(MAX_CANVAS_PAD + 1, 1.1).validate(),
            Err(NavigationError::InvalidCanvasPad(_))
        ));
        assert!(config(0, 1.1).validate().is_ok());
        assert!(matches!(
            config(150, f64::NAN).validate(),
            Err(NavigationError::InvalidZoomFactor(_))
        ));
        assert!(matches!(
            config(150, 0.0).validate(),
            Err(NavigationError::InvalidZoomFactor(_))
        ));

        assert!(is_valid_zoom(1.0));
        assert!(!is_valid_zoom(0.0));
        assert!(!is_valid_zoom(-2.0));
        assert!(!is_valid_zoom(f64::NAN));
        assert!(!is_valid_zoom(f64::INFINITY));
    }
}

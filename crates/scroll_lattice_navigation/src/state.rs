//! The navigation state machine.
//!
//! The viewer shows one plane of the volume. The persistent `Transform` M maps display coordinates (relative to the display
//! center, with the displayed plane at z = 0) to base-resolution offsets from the stored `position`. Every input multiplies M
//! on the right by an elementary rotation, scale or translation, so M never accumulates shear.
//!
//! Drags are provisional: while one is in progress the drag transform is kept separately and the view uses `M · M_drag`.
//! Only the drag end folds it into M.
//!
//! `handle_input` is pure. Anything that needs the store (recentering) or the outside world (closing) is returned as an
//! `Action` for the driver.

use crate::{is_valid_zoom, Action, CacheWindow, InputEvent, NavigatorConfig, MAX_ZOOM, MIN_ZOOM};

use scroll_lattice_core::prelude::*;
use scroll_lattice_storage::{StoreError, VolumeStore};

use thiserror::Error;
use tracing::{debug, info, info_span};

#[derive(Debug, Error)]
pub enum NavigationError {
    #[error("cannot recenter while a drag is in progress")]
    DragInProgress,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("no cache window has been loaded")]
    NoCacheWindow,
    #[error("the volume store has no datasets to navigate")]
    NoLevels,
    #[error("zoom {0} is outside [{min}, {max}]", min = MIN_ZOOM, max = MAX_ZOOM)]
    InvalidZoom(f64),
    #[error("zoom factor {0} must be finite and positive")]
    InvalidZoomFactor(f64),
    #[error("canvas pad {0} is negative or too large")]
    InvalidCanvasPad(i32),
}

/// What the pointer is doing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DragMode {
    Idle,
    Panning(Drag),
    Rotating(Drag),
}

/// A drag in progress: where it started and the transform its current displacement implies.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Drag {
    pub start: [f64; 2],
    pub provisional: Transform,
}

/// Where the next cache window goes, as computed by `NavigationState::plan_recenter`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RecenterPlan {
    /// New base-resolution position.
    pub position: Point3i,
    /// Scale of the level to load.
    pub scale: i32,
}

impl RecenterPlan {
    /// The cache window center in level coordinates.
    pub fn window_center(&self) -> Point3i {
        self.position.scalar_div_floor(self.scale)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct NavigationState {
    config: NavigatorConfig,
    position: Point3i,
    level_scale: i32,
    transform: Transform,
    drag: DragMode,
}

impl NavigationState {
    /// Starts at `position` (base resolution) with `zoom` display pixels per base voxel. No cache window is loaded until the
    /// first recenter.
    pub fn new(config: NavigatorConfig, position: Point3i, zoom: f64) -> Result<Self, NavigationError> {
        config.validate()?;
        if !is_valid_zoom(zoom) {
            return Err(NavigationError::InvalidZoom(zoom));
        }

        Ok(Self {
            config,
            position,
            level_scale: 1,
            transform: Transform::uniform_scale(1.0 / zoom),
            drag: DragMode::Idle,
        })
    }

    pub fn config(&self) -> &NavigatorConfig {
        &self.config
    }

    /// The base-resolution point the cache window was last centered on.
    pub fn position(&self) -> Point3i {
        self.position
    }

    /// The scale of the level the cache window was last loaded from.
    pub fn level_scale(&self) -> i32 {
        self.level_scale
    }

    /// The persistent transform M, excluding any drag in progress.
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn drag_mode(&self) -> &DragMode {
        &self.drag
    }

    pub fn is_dragging(&self) -> bool {
        !matches!(self.drag, DragMode::Idle)
    }

    /// `M · M_drag` during a drag, `M` otherwise.
    pub fn effective_transform(&self) -> Transform {
        match &self.drag {
            DragMode::Idle => self.transform,
            DragMode::Panning(drag) | DragMode::Rotating(drag) => {
                self.transform.compose(&drag.provisional)
            }
        }
    }

    /// Display pixels per base voxel.
    pub fn current_zoom(&self) -> f64 {
        1.0 / self.transform.scale_factor()
    }

    /// The base-resolution point at the display center, including unsaved translation.
    pub fn viewed_point(&self) -> Point3f {
        self.position.as_f64() + self.effective_transform().translation_part()
    }

    /// Applies one input event, returning the next state and any action the driver must perform.
    pub fn handle_input(&self, event: &InputEvent) -> (Self, Option<Action>) {
        let mut next = self.clone();
        let action = next.apply_input(event);

        (next, action)
    }

    fn apply_input(&mut self, event: &InputEvent) -> Option<Action> {
        match *event {
            InputEvent::DragStart { x, y, modifiers } => {
                if self.is_dragging() {
                    return None;
                }
                let drag = Drag {
                    start: [x, y],
                    provisional: Transform::identity(),
                };
                self.drag = if modifiers.alt {
                    DragMode::Rotating(drag)
                } else {
                    DragMode::Panning(drag)
                };
            }
            InputEvent::DragMove { x, y } => self.update_drag(x, y),
            InputEvent::DragEnd { x, y } => {
                if self.is_dragging() {
                    self.update_drag(x, y);
                    self.transform = self.effective_transform();
                    self.drag = DragMode::Idle;
                }
            }
            InputEvent::Scroll { delta, modifiers } => {
                if modifiers.ctrl {
                    self.zoom(delta);
                } else if modifiers.shift {
                    self.rotate_sideways(delta);
                } else {
                    self.move_in_out(delta);
                }
            }
            InputEvent::Rotate90(axis) => self.rotate90(axis),
            InputEvent::Recenter => return Some(Action::Recenter),
            InputEvent::Close => return Some(Action::Close),
        }

        None
    }

    fn update_drag(&mut self, x: f64, y: f64) {
        let degrees_per_pixel = self.config.drag_degrees_per_pixel;
        match &mut self.drag {
            DragMode::Idle => {}
            DragMode::Panning(drag) => {
                let (dx, dy) = (x - drag.start[0], y - drag.start[1]);
                // Content follows the pointer, so the viewed point moves the other way.
                drag.provisional = Transform::translation(PointN([-dy, -dx, 0.0]));
            }
            DragMode::Rotating(drag) => {
                let (dx, dy) = (x - drag.start[0], y - drag.start[1]);
                let horizontal = (dx * degrees_per_pixel).to_radians();
                let vertical = (dy * degrees_per_pixel).to_radians();
                drag.provisional = Transform::rotation(Axis3::Y, -horizontal)
                    .compose(&Transform::rotation(Axis3::X, vertical));
            }
        }
    }

    /// Snaps the view by an exact quarter turn about `axis`.
    pub fn rotate90(&mut self, axis: Axis3) {
        self.transform = self.transform.compose(&Transform::quarter_turn(axis, 1));
    }

    /// Positive `delta` zooms in by `zoom_factor` per step, stopping at `MIN_ZOOM` and `MAX_ZOOM`.
    pub fn zoom(&mut self, delta: i32) {
        let current = self.current_zoom();
        let target = (current * self.config.zoom_factor.powf(f64::from(delta))).clamp(MIN_ZOOM, MAX_ZOOM);
        let scale = current / target;
        if !(scale.is_finite() && scale > 0.0) {
            debug!("Ignoring zoom by {} steps from {}", delta, current);
            return;
        }

        self.transform = self.transform.compose(&Transform::uniform_scale(scale));
    }

    /// Rotates the view within the display plane.
    pub fn rotate_sideways(&mut self, delta: i32) {
        let radians = (f64::from(delta) * self.config.rotation_step_degrees).to_radians();
        self.transform = self.transform.compose(&Transform::rotation(Axis3::Z, radians));
    }

    /// Moves the displayed plane along the viewing axis.
    pub fn move_in_out(&mut self, delta: i32) {
        let offset = f64::from(delta) * self.config.dolly_step;
        self.transform = self
            .transform
            .compose(&Transform::translation(PointN([0.0, 0.0, offset])));
    }

    /// Computes where the next cache window goes without changing anything: the viewed point, rounded, at the coarsest level
    /// that still has at least one voxel per display pixel.
    pub fn plan_recenter(&self, store: &VolumeStore) -> Result<RecenterPlan, NavigationError> {
        if self.is_dragging() {
            return Err(NavigationError::DragInProgress);
        }

        let position = self.position + self.transform.translation_part().round();
        let scale = store
            .level_for_zoom(self.current_zoom())
            .ok_or(NavigationError::NoLevels)?;

        Ok(RecenterPlan { position, scale })
    }

    /// Moves to `plan` and strips the translation from M, keeping rotation and scale.
    pub fn commit_recenter(&mut self, plan: &RecenterPlan) {
        self.position = plan.position;
        self.level_scale = plan.scale;
        self.transform = self.transform.without_translation();
    }

    /// Plans a recenter, loads the new cache window, and commits. The state is unchanged if loading fails.
    pub fn recenter(&mut self, store: &VolumeStore) -> Result<CacheWindow, NavigationError> {
        let plan = self.plan_recenter(store)?;
        let span = info_span!("recenter", position = ?plan.position.0, scale = plan.scale);
        let _guard = span.enter();

        let window = CacheWindow::load(
            store,
            plan.scale,
            plan.window_center(),
            CacheWindow::pad_for_canvas(self.config.canvas_pad),
            self.config.face_marker,
        )?;
        self.commit_recenter(&plan);
        info!(
            "Recentered at {:?} on level {} (zoom {:.3})",
            self.position.0,
            self.level_scale,
            self.current_zoom()
        );

        Ok(window)
    }

    /// The cache window center for the current position and level, in level coordinates.
    pub fn window_center(&self) -> Point3i {
        self.position.scalar_div_floor(self.level_scale)
    }

    /// Maps display coordinates to coordinates relative to the current cache window's center, at the window's level.
    pub fn sampling_transform(&self) -> Transform {
        let scale = f64::from(self.level_scale);
        // The position usually isn't a multiple of the scale, so the window center is up to one level voxel short of it.
        let residual = self.position.as_f64() / scale - self.window_center().as_f64();
        debug!("Sampling residual {:?}", residual.0);

        Transform::translation(residual)
            .compose(&Transform::uniform_scale(1.0 / scale))
            .compose(&self.effective_transform())
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝

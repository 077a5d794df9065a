//! The render-tick driver.
//!
//! The `Navigator` owns the store and all navigation state. A GUI (or a script) feeds it through an `EventSource` and shows
//! its frames through a `Presenter`; it never depends on any particular event loop.

use crate::{
    render, Action, CacheWindow, InputEvent, NavigationError, NavigationState, NavigatorConfig,
    Raster,
};

use scroll_lattice_core::prelude::*;
use scroll_lattice_storage::VolumeStore;

use std::collections::VecDeque;
use std::thread;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Produces the input events that arrived since the last tick.
pub trait EventSource {
    fn poll_events(&mut self) -> Vec<InputEvent>;
}

/// Shows frames.
pub trait Presenter {
    /// `frame` is the newest raster. When `outcome` is `CannotRender`, it is the last raster that could be rendered, if any.
    fn present(&mut self, frame: Option<&Raster<u8>>, outcome: &FrameOutcome);
}

#[derive(Debug)]
pub enum FrameOutcome {
    Rendered,
    /// The tick failed; the previous frame is still current.
    CannotRender(NavigationError),
    /// A close was requested. No more frames will be produced.
    Closed,
}

/// An `EventSource` that replays a fixed list of ticks. Each inner `Vec` is delivered on one tick; once exhausted, it delivers
/// `Close`.
pub struct ScriptedEvents {
    ticks: VecDeque<Vec<InputEvent>>,
}

impl ScriptedEvents {
    pub fn new(ticks: impl IntoIterator<Item = Vec<InputEvent>>) -> Self {
        Self {
            ticks: ticks.into_iter().collect(),
        }
    }
}

impl EventSource for ScriptedEvents {
    fn poll_events(&mut self) -> Vec<InputEvent> {
        self.ticks
            .pop_front()
            .unwrap_or_else(|| vec![InputEvent::Close])
    }
}

pub struct Navigator {
    store: VolumeStore,
    state: NavigationState,
    window: Option<CacheWindow>,
    last_frame: Option<Raster<u8>>,
    closed: bool,
}

impl Navigator {
    /// Opens a view of `store` at `position` (the center of the base level if `None`) and loads the first cache window.
    pub fn new(
        store: VolumeStore,
        config: NavigatorConfig,
        position: Option<Point3i>,
        zoom: f64,
    ) -> Result<Self, NavigationError> {
        let base_scale = *store
            .dataset_scales()
            .first()
            .ok_or(NavigationError::NoLevels)?;
        let position = match position {
            Some(p) => p,
            None => {
                let schema = store.dataset(base_scale).ok_or(NavigationError::NoLevels)?;
                (schema.shape * base_scale) / 2
            }
        };

        let mut navigator = Self {
            store,
            state: NavigationState::new(config, position, zoom)?,
            window: None,
            last_frame: None,
            closed: false,
        };
        navigator.recenter()?;

        Ok(navigator)
    }

    pub fn state(&self) -> &NavigationState {
        &self.state
    }

    pub fn store(&self) -> &VolumeStore {
        &self.store
    }

    pub fn window(&self) -> Option<&CacheWindow> {
        self.window.as_ref()
    }

    pub fn last_frame(&self) -> Option<&Raster<u8>> {
        self.last_frame.as_ref()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Replaces the cache window around the currently viewed point. Blocks on the store read.
    pub fn recenter(&mut self) -> Result<(), NavigationError> {
        let window = self.state.recenter(&self.store)?;
        self.window = Some(window);

        Ok(())
    }

    /// Samples the current view, without color mapping.
    pub fn render_raw(&self) -> Result<Raster<u16>, NavigationError> {
        let window = self.window.as_ref().ok_or(NavigationError::NoCacheWindow)?;

        Ok(render(
            window,
            &self.state.sampling_transform(),
            self.state.config().output_size(),
        ))
    }

    /// Handles `events` in order, performs the recenters they request, then renders one frame. A close request is latched and
    /// takes effect at the end of the tick.
    pub fn tick(&mut self, events: impl IntoIterator<Item = InputEvent>) -> FrameOutcome {
        let mut failure = None;
        for event in events {
            let (state, action) = self.state.handle_input(&event);
            self.state = state;
            match action {
                Some(Action::Close) => self.closed = true,
                Some(Action::Recenter) => match self.recenter() {
                    Ok(()) => {}
                    Err(NavigationError::DragInProgress) => {
                        warn!("Ignoring recenter request during a drag");
                    }
                    Err(e) => failure = Some(e),
                },
                None => {}
            }
        }

        if self.closed {
            return FrameOutcome::Closed;
        }
        if let Some(e) = failure {
            warn!("Cannot render: {}", e);
            return FrameOutcome::CannotRender(e);
        }

        match self.render_raw() {
            Ok(raw) => {
                self.last_frame = Some(self.state.config().color_window.apply(&raw));
                FrameOutcome::Rendered
            }
            Err(e) => {
                warn!("Cannot render: {}", e);
                FrameOutcome::CannotRender(e)
            }
        }
    }

    /// Ticks at the configured interval until a close request, then flushes and closes the store.
    pub fn run(
        mut self,
        events: &mut impl EventSource,
        presenter: &mut impl Presenter,
    ) -> Result<(), NavigationError> {
        let interval = self.state.config().tick_interval;
        let mut frames = 0usize;
        loop {
            let start = Instant::now();

            let outcome = self.tick(events.poll_events());
            if let FrameOutcome::Closed = outcome {
                break;
            }
            presenter.present(self.last_frame.as_ref(), &outcome);
            frames += 1;

            let elapsed = start.elapsed();
            debug!("Tick took {:?}", elapsed);
            if let Some(remaining) = interval.checked_sub(elapsed) {
                thread::sleep(remaining);
            }
        }

        info!("Closing after {} frames", frames);
        self.store.close()?;

        Ok(())
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝

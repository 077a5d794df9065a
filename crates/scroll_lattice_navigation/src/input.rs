//! Input events delivered to the navigator, independent of any GUI toolkit.
//!
//! Events can also be written as text, one per line, which is how scripted sessions drive the navigator:
//!
//! ```text
//! drag-start 10 10 alt
//! drag-move 40 10
//! drag-end 40 10
//! scroll 2 ctrl
//! rotate90 z
//! recenter
//! close
//! ```

use scroll_lattice_core::Axis3;

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Modifier keys held during a pointer event.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Modifiers {
    pub alt: bool,
    pub ctrl: bool,
    pub shift: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        alt: false,
        ctrl: false,
        shift: false,
    };
    pub const ALT: Self = Self {
        alt: true,
        ctrl: false,
        shift: false,
    };
    pub const CTRL: Self = Self {
        alt: false,
        ctrl: true,
        shift: false,
    };
    pub const SHIFT: Self = Self {
        alt: false,
        ctrl: false,
        shift: true,
    };
}

/// Pointer coordinates are in display pixels, `x` to the right and `y` down.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub enum InputEvent {
    /// Holding `alt` starts a rotation drag, otherwise a pan.
    DragStart { x: f64, y: f64, modifiers: Modifiers },
    DragMove { x: f64, y: f64 },
    DragEnd { x: f64, y: f64 },
    /// Zooms with `ctrl`, rotates sideways with `shift`, and moves along the viewing axis otherwise.
    Scroll { delta: i32, modifiers: Modifiers },
    /// Snap rotation by a quarter turn about a principal axis.
    Rotate90(Axis3),
    /// Reload the cache window around the currently viewed point.
    Recenter,
    Close,
}

/// Work that `NavigationState::handle_input` can't do by itself, so it hands it back to the driver.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Action {
    Recenter,
    Close,
}

#[derive(Debug, Error, Eq, PartialEq)]
#[error("invalid input event {0:?}")]
pub struct ParseEventError(pub String);

impl FromStr for InputEvent {
    type Err = ParseEventError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseEventError(text.to_string());
        let mut words = text.split_whitespace();
        let command = words.next().ok_or_else(invalid)?;
        let args: Vec<&str> = words.collect();

        let number = |i: usize| -> Result<f64, ParseEventError> {
            args.get(i)
                .and_then(|w| w.parse::<f64>().ok())
                .ok_or_else(invalid)
        };
        let modifiers = |from: usize| -> Result<Modifiers, ParseEventError> {
            let mut modifiers = Modifiers::NONE;
            for &word in args.iter().skip(from) {
                match word {
                    "alt" => modifiers.alt = true,
                    "ctrl" => modifiers.ctrl = true,
                    "shift" => modifiers.shift = true,
                    _ => return Err(invalid()),
                }
            }
            Ok(modifiers)
        };
        let exact_args = |n: usize| -> Result<(), ParseEventError> {
            if args.len() == n {
                Ok(())
            } else {
                Err(invalid())
            }
        };

        match command {
            "drag-start" => Ok(InputEvent::DragStart {
                x: number(0)?,
                y: number(1)?,
                modifiers: modifiers(2)?,
            }),
            "drag-move" => {
                exact_args(2)?;
                Ok(InputEvent::DragMove {
                    x: number(0)?,
                    y: number(1)?,
                })
            }
            "drag-end" => {
                exact_args(2)?;
                Ok(InputEvent::DragEnd {
                    x: number(0)?,
                    y: number(1)?,
                })
            }
            "scroll" => {
                let delta = args
                    .first()
                    .and_then(|w| w.parse::<i32>().ok())
                    .ok_or_else(invalid)?;
                Ok(InputEvent::Scroll {
                    delta,
                    modifiers: modifiers(1)?,
                })
            }
            "rotate90" => {
                exact_args(1)?;
                let axis = match args[0] {
                    "y" => Axis3::Y,
                    "x" => Axis3::X,
                    "z" => Axis3::Z,
                    _ => return Err(invalid()),
                };
                Ok(InputEvent::Rotate90(axis))
            }
            "recenter" => exact_args(0).map(|()| InputEvent::Recenter),
            "close" => exact_args(0).map(|()| InputEvent::Close),
            _ => Err(invalid()),
        }
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝

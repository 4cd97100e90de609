//! Input model: modifier keys, mouse buttons, keys, and the drag state machine.
//!
//! `Modifiers`, `Button` and `Key` capture what the user did. `InputState`
//! is the gesture tracked between pointer-down and pointer-up. `UiState` is
//! the part that outlives a gesture (the selection), and `Cursor` is the
//! feedback the host should show.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use std::collections::HashSet;

use crate::camera::{Point, Vec3};
use crate::graph::MeshId;

/// Keyboard/mouse modifier keys held during an event.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default)]
pub struct Modifiers {
    /// Shift key is held.
    pub shift: bool,
    /// Ctrl key is held.
    pub ctrl: bool,
    /// Alt / Option key is held.
    pub alt: bool,
    /// Meta / Command key is held.
    pub meta: bool,
}

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    /// Left mouse button (or single-finger tap).
    Primary,
    /// Middle mouse button (scroll wheel click).
    Middle,
    /// Right mouse button (or two-finger tap).
    Secondary,
}

impl Button {
    /// Map a DOM `MouseEvent.button` value.
    #[must_use]
    pub fn from_dom(button: i16) -> Self {
        match button {
            1 => Self::Middle,
            2 => Self::Secondary,
            _ => Self::Primary,
        }
    }
}

/// A keyboard key, holding the key name as reported by the browser
/// (e.g. `"ArrowUp"`, `"w"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key(pub String);

impl Key {
    /// Arrow keys and WASD map to a grid direction. Letters are case-insensitive.
    #[must_use]
    pub fn direction(&self) -> Option<Direction> {
        match self.0.as_str() {
            "ArrowUp" | "w" | "W" => Some(Direction::Up),
            "ArrowDown" | "s" | "S" => Some(Direction::Down),
            "ArrowRight" | "d" | "D" => Some(Direction::Right),
            "ArrowLeft" | "a" | "A" => Some(Direction::Left),
            _ => None,
        }
    }
}

/// A one-cell move on the table, as seen from the top-down camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Toward `+z`.
    Up,
    /// Toward `-z`.
    Down,
    /// Toward `+x`.
    Right,
    /// Toward `-x`.
    Left,
}

impl Direction {
    /// World offset for one step of `cell` units.
    #[must_use]
    pub fn offset(self, cell: f64) -> Vec3 {
        match self {
            Self::Up => Vec3::new(0.0, 0.0, cell),
            Self::Down => Vec3::new(0.0, 0.0, -cell),
            Self::Right => Vec3::new(cell, 0.0, 0.0),
            Self::Left => Vec3::new(-cell, 0.0, 0.0),
        }
    }
}

/// Wheel / trackpad scroll delta.
#[derive(Debug, Clone, Copy)]
pub struct WheelDelta {
    /// Horizontal scroll amount in pixels.
    pub dx: f64,
    /// Vertical scroll amount in pixels (positive = down).
    pub dy: f64,
}

/// Pointer cursor the host should show over the render surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cursor {
    #[default]
    Default,
    /// Hovering a token.
    Grab,
    /// A drag is in progress.
    Grabbing,
}

impl Cursor {
    /// CSS `cursor` value.
    #[must_use]
    pub fn as_css(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Grab => "grab",
            Self::Grabbing => "grabbing",
        }
    }
}

/// Persistent UI state visible to the renderer.
#[derive(Debug, Clone, Default)]
pub struct UiState {
    /// Currently selected tokens.
    pub selected_ids: HashSet<MeshId>,
    /// Token under the pointer at the last move, if any.
    pub hovered_id: Option<MeshId>,
}

/// Internal state for the input state machine.
#[derive(Debug, Clone, Default)]
pub enum InputState {
    /// No gesture in progress; waiting for the next pointer-down.
    #[default]
    Idle,
    /// Selected tokens follow the pointer.
    Dragging {
        /// Ground point of the previous pointer event. Each move applies the
        /// delta from here and then advances it.
        anchor: Vec3,
    },
    /// The camera follows a secondary-button drag.
    Panning {
        /// Screen point of the previous pointer event.
        last: Point,
    },
}

impl InputState {
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        matches!(self, Self::Dragging { .. })
    }

    #[must_use]
    pub fn is_panning(&self) -> bool {
        matches!(self, Self::Panning { .. })
    }
}

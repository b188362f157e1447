//! Pointer and touch events delivered by the host.

use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Identifies one pointer (mouse or touch contact) for the lifetime of a press.
pub type PointerId = u64;

/// Mouse button identifiers. Touch contacts report `Left`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    #[default]
    Left,
    Right,
    Middle,
}

/// Modifier keys state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub const SHIFT: Self = Self {
        shift: true,
        ..Self::NONE
    };
}

/// Pointer event type for unified mouse/touch handling.
///
/// Positions are in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PointerEvent {
    Down {
        pointer: PointerId,
        position: Point,
        button: MouseButton,
        modifiers: Modifiers,
    },
    Move {
        pointer: PointerId,
        position: Point,
        modifiers: Modifiers,
    },
    Up {
        pointer: PointerId,
        position: Point,
    },
    /// The pointer left the tracked area or the contact was cancelled.
    Leave { pointer: PointerId },
}

impl PointerEvent {
    pub fn pointer(&self) -> PointerId {
        match self {
            PointerEvent::Down { pointer, .. }
            | PointerEvent::Move { pointer, .. }
            | PointerEvent::Up { pointer, .. }
            | PointerEvent::Leave { pointer } => *pointer,
        }
    }

    pub fn position(&self) -> Option<Point> {
        match self {
            PointerEvent::Down { position, .. }
            | PointerEvent::Move { position, .. }
            | PointerEvent::Up { position, .. } => Some(*position),
            PointerEvent::Leave { .. } => None,
        }
    }

    /// Left-button press with no modifiers.
    pub fn down(pointer: PointerId, position: Point) -> Self {
        PointerEvent::Down {
            pointer,
            position,
            button: MouseButton::Left,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn moved(pointer: PointerId, position: Point) -> Self {
        PointerEvent::Move {
            pointer,
            position,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn up(pointer: PointerId, position: Point) -> Self {
        PointerEvent::Up { pointer, position }
    }
}

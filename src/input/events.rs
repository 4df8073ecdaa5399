use crate::core::geo::{ScreenPoint, ScreenSize};
use serde::{Deserialize, Serialize};

/// Input events the host toolkit forwards to the map. Positions are viewport
/// pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    /// Single click
    Click {
        position: ScreenPoint,
        button: MouseButton,
    },
    /// Double click
    DoubleClick {
        position: ScreenPoint,
        button: MouseButton,
    },
    /// Pointer moved without a pressed button
    MouseMove { position: ScreenPoint },
    /// Primary button pressed, a drag may follow
    DragStart { position: ScreenPoint },
    /// Pointer moved with the primary button held
    Drag { position: ScreenPoint },
    /// Primary button released
    DragEnd { position: ScreenPoint },
    /// Scroll wheel; positive `delta` scrolls up
    Scroll { delta: f64, position: ScreenPoint },
    /// Keyboard input
    KeyPress { key: KeyCode },
    /// Viewport/window resize
    Resize { size: ScreenSize },
}

/// Keyboard key codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyCode {
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Plus,
    Minus,
    Other(u32),
}

/// Mouse button types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Other(u16),
}

impl InputEvent {
    /// Gets the pointer position associated with this event, if any
    pub fn position(&self) -> Option<ScreenPoint> {
        match self {
            InputEvent::Click { position, .. }
            | InputEvent::DoubleClick { position, .. }
            | InputEvent::MouseMove { position }
            | InputEvent::DragStart { position }
            | InputEvent::Drag { position }
            | InputEvent::DragEnd { position }
            | InputEvent::Scroll { position, .. } => Some(*position),
            InputEvent::KeyPress { .. } | InputEvent::Resize { .. } => None,
        }
    }

    /// Checks if this is a keyboard event
    pub fn is_keyboard_event(&self) -> bool {
        matches!(self, InputEvent::KeyPress { .. })
    }
}

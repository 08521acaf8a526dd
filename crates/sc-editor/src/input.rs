//! Input abstraction layer.
//!
//! Normalizes browser pointer, focus and keyboard events into the
//! `InputEvent` enum consumed by the arrange tool and shortcut map.
//! Pointer coordinates are canvas-local screen pixels.

use sc_core::Point;

/// Modifier keys held during an event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    /// Ctrl on Windows/Linux, Cmd on macOS.
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// Where keyboard focus was when a key event fired.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum KeyTarget {
    /// Canvas, body, or any non-editable element.
    #[default]
    Canvas,
    TextInput,
    TextArea,
    ContentEditable,
}

impl KeyTarget {
    /// Classify a DOM target by tag name and its content-editable flag.
    pub fn from_dom(tag_name: &str, content_editable: bool) -> Self {
        if content_editable {
            return Self::ContentEditable;
        }
        match tag_name.to_ascii_uppercase().as_str() {
            "INPUT" | "SELECT" => Self::TextInput,
            "TEXTAREA" => Self::TextArea,
            _ => Self::Canvas,
        }
    }

    /// Typing into these must never trigger canvas shortcuts.
    pub fn is_editable(&self) -> bool {
        !matches!(self, Self::Canvas)
    }
}

/// A normalized input event.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    PointerDown { x: f32, y: f32, modifiers: Modifiers },
    PointerMove { x: f32, y: f32, modifiers: Modifiers },
    PointerUp { x: f32, y: f32 },
    /// The window lost focus. Any in-flight gesture must commit.
    Blur,
    Key {
        key: String,
        modifiers: Modifiers,
        target: KeyTarget,
    },
}

impl InputEvent {
    pub fn pointer_down(x: f32, y: f32, modifiers: Modifiers) -> Self {
        Self::PointerDown { x, y, modifiers }
    }

    pub fn pointer_move(x: f32, y: f32) -> Self {
        Self::PointerMove {
            x,
            y,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn pointer_up(x: f32, y: f32) -> Self {
        Self::PointerUp { x, y }
    }

    /// Extract position if this is a pointer event.
    pub fn position(&self) -> Option<Point> {
        match self {
            Self::PointerDown { x, y, .. }
            | Self::PointerMove { x, y, .. }
            | Self::PointerUp { x, y } => Some(Point::new(*x as f64, *y as f64)),
            _ => None,
        }
    }
}

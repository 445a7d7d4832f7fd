//! Input fed into the widget tree and events produced by it.

use glam::Vec2;

use crate::tree::WidgetId;

/// Mouse buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Keys the widgets react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
    PageUp,
    PageDown,
    Enter,
    Space,
    Escape,
    Tab,
}

/// Raw input in window pixel coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    MouseMove { position: Vec2 },
    MouseDown { position: Vec2, button: MouseButton },
    MouseUp { position: Vec2, button: MouseButton },
    /// Positive `delta` scrolls up, in lines.
    Wheel { position: Vec2, delta: f32 },
    KeyDown(Key),
    Text(char),
}

impl InputEvent {
    /// Pointer position, for mouse events.
    #[must_use]
    pub fn position(&self) -> Option<Vec2> {
        match self {
            Self::MouseMove { position }
            | Self::MouseDown { position, .. }
            | Self::MouseUp { position, .. }
            | Self::Wheel { position, .. } => Some(*position),
            Self::KeyDown(_) | Self::Text(_) => None,
        }
    }

    /// Whether the event targets the pointer rather than the focused widget.
    #[must_use]
    pub fn is_pointer(&self) -> bool {
        self.position().is_some()
    }
}

/// Something a widget reports back to the application.
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    Clicked(WidgetId),
    ValueChanged { id: WidgetId, value: f32 },
    Toggled { id: WidgetId, checked: bool },
    /// `path` indexes from the top-level menu down to the chosen item.
    MenuItemSelected { id: WidgetId, path: Vec<usize>, label: String },
    Scrolled { id: WidgetId, value: f32 },
    Closed(WidgetId),
}

impl UiEvent {
    /// Widget that produced the event.
    #[must_use]
    pub fn source(&self) -> WidgetId {
        match self {
            Self::Clicked(id) | Self::Closed(id) => *id,
            Self::ValueChanged { id, .. }
            | Self::Toggled { id, .. }
            | Self::MenuItemSelected { id, .. }
            | Self::Scrolled { id, .. } => *id,
        }
    }
}

//! Translation of winit window events into [`InputEvent`]s.

use glam::Vec2;
use winit::event::{ElementState, MouseScrollDelta, WindowEvent};
use winit::keyboard::{Key as WinitKey, NamedKey};

use crate::input::{InputEvent, Key, MouseButton};

/// Pixels of touchpad scrolling that count as one wheel notch.
const PIXELS_PER_LINE: f32 = 20.0;

/// Converts winit events, remembering the cursor position since button and
/// wheel events do not carry one.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputTranslator {
    cursor: Vec2,
}

impl InputTranslator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Last known cursor position in physical pixels.
    #[must_use]
    pub fn cursor(&self) -> Vec2 {
        self.cursor
    }

    /// Events for the UI produced by `event`, in order. Most window events
    /// produce none.
    pub fn translate(&mut self, event: &WindowEvent) -> Vec<InputEvent> {
        match event {
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = Vec2::new(position.x as f32, position.y as f32);
                vec![InputEvent::MouseMove { position: self.cursor }]
            }
            WindowEvent::MouseInput { state, button, .. } => {
                let Some(button) = translate_button(*button) else {
                    return Vec::new();
                };
                let position = self.cursor;
                vec![match state {
                    ElementState::Pressed => InputEvent::MouseDown { position, button },
                    ElementState::Released => InputEvent::MouseUp { position, button },
                }]
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let delta = wheel_lines(*delta);
                if delta == 0.0 {
                    return Vec::new();
                }
                vec![InputEvent::Wheel {
                    position: self.cursor,
                    delta,
                }]
            }
            WindowEvent::KeyboardInput { event, .. } if event.state == ElementState::Pressed => {
                if let Some(key) = translate_key(&event.logical_key) {
                    return vec![InputEvent::KeyDown(key)];
                }
                event
                    .text
                    .as_ref()
                    .map(|text| text.chars().filter(|c| !c.is_control()).map(InputEvent::Text).collect())
                    .unwrap_or_default()
            }
            _ => Vec::new(),
        }
    }
}

/// Maps a winit mouse button. Extra buttons are ignored.
#[must_use]
pub fn translate_button(button: winit::event::MouseButton) -> Option<MouseButton> {
    match button {
        winit::event::MouseButton::Left => Some(MouseButton::Left),
        winit::event::MouseButton::Right => Some(MouseButton::Right),
        winit::event::MouseButton::Middle => Some(MouseButton::Middle),
        _ => None,
    }
}

/// Maps the named keys widgets react to.
#[must_use]
pub fn translate_key(key: &WinitKey) -> Option<Key> {
    let WinitKey::Named(named) = key else {
        return None;
    };
    Some(match named {
        NamedKey::ArrowLeft => Key::Left,
        NamedKey::ArrowRight => Key::Right,
        NamedKey::ArrowUp => Key::Up,
        NamedKey::ArrowDown => Key::Down,
        NamedKey::Home => Key::Home,
        NamedKey::End => Key::End,
        NamedKey::PageUp => Key::PageUp,
        NamedKey::PageDown => Key::PageDown,
        NamedKey::Enter => Key::Enter,
        NamedKey::Space => Key::Space,
        NamedKey::Escape => Key::Escape,
        NamedKey::Tab => Key::Tab,
        _ => return None,
    })
}

/// Wheel movement in notches, positive scrolling up.
#[must_use]
pub fn wheel_lines(delta: MouseScrollDelta) -> f32 {
    match delta {
        MouseScrollDelta::LineDelta(_, y) => y,
        MouseScrollDelta::PixelDelta(p) => p.y as f32 / PIXELS_PER_LINE,
    }
}

//! Push buttons and check boxes.

use glam::Vec2;

use crate::draw::{Align, DrawList, Theme};
use crate::geometry::Rect;
use crate::input::{InputEvent, Key, MouseButton, UiEvent};
use crate::widget::{EventContext, Widget, WidgetState};

/// Press-and-release tracking shared by clickable widgets.
///
/// A click needs the press and the release both inside the widget. The mouse
/// is captured in between so a release elsewhere still ends the press.
#[derive(Debug, Clone, Copy, Default)]
struct ClickTracker {
    pressed: bool,
}

impl ClickTracker {
    /// Returns `Some(clicked)` for events it consumed.
    fn handle(&mut self, ctx: &mut EventContext<'_>, event: &InputEvent) -> Option<bool> {
        match event {
            InputEvent::MouseDown { button: MouseButton::Left, .. } => {
                self.pressed = true;
                ctx.capture_mouse();
                Some(false)
            }
            InputEvent::MouseUp { position, button: MouseButton::Left } if self.pressed => {
                self.pressed = false;
                ctx.release_mouse();
                Some(ctx.rect.contains(*position))
            }
            InputEvent::KeyDown(Key::Enter | Key::Space) => Some(true),
            InputEvent::MouseMove { .. } => Some(false),
            _ => None,
        }
    }
}

/// A push button with a text label.
#[derive(Debug, Clone)]
pub struct Button {
    pub label: String,
    tracker: ClickTracker,
}

impl Button {
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            tracker: ClickTracker::default(),
        }
    }

    /// Whether the button is held down.
    #[must_use]
    pub fn is_pressed(&self) -> bool {
        self.tracker.pressed
    }
}

impl Widget for Button {
    fn type_name(&self) -> &'static str {
        "Button"
    }

    fn draw(&self, rect: Rect, state: WidgetState, theme: &Theme, list: &mut DrawList) {
        let (fill, text) = if !state.enabled {
            (theme.button.faded(), theme.text_disabled)
        } else if self.tracker.pressed && state.hovered {
            (theme.button_pressed, theme.text)
        } else if state.hovered {
            (theme.button_hovered, theme.text)
        } else {
            (theme.button, theme.text)
        };
        list.rect(rect, fill);
        if state.focused {
            list.outline(rect, 1.0, theme.accent);
        }
        list.text_in(rect, &self.label, Align::Center, text, theme);
    }

    fn on_event(&mut self, ctx: &mut EventContext<'_>, event: &InputEvent) -> bool {
        match self.tracker.handle(ctx, event) {
            Some(clicked) => {
                if clicked {
                    ctx.emit(UiEvent::Clicked(ctx.id));
                }
                true
            }
            None => false,
        }
    }

    fn focusable(&self) -> bool {
        true
    }

    fn on_focus_changed(&mut self, focused: bool) {
        if !focused {
            self.tracker.pressed = false;
        }
    }
}

/// A labelled box that toggles when clicked.
#[derive(Debug, Clone)]
pub struct CheckBox {
    pub label: String,
    checked: bool,
    tracker: ClickTracker,
}

impl CheckBox {
    #[must_use]
    pub fn new(label: impl Into<String>, checked: bool) -> Self {
        Self {
            label: label.into(),
            checked,
            tracker: ClickTracker::default(),
        }
    }

    #[must_use]
    pub fn is_checked(&self) -> bool {
        self.checked
    }

    /// Sets the state without emitting an event.
    pub fn set_checked(&mut self, checked: bool) {
        self.checked = checked;
    }
}

impl Widget for CheckBox {
    fn type_name(&self) -> &'static str {
        "CheckBox"
    }

    fn draw(&self, rect: Rect, state: WidgetState, theme: &Theme, list: &mut DrawList) {
        let side = (rect.height - 2.0 * theme.padding).max(4.0);
        let square = Rect::new(rect.x + theme.padding, rect.y + (rect.height - side) * 0.5, side, side);
        let fade = |c: crate::draw::Color| if state.enabled { c } else { c.faded() };
        list.rect(square, fade(if state.hovered { theme.button_hovered } else { theme.button }));
        list.outline(square, 1.0, fade(if state.focused { theme.accent } else { theme.border }));
        if self.checked {
            list.rect(square.shrink(side * 0.25), fade(theme.accent));
        }
        let label_rect = Rect::from_min_size(
            Vec2::new(square.right(), rect.y),
            Vec2::new((rect.right() - square.right()).max(0.0), rect.height),
        );
        let text = if state.enabled { theme.text } else { theme.text_disabled };
        list.text_in(label_rect, &self.label, Align::Left, text, theme);
    }

    fn on_event(&mut self, ctx: &mut EventContext<'_>, event: &InputEvent) -> bool {
        match self.tracker.handle(ctx, event) {
            Some(clicked) => {
                if clicked {
                    self.checked = !self.checked;
                    ctx.emit(UiEvent::Toggled {
                        id: ctx.id,
                        checked: self.checked,
                    });
                }
                true
            }
            None => false,
        }
    }

    fn focusable(&self) -> bool {
        true
    }

    fn on_focus_changed(&mut self, focused: bool) {
        if !focused {
            self.tracker.pressed = false;
        }
    }
}

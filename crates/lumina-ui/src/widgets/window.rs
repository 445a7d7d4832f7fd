//! Movable, closable windows.

use glam::Vec2;

use crate::draw::{Align, DrawList, Theme};
use crate::geometry::Rect;
use crate::input::{InputEvent, Key, MouseButton, UiEvent};
use crate::widget::{EventContext, Widget, WidgetState};

/// A titled window. Dragging the title bar moves it; the close box or Escape
/// hides it and reports [`UiEvent::Closed`]. Children sit below the title bar
/// and are clipped to the window.
///
/// Windows swallow all pointer input over them so it does not reach the scene.
#[derive(Debug, Clone)]
pub struct Window {
    pub title: String,
    pub closable: bool,
    /// Last pointer position while dragging.
    drag_from: Option<Vec2>,
}

impl Window {
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            closable: true,
            drag_from: None,
        }
    }

    #[must_use]
    pub fn fixed(mut self) -> Self {
        self.closable = false;
        self
    }

    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.drag_from.is_some()
    }

    #[must_use]
    pub fn title_bar(rect: Rect, theme: &Theme) -> Rect {
        rect.split_top(theme.title_height).0
    }

    /// Close box at the right end of the title bar.
    #[must_use]
    pub fn close_box(rect: Rect, theme: &Theme) -> Rect {
        Self::title_bar(rect, theme).split_right(theme.title_height).1.shrink(3.0)
    }

    fn close(&mut self, ctx: &mut EventContext<'_>) {
        self.drag_from = None;
        ctx.release_mouse();
        ctx.close();
        ctx.emit(UiEvent::Closed(ctx.id));
    }
}

impl Widget for Window {
    fn type_name(&self) -> &'static str {
        "Window"
    }

    fn draw(&self, rect: Rect, state: WidgetState, theme: &Theme, list: &mut DrawList) {
        list.rect(rect, theme.window_background);
        let title_bar = Self::title_bar(rect, theme);
        let bar_color = if state.focus_within || self.is_dragging() {
            theme.title_bar_focused
        } else {
            theme.title_bar
        };
        list.rect(title_bar, bar_color);
        list.text_in(title_bar, &self.title, Align::Left, theme.text, theme);
        if self.closable {
            let close = Self::close_box(rect, theme);
            list.rect(close, theme.button);
            list.text_in(close, "x", Align::Center, theme.text, theme);
        }
        list.outline(rect, 1.0, theme.border);
    }

    fn on_event(&mut self, ctx: &mut EventContext<'_>, event: &InputEvent) -> bool {
        match event {
            InputEvent::MouseDown { position, button: MouseButton::Left } => {
                if self.closable && Self::close_box(ctx.rect, ctx.theme).contains(*position) {
                    self.close(ctx);
                } else if Self::title_bar(ctx.rect, ctx.theme).contains(*position) {
                    self.drag_from = Some(*position);
                    ctx.capture_mouse();
                }
                true
            }
            InputEvent::MouseMove { position } => {
                if let Some(from) = self.drag_from {
                    ctx.move_by(*position - from);
                    self.drag_from = Some(*position);
                }
                true
            }
            InputEvent::MouseUp { .. } => {
                if self.drag_from.take().is_some() {
                    ctx.release_mouse();
                }
                true
            }
            InputEvent::KeyDown(Key::Escape) if self.closable => {
                self.close(ctx);
                true
            }
            InputEvent::KeyDown(_) | InputEvent::Text(_) => false,
            InputEvent::MouseDown { .. } | InputEvent::Wheel { .. } => true,
        }
    }

    fn content_rect(&self, rect: Rect, theme: &Theme) -> Rect {
        rect.split_top(theme.title_height).1.shrink(theme.padding)
    }

    fn clips_children(&self) -> bool {
        true
    }
}

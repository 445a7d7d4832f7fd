//! The [`Widget`] trait and the context widgets see while handling input.

use std::any::Any;

use glam::Vec2;

use crate::draw::{DrawList, Theme};
use crate::geometry::Rect;
use crate::input::{InputEvent, UiEvent};
use crate::tree::WidgetId;

/// Per-node state the tree tracks on behalf of a widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WidgetState {
    pub hovered: bool,
    pub focused: bool,
    /// Whether the widget or one of its descendants has focus.
    pub focus_within: bool,
    /// Whether the widget holds the mouse capture.
    pub captured: bool,
    /// False if the widget or any ancestor is disabled.
    pub enabled: bool,
}

/// A node in the [`UiTree`](crate::UiTree).
///
/// Rectangles passed in are absolute window coordinates.
pub trait Widget: Any {
    /// Short type name, used in error messages.
    fn type_name(&self) -> &'static str;

    /// Appends draw commands for this widget. Children are drawn afterwards by the tree.
    fn draw(&self, rect: Rect, state: WidgetState, theme: &Theme, list: &mut DrawList);

    /// Handles input. Returns true when consumed, false to let it bubble to the parent.
    fn on_event(&mut self, ctx: &mut EventContext<'_>, event: &InputEvent) -> bool {
        let _ = (ctx, event);
        false
    }

    /// Whether clicking the widget gives it keyboard focus.
    fn focusable(&self) -> bool {
        false
    }

    /// Whether `point` hits the widget. Widgets that draw outside their rect,
    /// such as open menus, extend this.
    fn hit_test(&self, rect: Rect, point: Vec2, theme: &Theme) -> bool {
        let _ = theme;
        rect.contains(point)
    }

    /// Region children are laid out in, relative to `rect`.
    fn content_rect(&self, rect: Rect, theme: &Theme) -> Rect {
        let _ = theme;
        rect
    }

    /// Extra offset applied to children, for scrolling.
    fn scroll_offset(&self) -> Vec2 {
        Vec2::ZERO
    }

    /// Whether children are clipped to the content rect.
    fn clips_children(&self) -> bool {
        false
    }

    /// Reports the bounding size of the children and the visible content rect.
    fn update_content_extent(&mut self, extent: Vec2, viewport: Rect) {
        let _ = (extent, viewport);
    }

    /// Called when keyboard focus arrives or leaves.
    fn on_focus_changed(&mut self, focused: bool) {
        let _ = focused;
    }

    /// Draws parts that must appear above every other widget, such as menu dropdowns.
    fn draw_popup(&self, rect: Rect, state: WidgetState, theme: &Theme, list: &mut DrawList) {
        let _ = (rect, state, theme, list);
    }
}

/// Requests a widget makes while handling an event. The tree applies them afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Requests {
    pub capture: Option<bool>,
    pub focus: bool,
    pub move_by: Vec2,
    pub close: bool,
}

/// What a widget sees while handling input.
pub struct EventContext<'a> {
    pub id: WidgetId,
    /// Absolute rect of the widget.
    pub rect: Rect,
    pub state: WidgetState,
    pub theme: &'a Theme,
    events: &'a mut Vec<UiEvent>,
    pub(crate) requests: Requests,
}

impl<'a> EventContext<'a> {
    pub(crate) fn new(
        id: WidgetId,
        rect: Rect,
        state: WidgetState,
        theme: &'a Theme,
        events: &'a mut Vec<UiEvent>,
    ) -> Self {
        Self {
            id,
            rect,
            state,
            theme,
            events,
            requests: Requests::default(),
        }
    }

    /// Reports an event to the application.
    pub fn emit(&mut self, event: UiEvent) {
        self.events.push(event);
    }

    /// Routes all pointer input to this widget until released.
    pub fn capture_mouse(&mut self) {
        self.requests.capture = Some(true);
    }

    pub fn release_mouse(&mut self) {
        self.requests.capture = Some(false);
    }

    pub fn request_focus(&mut self) {
        self.requests.focus = true;
    }

    /// Moves this widget, and so its children, by `delta` pixels.
    pub fn move_by(&mut self, delta: Vec2) {
        self.requests.move_by += delta;
    }

    /// Hides this widget. The widget emits its own [`UiEvent::Closed`] if wanted.
    pub fn close(&mut self) {
        self.requests.close = true;
    }
}

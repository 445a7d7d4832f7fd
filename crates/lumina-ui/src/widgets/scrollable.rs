//! Vertically scrolling container.

use glam::Vec2;

use crate::draw::{Color, DrawList, Theme};
use crate::geometry::Rect;
use crate::input::InputEvent;
use crate::widget::{EventContext, Widget, WidgetState};
use crate::widgets::scroll_bar::{ScrollBar, ScrollModel};

/// A container whose children scroll vertically under a clip.
///
/// The tree reports the children's extent each frame; that becomes the scroll
/// range and the visible height becomes the page. Wheel events bubbling up
/// from children scroll it.
#[derive(Debug, Clone)]
pub struct ScrollableContainer {
    bar: ScrollBar,
    pub background: Option<Color>,
}

impl Default for ScrollableContainer {
    fn default() -> Self {
        Self::new()
    }
}

impl ScrollableContainer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            bar: ScrollBar::vertical(ScrollModel::new(0.0, 0.0, 0.0, 16.0)),
            background: None,
        }
    }

    /// Current scroll position in pixels.
    #[must_use]
    pub fn scroll(&self) -> f32 {
        self.bar.model.value()
    }

    pub fn set_scroll(&mut self, value: f32) -> bool {
        self.bar.model.set_value(value)
    }

    #[must_use]
    pub fn model(&self) -> &ScrollModel {
        &self.bar.model
    }

    fn bar_rect(rect: Rect, theme: &Theme) -> Rect {
        rect.split_right(theme.scroll_bar_width).1
    }
}

impl Widget for ScrollableContainer {
    fn type_name(&self) -> &'static str {
        "ScrollableContainer"
    }

    fn draw(&self, rect: Rect, state: WidgetState, theme: &Theme, list: &mut DrawList) {
        if let Some(background) = self.background {
            list.rect(rect, background);
        }
        if self.bar.model.is_scrollable() {
            self.bar.draw_in(Self::bar_rect(rect, theme), state, theme, list);
        }
    }

    fn on_event(&mut self, ctx: &mut EventContext<'_>, event: &InputEvent) -> bool {
        let bar_rect = Self::bar_rect(ctx.rect, ctx.theme);
        let on_bar = event.position().is_some_and(|p| bar_rect.contains(p));
        let routed_to_bar = match event {
            InputEvent::Wheel { .. } => self.bar.model.is_scrollable(),
            InputEvent::MouseDown { .. } => on_bar && self.bar.model.is_scrollable(),
            InputEvent::MouseMove { .. } | InputEvent::MouseUp { .. } => self.bar.is_dragging(),
            InputEvent::KeyDown(_) | InputEvent::Text(_) => false,
        };
        if routed_to_bar {
            self.bar.handle(bar_rect, ctx, event)
        } else {
            false
        }
    }

    fn content_rect(&self, rect: Rect, theme: &Theme) -> Rect {
        rect.split_right(theme.scroll_bar_width).0
    }

    fn scroll_offset(&self) -> Vec2 {
        Vec2::new(0.0, self.scroll())
    }

    fn clips_children(&self) -> bool {
        true
    }

    fn update_content_extent(&mut self, extent: Vec2, viewport: Rect) {
        self.bar.model.set_range(0.0, extent.y);
        self.bar.model.set_page(viewport.height);
    }
}

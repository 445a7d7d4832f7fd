//! Scroll bars and the scroll arithmetic shared with scrollable containers.

use glam::Vec2;

use crate::draw::{DrawList, Theme};
use crate::geometry::Rect;
use crate::input::{InputEvent, Key, MouseButton, UiEvent};
use crate::widget::{EventContext, Widget, WidgetState};

/// Lines scrolled per wheel notch.
pub const WHEEL_LINES: f32 = 3.0;
/// Shortest thumb, in pixels.
pub const MIN_THUMB_LENGTH: f32 = 12.0;

/// Scroll position over a range `[min, max]` of which `page` is visible.
///
/// The value is the start of the visible page, so it stays within
/// `[min, max - page]`. When the page covers the whole range the value is pinned to `min`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollModel {
    value: f32,
    min: f32,
    max: f32,
    page: f32,
    step: f32,
}

impl Default for ScrollModel {
    fn default() -> Self {
        Self::new(0.0, 1.0, 1.0, 0.1)
    }
}

impl ScrollModel {
    #[must_use]
    pub fn new(min: f32, max: f32, page: f32, step: f32) -> Self {
        let mut model = Self {
            value: min,
            min,
            max: max.max(min),
            page: page.max(0.0),
            step: step.max(0.0),
        };
        model.value = model.clamp(model.value);
        model
    }

    #[must_use]
    pub fn value(&self) -> f32 {
        self.value
    }

    #[must_use]
    pub fn min(&self) -> f32 {
        self.min
    }

    #[must_use]
    pub fn max(&self) -> f32 {
        self.max
    }

    #[must_use]
    pub fn page(&self) -> f32 {
        self.page
    }

    #[must_use]
    pub fn step(&self) -> f32 {
        self.step
    }

    /// Largest value the start of the page can take.
    #[must_use]
    pub fn max_value(&self) -> f32 {
        (self.max - self.page).max(self.min)
    }

    /// Whether there is anything to scroll.
    #[must_use]
    pub fn is_scrollable(&self) -> bool {
        self.max - self.min > self.page
    }

    fn clamp(&self, value: f32) -> f32 {
        if value.is_nan() {
            return self.min;
        }
        value.clamp(self.min, self.max_value())
    }

    /// Sets the value, clamped. Returns whether it changed.
    pub fn set_value(&mut self, value: f32) -> bool {
        let value = self.clamp(value);
        let changed = value != self.value;
        self.value = value;
        changed
    }

    /// Changes the range, keeping the value in bounds. Returns whether the value moved.
    pub fn set_range(&mut self, min: f32, max: f32) -> bool {
        self.min = min;
        self.max = max.max(min);
        self.set_value(self.value)
    }

    pub fn set_page(&mut self, page: f32) -> bool {
        self.page = page.max(0.0);
        self.set_value(self.value)
    }

    pub fn set_step(&mut self, step: f32) {
        self.step = step.max(0.0);
    }

    /// Moves by `lines` steps, negative toward `min`.
    pub fn step_by(&mut self, lines: f32) -> bool {
        self.set_value(self.value + lines * self.step)
    }

    /// Moves by `pages` pages, negative toward `min`.
    pub fn page_by(&mut self, pages: f32) -> bool {
        self.set_value(self.value + pages * self.page)
    }

    /// Applies a wheel movement. Positive `delta` scrolls toward `min`.
    pub fn wheel(&mut self, delta: f32) -> bool {
        self.step_by(-delta * WHEEL_LINES)
    }

    /// Applies a navigation key. Returns `None` for keys that do not scroll,
    /// otherwise whether the value changed.
    pub fn key(&mut self, key: Key) -> Option<bool> {
        Some(match key {
            Key::Up | Key::Left => self.step_by(-1.0),
            Key::Down | Key::Right => self.step_by(1.0),
            Key::PageUp => self.page_by(-1.0),
            Key::PageDown => self.page_by(1.0),
            Key::Home => self.set_value(self.min),
            Key::End => self.set_value(self.max),
            _ => return None,
        })
    }

    /// Thumb length for a track of `track` pixels, proportional to the visible fraction.
    #[must_use]
    pub fn thumb_length(&self, track: f32) -> f32 {
        let total = self.max - self.min;
        if total <= 0.0 || self.page >= total {
            return track.max(0.0);
        }
        (track * self.page / total).clamp(MIN_THUMB_LENGTH.min(track), track.max(0.0))
    }

    /// Thumb start along a track of `track` pixels.
    #[must_use]
    pub fn thumb_offset(&self, track: f32) -> f32 {
        let span = self.max_value() - self.min;
        if span <= 0.0 {
            return 0.0;
        }
        (self.value - self.min) / span * (track - self.thumb_length(track))
    }

    /// Value that puts the thumb start at `offset` along the track, clamped.
    #[must_use]
    pub fn value_at_thumb_offset(&self, offset: f32, track: f32) -> f32 {
        let free = track - self.thumb_length(track);
        if free <= 0.0 {
            return self.min;
        }
        self.clamp(self.min + offset / free * (self.max_value() - self.min))
    }
}

/// Scroll bar direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    Horizontal,
    #[default]
    Vertical,
}

impl Orientation {
    fn along(self, v: Vec2) -> f32 {
        match self {
            Self::Horizontal => v.x,
            Self::Vertical => v.y,
        }
    }
}

/// A scroll bar: a track with a draggable thumb.
///
/// Clicking the track pages toward the pointer, the wheel steps, and the
/// navigation keys work while focused. Changes are reported as [`UiEvent::Scrolled`].
#[derive(Debug, Clone, Default)]
pub struct ScrollBar {
    pub model: ScrollModel,
    pub orientation: Orientation,
    /// Pointer offset from the thumb start while dragging.
    grab: Option<f32>,
}

impl ScrollBar {
    #[must_use]
    pub fn new(orientation: Orientation, model: ScrollModel) -> Self {
        Self {
            model,
            orientation,
            grab: None,
        }
    }

    #[must_use]
    pub fn vertical(model: ScrollModel) -> Self {
        Self::new(Orientation::Vertical, model)
    }

    #[must_use]
    pub fn horizontal(model: ScrollModel) -> Self {
        Self::new(Orientation::Horizontal, model)
    }

    #[must_use]
    pub fn value(&self) -> f32 {
        self.model.value()
    }

    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.grab.is_some()
    }

    fn track_length(&self, rect: Rect) -> f32 {
        self.orientation.along(rect.size())
    }

    /// Thumb rectangle inside `rect`.
    #[must_use]
    pub fn thumb_rect(&self, rect: Rect) -> Rect {
        let track = self.track_length(rect);
        let offset = self.model.thumb_offset(track);
        let length = self.model.thumb_length(track);
        match self.orientation {
            Orientation::Vertical => Rect::new(rect.x, rect.y + offset, rect.width, length),
            Orientation::Horizontal => Rect::new(rect.x + offset, rect.y, length, rect.height),
        }
    }

    /// Handles input for a bar occupying `rect`. Shared with widgets that embed a bar.
    pub(crate) fn handle(&mut self, rect: Rect, ctx: &mut EventContext<'_>, event: &InputEvent) -> bool {
        let before = self.model.value();
        let consumed = match event {
            InputEvent::MouseDown { position, button: MouseButton::Left } => {
                let thumb = self.thumb_rect(rect);
                let along = self.orientation.along(*position);
                let thumb_start = self.orientation.along(thumb.min());
                if thumb.contains(*position) {
                    self.grab = Some(along - thumb_start);
                    ctx.capture_mouse();
                } else if along < thumb_start {
                    self.model.page_by(-1.0);
                } else {
                    self.model.page_by(1.0);
                }
                true
            }
            InputEvent::MouseMove { position } => {
                if let Some(grab) = self.grab {
                    let track = self.track_length(rect);
                    let offset = self.orientation.along(*position - rect.min()) - grab;
                    self.model.set_value(self.model.value_at_thumb_offset(offset, track));
                }
                true
            }
            InputEvent::MouseUp { .. } => {
                if self.grab.take().is_some() {
                    ctx.release_mouse();
                }
                true
            }
            InputEvent::Wheel { delta, .. } => {
                self.model.wheel(*delta);
                true
            }
            InputEvent::KeyDown(key) => self.model.key(*key).is_some(),
            _ => false,
        };
        if self.model.value() != before {
            ctx.emit(UiEvent::Scrolled {
                id: ctx.id,
                value: self.model.value(),
            });
        }
        consumed
    }

    pub(crate) fn draw_in(&self, rect: Rect, state: WidgetState, theme: &Theme, list: &mut DrawList) {
        list.rect(rect, theme.track);
        if !self.model.is_scrollable() {
            return;
        }
        let color = if self.is_dragging() {
            theme.accent
        } else if state.hovered {
            theme.button_hovered
        } else {
            theme.thumb
        };
        let color = if state.enabled { color } else { color.faded() };
        list.rect(self.thumb_rect(rect).shrink(2.0), color);
    }
}

impl Widget for ScrollBar {
    fn type_name(&self) -> &'static str {
        "ScrollBar"
    }

    fn draw(&self, rect: Rect, state: WidgetState, theme: &Theme, list: &mut DrawList) {
        self.draw_in(rect, state, theme, list);
    }

    fn on_event(&mut self, ctx: &mut EventContext<'_>, event: &InputEvent) -> bool {
        let rect = ctx.rect;
        self.handle(rect, ctx, event)
    }

    fn focusable(&self) -> bool {
        true
    }

    fn on_focus_changed(&mut self, focused: bool) {
        if !focused {
            self.grab = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_value_clamped_to_last_page() {
        let mut m = ScrollModel::new(0.0, 100.0, 20.0, 5.0);
        assert!(m.set_value(500.0));
        assert_eq!(m.value(), 80.0);
        assert!(!m.set_value(90.0));
        assert!(m.set_value(-3.0));
        assert_eq!(m.value(), 0.0);
    }

    #[test]
    fn test_page_covers_range() {
        let mut m = ScrollModel::new(0.0, 10.0, 50.0, 1.0);
        assert!(!m.is_scrollable());
        assert!(!m.step_by(1.0));
        assert_eq!(m.thumb_length(200.0), 200.0);
        assert_eq!(m.thumb_offset(200.0), 0.0);
    }

    #[test]
    fn test_keys_and_wheel() {
        let mut m = ScrollModel::new(0.0, 100.0, 10.0, 2.0);
        assert_eq!(m.key(Key::Down), Some(true));
        assert_eq!(m.value(), 2.0);
        m.key(Key::PageDown);
        assert_eq!(m.value(), 12.0);
        m.key(Key::End);
        assert_eq!(m.value(), 90.0);
        m.wheel(1.0);
        assert_eq!(m.value(), 84.0);
        m.key(Key::Home);
        assert_eq!(m.value(), 0.0);
        assert_eq!(m.key(Key::Enter), None);
    }

    #[test]
    fn test_shrinking_range_moves_value() {
        let mut m = ScrollModel::new(0.0, 100.0, 10.0, 1.0);
        m.set_value(90.0);
        assert!(m.set_range(0.0, 50.0));
        assert_eq!(m.value(), 40.0);
    }

    #[test]
    fn test_thumb_geometry() {
        let mut m = ScrollModel::new(0.0, 100.0, 25.0, 1.0);
        assert_eq!(m.thumb_length(200.0), 50.0);
        m.set_value(75.0);
        assert_eq!(m.thumb_offset(200.0), 150.0);
        assert_eq!(m.value_at_thumb_offset(75.0, 200.0), 37.5);
    }

    #[test]
    fn test_thumb_has_minimum_length() {
        let m = ScrollModel::new(0.0, 10_000.0, 10.0, 1.0);
        assert_eq!(m.thumb_length(100.0), MIN_THUMB_LENGTH);
    }

    proptest! {
        #[test]
        fn prop_value_stays_in_bounds(
            page in 0.0f32..200.0,
            max in 0.0f32..1000.0,
            target in -2000.0f32..2000.0,
        ) {
            let mut m = ScrollModel::new(0.0, max, page, 1.0);
            m.set_value(target);
            prop_assert!(m.value() >= 0.0);
            prop_assert!(m.value() <= m.max_value());
        }

        #[test]
        fn prop_thumb_inside_track(
            page in 1.0f32..200.0,
            max in 1.0f32..1000.0,
            value in 0.0f32..1000.0,
            track in 20.0f32..800.0,
        ) {
            let mut m = ScrollModel::new(0.0, max, page, 1.0);
            m.set_value(value);
            let start = m.thumb_offset(track);
            let end = start + m.thumb_length(track);
            prop_assert!(start >= -1e-3);
            prop_assert!(end <= track + 1e-3);
        }

        #[test]
        fn prop_thumb_offset_inverts(
            value in 0.0f32..900.0,
            track in 50.0f32..800.0,
        ) {
            let mut m = ScrollModel::new(0.0, 1000.0, 100.0, 1.0);
            m.set_value(value);
            let back = m.value_at_thumb_offset(m.thumb_offset(track), track);
            prop_assert!((back - m.value()).abs() < 0.05);
        }
    }
}

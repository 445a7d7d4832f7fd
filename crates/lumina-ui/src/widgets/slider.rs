//! Horizontal value slider.

use crate::draw::{Align, DrawList, Theme};
use crate::geometry::Rect;
use crate::input::{InputEvent, Key, MouseButton, UiEvent};
use crate::widget::{EventContext, Widget, WidgetState};

const HANDLE_WIDTH: f32 = 8.0;

/// Picks a value in `[min, max]`, snapped to multiples of `step` from `min`.
///
/// Dragging sets the value from the pointer; arrow keys move one step,
/// Home and End jump to the ends. Changes are reported as [`UiEvent::ValueChanged`].
#[derive(Debug, Clone)]
pub struct Slider {
    min: f32,
    max: f32,
    /// Zero means continuous.
    step: f32,
    value: f32,
    /// Digits shown after the decimal point.
    pub precision: usize,
    dragging: bool,
}

impl Slider {
    /// A slider over `[min, max]`. Bounds are swapped if given in the wrong order.
    #[must_use]
    pub fn new(min: f32, max: f32, step: f32, value: f32) -> Self {
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        let step = step.max(0.0);
        let mut slider = Self {
            min,
            max,
            step,
            value: min,
            precision: precision_for(step),
            dragging: false,
        };
        slider.value = slider.snap(value);
        slider
    }

    #[must_use]
    pub fn value(&self) -> f32 {
        self.value
    }

    #[must_use]
    pub fn range(&self) -> (f32, f32) {
        (self.min, self.max)
    }

    #[must_use]
    pub fn step(&self) -> f32 {
        self.step
    }

    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Clamps to the range and rounds to the nearest step.
    ///
    /// The reachable values are `min + k * step` and `max` itself, so `max`
    /// stays reachable when the range is not a multiple of the step.
    #[must_use]
    pub fn snap(&self, value: f32) -> f32 {
        if value.is_nan() {
            return self.min;
        }
        let value = value.clamp(self.min, self.max);
        if self.step <= 0.0 {
            return value;
        }
        let last_step = ((self.max - self.min) / self.step + 1e-4).floor();
        let steps = ((value - self.min) / self.step).round().min(last_step);
        let snapped = self.min + steps * self.step;
        if self.max - value <= (value - snapped).abs() {
            self.max
        } else {
            snapped.min(self.max)
        }
    }

    /// Sets the value, snapped. Returns whether it changed.
    pub fn set_value(&mut self, value: f32) -> bool {
        let value = self.snap(value);
        let changed = value != self.value;
        self.value = value;
        changed
    }

    /// Fraction of the range covered by the current value.
    #[must_use]
    pub fn fraction(&self) -> f32 {
        if self.max > self.min {
            (self.value - self.min) / (self.max - self.min)
        } else {
            0.0
        }
    }

    fn track(rect: Rect) -> (f32, f32) {
        let start = rect.x + HANDLE_WIDTH * 0.5;
        (start, (rect.width - HANDLE_WIDTH).max(1.0))
    }

    /// Value under pointer x-coordinate `x`.
    #[must_use]
    pub fn value_at(&self, rect: Rect, x: f32) -> f32 {
        let (start, length) = Self::track(rect);
        let t = ((x - start) / length).clamp(0.0, 1.0);
        self.snap(self.min + t * (self.max - self.min))
    }

    fn key_step(&self) -> f32 {
        if self.step > 0.0 {
            self.step
        } else {
            (self.max - self.min) / 100.0
        }
    }

    #[must_use]
    pub fn display_value(&self) -> String {
        format!("{:.*}", self.precision, self.value)
    }
}

/// Decimal digits needed to show multiples of `step`.
fn precision_for(step: f32) -> usize {
    if step <= 0.0 {
        return 3;
    }
    let mut digits = 0;
    let mut scaled = step;
    while digits < 4 && (scaled - scaled.round()).abs() > 1e-4 {
        scaled *= 10.0;
        digits += 1;
    }
    digits
}

impl Widget for Slider {
    fn type_name(&self) -> &'static str {
        "Slider"
    }

    fn draw(&self, rect: Rect, state: WidgetState, theme: &Theme, list: &mut DrawList) {
        let fade = |c: crate::draw::Color| if state.enabled { c } else { c.faded() };
        list.rect(rect, fade(theme.track));
        let (start, length) = Self::track(rect);
        let handle_x = start + self.fraction() * length;
        list.rect(
            Rect::new(rect.x, rect.y, handle_x - rect.x, rect.height),
            fade(theme.accent.with_alpha(0.35)),
        );
        let handle = if self.dragging {
            theme.accent
        } else if state.hovered || state.focused {
            theme.button_hovered
        } else {
            theme.thumb
        };
        list.rect(
            Rect::new(handle_x - HANDLE_WIDTH * 0.5, rect.y, HANDLE_WIDTH, rect.height),
            fade(handle),
        );
        let text = if state.enabled { theme.text } else { theme.text_disabled };
        list.text_in(rect, &self.display_value(), Align::Center, text, theme);
    }

    fn on_event(&mut self, ctx: &mut EventContext<'_>, event: &InputEvent) -> bool {
        let before = self.value;
        let consumed = match event {
            InputEvent::MouseDown { position, button: MouseButton::Left } => {
                self.dragging = true;
                ctx.capture_mouse();
                self.set_value(self.value_at(ctx.rect, position.x));
                true
            }
            InputEvent::MouseMove { position } => {
                if self.dragging {
                    self.set_value(self.value_at(ctx.rect, position.x));
                }
                self.dragging
            }
            InputEvent::MouseUp { .. } if self.dragging => {
                self.dragging = false;
                ctx.release_mouse();
                true
            }
            InputEvent::KeyDown(key) => {
                let step = self.key_step();
                match key {
                    Key::Left | Key::Down => self.set_value(self.value - step),
                    Key::Right | Key::Up => self.set_value(self.value + step),
                    Key::PageDown => self.set_value(self.value - step * 10.0),
                    Key::PageUp => self.set_value(self.value + step * 10.0),
                    Key::Home => self.set_value(self.min),
                    Key::End => self.set_value(self.max),
                    _ => return false,
                };
                true
            }
            _ => false,
        };
        if self.value != before {
            ctx.emit(UiEvent::ValueChanged {
                id: ctx.id,
                value: self.value,
            });
        }
        consumed
    }

    fn focusable(&self) -> bool {
        true
    }

    fn on_focus_changed(&mut self, focused: bool) {
        if !focused {
            self.dragging = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_snapping() {
        let s = Slider::new(0.0, 1.0, 0.25, 0.0);
        assert_eq!(s.snap(0.3), 0.25);
        assert_eq!(s.snap(0.4), 0.5);
        assert_eq!(s.snap(7.0), 1.0);
        assert_eq!(s.snap(-1.0), 0.0);
        assert_eq!(s.snap(f32::NAN), 0.0);
    }

    #[test]
    fn test_uneven_range_does_not_overshoot() {
        let s = Slider::new(0.0, 1.0, 0.4, 0.0);
        assert_eq!(s.snap(1.0), 1.0);
        assert!((s.snap(0.7) - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_max_reachable_with_partial_last_step() {
        let mut s = Slider::new(0.0, 1.0, 0.3, 0.0);
        s.set_value(1.0);
        assert_eq!(s.value(), 1.0);
        assert!((s.snap(0.8) - 0.9).abs() < 1e-6);
        assert_eq!(s.snap(0.97), 1.0);

        let mut tree = crate::UiTree::default();
        let id = tree.add(Slider::new(0.0, 1.0, 0.3, 0.0), Rect::new(0.0, 0.0, 100.0, 20.0));
        tree.set_focus(Some(id));
        let events = tree.dispatch(&InputEvent::KeyDown(Key::End));
        assert_eq!(events, vec![UiEvent::ValueChanged { id, value: 1.0 }]);
        assert_eq!(tree.get::<Slider>(id).unwrap().value(), 1.0);
    }

    #[test]
    fn test_constructor_normalizes() {
        let s = Slider::new(10.0, 2.0, 1.0, 100.0);
        assert_eq!(s.range(), (2.0, 10.0));
        assert_eq!(s.value(), 10.0);
    }

    #[test]
    fn test_value_at_pointer() {
        let s = Slider::new(0.0, 100.0, 1.0, 0.0);
        let rect = Rect::new(0.0, 0.0, 108.0, 20.0);
        assert_eq!(s.value_at(rect, 0.0), 0.0);
        assert_eq!(s.value_at(rect, 54.0), 50.0);
        assert_eq!(s.value_at(rect, 500.0), 100.0);
    }

    #[test]
    fn test_precision() {
        assert_eq!(precision_for(1.0), 0);
        assert_eq!(precision_for(0.1), 1);
        assert_eq!(precision_for(0.05), 2);
        assert_eq!(Slider::new(0.0, 1.0, 0.05, 0.5).display_value(), "0.50");
    }

    proptest! {
        #[test]
        fn prop_snapped_values_in_range(
            min in -100.0f32..100.0,
            span in 0.0f32..100.0,
            step in 0.0f32..10.0,
            v in -500.0f32..500.0,
        ) {
            let s = Slider::new(min, min + span, step, min);
            let snapped = s.snap(v);
            prop_assert!(snapped >= min && snapped <= min + span);
        }
    }
}

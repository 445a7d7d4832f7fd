//! Static widgets: panels, containers and labels.

use glam::Vec2;

use crate::draw::{Align, Color, DrawList, Theme};
use crate::geometry::Rect;
use crate::widget::{Widget, WidgetState};

/// A rectangle that groups children, optionally filled and outlined.
#[derive(Debug, Clone, Default)]
pub struct Panel {
    pub background: Option<Color>,
    pub border: Option<Color>,
    /// Inset applied to children.
    pub padding: f32,
    pub clip: bool,
}

/// An invisible panel used only for grouping.
pub type Container = Panel;

impl Panel {
    /// A filled, outlined panel in the theme's window colors.
    #[must_use]
    pub fn filled(theme: &Theme) -> Self {
        Self {
            background: Some(theme.window_background),
            border: Some(theme.border),
            padding: theme.padding,
            clip: true,
        }
    }

    /// An invisible grouping panel.
    #[must_use]
    pub fn container() -> Self {
        Self::default()
    }
}

impl Widget for Panel {
    fn type_name(&self) -> &'static str {
        "Panel"
    }

    fn draw(&self, rect: Rect, _state: WidgetState, _theme: &Theme, list: &mut DrawList) {
        if let Some(background) = self.background {
            list.rect(rect, background);
        }
        if let Some(border) = self.border {
            list.outline(rect, 1.0, border);
        }
    }

    fn hit_test(&self, rect: Rect, point: Vec2, _theme: &Theme) -> bool {
        // Invisible containers let clicks through to whatever is behind them.
        self.background.is_some() && rect.contains(point)
    }

    fn content_rect(&self, rect: Rect, _theme: &Theme) -> Rect {
        rect.shrink(self.padding)
    }

    fn clips_children(&self) -> bool {
        self.clip
    }
}

/// A line of text. Labels never take input.
#[derive(Debug, Clone)]
pub struct Label {
    pub text: String,
    pub align: Align,
    /// Overrides the theme's text color.
    pub color: Option<Color>,
}

impl Label {
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            align: Align::Left,
            color: None,
        }
    }

    #[must_use]
    pub fn with_align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }
}

impl Widget for Label {
    fn type_name(&self) -> &'static str {
        "Label"
    }

    fn draw(&self, rect: Rect, state: WidgetState, theme: &Theme, list: &mut DrawList) {
        let color = if state.enabled {
            self.color.unwrap_or(theme.text)
        } else {
            theme.text_disabled
        };
        list.text_in(rect, &self.text, self.align, color, theme);
    }

    fn hit_test(&self, _rect: Rect, _point: Vec2, _theme: &Theme) -> bool {
        false
    }
}

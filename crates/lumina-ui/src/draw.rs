//! Draw commands produced by widgets and their tessellation into triangles.

use bytemuck::{Pod, Zeroable};
use glam::Vec2;

use crate::font;
use crate::geometry::Rect;

/// Linear RGBA color with straight alpha.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Color(pub [f32; 4]);

impl Color {
    pub const TRANSPARENT: Self = Self([0.0; 4]);
    pub const WHITE: Self = Self([1.0; 4]);

    /// From 8-bit sRGB components.
    #[must_use]
    pub fn from_srgba8(r: u8, g: u8, b: u8, a: u8) -> Self {
        let channel = |v: u8| srgb_to_linear(f32::from(v) / 255.0);
        Self([channel(r), channel(g), channel(b), f32::from(a) / 255.0])
    }

    #[must_use]
    pub fn with_alpha(self, alpha: f32) -> Self {
        let [r, g, b, _] = self.0;
        Self([r, g, b, alpha])
    }

    /// Halves the alpha, used for disabled widgets.
    #[must_use]
    pub fn faded(self) -> Self {
        let [r, g, b, a] = self.0;
        Self([r, g, b, a * 0.45])
    }
}

fn srgb_to_linear(v: f32) -> f32 {
    if v <= 0.04045 {
        v / 12.92
    } else {
        ((v + 0.055) / 1.055).powf(2.4)
    }
}

/// Colors and metrics shared by all widgets.
#[derive(Debug, Clone)]
pub struct Theme {
    pub text: Color,
    pub text_disabled: Color,
    pub window_background: Color,
    pub title_bar: Color,
    pub title_bar_focused: Color,
    pub border: Color,
    pub button: Color,
    pub button_hovered: Color,
    pub button_pressed: Color,
    pub accent: Color,
    pub track: Color,
    pub thumb: Color,
    pub menu_bar: Color,
    pub menu_highlight: Color,
    /// Multiplier on the 5x7 font.
    pub text_scale: f32,
    pub title_height: f32,
    pub row_height: f32,
    pub padding: f32,
    pub scroll_bar_width: f32,
    pub menu_bar_height: f32,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            text: Color::from_srgba8(230, 230, 235, 255),
            text_disabled: Color::from_srgba8(120, 120, 128, 255),
            window_background: Color::from_srgba8(32, 34, 40, 235),
            title_bar: Color::from_srgba8(48, 52, 64, 255),
            title_bar_focused: Color::from_srgba8(58, 84, 132, 255),
            border: Color::from_srgba8(80, 84, 96, 255),
            button: Color::from_srgba8(60, 64, 76, 255),
            button_hovered: Color::from_srgba8(76, 82, 98, 255),
            button_pressed: Color::from_srgba8(44, 48, 58, 255),
            accent: Color::from_srgba8(90, 150, 240, 255),
            track: Color::from_srgba8(24, 26, 30, 255),
            thumb: Color::from_srgba8(110, 116, 132, 255),
            menu_bar: Color::from_srgba8(40, 42, 50, 250),
            menu_highlight: Color::from_srgba8(66, 100, 170, 255),
            text_scale: 2.0,
            title_height: 22.0,
            row_height: 22.0,
            padding: 4.0,
            scroll_bar_width: 14.0,
            menu_bar_height: 22.0,
        }
    }
}

impl Theme {
    /// Height of one line of text.
    #[must_use]
    pub fn text_height(&self) -> f32 {
        font::GLYPH_ROWS as f32 * self.text_scale
    }

    #[must_use]
    pub fn text_width(&self, text: &str) -> f32 {
        font::text_width(text, self.text_scale)
    }
}

/// Horizontal text placement inside a rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

/// A single draw command.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Rect { rect: Rect, color: Color, clip: Option<Rect> },
    Text { origin: Vec2, text: String, color: Color, scale: f32, clip: Option<Rect> },
}

impl DrawCommand {
    #[must_use]
    pub fn clip(&self) -> Option<Rect> {
        match self {
            Self::Rect { clip, .. } | Self::Text { clip, .. } => *clip,
        }
    }
}

/// Ordered list of draw commands, back to front.
#[derive(Debug, Clone, Default)]
pub struct DrawList {
    commands: Vec<DrawCommand>,
    clip_stack: Vec<Rect>,
}

impl DrawList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Current clip rectangle, the intersection of everything pushed.
    #[must_use]
    pub fn current_clip(&self) -> Option<Rect> {
        self.clip_stack.last().copied()
    }

    /// Restricts later commands to `rect` intersected with the current clip.
    pub fn push_clip(&mut self, rect: Rect) {
        let clip = match self.current_clip() {
            Some(current) => current.intersect(&rect).unwrap_or(Rect::new(rect.x, rect.y, 0.0, 0.0)),
            None => rect,
        };
        self.clip_stack.push(clip);
    }

    pub fn pop_clip(&mut self) {
        self.clip_stack.pop();
    }

    pub fn rect(&mut self, rect: Rect, color: Color) {
        if rect.width <= 0.0 || rect.height <= 0.0 || color.0[3] <= 0.0 {
            return;
        }
        let clip = self.current_clip();
        self.commands.push(DrawCommand::Rect { rect, color, clip });
    }

    /// One-pixel-thick outline drawn inside `rect`.
    pub fn outline(&mut self, rect: Rect, thickness: f32, color: Color) {
        let t = thickness.min(rect.width * 0.5).min(rect.height * 0.5);
        self.rect(Rect::new(rect.x, rect.y, rect.width, t), color);
        self.rect(Rect::new(rect.x, rect.bottom() - t, rect.width, t), color);
        self.rect(Rect::new(rect.x, rect.y + t, t, rect.height - 2.0 * t), color);
        self.rect(Rect::new(rect.right() - t, rect.y + t, t, rect.height - 2.0 * t), color);
    }

    pub fn text(&mut self, origin: Vec2, text: &str, color: Color, scale: f32) {
        if text.is_empty() {
            return;
        }
        let clip = self.current_clip();
        self.commands.push(DrawCommand::Text {
            origin,
            text: text.to_owned(),
            color,
            scale,
            clip,
        });
    }

    /// Text vertically centered in `rect` and aligned horizontally.
    pub fn text_in(&mut self, rect: Rect, text: &str, align: Align, color: Color, theme: &Theme) {
        let size = font::text_size(text, theme.text_scale);
        let x = match align {
            Align::Left => rect.x + theme.padding,
            Align::Center => rect.x + (rect.width - size.x) * 0.5,
            Align::Right => rect.right() - theme.padding - size.x,
        };
        let y = rect.y + (rect.height - size.y) * 0.5;
        self.text(Vec2::new(x.round(), y.round()), text, color, theme.text_scale);
    }

    /// Appends another list, for example a widget drawn into a scratch list.
    pub fn append(&mut self, other: DrawList) {
        self.commands.extend(other.commands);
    }
}

/// Vertex of the overlay pipeline.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct UiVertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
}

/// Contiguous vertex range sharing one scissor rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawBatch {
    /// Scissor in pixels, already clamped to the target. `None` means the whole target.
    pub scissor: Option<[u32; 4]>,
    pub first_vertex: u32,
    pub vertex_count: u32,
}

/// Triangles ready for upload.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub vertices: Vec<UiVertex>,
    pub batches: Vec<DrawBatch>,
}

fn scissor_for(clip: Option<Rect>, width: u32, height: u32) -> Option<[u32; 4]> {
    let clip = clip?;
    let x0 = clip.x.max(0.0).floor().min(width as f32) as u32;
    let y0 = clip.y.max(0.0).floor().min(height as f32) as u32;
    let x1 = clip.right().max(0.0).ceil().min(width as f32) as u32;
    let y1 = clip.bottom().max(0.0).ceil().min(height as f32) as u32;
    Some([x0, y0, x1.saturating_sub(x0), y1.saturating_sub(y0)])
}

fn push_quad(vertices: &mut Vec<UiVertex>, rect: Rect, color: Color) {
    let (x0, y0, x1, y1) = (rect.x, rect.y, rect.right(), rect.bottom());
    let color = color.0;
    for position in [[x0, y0], [x1, y0], [x1, y1], [x0, y0], [x1, y1], [x0, y1]] {
        vertices.push(UiVertex { position, color });
    }
}

/// Converts commands into triangles. Text becomes one quad per vertical run of
/// glyph pixels. Commands with an empty scissor are dropped.
#[must_use]
pub fn tessellate(list: &DrawList, width: u32, height: u32) -> Mesh {
    let mut mesh = Mesh::default();
    for command in list.commands() {
        let scissor = scissor_for(command.clip(), width, height);
        if matches!(scissor, Some([_, _, w, h]) if w == 0 || h == 0) {
            continue;
        }
        let start = mesh.vertices.len() as u32;
        match command {
            DrawCommand::Rect { rect, color, .. } => push_quad(&mut mesh.vertices, *rect, *color),
            DrawCommand::Text { origin, text, color, scale, .. } => {
                for (i, c) in text.chars().enumerate() {
                    let cell_x = origin.x + i as f32 * font::ADVANCE * scale;
                    font::for_each_run(c, |column, row, len| {
                        let rect = Rect::new(
                            cell_x + column as f32 * scale,
                            origin.y + row as f32 * scale,
                            *scale,
                            len as f32 * scale,
                        );
                        push_quad(&mut mesh.vertices, rect, *color);
                    });
                }
            }
        }
        let count = mesh.vertices.len() as u32 - start;
        if count == 0 {
            continue;
        }
        match mesh.batches.last_mut() {
            Some(last) if last.scissor == scissor && last.first_vertex + last.vertex_count == start => {
                last.vertex_count += count;
            }
            _ => mesh.batches.push(DrawBatch { scissor, first_vertex: start, vertex_count: count }),
        }
    }
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_and_clip_merge_into_batches() {
        let mut list = DrawList::new();
        list.rect(Rect::new(0.0, 0.0, 10.0, 10.0), Color::WHITE);
        list.rect(Rect::new(10.0, 0.0, 10.0, 10.0), Color::WHITE);
        list.push_clip(Rect::new(0.0, 0.0, 5.0, 5.0));
        list.rect(Rect::new(0.0, 0.0, 10.0, 10.0), Color::WHITE);
        list.pop_clip();

        let mesh = tessellate(&list, 100, 100);
        assert_eq!(mesh.vertices.len(), 18);
        assert_eq!(mesh.batches.len(), 2);
        assert_eq!(mesh.batches[0].vertex_count, 12);
        assert_eq!(mesh.batches[1].scissor, Some([0, 0, 5, 5]));
    }

    #[test]
    fn test_nested_clip_intersects() {
        let mut list = DrawList::new();
        list.push_clip(Rect::new(0.0, 0.0, 50.0, 50.0));
        list.push_clip(Rect::new(40.0, 40.0, 50.0, 50.0));
        assert_eq!(list.current_clip(), Some(Rect::new(40.0, 40.0, 10.0, 10.0)));
        list.pop_clip();
        list.push_clip(Rect::new(60.0, 60.0, 5.0, 5.0));
        list.rect(Rect::new(60.0, 60.0, 5.0, 5.0), Color::WHITE);
        // Disjoint clip yields an empty scissor and nothing is drawn.
        let mesh = tessellate(&list, 100, 100);
        assert!(mesh.vertices.is_empty());
    }

    #[test]
    fn test_scissor_clamped_to_target() {
        let mut list = DrawList::new();
        list.push_clip(Rect::new(-10.0, 90.0, 50.0, 50.0));
        list.rect(Rect::new(0.0, 90.0, 10.0, 10.0), Color::WHITE);
        let mesh = tessellate(&list, 100, 100);
        assert_eq!(mesh.batches[0].scissor, Some([0, 90, 40, 10]));
    }

    #[test]
    fn test_invisible_rects_skipped() {
        let mut list = DrawList::new();
        list.rect(Rect::new(0.0, 0.0, 0.0, 10.0), Color::WHITE);
        list.rect(Rect::new(0.0, 0.0, 10.0, 10.0), Color::TRANSPARENT);
        list.text(Vec2::ZERO, "", Color::WHITE, 1.0);
        assert!(list.is_empty());
    }

    #[test]
    fn test_text_quads() {
        let mut list = DrawList::new();
        list.text(Vec2::ZERO, "I", Color::WHITE, 2.0);
        let mesh = tessellate(&list, 100, 100);
        // 'I' is three runs: top and bottom serifs are split in columns 1 and 3.
        assert_eq!(mesh.vertices.len(), 5 * 6);
        let max_y = mesh.vertices.iter().map(|v| v.position[1]).fold(0.0, f32::max);
        assert_eq!(max_y, 14.0);
    }

    #[test]
    fn test_srgb_conversion() {
        let c = Color::from_srgba8(255, 0, 128, 255);
        assert_eq!(c.0[0], 1.0);
        assert_eq!(c.0[1], 0.0);
        assert!((c.0[2] - 0.2159).abs() < 1e-3);
    }
}

//! Main menu bar with nested dropdown menus.

use glam::Vec2;

use crate::draw::{Align, DrawList, Theme};
use crate::geometry::Rect;
use crate::input::{InputEvent, Key, MouseButton, UiEvent};
use crate::widget::{EventContext, Widget, WidgetState};

const MIN_DROPDOWN_WIDTH: f32 = 120.0;
const SUBMENU_MARKER: &str = ">";

/// An entry in a menu. Items with children open a submenu instead of being selected.
#[derive(Debug, Clone, PartialEq)]
pub struct MenuItem {
    pub label: String,
    pub enabled: bool,
    pub children: Vec<MenuItem>,
}

impl MenuItem {
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            enabled: true,
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_children(mut self, children: Vec<MenuItem>) -> Self {
        self.children = children;
        self
    }

    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    #[must_use]
    pub fn has_submenu(&self) -> bool {
        !self.children.is_empty()
    }
}

/// One open dropdown: its rectangle, depth and items.
struct Dropdown<'a> {
    rect: Rect,
    level: usize,
    items: &'a [MenuItem],
}

/// A horizontal bar of top-level menus.
///
/// `open` is the chain of expanded items: `open[0]` is the top-level menu whose
/// dropdown is showing, `open[1]` the item in that dropdown whose submenu is
/// showing, and so on. `cursor` is the keyboard highlight in the deepest dropdown.
///
/// Selecting a leaf reports [`UiEvent::MenuItemSelected`] with the full index path.
#[derive(Debug, Clone, Default)]
pub struct MainMenu {
    items: Vec<MenuItem>,
    open: Vec<usize>,
    cursor: Option<usize>,
    hovered_bar: Option<usize>,
}

impl MainMenu {
    #[must_use]
    pub fn new(items: Vec<MenuItem>) -> Self {
        Self {
            items,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn items(&self) -> &[MenuItem] {
        &self.items
    }

    pub fn items_mut(&mut self) -> &mut Vec<MenuItem> {
        self.close();
        &mut self.items
    }

    /// Item at an index path, if it exists.
    #[must_use]
    pub fn item(&self, path: &[usize]) -> Option<&MenuItem> {
        let (first, rest) = path.split_first()?;
        let mut item = self.items.get(*first)?;
        for index in rest {
            item = item.children.get(*index)?;
        }
        Some(item)
    }

    pub fn item_mut(&mut self, path: &[usize]) -> Option<&mut MenuItem> {
        let (first, rest) = path.split_first()?;
        let mut item = self.items.get_mut(*first)?;
        for index in rest {
            item = item.children.get_mut(*index)?;
        }
        Some(item)
    }

    #[must_use]
    pub fn open_path(&self) -> &[usize] {
        &self.open
    }

    #[must_use]
    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        !self.open.is_empty()
    }

    pub fn close(&mut self) {
        self.open.clear();
        self.cursor = None;
    }

    /// Opens a top-level menu.
    pub fn open_menu(&mut self, index: usize) {
        if index < self.items.len() {
            self.open = vec![index];
            self.cursor = None;
        }
    }

    /// Items of the deepest open dropdown.
    fn deepest_items(&self) -> &[MenuItem] {
        self.item(&self.open)
            .map(|item| item.children.as_slice())
            .unwrap_or_default()
    }

    fn bar_item_width(label: &str, theme: &Theme) -> f32 {
        theme.text_width(label) + theme.padding * 4.0
    }

    /// Rectangles of the top-level entries.
    #[must_use]
    pub fn bar_item_rects(&self, rect: Rect, theme: &Theme) -> Vec<Rect> {
        let mut x = rect.x;
        self.items
            .iter()
            .map(|item| {
                let width = Self::bar_item_width(&item.label, theme);
                let r = Rect::new(x, rect.y, width, rect.height);
                x += width;
                r
            })
            .collect()
    }

    fn dropdown_width(items: &[MenuItem], theme: &Theme) -> f32 {
        let marker = theme.text_width(SUBMENU_MARKER) + theme.padding * 2.0;
        items
            .iter()
            .map(|i| theme.text_width(&i.label) + theme.padding * 2.0 + marker)
            .fold(MIN_DROPDOWN_WIDTH, f32::max)
    }

    fn dropdowns(&self, rect: Rect, theme: &Theme) -> Vec<Dropdown<'_>> {
        let mut dropdowns: Vec<Dropdown<'_>> = Vec::new();
        let Some(first) = self.open.first() else {
            return dropdowns;
        };
        let bar_rects = self.bar_item_rects(rect, theme);
        let Some(anchor) = bar_rects.get(*first) else {
            return dropdowns;
        };
        let mut origin = Vec2::new(anchor.x, anchor.bottom());
        for level in 0..self.open.len() {
            let Some(item) = self.item(&self.open[..=level]) else { break };
            if item.children.is_empty() {
                break;
            }
            let size = Vec2::new(
                Self::dropdown_width(&item.children, theme),
                item.children.len() as f32 * theme.row_height,
            );
            let dropdown = Dropdown {
                rect: Rect::from_min_size(origin, size),
                level,
                items: &item.children,
            };
            // The next submenu opens beside the row of the item it belongs to.
            if let Some(next) = self.open.get(level + 1) {
                origin = Vec2::new(
                    dropdown.rect.right(),
                    dropdown.rect.y + *next as f32 * theme.row_height,
                );
            }
            dropdowns.push(dropdown);
        }
        dropdowns
    }

    fn row_rect(dropdown: &Dropdown<'_>, index: usize, theme: &Theme) -> Rect {
        Rect::new(
            dropdown.rect.x,
            dropdown.rect.y + index as f32 * theme.row_height,
            dropdown.rect.width,
            theme.row_height,
        )
    }

    /// What lies under `point`: a bar entry or a dropdown row.
    fn locate(&self, rect: Rect, point: Vec2, theme: &Theme) -> Option<Target> {
        for dropdown in self.dropdowns(rect, theme).iter().rev() {
            if dropdown.rect.contains(point) {
                let row = ((point.y - dropdown.rect.y) / theme.row_height) as usize;
                return Some(Target::Row {
                    level: dropdown.level,
                    index: row.min(dropdown.items.len().saturating_sub(1)),
                });
            }
        }
        self.bar_item_rects(rect, theme)
            .iter()
            .position(|r| r.contains(point))
            .map(Target::Bar)
            .or_else(|| rect.contains(point).then_some(Target::Background))
    }

    /// Opens, selects or does nothing for the item at `level`/`index`.
    fn activate(&mut self, ctx: &mut EventContext<'_>, level: usize, index: usize) {
        self.open.truncate(level + 1);
        let mut path = self.open.clone();
        path.push(index);
        let Some(item) = self.item(&path) else { return };
        if !item.enabled {
            return;
        }
        if item.has_submenu() {
            self.open = path;
            self.cursor = self.first_enabled(0, 1);
        } else {
            let label = item.label.clone();
            self.close();
            ctx.emit(UiEvent::MenuItemSelected {
                id: ctx.id,
                path,
                label,
            });
        }
    }

    /// Next enabled index in the deepest dropdown, searching from `from` in
    /// direction `dir` (1 or -1) with wrap-around.
    fn first_enabled(&self, from: usize, dir: isize) -> Option<usize> {
        let items = self.deepest_items();
        let n = items.len();
        if n == 0 {
            return None;
        }
        (0..n)
            .map(|k| (from as isize + dir * k as isize).rem_euclid(n as isize) as usize)
            .find(|i| items[*i].enabled)
    }

    fn move_cursor(&mut self, dir: isize) {
        let n = self.deepest_items().len();
        if n == 0 {
            return;
        }
        let from = match self.cursor {
            Some(c) => (c as isize + dir).rem_euclid(n as isize) as usize,
            None if dir > 0 => 0,
            None => n - 1,
        };
        self.cursor = self.first_enabled(from, dir);
    }

    fn switch_top_level(&mut self, dir: isize) {
        let n = self.items.len();
        if let (Some(current), true) = (self.open.first().copied(), n > 0) {
            self.open_menu((current as isize + dir).rem_euclid(n as isize) as usize);
        }
    }

    fn on_key(&mut self, ctx: &mut EventContext<'_>, key: Key) -> bool {
        if !self.is_open() {
            return false;
        }
        match key {
            Key::Escape => {
                if self.open.len() > 1 {
                    self.cursor = self.open.pop();
                } else {
                    self.close();
                }
            }
            Key::Down => self.move_cursor(1),
            Key::Up => self.move_cursor(-1),
            Key::Right => {
                let opens_submenu = self
                    .cursor
                    .and_then(|c| self.deepest_items().get(c))
                    .is_some_and(|item| item.enabled && item.has_submenu());
                match self.cursor {
                    Some(c) if opens_submenu => self.activate(ctx, self.open.len() - 1, c),
                    _ => self.switch_top_level(1),
                }
            }
            Key::Left => {
                if self.open.len() > 1 {
                    self.cursor = self.open.pop();
                } else {
                    self.switch_top_level(-1);
                }
            }
            Key::Enter | Key::Space => match self.cursor {
                Some(c) => self.activate(ctx, self.open.len() - 1, c),
                None => self.move_cursor(1),
            },
            _ => return false,
        }
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Bar(usize),
    Row { level: usize, index: usize },
    Background,
}

impl Widget for MainMenu {
    fn type_name(&self) -> &'static str {
        "MainMenu"
    }

    fn draw(&self, rect: Rect, _state: WidgetState, theme: &Theme, list: &mut DrawList) {
        list.rect(rect, theme.menu_bar);
        for (i, (item, r)) in self.items.iter().zip(self.bar_item_rects(rect, theme)).enumerate() {
            if self.open.first() == Some(&i) || (self.hovered_bar == Some(i) && item.enabled) {
                list.rect(r, theme.menu_highlight);
            }
            let color = if item.enabled { theme.text } else { theme.text_disabled };
            list.text_in(r, &item.label, Align::Center, color, theme);
        }
    }

    fn draw_popup(&self, rect: Rect, _state: WidgetState, theme: &Theme, list: &mut DrawList) {
        let deepest = self.open.len().saturating_sub(1);
        for dropdown in self.dropdowns(rect, theme) {
            list.rect(dropdown.rect, theme.window_background.with_alpha(0.97));
            for (i, item) in dropdown.items.iter().enumerate() {
                let row = Self::row_rect(&dropdown, i, theme);
                let expanded = self.open.get(dropdown.level + 1) == Some(&i);
                let under_cursor = dropdown.level == deepest && self.cursor == Some(i);
                if item.enabled && (expanded || under_cursor) {
                    list.rect(row, theme.menu_highlight);
                }
                let color = if item.enabled { theme.text } else { theme.text_disabled };
                list.text_in(row, &item.label, Align::Left, color, theme);
                if item.has_submenu() {
                    list.text_in(row, SUBMENU_MARKER, Align::Right, color, theme);
                }
            }
            list.outline(dropdown.rect, 1.0, theme.border);
        }
    }

    fn hit_test(&self, rect: Rect, point: Vec2, theme: &Theme) -> bool {
        rect.contains(point) || self.dropdowns(rect, theme).iter().any(|d| d.rect.contains(point))
    }

    fn on_event(&mut self, ctx: &mut EventContext<'_>, event: &InputEvent) -> bool {
        let (rect, theme) = (ctx.rect, ctx.theme);
        match event {
            InputEvent::MouseMove { position } => {
                let target = self.locate(rect, *position, theme);
                self.hovered_bar = match target {
                    Some(Target::Bar(i)) => Some(i),
                    _ => None,
                };
                match target {
                    Some(Target::Bar(i)) if self.is_open() && self.open.first() != Some(&i) => {
                        if self.items[i].enabled {
                            self.open_menu(i);
                        }
                    }
                    Some(Target::Row { level, index }) => {
                        self.open.truncate(level + 1);
                        self.cursor = Some(index);
                        let mut path = self.open.clone();
                        path.push(index);
                        if self.item(&path).is_some_and(|i| i.enabled && i.has_submenu()) {
                            self.open = path;
                            self.cursor = None;
                        }
                    }
                    _ => {}
                }
                true
            }
            InputEvent::MouseDown { position, button: MouseButton::Left } => {
                match self.locate(rect, *position, theme) {
                    Some(Target::Bar(i)) => {
                        if self.open.first() == Some(&i) {
                            self.close();
                        } else if self.items[i].enabled {
                            if self.items[i].has_submenu() {
                                self.open_menu(i);
                            } else {
                                let label = self.items[i].label.clone();
                                self.close();
                                ctx.emit(UiEvent::MenuItemSelected {
                                    id: ctx.id,
                                    path: vec![i],
                                    label,
                                });
                            }
                        }
                    }
                    Some(Target::Row { level, index }) => self.activate(ctx, level, index),
                    Some(Target::Background) => self.close(),
                    None => {}
                }
                true
            }
            InputEvent::MouseUp { .. } | InputEvent::Wheel { .. } => true,
            InputEvent::KeyDown(key) => self.on_key(ctx, *key),
            InputEvent::Text(_) | InputEvent::MouseDown { .. } => false,
        }
    }

    fn focusable(&self) -> bool {
        true
    }

    fn on_focus_changed(&mut self, focused: bool) {
        if !focused {
            self.close();
            self.hovered_bar = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{UiTree, WidgetId};

    fn menu() -> MainMenu {
        MainMenu::new(vec![
            MenuItem::new("File").with_children(vec![
                MenuItem::new("Open"),
                MenuItem::new("Recent").with_children(vec![MenuItem::new("a.obj"), MenuItem::new("b.obj")]),
                MenuItem::new("Save").disabled(),
                MenuItem::new("Quit"),
            ]),
            MenuItem::new("View").with_children(vec![MenuItem::new("AO"), MenuItem::new("Tone")]),
            MenuItem::new("Help"),
        ])
    }

    fn setup() -> (UiTree, WidgetId) {
        let mut tree = UiTree::default();
        let id = tree.add(menu(), Rect::new(0.0, 0.0, 800.0, 22.0));
        (tree, id)
    }

    fn click(tree: &mut UiTree, p: Vec2) -> Vec<UiEvent> {
        let mut events = tree.dispatch(&InputEvent::MouseDown { position: p, button: MouseButton::Left });
        events.extend(tree.dispatch(&InputEvent::MouseUp { position: p, button: MouseButton::Left }));
        events
    }

    fn bar_center(tree: &UiTree, id: WidgetId, i: usize) -> Vec2 {
        let rect = tree.absolute_rect(id).unwrap();
        tree.get::<MainMenu>(id).unwrap().bar_item_rects(rect, tree.theme())[i].center()
    }

    fn row_center(tree: &UiTree, id: WidgetId, level: usize, index: usize) -> Vec2 {
        let rect = tree.absolute_rect(id).unwrap();
        let m = tree.get::<MainMenu>(id).unwrap();
        let dropdowns = m.dropdowns(rect, tree.theme());
        MainMenu::row_rect(&dropdowns[level], index, tree.theme()).center()
    }

    #[test]
    fn test_click_opens_and_selects() {
        let (mut tree, id) = setup();
        let p = bar_center(&tree, id, 0);
        click(&mut tree, p);
        assert_eq!(tree.get::<MainMenu>(id).unwrap().open_path(), &[0]);

        let p = row_center(&tree, id, 0, 3);
        let events = click(&mut tree, p);
        assert_eq!(
            events,
            vec![UiEvent::MenuItemSelected { id, path: vec![0, 3], label: "Quit".into() }]
        );
        assert!(!tree.get::<MainMenu>(id).unwrap().is_open());
    }

    #[test]
    fn test_dropdown_is_hit_outside_bar() {
        let (mut tree, id) = setup();
        let p = bar_center(&tree, id, 0);
        click(&mut tree, p);
        let row = row_center(&tree, id, 0, 0);
        assert!(row.y > 22.0);
        assert_eq!(tree.hit_test(row), Some(id));
    }

    #[test]
    fn test_hover_switches_menus_and_opens_submenu() {
        let (mut tree, id) = setup();
        let p = bar_center(&tree, id, 0);
        click(&mut tree, p);
        tree.dispatch(&InputEvent::MouseMove { position: bar_center(&tree, id, 1) });
        assert_eq!(tree.get::<MainMenu>(id).unwrap().open_path(), &[1]);

        tree.dispatch(&InputEvent::MouseMove { position: bar_center(&tree, id, 0) });
        tree.dispatch(&InputEvent::MouseMove { position: row_center(&tree, id, 0, 1) });
        assert_eq!(tree.get::<MainMenu>(id).unwrap().open_path(), &[0, 1]);

        let p = row_center(&tree, id, 1, 1);
        let events = click(&mut tree, p);
        assert_eq!(
            events,
            vec![UiEvent::MenuItemSelected { id, path: vec![0, 1, 1], label: "b.obj".into() }]
        );
    }

    #[test]
    fn test_disabled_item_not_selected() {
        let (mut tree, id) = setup();
        let p = bar_center(&tree, id, 0);
        click(&mut tree, p);
        let p = row_center(&tree, id, 0, 2);
        let events = click(&mut tree, p);
        assert!(events.is_empty());
        assert!(tree.get::<MainMenu>(id).unwrap().is_open());
    }

    #[test]
    fn test_keyboard_navigation_skips_disabled() {
        let (mut tree, id) = setup();
        let p = bar_center(&tree, id, 0);
        click(&mut tree, p);
        assert_eq!(tree.focused(), Some(id));
        let key = |tree: &mut UiTree, k| tree.dispatch(&InputEvent::KeyDown(k));

        key(&mut tree, Key::Down);
        assert_eq!(tree.get::<MainMenu>(id).unwrap().cursor(), Some(0));
        key(&mut tree, Key::Down);
        key(&mut tree, Key::Down);
        // "Save" is disabled, so the cursor lands on "Quit".
        assert_eq!(tree.get::<MainMenu>(id).unwrap().cursor(), Some(3));

        key(&mut tree, Key::Up);
        key(&mut tree, Key::Right);
        assert_eq!(tree.get::<MainMenu>(id).unwrap().open_path(), &[0, 1]);
        key(&mut tree, Key::Left);
        assert_eq!(tree.get::<MainMenu>(id).unwrap().open_path(), &[0]);
        assert_eq!(tree.get::<MainMenu>(id).unwrap().cursor(), Some(1));

        key(&mut tree, Key::Right);
        let events = key(&mut tree, Key::Enter);
        assert_eq!(
            events,
            vec![UiEvent::MenuItemSelected { id, path: vec![0, 1, 0], label: "a.obj".into() }]
        );
    }

    #[test]
    fn test_escape_and_focus_loss_close() {
        let (mut tree, id) = setup();
        let p = bar_center(&tree, id, 1);
        click(&mut tree, p);
        tree.dispatch(&InputEvent::KeyDown(Key::Escape));
        assert!(!tree.get::<MainMenu>(id).unwrap().is_open());

        let p = bar_center(&tree, id, 1);
        click(&mut tree, p);
        click(&mut tree, Vec2::new(400.0, 400.0));
        assert!(!tree.get::<MainMenu>(id).unwrap().is_open());
    }

    #[test]
    fn test_leaf_in_bar_selects_directly() {
        let (mut tree, id) = setup();
        let p = bar_center(&tree, id, 2);
        let events = click(&mut tree, p);
        assert_eq!(
            events,
            vec![UiEvent::MenuItemSelected { id, path: vec![2], label: "Help".into() }]
        );
    }

    #[test]
    fn test_item_lookup() {
        let m = menu();
        assert_eq!(m.item(&[0, 1, 1]).map(|i| i.label.as_str()), Some("b.obj"));
        assert!(m.item(&[0, 9]).is_none());
        assert!(m.item(&[]).is_none());
    }
}

//! Retained widget tree: ownership, layout, hit testing and event routing.

use std::any::Any;
use std::collections::HashMap;

use glam::Vec2;

use crate::draw::{DrawList, Theme};
use crate::error::{UiError, UiResult};
use crate::geometry::Rect;
use crate::input::{InputEvent, Key, UiEvent};
use crate::widget::{EventContext, Requests, Widget, WidgetState};

/// Handle to a widget in a [`UiTree`]. Ids are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WidgetId(u64);

struct Node {
    widget: Box<dyn Widget>,
    /// Relative to the parent's content rect, or to the window for roots.
    rect: Rect,
    parent: Option<WidgetId>,
    children: Vec<WidgetId>,
    visible: bool,
    enabled: bool,
    /// Roots with a higher layer always stay above lower ones.
    layer: i32,
}

/// Owns every widget and routes input to them.
///
/// Roots are kept in z-order, last on top. Within a parent, later children
/// draw above earlier ones.
pub struct UiTree {
    nodes: HashMap<WidgetId, Node>,
    roots: Vec<WidgetId>,
    next_id: u64,
    focus: Option<WidgetId>,
    capture: Option<WidgetId>,
    hovered: Option<WidgetId>,
    theme: Theme,
}

impl Default for UiTree {
    fn default() -> Self {
        Self::new(Theme::default())
    }
}

impl UiTree {
    #[must_use]
    pub fn new(theme: Theme) -> Self {
        Self {
            nodes: HashMap::new(),
            roots: Vec::new(),
            next_id: 1,
            focus: None,
            capture: None,
            hovered: None,
            theme,
        }
    }

    #[must_use]
    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn theme_mut(&mut self) -> &mut Theme {
        &mut self.theme
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: WidgetId) -> bool {
        self.nodes.contains_key(&id)
    }

    fn insert(&mut self, widget: Box<dyn Widget>, rect: Rect, parent: Option<WidgetId>) -> WidgetId {
        let id = WidgetId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(
            id,
            Node {
                widget,
                rect,
                parent,
                children: Vec::new(),
                visible: true,
                enabled: true,
                layer: 0,
            },
        );
        id
    }

    /// Adds a top-level widget above all others in its layer.
    pub fn add(&mut self, widget: impl Widget, rect: Rect) -> WidgetId {
        let id = self.insert(Box::new(widget), rect, None);
        self.roots.push(id);
        self.sort_roots();
        id
    }

    /// Adds a widget inside `parent`, positioned relative to its content rect.
    pub fn add_child(&mut self, parent: WidgetId, widget: impl Widget, rect: Rect) -> UiResult<WidgetId> {
        if !self.contains(parent) {
            return Err(UiError::NotFound(parent));
        }
        let id = self.insert(Box::new(widget), rect, Some(parent));
        self.node_mut(parent)?.children.push(id);
        Ok(id)
    }

    /// Removes a widget and all of its descendants.
    pub fn remove(&mut self, id: WidgetId) -> UiResult<()> {
        let parent = self.node(id)?.parent;
        match parent {
            Some(parent) => self.node_mut(parent)?.children.retain(|c| *c != id),
            None => self.roots.retain(|r| *r != id),
        }
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.remove(&current) {
                stack.extend(node.children);
            }
        }
        for slot in [&mut self.focus, &mut self.capture, &mut self.hovered] {
            if slot.is_some_and(|s| !self.nodes.contains_key(&s)) {
                *slot = None;
            }
        }
        Ok(())
    }

    fn node(&self, id: WidgetId) -> UiResult<&Node> {
        self.nodes.get(&id).ok_or(UiError::NotFound(id))
    }

    fn node_mut(&mut self, id: WidgetId) -> UiResult<&mut Node> {
        self.nodes.get_mut(&id).ok_or(UiError::NotFound(id))
    }

    /// Borrows a widget as its concrete type.
    pub fn get<T: Widget>(&self, id: WidgetId) -> UiResult<&T> {
        let node = self.node(id)?;
        let any: &dyn Any = node.widget.as_ref();
        any.downcast_ref::<T>().ok_or(UiError::WrongType {
            id,
            expected: std::any::type_name::<T>(),
        })
    }

    pub fn get_mut<T: Widget>(&mut self, id: WidgetId) -> UiResult<&mut T> {
        let node = self.node_mut(id)?;
        let any: &mut dyn Any = node.widget.as_mut();
        any.downcast_mut::<T>().ok_or(UiError::WrongType {
            id,
            expected: std::any::type_name::<T>(),
        })
    }

    /// Type name of the widget behind `id`.
    pub fn type_name(&self, id: WidgetId) -> UiResult<&'static str> {
        Ok(self.node(id)?.widget.type_name())
    }

    pub fn parent(&self, id: WidgetId) -> UiResult<Option<WidgetId>> {
        Ok(self.node(id)?.parent)
    }

    pub fn children(&self, id: WidgetId) -> UiResult<&[WidgetId]> {
        Ok(&self.node(id)?.children)
    }

    /// Top-level widgets, bottom to top.
    #[must_use]
    pub fn roots(&self) -> &[WidgetId] {
        &self.roots
    }

    /// Relative rect as given to [`add`](Self::add) or [`set_rect`](Self::set_rect).
    pub fn rect(&self, id: WidgetId) -> UiResult<Rect> {
        Ok(self.node(id)?.rect)
    }

    pub fn set_rect(&mut self, id: WidgetId, rect: Rect) -> UiResult<()> {
        self.node_mut(id)?.rect = rect;
        Ok(())
    }

    /// Rect in window coordinates, accumulating parent content offsets and scrolling.
    pub fn absolute_rect(&self, id: WidgetId) -> UiResult<Rect> {
        let node = self.node(id)?;
        let Some(parent) = node.parent else {
            return Ok(node.rect);
        };
        let parent_node = self.node(parent)?;
        let content = parent_node
            .widget
            .content_rect(self.absolute_rect(parent)?, &self.theme);
        Ok(node.rect.translate(content.min() - parent_node.widget.scroll_offset()))
    }

    pub fn set_visible(&mut self, id: WidgetId, visible: bool) -> UiResult<()> {
        self.node_mut(id)?.visible = visible;
        if !visible {
            self.release_subtree(id);
        }
        Ok(())
    }

    pub fn set_enabled(&mut self, id: WidgetId, enabled: bool) -> UiResult<()> {
        self.node_mut(id)?.enabled = enabled;
        if !enabled {
            self.release_subtree(id);
        }
        Ok(())
    }

    /// Whether the widget and all of its ancestors are visible.
    pub fn is_visible(&self, id: WidgetId) -> UiResult<bool> {
        self.all_ancestors(id, |n| n.visible)
    }

    /// Whether the widget and all of its ancestors are enabled.
    pub fn is_enabled(&self, id: WidgetId) -> UiResult<bool> {
        self.all_ancestors(id, |n| n.enabled)
    }

    fn all_ancestors(&self, id: WidgetId, test: impl Fn(&Node) -> bool) -> UiResult<bool> {
        let mut current = Some(id);
        while let Some(c) = current {
            let node = self.node(c)?;
            if !test(node) {
                return Ok(false);
            }
            current = node.parent;
        }
        Ok(true)
    }

    fn is_ancestor_or_self(&self, ancestor: WidgetId, mut id: WidgetId) -> bool {
        loop {
            if id == ancestor {
                return true;
            }
            match self.nodes.get(&id).and_then(|n| n.parent) {
                Some(parent) => id = parent,
                None => return false,
            }
        }
    }

    /// Drops focus, capture and hover held inside a subtree that became inert.
    fn release_subtree(&mut self, id: WidgetId) {
        if self.focus.is_some_and(|f| self.is_ancestor_or_self(id, f)) {
            self.set_focus(None);
        }
        if self.capture.is_some_and(|c| self.is_ancestor_or_self(id, c)) {
            self.capture = None;
        }
        if self.hovered.is_some_and(|h| self.is_ancestor_or_self(id, h)) {
            self.hovered = None;
        }
    }

    fn root_of(&self, mut id: WidgetId) -> WidgetId {
        while let Some(parent) = self.nodes.get(&id).and_then(|n| n.parent) {
            id = parent;
        }
        id
    }

    /// Sets the z-layer of a top-level widget.
    pub fn set_layer(&mut self, id: WidgetId, layer: i32) -> UiResult<()> {
        self.node_mut(id)?.layer = layer;
        self.sort_roots();
        Ok(())
    }

    fn sort_roots(&mut self) {
        let nodes = &self.nodes;
        self.roots
            .sort_by_key(|r| nodes.get(r).map_or(0, |n| n.layer));
    }

    /// Raises a widget above its siblings. Top-level widgets stay within their layer.
    pub fn bring_to_front(&mut self, id: WidgetId) -> UiResult<()> {
        match self.node(id)?.parent {
            Some(parent) => {
                let children = &mut self.node_mut(parent)?.children;
                children.retain(|c| *c != id);
                children.push(id);
            }
            None => {
                self.roots.retain(|r| *r != id);
                self.roots.push(id);
                self.sort_roots();
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn focused(&self) -> Option<WidgetId> {
        self.focus
    }

    #[must_use]
    pub fn captured(&self) -> Option<WidgetId> {
        self.capture
    }

    #[must_use]
    pub fn hovered(&self) -> Option<WidgetId> {
        self.hovered
    }

    /// Moves keyboard focus, notifying the widgets that lose and gain it.
    pub fn set_focus(&mut self, id: Option<WidgetId>) {
        let id = id.filter(|i| self.contains(*i));
        if id == self.focus {
            return;
        }
        if let Some(old) = self.focus.take() {
            if let Some(node) = self.nodes.get_mut(&old) {
                node.widget.on_focus_changed(false);
            }
        }
        self.focus = id;
        if let Some(new) = id {
            if let Some(node) = self.nodes.get_mut(&new) {
                node.widget.on_focus_changed(true);
            }
        }
    }

    /// Whether pointer input at `position` belongs to the UI.
    #[must_use]
    pub fn wants_pointer(&self, position: Vec2) -> bool {
        self.capture.is_some() || self.hit_test(position).is_some()
    }

    /// Whether keyboard input belongs to the UI.
    #[must_use]
    pub fn wants_keyboard(&self) -> bool {
        self.focus.is_some()
    }

    fn state(&self, id: WidgetId) -> WidgetState {
        WidgetState {
            hovered: self.hovered == Some(id),
            focused: self.focus == Some(id),
            focus_within: self.focus.is_some_and(|f| self.is_ancestor_or_self(id, f)),
            captured: self.capture == Some(id),
            enabled: self.is_enabled(id).unwrap_or(false),
        }
    }

    /// Topmost visible, enabled widget under `point`.
    #[must_use]
    pub fn hit_test(&self, point: Vec2) -> Option<WidgetId> {
        self.roots
            .iter()
            .rev()
            .find_map(|root| self.hit_node(*root, point, None))
    }

    fn hit_node(&self, id: WidgetId, point: Vec2, clip: Option<Rect>) -> Option<WidgetId> {
        let node = self.nodes.get(&id)?;
        if !node.visible || !node.enabled {
            return None;
        }
        let rect = self.absolute_rect(id).ok()?;
        let child_clip = if node.widget.clips_children() {
            let content = node.widget.content_rect(rect, &self.theme);
            Some(clip.map_or(content, |c| c.intersect(&content).unwrap_or(Rect::ZERO)))
        } else {
            clip
        };
        if child_clip.is_none_or(|c| c.contains(point)) {
            if let Some(hit) = node
                .children
                .iter()
                .rev()
                .find_map(|child| self.hit_node(*child, point, child_clip))
            {
                return Some(hit);
            }
        }
        let inside_clip = clip.is_none_or(|c| c.contains(point));
        (inside_clip && node.widget.hit_test(rect, point, &self.theme)).then_some(id)
    }

    /// Tells scrolling widgets how large their content is.
    fn layout(&mut self) {
        let parents: Vec<WidgetId> = self
            .nodes
            .iter()
            .filter(|(_, n)| !n.children.is_empty())
            .map(|(id, _)| *id)
            .collect();
        for id in parents {
            let Ok(rect) = self.absolute_rect(id) else { continue };
            let Some(node) = self.nodes.get(&id) else { continue };
            let viewport = node.widget.content_rect(rect, &self.theme);
            let extent = node
                .children
                .iter()
                .filter_map(|c| self.nodes.get(c))
                .filter(|c| c.visible)
                .fold(Vec2::ZERO, |acc, c| acc.max(c.rect.max()));
            if let Some(node) = self.nodes.get_mut(&id) {
                node.widget.update_content_extent(extent, viewport);
            }
        }
    }

    /// Routes one input event and returns what the widgets reported.
    ///
    /// Pointer events go to the capturing widget if any, otherwise to the
    /// topmost widget under the pointer and bubble up through its ancestors
    /// until one consumes them. Keys go to the focused widget and bubble the
    /// same way. A mouse press raises the clicked top-level widget and moves
    /// focus to the nearest focusable widget under the pointer.
    pub fn dispatch(&mut self, event: &InputEvent) -> Vec<UiEvent> {
        self.layout();
        let mut events = Vec::new();

        if let Some(position) = event.position() {
            let hit = self.hit_test(position);
            if matches!(event, InputEvent::MouseMove { .. }) {
                self.hovered = hit;
            }
            if let Some(captured) = self.capture {
                self.deliver(captured, event, &mut events);
                return events;
            }
            if matches!(event, InputEvent::MouseDown { .. }) {
                match hit {
                    Some(id) => {
                        let root = self.root_of(id);
                        let _ = self.bring_to_front(root);
                        let target = self.focus_target(id);
                        self.set_focus(target);
                    }
                    None => self.set_focus(None),
                }
            }
            if let Some(id) = hit {
                self.bubble(id, event, &mut events);
            }
        } else {
            let handled = match self.focus {
                Some(focus) => self.bubble(focus, event, &mut events),
                None => false,
            };
            if !handled && *event == InputEvent::KeyDown(Key::Tab) {
                self.focus_next();
            }
        }
        events
    }

    fn focus_target(&self, mut id: WidgetId) -> Option<WidgetId> {
        loop {
            let node = self.nodes.get(&id)?;
            if node.widget.focusable() {
                return Some(id);
            }
            id = node.parent?;
        }
    }

    fn bubble(&mut self, id: WidgetId, event: &InputEvent, events: &mut Vec<UiEvent>) -> bool {
        let mut current = Some(id);
        while let Some(c) = current {
            if self.deliver(c, event, events) {
                return true;
            }
            current = self.nodes.get(&c).and_then(|n| n.parent);
        }
        false
    }

    fn deliver(&mut self, id: WidgetId, event: &InputEvent, events: &mut Vec<UiEvent>) -> bool {
        if !self.is_enabled(id).unwrap_or(false) || !self.is_visible(id).unwrap_or(false) {
            return false;
        }
        let Ok(rect) = self.absolute_rect(id) else {
            return false;
        };
        let state = self.state(id);
        let Some(node) = self.nodes.get_mut(&id) else {
            return false;
        };
        let mut ctx = EventContext::new(id, rect, state, &self.theme, events);
        let consumed = node.widget.on_event(&mut ctx, event);
        let requests = std::mem::take(&mut ctx.requests);
        self.apply(id, requests);
        consumed
    }

    fn apply(&mut self, id: WidgetId, requests: Requests) {
        match requests.capture {
            Some(true) => self.capture = Some(id),
            Some(false) if self.capture == Some(id) => self.capture = None,
            _ => {}
        }
        if requests.focus {
            self.set_focus(Some(id));
        }
        if requests.move_by != Vec2::ZERO {
            if let Some(node) = self.nodes.get_mut(&id) {
                node.rect = node.rect.translate(requests.move_by);
            }
        }
        if requests.close {
            let _ = self.set_visible(id, false);
        }
    }

    /// Widgets that can take focus, in tree order.
    fn focus_chain(&self) -> Vec<WidgetId> {
        let mut chain = Vec::new();
        let mut stack: Vec<WidgetId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get(&id) else { continue };
            if !node.visible || !node.enabled {
                continue;
            }
            if node.widget.focusable() {
                chain.push(id);
            }
            stack.extend(node.children.iter().rev().copied());
        }
        chain
    }

    /// Moves focus to the next focusable widget, wrapping around.
    pub fn focus_next(&mut self) {
        let chain = self.focus_chain();
        if chain.is_empty() {
            return;
        }
        let next = match self.focus.and_then(|f| chain.iter().position(|c| *c == f)) {
            Some(i) => chain[(i + 1) % chain.len()],
            None => chain[0],
        };
        self.set_focus(Some(next));
    }

    /// Builds draw commands for every visible widget, popups last.
    pub fn draw(&mut self) -> DrawList {
        self.layout();
        let mut list = DrawList::new();
        for root in &self.roots {
            self.draw_node(*root, &mut list);
        }
        for root in &self.roots {
            self.draw_popups(*root, &mut list);
        }
        list
    }

    fn draw_node(&self, id: WidgetId, list: &mut DrawList) {
        let Some(node) = self.nodes.get(&id) else { return };
        if !node.visible {
            return;
        }
        let Ok(rect) = self.absolute_rect(id) else { return };
        node.widget.draw(rect, self.state(id), &self.theme, list);
        if node.children.is_empty() {
            return;
        }
        let clips = node.widget.clips_children();
        if clips {
            list.push_clip(node.widget.content_rect(rect, &self.theme));
        }
        for child in &node.children {
            self.draw_node(*child, list);
        }
        if clips {
            list.pop_clip();
        }
    }

    fn draw_popups(&self, id: WidgetId, list: &mut DrawList) {
        let Some(node) = self.nodes.get(&id) else { return };
        if !node.visible {
            return;
        }
        if let Ok(rect) = self.absolute_rect(id) {
            node.widget.draw_popup(rect, self.state(id), &self.theme, list);
        }
        for child in &node.children {
            self.draw_popups(*child, list);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::MouseButton;

    /// Consumes clicks and counts everything it sees.
    #[derive(Default)]
    struct Recorder {
        consume: bool,
        focusable: bool,
        seen: usize,
        focus_changes: Vec<bool>,
        drag: bool,
    }

    impl Widget for Recorder {
        fn type_name(&self) -> &'static str {
            "Recorder"
        }

        fn draw(&self, rect: Rect, _: WidgetState, theme: &Theme, list: &mut DrawList) {
            list.rect(rect, theme.button);
        }

        fn on_event(&mut self, ctx: &mut EventContext<'_>, event: &InputEvent) -> bool {
            self.seen += 1;
            if self.drag {
                match event {
                    InputEvent::MouseDown { .. } => ctx.capture_mouse(),
                    InputEvent::MouseUp { .. } => ctx.release_mouse(),
                    InputEvent::MouseMove { .. } => ctx.move_by(Vec2::new(1.0, 0.0)),
                    _ => {}
                }
            }
            if let InputEvent::MouseDown { .. } = event {
                ctx.emit(UiEvent::Clicked(ctx.id));
            }
            self.consume
        }

        fn focusable(&self) -> bool {
            self.focusable
        }

        fn on_focus_changed(&mut self, focused: bool) {
            self.focus_changes.push(focused);
        }
    }

    fn recorder(consume: bool) -> Recorder {
        Recorder { consume, ..Recorder::default() }
    }

    fn down(x: f32, y: f32) -> InputEvent {
        InputEvent::MouseDown {
            position: Vec2::new(x, y),
            button: MouseButton::Left,
        }
    }

    #[test]
    fn test_add_get_remove() {
        let mut tree = UiTree::default();
        let parent = tree.add(recorder(true), Rect::new(0.0, 0.0, 100.0, 100.0));
        let child = tree.add_child(parent, recorder(true), Rect::new(10.0, 10.0, 10.0, 10.0)).unwrap();
        let grandchild = tree.add_child(child, recorder(true), Rect::new(1.0, 1.0, 2.0, 2.0)).unwrap();
        assert_eq!(tree.len(), 3);
        assert!(tree.get::<Recorder>(child).is_ok());

        tree.remove(child).unwrap();
        assert_eq!(tree.len(), 1);
        assert!(!tree.contains(grandchild));
        assert_eq!(tree.children(parent).unwrap(), &[] as &[WidgetId]);
        assert_eq!(tree.remove(child), Err(UiError::NotFound(child)));
    }

    #[test]
    fn test_get_wrong_type() {
        struct Other;
        impl Widget for Other {
            fn type_name(&self) -> &'static str {
                "Other"
            }
            fn draw(&self, _: Rect, _: WidgetState, _: &Theme, _: &mut DrawList) {}
        }
        let mut tree = UiTree::default();
        let id = tree.add(Other, Rect::ZERO);
        assert!(matches!(tree.get::<Recorder>(id), Err(UiError::WrongType { .. })));
    }

    #[test]
    fn test_absolute_layout() {
        let mut tree = UiTree::default();
        let a = tree.add(recorder(true), Rect::new(100.0, 50.0, 200.0, 200.0));
        let b = tree.add_child(a, recorder(true), Rect::new(10.0, 20.0, 50.0, 50.0)).unwrap();
        let c = tree.add_child(b, recorder(true), Rect::new(5.0, 5.0, 5.0, 5.0)).unwrap();
        assert_eq!(tree.absolute_rect(c).unwrap(), Rect::new(115.0, 75.0, 5.0, 5.0));
    }

    #[test]
    fn test_hit_test_topmost_visible_enabled() {
        let mut tree = UiTree::default();
        let bottom = tree.add(recorder(true), Rect::new(0.0, 0.0, 100.0, 100.0));
        let top = tree.add(recorder(true), Rect::new(50.0, 50.0, 100.0, 100.0));
        let p = Vec2::new(60.0, 60.0);
        assert_eq!(tree.hit_test(p), Some(top));

        tree.set_visible(top, false).unwrap();
        assert_eq!(tree.hit_test(p), Some(bottom));
        tree.set_visible(top, true).unwrap();
        tree.set_enabled(top, false).unwrap();
        assert_eq!(tree.hit_test(p), Some(bottom));
        assert_eq!(tree.hit_test(Vec2::new(300.0, 300.0)), None);
    }

    #[test]
    fn test_events_bubble_to_parent() {
        let mut tree = UiTree::default();
        let parent = tree.add(recorder(true), Rect::new(0.0, 0.0, 100.0, 100.0));
        let child = tree.add_child(parent, recorder(false), Rect::new(0.0, 0.0, 10.0, 10.0)).unwrap();
        let events = tree.dispatch(&down(5.0, 5.0));
        assert_eq!(events, vec![UiEvent::Clicked(child), UiEvent::Clicked(parent)]);
        assert_eq!(tree.get::<Recorder>(parent).unwrap().seen, 1);
    }

    #[test]
    fn test_mouse_down_raises_root_and_focuses() {
        let mut tree = UiTree::default();
        let a = tree.add(Recorder { consume: true, focusable: true, ..Recorder::default() }, Rect::new(0.0, 0.0, 100.0, 100.0));
        let b = tree.add(recorder(true), Rect::new(200.0, 0.0, 100.0, 100.0));
        assert_eq!(tree.roots(), &[a, b]);
        tree.dispatch(&down(10.0, 10.0));
        assert_eq!(tree.roots(), &[b, a]);
        assert_eq!(tree.focused(), Some(a));
        tree.dispatch(&down(500.0, 500.0));
        assert_eq!(tree.focused(), None);
        assert_eq!(tree.get::<Recorder>(a).unwrap().focus_changes, vec![true, false]);
    }

    #[test]
    fn test_layers_keep_order() {
        let mut tree = UiTree::default();
        let menu = tree.add(recorder(true), Rect::new(0.0, 0.0, 100.0, 20.0));
        tree.set_layer(menu, 1).unwrap();
        let window = tree.add(recorder(true), Rect::new(0.0, 0.0, 100.0, 100.0));
        assert_eq!(tree.roots(), &[window, menu]);
        tree.bring_to_front(window).unwrap();
        assert_eq!(tree.roots(), &[window, menu]);
        assert_eq!(tree.hit_test(Vec2::new(5.0, 5.0)), Some(menu));
    }

    #[test]
    fn test_capture_routes_pointer_and_moves() {
        let mut tree = UiTree::default();
        let dragged = tree.add(Recorder { consume: true, drag: true, ..Recorder::default() }, Rect::new(0.0, 0.0, 10.0, 10.0));
        let other = tree.add(recorder(true), Rect::new(100.0, 0.0, 10.0, 10.0));
        tree.dispatch(&down(5.0, 5.0));
        assert_eq!(tree.captured(), Some(dragged));
        tree.dispatch(&InputEvent::MouseMove { position: Vec2::new(105.0, 5.0) });
        assert_eq!(tree.get::<Recorder>(other).unwrap().seen, 0);
        assert_eq!(tree.rect(dragged).unwrap().x, 1.0);
        tree.dispatch(&InputEvent::MouseUp {
            position: Vec2::new(105.0, 5.0),
            button: MouseButton::Left,
        });
        assert_eq!(tree.captured(), None);
    }

    #[test]
    fn test_tab_cycles_focus() {
        let mut tree = UiTree::default();
        let focusable = || Recorder { focusable: true, ..Recorder::default() };
        let a = tree.add(focusable(), Rect::new(0.0, 0.0, 10.0, 10.0));
        let _plain = tree.add(recorder(false), Rect::new(0.0, 0.0, 10.0, 10.0));
        let b = tree.add_child(a, focusable(), Rect::new(0.0, 0.0, 5.0, 5.0)).unwrap();
        tree.dispatch(&InputEvent::KeyDown(Key::Tab));
        assert_eq!(tree.focused(), Some(a));
        tree.dispatch(&InputEvent::KeyDown(Key::Tab));
        assert_eq!(tree.focused(), Some(b));
        tree.dispatch(&InputEvent::KeyDown(Key::Tab));
        assert_eq!(tree.focused(), Some(a));
    }

    #[test]
    fn test_hiding_releases_focus() {
        let mut tree = UiTree::default();
        let a = tree.add(Recorder { focusable: true, ..Recorder::default() }, Rect::new(0.0, 0.0, 10.0, 10.0));
        tree.set_focus(Some(a));
        tree.set_visible(a, false).unwrap();
        assert_eq!(tree.focused(), None);
        assert!(!tree.is_visible(a).unwrap());
    }

    #[test]
    fn test_draw_skips_hidden_subtrees() {
        let mut tree = UiTree::default();
        let a = tree.add(recorder(true), Rect::new(0.0, 0.0, 10.0, 10.0));
        tree.add_child(a, recorder(true), Rect::new(0.0, 0.0, 5.0, 5.0)).unwrap();
        assert_eq!(tree.draw().len(), 2);
        tree.set_visible(a, false).unwrap();
        assert!(tree.draw().is_empty());
    }
}

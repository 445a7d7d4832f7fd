//! Editor windows: property panels bound to engine options and the main menu.

use glam::Vec2;
use lumina_core::ambient_occlusion::{MAX_AO_DIRECTIONS, MAX_AO_RAYS, MAX_AO_STEPS};
use lumina_core::bilateral::MAX_BLUR_RADIUS;
use lumina_core::{AmbientOcclusionConfig, AoTechnique, EngineOptions, ToneMappingConfig};

use crate::draw::DrawList;
use crate::error::{UiError, UiResult};
use crate::geometry::Rect;
use crate::input::{InputEvent, UiEvent};
use crate::tree::{UiTree, WidgetId};
use crate::widgets::{CheckBox, Label, MainMenu, MenuItem, ScrollableContainer, Slider, Window};

/// Property names used by the built-in windows.
pub mod names {
    pub const AO_ENABLED: &str = "Enabled";
    pub const RAY_MARCHING: &str = "Ray marching";
    pub const RADIUS: &str = "Radius";
    pub const STEPS: &str = "Steps";
    pub const DIRECTIONS: &str = "Directions";
    pub const RAYS: &str = "Rays";
    pub const CONTRAST: &str = "Contrast";
    pub const ATTENUATION: &str = "Attenuation";
    pub const ANGLE_BIAS: &str = "Angle bias";
    pub const BLUR: &str = "Blur";
    pub const BLUR_RADIUS: &str = "Blur radius";
    pub const SHARPNESS: &str = "Sharpness";
    pub const EXPOSURE: &str = "Exposure";
    pub const WHITE_LEVEL: &str = "White level";
    pub const GAMMA: &str = "Gamma";
}

const WINDOW_WIDTH: f32 = 340.0;
const MAX_WINDOW_HEIGHT: f32 = 380.0;
const ROW_SPACING: f32 = 4.0;
/// Share of a row taken by the property name.
const LABEL_FRACTION: f32 = 0.42;

/// One editable value in a [`PropertyWindow`].
#[derive(Debug, Clone, PartialEq)]
pub enum Property {
    FloatSlider {
        name: String,
        min: f32,
        max: f32,
        step: f32,
        value: f32,
    },
    Toggle {
        name: String,
        value: bool,
    },
}

impl Property {
    #[must_use]
    pub fn slider(name: impl Into<String>, min: f32, max: f32, step: f32, value: f32) -> Self {
        Self::FloatSlider {
            name: name.into(),
            min,
            max,
            step,
            value,
        }
    }

    #[must_use]
    pub fn toggle(name: impl Into<String>, value: bool) -> Self {
        Self::Toggle {
            name: name.into(),
            value,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::FloatSlider { name, .. } | Self::Toggle { name, .. } => name,
        }
    }
}

struct PropertyRow {
    property: Property,
    /// Slider or check box holding the value.
    control: WidgetId,
    /// Name label, for sliders.
    label: Option<WidgetId>,
}

/// A window listing properties as labelled sliders and check boxes.
///
/// Feed it the tree's events with [`handle`](Self::handle); it keeps its own
/// copy of every value, which the `apply_*` methods write into option structs.
pub struct PropertyWindow {
    window: WidgetId,
    rows: Vec<PropertyRow>,
}

impl PropertyWindow {
    /// Builds the window and its rows in `tree`. The window grows with the row
    /// count up to a limit, beyond which the rows scroll.
    pub fn new(tree: &mut UiTree, title: &str, position: Vec2, properties: Vec<Property>) -> UiResult<Self> {
        let theme = tree.theme().clone();
        let row_pitch = theme.row_height + ROW_SPACING;
        let content_height = properties.len() as f32 * row_pitch;
        let height = (theme.title_height + content_height + theme.padding * 2.0).min(MAX_WINDOW_HEIGHT);
        let window = tree.add(
            Window::new(title),
            Rect::from_min_size(position, Vec2::new(WINDOW_WIDTH, height)),
        );
        let inner = Vec2::new(
            WINDOW_WIDTH - theme.padding * 2.0,
            height - theme.title_height - theme.padding * 2.0,
        );
        let list = tree.add_child(window, ScrollableContainer::new(), Rect::from_min_size(Vec2::ZERO, inner))?;
        let row_width = inner.x - theme.scroll_bar_width;
        let label_width = (row_width * LABEL_FRACTION).round();

        let mut rows = Vec::with_capacity(properties.len());
        for (i, property) in properties.into_iter().enumerate() {
            let y = i as f32 * row_pitch;
            let (control, label) = match &property {
                Property::FloatSlider {
                    name,
                    min,
                    max,
                    step,
                    value,
                } => {
                    let label = tree.add_child(list, Label::new(name.clone()), Rect::new(0.0, y, label_width, theme.row_height))?;
                    let control = tree.add_child(
                        list,
                        Slider::new(*min, *max, *step, *value),
                        Rect::new(label_width, y, row_width - label_width, theme.row_height),
                    )?;
                    (control, Some(label))
                }
                Property::Toggle { name, value } => {
                    let control = tree.add_child(
                        list,
                        CheckBox::new(name.clone(), *value),
                        Rect::new(0.0, y, row_width, theme.row_height),
                    )?;
                    (control, None)
                }
            };
            rows.push(PropertyRow {
                property,
                control,
                label,
            });
        }
        log::debug!("Created property window '{title}' with {} rows", rows.len());
        Ok(Self { window, rows })
    }

    /// Window with the ambient occlusion settings of the active technique.
    pub fn ambient_occlusion(tree: &mut UiTree, position: Vec2, config: &AmbientOcclusionConfig) -> UiResult<Self> {
        use names::*;
        let hbao = &config.horizon_based;
        let rm = &config.ray_marching;
        let ray_marching = config.technique == AoTechnique::RayMarching;
        let (radius, steps, directions, contrast, attenuation) = if ray_marching {
            (rm.radius, rm.number_steps, rm.number_directions, rm.contrast, rm.line_attenuation)
        } else {
            (hbao.radius, hbao.number_steps, hbao.number_directions, hbao.contrast, hbao.line_attenuation)
        };
        let mut window = Self::new(
            tree,
            "Ambient Occlusion",
            position,
            vec![
                Property::toggle(AO_ENABLED, config.enabled),
                Property::toggle(RAY_MARCHING, ray_marching),
                Property::slider(RADIUS, 0.05, 5.0, 0.05, radius),
                Property::slider(STEPS, 1.0, MAX_AO_STEPS as f32, 1.0, steps as f32),
                Property::slider(DIRECTIONS, 1.0, MAX_AO_DIRECTIONS as f32, 1.0, directions as f32),
                Property::slider(RAYS, 1.0, MAX_AO_RAYS as f32, 1.0, rm.number_rays as f32),
                Property::slider(CONTRAST, 0.0, 4.0, 0.05, contrast),
                Property::slider(ATTENUATION, 0.0, 2.0, 0.05, attenuation),
                Property::slider(ANGLE_BIAS, 0.0, 60.0, 1.0, hbao.angle_bias_degrees),
                Property::toggle(BLUR, config.blur.enabled),
                Property::slider(BLUR_RADIUS, 1.0, MAX_BLUR_RADIUS as f32, 1.0, config.blur.radius as f32),
                Property::slider(SHARPNESS, 0.0, 64.0, 0.5, config.blur.sharpness),
            ],
        )?;
        window.update_technique_rows(tree, config.technique)?;
        Ok(window)
    }

    /// Window with the tone mapping settings.
    pub fn tone_mapping(tree: &mut UiTree, position: Vec2, config: &ToneMappingConfig) -> UiResult<Self> {
        use names::*;
        Self::new(
            tree,
            "Tone Mapping",
            position,
            vec![
                Property::slider(EXPOSURE, 0.05, 8.0, 0.05, config.exposure),
                Property::slider(WHITE_LEVEL, 0.1, 8.0, 0.05, config.white_level),
                Property::slider(GAMMA, 1.0, 3.0, 0.05, config.gamma),
            ],
        )
    }

    /// The window widget, for showing, hiding and raising it.
    #[must_use]
    pub fn window_id(&self) -> WidgetId {
        self.window
    }

    #[must_use]
    pub fn properties(&self) -> impl Iterator<Item = &Property> {
        self.rows.iter().map(|r| &r.property)
    }

    fn row(&self, name: &str) -> Option<&PropertyRow> {
        self.rows.iter().find(|r| r.property.name() == name)
    }

    fn row_mut(&mut self, name: &str) -> Option<&mut PropertyRow> {
        self.rows.iter_mut().find(|r| r.property.name() == name)
    }

    /// Control widget of a property.
    #[must_use]
    pub fn control(&self, name: &str) -> Option<WidgetId> {
        self.row(name).map(|r| r.control)
    }

    /// Current value of a slider property.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<f32> {
        match self.row(name)?.property {
            Property::FloatSlider { value, .. } => Some(value),
            Property::Toggle { .. } => None,
        }
    }

    /// Current state of a toggle property.
    #[must_use]
    pub fn toggle(&self, name: &str) -> Option<bool> {
        match self.row(name)?.property {
            Property::Toggle { value, .. } => Some(value),
            Property::FloatSlider { .. } => None,
        }
    }

    /// Records a change reported by one of this window's controls.
    /// Returns false for events from other widgets.
    pub fn handle(&mut self, event: &UiEvent) -> bool {
        let source = event.source();
        let Some(row) = self.rows.iter_mut().find(|r| r.control == source) else {
            return false;
        };
        match (event, &mut row.property) {
            (UiEvent::ValueChanged { value, .. }, Property::FloatSlider { value: stored, .. }) => {
                *stored = *value;
                true
            }
            (UiEvent::Toggled { checked, .. }, Property::Toggle { value: stored, .. }) => {
                *stored = *checked;
                true
            }
            _ => false,
        }
    }

    /// Sets a slider property and its widget. The value is snapped like a drag would.
    pub fn set_value(&mut self, tree: &mut UiTree, name: &str, value: f32) -> UiResult<()> {
        let row = self.row_mut(name).ok_or_else(|| unknown(name))?;
        let slider = tree.get_mut::<Slider>(row.control)?;
        slider.set_value(value);
        let snapped = slider.value();
        if let Property::FloatSlider { value: stored, .. } = &mut row.property {
            *stored = snapped;
        }
        Ok(())
    }

    /// Sets a toggle property and its widget.
    pub fn set_toggle(&mut self, tree: &mut UiTree, name: &str, checked: bool) -> UiResult<()> {
        let row = self.row_mut(name).ok_or_else(|| unknown(name))?;
        tree.get_mut::<CheckBox>(row.control)?.set_checked(checked);
        if let Property::Toggle { value, .. } = &mut row.property {
            *value = checked;
        }
        Ok(())
    }

    /// Enables or disables a property's widgets.
    pub fn set_property_enabled(&self, tree: &mut UiTree, name: &str, enabled: bool) -> UiResult<()> {
        let row = self.row(name).ok_or_else(|| unknown(name))?;
        tree.set_enabled(row.control, enabled)?;
        if let Some(label) = row.label {
            tree.set_enabled(label, enabled)?;
        }
        Ok(())
    }

    fn apply_f32(&self, name: &str, target: &mut f32) {
        if let Some(v) = self.value(name) {
            *target = v;
        }
    }

    fn apply_count(&self, name: &str, target: &mut u32) {
        if let Some(v) = self.value(name) {
            *target = v.round().max(0.0) as u32;
        }
    }

    /// Writes the window's values into `config`. Shared parameters go to the
    /// active technique; properties the window lacks are left alone.
    ///
    /// When the window selects a different technique, only the technique
    /// changes. The shared sliders still show the previous technique's values
    /// and must be reloaded with [`load_ao`](Self::load_ao) before the next apply.
    pub fn apply_to_ao(&self, config: &mut AmbientOcclusionConfig) {
        use names::*;
        if let Some(enabled) = self.toggle(AO_ENABLED) {
            config.enabled = enabled;
        }
        if let Some(ray_marching) = self.toggle(RAY_MARCHING) {
            let technique = if ray_marching {
                AoTechnique::RayMarching
            } else {
                AoTechnique::HorizonBased
            };
            if technique != config.technique {
                config.technique = technique;
                return;
            }
        }
        match config.technique {
            AoTechnique::HorizonBased => {
                let c = &mut config.horizon_based;
                self.apply_f32(RADIUS, &mut c.radius);
                self.apply_count(STEPS, &mut c.number_steps);
                self.apply_count(DIRECTIONS, &mut c.number_directions);
                self.apply_f32(CONTRAST, &mut c.contrast);
                self.apply_f32(ATTENUATION, &mut c.line_attenuation);
                self.apply_f32(ANGLE_BIAS, &mut c.angle_bias_degrees);
            }
            AoTechnique::RayMarching => {
                let c = &mut config.ray_marching;
                self.apply_f32(RADIUS, &mut c.radius);
                self.apply_count(STEPS, &mut c.number_steps);
                self.apply_count(DIRECTIONS, &mut c.number_directions);
                self.apply_count(RAYS, &mut c.number_rays);
                self.apply_f32(CONTRAST, &mut c.contrast);
                self.apply_f32(ATTENUATION, &mut c.line_attenuation);
            }
        }
        if let Some(enabled) = self.toggle(BLUR) {
            config.blur.enabled = enabled;
        }
        self.apply_count(BLUR_RADIUS, &mut config.blur.radius);
        self.apply_f32(SHARPNESS, &mut config.blur.sharpness);
    }

    /// Writes the window's values into `config`.
    pub fn apply_to_tone_mapping(&self, config: &mut ToneMappingConfig) {
        use names::*;
        self.apply_f32(EXPOSURE, &mut config.exposure);
        self.apply_f32(WHITE_LEVEL, &mut config.white_level);
        self.apply_f32(GAMMA, &mut config.gamma);
    }

    /// Reloads the shared sliders from the technique now active in `config`,
    /// after the technique toggle flipped.
    pub fn load_ao(&mut self, tree: &mut UiTree, config: &AmbientOcclusionConfig) -> UiResult<()> {
        use names::*;
        let (radius, steps, directions, contrast, attenuation) = match config.technique {
            AoTechnique::HorizonBased => {
                let c = &config.horizon_based;
                (c.radius, c.number_steps, c.number_directions, c.contrast, c.line_attenuation)
            }
            AoTechnique::RayMarching => {
                let c = &config.ray_marching;
                (c.radius, c.number_steps, c.number_directions, c.contrast, c.line_attenuation)
            }
        };
        self.set_value(tree, RADIUS, radius)?;
        self.set_value(tree, STEPS, steps as f32)?;
        self.set_value(tree, DIRECTIONS, directions as f32)?;
        self.set_value(tree, CONTRAST, contrast)?;
        self.set_value(tree, ATTENUATION, attenuation)?;
        self.set_value(tree, RAYS, config.ray_marching.number_rays as f32)?;
        self.set_value(tree, ANGLE_BIAS, config.horizon_based.angle_bias_degrees)?;
        self.update_technique_rows(tree, config.technique)
    }

    /// Greys out the parameters the technique does not use.
    fn update_technique_rows(&self, tree: &mut UiTree, technique: AoTechnique) -> UiResult<()> {
        let ray_marching = technique == AoTechnique::RayMarching;
        self.set_property_enabled(tree, names::RAYS, ray_marching)?;
        self.set_property_enabled(tree, names::ANGLE_BIAS, !ray_marching)
    }
}

fn unknown(name: &str) -> UiError {
    UiError::InvalidParameter {
        name: "property",
        reason: format!("no property named '{name}'"),
    }
}

/// Something the application must do in response to the editor UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorAction {
    /// Engine options were edited in place.
    OptionsChanged,
    ResetCamera,
    Screenshot,
    Quit,
}

/// Menu paths of the editor's main menu.
mod menu_paths {
    pub const SCREENSHOT: &[usize] = &[0, 0];
    pub const QUIT: &[usize] = &[0, 1];
    pub const AO_WINDOW: &[usize] = &[1, 0];
    pub const TONE_WINDOW: &[usize] = &[1, 1];
    pub const TRANSPARENCY: &[usize] = &[1, 2];
    pub const RESET_CAMERA: &[usize] = &[2, 0];
}

/// The in-engine editor: a main menu and property windows bound to [`EngineOptions`].
pub struct EditorUi {
    tree: UiTree,
    menu: WidgetId,
    ao: PropertyWindow,
    tone: PropertyWindow,
}

impl EditorUi {
    /// Builds the editor UI for a window `width` pixels wide.
    pub fn new(options: &EngineOptions, width: f32) -> UiResult<Self> {
        let mut tree = UiTree::default();
        let bar_height = tree.theme().menu_bar_height;
        let menu = tree.add(
            MainMenu::new(vec![
                MenuItem::new("File").with_children(vec![MenuItem::new("Screenshot"), MenuItem::new("Quit")]),
                MenuItem::new("View").with_children(vec![
                    MenuItem::new("Ambient occlusion"),
                    MenuItem::new("Tone mapping"),
                    MenuItem::new("Transparency"),
                ]),
                MenuItem::new("Camera").with_children(vec![MenuItem::new("Reset")]),
            ]),
            Rect::new(0.0, 0.0, width, bar_height),
        );
        tree.set_layer(menu, 1)?;
        let ao = PropertyWindow::ambient_occlusion(
            &mut tree,
            Vec2::new(12.0, bar_height + 12.0),
            &options.ambient_occlusion,
        )?;
        let tone = PropertyWindow::tone_mapping(
            &mut tree,
            Vec2::new(WINDOW_WIDTH + 24.0, bar_height + 12.0),
            &options.tone_mapping,
        )?;
        Ok(Self { tree, menu, ao, tone })
    }

    #[must_use]
    pub fn tree(&self) -> &UiTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut UiTree {
        &mut self.tree
    }

    #[must_use]
    pub fn ao_window(&self) -> &PropertyWindow {
        &self.ao
    }

    #[must_use]
    pub fn tone_window(&self) -> &PropertyWindow {
        &self.tone
    }

    #[must_use]
    pub fn menu_id(&self) -> WidgetId {
        self.menu
    }

    /// Stretches the menu bar across a resized window.
    pub fn resize(&mut self, width: f32) -> UiResult<()> {
        let mut rect = self.tree.rect(self.menu)?;
        rect.width = width;
        self.tree.set_rect(self.menu, rect)
    }

    /// Whether pointer input at `position` belongs to the UI rather than the scene.
    #[must_use]
    pub fn wants_pointer(&self, position: Vec2) -> bool {
        self.tree.wants_pointer(position)
    }

    #[must_use]
    pub fn wants_keyboard(&self) -> bool {
        self.tree.wants_keyboard()
    }

    fn show(&mut self, window: WidgetId) -> UiResult<()> {
        self.tree.set_visible(window, true)?;
        self.tree.bring_to_front(window)
    }

    /// Routes input through the widgets and applies edits to `options`.
    pub fn handle_input(&mut self, event: &InputEvent, options: &mut EngineOptions) -> UiResult<Vec<EditorAction>> {
        let mut actions = Vec::new();
        for ui_event in self.tree.dispatch(event) {
            if self.ao.handle(&ui_event) {
                let technique = options.ambient_occlusion.technique;
                self.ao.apply_to_ao(&mut options.ambient_occlusion);
                if options.ambient_occlusion.technique != technique {
                    self.ao.load_ao(&mut self.tree, &options.ambient_occlusion)?;
                }
                actions.push(EditorAction::OptionsChanged);
                continue;
            }
            if self.tone.handle(&ui_event) {
                self.tone.apply_to_tone_mapping(&mut options.tone_mapping);
                actions.push(EditorAction::OptionsChanged);
                continue;
            }
            if let UiEvent::MenuItemSelected { path, label, .. } = &ui_event {
                log::debug!("Menu item '{label}' selected");
                match path.as_slice() {
                    menu_paths::SCREENSHOT => actions.push(EditorAction::Screenshot),
                    menu_paths::QUIT => actions.push(EditorAction::Quit),
                    menu_paths::AO_WINDOW => self.show(self.ao.window_id())?,
                    menu_paths::TONE_WINDOW => self.show(self.tone.window_id())?,
                    menu_paths::TRANSPARENCY => {
                        options.transparency_enabled = !options.transparency_enabled;
                        log::info!("Transparency {}", if options.transparency_enabled { "on" } else { "off" });
                        actions.push(EditorAction::OptionsChanged);
                    }
                    menu_paths::RESET_CAMERA => actions.push(EditorAction::ResetCamera),
                    _ => {}
                }
            }
        }
        Ok(actions)
    }

    pub fn draw(&mut self) -> DrawList {
        self.tree.draw()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::MouseButton;

    fn options() -> EngineOptions {
        EngineOptions::default()
    }

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn test_handle_updates_values() {
        let mut tree = UiTree::default();
        let mut window = PropertyWindow::new(
            &mut tree,
            "Test",
            Vec2::ZERO,
            vec![Property::slider("A", 0.0, 1.0, 0.1, 0.5), Property::toggle("B", false)],
        )
        .unwrap();
        let a = window.control("A").unwrap();
        let b = window.control("B").unwrap();
        assert!(window.handle(&UiEvent::ValueChanged { id: a, value: 0.7 }));
        assert!(window.handle(&UiEvent::Toggled { id: b, checked: true }));
        assert!(!window.handle(&UiEvent::Clicked(window.window_id())));
        assert_eq!(window.value("A"), Some(0.7));
        assert_eq!(window.toggle("B"), Some(true));
        assert_eq!(window.value("B"), None);
    }

    #[test]
    fn test_apply_to_ao_targets_active_technique() {
        let mut tree = UiTree::default();
        let config = AmbientOcclusionConfig::default();
        let mut window = PropertyWindow::ambient_occlusion(&mut tree, Vec2::ZERO, &config).unwrap();
        window.set_value(&mut tree, names::RADIUS, 1.25).unwrap();
        window.set_value(&mut tree, names::STEPS, 12.0).unwrap();
        window.set_toggle(&mut tree, names::BLUR, false).unwrap();

        let mut applied = config;
        window.apply_to_ao(&mut applied);
        assert!(close(applied.horizon_based.radius, 1.25));
        assert_eq!(applied.horizon_based.number_steps, 12);
        assert_eq!(applied.ray_marching, config.ray_marching);
        assert!(!applied.blur.enabled);
        assert!(applied.validate().is_ok());

        window.set_toggle(&mut tree, names::RAY_MARCHING, true).unwrap();
        window.apply_to_ao(&mut applied);
        assert_eq!(applied.technique, AoTechnique::RayMarching);
        assert_eq!(applied.ray_marching, config.ray_marching);
        assert!(close(applied.horizon_based.radius, 1.25));
    }

    #[test]
    fn test_technique_toggle_keeps_both_configs() {
        let mut opts = options();
        opts.ambient_occlusion.horizon_based.number_directions = 6;
        opts.ambient_occlusion.horizon_based.radius = 0.5;
        opts.ambient_occlusion.ray_marching.number_directions = 4;
        opts.ambient_occlusion.ray_marching.radius = 2.0;
        let hbao = opts.ambient_occlusion.horizon_based;
        let ray_marching = opts.ambient_occlusion.ray_marching;
        let mut editor = EditorUi::new(&opts, 1280.0).unwrap();

        let toggle = editor.ao_window().control(names::RAY_MARCHING).unwrap();
        let p = editor.tree().absolute_rect(toggle).unwrap().center();
        let click = |editor: &mut EditorUi, opts: &mut EngineOptions| {
            editor
                .handle_input(&InputEvent::MouseDown { position: p, button: MouseButton::Left }, opts)
                .unwrap();
            editor
                .handle_input(&InputEvent::MouseUp { position: p, button: MouseButton::Left }, opts)
                .unwrap();
        };

        click(&mut editor, &mut opts);
        assert_eq!(opts.ambient_occlusion.technique, AoTechnique::RayMarching);
        assert_eq!(opts.ambient_occlusion.ray_marching, ray_marching);
        assert_eq!(opts.ambient_occlusion.horizon_based, hbao);
        assert!(close(editor.ao_window().value(names::RADIUS).unwrap(), 2.0));
        assert!(close(editor.ao_window().value(names::DIRECTIONS).unwrap(), 4.0));

        click(&mut editor, &mut opts);
        assert_eq!(opts.ambient_occlusion.technique, AoTechnique::HorizonBased);
        assert_eq!(opts.ambient_occlusion.horizon_based, hbao);
        assert_eq!(opts.ambient_occlusion.ray_marching, ray_marching);
        assert!(close(editor.ao_window().value(names::RADIUS).unwrap(), 0.5));
    }

    #[test]
    fn test_load_ao_switches_rows() {
        let mut tree = UiTree::default();
        let mut config = AmbientOcclusionConfig::default();
        let mut window = PropertyWindow::ambient_occlusion(&mut tree, Vec2::ZERO, &config).unwrap();
        let rays = window.control(names::RAYS).unwrap();
        assert!(!tree.is_enabled(rays).unwrap());

        config.technique = AoTechnique::RayMarching;
        config.ray_marching.radius = 2.0;
        window.load_ao(&mut tree, &config).unwrap();
        assert!(close(window.value(names::RADIUS).unwrap(), 2.0));
        assert!(tree.is_enabled(rays).unwrap());
        let bias = window.control(names::ANGLE_BIAS).unwrap();
        assert!(!tree.is_enabled(bias).unwrap());
    }

    #[test]
    fn test_apply_to_tone_mapping() {
        let mut tree = UiTree::default();
        let mut config = ToneMappingConfig::default();
        let mut window = PropertyWindow::tone_mapping(&mut tree, Vec2::ZERO, &config).unwrap();
        window.set_value(&mut tree, names::EXPOSURE, 2.5).unwrap();
        window.set_value(&mut tree, names::GAMMA, 100.0).unwrap();
        window.apply_to_tone_mapping(&mut config);
        assert!(close(config.exposure, 2.5));
        assert!(close(config.gamma, 3.0));
        assert_eq!(config.white_level, 1.0);
    }

    #[test]
    fn test_unknown_property() {
        let mut tree = UiTree::default();
        let mut window = PropertyWindow::tone_mapping(&mut tree, Vec2::ZERO, &ToneMappingConfig::default()).unwrap();
        assert!(window.set_value(&mut tree, "Nope", 1.0).is_err());
        assert!(matches!(
            window.set_toggle(&mut tree, names::EXPOSURE, true),
            Err(UiError::WrongType { .. })
        ));
    }

    #[test]
    fn test_dragging_slider_edits_options() {
        let mut opts = options();
        let mut editor = EditorUi::new(&opts, 1280.0).unwrap();
        let exposure = editor.tone_window().control(names::EXPOSURE).unwrap();
        let rect = editor.tree().absolute_rect(exposure).unwrap();
        let right = Vec2::new(rect.right() - 1.0, rect.center().y);

        let actions = editor
            .handle_input(&InputEvent::MouseDown { position: right, button: MouseButton::Left }, &mut opts)
            .unwrap();
        editor
            .handle_input(&InputEvent::MouseUp { position: right, button: MouseButton::Left }, &mut opts)
            .unwrap();
        assert_eq!(actions, vec![EditorAction::OptionsChanged]);
        assert!(close(opts.tone_mapping.exposure, 8.0));
    }

    #[test]
    fn test_menu_actions() {
        let mut opts = options();
        let mut editor = EditorUi::new(&opts, 1280.0).unwrap();
        let transparency = opts.transparency_enabled;
        let theme = editor.tree().theme().clone();
        let menu_rect = editor.tree().absolute_rect(editor.menu_id()).unwrap();
        let bar = editor
            .tree()
            .get::<MainMenu>(editor.menu_id())
            .unwrap()
            .bar_item_rects(menu_rect, &theme);

        let click = |editor: &mut EditorUi, opts: &mut EngineOptions, p: Vec2| {
            let mut actions = editor
                .handle_input(&InputEvent::MouseDown { position: p, button: MouseButton::Left }, opts)
                .unwrap();
            actions.extend(
                editor
                    .handle_input(&InputEvent::MouseUp { position: p, button: MouseButton::Left }, opts)
                    .unwrap(),
            );
            actions
        };
        // View > Transparency is the third row of the View dropdown.
        click(&mut editor, &mut opts, bar[1].center());
        let row = Vec2::new(bar[1].x + 10.0, bar[1].bottom() + theme.row_height * 2.5);
        let actions = click(&mut editor, &mut opts, row);
        assert_eq!(actions, vec![EditorAction::OptionsChanged]);
        assert_eq!(opts.transparency_enabled, !transparency);

        // Closing the AO window then reopening it from the menu.
        let ao = editor.ao_window().window_id();
        editor.tree_mut().set_visible(ao, false).unwrap();
        click(&mut editor, &mut opts, bar[1].center());
        let row = Vec2::new(bar[1].x + 10.0, bar[1].bottom() + theme.row_height * 0.5);
        click(&mut editor, &mut opts, row);
        assert!(editor.tree().is_visible(ao).unwrap());
        assert_eq!(editor.tree().roots().last(), Some(&editor.menu_id()));
    }
}

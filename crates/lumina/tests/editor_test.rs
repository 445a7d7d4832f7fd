//! Editor UI driving engine options, without a window.

use lumina::*;
use lumina_ui::editor::names;
use lumina_ui::{EditorAction, InputEvent, Key, MouseButton};

fn click(editor: &mut EditorUi, options: &mut EngineOptions, position: Vec2) -> Vec<EditorAction> {
    let mut actions = editor
        .handle_input(&InputEvent::MouseDown { position, button: MouseButton::Left }, options)
        .unwrap();
    actions.extend(
        editor
            .handle_input(&InputEvent::MouseUp { position, button: MouseButton::Left }, options)
            .unwrap(),
    );
    actions
}

#[test]
fn technique_toggle_switches_and_keeps_options_valid() {
    let mut options = EngineOptions::default();
    let mut editor = EditorUi::new(&options, 1024.0).unwrap();
    let toggle = editor.ao_window().control(names::RAY_MARCHING).unwrap();
    let rect = editor.tree().absolute_rect(toggle).unwrap();

    let actions = click(&mut editor, &mut options, rect.center());
    assert_eq!(actions, vec![EditorAction::OptionsChanged]);
    assert_eq!(options.ambient_occlusion.technique, AoTechnique::RayMarching);
    assert!(options.validate().is_ok());

    let rays = editor.ao_window().control(names::RAYS).unwrap();
    assert!(editor.tree().is_enabled(rays).unwrap());
}

#[test]
fn keyboard_edits_focused_slider() {
    let mut options = EngineOptions::default();
    let mut editor = EditorUi::new(&options, 1024.0).unwrap();
    let steps = editor.ao_window().control(names::STEPS).unwrap();
    editor.tree_mut().set_focus(Some(steps));
    assert!(editor.wants_keyboard());
    let before = options.ambient_occlusion.horizon_based.number_steps;

    let actions = editor.handle_input(&InputEvent::KeyDown(Key::Right), &mut options).unwrap();
    assert_eq!(actions, vec![EditorAction::OptionsChanged]);
    assert_eq!(options.ambient_occlusion.horizon_based.number_steps, before + 1);
}

#[test]
fn pointer_outside_ui_is_left_to_the_scene() {
    let options = EngineOptions::default();
    let editor = EditorUi::new(&options, 1024.0).unwrap();
    assert!(!editor.wants_pointer(Vec2::new(1000.0, 700.0)));
    assert!(editor.wants_pointer(Vec2::new(5.0, 5.0)));
}

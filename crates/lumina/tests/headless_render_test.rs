//! Headless rendering integration tests.
//!
//! These need a GPU adapter (real or software fallback). Without one the
//! engine cannot be created and the tests return early with a note.

use lumina::*;

fn is_uniform(image: &image::RgbaImage) -> bool {
    let first = image.get_pixel(0, 0);
    image.pixels().all(|p| p == first)
}

fn center_pixel(image: &image::RgbaImage) -> [u8; 4] {
    image.get_pixel(image.width() / 2, image.height() / 2).0
}

/// Engine with a sphere on a ground plane, or `None` without a GPU.
fn scene_engine(width: u32, height: u32) -> Option<Engine> {
    let mut engine = Engine::new();
    if let Err(e) = engine.render_to_image(width, height) {
        eprintln!("Skipping headless test: no GPU adapter available ({e})");
        return None;
    }
    let scene = engine.scene_mut();
    scene.add_mesh("sphere", MeshData::uv_sphere(1.0, 32, 16)).unwrap();
    scene.add_mesh("ground", MeshData::plane(6.0)).unwrap();
    scene
        .add_object(SceneObject::new("ball", "sphere", "plastic").with_transform(Mat4::from_translation(Vec3::Y)))
        .unwrap();
    scene.add_object(SceneObject::new("floor", "ground", "default")).unwrap();
    engine.fit_camera();
    Some(engine)
}

#[test]
fn headless_empty_scene_is_background() {
    let mut engine = Engine::new();
    let image = match engine.render_to_image(64, 48) {
        Ok(image) => image,
        Err(e) => {
            eprintln!("Skipping headless test: no GPU adapter available ({e})");
            return;
        }
    };
    assert_eq!((image.width(), image.height()), (64, 48));
    assert!(is_uniform(&image), "empty scene should be a uniform background");
}

#[test]
fn headless_scene_has_content() {
    let Some(mut engine) = scene_engine(160, 120) else { return };
    let image = engine.render_to_image(160, 120).unwrap();
    assert!(!is_uniform(&image));
    assert!(image.pixels().any(|p| p.0[0] > 0 || p.0[1] > 0 || p.0[2] > 0));
}

#[test]
fn headless_every_ao_configuration_renders() {
    let Some(mut engine) = scene_engine(128, 96) else { return };
    for technique in [AoTechnique::HorizonBased, AoTechnique::RayMarching] {
        for blur in [true, false] {
            let options = engine.options_mut();
            options.ambient_occlusion.technique = technique;
            options.ambient_occlusion.blur.enabled = blur;
            let image = engine.render_to_image(128, 96).unwrap();
            assert_eq!(image.dimensions(), (128, 96), "{technique:?} blur={blur}");
        }
    }
}

#[test]
fn headless_ambient_occlusion_darkens() {
    let Some(mut engine) = scene_engine(128, 96) else { return };
    engine.options_mut().ambient_occlusion.enabled = false;
    let plain = engine.render_to_image(128, 96).unwrap();
    engine.options_mut().ambient_occlusion.enabled = true;
    engine.options_mut().ambient_occlusion.horizon_based.contrast = 4.0;
    let occluded = engine.render_to_image(128, 96).unwrap();

    let brightness = |image: &image::RgbaImage| -> u64 {
        image.pixels().map(|p| u64::from(p.0[0]) + u64::from(p.0[1]) + u64::from(p.0[2])).sum()
    };
    assert!(brightness(&occluded) <= brightness(&plain));
}

#[test]
fn headless_car_paint_drawn_forward() {
    let Some(mut engine) = scene_engine(128, 96) else { return };
    let without = engine.render_to_image(128, 96).unwrap();
    assert_eq!(engine.renderer().unwrap().last_frame_stats().car_paint_draws, 0);

    engine
        .scene_mut()
        .add_object(
            SceneObject::new("car", "sphere", "car_paint_red")
                .with_transform(Mat4::from_translation(Vec3::new(0.0, 1.0, 1.5))),
        )
        .unwrap();
    let with = engine.render_to_image(128, 96).unwrap();
    let stats = engine.renderer().unwrap().last_frame_stats();
    assert_eq!(stats.car_paint_draws, 1);
    assert_eq!(stats.transparent_draws, 0);
    assert_eq!(stats.skipped, 0);
    assert_ne!(with, without);
}

#[test]
fn headless_transparency_toggle() {
    let Some(mut engine) = scene_engine(96, 96) else { return };
    let scene = engine.scene_mut();
    scene.clear();
    scene.add_mesh("sphere", MeshData::uv_sphere(1.0, 24, 12)).unwrap();
    scene
        .add_object(SceneObject::new("pane", "sphere", "glass"))
        .unwrap();
    engine.fit_camera();

    engine.options_mut().transparency_enabled = false;
    let hidden = engine.render_to_image(96, 96).unwrap();
    assert!(is_uniform(&hidden), "disabled transparency should skip the glass");

    engine.options_mut().transparency_enabled = true;
    let shown = engine.render_to_image(96, 96).unwrap();
    assert_ne!(center_pixel(&shown), center_pixel(&hidden));
}

#[test]
fn headless_render_to_file() {
    let Some(mut engine) = scene_engine(80, 60) else { return };
    let path = std::env::temp_dir().join(format!("lumina_headless_{}.png", std::process::id()));
    engine.render_to_file(&path, 80, 60).unwrap();
    let saved = image::open(&path).unwrap();
    assert_eq!((saved.width(), saved.height()), (80, 60));
    let _ = std::fs::remove_file(&path);
}

#[test]
fn headless_invalid_options_are_rejected() {
    let Some(mut engine) = scene_engine(32, 32) else { return };
    engine.options_mut().tone_mapping.exposure = -1.0;
    assert!(matches!(
        engine.render_to_image(32, 32),
        Err(Error::Render(RenderError::Core(_)))
    ));
}

//! Engine API tests that need no GPU.

use lumina::*;

#[test]
fn options_round_trip_through_json() {
    let path = std::env::temp_dir().join(format!("lumina_options_{}.json", std::process::id()));
    let mut options = EngineOptions::default();
    options.ambient_occlusion.technique = AoTechnique::RayMarching;
    options.tone_mapping.exposure = 1.5;
    options.save(&path).unwrap();

    let engine = Engine::new().with_options(EngineOptions::load(&path).unwrap()).unwrap();
    assert_eq!(engine.options(), &options);
    let _ = std::fs::remove_file(&path);
}

#[test]
fn scene_objects_and_materials() {
    let mut engine = Engine::new();
    engine.scene_mut().add_mesh("cube", MeshData::cube(1.0)).unwrap();
    engine
        .scene_mut()
        .add_object(SceneObject::new("a", "cube", "metal"))
        .unwrap();
    assert!(engine.scene_mut().add_object(SceneObject::new("a", "cube", "metal")).is_err());
    assert!(engine.materials().has("car_paint_red"));
    engine
        .materials_mut()
        .register("gold", Material::blinn_phong(Vec3::new(1.0, 0.8, 0.3), 0.9, 96.0))
        .unwrap();
    assert!(engine.materials().has("gold"));
}

#[test]
fn renderer_is_created_lazily() {
    let engine = Engine::new();
    assert!(engine.renderer().is_none());
}

//! Opens the editor on a small material showcase.
//!
//! Pass an equirectangular image path to use it as environment and ambient light.

use lumina::*;

fn main() -> Result<()> {
    init_logging();
    let mut engine = Engine::new();

    let scene = engine.scene_mut();
    scene.add_mesh("sphere", MeshData::uv_sphere(0.8, 48, 24))?;
    scene.add_mesh("cube", MeshData::cube(1.2))?;
    scene.add_mesh("ground", MeshData::plane(12.0))?;
    scene.add_object(SceneObject::new("floor", "ground", "default"))?;

    let materials = ["plastic", "metal", "car_paint_red", "glass"];
    for (i, material) in materials.iter().enumerate() {
        let x = (i as f32 - 1.5) * 2.0;
        scene.add_object(
            SceneObject::new(format!("sphere_{material}"), "sphere", *material)
                .with_transform(Mat4::from_translation(Vec3::new(x, 0.8, 0.0))),
        )?;
    }
    scene.add_object(
        SceneObject::new("crate", "cube", "plastic").with_transform(Mat4::from_translation(Vec3::new(0.0, 0.6, -2.5))),
    )?;
    scene.add_directional_light(DirectionalLight::new(
        Vec3::new(0.3, -1.0, 0.5),
        Vec3::new(1.0, 0.8, 0.6),
        0.6,
    )?);

    if let Some(path) = std::env::args().nth(1) {
        engine.load_environment(path)?;
    }

    run_editor(engine)
}

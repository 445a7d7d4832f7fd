//! Renders a scene headless with each ambient occlusion technique.

use lumina::*;

fn main() -> Result<()> {
    init_logging();
    let mut engine = Engine::new();
    let scene = engine.scene_mut();
    scene.add_mesh("sphere", MeshData::uv_sphere(1.0, 48, 24))?;
    scene.add_mesh("ground", MeshData::plane(8.0))?;
    scene.add_object(SceneObject::new("floor", "ground", "default"))?;
    scene.add_object(
        SceneObject::new("ball", "sphere", "car_paint_red").with_transform(Mat4::from_translation(Vec3::Y)),
    )?;
    engine.fit_camera();

    for (technique, file) in [
        (AoTechnique::HorizonBased, "hbao.png"),
        (AoTechnique::RayMarching, "ray_marching.png"),
    ] {
        engine.options_mut().ambient_occlusion.technique = technique;
        engine.render_to_file(file, 1280, 720)?;
    }
    Ok(())
}

//! The [`Engine`]: a scene, its materials and options, a camera and a renderer.

use std::path::{Path, PathBuf};

use image::RgbaImage;
use lumina_core::{AmbientLight, EngineOptions, Scene};
use lumina_render::{Camera, FrameStats, MaterialRegistry, Overlay, RenderEngine};
use pollster::FutureExt;

use crate::Result;

/// Everything needed to draw frames.
///
/// The renderer is created on demand: headless at the requested size by
/// [`render_to_image`](Self::render_to_image), or windowed by the editor.
pub struct Engine {
    scene: Scene,
    materials: MaterialRegistry,
    options: EngineOptions,
    camera: Camera,
    renderer: Option<RenderEngine>,
    /// Environment image waiting for a renderer to be bound to.
    pending_environment: Option<PathBuf>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// Creates an engine with an empty scene, the built-in materials and default options.
    #[must_use]
    pub fn new() -> Self {
        Self {
            scene: Scene::new(),
            materials: MaterialRegistry::new(),
            options: EngineOptions::default(),
            camera: Camera::new(16.0 / 9.0),
            renderer: None,
            pending_environment: None,
        }
    }

    /// Replaces the options after validating them.
    pub fn with_options(mut self, options: EngineOptions) -> Result<Self> {
        self.set_options(options)?;
        Ok(self)
    }

    #[must_use]
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    #[must_use]
    pub fn materials(&self) -> &MaterialRegistry {
        &self.materials
    }

    pub fn materials_mut(&mut self) -> &mut MaterialRegistry {
        &mut self.materials
    }

    #[must_use]
    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Mutable options. They are validated when the next frame renders.
    pub fn options_mut(&mut self) -> &mut EngineOptions {
        &mut self.options
    }

    pub fn set_options(&mut self, options: EngineOptions) -> Result<()> {
        options.validate()?;
        self.options = options;
        Ok(())
    }

    #[must_use]
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    /// Points the camera at the whole scene. An empty scene leaves it unchanged.
    pub fn fit_camera(&mut self) {
        if let Some((min, max)) = self.scene.bounding_box() {
            self.camera.fit_to_bounds(min, max);
        }
    }

    /// Restores the default camera and frames the scene.
    pub fn reset_camera(&mut self) {
        self.camera = Camera::new(self.camera.aspect_ratio);
        self.fit_camera();
    }

    #[must_use]
    pub fn renderer(&self) -> Option<&RenderEngine> {
        self.renderer.as_ref()
    }

    pub fn renderer_mut(&mut self) -> Option<&mut RenderEngine> {
        self.renderer.as_mut()
    }

    /// Installs a renderer, replacing any existing one, and binds a pending environment.
    pub fn attach_renderer(&mut self, renderer: RenderEngine) -> Result<()> {
        self.renderer = Some(renderer);
        if let Some(path) = self.pending_environment.take() {
            self.load_environment(path)?;
        }
        Ok(())
    }

    /// Uses an equirectangular HDR or LDR image as environment map and ambient
    /// light. Without a renderer the image is loaded when one is attached.
    pub fn load_environment(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let Some(renderer) = self.renderer.as_mut() else {
            log::debug!("deferring environment {} until a renderer exists", path.display());
            self.pending_environment = Some(path.to_path_buf());
            return Ok(());
        };
        let sh = renderer.load_environment(path, self.options.rgbm)?;
        let mut ambient = AmbientLight::new(sh);
        ambient.intensity = self.scene.ambient.intensity;
        ambient.ambient_occlusion_strength = self.scene.ambient.ambient_occlusion_strength;
        self.scene.ambient = ambient;
        Ok(())
    }

    /// Ensures a renderer of `width` x `height` exists, creating a headless one if needed.
    fn ensure_renderer(&mut self, width: u32, height: u32) -> Result<()> {
        match self.renderer.as_mut() {
            Some(renderer) => renderer.resize(width, height),
            None => {
                let renderer = RenderEngine::new_headless(width, height).block_on()?;
                self.attach_renderer(renderer)?;
            }
        }
        Ok(())
    }

    /// Renders one frame offscreen at `width` x `height`.
    pub fn render_to_image(&mut self, width: u32, height: u32) -> Result<RgbaImage> {
        self.ensure_renderer(width.max(1), height.max(1))?;
        let Self {
            scene,
            materials,
            options,
            camera,
            renderer,
            ..
        } = self;
        let Some(renderer) = renderer.as_mut() else {
            return Err(lumina_render::RenderError::NoSurface.into());
        };
        Ok(renderer.render_to_image(scene, materials, options, camera)?)
    }

    /// Renders one frame offscreen and saves it. The format follows the extension.
    pub fn render_to_file(&mut self, path: impl AsRef<Path>, width: u32, height: u32) -> Result<()> {
        let path = path.as_ref();
        let image = self.render_to_image(width, height)?;
        lumina_render::save_image(path, &image).map_err(lumina_render::RenderError::from)?;
        log::info!("saved {}x{} frame to {}", image.width(), image.height(), path.display());
        Ok(())
    }

    /// Renders and presents a frame on the windowed renderer.
    pub fn render_frame(&mut self, overlay: Option<&mut dyn Overlay>) -> Result<FrameStats> {
        let Self {
            scene,
            materials,
            options,
            camera,
            renderer,
            ..
        } = self;
        let Some(renderer) = renderer.as_mut() else {
            return Err(lumina_render::RenderError::NoSurface.into());
        };
        Ok(renderer.render_frame(scene, materials, options, camera, overlay)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use lumina_core::{MeshData, SceneObject};

    #[test]
    fn test_invalid_options_rejected() {
        let mut engine = Engine::new();
        let mut options = EngineOptions::default();
        options.tone_mapping.gamma = 0.0;
        assert!(engine.set_options(options).is_err());
        assert_eq!(engine.options(), &EngineOptions::default());
    }

    #[test]
    fn test_fit_and_reset_camera() {
        let mut engine = Engine::new();
        engine.fit_camera();
        assert_eq!(engine.camera().target, Vec3::ZERO);

        engine.scene_mut().add_mesh("cube", MeshData::cube(2.0)).unwrap();
        engine
            .scene_mut()
            .add_object(SceneObject::new("box", "cube", "default"))
            .unwrap();
        engine.camera_mut().orbit(1.0, 0.3);
        engine.camera_mut().target = Vec3::splat(5.0);
        engine.reset_camera();
        assert!(engine.camera().target.length() < 1e-4);
        assert!(engine.camera().distance() > 1.0);
    }

    #[test]
    fn test_environment_deferred_without_renderer() {
        let mut engine = Engine::new();
        engine.load_environment("missing.hdr").unwrap();
        assert_eq!(engine.pending_environment.as_deref(), Some(Path::new("missing.hdr")));
    }
}

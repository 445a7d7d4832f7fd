use std::collections::{HashMap, HashSet};

use lumina_core::{AmbientOcclusionConfig, EngineOptions, Scene, SceneObject};

use super::{CachedMesh, Overlay, OverlayContext, RenderEngine};
use crate::ao_pass::{AoUniforms, AO_FORMAT};
use crate::camera::Camera;
use crate::error::RenderResult;
use crate::lighting::{LightingInputs, LightingUniforms};
use crate::material_pass::{DrawItem, ForwardKind, ObjectUniforms, HDR_FORMAT};
use crate::materials::{Material, MaterialRegistry, ShadingPath};
use crate::render_targets::{RenderTarget, RenderTargetDesc};

/// Counts from one rendered frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Objects written to the G-buffer (deferred and car paint).
    pub gbuffer_draws: usize,
    pub car_paint_draws: usize,
    pub transparent_draws: usize,
    /// Visible objects skipped because their mesh is missing or transparency is off.
    pub skipped: usize,
}

/// A mesh name and the slot of its object uniforms.
type Slot<'s> = (&'s str, u32);

impl RenderEngine {
    /// Renders one frame of `scene` into `target`, which must have the engine's
    /// output format and size.
    ///
    /// Frame order: G-buffer, ambient occlusion with bilateral blur, deferred
    /// lighting into an HDR target, forward car paint, forward transparency
    /// sorted back to front, tone mapping into `target`, then the overlay.
    pub fn render(
        &mut self,
        scene: &Scene,
        materials: &MaterialRegistry,
        options: &EngineOptions,
        camera: &Camera,
        target: &wgpu::TextureView,
        overlay: Option<&mut dyn Overlay>,
    ) -> RenderResult<FrameStats> {
        options.validate()?;
        self.sync_meshes(scene);

        let mut camera = camera.clone();
        camera.set_aspect_ratio(self.width as f32 / self.height as f32);

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("lumina frame encoder"),
        });
        let stats = self.encode_frame(&mut encoder, scene, materials, options, &camera, target)?;

        if let Some(overlay) = overlay {
            let context = OverlayContext {
                device: &self.device,
                queue: &self.queue,
                format: self.surface_config.format,
                width: self.width,
                height: self.height,
            };
            overlay.draw(&context, &mut encoder, target);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        self.last_stats = stats;
        Ok(stats)
    }

    /// Renders into the window surface and presents it. A lost or outdated
    /// surface is reconfigured and the frame dropped.
    pub fn render_frame(
        &mut self,
        scene: &Scene,
        materials: &MaterialRegistry,
        options: &EngineOptions,
        camera: &Camera,
        overlay: Option<&mut dyn Overlay>,
    ) -> RenderResult<FrameStats> {
        let Some(surface) = self.surface.as_ref() else {
            return Err(crate::error::RenderError::NoSurface);
        };
        let frame = match surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::debug!("surface lost or outdated, reconfiguring");
                surface.configure(&self.device, &self.surface_config);
                return Ok(FrameStats::default());
            }
            Err(err) => return Err(err.into()),
        };
        let view = frame.texture.create_view(&wgpu::TextureViewDescriptor::default());
        let stats = self.render(scene, materials, options, camera, &view, overlay)?;
        frame.present();
        Ok(stats)
    }

    fn encode_frame(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        scene: &Scene,
        materials: &MaterialRegistry,
        options: &EngineOptions,
        camera: &Camera,
        target: &wgpu::TextureView,
    ) -> RenderResult<FrameStats> {
        let mut stats = FrameStats::default();
        let mut uniforms = Vec::new();
        let mut opaque: Vec<Slot<'_>> = Vec::new();
        let mut car_paint: Vec<Slot<'_>> = Vec::new();
        let mut transparent: Vec<&SceneObject> = Vec::new();

        for object in scene.objects().iter().filter(|o| o.visible) {
            if !self.meshes.contains_key(&object.mesh) {
                stats.skipped += 1;
                continue;
            }
            let material = resolve_material(&mut self.warned_materials, materials, &object.material);
            match material.shading_path() {
                ShadingPath::Deferred => {
                    opaque.push((object.mesh.as_str(), slot(uniforms.len())));
                    uniforms.push(ObjectUniforms::new(object.transform, material));
                }
                ShadingPath::ForwardOpaque => {
                    // Also in the G-buffer so AO and depth see it
                    let slot = slot(uniforms.len());
                    opaque.push((object.mesh.as_str(), slot));
                    car_paint.push((object.mesh.as_str(), slot));
                    uniforms.push(ObjectUniforms::new(object.transform, material));
                }
                ShadingPath::ForwardTransparent if options.transparency_enabled => transparent.push(object),
                ShadingPath::ForwardTransparent => stats.skipped += 1,
            }
        }

        scene.sort_back_to_front(&mut transparent, camera.position);
        let transparent: Vec<Slot<'_>> = transparent
            .into_iter()
            .map(|object| {
                let material = resolve_material(&mut self.warned_materials, materials, &object.material);
                let entry = (object.mesh.as_str(), slot(uniforms.len()));
                uniforms.push(ObjectUniforms::new(object.transform, material));
                entry
            })
            .collect();

        stats.gbuffer_draws = opaque.len();
        stats.car_paint_draws = car_paint.len();
        stats.transparent_draws = transparent.len();

        self.material_pass.write_objects(&self.device, &self.queue, &uniforms);
        self.material_pass.update_camera(&self.queue, &camera.uniforms());
        self.material_pass
            .draw_gbuffer(encoder, &self.gbuffer, &draw_items(&self.meshes, &opaque));

        let ao_config = &options.ambient_occlusion;
        let ao_target = if ao_config.enabled {
            Some(self.render_ambient_occlusion(encoder, ao_config, camera)?)
        } else {
            None
        };
        let ao_view = ao_target.as_ref().map_or(&self.white_ao.1, |t| &t.view);

        let lighting = LightingUniforms::new(&LightingInputs {
            view: camera.view_matrix(),
            proj: camera.projection_matrix(),
            lights: scene.directional_lights(),
            ambient: &scene.ambient,
            background: options.background_color,
            width: self.width,
            height: self.height,
            ao_enabled: ao_config.enabled,
            environment: self.environment.encoding,
        });
        self.lighting_pass.update(&self.queue, &lighting);

        let hdr = self
            .pool
            .fetch(&self.device, RenderTargetDesc::sampled(self.width, self.height, HDR_FORMAT));
        let lighting_bind_group = self.lighting_pass.create_bind_group(&self.device, &self.gbuffer, ao_view);
        self.lighting_pass.render(encoder, &hdr.view, &lighting_bind_group);

        if !car_paint.is_empty() || !transparent.is_empty() {
            let forward_bind_group = self.material_pass.create_forward_bind_group(
                &self.device,
                self.lighting_pass.uniform_buffer(),
                &self.environment.view,
                self.lighting_pass.sampler(),
                ao_view,
            );
            self.material_pass.draw_forward(
                encoder,
                ForwardKind::CarPaint,
                &hdr.view,
                &self.gbuffer.depth.view,
                &forward_bind_group,
                &draw_items(&self.meshes, &car_paint),
            );
            self.material_pass.draw_forward(
                encoder,
                ForwardKind::Transparent,
                &hdr.view,
                &self.gbuffer.depth.view,
                &forward_bind_group,
                &draw_items(&self.meshes, &transparent),
            );
        }

        self.tone_map_pass.update_uniforms(&self.queue, &options.tone_mapping);
        self.tone_map_pass
            .render_to_target(&self.device, encoder, &hdr.view, target);

        self.pool.release(hdr);
        if let Some(ao_target) = ao_target {
            self.pool.release(ao_target);
        }
        Ok(stats)
    }

    /// Raw AO followed by the bilateral blur, if enabled. Returns the final AO target.
    fn render_ambient_occlusion(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        config: &AmbientOcclusionConfig,
        camera: &Camera,
    ) -> RenderResult<RenderTarget> {
        let params = config.derive(camera.fov, self.width, self.height)?;
        let (ao_width, ao_height) = config.resolution().target_size(self.width, self.height);
        self.ao_pass
            .update(&self.queue, &AoUniforms::new(params, camera.near, camera.far));

        let desc = RenderTargetDesc::sampled(ao_width, ao_height, AO_FORMAT);
        let raw = self.pool.fetch(&self.device, desc);

        let bind_group =
            self.ao_pass
                .create_bind_group(&self.device, &self.gbuffer.depth.view, &self.gbuffer.normal.view);
        self.ao_pass.render(encoder, config.technique, &raw.view, &bind_group);
        if !config.blur.enabled {
            return Ok(raw);
        }

        let blurred = self.pool.fetch(&self.device, desc);

        self.bilateral_pass
            .update(&self.queue, &config.blur, ao_width, ao_height, camera.near, camera.far);
        self.bilateral_pass.apply(
            &self.device,
            encoder,
            &mut self.pool,
            &raw.view,
            &self.gbuffer.depth.view,
            &blurred.view,
            ao_width,
            ao_height,
        );

        self.pool.release(raw);
        Ok(blurred)
    }
}

/// Looks up a material, warning once per missing name before falling back
/// to the registry default.
fn resolve_material<'m>(
    warned: &mut HashSet<String>,
    materials: &'m MaterialRegistry,
    name: &str,
) -> &'m Material {
    if !materials.has(name) && warned.insert(name.to_string()) {
        log::warn!(
            "material '{name}' not found, using '{}'",
            materials.default_name()
        );
    }
    materials.resolve(name)
}

fn draw_items<'a>(meshes: &'a HashMap<String, CachedMesh>, slots: &[Slot<'_>]) -> Vec<DrawItem<'a>> {
    slots
        .iter()
        .filter_map(|&(mesh, slot)| {
            meshes.get(mesh).map(|cached| DrawItem {
                mesh: &cached.buffers,
                slot,
            })
        })
        .collect()
}

fn slot(index: usize) -> u32 {
    u32::try_from(index).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_material_warns_once() {
        let materials = MaterialRegistry::new();
        let mut warned = HashSet::new();
        let first = resolve_material(&mut warned, &materials, "chrome");
        let second = resolve_material(&mut warned, &materials, "chrome");
        assert_eq!(first, materials.default_material());
        assert_eq!(first, second);
        assert_eq!(warned.len(), 1);

        resolve_material(&mut warned, &materials, "metal");
        assert_eq!(warned.len(), 1);
    }

    #[test]
    fn test_frame_stats_default() {
        assert_eq!(FrameStats::default().gbuffer_draws, 0);
    }
}

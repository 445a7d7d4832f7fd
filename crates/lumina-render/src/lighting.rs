//! Deferred lighting pass.

use glam::{Mat4, Vec3};
use lumina_core::{AmbientLight, DirectionalLight, RgbmEncoding, MAX_DIRECTIONAL_LIGHTS};

use crate::gbuffer::GBuffer;
use crate::material_pass::{HDR_FORMAT, LIGHTING_COMMON_WGSL};
use crate::shader::{self, ShaderBuilder};

const DEFERRED_LIGHTING_WGSL: &str = include_str!("shaders/deferred_lighting.wgsl");

/// GPU representation of the lighting environment.
///
/// Shared by the deferred lighting pass and the forward material passes.
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightingUniforms {
    pub inv_proj: [[f32; 4]; 4],
    pub inv_view: [[f32; 4]; 4],
    /// View space, pointing toward the light.
    pub light_directions: [[f32; 4]; MAX_DIRECTIONAL_LIGHTS],
    /// Radiance (color times intensity).
    pub light_colors: [[f32; 4]; MAX_DIRECTIONAL_LIGHTS],
    pub sh: [[f32; 4]; 9],
    pub background: [f32; 4],
    /// Width, height and their reciprocals.
    pub screen: [f32; 4],
    pub light_count: u32,
    pub ambient_intensity: f32,
    pub ao_strength: f32,
    pub ao_enabled: u32,
    /// Range, gamma flag, environment present, environment is RGBM.
    pub rgbm: [f32; 4],
}

impl Default for LightingUniforms {
    fn default() -> Self {
        let mut uniforms: Self = bytemuck::Zeroable::zeroed();
        uniforms.inv_proj = Mat4::IDENTITY.to_cols_array_2d();
        uniforms.inv_view = Mat4::IDENTITY.to_cols_array_2d();
        uniforms.screen = [1.0; 4];
        uniforms
    }
}

/// Inputs for [`LightingUniforms::new`].
pub struct LightingInputs<'a> {
    pub view: Mat4,
    pub proj: Mat4,
    pub lights: &'a [DirectionalLight],
    pub ambient: &'a AmbientLight,
    pub background: Vec3,
    pub width: u32,
    pub height: u32,
    pub ao_enabled: bool,
    /// Encoding of the environment map, if one is bound.
    pub environment: Option<EnvironmentEncoding>,
}

/// How the bound environment map stores radiance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EnvironmentEncoding {
    /// Linear half-float texels.
    Linear,
    /// RGBM-encoded 8-bit texels.
    Rgbm(RgbmEncoding),
}

impl LightingUniforms {
    /// Packs lights and the ambient environment. Lights beyond
    /// [`MAX_DIRECTIONAL_LIGHTS`] are ignored.
    #[must_use]
    pub fn new(inputs: &LightingInputs<'_>) -> Self {
        let mut uniforms = Self {
            inv_proj: inputs.proj.inverse().to_cols_array_2d(),
            inv_view: inputs.view.inverse().to_cols_array_2d(),
            sh: inputs.ambient.sh.to_gpu(),
            background: inputs.background.extend(1.0).to_array(),
            ambient_intensity: inputs.ambient.intensity,
            ao_strength: inputs.ambient.ambient_occlusion_strength,
            ao_enabled: u32::from(inputs.ao_enabled),
            ..Self::default()
        };

        let width = inputs.width.max(1) as f32;
        let height = inputs.height.max(1) as f32;
        uniforms.screen = [width, height, 1.0 / width, 1.0 / height];

        let used = inputs.lights.len().min(MAX_DIRECTIONAL_LIGHTS);
        for (i, light) in inputs.lights.iter().take(used).enumerate() {
            let toward_light = inputs
                .view
                .transform_vector3(-light.direction())
                .normalize_or_zero();
            uniforms.light_directions[i] = toward_light.extend(0.0).to_array();
            uniforms.light_colors[i] = light.radiance().extend(0.0).to_array();
        }
        uniforms.light_count = used as u32;

        uniforms.rgbm = match inputs.environment {
            None => [0.0; 4],
            Some(EnvironmentEncoding::Linear) => [1.0, 0.0, 1.0, 0.0],
            Some(EnvironmentEncoding::Rgbm(encoding)) => [
                encoding.max_range,
                if encoding.gamma_space { 1.0 } else { 0.0 },
                1.0,
                1.0,
            ],
        };
        uniforms
    }
}

/// Fullscreen pass that lights the G-buffer into an HDR target.
pub struct LightingPass {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    uniform_buffer: wgpu::Buffer,
    sampler: wgpu::Sampler,
}

impl LightingPass {
    /// Creates the lighting pipeline.
    pub fn new(device: &wgpu::Device) -> crate::error::RenderResult<Self> {
        let module = ShaderBuilder::fullscreen("Deferred Lighting Shader", DEFERRED_LIGHTING_WGSL)
            .with_include(LIGHTING_COMMON_WGSL)
            .build_module(device)?;

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Deferred Lighting Bind Group Layout"),
            entries: &[
                shader::uniform_entry(0),
                shader::depth_entry(1),
                shader::texture_entry(2),
                shader::texture_entry(3),
                shader::texture_entry(4),
                shader::sampler_entry(5),
            ],
        });

        let pipeline = shader::fullscreen_pipeline(
            device,
            "Deferred Lighting Pipeline",
            &module,
            "fs_main",
            &bind_group_layout,
            HDR_FORMAT,
            None,
        );

        let uniform_buffer = crate::buffer::create_uniform_buffer(
            device,
            &LightingUniforms::default(),
            Some("Lighting Uniforms"),
        );
        let sampler = shader::clamp_sampler(device, "Lighting Sampler", wgpu::FilterMode::Linear);

        Ok(Self {
            pipeline,
            bind_group_layout,
            uniform_buffer,
            sampler,
        })
    }

    /// Uploads the lighting uniforms.
    pub fn update(&self, queue: &wgpu::Queue, uniforms: &LightingUniforms) {
        crate::buffer::update_uniform(queue, &self.uniform_buffer, uniforms);
    }

    /// The lighting uniform buffer, also bound by the forward passes.
    #[must_use]
    pub fn uniform_buffer(&self) -> &wgpu::Buffer {
        &self.uniform_buffer
    }

    /// Linear clamp sampler shared with the forward passes.
    #[must_use]
    pub fn sampler(&self) -> &wgpu::Sampler {
        &self.sampler
    }

    /// Creates a bind group for the given G-buffer and AO texture.
    #[must_use]
    pub fn create_bind_group(
        &self,
        device: &wgpu::Device,
        gbuffer: &GBuffer,
        ao_view: &wgpu::TextureView,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Deferred Lighting Bind Group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&gbuffer.depth.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&gbuffer.normal.view),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(&gbuffer.albedo.view),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: wgpu::BindingResource::TextureView(ao_view),
                },
                wgpu::BindGroupEntry {
                    binding: 5,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        })
    }

    /// Renders lit color into `output_view`.
    pub fn render(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        output_view: &wgpu::TextureView,
        bind_group: &wgpu::BindGroup,
    ) {
        shader::draw_fullscreen(
            encoder,
            "Deferred Lighting Pass",
            output_view,
            wgpu::Color::BLACK,
            &self.pipeline,
            bind_group,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs<'a>(lights: &'a [DirectionalLight], ambient: &'a AmbientLight) -> LightingInputs<'a> {
        LightingInputs {
            view: Mat4::look_at_rh(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y),
            proj: Mat4::perspective_rh(1.0, 1.0, 0.1, 100.0),
            lights,
            ambient,
            background: Vec3::new(0.1, 0.2, 0.3),
            width: 200,
            height: 100,
            ao_enabled: true,
            environment: None,
        }
    }

    #[test]
    fn test_lighting_uniforms_size() {
        assert_eq!(std::mem::size_of::<LightingUniforms>(), 464);
        assert_eq!(std::mem::size_of::<LightingUniforms>() % 16, 0);
    }

    #[test]
    fn test_light_direction_in_view_space() {
        // Light travelling straight down lights surfaces from +Y
        let light = DirectionalLight::new(Vec3::NEG_Y, Vec3::ONE, 2.0).unwrap();
        let ambient = AmbientLight::default();
        let uniforms = LightingUniforms::new(&inputs(&[light], &ambient));
        assert_eq!(uniforms.light_count, 1);
        let dir = uniforms.light_directions[0];
        assert!((dir[1] - 1.0).abs() < 1e-5, "{dir:?}");
        assert_eq!(&uniforms.light_colors[0][..3], &[2.0, 2.0, 2.0]);
        assert_eq!(uniforms.screen, [200.0, 100.0, 0.005, 0.01]);
        assert_eq!(uniforms.ao_enabled, 1);
    }

    #[test]
    fn test_extra_lights_ignored() {
        let lights = vec![DirectionalLight::default(); 6];
        let ambient = AmbientLight::default();
        let uniforms = LightingUniforms::new(&inputs(&lights, &ambient));
        assert_eq!(uniforms.light_count as usize, MAX_DIRECTIONAL_LIGHTS);
    }

    #[test]
    fn test_environment_flags() {
        let ambient = AmbientLight::default();
        let mut input = inputs(&[], &ambient);
        assert_eq!(LightingUniforms::new(&input).rgbm, [0.0; 4]);
        input.environment = Some(EnvironmentEncoding::Rgbm(RgbmEncoding::default()));
        assert_eq!(LightingUniforms::new(&input).rgbm, [6.0, 1.0, 1.0, 1.0]);
        input.environment = Some(EnvironmentEncoding::Linear);
        assert_eq!(LightingUniforms::new(&input).rgbm[3], 0.0);
    }
}

//! Screen-space ambient occlusion pass (horizon-based and ray-marching).

use lumina_core::{AoShaderParameters, AoTechnique};

use crate::shader::{self, ShaderBuilder};

/// Format of the raw and blurred AO targets.
pub const AO_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::R8Unorm;

const AO_COMMON_WGSL: &str = include_str!("shaders/ao_common.wgsl");
const HBAO_WGSL: &str = include_str!("shaders/hbao.wgsl");
const RAY_MARCHING_AO_WGSL: &str = include_str!("shaders/ray_marching_ao.wgsl");

/// GPU representation of AO uniforms: derived parameters plus clip planes.
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
#[allow(clippy::pub_underscore_fields)]
pub struct AoUniforms {
    pub params: AoShaderParameters,
    pub near: f32,
    pub far: f32,
    pub _padding: [f32; 2],
}

impl AoUniforms {
    /// Combines derived parameters with the camera clip planes.
    #[must_use]
    pub fn new(params: AoShaderParameters, near: f32, far: f32) -> Self {
        Self {
            params,
            near,
            far,
            _padding: [0.0; 2],
        }
    }
}

/// AO pass resources. One pipeline per technique; the active one is picked per frame.
pub struct AoPass {
    hbao_pipeline: wgpu::RenderPipeline,
    ray_marching_pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    uniform_buffer: wgpu::Buffer,
}

impl AoPass {
    /// Creates both AO pipelines.
    pub fn new(device: &wgpu::Device) -> crate::error::RenderResult<Self> {
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("AO Bind Group Layout"),
            entries: &[
                shader::uniform_entry(0),
                shader::depth_entry(1),
                shader::texture_entry(2),
            ],
        });

        let hbao_module = ShaderBuilder::fullscreen("HBAO Shader", HBAO_WGSL)
            .with_include(AO_COMMON_WGSL)
            .build_module(device)?;
        let ray_marching_module = ShaderBuilder::fullscreen("Ray Marching AO Shader", RAY_MARCHING_AO_WGSL)
            .with_include(AO_COMMON_WGSL)
            .build_module(device)?;

        let hbao_pipeline = shader::fullscreen_pipeline(
            device,
            "HBAO Pipeline",
            &hbao_module,
            "fs_main",
            &bind_group_layout,
            AO_FORMAT,
            None,
        );
        let ray_marching_pipeline = shader::fullscreen_pipeline(
            device,
            "Ray Marching AO Pipeline",
            &ray_marching_module,
            "fs_main",
            &bind_group_layout,
            AO_FORMAT,
            None,
        );

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("AO Uniforms"),
            size: std::mem::size_of::<AoUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Ok(Self {
            hbao_pipeline,
            ray_marching_pipeline,
            bind_group_layout,
            uniform_buffer,
        })
    }

    /// Updates the AO uniforms.
    pub fn update(&self, queue: &wgpu::Queue, uniforms: &AoUniforms) {
        crate::buffer::update_uniform(queue, &self.uniform_buffer, uniforms);
    }

    /// Creates a bind group over the G-buffer depth and normals.
    #[must_use]
    pub fn create_bind_group(
        &self,
        device: &wgpu::Device,
        depth_view: &wgpu::TextureView,
        normal_view: &wgpu::TextureView,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("AO Bind Group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(depth_view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(normal_view),
                },
            ],
        })
    }

    /// Renders raw occlusion into `output_view` (an [`AO_FORMAT`] target).
    pub fn render(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        technique: AoTechnique,
        output_view: &wgpu::TextureView,
        bind_group: &wgpu::BindGroup,
    ) {
        let pipeline = match technique {
            AoTechnique::HorizonBased => &self.hbao_pipeline,
            AoTechnique::RayMarching => &self.ray_marching_pipeline,
        };
        shader::draw_fullscreen(
            encoder,
            "AO Pass",
            output_view,
            wgpu::Color::WHITE,
            pipeline,
            bind_group,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumina_core::AmbientOcclusionConfig;

    #[test]
    fn test_ao_uniforms_layout() {
        assert_eq!(std::mem::size_of::<AoShaderParameters>(), 80);
        assert_eq!(std::mem::size_of::<AoUniforms>(), 96);
    }

    #[test]
    fn test_ao_uniforms_carry_technique() {
        let config = AmbientOcclusionConfig::default().with_technique(AoTechnique::RayMarching);
        let params = config.derive(1.0, 640, 480).unwrap();
        let uniforms = AoUniforms::new(params, 0.1, 50.0);
        assert_eq!(uniforms.params.technique, AoTechnique::RayMarching.id());
        assert_eq!(uniforms.near, 0.1);
        // Half resolution by default
        assert_eq!(uniforms.params.resolution, [320.0, 240.0]);
    }
}

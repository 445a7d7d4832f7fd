//! Two-pass separable bilateral blur for the AO buffer.

use lumina_core::{BilateralBlurConfig, BilateralParameters, BlurDirection};

use crate::ao_pass::AO_FORMAT;
use crate::render_targets::{RenderTargetDesc, RenderTargetPool};
use crate::shader::{self, ShaderBuilder};

const BILATERAL_BLUR_WGSL: &str = include_str!("shaders/bilateral_blur.wgsl");

/// Bilateral parameters plus the clip planes needed to linearize depth.
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
#[allow(clippy::pub_underscore_fields)]
pub struct BilateralUniforms {
    pub params: BilateralParameters,
    pub near: f32,
    pub far: f32,
    pub _padding: [f32; 2],
}

/// Depth-aware blur: horizontal into a pooled temporary, vertical into the destination.
pub struct BilateralBlurPass {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    horizontal_buffer: wgpu::Buffer,
    vertical_buffer: wgpu::Buffer,
    sampler: wgpu::Sampler,
}

impl BilateralBlurPass {
    /// Creates the blur pipeline.
    pub fn new(device: &wgpu::Device) -> crate::error::RenderResult<Self> {
        let module = ShaderBuilder::fullscreen("Bilateral Blur Shader", BILATERAL_BLUR_WGSL).build_module(device)?;

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Bilateral Blur Bind Group Layout"),
            entries: &[
                shader::uniform_entry(0),
                shader::texture_entry(1),
                shader::depth_entry(2),
                shader::sampler_entry(3),
            ],
        });

        let pipeline = shader::fullscreen_pipeline(
            device,
            "Bilateral Blur Pipeline",
            &module,
            "fs_main",
            &bind_group_layout,
            AO_FORMAT,
            None,
        );

        let uniform_buffer = |label| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size: std::mem::size_of::<BilateralUniforms>() as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        };

        Ok(Self {
            pipeline,
            bind_group_layout,
            horizontal_buffer: uniform_buffer("Bilateral Blur Horizontal Uniforms"),
            vertical_buffer: uniform_buffer("Bilateral Blur Vertical Uniforms"),
            sampler: shader::clamp_sampler(device, "Bilateral Blur Sampler", wgpu::FilterMode::Nearest),
        })
    }

    /// Uploads both directions for an AO target of `width` x `height`.
    pub fn update(
        &self,
        queue: &wgpu::Queue,
        config: &BilateralBlurConfig,
        width: u32,
        height: u32,
        near: f32,
        far: f32,
    ) {
        for (direction, buffer) in [
            (BlurDirection::Horizontal, &self.horizontal_buffer),
            (BlurDirection::Vertical, &self.vertical_buffer),
        ] {
            let uniforms = BilateralUniforms {
                params: config.parameters(direction, width, height),
                near,
                far,
                _padding: [0.0; 2],
            };
            crate::buffer::update_uniform(queue, buffer, &uniforms);
        }
    }

    fn bind_group(
        &self,
        device: &wgpu::Device,
        uniforms: &wgpu::Buffer,
        source: &wgpu::TextureView,
        depth: &wgpu::TextureView,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Bilateral Blur Bind Group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniforms.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(source),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(depth),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        })
    }

    /// Blurs `source` into `destination`, both `width` x `height` AO targets.
    #[allow(clippy::too_many_arguments)]
    pub fn apply(
        &self,
        device: &wgpu::Device,
        encoder: &mut wgpu::CommandEncoder,
        pool: &mut RenderTargetPool,
        source: &wgpu::TextureView,
        depth: &wgpu::TextureView,
        destination: &wgpu::TextureView,
        width: u32,
        height: u32,
    ) {
        let temp = pool.fetch(device, RenderTargetDesc::sampled(width, height, AO_FORMAT));

        let horizontal = self.bind_group(device, &self.horizontal_buffer, source, depth);
        shader::draw_fullscreen(
            encoder,
            "Bilateral Blur Horizontal",
            &temp.view,
            wgpu::Color::WHITE,
            &self.pipeline,
            &horizontal,
        );

        let vertical = self.bind_group(device, &self.vertical_buffer, &temp.view, depth);
        shader::draw_fullscreen(
            encoder,
            "Bilateral Blur Vertical",
            destination,
            wgpu::Color::WHITE,
            &self.pipeline,
            &vertical,
        );

        pool.release(temp);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bilateral_uniforms_layout() {
        assert_eq!(std::mem::size_of::<BilateralParameters>(), 32);
        assert_eq!(std::mem::size_of::<BilateralUniforms>(), 48);
    }
}

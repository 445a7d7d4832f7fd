//! Separable Gaussian blur pass.

use glam::Vec2;
use lumina_core::{BlurConfig, BlurDirection, GaussianParameters};

use crate::render_targets::{RenderTargetDesc, RenderTargetPool};
use crate::shader::{self, ShaderBuilder};

const GAUSSIAN_BLUR_WGSL: &str = include_str!("shaders/gaussian_blur.wgsl");

/// Gaussian blur for targets of one color format.
pub struct BlurPass {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    horizontal_buffer: wgpu::Buffer,
    vertical_buffer: wgpu::Buffer,
    sampler: wgpu::Sampler,
    format: wgpu::TextureFormat,
    passes: u32,
}

impl BlurPass {
    /// Creates a blur pass writing `format` targets.
    pub fn new(device: &wgpu::Device, format: wgpu::TextureFormat) -> crate::error::RenderResult<Self> {
        let module = ShaderBuilder::fullscreen("Gaussian Blur Shader", GAUSSIAN_BLUR_WGSL).build_module(device)?;

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Gaussian Blur Bind Group Layout"),
            entries: &[
                shader::uniform_entry(0),
                shader::texture_entry(1),
                shader::sampler_entry(2),
            ],
        });

        let pipeline = shader::fullscreen_pipeline(
            device,
            "Gaussian Blur Pipeline",
            &module,
            "fs_main",
            &bind_group_layout,
            format,
            None,
        );

        let uniform_buffer = |label| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size: std::mem::size_of::<GaussianParameters>() as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        };

        Ok(Self {
            pipeline,
            bind_group_layout,
            horizontal_buffer: uniform_buffer("Gaussian Blur Horizontal Uniforms"),
            vertical_buffer: uniform_buffer("Gaussian Blur Vertical Uniforms"),
            sampler: shader::clamp_sampler(device, "Gaussian Blur Sampler", wgpu::FilterMode::Nearest),
            format,
            passes: 1,
        })
    }

    /// Uploads the kernel for targets of `width` x `height`.
    pub fn update(
        &mut self,
        queue: &wgpu::Queue,
        config: &BlurConfig,
        width: u32,
        height: u32,
    ) -> lumina_core::Result<()> {
        config.validate()?;
        let kernel = config.kernel()?;
        let inv_resolution = Vec2::new(1.0 / width.max(1) as f32, 1.0 / height.max(1) as f32);
        for (direction, buffer) in [
            (BlurDirection::Horizontal, &self.horizontal_buffer),
            (BlurDirection::Vertical, &self.vertical_buffer),
        ] {
            crate::buffer::update_uniform(queue, buffer, &kernel.to_gpu(direction, inv_resolution));
        }
        self.passes = config.passes;
        Ok(())
    }

    fn bind_group(&self, device: &wgpu::Device, uniforms: &wgpu::Buffer, source: &wgpu::TextureView) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Gaussian Blur Bind Group"),
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
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        })
    }

    /// Blurs `source` into `destination`, repeating the separable pair for
    /// the configured number of passes. With more than one pass the
    /// destination is read back, so it must be sampleable.
    #[allow(clippy::too_many_arguments)]
    pub fn apply(
        &self,
        device: &wgpu::Device,
        encoder: &mut wgpu::CommandEncoder,
        pool: &mut RenderTargetPool,
        source: &wgpu::TextureView,
        destination: &wgpu::TextureView,
        width: u32,
        height: u32,
    ) {
        let temp = pool.fetch(device, RenderTargetDesc::sampled(width, height, self.format));

        for pass in 0..self.passes.max(1) {
            let input = if pass == 0 { source } else { destination };
            let horizontal = self.bind_group(device, &self.horizontal_buffer, input);
            shader::draw_fullscreen(
                encoder,
                "Gaussian Blur Horizontal",
                &temp.view,
                wgpu::Color::TRANSPARENT,
                &self.pipeline,
                &horizontal,
            );

            let vertical = self.bind_group(device, &self.vertical_buffer, &temp.view);
            shader::draw_fullscreen(
                encoder,
                "Gaussian Blur Vertical",
                destination,
                wgpu::Color::TRANSPARENT,
                &self.pipeline,
                &vertical,
            );
        }

        pool.release(temp);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gaussian_parameters_layout() {
        assert_eq!(std::mem::size_of::<GaussianParameters>(), 256);
    }
}

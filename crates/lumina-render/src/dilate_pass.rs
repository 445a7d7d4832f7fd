//! Separable max-filter (dilate) pass.

use lumina_core::{BlurDirection, DilateConfig, DilateParameters};

use crate::render_targets::{RenderTargetDesc, RenderTargetPool};
use crate::shader::{self, ShaderBuilder};

const DILATE_WGSL: &str = include_str!("shaders/dilate.wgsl");

/// Grows bright regions of a mask by a configurable width.
pub struct DilatePass {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    horizontal_buffer: wgpu::Buffer,
    vertical_buffer: wgpu::Buffer,
    sampler: wgpu::Sampler,
    format: wgpu::TextureFormat,
}

impl DilatePass {
    /// Creates a dilate pass writing `format` targets.
    pub fn new(device: &wgpu::Device, format: wgpu::TextureFormat) -> crate::error::RenderResult<Self> {
        let module = ShaderBuilder::fullscreen("Dilate Shader", DILATE_WGSL).build_module(device)?;

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Dilate Bind Group Layout"),
            entries: &[
                shader::uniform_entry(0),
                shader::texture_entry(1),
                shader::sampler_entry(2),
            ],
        });

        let pipeline = shader::fullscreen_pipeline(
            device,
            "Dilate Pipeline",
            &module,
            "fs_main",
            &bind_group_layout,
            format,
            None,
        );

        let uniform_buffer = |label| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size: std::mem::size_of::<DilateParameters>() as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        };

        Ok(Self {
            pipeline,
            bind_group_layout,
            horizontal_buffer: uniform_buffer("Dilate Horizontal Uniforms"),
            vertical_buffer: uniform_buffer("Dilate Vertical Uniforms"),
            // Nearest filtering so the max never mixes neighbours
            sampler: shader::clamp_sampler(device, "Dilate Sampler", wgpu::FilterMode::Nearest),
            format,
        })
    }

    /// Uploads both directions for targets of `width` x `height`.
    pub fn update(
        &self,
        queue: &wgpu::Queue,
        config: &DilateConfig,
        width: u32,
        height: u32,
    ) -> lumina_core::Result<()> {
        config.validate()?;
        for (direction, buffer) in [
            (BlurDirection::Horizontal, &self.horizontal_buffer),
            (BlurDirection::Vertical, &self.vertical_buffer),
        ] {
            crate::buffer::update_uniform(queue, buffer, &config.parameters(direction, width, height));
        }
        Ok(())
    }

    fn bind_group(&self, device: &wgpu::Device, uniforms: &wgpu::Buffer, source: &wgpu::TextureView) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Dilate Bind Group"),
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

    /// Dilates `source` into `destination`.
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

        let horizontal = self.bind_group(device, &self.horizontal_buffer, source);
        shader::draw_fullscreen(
            encoder,
            "Dilate Horizontal",
            &temp.view,
            wgpu::Color::TRANSPARENT,
            &self.pipeline,
            &horizontal,
        );

        let vertical = self.bind_group(device, &self.vertical_buffer, &temp.view);
        shader::draw_fullscreen(
            encoder,
            "Dilate Vertical",
            destination,
            wgpu::Color::TRANSPARENT,
            &self.pipeline,
            &vertical,
        );

        pool.release(temp);
    }
}

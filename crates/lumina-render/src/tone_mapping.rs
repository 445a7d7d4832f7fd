//! Tone mapping post-processing pass.

use lumina_core::ToneMappingConfig;

use crate::shader::{self, ShaderBuilder};

const TONE_MAP_WGSL: &str = include_str!("shaders/tone_map.wgsl");

/// GPU representation of tone mapping uniforms.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ToneMapUniforms {
    pub exposure: f32,
    pub white_level: f32,
    pub gamma: f32,
    /// Gamma the output format applies on store (2.2 for sRGB, else 1.0).
    pub display_gamma: f32,
}

impl ToneMapUniforms {
    /// Builds uniforms for a config and an output format.
    #[must_use]
    pub fn new(config: &ToneMappingConfig, output_format: wgpu::TextureFormat) -> Self {
        Self {
            exposure: config.exposure,
            white_level: config.white_level,
            gamma: config.gamma,
            display_gamma: if output_format.is_srgb() { 2.2 } else { 1.0 },
        }
    }
}

impl Default for ToneMapUniforms {
    fn default() -> Self {
        Self::new(&ToneMappingConfig::default(), wgpu::TextureFormat::Rgba8Unorm)
    }
}

/// Tone mapping render resources.
pub struct ToneMapPass {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    uniform_buffer: wgpu::Buffer,
    sampler: wgpu::Sampler,
    output_format: wgpu::TextureFormat,
}

impl ToneMapPass {
    /// Creates a new tone mapping pass.
    pub fn new(device: &wgpu::Device, output_format: wgpu::TextureFormat) -> crate::error::RenderResult<Self> {
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Tone Map Bind Group Layout"),
            entries: &[
                // HDR input
                shader::texture_entry(0),
                shader::sampler_entry(1),
                shader::uniform_entry(2),
            ],
        });

        let module = ShaderBuilder::fullscreen("Tone Map Shader", TONE_MAP_WGSL).build_module(device)?;
        let pipeline = shader::fullscreen_pipeline(
            device,
            "Tone Map Pipeline",
            &module,
            "fs_main",
            &bind_group_layout,
            output_format,
            None,
        );

        let uniform_buffer = crate::buffer::create_uniform_buffer(
            device,
            &ToneMapUniforms::new(&ToneMappingConfig::default(), output_format),
            Some("Tone Map Uniform Buffer"),
        );
        let sampler = shader::clamp_sampler(device, "Tone Map Sampler", wgpu::FilterMode::Linear);

        Ok(Self {
            pipeline,
            bind_group_layout,
            uniform_buffer,
            sampler,
            output_format,
        })
    }

    /// Format the pass writes.
    #[must_use]
    pub fn output_format(&self) -> wgpu::TextureFormat {
        self.output_format
    }

    /// Updates the tone mapping uniforms.
    pub fn update_uniforms(&self, queue: &wgpu::Queue, config: &ToneMappingConfig) {
        let uniforms = ToneMapUniforms::new(config, self.output_format);
        crate::buffer::update_uniform(queue, &self.uniform_buffer, &uniforms);
    }

    /// Creates a bind group for rendering.
    #[must_use]
    pub fn create_bind_group(&self, device: &wgpu::Device, input_view: &wgpu::TextureView) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Tone Map Bind Group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(input_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: self.uniform_buffer.as_entire_binding(),
                },
            ],
        })
    }

    /// Renders the tone mapping pass.
    pub fn render(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        output_view: &wgpu::TextureView,
        bind_group: &wgpu::BindGroup,
    ) {
        shader::draw_fullscreen(
            encoder,
            "Tone Map Pass",
            output_view,
            wgpu::Color::BLACK,
            &self.pipeline,
            bind_group,
        );
    }

    /// Renders tone mapping from input HDR texture to output texture.
    /// Convenience method that creates a bind group and renders in one call.
    pub fn render_to_target(
        &self,
        device: &wgpu::Device,
        encoder: &mut wgpu::CommandEncoder,
        input_view: &wgpu::TextureView,
        output_view: &wgpu::TextureView,
    ) {
        let bind_group = self.create_bind_group(device, input_view);
        self.render(encoder, output_view, &bind_group);
    }
}

/// CPU version of the tone curve, used by tests and image tools.
#[must_use]
pub fn tone_map_value(value: f32, config: &ToneMappingConfig) -> f32 {
    let c = (value * config.exposure).max(0.0);
    let white_sq = config.white_level * config.white_level;
    let mapped = c * (1.0 + c / white_sq) / (1.0 + c);
    mapped.clamp(0.0, 1.0).powf(1.0 / config.gamma)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_gamma_follows_format() {
        let config = ToneMappingConfig::default();
        let srgb = ToneMapUniforms::new(&config, wgpu::TextureFormat::Rgba8UnormSrgb);
        let linear = ToneMapUniforms::new(&config, wgpu::TextureFormat::Bgra8Unorm);
        assert_eq!(srgb.display_gamma, 2.2);
        assert_eq!(linear.display_gamma, 1.0);
        assert_eq!(std::mem::size_of::<ToneMapUniforms>(), 16);
    }

    #[test]
    fn test_tone_curve() {
        let config = ToneMappingConfig::default().with_white_level(4.0).with_gamma(1.0);
        assert_eq!(tone_map_value(0.0, &config), 0.0);
        // White level maps to exactly one
        assert!((tone_map_value(4.0, &config) - 1.0).abs() < 1e-6);
        let a = tone_map_value(0.5, &config);
        let b = tone_map_value(1.0, &config);
        assert!(a < b && b < 1.0);
        let brighter = tone_map_value(0.5, &config.with_exposure(2.0));
        assert!((brighter - b).abs() < 1e-6);
    }
}

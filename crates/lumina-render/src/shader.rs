//! Shader assembly and shared pipeline helpers.

use crate::error::{RenderError, RenderResult};

/// Fullscreen-triangle vertex stage shared by every post-processing pass.
pub const FULLSCREEN_WGSL: &str = include_str!("shaders/fullscreen.wgsl");

/// Builder that concatenates WGSL sources into one shader module.
///
/// WGSL has no include mechanism, so shared declarations are prepended as
/// plain text: includes first, then the vertex stage, then the fragment stage.
pub struct ShaderBuilder {
    includes: Vec<&'static str>,
    vertex_source: Option<String>,
    fragment_source: Option<String>,
    label: Option<String>,
}

impl ShaderBuilder {
    /// Creates a new shader builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            includes: Vec::new(),
            vertex_source: None,
            fragment_source: None,
            label: None,
        }
    }

    /// Starts a builder for a fullscreen pass with the shared vertex stage.
    #[must_use]
    pub fn fullscreen(label: &str, fragment: &str) -> Self {
        Self::new()
            .with_label(label)
            .with_vertex(FULLSCREEN_WGSL)
            .with_fragment(fragment)
    }

    /// Prepends a block of shared declarations.
    #[must_use]
    pub fn with_include(mut self, source: &'static str) -> Self {
        self.includes.push(source);
        self
    }

    /// Sets the vertex shader source (WGSL).
    #[must_use]
    pub fn with_vertex(mut self, source: impl Into<String>) -> Self {
        self.vertex_source = Some(source.into());
        self
    }

    /// Sets the fragment shader source (WGSL).
    #[must_use]
    pub fn with_fragment(mut self, source: impl Into<String>) -> Self {
        self.fragment_source = Some(source.into());
        self
    }

    /// Sets the shader label for debugging.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Builds the shader module (does not create pipeline).
    pub fn build_module(self, device: &wgpu::Device) -> RenderResult<wgpu::ShaderModule> {
        let source = self.combined_source()?;
        Ok(device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: self.label.as_deref(),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        }))
    }

    /// Returns the concatenated WGSL source.
    pub fn combined_source(&self) -> RenderResult<String> {
        let vertex = self
            .vertex_source
            .as_ref()
            .ok_or_else(|| RenderError::ShaderCompilationFailed("missing vertex shader".into()))?;

        let fragment = self.fragment_source.as_ref().ok_or_else(|| {
            RenderError::ShaderCompilationFailed("missing fragment shader".into())
        })?;

        let mut parts: Vec<&str> = self.includes.clone();
        parts.push(vertex);
        // If sources are the same file, only emit it once
        if vertex != fragment {
            parts.push(fragment);
        }
        Ok(parts.join("\n\n"))
    }
}

impl Default for ShaderBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs `create` inside a validation error scope.
///
/// Shader translation failures on backends with narrower support (GL) are
/// reported as [`RenderError::ShaderCompilationFailed`] instead of reaching the
/// device's uncaptured error handler.
pub fn validated<T>(
    device: &wgpu::Device,
    label: &str,
    create: impl FnOnce() -> RenderResult<T>,
) -> RenderResult<T> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let created = create();
    let error = pollster::block_on(device.pop_error_scope());
    let value = created?;
    match error {
        Some(err) => {
            log::error!("{label} failed validation: {err}");
            Err(RenderError::ShaderCompilationFailed(format!("{label}: {err}")))
        }
        None => Ok(value),
    }
}

/// Bind group layout entry for a fragment-stage uniform buffer.
#[must_use]
pub fn uniform_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

/// Bind group layout entry for a filterable 2D float texture.
#[must_use]
pub fn texture_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

/// Bind group layout entry for a depth texture read with `textureLoad`.
///
/// Depth is bound as an unfilterable float texture (`texture_2d<f32>` in WGSL);
/// the GL backend cannot load from `texture_depth_2d`.
#[must_use]
pub fn depth_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: false },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

/// Bind group layout entry for a filtering sampler.
#[must_use]
pub fn sampler_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
    }
}

/// Creates a clamped sampler with the given filter.
#[must_use]
pub fn clamp_sampler(device: &wgpu::Device, label: &str, filter: wgpu::FilterMode) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some(label),
        mag_filter: filter,
        min_filter: filter,
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        ..Default::default()
    })
}

/// Creates a fullscreen-triangle pipeline writing a single color target.
#[must_use]
pub fn fullscreen_pipeline(
    device: &wgpu::Device,
    label: &str,
    module: &wgpu::ShaderModule,
    fragment_entry: &str,
    bind_group_layout: &wgpu::BindGroupLayout,
    format: wgpu::TextureFormat,
    blend: Option<wgpu::BlendState>,
) -> wgpu::RenderPipeline {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(label),
        bind_group_layouts: &[bind_group_layout],
        push_constant_ranges: &[],
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module,
            entry_point: Some("vs_main"),
            buffers: &[],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module,
            entry_point: Some(fragment_entry),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            ..Default::default()
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

/// Draws a fullscreen triangle into `target`, clearing it first.
pub fn draw_fullscreen(
    encoder: &mut wgpu::CommandEncoder,
    label: &str,
    target: &wgpu::TextureView,
    clear: wgpu::Color,
    pipeline: &wgpu::RenderPipeline,
    bind_group: &wgpu::BindGroup,
) {
    let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(label),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: target,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(clear),
                store: wgpu::StoreOp::Store,
            },
            depth_slice: None,
        })],
        depth_stencil_attachment: None,
        ..Default::default()
    });

    render_pass.set_pipeline(pipeline);
    render_pass.set_bind_group(0, bind_group, &[]);
    render_pass.draw(0..3, 0..1); // Fullscreen triangle
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A device on any available adapter, or `None` on machines without one.
    fn test_device() -> Option<wgpu::Device> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions::default())).ok()?;
        let (device, _queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor::default())).ok()?;
        Some(device)
    }

    #[test]
    fn test_validated_reports_invalid_shader() {
        let Some(device) = test_device() else {
            eprintln!("Skipping test: no GPU adapter available");
            return;
        };
        let result = validated(&device, "broken shader", || {
            Ok(device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("broken shader"),
                source: wgpu::ShaderSource::Wgsl("@fragment fn fs_main( -> @location(0) vec4<f32> {".into()),
            }))
        });
        assert!(matches!(result, Err(RenderError::ShaderCompilationFailed(_))));
    }

    #[test]
    fn test_depth_reading_passes_validate() {
        let Some(device) = test_device() else {
            eprintln!("Skipping test: no GPU adapter available");
            return;
        };
        assert!(validated(&device, "lighting pass", || crate::lighting::LightingPass::new(&device)).is_ok());
        assert!(validated(&device, "ao pass", || crate::ao_pass::AoPass::new(&device)).is_ok());
        assert!(validated(&device, "bilateral pass", || crate::bilateral_blur_pass::BilateralBlurPass::new(&device)).is_ok());
    }

    #[test]
    fn test_combined_source_order() {
        let source = ShaderBuilder::new()
            .with_include("// common")
            .with_vertex("// vertex")
            .with_fragment("// fragment")
            .combined_source()
            .unwrap();
        assert_eq!(source, "// common\n\n// vertex\n\n// fragment");
    }

    #[test]
    fn test_same_source_emitted_once() {
        let source = ShaderBuilder::new()
            .with_vertex("// both")
            .with_fragment("// both")
            .combined_source()
            .unwrap();
        assert_eq!(source, "// both");
    }

    #[test]
    fn test_missing_stage() {
        assert!(ShaderBuilder::new()
            .with_vertex("// vertex")
            .combined_source()
            .is_err());
        assert!(ShaderBuilder::fullscreen("x", "// f")
            .combined_source()
            .unwrap()
            .contains("vs_main"));
    }
}

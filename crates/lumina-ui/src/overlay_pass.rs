//! Draws a [`DrawList`] over the rendered frame.

use lumina_render::{Overlay, OverlayContext, ShaderBuilder};

use crate::draw::{tessellate, DrawList, Mesh, UiVertex};

const OVERLAY_WGSL: &str = include_str!("shaders/overlay.wgsl");
const INITIAL_VERTEX_CAPACITY: u64 = 4096;

/// GPU representation of the overlay uniforms.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct OverlayUniforms {
    pub screen_size: [f32; 2],
    /// 1.0 when the shader must encode sRGB itself.
    pub encode_srgb: f32,
    pub _padding: f32,
}

impl OverlayUniforms {
    #[must_use]
    pub fn new(width: u32, height: u32, format: wgpu::TextureFormat) -> Self {
        Self {
            screen_size: [width.max(1) as f32, height.max(1) as f32],
            encode_srgb: if format.is_srgb() { 0.0 } else { 1.0 },
            _padding: 0.0,
        }
    }
}

impl UiVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x4];

    #[must_use]
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

struct OverlayPipeline {
    format: wgpu::TextureFormat,
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl OverlayPipeline {
    fn new(device: &wgpu::Device, format: wgpu::TextureFormat) -> lumina_render::RenderResult<Self> {
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("UI Overlay Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let module = ShaderBuilder::new()
            .with_label("UI Overlay Shader")
            .with_vertex(OVERLAY_WGSL)
            .with_fragment(OVERLAY_WGSL)
            .build_module(device)?;
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("UI Overlay Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("UI Overlay Pipeline"),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &module,
                entry_point: Some("vs_main"),
                buffers: &[UiVertex::layout()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &module,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });
        let uniform_buffer = lumina_render::buffer::create_uniform_buffer(
            device,
            &OverlayUniforms::new(1, 1, format),
            Some("UI Overlay Uniform Buffer"),
        );
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("UI Overlay Bind Group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });
        Ok(Self {
            format,
            pipeline,
            uniform_buffer,
            bind_group,
        })
    }
}

/// [`Overlay`] that renders the widget tree's draw list.
///
/// The pipeline is built on first use for the target format and rebuilt if
/// the format changes. The vertex buffer grows to fit and is reused.
#[derive(Default)]
pub struct UiOverlay {
    draw_list: DrawList,
    pipeline: Option<OverlayPipeline>,
    vertex_buffer: Option<(wgpu::Buffer, u64)>,
}

impl UiOverlay {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces what the next frame draws.
    pub fn set_draw_list(&mut self, draw_list: DrawList) {
        self.draw_list = draw_list;
    }

    #[must_use]
    pub fn draw_list(&self) -> &DrawList {
        &self.draw_list
    }

    /// Returns false if no pipeline could be built.
    fn ensure_pipeline(&mut self, device: &wgpu::Device, format: wgpu::TextureFormat) -> bool {
        if self.pipeline.as_ref().is_none_or(|p| p.format != format) {
            match OverlayPipeline::new(device, format) {
                Ok(pipeline) => {
                    log::debug!("Built UI overlay pipeline for {format:?}");
                    self.pipeline = Some(pipeline);
                }
                Err(err) => {
                    log::error!("Failed to build UI overlay pipeline: {err}");
                    self.pipeline = None;
                }
            }
        }
        self.pipeline.is_some()
    }

    fn upload(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, mesh: &Mesh) {
        let needed = mesh.vertices.len() as u64;
        if self.vertex_buffer.as_ref().is_none_or(|(_, capacity)| *capacity < needed) {
            let capacity = needed.next_power_of_two().max(INITIAL_VERTEX_CAPACITY);
            let buffer = device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("UI Overlay Vertex Buffer"),
                size: capacity * std::mem::size_of::<UiVertex>() as u64,
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            self.vertex_buffer = Some((buffer, capacity));
        }
        if let Some((buffer, _)) = &self.vertex_buffer {
            queue.write_buffer(buffer, 0, bytemuck::cast_slice(&mesh.vertices));
        }
    }
}

impl Overlay for UiOverlay {
    fn draw(&mut self, context: &OverlayContext<'_>, encoder: &mut wgpu::CommandEncoder, target: &wgpu::TextureView) {
        let mesh = tessellate(&self.draw_list, context.width, context.height);
        if mesh.vertices.is_empty() {
            return;
        }
        self.upload(context.device, context.queue, &mesh);
        if !self.ensure_pipeline(context.device, context.format) {
            return;
        }
        let (Some(pipeline), Some((vertex_buffer, _))) = (&self.pipeline, &self.vertex_buffer) else {
            return;
        };
        lumina_render::buffer::update_uniform(
            context.queue,
            &pipeline.uniform_buffer,
            &OverlayUniforms::new(context.width, context.height, context.format),
        );

        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("UI Overlay Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            ..Default::default()
        });
        render_pass.set_pipeline(&pipeline.pipeline);
        render_pass.set_bind_group(0, &pipeline.bind_group, &[]);
        render_pass.set_vertex_buffer(0, vertex_buffer.slice(..));
        for batch in &mesh.batches {
            let [x, y, w, h] = batch.scissor.unwrap_or([0, 0, context.width, context.height]);
            render_pass.set_scissor_rect(x, y, w, h);
            render_pass.draw(batch.first_vertex..batch.first_vertex + batch.vertex_count, 0..1);
        }
    }
}

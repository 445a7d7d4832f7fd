//! Material passes: G-buffer fill, forward car paint and forward transparency.
//!
//! Every opaque object (deferred and car paint alike) is written to the
//! G-buffer so ambient occlusion sees it. Car paint is then re-shaded in a
//! forward pass on top of the lit image with an `LessEqual` depth test against
//! the G-buffer depth. Transparent objects come last, blended and without
//! depth writes.

use std::num::NonZeroU64;

use glam::Mat4;

use crate::buffer::{MeshBuffers, Vertex};
use crate::camera::CameraUniforms;
use crate::gbuffer::{GBuffer, DEPTH_FORMAT, NORMAL_FORMAT, ALBEDO_FORMAT};
use crate::materials::{Material, MaterialUniforms};
use crate::shader::ShaderBuilder;

/// Format of the HDR color target the forward passes draw into.
pub const HDR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

const MESH_COMMON_WGSL: &str = include_str!("shaders/mesh_common.wgsl");
const GBUFFER_WGSL: &str = include_str!("shaders/gbuffer.wgsl");
const FORWARD_WGSL: &str = include_str!("shaders/forward.wgsl");
/// Lighting declarations shared with the deferred lighting pass.
pub const LIGHTING_COMMON_WGSL: &str = include_str!("shaders/lighting_common.wgsl");

/// Per-object uniforms, addressed with a dynamic offset.
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ObjectUniforms {
    pub model: [[f32; 4]; 4],
    /// Inverse transpose of the model matrix.
    pub normal_matrix: [[f32; 4]; 4],
    pub material: MaterialUniforms,
}

impl ObjectUniforms {
    /// Packs a transform and a material.
    #[must_use]
    pub fn new(model: Mat4, material: &Material) -> Self {
        let normal_matrix = if model.determinant().abs() > f32::EPSILON {
            model.inverse().transpose()
        } else {
            model
        };
        Self {
            model: model.to_cols_array_2d(),
            normal_matrix: normal_matrix.to_cols_array_2d(),
            material: MaterialUniforms::from(material),
        }
    }
}

/// One draw: a mesh and the slot of its uniforms in the object buffer.
#[derive(Clone, Copy)]
pub struct DrawItem<'a> {
    pub mesh: &'a MeshBuffers,
    pub slot: u32,
}

/// Which forward pipeline to draw with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForwardKind {
    CarPaint,
    Transparent,
}

/// Rounds `size` up to a multiple of `alignment`.
#[must_use]
pub fn align_to(size: u64, alignment: u64) -> u64 {
    size.div_ceil(alignment) * alignment
}

/// Material pipelines and the camera and object uniforms they share.
pub struct MaterialPass {
    gbuffer_pipeline: wgpu::RenderPipeline,
    car_paint_pipeline: wgpu::RenderPipeline,
    transparent_pipeline: wgpu::RenderPipeline,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    object_layout: wgpu::BindGroupLayout,
    object_buffer: wgpu::Buffer,
    object_bind_group: wgpu::BindGroup,
    object_capacity: u64,
    object_stride: u64,
    forward_layout: wgpu::BindGroupLayout,
}

impl MaterialPass {
    /// Creates all material pipelines.
    pub fn new(device: &wgpu::Device) -> crate::error::RenderResult<Self> {
        let camera_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Material Camera Bind Group Layout"),
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

        let object_size = std::mem::size_of::<ObjectUniforms>() as u64;
        let object_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Material Object Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: NonZeroU64::new(object_size),
                },
                count: None,
            }],
        });

        let forward_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Forward Lighting Bind Group Layout"),
            entries: &[
                crate::shader::uniform_entry(0),
                crate::shader::texture_entry(1),
                crate::shader::sampler_entry(2),
                crate::shader::texture_entry(3),
            ],
        });

        let camera_buffer = crate::buffer::create_uniform_buffer(
            device,
            &CameraUniforms::default(),
            Some("Material Camera Uniforms"),
        );
        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Material Camera Bind Group"),
            layout: &camera_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        let alignment = u64::from(device.limits().min_uniform_buffer_offset_alignment);
        let object_stride = align_to(object_size, alignment);
        let object_capacity = 64;
        let (object_buffer, object_bind_group) =
            create_object_buffer(device, &object_layout, object_capacity, object_stride);

        let gbuffer_module = ShaderBuilder::new()
            .with_label("G-buffer Shader")
            .with_vertex(MESH_COMMON_WGSL)
            .with_fragment(GBUFFER_WGSL)
            .build_module(device)?;
        let forward_module = ShaderBuilder::new()
            .with_label("Forward Material Shader")
            .with_include(LIGHTING_COMMON_WGSL)
            .with_vertex(MESH_COMMON_WGSL)
            .with_fragment(FORWARD_WGSL)
            .build_module(device)?;

        let deferred_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("G-buffer Pipeline Layout"),
            bind_group_layouts: &[&camera_layout, &object_layout],
            push_constant_ranges: &[],
        });
        let forward_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Forward Pipeline Layout"),
                bind_group_layouts: &[&camera_layout, &object_layout, &forward_layout],
                push_constant_ranges: &[],
            });

        let gbuffer_targets = [
            Some(wgpu::ColorTargetState {
                format: NORMAL_FORMAT,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            }),
            Some(wgpu::ColorTargetState {
                format: ALBEDO_FORMAT,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            }),
        ];
        let gbuffer_pipeline = mesh_pipeline(
            device,
            "G-buffer Pipeline",
            &deferred_layout,
            &gbuffer_module,
            "fs_main",
            &gbuffer_targets,
            true,
            wgpu::CompareFunction::Less,
        );

        let car_paint_pipeline = mesh_pipeline(
            device,
            "Car Paint Pipeline",
            &forward_pipeline_layout,
            &forward_module,
            "fs_car_paint",
            &[Some(wgpu::ColorTargetState {
                format: HDR_FORMAT,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            false,
            wgpu::CompareFunction::LessEqual,
        );

        let transparent_pipeline = mesh_pipeline(
            device,
            "Transparent Pipeline",
            &forward_pipeline_layout,
            &forward_module,
            "fs_transparent",
            &[Some(wgpu::ColorTargetState {
                format: HDR_FORMAT,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            false,
            wgpu::CompareFunction::Less,
        );

        Ok(Self {
            gbuffer_pipeline,
            car_paint_pipeline,
            transparent_pipeline,
            camera_buffer,
            camera_bind_group,
            object_layout,
            object_buffer,
            object_bind_group,
            object_capacity,
            object_stride,
            forward_layout,
        })
    }

    /// Uploads the camera matrices.
    pub fn update_camera(&self, queue: &wgpu::Queue, camera: &CameraUniforms) {
        crate::buffer::update_uniform(queue, &self.camera_buffer, camera);
    }

    /// Uploads this frame's object uniforms. Slot `i` is `objects[i]`.
    pub fn write_objects(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, objects: &[ObjectUniforms]) {
        let needed = objects.len() as u64;
        if needed > self.object_capacity {
            let capacity = needed.next_power_of_two();
            log::debug!("growing object uniform buffer to {capacity} slots");
            let (buffer, bind_group) =
                create_object_buffer(device, &self.object_layout, capacity, self.object_stride);
            self.object_buffer = buffer;
            self.object_bind_group = bind_group;
            self.object_capacity = capacity;
        }

        let stride = self.object_stride as usize;
        let mut staging = vec![0u8; stride * objects.len()];
        for (chunk, object) in staging.chunks_exact_mut(stride).zip(objects) {
            let bytes = bytemuck::bytes_of(object);
            chunk[..bytes.len()].copy_from_slice(bytes);
        }
        if !staging.is_empty() {
            queue.write_buffer(&self.object_buffer, 0, &staging);
        }
    }

    /// Bind group for the forward passes.
    #[must_use]
    pub fn create_forward_bind_group(
        &self,
        device: &wgpu::Device,
        lighting_buffer: &wgpu::Buffer,
        environment_view: &wgpu::TextureView,
        sampler: &wgpu::Sampler,
        ao_view: &wgpu::TextureView,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Forward Lighting Bind Group"),
            layout: &self.forward_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: lighting_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(environment_view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(ao_view),
                },
            ],
        })
    }

    /// Fills the G-buffer, clearing it first.
    pub fn draw_gbuffer(&self, encoder: &mut wgpu::CommandEncoder, gbuffer: &GBuffer, items: &[DrawItem<'_>]) {
        let clear = wgpu::Operations {
            load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
            store: wgpu::StoreOp::Store,
        };
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("G-buffer Pass"),
            color_attachments: &[
                Some(wgpu::RenderPassColorAttachment {
                    view: &gbuffer.normal.view,
                    resolve_target: None,
                    ops: clear,
                    depth_slice: None,
                }),
                Some(wgpu::RenderPassColorAttachment {
                    view: &gbuffer.albedo.view,
                    resolve_target: None,
                    ops: clear,
                    depth_slice: None,
                }),
            ],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &gbuffer.depth.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            ..Default::default()
        });

        render_pass.set_pipeline(&self.gbuffer_pipeline);
        render_pass.set_bind_group(0, &self.camera_bind_group, &[]);
        self.draw_items(&mut render_pass, items);
    }

    /// Draws forward-shaded objects on top of the lit HDR image.
    pub fn draw_forward(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        kind: ForwardKind,
        hdr_view: &wgpu::TextureView,
        depth_view: &wgpu::TextureView,
        forward_bind_group: &wgpu::BindGroup,
        items: &[DrawItem<'_>],
    ) {
        if items.is_empty() {
            return;
        }
        let (label, pipeline) = match kind {
            ForwardKind::CarPaint => ("Car Paint Pass", &self.car_paint_pipeline),
            ForwardKind::Transparent => ("Transparency Pass", &self.transparent_pipeline),
        };
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(label),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: hdr_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            ..Default::default()
        });

        render_pass.set_pipeline(pipeline);
        render_pass.set_bind_group(0, &self.camera_bind_group, &[]);
        render_pass.set_bind_group(2, forward_bind_group, &[]);
        self.draw_items(&mut render_pass, items);
    }

    fn draw_items(&self, render_pass: &mut wgpu::RenderPass<'_>, items: &[DrawItem<'_>]) {
        for item in items {
            let offset = u64::from(item.slot) * self.object_stride;
            render_pass.set_bind_group(1, &self.object_bind_group, &[offset as u32]);
            item.mesh.draw(render_pass);
        }
    }
}

fn create_object_buffer(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    capacity: u64,
    stride: u64,
) -> (wgpu::Buffer, wgpu::BindGroup) {
    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Object Uniforms"),
        size: capacity * stride,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Object Bind Group"),
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                buffer: &buffer,
                offset: 0,
                size: NonZeroU64::new(std::mem::size_of::<ObjectUniforms>() as u64),
            }),
        }],
    });
    (buffer, bind_group)
}

#[allow(clippy::too_many_arguments)]
fn mesh_pipeline(
    device: &wgpu::Device,
    label: &str,
    layout: &wgpu::PipelineLayout,
    module: &wgpu::ShaderModule,
    fragment_entry: &str,
    targets: &[Option<wgpu::ColorTargetState>],
    depth_write_enabled: bool,
    depth_compare: wgpu::CompareFunction,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module,
            entry_point: Some("vs_main"),
            buffers: &[Vertex::layout()],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module,
            entry_point: Some(fragment_entry),
            targets,
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None, // Two-sided; shaders flip back-facing normals
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled,
            depth_compare,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

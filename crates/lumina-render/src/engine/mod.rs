//! The main rendering engine.

mod capture;
mod postprocessing;
mod rendering;
mod textures;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use lumina_core::Scene;

use crate::ao_pass::{AoPass, AO_FORMAT};
use crate::bilateral_blur_pass::BilateralBlurPass;
use crate::blur_pass::BlurPass;
use crate::buffer::MeshBuffers;
use crate::dilate_pass::DilatePass;
use crate::error::{RenderError, RenderResult};
use crate::gbuffer::GBuffer;
use crate::lighting::LightingPass;
use crate::material_pass::MaterialPass;
use crate::render_targets::RenderTargetPool;
use crate::shader::validated;
use crate::rgbm_texture::EnvironmentTexture;
use crate::tone_mapping::ToneMapPass;

pub use rendering::FrameStats;

/// Format of headless output targets.
pub const HEADLESS_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

/// What an [`Overlay`] gets to draw with.
pub struct OverlayContext<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    pub format: wgpu::TextureFormat,
    pub width: u32,
    pub height: u32,
}

/// Something drawn over the tone-mapped frame, such as the editor UI.
pub trait Overlay {
    /// Records draw commands that load and store `target`.
    fn draw(&mut self, context: &OverlayContext<'_>, encoder: &mut wgpu::CommandEncoder, target: &wgpu::TextureView);
}

struct CachedMesh {
    buffers: MeshBuffers,
    /// Vertex and index counts at upload, used to spot replaced meshes.
    fingerprint: (usize, usize),
}

/// The main rendering engine backed by wgpu.
pub struct RenderEngine {
    /// The wgpu instance.
    pub instance: wgpu::Instance,
    /// The wgpu adapter.
    pub adapter: wgpu::Adapter,
    /// The wgpu device.
    pub device: wgpu::Device,
    /// The wgpu queue.
    pub queue: wgpu::Queue,
    /// The render surface (None for headless).
    pub surface: Option<wgpu::Surface<'static>>,
    /// Surface configuration. Headless engines keep one too, for the output format and size.
    pub surface_config: wgpu::SurfaceConfiguration,
    width: u32,
    height: u32,
    gbuffer: GBuffer,
    pool: RenderTargetPool,
    material_pass: MaterialPass,
    lighting_pass: LightingPass,
    ao_pass: AoPass,
    bilateral_pass: BilateralBlurPass,
    tone_map_pass: ToneMapPass,
    blur_passes: HashMap<wgpu::TextureFormat, BlurPass>,
    dilate_passes: HashMap<wgpu::TextureFormat, DilatePass>,
    meshes: HashMap<String, CachedMesh>,
    warned_materials: HashSet<String>,
    /// Bound in place of AO when it is disabled.
    white_ao: (wgpu::Texture, wgpu::TextureView),
    environment: EnvironmentTexture,
    last_stats: FrameStats,
}

impl RenderEngine {
    /// Creates a new windowed render engine.
    pub async fn new_windowed(window: Arc<winit::window::Window>) -> RenderResult<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..wgpu::InstanceDescriptor::default()
        });

        let surface = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|_| RenderError::AdapterCreationFailed)?;

        let (device, queue) = request_device(&adapter, "lumina device").await?;

        let size = window.inner_size();
        let width = size.width.max(1);
        let height = size.height.max(1);

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or(RenderError::NoSurface)?;

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);
        log::info!(
            "windowed engine on {} ({:?}), surface {surface_format:?} {width}x{height}",
            adapter.get_info().name,
            adapter.get_info().backend
        );

        Self::with_device(instance, adapter, device, queue, Some(surface), surface_config)
    }

    /// Creates a render engine without a window, drawing into offscreen targets.
    pub async fn new_headless(width: u32, height: u32) -> RenderResult<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..wgpu::InstanceDescriptor::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .map_err(|_| RenderError::AdapterCreationFailed)?;

        let (device, queue) = request_device(&adapter, "lumina device (headless)").await?;

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            format: HEADLESS_FORMAT,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: wgpu::CompositeAlphaMode::Auto,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        log::info!(
            "headless engine on {} ({:?}), {}x{}",
            adapter.get_info().name,
            adapter.get_info().backend,
            surface_config.width,
            surface_config.height
        );

        Self::with_device(instance, adapter, device, queue, None, surface_config)
    }

    fn with_device(
        instance: wgpu::Instance,
        adapter: wgpu::Adapter,
        device: wgpu::Device,
        queue: wgpu::Queue,
        surface: Option<wgpu::Surface<'static>>,
        surface_config: wgpu::SurfaceConfiguration,
    ) -> RenderResult<Self> {
        let (width, height) = (surface_config.width, surface_config.height);
        let gbuffer = GBuffer::new(&device, width, height);
        let (material_pass, lighting_pass, ao_pass, bilateral_pass, tone_map_pass) =
            validated(&device, "render passes", || {
                Ok((
                    MaterialPass::new(&device)?,
                    LightingPass::new(&device)?,
                    AoPass::new(&device)?,
                    BilateralBlurPass::new(&device)?,
                    ToneMapPass::new(&device, surface_config.format)?,
                ))
            })?;
        let white_ao = textures::solid_texture(&device, &queue, "White AO", AO_FORMAT, &[255]);
        let environment = EnvironmentTexture::placeholder(&device, &queue);

        Ok(Self {
            instance,
            adapter,
            device,
            queue,
            surface,
            surface_config,
            width,
            height,
            gbuffer,
            pool: RenderTargetPool::new(),
            material_pass,
            lighting_pass,
            ao_pass,
            bilateral_pass,
            tone_map_pass,
            blur_passes: HashMap::new(),
            dilate_passes: HashMap::new(),
            meshes: HashMap::new(),
            warned_materials: HashSet::new(),
            white_ao,
            environment,
            last_stats: FrameStats::default(),
        })
    }

    /// Counts from the most recently rendered frame.
    #[must_use]
    pub fn last_frame_stats(&self) -> FrameStats {
        self.last_stats
    }

    /// Resizes every screen-sized resource. Zero sizes (minimized windows) are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 || (width, height) == (self.width, self.height) {
            return;
        }
        log::debug!("resizing engine to {width}x{height}");

        self.width = width;
        self.height = height;
        self.surface_config.width = width;
        self.surface_config.height = height;

        if let Some(ref surface) = self.surface {
            surface.configure(&self.device, &self.surface_config);
        }

        self.gbuffer.resize(&self.device, width, height);
        // Pooled targets are sized for the old resolution
        self.pool.clear();
    }

    /// Current output size in pixels.
    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Format of the surface or headless output.
    #[must_use]
    pub fn output_format(&self) -> wgpu::TextureFormat {
        self.surface_config.format
    }

    /// Whether the engine presents to a window.
    #[must_use]
    pub fn is_windowed(&self) -> bool {
        self.surface.is_some()
    }

    /// The G-buffer of the last frame.
    #[must_use]
    pub fn gbuffer(&self) -> &GBuffer {
        &self.gbuffer
    }

    /// Uploads meshes the cache lacks or whose size changed, and drops meshes
    /// the scene no longer has.
    pub fn sync_meshes(&mut self, scene: &Scene) {
        self.meshes.retain(|name, _| scene.mesh(name).is_some());
        for (name, mesh) in scene.meshes() {
            let fingerprint = (mesh.positions.len(), mesh.indices.len());
            if self.meshes.get(name).is_some_and(|cached| cached.fingerprint == fingerprint) {
                continue;
            }
            log::debug!("uploading mesh '{name}' ({} vertices)", fingerprint.0);
            let buffers = MeshBuffers::new(&self.device, mesh, name);
            self.meshes.insert(name.to_string(), CachedMesh { buffers, fingerprint });
        }
    }

    /// Forces a mesh to be uploaded again on the next frame.
    pub fn invalidate_mesh(&mut self, name: &str) {
        self.meshes.remove(name);
    }

    /// Number of meshes resident on the GPU.
    #[must_use]
    pub fn cached_mesh_count(&self) -> usize {
        self.meshes.len()
    }
}

async fn request_device(adapter: &wgpu::Adapter, label: &str) -> RenderResult<(wgpu::Device, wgpu::Queue)> {
    adapter
        .request_device(&wgpu::DeviceDescriptor {
            label: Some(label),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            memory_hints: wgpu::MemoryHints::default(),
            trace: wgpu::Trace::default(),
            experimental_features: wgpu::ExperimentalFeatures::default(),
        })
        .await
        .map_err(RenderError::from)
}

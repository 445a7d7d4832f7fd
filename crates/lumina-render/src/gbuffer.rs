//! Geometry buffer for deferred shading.

/// Depth format of the G-buffer, also used by the forward passes.
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
/// View-space normal in xyz, specular power in w (negative marks unlit surfaces).
pub const NORMAL_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;
/// Diffuse albedo in rgb, specular intensity in a.
pub const ALBEDO_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// A single G-buffer attachment.
pub struct GBufferTarget {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

impl GBufferTarget {
    fn new(device: &wgpu::Device, label: &str, width: u32, height: u32, format: wgpu::TextureFormat) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { texture, view }
    }
}

/// Depth, normal and albedo targets, always sized together.
pub struct GBuffer {
    pub depth: GBufferTarget,
    pub normal: GBufferTarget,
    pub albedo: GBufferTarget,
    width: u32,
    height: u32,
}

impl GBuffer {
    /// Creates the G-buffer. Zero sizes are clamped to 1.
    #[must_use]
    pub fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let (width, height) = (width.max(1), height.max(1));
        log::debug!("creating G-buffer {width}x{height}");
        Self {
            depth: GBufferTarget::new(device, "G-buffer depth", width, height, DEPTH_FORMAT),
            normal: GBufferTarget::new(device, "G-buffer normal", width, height, NORMAL_FORMAT),
            albedo: GBufferTarget::new(device, "G-buffer albedo", width, height, ALBEDO_FORMAT),
            width,
            height,
        }
    }

    /// Recreates every target if the size changed.
    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        if (width.max(1), height.max(1)) != (self.width, self.height) {
            *self = Self::new(device, width, height);
        }
    }

    /// Current size in pixels.
    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Color attachments in the order the G-buffer shader writes them.
    #[must_use]
    pub fn color_formats() -> [wgpu::TextureFormat; 2] {
        [NORMAL_FORMAT, ALBEDO_FORMAT]
    }
}

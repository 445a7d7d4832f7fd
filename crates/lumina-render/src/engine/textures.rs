use std::path::Path;

use lumina_core::{RgbmEncoding, SphericalHarmonicL2};

use super::RenderEngine;
use crate::environment::cubemap_from_equirect;
use crate::error::RenderResult;
use crate::rgbm_texture::{upload_texture, EnvironmentTexture, RgbmImage};

/// Cubemap edge used when projecting an environment onto SH.
const SH_PROJECTION_SIZE: usize = 32;

/// A 1x1 texture holding `texel`.
pub(super) fn solid_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    label: &str,
    format: wgpu::TextureFormat,
    texel: &[u8],
) -> (wgpu::Texture, wgpu::TextureView) {
    let bytes_per_texel = u32::try_from(texel.len()).unwrap_or(4);
    let texture = upload_texture(device, queue, label, format, 1, 1, texel, bytes_per_texel);
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}

impl RenderEngine {
    /// Binds an RGBM image as the environment map.
    pub fn set_environment_rgbm(&mut self, image: &RgbmImage) {
        self.environment = EnvironmentTexture::from_rgbm(&self.device, &self.queue, image);
    }

    /// Binds a linear HDR image as the environment map.
    pub fn set_environment_hdr(&mut self, image: &image::Rgb32FImage) {
        self.environment = EnvironmentTexture::from_hdr(&self.device, &self.queue, image);
    }

    /// Unbinds the environment map; reflections fall back to the ambient SH.
    pub fn clear_environment(&mut self) {
        self.environment = EnvironmentTexture::placeholder(&self.device, &self.queue);
    }

    /// Whether an environment map is bound.
    #[must_use]
    pub fn has_environment(&self) -> bool {
        self.environment.encoding.is_some()
    }

    /// Loads an equirectangular image, binds it RGBM-encoded as the environment
    /// map and returns its irradiance projected onto SH, for use as the
    /// scene's ambient light.
    pub fn load_environment(
        &mut self,
        path: impl AsRef<Path>,
        encoding: RgbmEncoding,
    ) -> RenderResult<SphericalHarmonicL2> {
        let path = path.as_ref();
        let image = image::open(path)?.to_rgb32f();
        let rgbm = RgbmImage::encode(image.width(), image.height(), image.as_raw(), encoding)?;
        self.set_environment_rgbm(&rgbm);

        let cubemap = cubemap_from_equirect(&image, SH_PROJECTION_SIZE)?;
        let sh = SphericalHarmonicL2::from_cubemap(&cubemap)?;
        log::info!(
            "loaded environment {} ({}x{})",
            path.display(),
            image.width(),
            image.height()
        );
        Ok(sh)
    }
}

//! HDR images on the GPU, stored either as RGBM-encoded 8-bit texels or as
//! half floats.

use std::path::Path;

use half::f16;
use lumina_core::RgbmEncoding;

use crate::error::RenderResult;
use crate::lighting::EnvironmentEncoding;

/// Format of RGBM textures. Not sRGB: the encoding handles its own gamma.
pub const RGBM_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
/// Format of linear HDR textures.
pub const HDR_TEXTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

/// An RGBM-encoded image held on the CPU.
#[derive(Debug, Clone, PartialEq)]
pub struct RgbmImage {
    pub width: u32,
    pub height: u32,
    /// Four bytes per texel, row-major.
    pub data: Vec<u8>,
    pub encoding: RgbmEncoding,
}

impl RgbmImage {
    /// Encodes tightly packed linear RGB floats.
    pub fn encode(width: u32, height: u32, rgb: &[f32], encoding: RgbmEncoding) -> RenderResult<Self> {
        let expected = width as usize * height as usize * 3;
        if rgb.len() != expected {
            return Err(lumina_core::LuminaError::SizeMismatch {
                expected,
                actual: rgb.len(),
            }
            .into());
        }
        Ok(Self {
            width,
            height,
            data: encoding.encode_image(rgb)?,
            encoding,
        })
    }

    /// Encodes a decoded image. 8-bit sources are treated as linear.
    pub fn from_image(image: &image::DynamicImage, encoding: RgbmEncoding) -> RenderResult<Self> {
        let rgb = image.to_rgb32f();
        Self::encode(rgb.width(), rgb.height(), rgb.as_raw(), encoding)
    }

    /// Loads and encodes an image file (Radiance `.hdr`, `.exr`, or any 8-bit format).
    pub fn from_path(path: impl AsRef<Path>, encoding: RgbmEncoding) -> RenderResult<Self> {
        let path = path.as_ref();
        let image = image::open(path)?;
        log::debug!("encoding {} as RGBM (range {})", path.display(), encoding.max_range);
        Self::from_image(&image, encoding)
    }

    /// Decodes back to linear RGB.
    pub fn decode(&self) -> RenderResult<image::Rgb32FImage> {
        let rgb = self.encoding.decode_image(&self.data)?;
        image::Rgb32FImage::from_raw(self.width, self.height, rgb).ok_or_else(|| {
            lumina_core::LuminaError::SizeMismatch {
                expected: self.width as usize * self.height as usize * 4,
                actual: self.data.len(),
            }
            .into()
        })
    }

    /// Uploads the encoded texels into a new sampled texture.
    #[must_use]
    pub fn upload(&self, device: &wgpu::Device, queue: &wgpu::Queue, label: &str) -> wgpu::Texture {
        upload_texture(device, queue, label, RGBM_FORMAT, self.width, self.height, &self.data, 4)
    }
}

/// Uploads linear RGB floats as a half-float texture.
#[must_use]
pub fn upload_hdr_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    label: &str,
    image: &image::Rgb32FImage,
) -> wgpu::Texture {
    let texels: Vec<f16> = image
        .pixels()
        .flat_map(|p| [f16::from_f32(p[0]), f16::from_f32(p[1]), f16::from_f32(p[2]), f16::ONE])
        .collect();
    upload_texture(
        device,
        queue,
        label,
        HDR_TEXTURE_FORMAT,
        image.width(),
        image.height(),
        bytemuck::cast_slice(&texels),
        8,
    )
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn upload_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    label: &str,
    format: wgpu::TextureFormat,
    width: u32,
    height: u32,
    data: &[u8],
    bytes_per_texel: u32,
) -> wgpu::Texture {
    let size = wgpu::Extent3d {
        width,
        height,
        depth_or_array_layers: 1,
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });

    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        data,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(width * bytes_per_texel),
            rows_per_image: Some(height),
        },
        size,
    );
    texture
}

/// The equirectangular environment map bound to the forward passes.
pub struct EnvironmentTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    /// `None` for the placeholder, which the shaders ignore.
    pub encoding: Option<EnvironmentEncoding>,
}

impl EnvironmentTexture {
    /// A 1x1 black placeholder used when no environment is loaded.
    #[must_use]
    pub fn placeholder(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let texture = upload_texture(
            device,
            queue,
            "Environment Placeholder",
            RGBM_FORMAT,
            1,
            1,
            &[0, 0, 0, 255],
            4,
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            texture,
            view,
            encoding: None,
        }
    }

    /// Wraps an uploaded RGBM image.
    #[must_use]
    pub fn from_rgbm(device: &wgpu::Device, queue: &wgpu::Queue, image: &RgbmImage) -> Self {
        let texture = image.upload(device, queue, "Environment (RGBM)");
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            texture,
            view,
            encoding: Some(EnvironmentEncoding::Rgbm(image.encoding)),
        }
    }

    /// Wraps a linear HDR image uploaded as half floats.
    #[must_use]
    pub fn from_hdr(device: &wgpu::Device, queue: &wgpu::Queue, image: &image::Rgb32FImage) -> Self {
        let texture = upload_hdr_texture(device, queue, "Environment (HDR)", image);
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            texture,
            view,
            encoding: Some(EnvironmentEncoding::Linear),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_checks_length() {
        assert!(RgbmImage::encode(2, 2, &[0.0; 11], RgbmEncoding::default()).is_err());
        let image = RgbmImage::encode(2, 1, &[0.5; 6], RgbmEncoding::default()).unwrap();
        assert_eq!(image.data.len(), 8);
    }

    #[test]
    fn test_decode_recovers_values() {
        let rgb = [0.0, 0.25, 1.0, 3.0, 5.5, 0.1];
        let encoding = RgbmEncoding::default();
        let image = RgbmImage::encode(2, 1, &rgb, encoding).unwrap();
        let decoded = image.decode().unwrap();
        for (a, b) in rgb.iter().zip(decoded.as_raw()) {
            assert!((a - b).abs() <= a.max(0.05) * 0.05, "{a} vs {b}");
        }
    }

    #[test]
    fn test_from_image_uses_float_values() {
        let mut hdr = image::Rgb32FImage::new(1, 1);
        hdr.put_pixel(0, 0, image::Rgb([4.0, 2.0, 1.0]));
        let image = RgbmImage::from_image(&image::DynamicImage::ImageRgb32F(hdr), RgbmEncoding::new(8.0, false)).unwrap();
        let px = image.decode().unwrap().get_pixel(0, 0).0;
        assert!((px[0] - 4.0).abs() < 0.1);
        assert!(px[0] > px[1] && px[1] > px[2]);
    }
}

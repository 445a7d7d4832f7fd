//! Saving captured frames to disk or memory.

use std::path::Path;

use image::RgbaImage;

/// Channel order of captured pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PixelLayout {
    /// Offscreen targets (`Rgba8Unorm*`).
    #[default]
    Rgba,
    /// Most window surfaces (`Bgra8Unorm*`).
    Bgra,
}

impl PixelLayout {
    /// Channel order of a texture format, if it is an 8-bit four-channel format.
    #[must_use]
    pub fn of(format: wgpu::TextureFormat) -> Option<Self> {
        match format {
            wgpu::TextureFormat::Rgba8Unorm | wgpu::TextureFormat::Rgba8UnormSrgb => Some(Self::Rgba),
            wgpu::TextureFormat::Bgra8Unorm | wgpu::TextureFormat::Bgra8UnormSrgb => Some(Self::Bgra),
            _ => None,
        }
    }
}

/// Builds an RGBA image from tightly packed 8-bit pixels.
pub fn to_rgba_image(
    data: &[u8],
    width: u32,
    height: u32,
    layout: PixelLayout,
) -> Result<RgbaImage, ScreenshotError> {
    let mut rgba_data = data.to_vec();
    if layout == PixelLayout::Bgra {
        for chunk in rgba_data.chunks_exact_mut(4) {
            chunk.swap(0, 2); // Swap B and R
        }
    }
    // wgpu uses a top-left origin, so no vertical flip is needed
    RgbaImage::from_raw(width, height, rgba_data).ok_or(ScreenshotError::InvalidImageData)
}

/// Saves an image, picking the encoder from the file extension (.png, .jpg, .jpeg).
pub fn save_image(path: impl AsRef<Path>, image: &RgbaImage) -> Result<(), ScreenshotError> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "png" => {
            image.save_with_format(path, image::ImageFormat::Png)?;
        }
        "jpg" | "jpeg" => {
            // JPEG has no alpha channel
            let rgb = image::DynamicImage::ImageRgba8(image.clone()).to_rgb8();
            rgb.save_with_format(path, image::ImageFormat::Jpeg)?;
        }
        _ => return Err(ScreenshotError::UnsupportedFormat(extension)),
    }

    log::info!("saved {}x{} image to {}", image.width(), image.height(), path.display());
    Ok(())
}

/// Encodes an image as PNG in memory.
pub fn save_to_buffer(image: &RgbaImage) -> Result<Vec<u8>, ScreenshotError> {
    let mut buffer = std::io::Cursor::new(Vec::new());
    image.write_to(&mut buffer, image::ImageFormat::Png)?;
    Ok(buffer.into_inner())
}

/// Error type for screenshot operations.
#[derive(Debug, thiserror::Error)]
pub enum ScreenshotError {
    #[error("failed to save image: {0}")]
    IoError(#[from] std::io::Error),

    #[error("image encoding error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("unsupported image format: '{0}'")]
    UnsupportedFormat(String),

    #[error("invalid image data")]
    InvalidImageData,

    #[error("failed to map readback buffer")]
    BufferMapFailed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bgra_is_swapped() {
        let image = to_rgba_image(&[1, 2, 3, 4], 1, 1, PixelLayout::Bgra).unwrap();
        assert_eq!(image.get_pixel(0, 0).0, [3, 2, 1, 4]);
        let image = to_rgba_image(&[1, 2, 3, 4], 1, 1, PixelLayout::Rgba).unwrap();
        assert_eq!(image.get_pixel(0, 0).0, [1, 2, 3, 4]);
    }

    #[test]
    fn test_size_mismatch() {
        assert!(matches!(
            to_rgba_image(&[0; 12], 2, 2, PixelLayout::Rgba),
            Err(ScreenshotError::InvalidImageData)
        ));
    }

    #[test]
    fn test_png_buffer_round_trip() {
        let image = to_rgba_image(&[10, 20, 30, 255, 40, 50, 60, 255], 2, 1, PixelLayout::Rgba).unwrap();
        let png = save_to_buffer(&image).unwrap();
        let decoded = image::load_from_memory(&png).unwrap().to_rgba8();
        assert_eq!(decoded, image);
    }

    #[test]
    fn test_unsupported_extension() {
        let image = RgbaImage::new(1, 1);
        let path = std::env::temp_dir().join("lumina_screenshot_test.bmpx");
        assert!(matches!(
            save_image(&path, &image),
            Err(ScreenshotError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_layout_of_format() {
        assert_eq!(
            PixelLayout::of(wgpu::TextureFormat::Bgra8UnormSrgb),
            Some(PixelLayout::Bgra)
        );
        assert_eq!(PixelLayout::of(wgpu::TextureFormat::Rgba16Float), None);
    }
}

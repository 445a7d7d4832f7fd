use image::RgbaImage;
use lumina_core::{EngineOptions, Scene};

use super::RenderEngine;
use crate::camera::Camera;
use crate::error::RenderResult;
use crate::materials::MaterialRegistry;
use crate::screenshot::{self, PixelLayout, ScreenshotError};

impl RenderEngine {
    /// Returns the bytes per row aligned to wgpu requirements (256-byte alignment).
    pub(crate) fn aligned_bytes_per_row(width: u32) -> u32 {
        let unaligned = width * 4;
        let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        unaligned.div_ceil(align) * align
    }

    /// Renders one frame offscreen at the engine size and reads it back.
    pub fn render_to_image(
        &mut self,
        scene: &Scene,
        materials: &MaterialRegistry,
        options: &EngineOptions,
        camera: &Camera,
    ) -> RenderResult<RgbaImage> {
        let format = self.surface_config.format;
        let layout = PixelLayout::of(format)
            .ok_or_else(|| ScreenshotError::UnsupportedFormat(format!("{format:?}")))?;

        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Capture Target"),
            size: wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        self.render(scene, materials, options, camera, &view, None)?;
        let pixels = self.read_texture(&texture)?;
        Ok(screenshot::to_rgba_image(&pixels, self.width, self.height, layout)?)
    }

    /// Copies an engine-sized 8-bit texture to the CPU, removing row padding.
    pub(crate) fn read_texture(&self, texture: &wgpu::Texture) -> Result<Vec<u8>, ScreenshotError> {
        let bytes_per_row = Self::aligned_bytes_per_row(self.width);
        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Capture Readback Buffer"),
            size: u64::from(bytes_per_row) * u64::from(self.height),
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("capture copy encoder"),
            });

        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(bytes_per_row),
                    rows_per_image: Some(self.height),
                },
            },
            wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
        );

        self.queue.submit(std::iter::once(encoder.finish()));

        let buffer_slice = buffer.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            // The receiver only disappears if the caller already gave up
            let _ = tx.send(result);
        });
        let _ = self.device.poll(wgpu::PollType::wait_indefinitely());
        rx.recv()
            .map_err(|_| ScreenshotError::BufferMapFailed)?
            .map_err(|_| ScreenshotError::BufferMapFailed)?;

        let data = buffer_slice.get_mapped_range();
        let row_bytes = (self.width * 4) as usize;
        let mut result = Vec::with_capacity(row_bytes * self.height as usize);
        for row in data.chunks_exact(bytes_per_row as usize) {
            result.extend_from_slice(&row[..row_bytes]);
        }

        drop(data);
        buffer.unmap();
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aligned_bytes_per_row() {
        assert_eq!(RenderEngine::aligned_bytes_per_row(64), 256);
        assert_eq!(RenderEngine::aligned_bytes_per_row(65), 512);
        assert_eq!(RenderEngine::aligned_bytes_per_row(1), 256);
    }
}

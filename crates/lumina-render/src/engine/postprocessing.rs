use std::collections::hash_map::Entry;

use lumina_core::{BlurConfig, DilateConfig};

use super::RenderEngine;
use crate::blur_pass::BlurPass;
use crate::dilate_pass::DilatePass;
use crate::error::RenderResult;
use crate::shader::validated;

impl RenderEngine {
    /// Gaussian-blurs `source` into `destination`, both `width` x `height`
    /// targets of `format`. With more than one pass the destination is read
    /// back and must be sampleable.
    #[allow(clippy::too_many_arguments)]
    pub fn blur(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        config: &BlurConfig,
        format: wgpu::TextureFormat,
        source: &wgpu::TextureView,
        destination: &wgpu::TextureView,
        width: u32,
        height: u32,
    ) -> RenderResult<()> {
        let pass = match self.blur_passes.entry(format) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                log::debug!("creating blur pass for {format:?}");
                entry.insert(validated(&self.device, "blur pass", || BlurPass::new(&self.device, format))?)
            }
        };
        pass.update(&self.queue, config, width, height)?;
        pass.apply(&self.device, encoder, &mut self.pool, source, destination, width, height);
        Ok(())
    }

    /// Dilates `source` into `destination`, both `width` x `height` targets of `format`.
    #[allow(clippy::too_many_arguments)]
    pub fn dilate(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        config: &DilateConfig,
        format: wgpu::TextureFormat,
        source: &wgpu::TextureView,
        destination: &wgpu::TextureView,
        width: u32,
        height: u32,
    ) -> RenderResult<()> {
        let pass = match self.dilate_passes.entry(format) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                log::debug!("creating dilate pass for {format:?}");
                entry.insert(validated(&self.device, "dilate pass", || DilatePass::new(&self.device, format))?)
            }
        };
        pass.update(&self.queue, config, width, height)?;
        pass.apply(&self.device, encoder, &mut self.pool, source, destination, width, height);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RenderError;

    const SIZE: u32 = 16;
    const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

    fn engine() -> Option<RenderEngine> {
        match pollster::block_on(RenderEngine::new_headless(SIZE, SIZE)) {
            Ok(engine) => Some(engine),
            Err(e) => {
                eprintln!("Skipping test: no GPU adapter available ({e})");
                None
            }
        }
    }

    fn target(engine: &RenderEngine, label: &str) -> wgpu::Texture {
        engine.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: SIZE,
                height: SIZE,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC
                | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        })
    }

    /// A black target with one white texel at `(SIZE / 2, SIZE / 2)`.
    fn single_texel(engine: &RenderEngine) -> wgpu::Texture {
        let texture = target(engine, "Single Texel Source");
        let mut data = vec![0u8; (SIZE * SIZE * 4) as usize];
        let center = ((SIZE / 2 * SIZE + SIZE / 2) * 4) as usize;
        data[center..center + 4].copy_from_slice(&[255; 4]);
        engine.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(SIZE * 4),
                rows_per_image: Some(SIZE),
            },
            texture.size(),
        );
        texture
    }

    /// Runs `filter` from a single-texel source and returns the red channel.
    fn filtered(
        engine: &mut RenderEngine,
        filter: impl FnOnce(&mut RenderEngine, &mut wgpu::CommandEncoder, &wgpu::TextureView, &wgpu::TextureView) -> RenderResult<()>,
    ) -> Vec<u8> {
        let source = single_texel(engine);
        let destination = target(engine, "Filter Destination");
        let source_view = source.create_view(&wgpu::TextureViewDescriptor::default());
        let destination_view = destination.create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = engine
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("filter test") });
        filter(engine, &mut encoder, &source_view, &destination_view).unwrap();
        engine.queue.submit(std::iter::once(encoder.finish()));
        let pixels = engine.read_texture(&destination).unwrap();
        pixels.chunks_exact(4).map(|p| p[0]).collect()
    }

    fn at(red: &[u8], x: u32, y: u32) -> u8 {
        red[(y * SIZE + x) as usize]
    }

    #[test]
    fn test_dilate_grows_single_texel_into_square() {
        let Some(mut engine) = engine() else { return };
        let config = DilateConfig { width: 2 };
        let red = filtered(&mut engine, |engine, encoder, source, destination| {
            engine.dilate(encoder, &config, FORMAT, source, destination, SIZE, SIZE)
        });
        let c = SIZE / 2;
        for y in 0..SIZE {
            for x in 0..SIZE {
                let inside = x.abs_diff(c) <= 2 && y.abs_diff(c) <= 2;
                assert_eq!(at(&red, x, y), if inside { 255 } else { 0 }, "texel ({x}, {y})");
            }
        }
        // The ping-pong temporary went back to the pool.
        assert_eq!(engine.pool.len_free(), 1);
    }

    #[test]
    fn test_blur_spreads_single_texel() {
        let Some(mut engine) = engine() else { return };
        let config = BlurConfig {
            blur_width: 1.0,
            sample_count: 5,
            passes: 1,
        };
        let red = filtered(&mut engine, |engine, encoder, source, destination| {
            engine.blur(encoder, &config, FORMAT, source, destination, SIZE, SIZE)
        });
        let c = SIZE / 2;
        let center = at(&red, c, c);
        assert!(center > 0 && center < 255, "center {center}");
        assert!(at(&red, c + 1, c) > 0 && at(&red, c + 1, c) <= center);
        assert!(at(&red, c + 1, c).abs_diff(at(&red, c - 1, c)) <= 1);
        assert!(at(&red, c, c + 1).abs_diff(at(&red, c, c - 1)) <= 1);
        assert_eq!(at(&red, 0, 0), 0);
        let total: u32 = red.iter().map(|&v| u32::from(v)).sum();
        assert!(total.abs_diff(255) <= 16, "blur should roughly preserve energy, got {total}");
    }

    #[test]
    fn test_invalid_blur_config_is_an_error() {
        let Some(mut engine) = engine() else { return };
        let source = single_texel(&engine);
        let destination = target(&engine, "Filter Destination");
        let source_view = source.create_view(&wgpu::TextureViewDescriptor::default());
        let destination_view = destination.create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = engine
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("filter test") });
        let config = BlurConfig {
            passes: 0,
            ..BlurConfig::default()
        };
        let result = engine.blur(&mut encoder, &config, FORMAT, &source_view, &destination_view, SIZE, SIZE);
        assert!(matches!(result, Err(RenderError::Core(_))));
    }
}

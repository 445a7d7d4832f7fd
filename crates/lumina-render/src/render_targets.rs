//! Pool of intermediate render targets.
//!
//! Post-processing passes need temporaries (AO, blur ping-pong, HDR color)
//! whose size follows the output. Targets are fetched by description and
//! returned after use so the next frame reuses them instead of allocating.
//! The pool only does bookkeeping; queue submission order keeps reuse safe.

use std::collections::HashMap;

/// Size, format and usage that identify interchangeable targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderTargetDesc {
    pub width: u32,
    pub height: u32,
    pub format: wgpu::TextureFormat,
    pub usage: wgpu::TextureUsages,
}

impl RenderTargetDesc {
    /// Describes a target that is rendered to and then sampled.
    #[must_use]
    pub fn sampled(width: u32, height: u32, format: wgpu::TextureFormat) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        }
    }
}

/// Free lists keyed by description.
#[derive(Debug)]
pub struct TargetPool<T> {
    free: HashMap<RenderTargetDesc, Vec<T>>,
}

impl<T> Default for TargetPool<T> {
    fn default() -> Self {
        Self {
            free: HashMap::new(),
        }
    }
}

impl<T> TargetPool<T> {
    /// Creates an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes a free item matching `desc`, or creates one.
    pub fn fetch_with(&mut self, desc: RenderTargetDesc, create: impl FnOnce(&RenderTargetDesc) -> T) -> T {
        self.free
            .get_mut(&desc)
            .and_then(Vec::pop)
            .unwrap_or_else(|| create(&desc))
    }

    /// Returns an item to the pool.
    pub fn release_as(&mut self, desc: RenderTargetDesc, item: T) {
        self.free.entry(desc).or_default().push(item);
    }

    /// Drops every free item.
    pub fn clear(&mut self) {
        self.free.clear();
    }

    /// Number of free items.
    #[must_use]
    pub fn len_free(&self) -> usize {
        self.free.values().map(Vec::len).sum()
    }
}

/// A pooled texture with its default view.
pub struct RenderTarget {
    pub desc: RenderTargetDesc,
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

/// Pool of GPU render targets.
pub type RenderTargetPool = TargetPool<RenderTarget>;

impl TargetPool<RenderTarget> {
    /// Fetches a target matching `desc`, allocating a texture if none is free.
    pub fn fetch(&mut self, device: &wgpu::Device, desc: RenderTargetDesc) -> RenderTarget {
        self.fetch_with(desc, |desc| {
            log::debug!(
                "allocating render target {}x{} {:?}",
                desc.width,
                desc.height,
                desc.format
            );
            let texture = device.create_texture(&wgpu::TextureDescriptor {
                label: Some("pooled render target"),
                size: wgpu::Extent3d {
                    width: desc.width,
                    height: desc.height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: desc.format,
                usage: desc.usage,
                view_formats: &[],
            });
            let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
            RenderTarget {
                desc: *desc,
                texture,
                view,
            }
        })
    }

    /// Returns a target to the pool.
    pub fn release(&mut self, target: RenderTarget) {
        self.release_as(target.desc, target);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desc(width: u32) -> RenderTargetDesc {
        RenderTargetDesc::sampled(width, 64, wgpu::TextureFormat::R8Unorm)
    }

    #[test]
    fn test_fetch_reuses_released() {
        let mut pool: TargetPool<u32> = TargetPool::new();
        let mut created = 0;
        let a = pool.fetch_with(desc(64), |_| {
            created += 1;
            created
        });
        pool.release_as(desc(64), a);
        assert_eq!(pool.len_free(), 1);

        let b = pool.fetch_with(desc(64), |_| {
            created += 1;
            created
        });
        assert_eq!(b, a);
        assert_eq!(created, 1);
        assert_eq!(pool.len_free(), 0);
    }

    #[test]
    fn test_mismatched_desc_allocates() {
        let mut pool: TargetPool<u32> = TargetPool::new();
        pool.release_as(desc(64), 7);
        let other = pool.fetch_with(desc(32), |_| 9);
        assert_eq!(other, 9);
        assert_eq!(pool.len_free(), 1);

        let rgba = RenderTargetDesc {
            format: wgpu::TextureFormat::Rgba8Unorm,
            ..desc(64)
        };
        assert_eq!(pool.fetch_with(rgba, |_| 11), 11);
    }

    #[test]
    fn test_clear() {
        let mut pool: TargetPool<u32> = TargetPool::new();
        pool.release_as(desc(64), 1);
        pool.release_as(desc(64), 2);
        pool.release_as(desc(16), 3);
        assert_eq!(pool.len_free(), 3);
        pool.clear();
        assert_eq!(pool.len_free(), 0);
    }

    #[test]
    fn test_sampled_never_zero() {
        let d = RenderTargetDesc::sampled(0, 0, wgpu::TextureFormat::R8Unorm);
        assert_eq!((d.width, d.height), (1, 1));
    }
}

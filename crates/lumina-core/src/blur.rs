//! Separable Gaussian blur.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::bilateral::BlurDirection;
use crate::error::{LuminaError, Result};

/// Most taps a single blur pass samples.
pub const MAX_GAUSSIAN_TAPS: usize = 15;

/// Gaussian blur settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlurConfig {
    /// Standard deviation of the kernel, in texels.
    pub blur_width: f32,
    /// Number of taps per pass (odd, at most [`MAX_GAUSSIAN_TAPS`]).
    pub sample_count: u32,
    /// Times the horizontal + vertical pair is applied.
    pub passes: u32,
}

impl Default for BlurConfig {
    fn default() -> Self {
        Self {
            blur_width: 2.0,
            sample_count: 9,
            passes: 1,
        }
    }
}

impl BlurConfig {
    /// Builds the kernel described by this configuration.
    pub fn kernel(&self) -> Result<GaussianKernel> {
        GaussianKernel::new(self.sample_count as usize, self.blur_width)
    }

    /// Checks the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.passes == 0 {
            return Err(LuminaError::invalid("blur.passes", "must be at least 1"));
        }
        self.kernel().map(|_| ())
    }
}

/// Normalized, symmetric 1D Gaussian kernel.
#[derive(Debug, Clone, PartialEq)]
pub struct GaussianKernel {
    weights: Vec<f32>,
}

impl GaussianKernel {
    /// Creates a kernel with `sample_count` taps and standard deviation `sigma`.
    pub fn new(sample_count: usize, sigma: f32) -> Result<Self> {
        if sample_count == 0 || sample_count % 2 == 0 || sample_count > MAX_GAUSSIAN_TAPS {
            return Err(LuminaError::invalid(
                "blur.sample_count",
                format!("must be odd and in [1, {MAX_GAUSSIAN_TAPS}], got {sample_count}"),
            ));
        }
        if !(sigma.is_finite() && sigma > 0.0) {
            return Err(LuminaError::invalid(
                "blur.blur_width",
                format!("must be positive, got {sigma}"),
            ));
        }

        let half = (sample_count / 2) as i32;
        let mut weights: Vec<f32> = (-half..=half)
            .map(|i| gaussian(i as f32, sigma))
            .collect();
        let total: f32 = weights.iter().sum();
        for w in &mut weights {
            *w /= total;
        }
        Ok(Self { weights })
    }

    /// Tap weights, from the most negative offset to the most positive.
    #[must_use]
    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    /// Number of taps on each side of the centre.
    #[must_use]
    pub fn radius(&self) -> usize {
        self.weights.len() / 2
    }

    /// Texel offsets of each tap along `direction`.
    #[must_use]
    pub fn sample_offsets(&self, direction: BlurDirection, inv_resolution: Vec2) -> Vec<Vec2> {
        let step = direction.texel_offset(inv_resolution);
        let half = self.radius() as i32;
        (-half..=half).map(|i| step * i as f32).collect()
    }

    /// Packs the kernel into the GPU uniform block.
    #[must_use]
    pub fn to_gpu(&self, direction: BlurDirection, inv_resolution: Vec2) -> GaussianParameters {
        let mut samples = [[0.0; 4]; MAX_GAUSSIAN_TAPS];
        for (slot, (offset, weight)) in samples
            .iter_mut()
            .zip(self.sample_offsets(direction, inv_resolution).iter().zip(&self.weights))
        {
            *slot = [offset.x, offset.y, *weight, 0.0];
        }
        GaussianParameters {
            samples,
            sample_count: self.weights.len() as u32,
            _padding: [0; 3],
        }
    }
}

/// GPU representation of a Gaussian blur pass. Each sample is
/// `(offset.x, offset.y, weight, unused)`.
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
#[allow(clippy::pub_underscore_fields)]
pub struct GaussianParameters {
    pub samples: [[f32; 4]; MAX_GAUSSIAN_TAPS],
    pub sample_count: u32,
    pub _padding: [u32; 3],
}

fn gaussian(x: f32, sigma: f32) -> f32 {
    let two_sigma_sq = 2.0 * sigma * sigma;
    (-(x * x) / two_sigma_sq).exp() / (std::f32::consts::PI * two_sigma_sq).sqrt()
}

/// Blurs an interleaved image with `channels` floats per pixel, horizontally
/// then vertically. Edges are clamped.
pub fn gaussian_blur(
    image: &[f32],
    width: usize,
    height: usize,
    channels: usize,
    kernel: &GaussianKernel,
) -> Result<Vec<f32>> {
    let expected = width * height * channels;
    if image.len() != expected {
        return Err(LuminaError::SizeMismatch {
            expected,
            actual: image.len(),
        });
    }
    let horizontal = blur_axis(image, width, height, channels, kernel, (1, 0));
    Ok(blur_axis(&horizontal, width, height, channels, kernel, (0, 1)))
}

fn blur_axis(
    image: &[f32],
    width: usize,
    height: usize,
    channels: usize,
    kernel: &GaussianKernel,
    (sx, sy): (isize, isize),
) -> Vec<f32> {
    let half = kernel.radius() as isize;
    let mut out = vec![0.0; image.len()];
    for y in 0..height {
        for x in 0..width {
            let dst = (y * width + x) * channels;
            for (tap, weight) in (-half..=half).zip(kernel.weights()) {
                let nx = (x as isize + tap * sx).clamp(0, width as isize - 1) as usize;
                let ny = (y as isize + tap * sy).clamp(0, height as isize - 1) as usize;
                let src = (ny * width + nx) * channels;
                for c in 0..channels {
                    out[dst + c] += image[src + c] * weight;
                }
            }
        }
    }
    out
}

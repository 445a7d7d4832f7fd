//! Morphological dilation of single-channel masks.
//!
//! Used to grow selection and outline masks before they are composited. The
//! filter is a separable max over a square window of side `2 * width + 1`.

use serde::{Deserialize, Serialize};

use crate::bilateral::BlurDirection;
use crate::error::{LuminaError, Result};

/// Widest dilation the shader supports, in pixels.
pub const MAX_DILATE_WIDTH: u32 = 16;

/// Dilation settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DilateConfig {
    /// Pixels added on each side of a lit region.
    pub width: u32,
}

impl Default for DilateConfig {
    fn default() -> Self {
        Self { width: 2 }
    }
}

impl DilateConfig {
    /// Checks that the width is in `[1, MAX_DILATE_WIDTH]`.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.width > MAX_DILATE_WIDTH {
            return Err(LuminaError::invalid(
                "dilate.width",
                format!("must be in [1, {MAX_DILATE_WIDTH}], got {}", self.width),
            ));
        }
        Ok(())
    }

    /// Uniform block for one direction of the GPU pass.
    #[must_use]
    pub fn parameters(&self, direction: BlurDirection, width: u32, height: u32) -> DilateParameters {
        let inv = glam::Vec2::new(1.0 / width.max(1) as f32, 1.0 / height.max(1) as f32);
        DilateParameters {
            direction: direction.texel_offset(inv).to_array(),
            width: self.width.min(MAX_DILATE_WIDTH),
            _padding: 0,
        }
    }
}

/// GPU representation of the dilate uniforms.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
#[allow(clippy::pub_underscore_fields)]
pub struct DilateParameters {
    pub direction: [f32; 2],
    pub width: u32,
    pub _padding: u32,
}

/// Dilates `mask` (one float per pixel).
pub fn dilate(mask: &[f32], width: usize, height: usize, config: &DilateConfig) -> Result<Vec<f32>> {
    config.validate()?;
    if mask.len() != width * height {
        return Err(LuminaError::SizeMismatch {
            expected: width * height,
            actual: mask.len(),
        });
    }
    let r = config.width as isize;
    let horizontal = max_axis(mask, width, height, r, (1, 0));
    Ok(max_axis(&horizontal, width, height, r, (0, 1)))
}

fn max_axis(
    mask: &[f32],
    width: usize,
    height: usize,
    r: isize,
    (sx, sy): (isize, isize),
) -> Vec<f32> {
    let mut out = vec![0.0; mask.len()];
    for y in 0..height {
        for x in 0..width {
            let mut best = f32::MIN;
            for t in -r..=r {
                let nx = x as isize + t * sx;
                let ny = y as isize + t * sy;
                if nx < 0 || ny < 0 || nx >= width as isize || ny >= height as isize {
                    continue;
                }
                best = best.max(mask[ny as usize * width + nx as usize]);
            }
            out[y * width + x] = best;
        }
    }
    out
}

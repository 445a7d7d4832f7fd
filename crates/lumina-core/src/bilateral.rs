//! Depth-aware bilateral blur.
//!
//! The AO buffer is noisy, so it is smoothed with a separable blur whose
//! weights fall off both with pixel distance and with the difference in linear
//! depth between the centre and the sample. Samples across a silhouette get a
//! near-zero weight, which keeps occlusion from bleeding between objects.
//!
//! The GPU pass uses [`BilateralParameters`]; the CPU functions here are the
//! reference used by tests and by tools that post-process captured buffers.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::{LuminaError, Result};

/// Largest kernel radius the blur shader supports.
pub const MAX_BLUR_RADIUS: u32 = 16;

/// Bilateral blur configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BilateralBlurConfig {
    /// Whether the blur runs at all.
    pub enabled: bool,
    /// Kernel radius in pixels.
    pub radius: u32,
    /// Depth sensitivity. Higher values preserve edges more aggressively.
    pub sharpness: f32,
}

impl Default for BilateralBlurConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            radius: 6,
            sharpness: 16.0,
        }
    }
}

impl BilateralBlurConfig {
    /// Sets the kernel radius, clamped to [`MAX_BLUR_RADIUS`].
    #[must_use]
    pub fn with_radius(mut self, radius: u32) -> Self {
        self.radius = radius.min(MAX_BLUR_RADIUS);
        self
    }

    /// Sets the depth sharpness.
    #[must_use]
    pub fn with_sharpness(mut self, sharpness: f32) -> Self {
        self.sharpness = sharpness;
        self
    }

    /// Checks that the configuration can be fed to the blur shader.
    pub fn validate(&self) -> Result<()> {
        if self.radius > MAX_BLUR_RADIUS {
            return Err(LuminaError::invalid(
                "blur.radius",
                format!("{} exceeds maximum of {MAX_BLUR_RADIUS}", self.radius),
            ));
        }
        if !self.sharpness.is_finite() || self.sharpness < 0.0 {
            return Err(LuminaError::invalid(
                "blur.sharpness",
                format!("must be finite and non-negative, got {}", self.sharpness),
            ));
        }
        Ok(())
    }

    /// Builds the uniform block for one direction of the separable blur.
    pub fn parameters(&self, direction: BlurDirection, width: u32, height: u32) -> BilateralParameters {
        let inv_resolution = Vec2::new(1.0 / width.max(1) as f32, 1.0 / height.max(1) as f32);
        BilateralParameters {
            inv_resolution: inv_resolution.to_array(),
            direction: direction.texel_offset(inv_resolution).to_array(),
            radius: self.radius.min(MAX_BLUR_RADIUS) as f32,
            falloff: falloff(self.radius),
            sharpness: self.sharpness,
            _padding: 0.0,
        }
    }
}

/// Axis of one separable blur pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlurDirection {
    /// Along +X.
    Horizontal,
    /// Along +Y.
    Vertical,
}

impl BlurDirection {
    /// Offset of one texel along this direction in UV space.
    #[must_use]
    pub fn texel_offset(self, inv_resolution: Vec2) -> Vec2 {
        match self {
            BlurDirection::Horizontal => Vec2::new(inv_resolution.x, 0.0),
            BlurDirection::Vertical => Vec2::new(0.0, inv_resolution.y),
        }
    }

    fn step(self) -> (isize, isize) {
        match self {
            BlurDirection::Horizontal => (1, 0),
            BlurDirection::Vertical => (0, 1),
        }
    }
}

/// GPU representation of the bilateral blur uniforms.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
#[allow(clippy::pub_underscore_fields)]
pub struct BilateralParameters {
    pub inv_resolution: [f32; 2],
    pub direction: [f32; 2],
    pub radius: f32,
    pub falloff: f32,
    pub sharpness: f32,
    pub _padding: f32,
}

/// Gaussian falloff for a kernel of the given radius.
///
/// `sigma = (radius + 1) / 2`, returned as `1 / (2 sigma^2)` so the shader can
/// use it directly inside `exp2`.
#[must_use]
pub fn falloff(radius: u32) -> f32 {
    let sigma = (radius as f32 + 1.0) * 0.5;
    1.0 / (2.0 * sigma * sigma)
}

/// Weight of a sample `r` pixels away from the centre.
///
/// Always positive: large depth gaps bottom out at `f32::MIN_POSITIVE`
/// instead of underflowing to zero.
#[must_use]
pub fn bilateral_weight(
    r: f32,
    center_depth: f32,
    sample_depth: f32,
    falloff: f32,
    sharpness: f32,
) -> f32 {
    let dz = sample_depth - center_depth;
    (-r * r * falloff - dz * dz * sharpness).exp2().max(f32::MIN_POSITIVE)
}

/// Runs one direction of the blur over a single-channel buffer.
///
/// `depth` holds linear view depth for each pixel. Edges are clamped.
pub fn bilateral_blur_pass(
    ao: &[f32],
    depth: &[f32],
    width: usize,
    height: usize,
    config: &BilateralBlurConfig,
    direction: BlurDirection,
) -> Result<Vec<f32>> {
    check_len(ao.len(), width * height)?;
    check_len(depth.len(), width * height)?;

    let radius = config.radius.min(MAX_BLUR_RADIUS) as isize;
    let falloff = falloff(config.radius);
    let (sx, sy) = direction.step();
    let mut out = vec![0.0; ao.len()];

    for y in 0..height {
        for x in 0..width {
            let center = y * width + x;
            let center_depth = depth[center];
            let mut total = 0.0;
            let mut weight_sum = 0.0;

            for r in -radius..=radius {
                let nx = (x as isize + r * sx).clamp(0, width as isize - 1) as usize;
                let ny = (y as isize + r * sy).clamp(0, height as isize - 1) as usize;
                let idx = ny * width + nx;
                let w = bilateral_weight(r as f32, center_depth, depth[idx], falloff, config.sharpness);
                total += ao[idx] * w;
                weight_sum += w;
            }

            // r = 0 always contributes weight 1, so the sum is never zero
            out[center] = total / weight_sum;
        }
    }

    Ok(out)
}

/// Horizontal pass followed by a vertical pass.
///
/// Returns the input unchanged when the blur is disabled or the radius is zero.
pub fn bilateral_blur(
    ao: &[f32],
    depth: &[f32],
    width: usize,
    height: usize,
    config: &BilateralBlurConfig,
) -> Result<Vec<f32>> {
    if !config.enabled || config.radius == 0 {
        check_len(ao.len(), width * height)?;
        return Ok(ao.to_vec());
    }
    let horizontal =
        bilateral_blur_pass(ao, depth, width, height, config, BlurDirection::Horizontal)?;
    bilateral_blur_pass(&horizontal, depth, width, height, config, BlurDirection::Vertical)
}

fn check_len(actual: usize, expected: usize) -> Result<()> {
    if actual == expected {
        Ok(())
    } else {
        Err(LuminaError::SizeMismatch { expected, actual })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_falloff_matches_sigma() {
        // radius 3 -> sigma 2 -> 1/8
        assert!((falloff(3) - 0.125).abs() < 1e-6);
    }

    #[test]
    fn test_center_weight_is_one() {
        assert_eq!(bilateral_weight(0.0, 5.0, 5.0, falloff(4), 16.0), 1.0);
    }

    #[test]
    fn test_weight_positive_across_large_depth_gap() {
        let w = bilateral_weight(16.0, 0.1, 1000.0, falloff(16), 64.0);
        assert!(w > 0.0);
        assert!(w < 1e-30);
    }

    #[test]
    fn test_constant_input_is_preserved() {
        let (w, h) = (8, 6);
        let ao = vec![0.4; w * h];
        let depth: Vec<f32> = (0..w * h).map(|i| 1.0 + (i % 3) as f32).collect();
        let out = bilateral_blur(&ao, &depth, w, h, &BilateralBlurConfig::default()).unwrap();
        for v in out {
            assert!((v - 0.4).abs() < 1e-5);
        }
    }

    #[test]
    fn test_depth_edge_is_preserved() {
        let (w, h) = (16, 4);
        let mut ao = vec![0.0; w * h];
        let mut depth = vec![1.0; w * h];
        for y in 0..h {
            for x in w / 2..w {
                ao[y * w + x] = 1.0;
                depth[y * w + x] = 50.0;
            }
        }
        let out = bilateral_blur(&ao, &depth, w, h, &BilateralBlurConfig::default()).unwrap();
        // Pixels right next to the silhouette keep their own side's value
        assert!(out[w / 2 - 1] < 1e-3);
        assert!(out[w / 2] > 1.0 - 1e-3);
    }

    #[test]
    fn test_flat_surface_is_smoothed() {
        let (w, h) = (9, 1);
        let mut ao = vec![0.0; w];
        ao[4] = 1.0;
        let depth = vec![2.0; w];
        let config = BilateralBlurConfig::default().with_radius(2);
        let out = bilateral_blur_pass(&ao, &depth, w, h, &config, BlurDirection::Horizontal).unwrap();
        assert!(out[4] < 1.0);
        assert!(out[3] > 0.0 && out[5] > 0.0);
        assert!((out[3] - out[5]).abs() < 1e-6);
    }

    #[test]
    fn test_disabled_returns_input() {
        let ao = vec![0.1, 0.9, 0.3, 0.7];
        let depth = vec![1.0; 4];
        let config = BilateralBlurConfig {
            enabled: false,
            ..BilateralBlurConfig::default()
        };
        assert_eq!(bilateral_blur(&ao, &depth, 2, 2, &config).unwrap(), ao);
    }

    #[test]
    fn test_size_mismatch() {
        let err = bilateral_blur(&[0.0; 3], &[0.0; 4], 2, 2, &BilateralBlurConfig::default());
        assert!(matches!(
            err,
            Err(LuminaError::SizeMismatch { expected: 4, actual: 3 })
        ));
    }

    #[test]
    fn test_parameters_direction() {
        let config = BilateralBlurConfig::default();
        let p = config.parameters(BlurDirection::Vertical, 200, 100);
        assert_eq!(p.direction, [0.0, 0.01]);
        assert_eq!(p.inv_resolution, [0.005, 0.01]);
    }

    #[test]
    fn test_validate() {
        assert!(BilateralBlurConfig::default().validate().is_ok());
        let bad = BilateralBlurConfig {
            radius: 40,
            ..BilateralBlurConfig::default()
        };
        assert!(bad.validate().is_err());
        assert!(BilateralBlurConfig::default()
            .with_sharpness(-1.0)
            .validate()
            .is_err());
    }

    proptest! {
        #[test]
        fn weights_stay_in_unit_interval(
            r in -16.0f32..16.0,
            d0 in 0.1f32..100.0,
            d1 in 0.1f32..100.0,
            radius in 0u32..16,
            sharpness in 0.0f32..64.0,
        ) {
            let w = bilateral_weight(r, d0, d1, falloff(radius), sharpness);
            prop_assert!(w > 0.0 && w <= 1.0);
        }
    }
}

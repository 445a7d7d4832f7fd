//! RGBM encoding of HDR color into 8-bit RGBA.
//!
//! The color is divided by `max_range`, optionally moved to gamma space, and
//! then split into a shared multiplier (alpha) and the color divided by that
//! multiplier (RGB). The multiplier is rounded up to the next 8-bit step so the
//! stored RGB never overflows.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::{LuminaError, Result};

const GAMMA: f32 = 2.2;
const MIN_MULTIPLIER: f32 = 1.0 / 255.0;

/// RGBM encoding parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RgbmEncoding {
    /// Largest linear value that can be represented; brighter values saturate.
    pub max_range: f32,
    /// Whether the normalized color is stored in gamma 2.2 space, which spends
    /// more precision on dark values.
    pub gamma_space: bool,
}

impl Default for RgbmEncoding {
    fn default() -> Self {
        Self {
            max_range: 6.0,
            gamma_space: true,
        }
    }
}

impl RgbmEncoding {
    /// Creates an encoding with the given range.
    #[must_use]
    pub fn new(max_range: f32, gamma_space: bool) -> Self {
        Self {
            max_range,
            gamma_space,
        }
    }

    /// Checks that the range is positive.
    pub fn validate(&self) -> Result<()> {
        if self.max_range.is_finite() && self.max_range > 0.0 {
            Ok(())
        } else {
            Err(LuminaError::invalid(
                "rgbm.max_range",
                format!("must be positive, got {}", self.max_range),
            ))
        }
    }

    /// Encodes a linear HDR color.
    #[must_use]
    pub fn encode(&self, rgb: Vec3) -> [u8; 4] {
        let mut c = (rgb / self.max_range).clamp(Vec3::ZERO, Vec3::ONE);
        if self.gamma_space {
            c = c.powf(1.0 / GAMMA);
        }
        let m = c.max_element().clamp(MIN_MULTIPLIER, 1.0);
        let m = (m * 255.0).ceil() / 255.0;
        let c = c / m;
        [to_unorm8(c.x), to_unorm8(c.y), to_unorm8(c.z), to_unorm8(m)]
    }

    /// Decodes an RGBM texel back to linear HDR.
    #[must_use]
    pub fn decode(&self, rgbm: [u8; 4]) -> Vec3 {
        let m = f32::from(rgbm[3]) / 255.0;
        let mut c = Vec3::new(f32::from(rgbm[0]), f32::from(rgbm[1]), f32::from(rgbm[2])) / 255.0 * m;
        if self.gamma_space {
            c = c.powf(GAMMA);
        }
        c * self.max_range
    }

    /// Encodes tightly packed RGB floats into RGBA8 bytes.
    pub fn encode_image(&self, rgb: &[f32]) -> Result<Vec<u8>> {
        self.validate()?;
        if rgb.len() % 3 != 0 {
            return Err(LuminaError::SizeMismatch {
                expected: rgb.len() - rgb.len() % 3,
                actual: rgb.len(),
            });
        }
        Ok(rgb
            .chunks_exact(3)
            .flat_map(|px| self.encode(Vec3::new(px[0], px[1], px[2])))
            .collect())
    }

    /// Decodes RGBA8 bytes into tightly packed RGB floats.
    pub fn decode_image(&self, rgbm: &[u8]) -> Result<Vec<f32>> {
        self.validate()?;
        if rgbm.len() % 4 != 0 {
            return Err(LuminaError::SizeMismatch {
                expected: rgbm.len() - rgbm.len() % 4,
                actual: rgbm.len(),
            });
        }
        Ok(rgbm
            .chunks_exact(4)
            .flat_map(|px| self.decode([px[0], px[1], px[2], px[3]]).to_array())
            .collect())
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_unorm8(v: f32) -> u8 {
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_black_keeps_minimum_multiplier() {
        let enc = RgbmEncoding::default();
        let px = enc.encode(Vec3::ZERO);
        assert_eq!(px, [0, 0, 0, 1]);
        assert_eq!(enc.decode(px), Vec3::ZERO);
    }

    #[test]
    fn test_values_above_range_saturate() {
        let enc = RgbmEncoding::new(4.0, false);
        let decoded = enc.decode(enc.encode(Vec3::new(100.0, 4.0, 0.0)));
        assert!((decoded.x - 4.0).abs() < 1e-4);
        assert!((decoded.y - 4.0).abs() < 1e-4);
        assert_eq!(decoded.z, 0.0);
    }

    #[test]
    fn test_brightest_channel_uses_full_precision() {
        let enc = RgbmEncoding::new(6.0, false);
        let px = enc.encode(Vec3::new(3.0, 1.0, 0.5));
        assert!(px[0] >= 254);
        assert_eq!(px[3], 128);
    }

    #[test]
    fn test_image_round_trip_length() {
        let enc = RgbmEncoding::default();
        let rgb = vec![0.5, 1.0, 2.0, 0.0, 0.1, 5.0];
        let bytes = enc.encode_image(&rgb).unwrap();
        assert_eq!(bytes.len(), 8);
        let back = enc.decode_image(&bytes).unwrap();
        assert_eq!(back.len(), 6);
        assert!(enc.encode_image(&[1.0, 2.0]).is_err());
        assert!(enc.decode_image(&[1, 2, 3]).is_err());
    }

    #[test]
    fn test_invalid_range() {
        assert!(RgbmEncoding::new(0.0, true).validate().is_err());
        assert!(RgbmEncoding::new(f32::NAN, true).encode_image(&[]).is_err());
    }

    proptest! {
        #[test]
        fn decode_is_close_to_input(
            r in 0.0f32..6.0,
            g in 0.0f32..6.0,
            b in 0.0f32..6.0,
            gamma in proptest::bool::ANY,
        ) {
            let enc = RgbmEncoding::new(6.0, gamma);
            let color = Vec3::new(r, g, b);
            let decoded = enc.decode(enc.encode(color));
            let err = (decoded - color).abs().max_element();
            prop_assert!(err <= 0.06, "color {:?} decoded {:?}", color, decoded);
        }
    }
}

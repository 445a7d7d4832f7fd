//! Tone mapping configuration.

use serde::{Deserialize, Serialize};

use crate::error::{LuminaError, Result};

/// Tone mapping configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToneMappingConfig {
    /// Exposure multiplier (default 1.0).
    pub exposure: f32,
    /// White level for highlight compression (default 1.0).
    pub white_level: f32,
    /// Gamma correction exponent (default 2.2).
    pub gamma: f32,
}

impl Default for ToneMappingConfig {
    fn default() -> Self {
        Self {
            exposure: 1.0,
            white_level: 1.0,
            gamma: 2.2,
        }
    }
}

impl ToneMappingConfig {
    /// Creates a new tone mapping configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the exposure value.
    pub fn with_exposure(mut self, exposure: f32) -> Self {
        self.exposure = exposure;
        self
    }

    /// Sets the white level.
    pub fn with_white_level(mut self, white_level: f32) -> Self {
        self.white_level = white_level;
        self
    }

    /// Sets the gamma value.
    pub fn with_gamma(mut self, gamma: f32) -> Self {
        self.gamma = gamma;
        self
    }

    /// Checks that every value is positive and finite.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("tone_mapping.exposure", self.exposure),
            ("tone_mapping.white_level", self.white_level),
            ("tone_mapping.gamma", self.gamma),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(LuminaError::invalid(name, format!("must be positive, got {value}")));
            }
        }
        Ok(())
    }
}

//! Engine-wide options, persisted as JSON.

use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::ambient_occlusion::AmbientOcclusionConfig;
use crate::error::{LuminaError, Result};
use crate::rgbm::RgbmEncoding;
use crate::tone_mapping::ToneMappingConfig;

/// Global configuration options for the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    /// Color the frame is cleared to, in linear space.
    pub background_color: Vec3,

    /// Ambient occlusion settings.
    pub ambient_occlusion: AmbientOcclusionConfig,

    /// Tone mapping settings.
    pub tone_mapping: ToneMappingConfig,

    /// Whether transparent objects are drawn. When disabled they are skipped.
    pub transparency_enabled: bool,

    /// Maximum frames per second in windowed mode (0 = unlimited).
    pub max_fps: u32,

    /// Encoding used for HDR textures loaded through the engine.
    pub rgbm: RgbmEncoding,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            background_color: Vec3::new(0.1, 0.1, 0.12),
            ambient_occlusion: AmbientOcclusionConfig::default(),
            tone_mapping: ToneMappingConfig::default(),
            transparency_enabled: true,
            max_fps: 60,
            rgbm: RgbmEncoding::default(),
        }
    }
}

impl EngineOptions {
    /// Sets the background color.
    #[must_use]
    pub fn with_background_color(mut self, color: Vec3) -> Self {
        self.background_color = color;
        self
    }

    /// Sets the ambient occlusion settings.
    #[must_use]
    pub fn with_ambient_occlusion(mut self, config: AmbientOcclusionConfig) -> Self {
        self.ambient_occlusion = config;
        self
    }

    /// Sets the tone mapping settings.
    #[must_use]
    pub fn with_tone_mapping(mut self, config: ToneMappingConfig) -> Self {
        self.tone_mapping = config;
        self
    }

    /// Checks every nested configuration.
    pub fn validate(&self) -> Result<()> {
        if !self.background_color.is_finite() || self.background_color.min_element() < 0.0 {
            return Err(LuminaError::invalid(
                "background_color",
                format!("must be finite and non-negative, got {}", self.background_color),
            ));
        }
        self.ambient_occlusion.validate()?;
        self.tone_mapping.validate()?;
        self.rgbm.validate()
    }

    /// Parses options from JSON. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    /// Serializes the options as pretty-printed JSON.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Loads options from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let options = Self::from_json_str(&json)?;
        log::info!("loaded engine options from {}", path.display());
        Ok(options)
    }

    /// Writes options to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_json_string()?)?;
        log::debug!("saved engine options to {}", path.display());
        Ok(())
    }
}

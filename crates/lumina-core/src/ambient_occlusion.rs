//! Screen-space ambient occlusion configuration and shader parameter derivation.
//!
//! Two techniques are supported:
//! - **Horizon based** (HBAO): marches along a few screen-space directions and
//!   tracks the highest horizon angle found, biased by `angle_bias` to hide
//!   tessellation artifacts.
//! - **Ray marching**: casts short rays in the hemisphere around the normal and
//!   counts how many hit the depth buffer.
//!
//! Both shaders reconstruct view-space positions from depth using the focal
//! length of the projection, so most of the work here is converting
//! user-facing settings (degrees, world radius) into the form the shader wants.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::bilateral::BilateralBlurConfig;
use crate::error::{LuminaError, Result};

/// Most sampling directions the AO shaders loop over.
pub const MAX_AO_DIRECTIONS: u32 = 16;
/// Most steps per direction.
pub const MAX_AO_STEPS: u32 = 32;
/// Most rays per direction (ray marching only).
pub const MAX_AO_RAYS: u32 = 16;

/// Which AO shader to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum AoTechnique {
    /// Horizon-based ambient occlusion.
    #[default]
    HorizonBased,
    /// Ray-marching ambient occlusion.
    RayMarching,
}

impl AoTechnique {
    /// Technique id written into the uniform block.
    #[must_use]
    pub fn id(self) -> u32 {
        match self {
            AoTechnique::HorizonBased => 0,
            AoTechnique::RayMarching => 1,
        }
    }

    /// Display name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            AoTechnique::HorizonBased => "hbao",
            AoTechnique::RayMarching => "ray_marching",
        }
    }

    /// Parses a display name, case-insensitive.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "hbao" | "horizon_based" => Some(AoTechnique::HorizonBased),
            "ray_marching" | "raymarching" => Some(AoTechnique::RayMarching),
            _ => None,
        }
    }
}

/// Resolution the AO buffer is computed at, relative to the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum AoResolution {
    /// Same size as the frame.
    Full,
    /// Half width and height.
    #[default]
    Half,
    /// Quarter width and height.
    Quarter,
}

impl AoResolution {
    /// Integer downscale factor.
    #[must_use]
    pub fn divisor(self) -> u32 {
        match self {
            AoResolution::Full => 1,
            AoResolution::Half => 2,
            AoResolution::Quarter => 4,
        }
    }

    /// Size of the AO target for a frame of `width` x `height`, never below 1x1.
    #[must_use]
    pub fn target_size(self, width: u32, height: u32) -> (u32, u32) {
        let d = self.divisor();
        ((width / d).max(1), (height / d).max(1))
    }
}

/// Horizon-based AO settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HorizonBasedAoConfig {
    /// Steps marched along each direction.
    pub number_steps: u32,
    /// Screen-space directions sampled per pixel.
    pub number_directions: u32,
    /// Sampling radius in view-space units.
    pub radius: f32,
    /// How quickly occlusion fades with distance from the pixel.
    pub line_attenuation: f32,
    /// Occlusion contrast multiplier.
    pub contrast: f32,
    /// Horizon angle bias in degrees, used to skip near-tangent occluders.
    pub angle_bias_degrees: f32,
    /// AO target resolution.
    pub resolution: AoResolution,
}

impl Default for HorizonBasedAoConfig {
    fn default() -> Self {
        Self {
            number_steps: 8,
            number_directions: 6,
            radius: 0.5,
            line_attenuation: 1.0,
            contrast: 1.0,
            angle_bias_degrees: 10.0,
            resolution: AoResolution::Half,
        }
    }
}

impl HorizonBasedAoConfig {
    /// Sets the sampling radius.
    #[must_use]
    pub fn with_radius(mut self, radius: f32) -> Self {
        self.radius = radius;
        self
    }

    /// Sets the angle bias in degrees.
    #[must_use]
    pub fn with_angle_bias(mut self, degrees: f32) -> Self {
        self.angle_bias_degrees = degrees;
        self
    }

    /// Sets the contrast.
    #[must_use]
    pub fn with_contrast(mut self, contrast: f32) -> Self {
        self.contrast = contrast;
        self
    }

    /// Checks the ranges the shader depends on.
    pub fn validate(&self) -> Result<()> {
        validate_radius(self.radius)?;
        validate_count("hbao.number_steps", self.number_steps)?;
        validate_count("hbao.number_directions", self.number_directions)?;
        validate_contrast(self.contrast)?;
        validate_attenuation(self.line_attenuation)?;
        if !(0.0..90.0).contains(&self.angle_bias_degrees) {
            return Err(LuminaError::invalid(
                "hbao.angle_bias_degrees",
                format!("must be in [0, 90), got {}", self.angle_bias_degrees),
            ));
        }
        Ok(())
    }

    /// Derives the shader uniforms for a frame of `width` x `height` pixels
    /// rendered with a vertical field of view of `fov_y` radians.
    pub fn derive(&self, fov_y: f32, width: u32, height: u32) -> Result<AoShaderParameters> {
        self.validate()?;
        let (w, h) = self.resolution.target_size(non_zero(width, "width")?, non_zero(height, "height")?);
        let angle_bias = self.angle_bias_degrees.to_radians();

        let mut params = AoShaderParameters::base(fov_y, w, h, self.radius)?;
        params.angle_bias = angle_bias;
        params.tan_angle_bias = angle_bias.tan();
        // Occlusion is measured from the biased horizon, so rescale to keep
        // a fully occluded pixel at the same darkness.
        params.contrast = self.contrast / (1.0 - angle_bias.sin());
        params.line_attenuation = self.line_attenuation;
        params.technique = AoTechnique::HorizonBased.id();
        params.number_steps = clamp_count("hbao.number_steps", self.number_steps, MAX_AO_STEPS);
        params.number_directions =
            clamp_count("hbao.number_directions", self.number_directions, MAX_AO_DIRECTIONS);
        params.number_rays = 1;
        Ok(params)
    }
}

/// Ray-marching AO settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RayMarchingAoConfig {
    /// Steps marched along each ray.
    pub number_steps: u32,
    /// Rays per direction.
    pub number_rays: u32,
    /// Directions around the normal.
    pub number_directions: u32,
    /// Sampling radius in view-space units.
    pub radius: f32,
    /// How quickly occlusion fades with distance from the pixel.
    pub line_attenuation: f32,
    /// Occlusion contrast multiplier.
    pub contrast: f32,
    /// AO target resolution.
    pub resolution: AoResolution,
}

impl Default for RayMarchingAoConfig {
    fn default() -> Self {
        Self {
            number_steps: 8,
            number_rays: 4,
            number_directions: 4,
            radius: 0.5,
            line_attenuation: 1.0,
            contrast: 1.0,
            resolution: AoResolution::Half,
        }
    }
}

impl RayMarchingAoConfig {
    /// Checks the ranges the shader depends on.
    pub fn validate(&self) -> Result<()> {
        validate_radius(self.radius)?;
        validate_count("ray_marching.number_steps", self.number_steps)?;
        validate_count("ray_marching.number_rays", self.number_rays)?;
        validate_count("ray_marching.number_directions", self.number_directions)?;
        validate_contrast(self.contrast)?;
        validate_attenuation(self.line_attenuation)
    }

    /// Derives the shader uniforms. Same conventions as
    /// [`HorizonBasedAoConfig::derive`], without an angle bias.
    pub fn derive(&self, fov_y: f32, width: u32, height: u32) -> Result<AoShaderParameters> {
        self.validate()?;
        let (w, h) = self.resolution.target_size(non_zero(width, "width")?, non_zero(height, "height")?);

        let mut params = AoShaderParameters::base(fov_y, w, h, self.radius)?;
        params.contrast = self.contrast;
        params.line_attenuation = self.line_attenuation;
        params.technique = AoTechnique::RayMarching.id();
        params.number_steps =
            clamp_count("ray_marching.number_steps", self.number_steps, MAX_AO_STEPS);
        params.number_directions = clamp_count(
            "ray_marching.number_directions",
            self.number_directions,
            MAX_AO_DIRECTIONS,
        );
        params.number_rays = clamp_count("ray_marching.number_rays", self.number_rays, MAX_AO_RAYS);
        Ok(params)
    }
}

/// Full ambient occlusion configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AmbientOcclusionConfig {
    /// Whether AO is computed.
    pub enabled: bool,
    /// Active technique.
    pub technique: AoTechnique,
    /// HBAO settings.
    pub horizon_based: HorizonBasedAoConfig,
    /// Ray-marching settings.
    pub ray_marching: RayMarchingAoConfig,
    /// Blur applied to the raw AO buffer.
    pub blur: BilateralBlurConfig,
}

impl Default for AmbientOcclusionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            technique: AoTechnique::HorizonBased,
            horizon_based: HorizonBasedAoConfig::default(),
            ray_marching: RayMarchingAoConfig::default(),
            blur: BilateralBlurConfig::default(),
        }
    }
}

impl AmbientOcclusionConfig {
    /// Selects the technique.
    #[must_use]
    pub fn with_technique(mut self, technique: AoTechnique) -> Self {
        self.technique = technique;
        self
    }

    /// AO target resolution of the active technique.
    #[must_use]
    pub fn resolution(&self) -> AoResolution {
        match self.technique {
            AoTechnique::HorizonBased => self.horizon_based.resolution,
            AoTechnique::RayMarching => self.ray_marching.resolution,
        }
    }

    /// Validates every sub-configuration, including the inactive technique.
    pub fn validate(&self) -> Result<()> {
        self.horizon_based.validate()?;
        self.ray_marching.validate()?;
        self.blur.validate()
    }

    /// Derives shader parameters for the active technique.
    pub fn derive(&self, fov_y: f32, width: u32, height: u32) -> Result<AoShaderParameters> {
        match self.technique {
            AoTechnique::HorizonBased => self.horizon_based.derive(fov_y, width, height),
            AoTechnique::RayMarching => self.ray_marching.derive(fov_y, width, height),
        }
    }
}

/// GPU representation of the AO uniforms, shared by both techniques.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
#[allow(clippy::pub_underscore_fields)]
pub struct AoShaderParameters {
    pub focal_length: [f32; 2],
    pub inv_focal_length: [f32; 2],
    pub resolution: [f32; 2],
    pub inv_resolution: [f32; 2],
    pub radius: f32,
    pub inv_radius: f32,
    pub sqr_radius: f32,
    pub angle_bias: f32,
    pub tan_angle_bias: f32,
    pub contrast: f32,
    pub line_attenuation: f32,
    pub technique: u32,
    pub number_steps: u32,
    pub number_directions: u32,
    pub number_rays: u32,
    pub _padding: u32,
}

impl AoShaderParameters {
    fn base(fov_y: f32, width: u32, height: u32, radius: f32) -> Result<Self> {
        let focal = focal_length(fov_y, width, height)?;
        let resolution = Vec2::new(width as f32, height as f32);
        Ok(Self {
            focal_length: focal.to_array(),
            inv_focal_length: focal.recip().to_array(),
            resolution: resolution.to_array(),
            inv_resolution: resolution.recip().to_array(),
            radius,
            inv_radius: 1.0 / radius,
            sqr_radius: radius * radius,
            angle_bias: 0.0,
            tan_angle_bias: 0.0,
            contrast: 1.0,
            line_attenuation: 1.0,
            technique: 0,
            number_steps: 1,
            number_directions: 1,
            number_rays: 1,
            _padding: 0,
        })
    }
}

/// Focal length of a perspective projection in normalized device units.
///
/// `y = 1 / tan(fov_y / 2)` and `x = y * height / width`, so that
/// `view.xy = ndc.xy * z / focal` recovers view-space positions.
pub fn focal_length(fov_y: f32, width: u32, height: u32) -> Result<Vec2> {
    let width = non_zero(width, "width")?;
    let height = non_zero(height, "height")?;
    if !(fov_y > 0.0 && fov_y < std::f32::consts::PI) {
        return Err(LuminaError::invalid(
            "fov_y",
            format!("must be in (0, pi) radians, got {fov_y}"),
        ));
    }
    let y = 1.0 / (fov_y * 0.5).tan();
    let x = y * height as f32 / width as f32;
    Ok(Vec2::new(x, y))
}

fn non_zero(value: u32, name: &'static str) -> Result<u32> {
    if value == 0 {
        Err(LuminaError::invalid(name, "must be greater than zero"))
    } else {
        Ok(value)
    }
}

fn validate_radius(radius: f32) -> Result<()> {
    if radius.is_finite() && radius > 0.0 {
        Ok(())
    } else {
        Err(LuminaError::invalid(
            "ao.radius",
            format!("must be positive, got {radius}"),
        ))
    }
}

fn validate_count(name: &'static str, value: u32) -> Result<()> {
    if value == 0 {
        Err(LuminaError::invalid(name, "must be at least 1"))
    } else {
        Ok(())
    }
}

fn validate_contrast(contrast: f32) -> Result<()> {
    if contrast.is_finite() && contrast >= 0.0 {
        Ok(())
    } else {
        Err(LuminaError::invalid(
            "ao.contrast",
            format!("must be non-negative, got {contrast}"),
        ))
    }
}

fn validate_attenuation(attenuation: f32) -> Result<()> {
    if attenuation.is_finite() && attenuation >= 0.0 {
        Ok(())
    } else {
        Err(LuminaError::invalid(
            "ao.line_attenuation",
            format!("must be non-negative, got {attenuation}"),
        ))
    }
}

fn clamp_count(name: &str, value: u32, max: u32) -> u32 {
    if value > max {
        log::warn!("{name} = {value} exceeds shader limit, clamping to {max}");
        max
    } else {
        value
    }
}

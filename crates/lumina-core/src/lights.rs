//! Light sources.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::{LuminaError, Result};
use crate::spherical_harmonics::SphericalHarmonicL2;

/// Directional lights the renderer uploads per frame.
pub const MAX_DIRECTIONAL_LIGHTS: usize = 4;

/// Infinitely distant light.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DirectionalLight {
    /// Direction the light travels in (from the light toward the scene).
    direction: Vec3,
    /// Linear color.
    pub color: Vec3,
    /// Scalar multiplier applied to `color`.
    pub intensity: f32,
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self {
            direction: Vec3::new(-0.4, -1.0, -0.3).normalize(),
            color: Vec3::ONE,
            intensity: 1.0,
        }
    }
}

impl DirectionalLight {
    /// Creates a light. `direction` is normalized; a zero vector is rejected.
    pub fn new(direction: Vec3, color: Vec3, intensity: f32) -> Result<Self> {
        let mut light = Self {
            direction: Vec3::NEG_Y,
            color,
            intensity,
        };
        light.set_direction(direction)?;
        Ok(light)
    }

    /// Normalized travel direction.
    #[must_use]
    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    /// Sets the travel direction.
    pub fn set_direction(&mut self, direction: Vec3) -> Result<()> {
        let normalized = direction.try_normalize().ok_or_else(|| {
            LuminaError::invalid("light.direction", format!("cannot normalize {direction}"))
        })?;
        self.direction = normalized;
        Ok(())
    }

    /// Color scaled by intensity.
    #[must_use]
    pub fn radiance(&self) -> Vec3 {
        self.color * self.intensity
    }
}

/// Environment lighting stored as spherical harmonics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AmbientLight {
    pub sh: SphericalHarmonicL2,
    /// Multiplier on the SH irradiance.
    pub intensity: f32,
    /// How strongly ambient occlusion darkens the ambient term, in [0, 1].
    pub ambient_occlusion_strength: f32,
}

impl Default for AmbientLight {
    fn default() -> Self {
        // Sky above, darker ground below.
        let mut sh = SphericalHarmonicL2::ambient(Vec3::splat(0.15));
        sh.add_directional_light(Vec3::Y, Vec3::new(0.2, 0.22, 0.25));
        Self {
            sh,
            intensity: 1.0,
            ambient_occlusion_strength: 1.0,
        }
    }
}

impl AmbientLight {
    /// Creates an ambient light from SH coefficients.
    #[must_use]
    pub fn new(sh: SphericalHarmonicL2) -> Self {
        Self {
            sh,
            ..Self::default()
        }
    }

    /// Checks intensity and AO strength.
    pub fn validate(&self) -> Result<()> {
        if !(self.intensity.is_finite() && self.intensity >= 0.0) {
            return Err(LuminaError::invalid(
                "ambient.intensity",
                format!("must be non-negative, got {}", self.intensity),
            ));
        }
        if !(0.0..=1.0).contains(&self.ambient_occlusion_strength) {
            return Err(LuminaError::invalid(
                "ambient.ambient_occlusion_strength",
                format!("must be in [0, 1], got {}", self.ambient_occlusion_strength),
            ));
        }
        Ok(())
    }

    /// Irradiance reaching a surface with the given normal, after intensity.
    #[must_use]
    pub fn irradiance(&self, normal: Vec3) -> Vec3 {
        self.sh.irradiance(normal) * self.intensity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_is_normalized() {
        let light = DirectionalLight::new(Vec3::new(0.0, -3.0, 0.0), Vec3::ONE, 2.0).unwrap();
        assert_eq!(light.direction(), Vec3::NEG_Y);
        assert_eq!(light.radiance(), Vec3::splat(2.0));
    }

    #[test]
    fn test_zero_direction_rejected() {
        assert!(DirectionalLight::new(Vec3::ZERO, Vec3::ONE, 1.0).is_err());
        let mut light = DirectionalLight::default();
        let before = light.direction();
        assert!(light.set_direction(Vec3::splat(f32::NAN)).is_err());
        assert_eq!(light.direction(), before);
    }

    #[test]
    fn test_default_ambient_is_brighter_from_above() {
        let ambient = AmbientLight::default();
        assert!(ambient.validate().is_ok());
        let up = ambient.irradiance(Vec3::Y);
        let down = ambient.irradiance(Vec3::NEG_Y);
        assert!(up.x > down.x);
    }

    #[test]
    fn test_ambient_validate() {
        let ambient = AmbientLight {
            ambient_occlusion_strength: 1.5,
            ..AmbientLight::default()
        };
        assert!(ambient.validate().is_err());
    }
}

//! Material system for surface rendering.
//!
//! A material picks the shading path of an object:
//! - opaque Blinn-Phong and constant materials are written to the G-buffer and
//!   lit by the deferred lighting pass,
//! - car paint is shaded in a forward pass after deferred lighting,
//! - anything with alpha below one goes through the forward transparency pass.

use std::collections::HashMap;

use glam::Vec3;
use lumina_core::{LuminaError, Result};

/// Surface appearance of an object.
#[derive(Debug, Clone, PartialEq)]
pub enum Material {
    /// Classic Blinn-Phong: Lambert diffuse plus a half-vector specular lobe.
    BlinnPhong {
        diffuse_color: Vec3,
        specular_intensity: f32,
        specular_power: f32,
        alpha: f32,
    },
    /// Multi-tone metallic paint with procedural flakes and an environment reflection.
    CarPaint {
        base_color: Vec3,
        second_base_color: Vec3,
        middle_color: Vec3,
        flake_color: Vec3,
        /// Repetitions of the flake pattern across the texture coordinates.
        flakes_scale: f32,
        /// Sharpness of the flake glints.
        flakes_exponent: f32,
        micro_flakes_perturbation: f32,
        normal_perturbation: f32,
        specular_intensity: f32,
        specular_power: f32,
        reflection_strength: f32,
    },
    /// Unlit color.
    Constant { color: Vec3, alpha: f32 },
}

/// Which render pass draws a material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShadingPath {
    /// Written to the G-buffer and lit by the deferred lighting pass.
    Deferred,
    /// Shaded in a forward pass after deferred lighting, depth-tested and written.
    ForwardOpaque,
    /// Alpha blended after all opaque geometry, sorted back to front.
    ForwardTransparent,
}

/// Shading model ids understood by the material shaders.
pub mod shading_model {
    pub const BLINN_PHONG: u32 = 0;
    pub const CAR_PAINT: u32 = 1;
    pub const CONSTANT: u32 = 2;
}

impl Material {
    /// An opaque Blinn-Phong material.
    #[must_use]
    pub fn blinn_phong(diffuse_color: Vec3, specular_intensity: f32, specular_power: f32) -> Self {
        Self::BlinnPhong {
            diffuse_color,
            specular_intensity,
            specular_power,
            alpha: 1.0,
        }
    }

    /// An opaque unlit material.
    #[must_use]
    pub fn constant(color: Vec3) -> Self {
        Self::Constant { color, alpha: 1.0 }
    }

    /// Car paint with the given base color and default flake settings.
    #[must_use]
    pub fn car_paint(base_color: Vec3) -> Self {
        Self::CarPaint {
            base_color,
            second_base_color: base_color * 0.35,
            middle_color: (base_color * 0.8 + Vec3::splat(0.1)).min(Vec3::ONE),
            flake_color: Vec3::new(0.9, 0.9, 0.85),
            flakes_scale: 60.0,
            flakes_exponent: 24.0,
            micro_flakes_perturbation: 0.15,
            normal_perturbation: 0.05,
            specular_intensity: 0.9,
            specular_power: 96.0,
            reflection_strength: 0.6,
        }
    }

    /// Returns a copy with the given opacity. Car paint is always opaque.
    #[must_use]
    pub fn with_alpha(mut self, value: f32) -> Self {
        match &mut self {
            Self::BlinnPhong { alpha, .. } | Self::Constant { alpha, .. } => *alpha = value,
            Self::CarPaint { .. } => {}
        }
        self
    }

    /// Opacity in [0, 1].
    #[must_use]
    pub fn alpha(&self) -> f32 {
        match self {
            Self::BlinnPhong { alpha, .. } | Self::Constant { alpha, .. } => *alpha,
            Self::CarPaint { .. } => 1.0,
        }
    }

    /// Returns true if the material needs blending.
    #[must_use]
    pub fn is_transparent(&self) -> bool {
        self.alpha() < 1.0
    }

    /// The pass that draws this material.
    #[must_use]
    pub fn shading_path(&self) -> ShadingPath {
        if self.is_transparent() {
            ShadingPath::ForwardTransparent
        } else if matches!(self, Self::CarPaint { .. }) {
            ShadingPath::ForwardOpaque
        } else {
            ShadingPath::Deferred
        }
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<()> {
        let alpha = self.alpha();
        if !(0.0..=1.0).contains(&alpha) {
            return Err(LuminaError::invalid("alpha", format!("{alpha} is outside [0, 1]")));
        }
        match self {
            Self::BlinnPhong {
                specular_intensity,
                specular_power,
                ..
            } => check_specular(*specular_intensity, *specular_power),
            Self::CarPaint {
                flakes_scale,
                flakes_exponent,
                specular_intensity,
                specular_power,
                reflection_strength,
                ..
            } => {
                check_specular(*specular_intensity, *specular_power)?;
                if *flakes_scale <= 0.0 || *flakes_exponent <= 0.0 {
                    return Err(LuminaError::invalid(
                        "flakes",
                        "scale and exponent must be positive",
                    ));
                }
                if !(0.0..=1.0).contains(reflection_strength) {
                    return Err(LuminaError::invalid(
                        "reflection_strength",
                        format!("{reflection_strength} is outside [0, 1]"),
                    ));
                }
                Ok(())
            }
            Self::Constant { .. } => Ok(()),
        }
    }
}

fn check_specular(intensity: f32, power: f32) -> Result<()> {
    if intensity < 0.0 {
        return Err(LuminaError::invalid("specular_intensity", "must not be negative"));
    }
    if power <= 0.0 {
        return Err(LuminaError::invalid("specular_power", "must be positive"));
    }
    Ok(())
}

impl Default for Material {
    fn default() -> Self {
        Self::blinn_phong(Vec3::splat(0.7), 0.3, 32.0)
    }
}

/// GPU-compatible material uniforms.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialUniforms {
    /// Diffuse/base color in rgb, alpha in a.
    pub base_color: [f32; 4],
    pub second_color: [f32; 4],
    pub middle_color: [f32; 4],
    pub flake_color: [f32; 4],
    pub specular_intensity: f32,
    pub specular_power: f32,
    pub reflection_strength: f32,
    pub shading_model: u32,
    pub flakes_scale: f32,
    pub flakes_exponent: f32,
    pub micro_flakes_perturbation: f32,
    pub normal_perturbation: f32,
}

impl From<&Material> for MaterialUniforms {
    fn from(material: &Material) -> Self {
        let zero = [0.0; 4];
        match *material {
            Material::BlinnPhong {
                diffuse_color,
                specular_intensity,
                specular_power,
                alpha,
            } => Self {
                base_color: diffuse_color.extend(alpha).to_array(),
                second_color: zero,
                middle_color: zero,
                flake_color: zero,
                specular_intensity,
                specular_power,
                reflection_strength: 0.0,
                shading_model: shading_model::BLINN_PHONG,
                flakes_scale: 0.0,
                flakes_exponent: 0.0,
                micro_flakes_perturbation: 0.0,
                normal_perturbation: 0.0,
            },
            Material::CarPaint {
                base_color,
                second_base_color,
                middle_color,
                flake_color,
                flakes_scale,
                flakes_exponent,
                micro_flakes_perturbation,
                normal_perturbation,
                specular_intensity,
                specular_power,
                reflection_strength,
            } => Self {
                base_color: base_color.extend(1.0).to_array(),
                second_color: second_base_color.extend(1.0).to_array(),
                middle_color: middle_color.extend(1.0).to_array(),
                flake_color: flake_color.extend(1.0).to_array(),
                specular_intensity,
                specular_power,
                reflection_strength,
                shading_model: shading_model::CAR_PAINT,
                flakes_scale,
                flakes_exponent,
                micro_flakes_perturbation,
                normal_perturbation,
            },
            Material::Constant { color, alpha } => Self {
                base_color: color.extend(alpha).to_array(),
                second_color: zero,
                middle_color: zero,
                flake_color: zero,
                specular_intensity: 0.0,
                specular_power: 1.0,
                reflection_strength: 0.0,
                shading_model: shading_model::CONSTANT,
                flakes_scale: 0.0,
                flakes_exponent: 0.0,
                micro_flakes_perturbation: 0.0,
                normal_perturbation: 0.0,
            },
        }
    }
}

impl Default for MaterialUniforms {
    fn default() -> Self {
        Self::from(&Material::default())
    }
}

const BUILTIN_ORDER: &[&str] = &["default", "plastic", "metal", "car_paint_red", "glass"];

/// Registry for managing materials by name.
#[derive(Debug, Clone)]
pub struct MaterialRegistry {
    materials: HashMap<String, Material>,
    default_material: String,
}

impl MaterialRegistry {
    /// Creates a new material registry with the built-in materials.
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Self {
            materials: HashMap::new(),
            default_material: "default".to_string(),
        };
        registry.register_defaults();
        registry
    }

    fn register_defaults(&mut self) {
        let builtins = [
            ("default", Material::default()),
            (
                "plastic",
                Material::blinn_phong(Vec3::new(0.8, 0.15, 0.1), 0.5, 64.0),
            ),
            ("metal", Material::blinn_phong(Vec3::splat(0.55), 0.9, 128.0)),
            (
                "car_paint_red",
                Material::car_paint(Vec3::new(0.6, 0.02, 0.02)),
            ),
            (
                "glass",
                Material::blinn_phong(Vec3::new(0.6, 0.8, 0.9), 1.0, 256.0).with_alpha(0.3),
            ),
        ];
        for (name, material) in builtins {
            self.materials.insert(name.to_string(), material);
        }
    }

    /// Registers or replaces a material after validating it.
    pub fn register(&mut self, name: impl Into<String>, material: Material) -> Result<()> {
        material.validate()?;
        let name = name.into();
        if self.materials.insert(name.clone(), material).is_some() {
            log::debug!("replaced material '{name}'");
        }
        Ok(())
    }

    /// Gets a material by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Material> {
        self.materials.get(name)
    }

    /// Returns true if a material with the given name is registered.
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.materials.contains_key(name)
    }

    /// Looks up a material, falling back to the default material.
    #[must_use]
    pub fn resolve(&self, name: &str) -> &Material {
        self.get(name).unwrap_or_else(|| self.default_material())
    }

    /// Gets the default material.
    #[must_use]
    pub fn default_material(&self) -> &Material {
        const FALLBACK: Material = Material::BlinnPhong {
            diffuse_color: Vec3::splat(0.7),
            specular_intensity: 0.3,
            specular_power: 32.0,
            alpha: 1.0,
        };
        self.materials.get(&self.default_material).unwrap_or(&FALLBACK)
    }

    /// Name of the default material.
    #[must_use]
    pub fn default_name(&self) -> &str {
        &self.default_material
    }

    /// Sets the default material name. Unknown names are ignored.
    pub fn set_default(&mut self, name: &str) {
        if self.materials.contains_key(name) {
            self.default_material = name.to_string();
        } else {
            log::warn!("cannot make unknown material '{name}' the default");
        }
    }

    /// Returns all material names, with built-in materials first in a stable order,
    /// followed by custom materials sorted alphabetically.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = BUILTIN_ORDER
            .iter()
            .copied()
            .filter(|name| self.materials.contains_key(*name))
            .collect();
        let mut custom: Vec<&str> = self
            .materials
            .keys()
            .map(String::as_str)
            .filter(|n| !BUILTIN_ORDER.contains(n))
            .collect();
        custom.sort_unstable();
        names.extend(custom);
        names
    }

    /// Returns the number of registered materials.
    #[must_use]
    pub fn len(&self) -> usize {
        self.materials.len()
    }

    /// Returns true if no materials are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }
}

impl Default for MaterialRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_material_registry() {
        let registry = MaterialRegistry::new();
        assert_eq!(registry.len(), 5);
        assert!(registry.has("car_paint_red"));
        assert_eq!(registry.default_material(), &Material::default());
        assert_eq!(
            registry.names(),
            vec!["default", "plastic", "metal", "car_paint_red", "glass"]
        );
    }

    #[test]
    fn test_custom_names_sorted_after_builtins() {
        let mut registry = MaterialRegistry::new();
        registry
            .register("zinc", Material::blinn_phong(Vec3::ONE, 0.5, 8.0))
            .unwrap();
        registry
            .register("chalk", Material::constant(Vec3::ONE))
            .unwrap();
        let names = registry.names();
        assert_eq!(&names[5..], &["chalk", "zinc"]);
    }

    #[test]
    fn test_register_rejects_invalid() {
        let mut registry = MaterialRegistry::new();
        let bad = Material::blinn_phong(Vec3::ONE, 0.5, 0.0);
        assert!(registry.register("bad", bad).is_err());
        assert!(!registry.has("bad"));
        let bad_alpha = Material::constant(Vec3::ONE).with_alpha(1.5);
        assert!(registry.register("bad", bad_alpha).is_err());
    }

    #[test]
    fn test_resolve_falls_back_to_default() {
        let mut registry = MaterialRegistry::new();
        assert_eq!(registry.resolve("missing"), registry.default_material());
        registry.set_default("metal");
        assert_eq!(registry.default_name(), "metal");
        registry.set_default("missing");
        assert_eq!(registry.default_name(), "metal");
        assert_eq!(registry.resolve("missing"), registry.get("metal").unwrap());
    }

    #[test]
    fn test_shading_paths() {
        let registry = MaterialRegistry::new();
        let path = |name| registry.get(name).unwrap().shading_path();
        assert_eq!(path("default"), ShadingPath::Deferred);
        assert_eq!(path("metal"), ShadingPath::Deferred);
        assert_eq!(path("car_paint_red"), ShadingPath::ForwardOpaque);
        assert_eq!(path("glass"), ShadingPath::ForwardTransparent);
        assert_eq!(
            Material::constant(Vec3::X).shading_path(),
            ShadingPath::Deferred
        );
        assert_eq!(
            Material::constant(Vec3::X).with_alpha(0.5).shading_path(),
            ShadingPath::ForwardTransparent
        );
    }

    #[test]
    fn test_car_paint_is_always_opaque() {
        let paint = Material::car_paint(Vec3::X).with_alpha(0.2);
        assert_eq!(paint.alpha(), 1.0);
        assert!(!paint.is_transparent());
    }

    #[test]
    fn test_material_uniforms() {
        assert_eq!(std::mem::size_of::<MaterialUniforms>(), 96);

        let glass = MaterialRegistry::new().get("glass").cloned().unwrap();
        let uniforms = MaterialUniforms::from(&glass);
        assert_eq!(uniforms.base_color[3], 0.3);
        assert_eq!(uniforms.shading_model, shading_model::BLINN_PHONG);

        let paint = MaterialUniforms::from(&Material::car_paint(Vec3::X));
        assert_eq!(paint.shading_model, shading_model::CAR_PAINT);
        assert!(paint.flakes_scale > 0.0);
    }
}

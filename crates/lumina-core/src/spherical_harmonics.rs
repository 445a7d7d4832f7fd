//! Order-2 (nine coefficient) spherical harmonics for ambient lighting.
//!
//! An environment is projected once (from a cubemap, or built up from
//! ambient and directional terms) and the lighting shader evaluates the
//! cosine-convolved result per pixel, which is the diffuse irradiance a
//! Lambertian surface receives from the whole environment.

use std::f32::consts::PI;
use std::ops::{Add, Mul};

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::{LuminaError, Result};

const Y00: f32 = 0.282_095;
const Y1: f32 = 0.488_603;
const Y2_MIXED: f32 = 1.092_548;
const Y20: f32 = 0.315_392;
const Y22: f32 = 0.546_274;

/// Cosine-lobe convolution factor per band (l = 0, 1, 2).
const BAND_FACTORS: [f32; 3] = [PI, 2.0 * PI / 3.0, PI / 4.0];
const BAND_OF: [usize; 9] = [0, 1, 1, 1, 2, 2, 2, 2, 2];

/// Evaluates the nine real SH basis functions in direction `dir` (normalized).
#[must_use]
pub fn sh_basis(dir: Vec3) -> [f32; 9] {
    let Vec3 { x, y, z } = dir;
    [
        Y00,
        Y1 * y,
        Y1 * z,
        Y1 * x,
        Y2_MIXED * x * y,
        Y2_MIXED * y * z,
        Y20 * (3.0 * z * z - 1.0),
        Y2_MIXED * x * z,
        Y22 * (x * x - y * y),
    ]
}

/// RGB spherical harmonic projection up to band 2.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SphericalHarmonicL2 {
    /// Coefficients in basis order (see [`sh_basis`]).
    pub coefficients: [Vec3; 9],
}

impl Default for SphericalHarmonicL2 {
    fn default() -> Self {
        Self::ZERO
    }
}

impl SphericalHarmonicL2 {
    /// No light at all.
    pub const ZERO: Self = Self {
        coefficients: [Vec3::ZERO; 9],
    };

    /// A uniform environment of radiance `color`.
    #[must_use]
    pub fn ambient(color: Vec3) -> Self {
        let mut sh = Self::ZERO;
        sh.add_ambient(color);
        sh
    }

    /// Adds uniform radiance from every direction.
    pub fn add_ambient(&mut self, color: Vec3) {
        // integral of Y00 over the sphere is 4 pi * Y00
        self.coefficients[0] += color * (4.0 * PI * Y00);
    }

    /// Adds a directional light arriving from `toward_light`.
    pub fn add_directional_light(&mut self, toward_light: Vec3, color: Vec3) {
        let dir = toward_light.normalize_or_zero();
        if dir == Vec3::ZERO {
            log::warn!("ignoring directional light with zero direction");
            return;
        }
        for (c, y) in self.coefficients.iter_mut().zip(sh_basis(dir)) {
            *c += color * y;
        }
    }

    /// Radiance arriving from direction `dir`.
    #[must_use]
    pub fn evaluate(&self, dir: Vec3) -> Vec3 {
        self.coefficients
            .iter()
            .zip(sh_basis(dir.normalize_or_zero()))
            .fold(Vec3::ZERO, |acc, (c, y)| acc + *c * y)
    }

    /// Irradiance on a surface facing `normal`.
    ///
    /// A uniform environment of radiance `C` yields `pi * C`.
    #[must_use]
    pub fn irradiance(&self, normal: Vec3) -> Vec3 {
        self.coefficients
            .iter()
            .zip(sh_basis(normal.normalize_or_zero()))
            .zip(BAND_OF)
            .fold(Vec3::ZERO, |acc, ((c, y), band)| {
                acc + *c * (y * BAND_FACTORS[band])
            })
    }

    /// Linear interpolation between two environments.
    #[must_use]
    pub fn lerp(&self, other: &Self, t: f32) -> Self {
        let mut out = Self::ZERO;
        for (i, c) in out.coefficients.iter_mut().enumerate() {
            *c = self.coefficients[i].lerp(other.coefficients[i], t);
        }
        out
    }

    /// Coefficients for the lighting shader.
    ///
    /// They are pre-convolved and divided by pi, so summing `c_i * Y_i(n)`
    /// gives the diffuse reflectance multiplier for a white Lambertian
    /// surface. The fourth lane is unused.
    #[must_use]
    pub fn to_gpu(&self) -> [[f32; 4]; 9] {
        let mut out = [[0.0; 4]; 9];
        for (i, slot) in out.iter_mut().enumerate() {
            let c = self.coefficients[i] * (BAND_FACTORS[BAND_OF[i]] / PI);
            *slot = [c.x, c.y, c.z, 0.0];
        }
        out
    }

    /// Projects a cubemap onto the SH basis, weighting texels by solid angle.
    pub fn from_cubemap(cubemap: &CubeMap) -> Result<Self> {
        cubemap.validate()?;
        let size = cubemap.size;
        let mut sh = Self::ZERO;
        let mut total_weight = 0.0;

        for (face, texels) in cubemap.faces.iter().enumerate() {
            for y in 0..size {
                for x in 0..size {
                    let weight = texel_solid_angle(size, x, y);
                    let dir = texel_direction(face, size, x, y);
                    let color = texels[y * size + x];
                    for (c, basis) in sh.coefficients.iter_mut().zip(sh_basis(dir)) {
                        *c += color * (basis * weight);
                    }
                    total_weight += weight;
                }
            }
        }

        // The analytic solid angles already sum to 4 pi; renormalize to
        // absorb float error on large maps.
        let norm = 4.0 * PI / total_weight;
        for c in &mut sh.coefficients {
            *c *= norm;
        }
        log::debug!("projected {size}x{size} cubemap onto SH, dc = {:?}", sh.coefficients[0]);
        Ok(sh)
    }
}

impl Add for SphericalHarmonicL2 {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self {
        for (a, b) in self.coefficients.iter_mut().zip(rhs.coefficients) {
            *a += b;
        }
        self
    }
}

impl Mul<f32> for SphericalHarmonicL2 {
    type Output = Self;

    fn mul(mut self, rhs: f32) -> Self {
        for c in &mut self.coefficients {
            *c *= rhs;
        }
        self
    }
}

/// Cubemap faces in the order +X, -X, +Y, -Y, +Z, -Z.
pub const CUBE_FACE_COUNT: usize = 6;

/// Linear RGB cubemap stored on the CPU.
#[derive(Debug, Clone, PartialEq)]
pub struct CubeMap {
    /// Edge length of each face in texels.
    pub size: usize,
    /// Row-major texels per face.
    pub faces: [Vec<Vec3>; CUBE_FACE_COUNT],
}

impl CubeMap {
    /// Builds a cubemap by evaluating `f` at every texel direction.
    pub fn from_fn(size: usize, f: impl Fn(Vec3) -> Vec3) -> Self {
        let faces = std::array::from_fn(|face| {
            let mut texels = Vec::with_capacity(size * size);
            for y in 0..size {
                for x in 0..size {
                    texels.push(f(texel_direction(face, size, x, y)));
                }
            }
            texels
        });
        Self { size, faces }
    }

    /// Checks that every face holds `size * size` texels.
    pub fn validate(&self) -> Result<()> {
        if self.size == 0 {
            return Err(LuminaError::invalid("cubemap.size", "must be greater than zero"));
        }
        for face in &self.faces {
            if face.len() != self.size * self.size {
                return Err(LuminaError::SizeMismatch {
                    expected: self.size * self.size,
                    actual: face.len(),
                });
            }
        }
        Ok(())
    }
}

/// Direction through the centre of texel `(x, y)` on `face`.
#[must_use]
pub fn texel_direction(face: usize, size: usize, x: usize, y: usize) -> Vec3 {
    let u = 2.0 * (x as f32 + 0.5) / size as f32 - 1.0;
    let v = 2.0 * (y as f32 + 0.5) / size as f32 - 1.0;
    let dir = match face {
        0 => Vec3::new(1.0, -v, -u),
        1 => Vec3::new(-1.0, -v, u),
        2 => Vec3::new(u, 1.0, v),
        3 => Vec3::new(u, -1.0, -v),
        4 => Vec3::new(u, -v, 1.0),
        _ => Vec3::new(-u, -v, -1.0),
    };
    dir.normalize()
}

/// Solid angle subtended by texel `(x, y)` of a face with `size` texels per edge.
#[must_use]
pub fn texel_solid_angle(size: usize, x: usize, y: usize) -> f32 {
    let inv = 1.0 / size as f32;
    let u = 2.0 * (x as f32 + 0.5) * inv - 1.0;
    let v = 2.0 * (y as f32 + 0.5) * inv - 1.0;
    let (x0, x1) = (u - inv, u + inv);
    let (y0, y1) = (v - inv, v + inv);
    area_element(x0, y0) - area_element(x0, y1) - area_element(x1, y0) + area_element(x1, y1)
}

fn area_element(x: f32, y: f32) -> f32 {
    (x * y).atan2((x * x + y * y + 1.0).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn close(a: Vec3, b: Vec3, tol: f32) -> bool {
        (a - b).abs().max_element() < tol
    }

    #[test]
    fn test_solid_angles_cover_sphere() {
        let size = 8;
        let total: f32 = (0..CUBE_FACE_COUNT)
            .map(|_| {
                (0..size)
                    .flat_map(|y| (0..size).map(move |x| texel_solid_angle(size, x, y)))
                    .sum::<f32>()
            })
            .sum();
        assert!((total - 4.0 * PI).abs() < 1e-3);
    }

    #[test]
    fn test_face_directions() {
        assert!(close(texel_direction(0, 1, 0, 0), Vec3::X, 1e-6));
        assert!(close(texel_direction(3, 1, 0, 0), Vec3::NEG_Y, 1e-6));
        assert!(close(texel_direction(5, 1, 0, 0), Vec3::NEG_Z, 1e-6));
    }

    #[test]
    fn test_constant_cubemap_round_trips() {
        let color = Vec3::new(0.2, 0.5, 1.5);
        let cubemap = CubeMap::from_fn(16, |_| color);
        let sh = SphericalHarmonicL2::from_cubemap(&cubemap).unwrap();
        for dir in [Vec3::X, Vec3::NEG_Y, Vec3::new(1.0, 2.0, -3.0)] {
            assert!(close(sh.evaluate(dir), color, 1e-3));
            assert!(close(sh.irradiance(dir), color * PI, 1e-2));
        }
    }

    #[test]
    fn test_basis_projection_is_orthonormal() {
        let cubemap = CubeMap::from_fn(32, |d| Vec3::splat(sh_basis(d)[6]));
        let sh = SphericalHarmonicL2::from_cubemap(&cubemap).unwrap();
        for (i, c) in sh.coefficients.iter().enumerate() {
            let expected = if i == 6 { 1.0 } else { 0.0 };
            assert!((c.x - expected).abs() < 1e-2, "coefficient {i} = {}", c.x);
        }
    }

    #[test]
    fn test_sky_is_brighter_above() {
        let cubemap = CubeMap::from_fn(16, |d| if d.y > 0.0 { Vec3::ONE } else { Vec3::ZERO });
        let sh = SphericalHarmonicL2::from_cubemap(&cubemap).unwrap();
        assert!(sh.irradiance(Vec3::Y).x > sh.irradiance(Vec3::NEG_Y).x);
    }

    #[test]
    fn test_directional_light_peaks_toward_light() {
        let mut sh = SphericalHarmonicL2::ZERO;
        sh.add_directional_light(Vec3::new(0.0, 1.0, 0.0), Vec3::ONE);
        let up = sh.irradiance(Vec3::Y).x;
        let side = sh.irradiance(Vec3::X).x;
        let down = sh.irradiance(Vec3::NEG_Y).x;
        assert!(up > side && up > down);
    }

    #[test]
    fn test_zero_direction_is_ignored() {
        let mut sh = SphericalHarmonicL2::ZERO;
        sh.add_directional_light(Vec3::ZERO, Vec3::ONE);
        assert_eq!(sh, SphericalHarmonicL2::ZERO);
    }

    #[test]
    fn test_gpu_coefficients_give_unit_albedo_response() {
        let sh = SphericalHarmonicL2::ambient(Vec3::splat(0.5));
        let gpu = sh.to_gpu();
        let basis = sh_basis(Vec3::Z);
        let r: f32 = gpu.iter().zip(basis).map(|(c, y)| c[0] * y).sum();
        assert!((r - 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_lerp_and_ops() {
        let a = SphericalHarmonicL2::ambient(Vec3::ONE);
        let b = SphericalHarmonicL2::ZERO;
        let half = a.lerp(&b, 0.5);
        assert!(close(half.evaluate(Vec3::X), Vec3::splat(0.5), 1e-4));
        let doubled = a + a;
        assert!(close((doubled * 0.5).evaluate(Vec3::Y), Vec3::ONE, 1e-4));
    }

    #[test]
    fn test_bad_cubemap_rejected() {
        let mut cubemap = CubeMap::from_fn(4, |_| Vec3::ONE);
        cubemap.faces[2].pop();
        assert!(SphericalHarmonicL2::from_cubemap(&cubemap).is_err());
    }

    proptest! {
        #[test]
        fn ambient_is_direction_independent(
            r in 0.0f32..10.0,
            x in -1.0f32..1.0,
            y in -1.0f32..1.0,
            z in -1.0f32..1.0,
        ) {
            prop_assume!(Vec3::new(x, y, z).length() > 0.1);
            let sh = SphericalHarmonicL2::ambient(Vec3::splat(r));
            let v = sh.evaluate(Vec3::new(x, y, z));
            prop_assert!((v.x - r).abs() < 1e-3 * (1.0 + r));
        }
    }
}

//! Core math and data for lumina.
//!
//! This crate has no GPU dependency. It provides:
//! - ambient occlusion parameter derivation for the horizon-based and
//!   ray-marching techniques
//! - separable Gaussian, bilateral and dilate filters, with the uniform blocks
//!   the GPU passes consume and CPU reference implementations
//! - order-2 spherical harmonics and cubemap projection
//! - RGBM encoding of HDR color
//! - meshes, lights, the scene registry and engine options

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
// Builder patterns return Self which doesn't need must_use
#![allow(clippy::must_use_candidate)]
// Pixel and texel arithmetic converts between integer sizes and floats
#![allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss
)]
#![allow(clippy::many_single_char_names)]

pub mod ambient_occlusion;
pub mod bilateral;
pub mod blur;
pub mod dilate;
pub mod error;
pub mod lights;
pub mod mesh;
pub mod options;
pub mod rgbm;
pub mod scene;
pub mod spherical_harmonics;
pub mod tone_mapping;

pub use ambient_occlusion::{
    focal_length, AmbientOcclusionConfig, AoResolution, AoShaderParameters, AoTechnique,
    HorizonBasedAoConfig, RayMarchingAoConfig,
};
pub use bilateral::{BilateralBlurConfig, BilateralParameters, BlurDirection};
pub use blur::{BlurConfig, GaussianKernel, GaussianParameters};
pub use dilate::{DilateConfig, DilateParameters};
pub use error::{LuminaError, Result};
pub use lights::{AmbientLight, DirectionalLight, MAX_DIRECTIONAL_LIGHTS};
pub use mesh::MeshData;
pub use options::EngineOptions;
pub use rgbm::RgbmEncoding;
pub use scene::{Scene, SceneObject};
pub use spherical_harmonics::{CubeMap, SphericalHarmonicL2};
pub use tone_mapping::ToneMappingConfig;

// Re-export glam types for convenience
pub use glam::{Mat4, Vec2, Vec3, Vec4};

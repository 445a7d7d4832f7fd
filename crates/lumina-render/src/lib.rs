//! Rendering backend for lumina.
//!
//! This crate provides the wgpu-based rendering engine, including:
//! - GPU resource management (buffers, pooled render targets, the G-buffer)
//! - WGSL shader assembly and fullscreen pass helpers
//! - Blinn-Phong, car paint and constant materials with deferred and forward passes
//! - Ambient occlusion, bilateral blur, Gaussian blur, dilate and tone mapping passes
//! - RGBM and half-float environment textures, cubemap loading and SH projection
//! - Camera and view management, screenshots

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
// Builder patterns return Self which doesn't need must_use
#![allow(clippy::must_use_candidate)]
// Pixel sizes and slot indices convert between integers and floats throughout
#![allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
#![allow(clippy::module_name_repetitions)]

pub mod ao_pass;
pub mod bilateral_blur_pass;
pub mod blur_pass;
pub mod buffer;
pub mod camera;
pub mod dilate_pass;
pub mod engine;
pub mod environment;
pub mod error;
pub mod gbuffer;
pub mod lighting;
pub mod material_pass;
pub mod materials;
pub mod render_targets;
pub mod rgbm_texture;
pub mod screenshot;
pub mod shader;
pub mod tone_mapping;

pub use ao_pass::{AoPass, AoUniforms, AO_FORMAT};
pub use bilateral_blur_pass::BilateralBlurPass;
pub use blur_pass::BlurPass;
pub use buffer::{MeshBuffers, Vertex};
pub use camera::{Camera, CameraUniforms};
pub use dilate_pass::DilatePass;
pub use engine::{FrameStats, Overlay, OverlayContext, RenderEngine, HEADLESS_FORMAT};
pub use environment::{cubemap_from_equirect, cubemap_from_faces, load_ambient_sh, load_cubemap};
pub use error::{RenderError, RenderResult};
pub use gbuffer::GBuffer;
pub use lighting::{EnvironmentEncoding, LightingPass, LightingUniforms};
pub use material_pass::{MaterialPass, ObjectUniforms, HDR_FORMAT};
pub use materials::{Material, MaterialRegistry, MaterialUniforms, ShadingPath};
pub use render_targets::{RenderTarget, RenderTargetDesc, RenderTargetPool};
pub use rgbm_texture::{upload_hdr_texture, EnvironmentTexture, RgbmImage};
pub use screenshot::{save_image, save_to_buffer, to_rgba_image, PixelLayout, ScreenshotError};
pub use shader::ShaderBuilder;
pub use tone_mapping::{ToneMapPass, ToneMapUniforms};

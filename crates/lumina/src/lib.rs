//! lumina: a deferred-shading 3D engine with an in-engine editor.
//!
//! Scenes are made of meshes instanced as objects with named materials.
//! Opaque Blinn-Phong objects go through a G-buffer and deferred lighting,
//! car paint and transparent objects are shaded forward, and the frame is
//! finished with ambient occlusion (horizon-based or ray-marched), bilateral
//! blur and tone mapping. Ambient light is an order-2 spherical harmonic,
//! optionally projected from an RGBM-encoded environment map.
//!
//! # Quick Start
//!
//! ```no_run
//! use lumina::*;
//!
//! fn main() -> lumina::Result<()> {
//!     init_logging();
//!     let mut engine = Engine::new();
//!     engine.scene_mut().add_mesh("sphere", MeshData::uv_sphere(1.0, 32, 16))?;
//!     engine
//!         .scene_mut()
//!         .add_object(SceneObject::new("ball", "sphere", "car_paint_red"))?;
//!     engine.fit_camera();
//!     engine.render_to_file("ball.png", 800, 600)?;
//!     Ok(())
//! }
//! ```
//!
//! [`run_editor`] opens a window with the editor menu and property windows.

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
// Window sizes convert between integers and floats
#![allow(clippy::cast_precision_loss)]

mod app;
mod engine;
mod error;

pub use app::run_editor;
pub use engine::Engine;
pub use error::{Error, Result};

// Re-export core types
pub use lumina_core::{
    AmbientLight, AmbientOcclusionConfig, AoResolution, AoTechnique, BilateralBlurConfig,
    DirectionalLight, EngineOptions, HorizonBasedAoConfig, LuminaError, MeshData,
    RayMarchingAoConfig, RgbmEncoding, Scene, SceneObject, SphericalHarmonicL2, ToneMappingConfig,
    Mat4, Vec2, Vec3, Vec4,
};

// Re-export render types
pub use lumina_render::{Camera, FrameStats, Material, MaterialRegistry, RenderEngine, RenderError};

// Re-export the UI
pub use lumina_ui::{EditorUi, PropertyWindow, UiTree};

/// Initializes `env_logger` at `info` unless `RUST_LOG` says otherwise.
///
/// Repeated calls, or a logger installed by the application, are harmless.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).try_init();
}

//! Rendering error types.

use lumina_core::LuminaError;
use thiserror::Error;

use crate::screenshot::ScreenshotError;

/// Errors that can occur during rendering operations.
#[derive(Error, Debug)]
pub enum RenderError {
    /// Failed to create wgpu adapter.
    #[error("failed to create graphics adapter")]
    AdapterCreationFailed,

    /// Failed to create wgpu device.
    #[error("failed to create graphics device: {0}")]
    DeviceCreationFailed(#[from] wgpu::RequestDeviceError),

    /// Failed to create surface.
    #[error("failed to create surface: {0}")]
    SurfaceCreationFailed(#[from] wgpu::CreateSurfaceError),

    /// Shader source could not be assembled.
    #[error("shader compilation failed: {0}")]
    ShaderCompilationFailed(String),

    /// Surface lost.
    #[error("surface lost")]
    SurfaceLost,

    /// Surface outdated.
    #[error("surface outdated")]
    SurfaceOutdated,

    /// Out of memory.
    #[error("out of memory")]
    OutOfMemory,

    /// Timeout waiting for GPU.
    #[error("timeout waiting for GPU")]
    Timeout,

    /// Operation needs a window surface but the engine is headless.
    #[error("engine has no window surface")]
    NoSurface,

    /// Invalid configuration or scene data.
    #[error(transparent)]
    Core(#[from] LuminaError),

    /// Image decoding failed.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// Saving a captured frame failed.
    #[error(transparent)]
    Screenshot(#[from] ScreenshotError),
}

impl From<wgpu::SurfaceError> for RenderError {
    fn from(err: wgpu::SurfaceError) -> Self {
        match err {
            wgpu::SurfaceError::Lost => Self::SurfaceLost,
            wgpu::SurfaceError::OutOfMemory => Self::OutOfMemory,
            wgpu::SurfaceError::Timeout => Self::Timeout,
            _ => Self::SurfaceOutdated,
        }
    }
}

/// A specialized Result type for rendering operations.
pub type RenderResult<T> = std::result::Result<T, RenderError>;

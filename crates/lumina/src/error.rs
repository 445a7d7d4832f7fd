//! Facade error type.

use lumina_core::LuminaError;
use lumina_render::RenderError;
use lumina_ui::UiError;
use thiserror::Error;

/// Errors from any layer of the engine.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid configuration or scene data.
    #[error(transparent)]
    Core(#[from] LuminaError),

    /// GPU setup or rendering failed.
    #[error(transparent)]
    Render(#[from] RenderError),

    /// Editor UI construction failed.
    #[error("ui error: {0}")]
    Ui(#[from] UiError),

    /// The window event loop could not be created or failed while running.
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    /// The window could not be created.
    #[error("window creation failed: {0}")]
    Window(#[from] winit::error::OsError),
}

/// Result type of the facade.
pub type Result<T> = std::result::Result<T, Error>;

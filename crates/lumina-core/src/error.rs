//! Error types for lumina.

use thiserror::Error;

/// The main error type for lumina operations.
#[derive(Error, Debug)]
pub enum LuminaError {
    /// A named item (mesh, object, material) was not found.
    #[error("'{0}' not found")]
    NotFound(String),

    /// A named item with the same name is already registered.
    #[error("'{0}' already exists")]
    AlreadyExists(String),

    /// A configuration value is outside its valid range.
    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// Data size mismatch.
    #[error("data size mismatch: expected {expected}, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    /// Mesh data is malformed.
    #[error("invalid mesh: {0}")]
    InvalidMesh(String),

    /// Rendering error.
    #[error("render error: {0}")]
    Render(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LuminaError {
    /// Shorthand for an [`LuminaError::InvalidParameter`].
    pub fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

/// A specialized Result type for lumina operations.
pub type Result<T> = std::result::Result<T, LuminaError>;

//! UI error types.

use thiserror::Error;

use crate::tree::WidgetId;

/// Errors from widget tree operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum UiError {
    /// The id does not name a live widget.
    #[error("widget {0:?} not found")]
    NotFound(WidgetId),

    /// The widget exists but is not of the requested type.
    #[error("widget {id:?} is not a {expected}")]
    WrongType { id: WidgetId, expected: &'static str },

    /// Reparenting would make a widget its own ancestor.
    #[error("widget {0:?} cannot be its own ancestor")]
    Cycle(WidgetId),

    /// A widget parameter is out of range.
    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

/// A specialized Result type for UI operations.
pub type UiResult<T> = std::result::Result<T, UiError>;

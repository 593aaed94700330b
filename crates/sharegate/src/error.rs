//! Error types for the engine.

use std::time::Duration;

use sharegate_core::ValidationError;
use sharegate_store::StoreError;
use thiserror::Error;

/// Errors that can occur during engine operations.
///
/// Check methods never return these: they log them and deny. Administrative
/// operations surface them to the caller.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Invalid caller input.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// A resource-level check reached the share/grant stage without a
    /// resource id.
    #[error("resource id required for action {action}")]
    MissingResourceId { action: String },

    /// A store call overran the configured timeout.
    #[error("store call timed out after {0:?}")]
    Timeout(Duration),
}

impl EngineError {
    /// Whether the error is the caller's fault rather than the backend's.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            EngineError::Validation(_) | EngineError::MissingResourceId { .. }
        )
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

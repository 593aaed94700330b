//! Error types for the store module.

use sharegate_core::ValidationError;
use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A stored value could not be converted back into the model.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Record not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// A record with the same unique key already exists.
    #[error("duplicate: {0}")]
    Duplicate(String),

    /// The permission is still bound to at least one role.
    #[error("permission {name} is still assigned to {roles} role(s)")]
    PermissionInUse { name: String, roles: usize },

    /// Invalid data in storage.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// The backend cannot serve requests (poisoned lock, closed pool, ...).
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Input rejected before reaching the backend.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

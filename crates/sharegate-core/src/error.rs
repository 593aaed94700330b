//! Error types for the Sharegate core model.

use thiserror::Error;

/// Validation errors for identifiers, names, and check contexts.
///
/// These never reach a request pipeline as failures: the engine resolves
/// every one of them to a denial.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("user id is empty")]
    EmptyUserId,

    #[error("group id is empty")]
    EmptyGroupId,

    #[error("resource id is empty")]
    EmptyResourceId,

    #[error("malformed identifier {0:?}: must not contain whitespace or control characters")]
    MalformedId(String),

    #[error("malformed permission name {0:?}: expected \"resource:action\"")]
    MalformedPermissionName(String),

    #[error("unknown role: {0}")]
    UnknownRole(String),

    #[error("unknown share level: {0}")]
    UnknownShareLevel(String),

    #[error("unknown group role: {0}")]
    UnknownGroupRole(String),

    #[error("action is empty")]
    EmptyAction,

    #[error("invalid check context: {0}")]
    InvalidContext(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, ValidationError>;

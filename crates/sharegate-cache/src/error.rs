//! Error types for the cache module.

use thiserror::Error;

/// Errors that can occur talking to a cache backend.
///
/// None of these ever reach a caller of the engine: the cache is best-effort
/// and every failure falls through to the stores.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The backend could not serve the request.
    #[error("cache unavailable: {0}")]
    Unavailable(String),

    /// A value could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The backend did not answer in time.
    #[error("cache timeout after {0:?}")]
    Timeout(std::time::Duration),
}

/// Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;

//! Engine configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use sharegate_cache::DEFAULT_MAX_CAPACITY;

/// Configuration for the [`ResolutionEngine`](crate::ResolutionEngine).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Whether to use the cache fast path at all.
    pub cache_enabled: bool,
    /// TTL of cached roles.
    pub role_ttl: Duration,
    /// TTL of cached permission sets.
    pub permissions_ttl: Duration,
    /// Per-call store timeout. An elapsed call denies.
    pub store_timeout: Option<Duration>,
    /// Per-call cache timeout. An elapsed call is a miss.
    pub cache_timeout: Option<Duration>,
    /// Entry bound of the in-process cache built by
    /// [`ResolutionEngine::with_memory_cache`](crate::ResolutionEngine::with_memory_cache).
    pub cache_capacity: u64,
    /// Evaluate a principal with no active role as `guest` for `read` and
    /// `view`. Off by default: absence is not `guest`.
    pub missing_role_reads_as_guest: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_enabled: true,
            role_ttl: Duration::from_secs(3600),
            permissions_ttl: Duration::from_secs(3600),
            store_timeout: None,
            cache_timeout: Some(Duration::from_millis(250)),
            cache_capacity: DEFAULT_MAX_CAPACITY,
            missing_role_reads_as_guest: false,
        }
    }
}

impl EngineConfig {
    /// Configuration with the cache switched off.
    pub fn uncached() -> Self {
        Self {
            cache_enabled: false,
            ..Self::default()
        }
    }
}

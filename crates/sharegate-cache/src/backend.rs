//! Cache backend abstraction.
//!
//! A backend is a byte-valued key-value store with per-key TTL. Implementations
//! may be in-process or remote; failures surface as
//! [`CacheError`](crate::CacheError) and are handled by the caller.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;

/// Key-value cache with TTL.
///
/// Implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Get a live value.
    async fn get(&self, key: &str) -> Result<Option<Bytes>>;

    /// Set a value, replacing any previous one. Last write wins.
    async fn set(&self, key: &str, value: Bytes, ttl: Duration) -> Result<()>;

    /// Delete a key. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Get several values in one round trip, in key order.
    async fn get_many(&self, keys: &[&str]) -> Result<Vec<Option<Bytes>>> {
        let mut values = Vec::with_capacity(keys.len());
        for key in keys {
            values.push(self.get(key).await?);
        }
        Ok(values)
    }
}

#[async_trait]
impl<T> CacheBackend for Arc<T>
where
    T: CacheBackend + ?Sized,
{
    async fn get(&self, key: &str) -> Result<Option<Bytes>> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: Bytes, ttl: Duration) -> Result<()> {
        (**self).set(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        (**self).delete(key).await
    }

    async fn get_many(&self, keys: &[&str]) -> Result<Vec<Option<Bytes>>> {
        (**self).get_many(keys).await
    }
}

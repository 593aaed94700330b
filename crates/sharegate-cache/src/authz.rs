//! Typed, best-effort cache of role and permission-set lookups.
//!
//! Every method swallows backend failures: an error is logged and reported as
//! a miss (or ignored, for writes), so the engine falls through to its stores.

use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use sharegate_core::{is_live, PermissionName, Role, UserId};

use crate::backend::CacheBackend;
use crate::error::{CacheError, Result};
use crate::keys::{permissions_key, role_key};

/// Default TTL for both entry kinds.
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// A cached role, with the expiry of the assignment it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedRole {
    pub role: Role,
    pub expires_at: Option<i64>,
}

impl CachedRole {
    pub fn new(role: Role, expires_at: Option<i64>) -> Self {
        Self { role, expires_at }
    }

    pub fn active_role(&self, now: i64) -> Option<Role> {
        is_live(self.expires_at, now).then_some(self.role)
    }
}

/// A cached permission set and the role it was derived from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedPermissions {
    pub role: Role,
    pub expires_at: Option<i64>,
    pub names: BTreeSet<PermissionName>,
}

impl CachedPermissions {
    pub fn is_live(&self, now: i64) -> bool {
        is_live(self.expires_at, now)
    }
}

/// Entries read together by [`AuthzCache::get_user_entries`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserEntries {
    pub role: Option<CachedRole>,
    pub permissions: Option<CachedPermissions>,
}

/// Typed front of a [`CacheBackend`].
#[derive(Clone)]
pub struct AuthzCache {
    backend: Option<Arc<dyn CacheBackend>>,
    role_ttl: Duration,
    permissions_ttl: Duration,
    timeout: Option<Duration>,
}

impl AuthzCache {
    /// Cache over `backend` with the default TTLs and no timeout.
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self {
            backend: Some(backend),
            role_ttl: DEFAULT_TTL,
            permissions_ttl: DEFAULT_TTL,
            timeout: None,
        }
    }

    /// A cache that stores nothing. Every read is a miss.
    pub fn disabled() -> Self {
        Self {
            backend: None,
            role_ttl: DEFAULT_TTL,
            permissions_ttl: DEFAULT_TTL,
            timeout: None,
        }
    }

    pub fn with_role_ttl(mut self, ttl: Duration) -> Self {
        self.role_ttl = ttl;
        self
    }

    pub fn with_permissions_ttl(mut self, ttl: Duration) -> Self {
        self.permissions_ttl = ttl;
        self
    }

    /// Bound every backend call. A call that overruns counts as a failure.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.backend.is_some()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Roles
    // ─────────────────────────────────────────────────────────────────────────

    /// The cached role of `user`, if present and still live at `now`.
    pub async fn get_role(&self, user: &UserId, now: i64) -> Option<CachedRole> {
        let key = role_key(user);
        let bytes = self.read(&key).await?;
        let cached: CachedRole = decode(&key, &bytes)?;
        cached.active_role(now).map(|_| cached)
    }

    pub async fn put_role(&self, user: &UserId, entry: &CachedRole, now: i64) {
        let ttl = clamp_ttl(self.role_ttl, entry.expires_at, now);
        self.write(&role_key(user), entry, ttl).await;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Permission sets
    // ─────────────────────────────────────────────────────────────────────────

    /// The cached permission set of `user`, if present and still live at `now`.
    pub async fn get_permissions(&self, user: &UserId, now: i64) -> Option<CachedPermissions> {
        let key = permissions_key(user);
        let bytes = self.read(&key).await?;
        let cached: CachedPermissions = decode(&key, &bytes)?;
        cached.is_live(now).then_some(cached)
    }

    pub async fn put_permissions(&self, user: &UserId, entry: &CachedPermissions, now: i64) {
        let ttl = clamp_ttl(self.permissions_ttl, entry.expires_at, now);
        self.write(&permissions_key(user), entry, ttl).await;
    }

    /// Both entries of `user` in one backend round trip.
    pub async fn get_user_entries(&self, user: &UserId, now: i64) -> UserEntries {
        let Some(backend) = &self.backend else {
            return UserEntries::default();
        };

        let role_key = role_key(user);
        let permissions_key = permissions_key(user);
        let keys = [role_key.as_str(), permissions_key.as_str()];

        let Some(values) = self
            .guard("get_many", &role_key, backend.get_many(&keys))
            .await
        else {
            return UserEntries::default();
        };

        let mut values = values.into_iter();
        let role = values
            .next()
            .flatten()
            .and_then(|bytes| decode::<CachedRole>(&role_key, &bytes))
            .filter(|r| r.active_role(now).is_some());
        let permissions = values
            .next()
            .flatten()
            .and_then(|bytes| decode::<CachedPermissions>(&permissions_key, &bytes))
            .filter(|p| p.is_live(now));

        UserEntries { role, permissions }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Invalidation
    // ─────────────────────────────────────────────────────────────────────────

    /// Delete both entries of `user`. Returns whether every delete succeeded.
    pub async fn invalidate_user(&self, user: &UserId) -> bool {
        let Some(backend) = &self.backend else {
            return true;
        };

        let mut ok = true;
        for key in [role_key(user), permissions_key(user)] {
            ok &= self
                .guard("delete", &key, backend.delete(&key))
                .await
                .is_some();
        }

        debug!(user = %user, ok, "invalidated cached entries");
        ok
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Backend access
    // ─────────────────────────────────────────────────────────────────────────

    async fn read(&self, key: &str) -> Option<Bytes> {
        let backend = self.backend.as_ref()?;
        let value = self.guard("get", key, backend.get(key)).await??;
        debug!(key, "cache hit");
        Some(value)
    }

    async fn write<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) {
        let Some(backend) = &self.backend else {
            return;
        };
        if ttl.is_zero() {
            return;
        }

        let bytes = match encode(value) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(key, error = %e, "failed to encode cache entry");
                return;
            }
        };

        self.guard("set", key, backend.set(key, bytes, ttl)).await;
    }

    /// Run a backend call under the configured timeout. Failures are logged
    /// and reported as `None`.
    async fn guard<T>(
        &self,
        op: &'static str,
        key: &str,
        call: impl Future<Output = Result<T>>,
    ) -> Option<T> {
        let result = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .unwrap_or(Err(CacheError::Timeout(limit))),
            None => call.await,
        };

        match result {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(op, key, error = %e, "cache call failed, falling through to store");
                None
            }
        }
    }
}

/// Never cache an entry past the expiry of the record it mirrors.
fn clamp_ttl(ttl: Duration, expires_at: Option<i64>, now: i64) -> Duration {
    match expires_at {
        Some(at) => {
            let remaining = u64::try_from(at.saturating_sub(now)).unwrap_or(0);
            ttl.min(Duration::from_millis(remaining))
        }
        None => ttl,
    }
}

fn encode<T: Serialize>(value: &T) -> Result<Bytes> {
    let mut buf = Vec::new();
    ciborium::into_writer(value, &mut buf)
        .map_err(|e| CacheError::Serialization(e.to_string()))?;
    Ok(Bytes::from(buf))
}

fn decode<T: DeserializeOwned>(key: &str, bytes: &[u8]) -> Option<T> {
    match ciborium::from_reader(bytes) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(key, error = %e, "undecodable cache entry, treating as miss");
            None
        }
    }
}

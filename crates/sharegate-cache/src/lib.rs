//! # Sharegate Cache
//!
//! Best-effort TTL cache in front of the role and permission-catalog lookups.
//!
//! ## Overview
//!
//! [`CacheBackend`] is a byte-valued key-value trait with per-key TTL;
//! [`MemoryCache`] is the in-process implementation. [`AuthzCache`] layers
//! typed entries on top: a user's role and a user's resolved permission set,
//! CBOR-encoded under `sharegate:role:<user>` and `sharegate:perms:<user>`.
//!
//! ## Key Types
//!
//! - [`CacheBackend`] - Async key-value trait with TTL
//! - [`MemoryCache`] - Bounded in-memory backend with per-entry TTL
//! - [`AuthzCache`] - Typed, failure-swallowing cache front
//! - [`CachedRole`], [`CachedPermissions`] - Cached values, carrying the expiry
//!   of the role they came from
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use sharegate_cache::{AuthzCache, CachedRole, MemoryCache};
//! use sharegate_core::{now_millis, Role, UserId};
//!
//! async fn example() {
//!     let cache = AuthzCache::new(Arc::new(MemoryCache::new()));
//!     let alice = UserId::new("alice");
//!     let now = now_millis();
//!
//!     cache.put_role(&alice, &CachedRole::new(Role::User, None), now).await;
//!     assert!(cache.get_role(&alice, now).await.is_some());
//!
//!     cache.invalidate_user(&alice).await;
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Best-effort**: Backend errors and timeouts are logged and read as misses
//! - **Undecodable values**: Treated as misses, never as errors
//! - **Expiry re-check**: Cached entries are re-judged against their role's
//!   expiry on every read, and never stored past it

pub mod authz;
pub mod backend;
pub mod error;
pub mod keys;
pub mod memory;

pub use authz::{AuthzCache, CachedPermissions, CachedRole, UserEntries, DEFAULT_TTL};
pub use backend::CacheBackend;
pub use error::{CacheError, Result};
pub use keys::{permissions_key, role_key};
pub use memory::{MemoryCache, DEFAULT_MAX_CAPACITY};

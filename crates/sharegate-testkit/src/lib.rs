//! # Sharegate Testkit
//!
//! Testing utilities for Sharegate.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: A [`TestWorld`] wiring a store, a cache, an engine and an
//!   admin service together, plus a standard seeded catalog
//! - **Generators**: Proptest strategies for roles, actions, share levels and
//!   expiry offsets
//! - **Faults**: Cache backends and stores that fail or hang on demand
//!
//! It also hosts the cross-crate scenario and property suites under
//! `tests/`, run against both the in-memory and the SQLite store.
//!
//! ## Test Fixtures
//!
//! ```rust,no_run
//! use sharegate_core::{Action, Role};
//! use sharegate_testkit::TestWorld;
//!
//! # async fn demo() {
//! let world = TestWorld::memory();
//! world.seed_catalog().await;
//! let alice = world.user("alice", Role::User).await;
//! assert!(world.engine.has_permission(&alice, "resource", &Action::Write).await);
//! # }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use sharegate_testkit::generators::{action, share_level};
//!
//! proptest! {
//!     #[test]
//!     fn write_share_covers_read_share(action in action()) {
//!         // ...
//!     }
//! }
//! ```
//!
//! ## Fault Injection
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use sharegate::EngineConfig;
//! use sharegate_store::MemoryStore;
//! use sharegate_testkit::{FailingCache, TestWorld};
//!
//! // Checks must answer exactly as they would with a healthy cache.
//! let world = TestWorld::with_parts(
//!     Arc::new(MemoryStore::new()),
//!     Arc::new(FailingCache::new()),
//!     EngineConfig::default(),
//! );
//! ```

pub mod faults;
pub mod fixtures;
pub mod generators;

pub use faults::{FailingCache, FailingStore, HangingCache};
pub use fixtures::{fresh_user_id, init_tracing, permission, TestWorld, STANDARD_CATALOG};
pub use generators::{check_params, CheckParams};

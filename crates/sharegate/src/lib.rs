//! # Sharegate
//!
//! Authorization and resource-sharing resolution: who may do what, to which
//! resource, and why.
//!
//! ## Overview
//!
//! Sharegate answers authorization questions from four stores and a cache:
//!
//! - **Roles**: one role per principal, ordered guest < user < moderator <
//!   admin < super_admin, optionally expiring
//! - **Catalog**: named `resource:action` permissions and the roles that hold them
//! - **Grants**: resources shared with users or groups at a read/write level,
//!   and direct per-action grants
//! - **Groups**: which groups a user belongs to
//! - **Cache**: a best-effort TTL cache of roles and permission sets
//!
//! ## Key Concepts
//!
//! - **Fail-closed**: every check returns `false` on any internal failure
//! - **Context**: what the caller knows about a resource (id, owner, public,
//!   shared); with a context, any action needs ownership, an elevated role
//!   holding the catalog permission, or a resource-level grant
//! - **Invalidation**: every write that changes a user's role or permission
//!   set must be followed by [`ResolutionEngine::invalidate_user_cache`];
//!   [`AdminService`] does this for you
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use sharegate::{AdminService, EngineConfig, ResolutionEngine};
//! use sharegate::core::{Action, CheckContext, Role, UserId};
//! use sharegate::store::SqliteStore;
//!
//! async fn example() -> sharegate::Result<()> {
//!     let store = Arc::new(SqliteStore::open("sharegate.db")?);
//!     let engine = Arc::new(ResolutionEngine::with_memory_cache(store, EngineConfig::default()));
//!     let admin = AdminService::new(engine.clone());
//!
//!     let alice = UserId::new("alice");
//!     let read = admin.create_permission("resource", &Action::Read, None).await?;
//!     admin.grant_permission_to_role(Role::User, &read.name).await?;
//!     admin.assign_role(&alice, Role::User, None).await?;
//!
//!     let ctx = CheckContext::for_resource("doc-1").owner("bob").public(true);
//!     assert!(engine.can_perform_action(&alice, "resource", &Action::Read, Some(&ctx)).await);
//!     Ok(())
//! }
//! ```
//!
//! ## Re-exports
//!
//! This crate re-exports the component crates for convenience:
//!
//! - `sharegate::core` - Data model and boundary validation
//! - `sharegate::store` - Store traits, SQLite and in-memory stores
//! - `sharegate::cache` - Cache backends and the typed cache
//! - `sharegate::perms` - Resource-level grant resolution

pub mod admin;
pub mod config;
pub mod engine;
pub mod error;

// Re-export component crates
pub use sharegate_cache as cache;
pub use sharegate_core as core;
pub use sharegate_perms as perms;
pub use sharegate_store as store;

// Re-export main types for convenience
pub use admin::AdminService;
pub use config::EngineConfig;
pub use engine::ResolutionEngine;
pub use error::{EngineError, Result};

// Re-export commonly used component types
pub use sharegate_core::{Action, CheckContext, PermissionName, Role, UserId};
pub use sharegate_perms::GrantDecision;

//! # Sharegate Store
//!
//! Storage abstraction for Sharegate. Provides trait-based interfaces for
//! role assignments, the permission catalog, groups, and resource grants, with
//! SQLite and in-memory implementations.
//!
//! ## Overview
//!
//! Each concern sits behind its own async trait so the resolution engine is
//! storage-agnostic. [`AuthzStore`] bundles all four and is implemented for
//! anything that implements them. The primary implementation is
//! [`SqliteStore`], with [`MemoryStore`] for testing.
//!
//! ## Key Types
//!
//! - [`RoleStore`] - One role assignment per principal, optionally expiring
//! - [`PermissionCatalog`] - Named permissions and role bindings
//! - [`GroupIndex`] - Groups and memberships
//! - [`GrantStore`] - Resource shares and direct grants
//! - [`CatalogLookup`] - Result of asking whether a role holds a permission
//! - [`InsertResult`] - Result of an idempotent insert
//!
//! ## Usage
//!
//! ```rust,no_run
//! use sharegate_core::{PermissionName, Role, RoleAssignment, UserId};
//! use sharegate_store::{PermissionCatalog, RoleStore, SqliteStore};
//!
//! async fn example() -> sharegate_store::Result<()> {
//!     let store = SqliteStore::open("sharegate.db")?;
//!
//!     let read = PermissionName::parse("resource:read")?;
//!     store.create_permission(&read, Some("Read resources")).await?;
//!     store.assign_permission(Role::User, &read).await?;
//!
//!     store
//!         .set_role(&RoleAssignment::new(UserId::new("alice"), Role::User))
//!         .await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Raw reads**: Expired records are returned as stored; callers judge expiry
//! - **Idempotent binds**: Binding a permission twice returns `AlreadyExists`
//! - **Delete guard**: A permission still bound to a role cannot be deleted
//! - **Upserts**: Re-sharing to the same grantee replaces level and expiry

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{
    AuthzStore, CatalogLookup, GrantStore, GroupIndex, InsertResult, PermissionCatalog,
    RoleStore,
};

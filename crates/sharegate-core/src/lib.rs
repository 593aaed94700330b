//! # Sharegate Core
//!
//! Pure data model for the Sharegate authorization engine: roles, catalog
//! permissions, resource shares, direct grants, groups, and check contexts.
//!
//! This crate contains no I/O, no storage, no caching. It is the vocabulary
//! every other Sharegate crate speaks.
//!
//! ## Key Types
//!
//! - [`Role`] - Global role; a total order backed by a fixed rank table
//! - [`RoleAssignment`] - A principal's role with optional expiry
//! - [`PermissionName`] - Validated `"resource:action"` catalog name
//! - [`Action`] - What a principal attempts; read-only actions are singled out
//! - [`ResourceShare`] / [`ResourcePermission`] - Resource-scoped authority
//! - [`Grantee`] - Exactly one user or one group
//! - [`CheckContext`] - Optional facts about the resource under check
//!
//! ## Expiry
//!
//! Every expiring record is live iff `expires_at` is unset or strictly in
//! the future. See [`is_live`].

pub mod context;
pub mod error;
pub mod permission;
pub mod role;
pub mod sharing;
pub mod time;
pub mod types;
pub mod validation;

pub use context::CheckContext;
pub use error::{Result, ValidationError};
pub use permission::{Action, Permission, PermissionName, RolePermission};
pub use role::{role_satisfies, Role, RoleAssignment};
pub use sharing::{
    Grantee, Group, GroupMembership, GroupRole, ResourcePermission, ResourceShare,
    SharePermission,
};
pub use time::{is_live, now_millis};
pub use types::{GroupId, PermissionId, ResourceId, UserId};
pub use validation::{validate_context, validate_request};

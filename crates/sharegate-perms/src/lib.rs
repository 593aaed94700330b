//! # Sharegate Permissions
//!
//! Resource-level grant resolution.
//!
//! ## Overview
//!
//! Role-derived permissions answer "may this role do X at all". This crate
//! answers "may this principal do X to this particular resource", from what
//! the caller knows about the resource and the shares and direct grants the
//! store holds for it. Resolution is pure: records are fetched by the caller
//! and judged here against an explicit clock.
//!
//! ## Resolution Order
//!
//! 1. **Owner**: the principal owns the resource, any action is allowed
//! 2. **Public read**: the resource is public and the action is `read`
//! 3. **Share**: the most permissive live share to the user or one of their
//!    groups allows the action (`write` covers read, view, update, delete,
//!    moderate and share; `read` covers read and view)
//! 4. **Direct grant**: a live grant names exactly the action
//! 5. Otherwise denied
//!
//! ## Usage
//!
//! ```rust
//! use sharegate_core::{Action, ResourceShare, ResourceId, Grantee, GroupId, SharePermission, UserId};
//! use sharegate_perms::{GrantDecision, GrantRequest};
//!
//! let alice = UserId::new("alice");
//! let action = Action::Delete;
//! let shares = vec![ResourceShare::new(
//!     ResourceId::new("doc"),
//!     Grantee::Group(GroupId::new("editors")),
//!     SharePermission::Write,
//! )];
//!
//! let decision = GrantRequest::new(&alice, &action, 0).resolve(&shares, &[]);
//! assert_eq!(decision, GrantDecision::Share(SharePermission::Write));
//! ```

pub mod grant;
pub mod resolver;

pub use grant::{effective_share_level, live_direct_grant};
pub use resolver::{GrantDecision, GrantRequest};

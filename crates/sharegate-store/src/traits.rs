//! Store traits: the abstract interfaces for authorization state.
//!
//! These traits allow the engine to be storage-agnostic. Implementations
//! include SQLite (primary) and in-memory (for tests).
//!
//! Read methods return raw records, expired ones included; expiry is judged
//! by the caller at check time so the same record can be reused across a
//! request without re-reading the clock in the store.

use async_trait::async_trait;
use sharegate_core::{
    Action, Grantee, Group, GroupId, GroupMembership, GroupRole, Permission, PermissionName,
    ResourceId, ResourcePermission, ResourceShare, Role, RoleAssignment, UserId,
};

use crate::error::Result;

/// Result of an idempotent insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertResult {
    /// The record was new.
    Inserted,
    /// An identical record already existed (not an error).
    AlreadyExists,
}

/// Result of asking the catalog whether a role holds a permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogLookup {
    /// A RolePermission edge exists.
    Granted,
    /// The permission exists but the role does not hold it.
    NotGranted,
    /// No permission with that name exists. A configuration error.
    UnknownPermission,
}

impl CatalogLookup {
    pub fn is_granted(self) -> bool {
        matches!(self, CatalogLookup::Granted)
    }
}

/// Persists each principal's current role assignment.
#[async_trait]
pub trait RoleStore: Send + Sync {
    /// Get the raw assignment, expired or not.
    async fn get_role_assignment(&self, user: &UserId) -> Result<Option<RoleAssignment>>;

    /// Get the role in force at `now`. An expired assignment is absent.
    async fn get_role(&self, user: &UserId, now: i64) -> Result<Option<Role>> {
        Ok(self
            .get_role_assignment(user)
            .await?
            .and_then(|a| a.active_role(now)))
    }

    /// Set a principal's assignment, replacing any previous one.
    async fn set_role(&self, assignment: &RoleAssignment) -> Result<()>;

    /// Remove a principal's assignment. Returns whether one existed.
    async fn remove_role(&self, user: &UserId) -> Result<bool>;

    /// All principals with an assignment to `role`, expired ones included.
    async fn users_with_role(&self, role: Role) -> Result<Vec<UserId>>;
}

/// Persists named permissions and the roles that hold them.
#[async_trait]
pub trait PermissionCatalog: Send + Sync {
    /// Create a permission. Fails with `Duplicate` if the name exists.
    async fn create_permission(
        &self,
        name: &PermissionName,
        description: Option<&str>,
    ) -> Result<Permission>;

    async fn get_permission(&self, name: &PermissionName) -> Result<Option<Permission>>;

    /// All permissions, ordered by name.
    async fn list_permissions(&self) -> Result<Vec<Permission>>;

    /// Delete a permission. Fails with `PermissionInUse` while any role holds
    /// it and with `NotFound` if it does not exist.
    async fn delete_permission(&self, name: &PermissionName) -> Result<()>;

    /// Bind a permission to a role. Idempotent.
    ///
    /// Fails with `NotFound` if the permission does not exist.
    async fn assign_permission(&self, role: Role, name: &PermissionName) -> Result<InsertResult>;

    /// Unbind a permission from a role. Returns whether an edge existed.
    async fn revoke_permission(&self, role: Role, name: &PermissionName) -> Result<bool>;

    /// Whether `role` holds `name`.
    async fn lookup(&self, role: Role, name: &PermissionName) -> Result<CatalogLookup>;

    /// Every permission bound to `role`, ordered by name.
    async fn permissions_for_role(&self, role: Role) -> Result<Vec<Permission>>;
}

/// Resolves users to the groups they belong to.
#[async_trait]
pub trait GroupIndex: Send + Sync {
    /// Create a group. The owner becomes an `admin` member.
    ///
    /// Fails with `Duplicate` if the group id exists.
    async fn create_group(&self, group: &Group) -> Result<()>;

    async fn get_group(&self, id: &GroupId) -> Result<Option<Group>>;

    /// Add a member, or change an existing member's sub-role.
    ///
    /// Fails with `NotFound` if the group does not exist.
    async fn add_member(
        &self,
        group: &GroupId,
        user: &UserId,
        role: GroupRole,
    ) -> Result<InsertResult>;

    /// Remove a member. Returns whether they were one.
    async fn remove_member(&self, group: &GroupId, user: &UserId) -> Result<bool>;

    async fn members(&self, group: &GroupId) -> Result<Vec<GroupMembership>>;

    /// Every group `user` belongs to, ordered by id.
    async fn groups_for_user(&self, user: &UserId) -> Result<Vec<GroupId>>;
}

/// Persists resource-scoped authority: shares and direct grants.
#[async_trait]
pub trait GrantStore: Send + Sync {
    /// Share a resource. Replaces the level and expiry of an existing share
    /// to the same grantee.
    async fn put_share(&self, share: &ResourceShare) -> Result<()>;

    /// Remove a share. Returns whether one existed.
    async fn remove_share(&self, resource: &ResourceId, grantee: &Grantee) -> Result<bool>;

    /// Shares of `resource` that target `user` or any of `groups`.
    async fn shares_for(
        &self,
        resource: &ResourceId,
        user: &UserId,
        groups: &[GroupId],
    ) -> Result<Vec<ResourceShare>>;

    /// Every share of `resource`.
    async fn list_shares(&self, resource: &ResourceId) -> Result<Vec<ResourceShare>>;

    /// Grant an action directly. Replaces the expiry of an existing grant
    /// with the same (resource, grantee, permission).
    async fn put_resource_permission(&self, grant: &ResourcePermission) -> Result<()>;

    /// Remove a direct grant. Returns whether one existed.
    async fn remove_resource_permission(
        &self,
        resource: &ResourceId,
        grantee: &Grantee,
        permission: &Action,
    ) -> Result<bool>;

    /// Direct grants on `resource` that target `user` or any of `groups`.
    async fn resource_permissions_for(
        &self,
        resource: &ResourceId,
        user: &UserId,
        groups: &[GroupId],
    ) -> Result<Vec<ResourcePermission>>;
}

/// Everything the resolution engine reads from.
pub trait AuthzStore: RoleStore + PermissionCatalog + GroupIndex + GrantStore {}

impl<T> AuthzStore for T where T: RoleStore + PermissionCatalog + GroupIndex + GrantStore + ?Sized {}

//! In-memory implementation of the store traits.
//!
//! This is primarily for testing. It has the same semantics as SQLite
//! but keeps everything in memory with no persistence.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use sharegate_core::{
    Action, Grantee, Group, GroupId, GroupMembership, GroupRole, Permission, PermissionId,
    PermissionName, ResourceId, ResourcePermission, ResourceShare, Role, RoleAssignment,
    UserId,
};

use crate::error::{Result, StoreError};
use crate::traits::{
    CatalogLookup, GrantStore, GroupIndex, InsertResult, PermissionCatalog, RoleStore,
};

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    /// Role assignments, one per principal.
    roles: HashMap<UserId, RoleAssignment>,

    /// Catalog, indexed by name.
    permissions: BTreeMap<PermissionName, Permission>,

    /// Last assigned permission id.
    last_permission_id: i64,

    /// RolePermission edges.
    role_permissions: BTreeSet<(Role, PermissionId)>,

    /// Groups by id.
    groups: HashMap<GroupId, Group>,

    /// Membership index: (group, user) -> sub-role.
    memberships: BTreeMap<(GroupId, UserId), GroupRole>,

    /// Shares keyed by (resource, grantee).
    shares: BTreeMap<(ResourceId, Grantee), ResourceShare>,

    /// Direct grants keyed by (resource, grantee, permission).
    grants: BTreeMap<(ResourceId, Grantee, Action), ResourcePermission>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryStoreInner::default()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryStoreInner>> {
        self.inner
            .read()
            .map_err(|e| StoreError::Unavailable(format!("lock poisoned: {}", e)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryStoreInner>> {
        self.inner
            .write()
            .map_err(|e| StoreError::Unavailable(format!("lock poisoned: {}", e)))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStoreInner {
    fn permission_id(&self, name: &PermissionName) -> Option<PermissionId> {
        self.permissions.get(name).map(|p| p.id)
    }

    fn roles_holding(&self, id: PermissionId) -> usize {
        self.role_permissions
            .iter()
            .filter(|(_, pid)| *pid == id)
            .count()
    }
}

#[async_trait]
impl RoleStore for MemoryStore {
    async fn get_role_assignment(&self, user: &UserId) -> Result<Option<RoleAssignment>> {
        let inner = self.read()?;
        Ok(inner.roles.get(user).cloned())
    }

    async fn set_role(&self, assignment: &RoleAssignment) -> Result<()> {
        assignment.user_id.validate()?;
        let mut inner = self.write()?;
        inner
            .roles
            .insert(assignment.user_id.clone(), assignment.clone());
        Ok(())
    }

    async fn remove_role(&self, user: &UserId) -> Result<bool> {
        let mut inner = self.write()?;
        Ok(inner.roles.remove(user).is_some())
    }

    async fn users_with_role(&self, role: Role) -> Result<Vec<UserId>> {
        let inner = self.read()?;
        let mut users: Vec<UserId> = inner
            .roles
            .values()
            .filter(|a| a.role == role)
            .map(|a| a.user_id.clone())
            .collect();
        users.sort();
        Ok(users)
    }
}

#[async_trait]
impl PermissionCatalog for MemoryStore {
    async fn create_permission(
        &self,
        name: &PermissionName,
        description: Option<&str>,
    ) -> Result<Permission> {
        let mut inner = self.write()?;

        if inner.permissions.contains_key(name) {
            return Err(StoreError::Duplicate(format!("permission {}", name)));
        }

        inner.last_permission_id += 1;
        let permission = Permission {
            id: PermissionId(inner.last_permission_id),
            name: name.clone(),
            description: description.map(String::from),
        };
        inner.permissions.insert(name.clone(), permission.clone());

        Ok(permission)
    }

    async fn get_permission(&self, name: &PermissionName) -> Result<Option<Permission>> {
        let inner = self.read()?;
        Ok(inner.permissions.get(name).cloned())
    }

    async fn list_permissions(&self) -> Result<Vec<Permission>> {
        let inner = self.read()?;
        Ok(inner.permissions.values().cloned().collect())
    }

    async fn delete_permission(&self, name: &PermissionName) -> Result<()> {
        let mut inner = self.write()?;

        let id = inner
            .permission_id(name)
            .ok_or_else(|| StoreError::NotFound(format!("permission {}", name)))?;

        let roles = inner.roles_holding(id);
        if roles > 0 {
            return Err(StoreError::PermissionInUse {
                name: name.to_string(),
                roles,
            });
        }

        inner.permissions.remove(name);
        Ok(())
    }

    async fn assign_permission(&self, role: Role, name: &PermissionName) -> Result<InsertResult> {
        let mut inner = self.write()?;

        let id = inner
            .permission_id(name)
            .ok_or_else(|| StoreError::NotFound(format!("permission {}", name)))?;

        if inner.role_permissions.insert((role, id)) {
            Ok(InsertResult::Inserted)
        } else {
            Ok(InsertResult::AlreadyExists)
        }
    }

    async fn revoke_permission(&self, role: Role, name: &PermissionName) -> Result<bool> {
        let mut inner = self.write()?;
        match inner.permission_id(name) {
            Some(id) => Ok(inner.role_permissions.remove(&(role, id))),
            None => Ok(false),
        }
    }

    async fn lookup(&self, role: Role, name: &PermissionName) -> Result<CatalogLookup> {
        let inner = self.read()?;
        let Some(id) = inner.permission_id(name) else {
            return Ok(CatalogLookup::UnknownPermission);
        };

        if inner.role_permissions.contains(&(role, id)) {
            Ok(CatalogLookup::Granted)
        } else {
            Ok(CatalogLookup::NotGranted)
        }
    }

    async fn permissions_for_role(&self, role: Role) -> Result<Vec<Permission>> {
        let inner = self.read()?;
        Ok(inner
            .permissions
            .values()
            .filter(|p| inner.role_permissions.contains(&(role, p.id)))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl GroupIndex for MemoryStore {
    async fn create_group(&self, group: &Group) -> Result<()> {
        group.id.validate()?;
        group.owner_id.validate()?;
        let mut inner = self.write()?;

        if inner.groups.contains_key(&group.id) {
            return Err(StoreError::Duplicate(format!("group {}", group.id)));
        }

        inner.groups.insert(group.id.clone(), group.clone());
        inner
            .memberships
            .insert((group.id.clone(), group.owner_id.clone()), GroupRole::Admin);
        Ok(())
    }

    async fn get_group(&self, id: &GroupId) -> Result<Option<Group>> {
        let inner = self.read()?;
        Ok(inner.groups.get(id).cloned())
    }

    async fn add_member(
        &self,
        group: &GroupId,
        user: &UserId,
        role: GroupRole,
    ) -> Result<InsertResult> {
        user.validate()?;
        let mut inner = self.write()?;

        if !inner.groups.contains_key(group) {
            return Err(StoreError::NotFound(format!("group {}", group)));
        }

        match inner.memberships.insert((group.clone(), user.clone()), role) {
            None => Ok(InsertResult::Inserted),
            Some(_) => Ok(InsertResult::AlreadyExists),
        }
    }

    async fn remove_member(&self, group: &GroupId, user: &UserId) -> Result<bool> {
        let mut inner = self.write()?;
        Ok(inner
            .memberships
            .remove(&(group.clone(), user.clone()))
            .is_some())
    }

    async fn members(&self, group: &GroupId) -> Result<Vec<GroupMembership>> {
        let inner = self.read()?;
        Ok(inner
            .memberships
            .iter()
            .filter(|((gid, _), _)| gid == group)
            .map(|((gid, uid), role)| GroupMembership {
                group_id: gid.clone(),
                user_id: uid.clone(),
                role: *role,
            })
            .collect())
    }

    async fn groups_for_user(&self, user: &UserId) -> Result<Vec<GroupId>> {
        let inner = self.read()?;
        Ok(inner
            .memberships
            .keys()
            .filter(|(_, uid)| uid == user)
            .map(|(gid, _)| gid.clone())
            .collect())
    }
}

#[async_trait]
impl GrantStore for MemoryStore {
    async fn put_share(&self, share: &ResourceShare) -> Result<()> {
        share.resource_id.validate()?;
        share.grantee.validate()?;
        let mut inner = self.write()?;
        inner.shares.insert(
            (share.resource_id.clone(), share.grantee.clone()),
            share.clone(),
        );
        Ok(())
    }

    async fn remove_share(&self, resource: &ResourceId, grantee: &Grantee) -> Result<bool> {
        let mut inner = self.write()?;
        Ok(inner
            .shares
            .remove(&(resource.clone(), grantee.clone()))
            .is_some())
    }

    async fn shares_for(
        &self,
        resource: &ResourceId,
        user: &UserId,
        groups: &[GroupId],
    ) -> Result<Vec<ResourceShare>> {
        let inner = self.read()?;
        Ok(inner
            .shares
            .values()
            .filter(|s| &s.resource_id == resource && s.grantee.covers(user, groups))
            .cloned()
            .collect())
    }

    async fn list_shares(&self, resource: &ResourceId) -> Result<Vec<ResourceShare>> {
        let inner = self.read()?;
        Ok(inner
            .shares
            .values()
            .filter(|s| &s.resource_id == resource)
            .cloned()
            .collect())
    }

    async fn put_resource_permission(&self, grant: &ResourcePermission) -> Result<()> {
        grant.resource_id.validate()?;
        grant.grantee.validate()?;
        grant.permission.validate()?;
        let mut inner = self.write()?;
        inner.grants.insert(
            (
                grant.resource_id.clone(),
                grant.grantee.clone(),
                grant.permission.clone(),
            ),
            grant.clone(),
        );
        Ok(())
    }

    async fn remove_resource_permission(
        &self,
        resource: &ResourceId,
        grantee: &Grantee,
        permission: &Action,
    ) -> Result<bool> {
        let mut inner = self.write()?;
        Ok(inner
            .grants
            .remove(&(resource.clone(), grantee.clone(), permission.clone()))
            .is_some())
    }

    async fn resource_permissions_for(
        &self,
        resource: &ResourceId,
        user: &UserId,
        groups: &[GroupId],
    ) -> Result<Vec<ResourcePermission>> {
        let inner = self.read()?;
        Ok(inner
            .grants
            .values()
            .filter(|g| &g.resource_id == resource && g.grantee.covers(user, groups))
            .cloned()
            .collect())
    }
}

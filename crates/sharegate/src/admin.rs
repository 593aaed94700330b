//! Administrative write path.
//!
//! Each operation writes to the store and then invalidates whatever cached
//! entries the write made stale. Unlike checks, these surface errors.

use std::sync::Arc;

use tracing::info;

use sharegate_core::{
    Action, Grantee, Group, GroupId, GroupRole, Permission, PermissionName, ResourceId,
    ResourcePermission, ResourceShare, Role, RoleAssignment, SharePermission, UserId,
};
use sharegate_store::{
    AuthzStore, GrantStore, GroupIndex, InsertResult, PermissionCatalog, RoleStore,
};

use crate::engine::ResolutionEngine;
use crate::error::Result;

/// Mutates roles, the catalog, groups and grants on behalf of an
/// administrator, keeping the engine's cache consistent.
pub struct AdminService<S: AuthzStore> {
    engine: Arc<ResolutionEngine<S>>,
}

impl<S: AuthzStore> AdminService<S> {
    pub fn new(engine: Arc<ResolutionEngine<S>>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &Arc<ResolutionEngine<S>> {
        &self.engine
    }

    fn store(&self) -> &S {
        self.engine.store()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Roles
    // ─────────────────────────────────────────────────────────────────────────

    /// Assign `role` to `user`, replacing any previous assignment.
    pub async fn assign_role(
        &self,
        user: &UserId,
        role: Role,
        expires_at: Option<i64>,
    ) -> Result<()> {
        user.validate()?;
        let assignment = RoleAssignment {
            user_id: user.clone(),
            role,
            expires_at,
        };

        self.engine
            .store_call(self.store().set_role(&assignment))
            .await?;
        info!(user_id = %user, role = %role, ?expires_at, "assigned role");

        self.engine.invalidate_user_cache(user).await;
        Ok(())
    }

    /// Remove the role of `user`. Returns whether there was one.
    pub async fn revoke_role(&self, user: &UserId) -> Result<bool> {
        user.validate()?;
        let removed = self
            .engine
            .store_call(self.store().remove_role(user))
            .await?;
        info!(user_id = %user, removed, "revoked role");

        self.engine.invalidate_user_cache(user).await;
        Ok(removed)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Catalog
    // ─────────────────────────────────────────────────────────────────────────

    /// Create `resource:action`. Fails if it exists.
    pub async fn create_permission(
        &self,
        resource: &str,
        action: &Action,
        description: Option<&str>,
    ) -> Result<Permission> {
        action.validate()?;
        let name = PermissionName::new(resource, action)?;

        let permission = self
            .engine
            .store_call(self.store().create_permission(&name, description))
            .await?;
        info!(permission = %name, id = %permission.id, "created permission");
        Ok(permission)
    }

    /// Delete a permission no role holds. Nothing cached can reference it.
    pub async fn delete_permission(&self, name: &PermissionName) -> Result<()> {
        self.engine
            .store_call(self.store().delete_permission(name))
            .await?;
        info!(permission = %name, "deleted permission");
        Ok(())
    }

    /// Bind a permission to `role` and invalidate every holder of the role.
    pub async fn grant_permission_to_role(
        &self,
        role: Role,
        name: &PermissionName,
    ) -> Result<InsertResult> {
        let result = self
            .engine
            .store_call(self.store().assign_permission(role, name))
            .await?;
        info!(role = %role, permission = %name, ?result, "granted permission to role");

        // Also on `AlreadyExists`: a retry must still clear what an earlier
        // failed call left stale.
        self.invalidate_role_holders(role).await?;
        Ok(result)
    }

    /// Unbind a permission from `role` and invalidate every holder of the role.
    pub async fn revoke_permission_from_role(
        &self,
        role: Role,
        name: &PermissionName,
    ) -> Result<bool> {
        let removed = self
            .engine
            .store_call(self.store().revoke_permission(role, name))
            .await?;
        info!(role = %role, permission = %name, removed, "revoked permission from role");

        self.invalidate_role_holders(role).await?;
        Ok(removed)
    }

    /// Invalidate every user assigned `role`. Returns how many there were.
    async fn invalidate_role_holders(&self, role: Role) -> Result<usize> {
        let users = self
            .engine
            .store_call(self.store().users_with_role(role))
            .await?;

        for user in &users {
            self.engine.invalidate_user_cache(user).await;
        }
        Ok(users.len())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Groups
    // ─────────────────────────────────────────────────────────────────────────

    /// Create a group. The owner becomes an admin member.
    pub async fn create_group(&self, id: &GroupId, name: &str, owner: &UserId) -> Result<Group> {
        let group = Group {
            id: id.clone(),
            name: name.to_string(),
            owner_id: owner.clone(),
        };

        self.engine
            .store_call(self.store().create_group(&group))
            .await?;
        info!(group_id = %id, owner_id = %owner, "created group");
        Ok(group)
    }

    pub async fn add_group_member(
        &self,
        group: &GroupId,
        user: &UserId,
        role: GroupRole,
    ) -> Result<InsertResult> {
        let result = self
            .engine
            .store_call(self.store().add_member(group, user, role))
            .await?;
        info!(group_id = %group, user_id = %user, role = role.as_str(), "added group member");
        Ok(result)
    }

    pub async fn remove_group_member(&self, group: &GroupId, user: &UserId) -> Result<bool> {
        let removed = self
            .engine
            .store_call(self.store().remove_member(group, user))
            .await?;
        info!(group_id = %group, user_id = %user, removed, "removed group member");
        Ok(removed)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Shares and direct grants
    // ─────────────────────────────────────────────────────────────────────────

    /// Share a resource, replacing any share to the same grantee.
    pub async fn share_resource(
        &self,
        resource: &ResourceId,
        grantee: &Grantee,
        level: SharePermission,
        expires_at: Option<i64>,
    ) -> Result<ResourceShare> {
        let share = ResourceShare {
            resource_id: resource.clone(),
            grantee: grantee.clone(),
            permission: level,
            expires_at,
        };

        self.engine
            .store_call(self.store().put_share(&share))
            .await?;
        info!(resource_id = %resource, grantee = %grantee, level = %level, ?expires_at, "shared resource");
        Ok(share)
    }

    pub async fn unshare_resource(&self, resource: &ResourceId, grantee: &Grantee) -> Result<bool> {
        let removed = self
            .engine
            .store_call(self.store().remove_share(resource, grantee))
            .await?;
        info!(resource_id = %resource, grantee = %grantee, removed, "unshared resource");
        Ok(removed)
    }

    /// Grant `action` on a resource directly.
    pub async fn grant_resource_permission(
        &self,
        resource: &ResourceId,
        grantee: &Grantee,
        action: &Action,
        expires_at: Option<i64>,
    ) -> Result<ResourcePermission> {
        let grant = ResourcePermission {
            resource_id: resource.clone(),
            grantee: grantee.clone(),
            permission: action.clone(),
            expires_at,
        };

        self.engine
            .store_call(self.store().put_resource_permission(&grant))
            .await?;
        info!(resource_id = %resource, grantee = %grantee, action = %action, ?expires_at, "granted resource permission");
        Ok(grant)
    }

    pub async fn revoke_resource_permission(
        &self,
        resource: &ResourceId,
        grantee: &Grantee,
        action: &Action,
    ) -> Result<bool> {
        let removed = self
            .engine
            .store_call(self.store().remove_resource_permission(resource, grantee, action))
            .await?;
        info!(resource_id = %resource, grantee = %grantee, action = %action, removed, "revoked resource permission");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::error::EngineError;
    use sharegate_store::{MemoryStore, StoreError};

    fn admin() -> AdminService<MemoryStore> {
        let engine = ResolutionEngine::with_memory_cache(
            Arc::new(MemoryStore::new()),
            EngineConfig::default(),
        );
        AdminService::new(Arc::new(engine))
    }

    #[tokio::test]
    async fn test_revoke_role_takes_effect_through_warm_cache() {
        let admin = admin();
        let alice = UserId::new("alice");

        admin.assign_role(&alice, Role::Admin, None).await.unwrap();
        assert!(admin.engine().has_role(&alice, Role::Admin).await);

        admin.revoke_role(&alice).await.unwrap();
        assert!(!admin.engine().has_role(&alice, Role::Guest).await);
    }

    #[tokio::test]
    async fn test_role_permission_changes_reach_holders() {
        let admin = admin();
        let alice = UserId::new("alice");
        let bob = UserId::new("bob");

        admin.assign_role(&alice, Role::User, None).await.unwrap();
        admin.assign_role(&bob, Role::User, None).await.unwrap();
        let perm = admin
            .create_permission("resource", &Action::Create, None)
            .await
            .unwrap();

        // Warm both caches with the empty set
        assert!(admin.engine().get_user_permissions(&alice).await.is_empty());
        assert!(admin.engine().get_user_permissions(&bob).await.is_empty());

        let result = admin
            .grant_permission_to_role(Role::User, &perm.name)
            .await
            .unwrap();
        assert_eq!(result, InsertResult::Inserted);
        assert!(admin.engine().get_user_permissions(&alice).await.contains(&perm.name));
        assert!(admin.engine().has_permission(&bob, "resource", &Action::Create).await);

        let again = admin
            .grant_permission_to_role(Role::User, &perm.name)
            .await
            .unwrap();
        assert_eq!(again, InsertResult::AlreadyExists);

        assert!(admin
            .revoke_permission_from_role(Role::User, &perm.name)
            .await
            .unwrap());
        assert!(!admin.engine().has_permission(&bob, "resource", &Action::Create).await);
    }

    #[tokio::test]
    async fn test_delete_permission_guard() {
        let admin = admin();
        let perm = admin
            .create_permission("resource", &Action::Delete, Some("Delete resources"))
            .await
            .unwrap();
        admin
            .grant_permission_to_role(Role::Admin, &perm.name)
            .await
            .unwrap();

        let err = admin.delete_permission(&perm.name).await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::Store(StoreError::PermissionInUse { .. })
        ));

        admin
            .revoke_permission_from_role(Role::Admin, &perm.name)
            .await
            .unwrap();
        admin.delete_permission(&perm.name).await.unwrap();
    }

    #[tokio::test]
    async fn test_create_permission_rejects_malformed() {
        let admin = admin();
        let err = admin
            .create_permission("bad resource", &Action::Read, None)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[tokio::test]
    async fn test_share_and_unshare() {
        let admin = admin();
        let doc = ResourceId::new("doc");
        let alice = UserId::new("alice");
        let grantee = Grantee::User(alice.clone());
        let ctx = sharegate_core::CheckContext::for_resource("doc").owner("carol");

        admin
            .share_resource(&doc, &grantee, SharePermission::Read, None)
            .await
            .unwrap();
        assert!(admin.engine().has_resource_grant(&alice, &Action::View, &ctx).await);
        assert!(!admin.engine().has_resource_grant(&alice, &Action::Update, &ctx).await);

        admin
            .grant_resource_permission(&doc, &grantee, &Action::Update, None)
            .await
            .unwrap();
        assert!(admin.engine().has_resource_grant(&alice, &Action::Update, &ctx).await);

        assert!(admin.unshare_resource(&doc, &grantee).await.unwrap());
        assert!(admin
            .revoke_resource_permission(&doc, &grantee, &Action::Update)
            .await
            .unwrap());
        assert!(!admin.engine().has_resource_grant(&alice, &Action::View, &ctx).await);
    }
}

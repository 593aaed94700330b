//! Fault injection: caches and stores that fail on demand.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use sharegate_cache::{CacheBackend, CacheError};
use sharegate_core::{
    Action, Grantee, Group, GroupId, GroupMembership, GroupRole, Permission, PermissionName,
    ResourceId, ResourcePermission, ResourceShare, Role, RoleAssignment, UserId,
};
use sharegate_store::{
    CatalogLookup, GrantStore, GroupIndex, InsertResult, MemoryStore, PermissionCatalog,
    RoleStore, StoreError,
};

// ─────────────────────────────────────────────────────────────────────────────
// Caches
// ─────────────────────────────────────────────────────────────────────────────

/// A cache backend whose every call fails. Counts the calls it refused.
#[derive(Debug, Default)]
pub struct FailingCache {
    calls: AtomicUsize,
}

impl FailingCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn refuse<T>(&self) -> sharegate_cache::Result<T> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(CacheError::Unavailable("injected cache outage".into()))
    }
}

#[async_trait]
impl CacheBackend for FailingCache {
    async fn get(&self, _key: &str) -> sharegate_cache::Result<Option<Bytes>> {
        self.refuse()
    }

    async fn set(&self, _key: &str, _value: Bytes, _ttl: Duration) -> sharegate_cache::Result<()> {
        self.refuse()
    }

    async fn delete(&self, _key: &str) -> sharegate_cache::Result<()> {
        self.refuse()
    }
}

/// A cache backend that never answers.
#[derive(Debug, Default)]
pub struct HangingCache;

#[async_trait]
impl CacheBackend for HangingCache {
    async fn get(&self, _key: &str) -> sharegate_cache::Result<Option<Bytes>> {
        std::future::pending().await
    }

    async fn set(&self, _key: &str, _value: Bytes, _ttl: Duration) -> sharegate_cache::Result<()> {
        std::future::pending().await
    }

    async fn delete(&self, _key: &str) -> sharegate_cache::Result<()> {
        std::future::pending().await
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Stores
// ─────────────────────────────────────────────────────────────────────────────

/// A store that delegates to an inner [`MemoryStore`] until switched off,
/// then fails every call with [`StoreError::Unavailable`].
#[derive(Default)]
pub struct FailingStore {
    inner: MemoryStore,
    failing: AtomicBool,
    fail_next_role_listing: AtomicBool,
}

impl FailingStore {
    /// A healthy store that can be switched off later.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that is down from the start.
    pub fn down() -> Self {
        let store = Self::new();
        store.set_failing(true);
        store
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Fail the next `users_with_role` call only.
    pub fn fail_next_role_listing(&self) {
        self.fail_next_role_listing.store(true, Ordering::SeqCst);
    }

    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }

    fn check(&self) -> sharegate_store::Result<&MemoryStore> {
        if self.failing.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("injected store outage".into()))
        } else {
            Ok(&self.inner)
        }
    }
}

type StoreResult<T> = sharegate_store::Result<T>;

#[async_trait]
impl RoleStore for FailingStore {
    async fn get_role_assignment(&self, user: &UserId) -> StoreResult<Option<RoleAssignment>> {
        self.check()?.get_role_assignment(user).await
    }

    async fn set_role(&self, assignment: &RoleAssignment) -> StoreResult<()> {
        self.check()?.set_role(assignment).await
    }

    async fn remove_role(&self, user: &UserId) -> StoreResult<bool> {
        self.check()?.remove_role(user).await
    }

    async fn users_with_role(&self, role: Role) -> StoreResult<Vec<UserId>> {
        if self.fail_next_role_listing.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected role listing failure".into()));
        }
        self.check()?.users_with_role(role).await
    }
}

#[async_trait]
impl PermissionCatalog for FailingStore {
    async fn create_permission(
        &self,
        name: &PermissionName,
        description: Option<&str>,
    ) -> StoreResult<Permission> {
        self.check()?.create_permission(name, description).await
    }

    async fn get_permission(&self, name: &PermissionName) -> StoreResult<Option<Permission>> {
        self.check()?.get_permission(name).await
    }

    async fn list_permissions(&self) -> StoreResult<Vec<Permission>> {
        self.check()?.list_permissions().await
    }

    async fn delete_permission(&self, name: &PermissionName) -> StoreResult<()> {
        self.check()?.delete_permission(name).await
    }

    async fn assign_permission(
        &self,
        role: Role,
        name: &PermissionName,
    ) -> StoreResult<InsertResult> {
        self.check()?.assign_permission(role, name).await
    }

    async fn revoke_permission(&self, role: Role, name: &PermissionName) -> StoreResult<bool> {
        self.check()?.revoke_permission(role, name).await
    }

    async fn lookup(&self, role: Role, name: &PermissionName) -> StoreResult<CatalogLookup> {
        self.check()?.lookup(role, name).await
    }

    async fn permissions_for_role(&self, role: Role) -> StoreResult<Vec<Permission>> {
        self.check()?.permissions_for_role(role).await
    }
}

#[async_trait]
impl GroupIndex for FailingStore {
    async fn create_group(&self, group: &Group) -> StoreResult<()> {
        self.check()?.create_group(group).await
    }

    async fn get_group(&self, id: &GroupId) -> StoreResult<Option<Group>> {
        self.check()?.get_group(id).await
    }

    async fn add_member(
        &self,
        group: &GroupId,
        user: &UserId,
        role: GroupRole,
    ) -> StoreResult<InsertResult> {
        self.check()?.add_member(group, user, role).await
    }

    async fn remove_member(&self, group: &GroupId, user: &UserId) -> StoreResult<bool> {
        self.check()?.remove_member(group, user).await
    }

    async fn members(&self, group: &GroupId) -> StoreResult<Vec<GroupMembership>> {
        self.check()?.members(group).await
    }

    async fn groups_for_user(&self, user: &UserId) -> StoreResult<Vec<GroupId>> {
        self.check()?.groups_for_user(user).await
    }
}

#[async_trait]
impl GrantStore for FailingStore {
    async fn put_share(&self, share: &ResourceShare) -> StoreResult<()> {
        self.check()?.put_share(share).await
    }

    async fn remove_share(&self, resource: &ResourceId, grantee: &Grantee) -> StoreResult<bool> {
        self.check()?.remove_share(resource, grantee).await
    }

    async fn shares_for(
        &self,
        resource: &ResourceId,
        user: &UserId,
        groups: &[GroupId],
    ) -> StoreResult<Vec<ResourceShare>> {
        self.check()?.shares_for(resource, user, groups).await
    }

    async fn list_shares(&self, resource: &ResourceId) -> StoreResult<Vec<ResourceShare>> {
        self.check()?.list_shares(resource).await
    }

    async fn put_resource_permission(&self, grant: &ResourcePermission) -> StoreResult<()> {
        self.check()?.put_resource_permission(grant).await
    }

    async fn remove_resource_permission(
        &self,
        resource: &ResourceId,
        grantee: &Grantee,
        permission: &Action,
    ) -> StoreResult<bool> {
        self.check()?
            .remove_resource_permission(resource, grantee, permission)
            .await
    }

    async fn resource_permissions_for(
        &self,
        resource: &ResourceId,
        user: &UserId,
        groups: &[GroupId],
    ) -> StoreResult<Vec<ResourcePermission>> {
        self.check()?
            .resource_permissions_for(resource, user, groups)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_failing_cache_counts_refusals() {
        let cache = FailingCache::new();
        assert!(cache.get("k").await.is_err());
        assert!(cache.delete("k").await.is_err());
        assert_eq!(cache.calls(), 2);
    }

    #[tokio::test]
    async fn test_failing_store_switches() {
        let store = FailingStore::new();
        let alice = UserId::new("alice");
        store
            .set_role(&RoleAssignment::new(alice.clone(), Role::User))
            .await
            .unwrap();

        store.set_failing(true);
        assert!(matches!(
            store.get_role_assignment(&alice).await,
            Err(StoreError::Unavailable(_))
        ));

        store.set_failing(false);
        assert!(store.get_role_assignment(&alice).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_role_listing_fails_once() {
        let store = FailingStore::new();
        store.fail_next_role_listing();

        assert!(store.users_with_role(Role::User).await.is_err());
        assert!(store.users_with_role(Role::User).await.is_ok());
    }
}

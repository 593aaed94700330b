//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::sync::{Arc, Once};

use rand::distributions::Alphanumeric;
use rand::Rng;

use sharegate::{AdminService, EngineConfig, ResolutionEngine};
use sharegate_cache::{CacheBackend, MemoryCache};
use sharegate_core::{now_millis, Action, GroupId, GroupRole, PermissionName, Role, UserId};
use sharegate_store::{AuthzStore, MemoryStore, SqliteStore};

/// Catalog seeded by [`TestWorld::seed_catalog`]: each role and the
/// `resource:*` actions it holds.
pub const STANDARD_CATALOG: &[(Role, &[&str])] = &[
    (Role::Guest, &["read"]),
    (Role::User, &["read", "create", "write"]),
    (Role::Moderator, &["read", "create", "write", "delete", "moderate"]),
    (Role::Admin, &["read", "create", "write", "delete", "moderate", "share"]),
    (Role::SuperAdmin, &["read", "create", "write", "delete", "moderate", "share"]),
];

static TRACING: Once = Once::new();

/// Route `tracing` output through the test harness's captured writer.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing_subscriber::filter::LevelFilter::DEBUG)
            .try_init();
    });
}

/// A user id no other test uses.
pub fn fresh_user_id() -> UserId {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(12)
        .map(char::from)
        .collect();
    UserId::new(format!("user-{}", suffix))
}

/// An engine, its admin service, and the store behind both.
pub struct TestWorld<S: AuthzStore> {
    pub store: Arc<S>,
    pub engine: Arc<ResolutionEngine<S>>,
    pub admin: AdminService<S>,
}

impl TestWorld<MemoryStore> {
    /// In-memory store, in-memory cache, default config.
    pub fn memory() -> Self {
        Self::with_store(MemoryStore::new(), EngineConfig::default())
    }
}

impl TestWorld<SqliteStore> {
    /// In-memory SQLite store, in-memory cache, default config.
    pub fn sqlite() -> Self {
        let store = match SqliteStore::open_memory() {
            Ok(store) => store,
            Err(e) => panic!("failed to open in-memory sqlite: {}", e),
        };
        Self::with_store(store, EngineConfig::default())
    }
}

impl<S: AuthzStore> TestWorld<S> {
    pub fn with_store(store: S, config: EngineConfig) -> Self {
        let cache = Arc::new(MemoryCache::with_capacity(config.cache_capacity));
        Self::with_parts(Arc::new(store), cache, config)
    }

    /// Build a world over shared parts, so several engines can see one store.
    pub fn with_parts(store: Arc<S>, cache: Arc<dyn CacheBackend>, config: EngineConfig) -> Self {
        init_tracing();
        let engine = Arc::new(ResolutionEngine::new(store.clone(), cache, config));
        let admin = AdminService::new(engine.clone());
        Self {
            store,
            engine,
            admin,
        }
    }

    pub fn now(&self) -> i64 {
        now_millis()
    }

    /// Create the [`STANDARD_CATALOG`] permissions and bind them.
    pub async fn seed_catalog(&self) {
        for action in ["read", "create", "write", "delete", "moderate", "share"] {
            self.admin
                .create_permission("resource", &Action::from(action), None)
                .await
                .unwrap();
        }
        for (role, actions) in STANDARD_CATALOG {
            for action in *actions {
                self.admin
                    .grant_permission_to_role(*role, &permission("resource", action))
                    .await
                    .unwrap();
            }
        }
    }

    /// Assign `role` to a new user id derived from `name`.
    pub async fn user(&self, name: &str, role: Role) -> UserId {
        let user = UserId::new(name);
        self.admin.assign_role(&user, role, None).await.unwrap();
        user
    }

    /// Assign `role` to `name`, expiring at `expires_at`.
    pub async fn user_until(&self, name: &str, role: Role, expires_at: i64) -> UserId {
        let user = UserId::new(name);
        self.admin
            .assign_role(&user, role, Some(expires_at))
            .await
            .unwrap();
        user
    }

    /// Create a group owned by `owner` with `members` as plain members.
    pub async fn group(&self, id: &str, owner: &UserId, members: &[&UserId]) -> GroupId {
        let group = GroupId::new(id);
        self.admin.create_group(&group, id, owner).await.unwrap();
        for member in members {
            self.admin
                .add_group_member(&group, member, GroupRole::Member)
                .await
                .unwrap();
        }
        group
    }
}

/// `resource:action`, panicking on a malformed name.
pub fn permission(resource: &str, action: &str) -> PermissionName {
    match PermissionName::new(resource, &Action::from(action)) {
        Ok(name) => name,
        Err(e) => panic!("bad permission {}:{}: {}", resource, action, e),
    }
}

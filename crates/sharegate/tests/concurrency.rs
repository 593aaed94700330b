//! The engine is shared by `Arc` across concurrent request handlers.

use std::sync::Arc;

use sharegate::core::{Grantee, ResourceId, SharePermission};
use sharegate::store::{MemoryStore, SqliteStore};
use sharegate::{Action, AdminService, CheckContext, EngineConfig, ResolutionEngine, Role, UserId};

async fn seed<S: sharegate::store::AuthzStore>(admin: &AdminService<S>, users: usize) {
    let read = admin
        .create_permission("resource", &Action::Read, None)
        .await
        .unwrap();
    admin
        .grant_permission_to_role(Role::User, &read.name)
        .await
        .unwrap();

    for i in 0..users {
        let user = UserId::new(format!("user-{}", i));
        admin.assign_role(&user, Role::User, None).await.unwrap();
        if i % 2 == 0 {
            admin
                .share_resource(
                    &ResourceId::new("doc"),
                    &Grantee::User(user),
                    SharePermission::Read,
                    None,
                )
                .await
                .unwrap();
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_checks_memory_store() {
    let engine = Arc::new(ResolutionEngine::with_memory_cache(
        Arc::new(MemoryStore::new()),
        EngineConfig::default(),
    ));
    let admin = AdminService::new(engine.clone());
    seed(&admin, 16).await;

    let mut handles = Vec::new();
    for round in 0..4 {
        for i in 0..16 {
            let engine = engine.clone();
            handles.push(tokio::spawn(async move {
                let user = UserId::new(format!("user-{}", i));
                let ctx = CheckContext::for_resource("doc").owner("owner");
                let allowed = engine
                    .can_perform_action(&user, "resource", &Action::Read, Some(&ctx))
                    .await;
                (round, i, allowed)
            }));
        }
    }

    for handle in handles {
        let (round, i, allowed) = handle.await.unwrap();
        assert_eq!(allowed, i % 2 == 0, "round {} user {}", round, i);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_checks_sqlite_store() {
    let engine = Arc::new(ResolutionEngine::with_memory_cache(
        Arc::new(SqliteStore::open_memory().unwrap()),
        EngineConfig::default(),
    ));
    let admin = AdminService::new(engine.clone());
    seed(&admin, 8).await;

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let engine = engine.clone();
            tokio::spawn(async move {
                let user = UserId::new(format!("user-{}", i));
                (i, engine.has_role(&user, Role::User).await)
            })
        })
        .collect();

    for handle in handles {
        let (i, has_role) = handle.await.unwrap();
        assert!(has_role, "user {}", i);
    }
}

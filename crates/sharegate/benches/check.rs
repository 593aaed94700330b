use std::sync::Arc;

use criterion::{criterion_group, criterion_main, Criterion};

use sharegate::core::{Grantee, GroupId, GroupRole, ResourceId, SharePermission};
use sharegate::store::MemoryStore;
use sharegate::{Action, AdminService, CheckContext, EngineConfig, ResolutionEngine, Role, UserId};

fn setup(rt: &tokio::runtime::Runtime, config: EngineConfig) -> Arc<ResolutionEngine<MemoryStore>> {
    rt.block_on(async {
        let engine = Arc::new(ResolutionEngine::with_memory_cache(
            Arc::new(MemoryStore::new()),
            config,
        ));
        let admin = AdminService::new(engine.clone());

        let read = admin
            .create_permission("resource", &Action::Read, None)
            .await
            .unwrap();
        admin
            .grant_permission_to_role(Role::User, &read.name)
            .await
            .unwrap();
        admin
            .assign_role(&UserId::new("alice"), Role::User, None)
            .await
            .unwrap();

        let editors = GroupId::new("editors");
        admin
            .create_group(&editors, "Editors", &UserId::new("carol"))
            .await
            .unwrap();
        admin
            .add_group_member(&editors, &UserId::new("alice"), GroupRole::Member)
            .await
            .unwrap();
        admin
            .share_resource(
                &ResourceId::new("doc"),
                &Grantee::Group(editors),
                SharePermission::Write,
                None,
            )
            .await
            .unwrap();

        engine
    })
}

fn bench_has_permission(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let alice = UserId::new("alice");

    let cached = setup(&rt, EngineConfig::default());
    c.bench_function("has_permission/cached", |b| {
        b.iter(|| rt.block_on(cached.has_permission(&alice, "resource", &Action::Read)))
    });

    let uncached = setup(&rt, EngineConfig::uncached());
    c.bench_function("has_permission/uncached", |b| {
        b.iter(|| rt.block_on(uncached.has_permission(&alice, "resource", &Action::Read)))
    });
}

fn bench_check_permission(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let engine = setup(&rt, EngineConfig::default());
    let alice = UserId::new("alice");
    let ctx = CheckContext::for_resource("doc").owner("carol");

    c.bench_function("check_permission/group_share", |b| {
        b.iter(|| {
            rt.block_on(engine.check_permission(&alice, "resource", &Action::Delete, Some(&ctx)))
        })
    });
}

criterion_group!(benches, bench_has_permission, bench_check_permission);
criterion_main!(benches);

//! Resource-level grant resolution.
//!
//! A check short-circuits through ownership, public read, shares and direct
//! grants, in that order. Each stage is exposed on its own so the engine can
//! skip the lookups a stage would need once an earlier one has decided.

use std::fmt;

use serde::Serialize;

use sharegate_core::{
    Action, CheckContext, ResourcePermission, ResourceShare, SharePermission, UserId,
};

use crate::grant::{effective_share_level, live_direct_grant};

/// Why a resource-level check allowed or denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "reason", content = "level")]
pub enum GrantDecision {
    /// The principal owns the resource.
    Owner,
    /// The resource is public and the action is `read`.
    PublicRead,
    /// A live share at this level allows the action.
    Share(SharePermission),
    /// A live direct grant names the action.
    DirectGrant,
    /// Nothing allows it.
    Denied,
}

impl GrantDecision {
    pub fn is_allowed(self) -> bool {
        !matches!(self, GrantDecision::Denied)
    }
}

impl fmt::Display for GrantDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrantDecision::Owner => f.write_str("owner"),
            GrantDecision::PublicRead => f.write_str("public read"),
            GrantDecision::Share(level) => write!(f, "{} share", level),
            GrantDecision::DirectGrant => f.write_str("direct grant"),
            GrantDecision::Denied => f.write_str("denied"),
        }
    }
}

/// One resource-level check.
#[derive(Debug, Clone, Copy)]
pub struct GrantRequest<'a> {
    pub user: &'a UserId,
    pub action: &'a Action,
    pub owner_id: Option<&'a UserId>,
    pub is_public: bool,
    /// Evaluation time, Unix milliseconds.
    pub now: i64,
}

impl<'a> GrantRequest<'a> {
    pub fn new(user: &'a UserId, action: &'a Action, now: i64) -> Self {
        Self {
            user,
            action,
            owner_id: None,
            is_public: false,
            now,
        }
    }

    /// A request carrying what `ctx` knows about the resource.
    pub fn with_context(
        user: &'a UserId,
        action: &'a Action,
        ctx: &'a CheckContext,
        now: i64,
    ) -> Self {
        Self {
            user,
            action,
            owner_id: ctx.owner_id.as_ref(),
            is_public: ctx.is_public(),
            now,
        }
    }

    pub fn owner(mut self, owner_id: &'a UserId) -> Self {
        self.owner_id = Some(owner_id);
        self
    }

    pub fn public(mut self, is_public: bool) -> Self {
        self.is_public = is_public;
        self
    }

    /// Ownership and public read. Needs no lookups.
    pub fn bypass(&self) -> Option<GrantDecision> {
        if self.owner_id == Some(self.user) {
            return Some(GrantDecision::Owner);
        }
        if self.is_public && *self.action == Action::Read {
            return Some(GrantDecision::PublicRead);
        }
        None
    }

    /// Shares of the resource targeting the user or the user's groups.
    pub fn from_shares(&self, shares: &[ResourceShare]) -> Option<GrantDecision> {
        effective_share_level(shares, self.now)
            .filter(|level| level.allows(self.action))
            .map(GrantDecision::Share)
    }

    /// Direct grants on the resource targeting the user or the user's groups.
    pub fn from_direct_grants(&self, grants: &[ResourcePermission]) -> Option<GrantDecision> {
        live_direct_grant(grants, self.action, self.now).map(|_| GrantDecision::DirectGrant)
    }

    /// Run every stage against already-fetched records.
    pub fn resolve(
        &self,
        shares: &[ResourceShare],
        grants: &[ResourcePermission],
    ) -> GrantDecision {
        self.bypass()
            .or_else(|| self.from_shares(shares))
            .or_else(|| self.from_direct_grants(grants))
            .unwrap_or(GrantDecision::Denied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use sharegate_core::{Grantee, GroupId, ResourceId};

    const NOW: i64 = 1_700_000_000_000;

    fn group_share(level: SharePermission, expires_at: Option<i64>) -> ResourceShare {
        ResourceShare {
            resource_id: ResourceId::new("doc"),
            grantee: Grantee::Group(GroupId::new("editors")),
            permission: level,
            expires_at,
        }
    }

    fn direct(action: Action, expires_at: Option<i64>) -> ResourcePermission {
        ResourcePermission {
            resource_id: ResourceId::new("doc"),
            grantee: Grantee::User(UserId::new("alice")),
            permission: action,
            expires_at,
        }
    }

    #[test]
    fn test_owner_bypass() {
        let alice = UserId::new("alice");
        let action = Action::Delete;
        let req = GrantRequest::new(&alice, &action, NOW).owner(&alice);
        assert_eq!(req.resolve(&[], &[]), GrantDecision::Owner);
    }

    #[test]
    fn test_public_read_only_covers_read() {
        let alice = UserId::new("alice");

        let read = Action::Read;
        let req = GrantRequest::new(&alice, &read, NOW).public(true);
        assert_eq!(req.resolve(&[], &[]), GrantDecision::PublicRead);

        let update = Action::Update;
        let req = GrantRequest::new(&alice, &update, NOW).public(true);
        assert_eq!(req.resolve(&[], &[]), GrantDecision::Denied);
    }

    #[test]
    fn test_write_share_allows_delete() {
        let alice = UserId::new("alice");
        let delete = Action::Delete;
        let req = GrantRequest::new(&alice, &delete, NOW);

        let shares = vec![group_share(SharePermission::Write, Some(NOW + 60_000))];
        assert_eq!(
            req.resolve(&shares, &[]),
            GrantDecision::Share(SharePermission::Write)
        );

        let expired = vec![group_share(SharePermission::Write, Some(NOW - 1_000))];
        assert_eq!(req.resolve(&expired, &[]), GrantDecision::Denied);
    }

    #[test]
    fn test_share_before_direct_grant() {
        let alice = UserId::new("alice");
        let read = Action::Read;
        let req = GrantRequest::new(&alice, &read, NOW);

        let shares = vec![group_share(SharePermission::Read, None)];
        let grants = vec![direct(Action::Read, None)];
        assert_eq!(
            req.resolve(&shares, &grants),
            GrantDecision::Share(SharePermission::Read)
        );
        assert_eq!(req.resolve(&[], &grants), GrantDecision::DirectGrant);
    }

    #[test]
    fn test_read_share_falls_through_to_direct_grant() {
        let alice = UserId::new("alice");
        let update = Action::Update;
        let req = GrantRequest::new(&alice, &update, NOW);

        let shares = vec![group_share(SharePermission::Read, None)];
        let grants = vec![direct(Action::Update, None)];
        assert_eq!(req.resolve(&shares, &grants), GrantDecision::DirectGrant);
        assert_eq!(req.resolve(&shares, &[]), GrantDecision::Denied);
    }

    #[test]
    fn test_context_request() {
        let alice = UserId::new("alice");
        let read = Action::Read;
        let ctx = CheckContext::for_resource("doc").owner("bob").public(false);
        let req = GrantRequest::with_context(&alice, &read, &ctx, NOW);

        assert_eq!(req.bypass(), None);
        assert_eq!(
            req.resolve(&[], &[]),
            GrantDecision::Denied
        );
    }

    #[test]
    fn test_decision_serializes_reason() {
        let json = serde_json::to_string(&GrantDecision::Share(SharePermission::Write)).unwrap();
        assert_eq!(json, r#"{"reason":"share","level":"write"}"#);
        assert_eq!(GrantDecision::Share(SharePermission::Read).to_string(), "read share");
    }

    fn any_action() -> impl Strategy<Value = Action> {
        prop_oneof![
            Just(Action::Read),
            Just(Action::View),
            Just(Action::Create),
            Just(Action::Update),
            Just(Action::Write),
            Just(Action::Delete),
            Just(Action::Moderate),
            Just(Action::Share),
            "[a-z]{1,8}".prop_map(Action::from),
        ]
    }

    fn any_level() -> impl Strategy<Value = SharePermission> {
        prop_oneof![Just(SharePermission::Read), Just(SharePermission::Write)]
    }

    proptest! {
        #[test]
        fn test_owner_allows_any_action(action in any_action(), public in any::<bool>()) {
            let alice = UserId::new("alice");
            let req = GrantRequest::new(&alice, &action, NOW).owner(&alice).public(public);
            prop_assert!(req.resolve(&[], &[]).is_allowed());
        }

        #[test]
        fn test_expired_records_are_absent(
            action in any_action(),
            level in any_level(),
            grant_action in any_action(),
            ago in 0i64..10_000_000,
        ) {
            let alice = UserId::new("alice");
            let req = GrantRequest::new(&alice, &action, NOW);

            let shares = vec![group_share(level, Some(NOW - ago))];
            let grants = vec![direct(grant_action, Some(NOW - ago))];
            prop_assert_eq!(req.resolve(&shares, &grants), req.resolve(&[], &[]));
        }

        #[test]
        fn test_write_share_implies_read_share(action in any_action()) {
            let alice = UserId::new("alice");
            let req = GrantRequest::new(&alice, &action, NOW);

            let read = req.resolve(&[group_share(SharePermission::Read, None)], &[]);
            let write = req.resolve(&[group_share(SharePermission::Write, None)], &[]);
            prop_assert!(!read.is_allowed() || write.is_allowed());
        }

        #[test]
        fn test_read_share_never_allows_mutation(action in any_action()) {
            prop_assume!(!action.is_read_only());
            let alice = UserId::new("alice");
            let req = GrantRequest::new(&alice, &action, NOW);

            let decision = req.resolve(&[group_share(SharePermission::Read, None)], &[]);
            prop_assert_eq!(decision, GrantDecision::Denied);
        }
    }
}

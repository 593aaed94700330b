//! Folding stored shares and direct grants into effective access.
//!
//! Records are passed in raw; expiry is judged here against the caller's
//! clock, so an expired record behaves exactly like a missing one.

use sharegate_core::{Action, ResourcePermission, ResourceShare, SharePermission};

/// The most permissive live share level among `shares`.
///
/// User-level and group-level shares are treated alike: when both exist the
/// higher level wins.
pub fn effective_share_level(shares: &[ResourceShare], now: i64) -> Option<SharePermission> {
    shares
        .iter()
        .filter(|share| share.is_live(now))
        .map(|share| share.permission)
        .max()
}

/// The first live direct grant naming exactly `action`.
pub fn live_direct_grant<'a>(
    grants: &'a [ResourcePermission],
    action: &Action,
    now: i64,
) -> Option<&'a ResourcePermission> {
    grants
        .iter()
        .find(|grant| grant.names(action) && grant.is_live(now))
}

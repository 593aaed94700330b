//! Proptest generators for property-based testing.

use proptest::prelude::*;

use sharegate_core::{Action, Role, SharePermission, UserId};

/// Generate a global role.
pub fn role() -> impl Strategy<Value = Role> {
    prop::sample::select(Role::ALL.to_vec())
}

/// Generate a role or no assignment at all.
pub fn maybe_role() -> impl Strategy<Value = Option<Role>> {
    prop::option::of(role())
}

/// Generate one of the actions the resolution rules single out.
pub fn well_known_action() -> impl Strategy<Value = Action> {
    prop_oneof![
        Just(Action::Read),
        Just(Action::View),
        Just(Action::Create),
        Just(Action::Update),
        Just(Action::Write),
        Just(Action::Delete),
        Just(Action::Moderate),
        Just(Action::Share),
    ]
}

/// Generate any valid action, custom ones included.
pub fn action() -> impl Strategy<Value = Action> {
    prop_oneof![
        4 => well_known_action(),
        1 => "[a-z][a-z_]{0,11}".prop_map(Action::from),
    ]
}

/// Generate a share level.
pub fn share_level() -> impl Strategy<Value = SharePermission> {
    prop_oneof![Just(SharePermission::Read), Just(SharePermission::Write)]
}

/// Generate a valid user id.
pub fn user_id() -> impl Strategy<Value = UserId> {
    "[a-z][a-z0-9_-]{2,15}".prop_map(UserId::new)
}

/// Generate an expiry offset from now in milliseconds, past or future.
///
/// Never zero: a record expiring exactly now is already dead, which the
/// past range covers.
pub fn expiry_offset() -> impl Strategy<Value = i64> {
    prop_oneof![
        -86_400_000i64..=-1,
        60_000i64..=86_400_000,
    ]
}

/// Generate an offset strictly in the past.
pub fn past_offset() -> impl Strategy<Value = i64> {
    -86_400_000i64..=-1
}

/// Generate an optional expiry offset; `None` never expires.
pub fn maybe_expiry() -> impl Strategy<Value = Option<i64>> {
    prop::option::of(expiry_offset())
}

/// Everything needed to stage one resource-level check.
#[derive(Debug, Clone)]
pub struct CheckParams {
    pub role: Option<Role>,
    pub action: Action,
    pub level: SharePermission,
    pub via_group: bool,
    pub expiry: Option<i64>,
    pub is_public: bool,
}

/// Generate check parameters.
pub fn check_params() -> impl Strategy<Value = CheckParams> {
    (
        maybe_role(),
        well_known_action(),
        share_level(),
        any::<bool>(),
        maybe_expiry(),
        any::<bool>(),
    )
        .prop_map(
            |(role, action, level, via_group, expiry, is_public)| CheckParams {
                role,
                action,
                level,
                via_group,
                expiry,
                is_public,
            },
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn test_actions_are_valid(action in action()) {
            prop_assert!(action.validate().is_ok());
        }

        #[test]
        fn test_user_ids_are_valid(user in user_id()) {
            prop_assert!(user.validate().is_ok());
        }

        #[test]
        fn test_expiry_offset_is_never_now(offset in expiry_offset()) {
            prop_assert_ne!(offset, 0);
        }
    }
}

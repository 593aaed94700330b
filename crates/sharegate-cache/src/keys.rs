//! Cache key layout.

use sharegate_core::UserId;

/// Prefix shared by every Sharegate key.
pub const KEY_PREFIX: &str = "sharegate";

/// Key of a user's cached role.
pub fn role_key(user: &UserId) -> String {
    format!("{}:role:{}", KEY_PREFIX, user)
}

/// Key of a user's cached permission set.
pub fn permissions_key(user: &UserId) -> String {
    format!("{}:perms:{}", KEY_PREFIX, user)
}

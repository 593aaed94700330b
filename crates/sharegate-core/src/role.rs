//! Global role hierarchy.
//!
//! Roles form a total order. Comparisons go through an immutable rank table,
//! never through role names.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;
use crate::time::is_live;
use crate::types::UserId;

/// A global role. Declaration order is rank order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Guest,
    User,
    Moderator,
    Admin,
    SuperAdmin,
}

/// Rank of each role, indexed by discriminant.
const RANKS: [u8; 5] = [0, 1, 2, 3, 4];

impl Role {
    /// Every role, lowest rank first.
    pub const ALL: [Role; 5] = [
        Role::Guest,
        Role::User,
        Role::Moderator,
        Role::Admin,
        Role::SuperAdmin,
    ];

    /// Position of this role in the hierarchy.
    pub const fn rank(self) -> u8 {
        RANKS[self as usize]
    }

    /// Whether holding `self` satisfies a requirement of `want`.
    pub const fn satisfies(self, want: Role) -> bool {
        self.rank() >= want.rank()
    }

    /// Whether this role may mutate resources it neither owns nor has been
    /// shared, given catalog permission.
    pub const fn is_elevated(self) -> bool {
        self.satisfies(Role::Moderator)
    }

    /// Stable string form, used in storage and logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Role::Guest => "guest",
            Role::User => "user",
            Role::Moderator => "moderator",
            Role::Admin => "admin",
            Role::SuperAdmin => "super_admin",
        }
    }
}

/// `roleSatisfies(have, want)`.
pub const fn role_satisfies(have: Role, want: Role) -> bool {
    have.satisfies(want)
}

impl PartialOrd for Role {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Role {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownRole(s.to_string()))
    }
}

/// A principal's role assignment. At most one exists per principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    pub user_id: UserId,
    pub role: Role,
    /// When the assignment lapses (Unix ms). `None` never lapses.
    pub expires_at: Option<i64>,
}

impl RoleAssignment {
    pub fn new(user_id: UserId, role: Role) -> Self {
        Self {
            user_id,
            role,
            expires_at: None,
        }
    }

    pub fn expiring_at(mut self, expires_at: i64) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Whether the assignment is still in force at `now`.
    pub fn is_active(&self, now: i64) -> bool {
        is_live(self.expires_at, now)
    }

    /// The role if active at `now`; an expired assignment is absent.
    pub fn active_role(&self, now: i64) -> Option<Role> {
        self.is_active(now).then_some(self.role)
    }
}

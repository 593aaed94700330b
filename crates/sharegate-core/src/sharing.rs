//! Resource-scoped authority: shares, direct grants, and the groups they can
//! target.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;
use crate::permission::Action;
use crate::time::is_live;
use crate::types::{GroupId, ResourceId, UserId};

/// The target of a share or direct grant: exactly one user or one group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Grantee {
    User(UserId),
    Group(GroupId),
}

impl Grantee {
    /// Whether this grantee covers `user`, given the user's groups.
    pub fn covers(&self, user: &UserId, groups: &[GroupId]) -> bool {
        match self {
            Grantee::User(id) => id == user,
            Grantee::Group(id) => groups.contains(id),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Grantee::User(id) => id.validate(),
            Grantee::Group(id) => id.validate(),
        }
    }

    pub fn is_user(&self) -> bool {
        matches!(self, Grantee::User(_))
    }
}

impl fmt::Display for Grantee {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Grantee::User(id) => write!(f, "user:{}", id),
            Grantee::Group(id) => write!(f, "group:{}", id),
        }
    }
}

/// Coarse level of a share, ordered so that a higher level allows every
/// action a lower one does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SharePermission {
    Read,
    Write,
}

impl SharePermission {
    /// Actions a `read` share allows.
    pub const READ_ACTIONS: &'static [&'static str] = &["read", "view"];

    /// Actions a `write` share allows.
    pub const WRITE_ACTIONS: &'static [&'static str] =
        &["read", "view", "update", "delete", "moderate", "share"];

    /// Whether a share at this level allows `action`.
    pub fn allows(self, action: &Action) -> bool {
        let allowed = match self {
            SharePermission::Read => Self::READ_ACTIONS,
            SharePermission::Write => Self::WRITE_ACTIONS,
        };
        allowed.contains(&action.as_str())
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            SharePermission::Read => "read",
            SharePermission::Write => "write",
        }
    }
}

impl fmt::Display for SharePermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SharePermission {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "read" => Ok(SharePermission::Read),
            "write" => Ok(SharePermission::Write),
            other => Err(ValidationError::UnknownShareLevel(other.to_string())),
        }
    }
}

/// A resource shared with a user or group at a coarse level.
///
/// Unique per (resource, grantee).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceShare {
    pub resource_id: ResourceId,
    pub grantee: Grantee,
    pub permission: SharePermission,
    pub expires_at: Option<i64>,
}

impl ResourceShare {
    pub fn new(resource_id: ResourceId, grantee: Grantee, permission: SharePermission) -> Self {
        Self {
            resource_id,
            grantee,
            permission,
            expires_at: None,
        }
    }

    pub fn expiring_at(mut self, expires_at: i64) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn is_live(&self, now: i64) -> bool {
        is_live(self.expires_at, now)
    }
}

/// A direct grant naming one action on one resource.
///
/// Unique per (resource, grantee, permission).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourcePermission {
    pub resource_id: ResourceId,
    pub grantee: Grantee,
    pub permission: Action,
    pub expires_at: Option<i64>,
}

impl ResourcePermission {
    pub fn new(resource_id: ResourceId, grantee: Grantee, permission: Action) -> Self {
        Self {
            resource_id,
            grantee,
            permission,
            expires_at: None,
        }
    }

    pub fn expiring_at(mut self, expires_at: i64) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn is_live(&self, now: i64) -> bool {
        is_live(self.expires_at, now)
    }

    /// Whether this grant names exactly `action`.
    pub fn names(&self, action: &Action) -> bool {
        &self.permission == action
    }
}

/// Sub-role inside a group. Orthogonal to the global [`Role`](crate::Role).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupRole {
    Admin,
    Member,
}

impl GroupRole {
    pub const fn as_str(self) -> &'static str {
        match self {
            GroupRole::Admin => "admin",
            GroupRole::Member => "member",
        }
    }
}

impl FromStr for GroupRole {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(GroupRole::Admin),
            "member" => Ok(GroupRole::Member),
            other => Err(ValidationError::UnknownGroupRole(other.to_string())),
        }
    }
}

/// A named collection of users with an owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    pub owner_id: UserId,
}

/// A user's membership in a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMembership {
    pub group_id: GroupId,
    pub user_id: UserId,
    pub role: GroupRole,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_share_actions() {
        for action in ["read", "view", "update", "delete", "moderate", "share"] {
            assert!(SharePermission::Write.allows(&Action::from(action)));
        }
        assert!(!SharePermission::Write.allows(&Action::from("export")));
    }

    #[test]
    fn test_read_share_never_implies_write() {
        assert!(SharePermission::Read.allows(&Action::Read));
        assert!(SharePermission::Read.allows(&Action::View));
        assert!(!SharePermission::Read.allows(&Action::Update));
        assert!(!SharePermission::Read.allows(&Action::Delete));

        assert!(SharePermission::Write > SharePermission::Read);
    }

    #[test]
    fn test_grantee_covers() {
        let alice = UserId::new("alice");
        let groups = vec![GroupId::new("editors")];

        assert!(Grantee::User(alice.clone()).covers(&alice, &groups));
        assert!(Grantee::Group(GroupId::new("editors")).covers(&alice, &groups));
        assert!(!Grantee::Group(GroupId::new("admins")).covers(&alice, &groups));
        assert!(!Grantee::User(UserId::new("bob")).covers(&alice, &groups));
    }

    #[test]
    fn test_share_expiry() {
        let share = ResourceShare::new(
            ResourceId::new("doc"),
            Grantee::User(UserId::new("alice")),
            SharePermission::Read,
        )
        .expiring_at(2000);

        assert!(share.is_live(1999));
        assert!(!share.is_live(2000));
    }

    #[test]
    fn test_direct_grant_names_exact_action() {
        let grant = ResourcePermission::new(
            ResourceId::new("doc"),
            Grantee::User(UserId::new("alice")),
            Action::Update,
        );
        assert!(grant.names(&Action::Update));
        assert!(!grant.names(&Action::Write));
    }
}

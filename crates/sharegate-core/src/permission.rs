//! Named permissions and actions.
//!
//! A permission is an immutable `{resource, action}` pair, unique by its
//! composed name `"resource:action"`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;
use crate::role::Role;
use crate::types::PermissionId;

/// An action a principal attempts on a resource.
///
/// The well-known actions get variants because the resolution rules single
/// them out; anything else is carried verbatim and can still be granted
/// directly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum Action {
    Read,
    View,
    Create,
    Update,
    Write,
    Delete,
    Moderate,
    Share,
    Other(String),
}

impl Action {
    /// Parse an action, rejecting the empty string.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let action = Self::from(raw);
        action.validate()?;
        Ok(action)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Action::Other(raw) if raw.is_empty() => Err(ValidationError::EmptyAction),
            Action::Other(raw) if raw.contains(|c: char| c.is_whitespace() || c == ':') => {
                Err(ValidationError::MalformedPermissionName(raw.clone()))
            }
            _ => Ok(()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Action::Read => "read",
            Action::View => "view",
            Action::Create => "create",
            Action::Update => "update",
            Action::Write => "write",
            Action::Delete => "delete",
            Action::Moderate => "moderate",
            Action::Share => "share",
            Action::Other(raw) => raw,
        }
    }

    /// `read` and `view`.
    pub fn is_read_only(&self) -> bool {
        matches!(self, Action::Read | Action::View)
    }
}

impl From<&str> for Action {
    fn from(raw: &str) -> Self {
        match raw {
            "read" => Action::Read,
            "view" => Action::View,
            "create" => Action::Create,
            "update" => Action::Update,
            "write" => Action::Write,
            "delete" => Action::Delete,
            "moderate" => Action::Moderate,
            "share" => Action::Share,
            other => Action::Other(other.to_string()),
        }
    }
}

impl From<String> for Action {
    fn from(raw: String) -> Self {
        Action::from(raw.as_str())
    }
}

impl From<Action> for String {
    fn from(action: Action) -> Self {
        action.as_str().to_string()
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A composed permission name, `"resource:action"`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PermissionName {
    name: String,
    split: usize,
}

impl PermissionName {
    /// Compose a name from its parts.
    pub fn new(resource: &str, action: &Action) -> Result<Self, ValidationError> {
        Self::parse(&format!("{}:{}", resource, action))
    }

    /// Parse `"resource:action"`. Both halves must be non-empty and free of
    /// whitespace; the resource half may not contain `:`.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let malformed = || ValidationError::MalformedPermissionName(raw.to_string());

        let split = raw.find(':').ok_or_else(malformed)?;
        let (resource, action) = (&raw[..split], &raw[split + 1..]);

        if resource.is_empty() || action.is_empty() || action.contains(':') {
            return Err(malformed());
        }
        if raw.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(malformed());
        }

        Ok(Self {
            name: raw.to_string(),
            split,
        })
    }

    pub fn resource(&self) -> &str {
        &self.name[..self.split]
    }

    pub fn action(&self) -> Action {
        Action::from(&self.name[self.split + 1..])
    }

    pub fn as_str(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for PermissionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PermissionName({})", self.name)
    }
}

impl fmt::Display for PermissionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl FromStr for PermissionName {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for PermissionName {
    type Error = ValidationError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::parse(&raw)
    }
}

impl From<PermissionName> for String {
    fn from(name: PermissionName) -> Self {
        name.name
    }
}

/// A catalog permission. Created administratively and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub id: PermissionId,
    pub name: PermissionName,
    pub description: Option<String>,
}

impl Permission {
    pub fn resource(&self) -> &str {
        self.name.resource()
    }

    pub fn action(&self) -> Action {
        self.name.action()
    }
}

/// Edge binding a permission to a role by default. Unique per pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RolePermission {
    pub role: Role,
    pub permission_id: PermissionId,
}

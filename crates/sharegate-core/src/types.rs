//! Strong type definitions for Sharegate identifiers.
//!
//! All identifiers are opaque strings supplied by the surrounding platform.
//! They are newtypes so a user id can never be passed where a group id or
//! resource id is expected.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ValidationError;

/// Shared checks for every identifier: non-empty, no whitespace or controls.
fn validate_id(raw: &str, empty: ValidationError) -> Result<(), ValidationError> {
    if raw.is_empty() {
        return Err(empty);
    }
    if raw.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(ValidationError::MalformedId(raw.to_string()));
    }
    Ok(())
}

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident, $empty:expr) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap a raw identifier without validating it.
            ///
            /// Use [`Self::parse`] at trust boundaries.
            pub fn new(raw: impl Into<String>) -> Self {
                Self(raw.into())
            }

            /// Wrap a raw identifier, rejecting empty or malformed input.
            pub fn parse(raw: impl Into<String>) -> Result<Self, ValidationError> {
                let raw = raw.into();
                validate_id(&raw, $empty)?;
                Ok(Self(raw))
            }

            /// Check this identifier is well formed.
            pub fn validate(&self) -> Result<(), ValidationError> {
                validate_id(&self.0, $empty)
            }

            /// Borrow the raw string.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume into the raw string.
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(raw: &str) -> Self {
                Self::new(raw)
            }
        }

        impl From<String> for $name {
            fn from(raw: String) -> Self {
                Self::new(raw)
            }
        }
    };
}

string_id!(
    /// An authenticated principal, supplied by identity resolution.
    UserId,
    ValidationError::EmptyUserId
);

string_id!(
    /// A named collection of users.
    GroupId,
    ValidationError::EmptyGroupId
);

string_id!(
    /// A protected resource instance.
    ResourceId,
    ValidationError::EmptyResourceId
);

/// Catalog-assigned identifier of a [`Permission`](crate::Permission).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionId(pub i64);

impl fmt::Display for PermissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

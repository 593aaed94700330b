//! Per-request resource context for contextual checks.

use serde::{Deserialize, Serialize};

use crate::types::{ResourceId, UserId};

/// What the caller knows about the resource being acted on.
///
/// Every field is optional. The engine validates the context at its boundary
/// and treats a missing field as "not known", which can only narrow access.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckContext {
    pub resource_id: Option<ResourceId>,
    pub owner_id: Option<UserId>,
    pub is_public: Option<bool>,
    /// Hint that the resource has shares. `Some(false)` lets the engine skip
    /// the share lookup.
    pub is_shared: Option<bool>,
}

impl CheckContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_resource(resource_id: impl Into<ResourceId>) -> Self {
        Self {
            resource_id: Some(resource_id.into()),
            ..Self::default()
        }
    }

    pub fn resource(mut self, resource_id: impl Into<ResourceId>) -> Self {
        self.resource_id = Some(resource_id.into());
        self
    }

    pub fn owner(mut self, owner_id: impl Into<UserId>) -> Self {
        self.owner_id = Some(owner_id.into());
        self
    }

    pub fn public(mut self, is_public: bool) -> Self {
        self.is_public = Some(is_public);
        self
    }

    pub fn shared(mut self, is_shared: bool) -> Self {
        self.is_shared = Some(is_shared);
        self
    }

    /// Whether `user` owns the resource, as far as this context knows.
    pub fn is_owned_by(&self, user: &UserId) -> bool {
        self.owner_id.as_ref() == Some(user)
    }

    pub fn is_public(&self) -> bool {
        self.is_public.unwrap_or(false)
    }

    /// Whether a share lookup could find anything.
    pub fn may_be_shared(&self) -> bool {
        self.is_shared.unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let ctx = CheckContext::for_resource("doc-1").owner("alice").public(true);

        assert_eq!(ctx.resource_id, Some(ResourceId::new("doc-1")));
        assert!(ctx.is_owned_by(&UserId::new("alice")));
        assert!(!ctx.is_owned_by(&UserId::new("bob")));
        assert!(ctx.is_public());
        assert!(ctx.may_be_shared());
    }

    #[test]
    fn test_defaults_are_restrictive() {
        let ctx = CheckContext::new();
        assert!(!ctx.is_public());
        assert!(!ctx.is_owned_by(&UserId::new("alice")));
    }
}

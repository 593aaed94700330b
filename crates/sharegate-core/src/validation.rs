//! Boundary validation for check requests.
//!
//! Checks never trust caller input implicitly. Anything that fails here is
//! resolved to a denial by the engine.

use crate::context::CheckContext;
use crate::error::ValidationError;
use crate::permission::{Action, PermissionName};
use crate::types::UserId;

/// Validate the principal, resource type and action of a check, returning the
/// catalog permission name they compose.
pub fn validate_request(
    user: &UserId,
    resource: &str,
    action: &Action,
) -> Result<PermissionName, ValidationError> {
    user.validate()?;
    action.validate()?;
    PermissionName::new(resource, action)
}

/// Validate a check context.
///
/// This performs:
/// - Resource id check (when present)
/// - Owner id check (when present)
/// - Consistency of the public/shared flags
pub fn validate_context(ctx: &CheckContext) -> Result<(), ValidationError> {
    if let Some(resource_id) = &ctx.resource_id {
        resource_id.validate()?;
    }

    if let Some(owner_id) = &ctx.owner_id {
        owner_id
            .validate()
            .map_err(|e| ValidationError::InvalidContext(format!("owner id: {}", e)))?;
    }

    // Shares are looked up by resource id.
    if ctx.is_shared == Some(true) && ctx.resource_id.is_none() {
        return Err(ValidationError::InvalidContext(
            "is_shared is set but resource_id is missing".into(),
        ));
    }

    Ok(())
}

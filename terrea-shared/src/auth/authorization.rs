/// Ownership-based authorization
///
/// Terrea grants access to a project only to its owner. Tasks have no
/// permissions of their own: access to a task is decided by the owner of
/// its parent project.
///
/// # Example
///
/// ```
/// use terrea_shared::auth::authorization::{authorize_or_fail, can_access};
///
/// assert!(can_access(7, 7));
/// assert!(!can_access(7, 8));
/// assert!(authorize_or_fail(7, 8).is_err());
/// ```

/// Error type for authorization checks
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthzError {
    /// Acting user does not own the resource
    #[error("You don't have enough access rights to see this project")]
    AccessDenied,
}

/// Returns true if `acting_user_id` owns the resource
pub fn can_access(resource_owner_id: i64, acting_user_id: i64) -> bool {
    resource_owner_id == acting_user_id
}

/// Fails with `AuthzError::AccessDenied` unless `acting_user_id` owns the resource
pub fn authorize_or_fail(resource_owner_id: i64, acting_user_id: i64) -> Result<(), AuthzError> {
    if can_access(resource_owner_id, acting_user_id) {
        Ok(())
    } else {
        tracing::warn!(
            owner_id = resource_owner_id,
            user_id = acting_user_id,
            "Access denied to resource"
        );
        Err(AuthzError::AccessDenied)
    }
}

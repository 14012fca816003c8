//! Permission checking for Agora.
//!
//! Role-based access control plus the owner-or-admin rule used for
//! threads and messages. Banned accounts fail every check.

use thiserror::Error;

use crate::db::{Role, User};
use crate::AgoraError;

/// Permission-related errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PermissionError {
    /// User does not have sufficient permission.
    #[error("{0} access required")]
    InsufficientRole(String),

    /// User is not authenticated.
    #[error("authentication required")]
    NotAuthenticated,

    /// User account is banned.
    #[error("Account is banned")]
    Banned,

    /// User is neither the owner nor an admin.
    #[error("You can only modify your own content")]
    NotOwner,
}

impl From<PermissionError> for AgoraError {
    fn from(err: PermissionError) -> Self {
        match err {
            PermissionError::NotAuthenticated => AgoraError::Auth(err.to_string()),
            _ => AgoraError::Permission(err.to_string()),
        }
    }
}

/// Check if a user has the required permission level.
///
/// Guest-level checks pass without a user, but a banned user is
/// rejected even then.
///
/// # Examples
///
/// ```
/// use agora::auth::permission::{check_permission, PermissionError};
/// use agora::db::Role;
///
/// assert!(check_permission(None, Role::Guest).is_ok());
/// assert_eq!(
///     check_permission(None, Role::User),
///     Err(PermissionError::NotAuthenticated)
/// );
/// ```
pub fn check_permission(user: Option<&User>, required: Role) -> Result<(), PermissionError> {
    if required == Role::Guest {
        if let Some(u) = user {
            if u.is_banned {
                return Err(PermissionError::Banned);
            }
        }
        return Ok(());
    }

    let user = user.ok_or(PermissionError::NotAuthenticated)?;

    if user.is_banned {
        return Err(PermissionError::Banned);
    }

    if !user.role.can_access(required) {
        return Err(PermissionError::InsufficientRole(
            required.display_name().to_string(),
        ));
    }

    Ok(())
}

/// Require a logged-in, non-banned member.
pub fn require_user(user: Option<&User>) -> Result<(), PermissionError> {
    check_permission(user, Role::User)
}

/// Require an administrator.
pub fn require_admin(user: Option<&User>) -> Result<(), PermissionError> {
    check_permission(user, Role::Admin)
}

/// Check whether `actor` may modify a resource owned by `owner_id`.
///
/// Owners may modify their own content; admins may modify anything.
pub fn can_modify_resource(actor: Option<&User>, owner_id: i64) -> Result<(), PermissionError> {
    require_user(actor)?;
    let actor = actor.ok_or(PermissionError::NotAuthenticated)?;

    if actor.id == owner_id || actor.is_admin() {
        return Ok(());
    }

    Err(PermissionError::NotOwner)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_user(id: i64, role: Role, is_banned: bool) -> User {
        User {
            id,
            username: format!("user{id}"),
            email: format!("user{id}@example.com"),
            password: "hash".to_string(),
            role,
            is_banned,
            thread_count: 0,
            message_count: 0,
            profile_picture: None,
            biography: None,
            last_connection: None,
            created_at: "2024-01-01 00:00:00".to_string(),
            updated_at: "2024-01-01 00:00:00".to_string(),
        }
    }

    #[test]
    fn test_guest_access() {
        assert!(check_permission(None, Role::Guest).is_ok());
        let user = create_test_user(1, Role::User, false);
        assert!(check_permission(Some(&user), Role::Guest).is_ok());
    }

    #[test]
    fn test_banned_user_rejected_everywhere() {
        let banned = create_test_user(1, Role::Admin, true);
        assert_eq!(
            check_permission(Some(&banned), Role::Guest),
            Err(PermissionError::Banned)
        );
        assert_eq!(require_user(Some(&banned)), Err(PermissionError::Banned));
        assert_eq!(
            can_modify_resource(Some(&banned), 1),
            Err(PermissionError::Banned)
        );
    }

    #[test]
    fn test_require_admin() {
        let user = create_test_user(1, Role::User, false);
        let admin = create_test_user(2, Role::Admin, false);
        assert!(matches!(
            require_admin(Some(&user)),
            Err(PermissionError::InsufficientRole(_))
        ));
        assert!(require_admin(Some(&admin)).is_ok());
        assert_eq!(require_admin(None), Err(PermissionError::NotAuthenticated));
    }

    #[test]
    fn test_can_modify_resource() {
        let owner = create_test_user(1, Role::User, false);
        let other = create_test_user(2, Role::User, false);
        let admin = create_test_user(3, Role::Admin, false);

        assert!(can_modify_resource(Some(&owner), 1).is_ok());
        assert_eq!(
            can_modify_resource(Some(&other), 1),
            Err(PermissionError::NotOwner)
        );
        assert!(can_modify_resource(Some(&admin), 1).is_ok());
        assert_eq!(
            can_modify_resource(None, 1),
            Err(PermissionError::NotAuthenticated)
        );
    }

    #[test]
    fn test_into_crate_error() {
        assert!(matches!(
            AgoraError::from(PermissionError::NotAuthenticated),
            AgoraError::Auth(_)
        ));
        let err = AgoraError::from(PermissionError::Banned);
        assert!(matches!(err, AgoraError::Permission(_)));
        assert_eq!(err.to_string(), "permission denied: Account is banned");
    }
}

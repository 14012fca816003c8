//! User registration for Agora.

use thiserror::Error;
use tracing::info;

use crate::auth::validation::{validate_email, validate_username, ValidationError};
use crate::auth::{hash_password, PasswordError};
use crate::db::{NewUser, Role, User, UserRepository};
use crate::AgoraError;

/// Registration-specific errors.
#[derive(Error, Debug)]
pub enum RegistrationError {
    /// A field failed validation.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// The password does not meet the strength rules.
    #[error("{0}")]
    Password(#[from] PasswordError),

    /// Username already taken.
    #[error("username already taken")]
    UsernameExists,

    /// Email already registered.
    #[error("email already registered")]
    EmailExists,

    /// Database error.
    #[error("database error: {0}")]
    Database(String),
}

impl From<RegistrationError> for AgoraError {
    fn from(err: RegistrationError) -> Self {
        match err {
            RegistrationError::Validation(_) | RegistrationError::Password(_) => {
                AgoraError::Validation(err.to_string())
            }
            RegistrationError::UsernameExists | RegistrationError::EmailExists => {
                AgoraError::Conflict(err.to_string())
            }
            RegistrationError::Database(msg) => AgoraError::Database(msg),
        }
    }
}

/// Registration request data.
#[derive(Debug, Clone)]
pub struct RegistrationRequest {
    /// Desired username.
    pub username: String,
    /// Email address.
    pub email: String,
    /// Plain-text password.
    pub password: String,
}

impl RegistrationRequest {
    /// Create a new registration request.
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password: password.into(),
        }
    }
}

/// Register a new member account.
pub async fn register(
    repo: &UserRepository<'_>,
    request: RegistrationRequest,
) -> std::result::Result<User, RegistrationError> {
    register_with_role(repo, request, Role::User).await
}

/// Register a new account with a specific role.
///
/// Fields are validated, then uniqueness is checked, then the password is hashed.
pub async fn register_with_role(
    repo: &UserRepository<'_>,
    request: RegistrationRequest,
    role: Role,
) -> std::result::Result<User, RegistrationError> {
    let username = request.username.trim();
    let email = request.email.trim();

    validate_username(username)?;
    validate_email(email)?;
    crate::auth::validate_password(&request.password)?;

    if repo
        .username_exists(username)
        .await
        .map_err(|e| RegistrationError::Database(e.to_string()))?
    {
        return Err(RegistrationError::UsernameExists);
    }
    if repo
        .email_exists(email)
        .await
        .map_err(|e| RegistrationError::Database(e.to_string()))?
    {
        return Err(RegistrationError::EmailExists);
    }

    let password_hash = hash_password(&request.password)?;
    let new_user = NewUser::new(username, email, password_hash).with_role(role);

    let user = repo.create(&new_user).await.map_err(|e| match e {
        // Lost a race with a concurrent registration.
        AgoraError::Conflict(_) => RegistrationError::UsernameExists,
        other => RegistrationError::Database(other.to_string()),
    })?;

    info!(user_id = user.id, username = %user.username, "User registered");
    Ok(user)
}

//! Credential checking for Agora.

use thiserror::Error;
use tracing::{info, warn};

use crate::auth::password::{hash_unchecked, needs_rehash, verify_password};
use crate::db::{User, UserRepository, UserUpdate};
use crate::AgoraError;

/// Login failures.
#[derive(Error, Debug)]
pub enum LoginError {
    /// Unknown login or wrong password.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// The account exists but is banned.
    #[error("Account is banned")]
    Banned,

    /// Database error.
    #[error("database error: {0}")]
    Database(String),
}

impl From<LoginError> for AgoraError {
    fn from(err: LoginError) -> Self {
        match err {
            LoginError::InvalidCredentials => AgoraError::Auth(err.to_string()),
            LoginError::Banned => AgoraError::Permission(err.to_string()),
            LoginError::Database(msg) => AgoraError::Database(msg),
        }
    }
}

/// Check a username-or-email and password pair.
///
/// On success the last connection time is recorded, and a legacy
/// password hash is replaced with an Argon2id hash.
pub async fn authenticate(
    repo: &UserRepository<'_>,
    login: &str,
    password: &str,
) -> Result<User, LoginError> {
    let user = repo
        .get_by_login(login.trim())
        .await
        .map_err(|e| LoginError::Database(e.to_string()))?
        .ok_or(LoginError::InvalidCredentials)?;

    verify_password(password, &user.password).map_err(|_| LoginError::InvalidCredentials)?;

    if user.is_banned {
        warn!(user_id = user.id, "Banned user attempted to log in");
        return Err(LoginError::Banned);
    }

    if needs_rehash(&user.password) {
        // Legacy passwords predate the strength rules.
        match hash_unchecked(password) {
            Ok(hash) => {
                repo.update(user.id, &UserUpdate::new().password(hash))
                    .await
                    .map_err(|e| LoginError::Database(e.to_string()))?;
                info!(user_id = user.id, "Upgraded legacy password hash");
            }
            Err(e) => warn!(user_id = user.id, error = %e, "Failed to upgrade password hash"),
        }
    }

    repo.update_last_connection(user.id)
        .await
        .map_err(|e| LoginError::Database(e.to_string()))?;

    Ok(user)
}

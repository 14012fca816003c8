//! Profile management for Agora.
//!
//! Updating one's own profile and changing the password.

use thiserror::Error;
use tracing::info;

use crate::auth::validation::{
    validate_biography, validate_email, validate_picture_url, validate_username, ValidationError,
};
use crate::auth::{hash_password, verify_password, PasswordError};
use crate::db::{User, UserRepository, UserUpdate};
use crate::AgoraError;

/// Profile-related errors.
#[derive(Error, Debug)]
pub enum ProfileError {
    /// User not found.
    #[error("user not found")]
    UserNotFound,

    /// Validation failed.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// New password is too weak.
    #[error("{0}")]
    Password(#[from] PasswordError),

    /// Current password is incorrect.
    #[error("Current password is incorrect")]
    WrongPassword,

    /// Username or email belongs to someone else.
    #[error("username or email already in use")]
    Taken,

    /// Database error.
    #[error("database error: {0}")]
    Database(String),
}

impl From<ProfileError> for AgoraError {
    fn from(err: ProfileError) -> Self {
        match err {
            ProfileError::UserNotFound => AgoraError::NotFound("user".to_string()),
            ProfileError::Validation(_)
            | ProfileError::Password(_)
            | ProfileError::WrongPassword => AgoraError::Validation(err.to_string()),
            ProfileError::Taken => AgoraError::Conflict(err.to_string()),
            ProfileError::Database(msg) => AgoraError::Database(msg),
        }
    }
}

/// Requested profile changes.
///
/// Blank values are treated as "leave unchanged".
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdateRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub profile_picture: Option<String>,
    pub biography: Option<String>,
}

impl ProfileUpdateRequest {
    /// Create an empty request.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn profile_picture(mut self, url: impl Into<String>) -> Self {
        self.profile_picture = Some(url.into());
        self
    }

    pub fn biography(mut self, biography: impl Into<String>) -> Self {
        self.biography = Some(biography.into());
        self
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Apply a profile update for `user_id`.
pub async fn update_profile(
    repo: &UserRepository<'_>,
    user_id: i64,
    request: ProfileUpdateRequest,
) -> Result<User, ProfileError> {
    let current = repo
        .get_by_id(user_id)
        .await
        .map_err(|e| ProfileError::Database(e.to_string()))?
        .ok_or(ProfileError::UserNotFound)?;

    let mut update = UserUpdate::new();

    if let Some(username) = non_blank(request.username) {
        if !username.eq_ignore_ascii_case(&current.username) {
            validate_username(&username)?;
        }
        update = update.username(username);
    }
    if let Some(email) = non_blank(request.email) {
        validate_email(&email)?;
        update = update.email(email);
    }
    if let Some(url) = non_blank(request.profile_picture) {
        validate_picture_url(&url)?;
        update = update.profile_picture(Some(url));
    }
    if let Some(biography) = non_blank(request.biography) {
        validate_biography(&biography)?;
        update = update.biography(Some(biography));
    }

    if update.is_empty() {
        return Ok(current);
    }

    let updated = repo
        .update(user_id, &update)
        .await
        .map_err(|e| match e {
            AgoraError::Conflict(_) => ProfileError::Taken,
            other => ProfileError::Database(other.to_string()),
        })?
        .ok_or(ProfileError::UserNotFound)?;

    info!(user_id = user_id, username = %updated.username, "Profile updated");
    Ok(updated)
}

/// Change a user's password after verifying the current one.
pub async fn change_password(
    repo: &UserRepository<'_>,
    user_id: i64,
    current_password: &str,
    new_password: &str,
) -> Result<(), ProfileError> {
    let user = repo
        .get_by_id(user_id)
        .await
        .map_err(|e| ProfileError::Database(e.to_string()))?
        .ok_or(ProfileError::UserNotFound)?;

    verify_password(current_password, &user.password).map_err(|e| match e {
        PasswordError::VerificationFailed => ProfileError::WrongPassword,
        other => ProfileError::Password(other),
    })?;

    let new_hash = hash_password(new_password)?;
    repo.update(user_id, &UserUpdate::new().password(new_hash))
        .await
        .map_err(|e| ProfileError::Database(e.to_string()))?
        .ok_or(ProfileError::UserNotFound)?;

    info!(user_id = user_id, username = %user.username, "Password changed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::NewUser;
    use crate::Database;

    const PASSWORD: &str = "Sup3r-Secret!";

    async fn setup() -> (Database, User) {
        let db = Database::open_in_memory().await.unwrap();
        let repo = UserRepository::new(db.pool());
        let user = repo
            .create(&NewUser::new(
                "alice",
                "alice@example.com",
                hash_password(PASSWORD).unwrap(),
            ))
            .await
            .unwrap();
        (db, user)
    }

    #[tokio::test]
    async fn test_update_profile_skips_blank_fields() {
        let (db, user) = setup().await;
        let repo = UserRepository::new(db.pool());

        let request = ProfileUpdateRequest::new()
            .username("   ")
            .email("")
            .biography("Rustacean");
        let updated = update_profile(&repo, user.id, request).await.unwrap();

        assert_eq!(updated.username, "alice");
        assert_eq!(updated.email, "alice@example.com");
        assert_eq!(updated.biography.as_deref(), Some("Rustacean"));
    }

    #[tokio::test]
    async fn test_update_profile_validates() {
        let (db, user) = setup().await;
        let repo = UserRepository::new(db.pool());

        let result = update_profile(&repo, user.id, ProfileUpdateRequest::new().email("nope")).await;
        assert!(matches!(result, Err(ProfileError::Validation(_))));

        let result = update_profile(
            &repo,
            user.id,
            ProfileUpdateRequest::new().profile_picture("ftp://x"),
        )
        .await;
        assert!(matches!(result, Err(ProfileError::Validation(_))));
    }

    #[tokio::test]
    async fn test_update_profile_taken_username() {
        let (db, user) = setup().await;
        let repo = UserRepository::new(db.pool());
        repo.create(&NewUser::new("bob", "bob@example.com", "pw"))
            .await
            .unwrap();

        let result = update_profile(&repo, user.id, ProfileUpdateRequest::new().username("bob")).await;
        assert!(matches!(result, Err(ProfileError::Taken)));
    }

    #[tokio::test]
    async fn test_update_profile_unknown_user() {
        let (db, _) = setup().await;
        let repo = UserRepository::new(db.pool());
        let result = update_profile(&repo, 999, ProfileUpdateRequest::new()).await;
        assert!(matches!(result, Err(ProfileError::UserNotFound)));
    }

    #[tokio::test]
    async fn test_change_password() {
        let (db, user) = setup().await;
        let repo = UserRepository::new(db.pool());

        let result = change_password(&repo, user.id, "Wrong-Passw0rd!", "Another-Secret1!").await;
        assert!(matches!(result, Err(ProfileError::WrongPassword)));

        let result = change_password(&repo, user.id, PASSWORD, "weak").await;
        assert!(matches!(result, Err(ProfileError::Password(_))));

        change_password(&repo, user.id, PASSWORD, "Another-Secret1!")
            .await
            .unwrap();
        let stored = repo.get_by_id(user.id).await.unwrap().unwrap();
        assert!(verify_password("Another-Secret1!", &stored.password).is_ok());
        assert!(verify_password(PASSWORD, &stored.password).is_err());
    }
}

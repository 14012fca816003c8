//! Input validation for Agora account data.
//!
//! This module provides validation functions for usernames and email addresses.
//! Password strength rules live in the password module.

use thiserror::Error;

/// Minimum username length.
pub const MIN_USERNAME_LENGTH: usize = 3;

/// Maximum username length.
pub const MAX_USERNAME_LENGTH: usize = 32;

/// Maximum email length.
pub const MAX_EMAIL_LENGTH: usize = 254;

/// Maximum biography length.
pub const MAX_BIOGRAPHY_LENGTH: usize = 1000;

/// Maximum profile picture URL length.
pub const MAX_PICTURE_URL_LENGTH: usize = 2048;

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("username must be at least {MIN_USERNAME_LENGTH} characters")]
    UsernameTooShort,

    #[error("username must be at most {MAX_USERNAME_LENGTH} characters")]
    UsernameTooLong,

    #[error("username can only contain letters, digits, '_', '.' and '-'")]
    UsernameInvalidChars,

    #[error("this username is reserved")]
    UsernameReserved,

    #[error("email must be at most {MAX_EMAIL_LENGTH} characters")]
    EmailTooLong,

    #[error("invalid email format")]
    EmailInvalidFormat,

    #[error("biography must be at most {MAX_BIOGRAPHY_LENGTH} characters")]
    BiographyTooLong,

    #[error("profile picture must be an http(s) URL")]
    PictureInvalidUrl,
}

/// Reserved usernames that cannot be registered.
const RESERVED_USERNAMES: &[&str] = &[
    "admin",
    "administrator",
    "root",
    "system",
    "moderator",
    "anonymous",
    "guest",
    "support",
    "null",
    "undefined",
    "agora",
];

/// Check if a username is reserved.
pub fn is_reserved_username(username: &str) -> bool {
    let lower = username.to_lowercase();
    RESERVED_USERNAMES.iter().any(|&r| r == lower)
}

/// Validate a username.
///
/// # Examples
///
/// ```
/// use agora::auth::validation::validate_username;
///
/// assert!(validate_username("jane.doe").is_ok());
/// assert!(validate_username("ab").is_err());
/// assert!(validate_username("admin").is_err());
/// ```
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    let len = username.chars().count();
    if len < MIN_USERNAME_LENGTH {
        return Err(ValidationError::UsernameTooShort);
    }
    if len > MAX_USERNAME_LENGTH {
        return Err(ValidationError::UsernameTooLong);
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
    {
        return Err(ValidationError::UsernameInvalidChars);
    }
    if is_reserved_username(username) {
        return Err(ValidationError::UsernameReserved);
    }
    Ok(())
}

/// Validate an email address.
///
/// Accepts `local@domain.tld` where the local part uses `[A-Za-z0-9._%+-]`,
/// the domain uses `[A-Za-z0-9.-]` and the TLD has at least two letters.
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::EmailTooLong);
    }

    let (local, domain) = email
        .split_once('@')
        .ok_or(ValidationError::EmailInvalidFormat)?;

    let local_ok = !local.is_empty()
        && local
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "._%+-".contains(c));

    let (host, tld) = domain
        .rsplit_once('.')
        .ok_or(ValidationError::EmailInvalidFormat)?;

    let host_ok = !host.is_empty()
        && !host.starts_with('.')
        && host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-');
    let tld_ok = tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic());

    if local_ok && host_ok && tld_ok {
        Ok(())
    } else {
        Err(ValidationError::EmailInvalidFormat)
    }
}

/// Validate a biography.
pub fn validate_biography(biography: &str) -> Result<(), ValidationError> {
    if biography.chars().count() > MAX_BIOGRAPHY_LENGTH {
        return Err(ValidationError::BiographyTooLong);
    }
    Ok(())
}

/// Validate a profile picture URL.
pub fn validate_picture_url(url: &str) -> Result<(), ValidationError> {
    let has_scheme = url.starts_with("http://") || url.starts_with("https://");
    if !has_scheme || url.len() > MAX_PICTURE_URL_LENGTH || url.chars().any(char::is_whitespace) {
        return Err(ValidationError::PictureInvalidUrl);
    }
    Ok(())
}

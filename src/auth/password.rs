//! Password hashing and validation for Agora.
//!
//! New hashes use Argon2id. Accounts imported from the previous forum may
//! still carry an unsalted SHA-512 hex digest; those verify, and are flagged
//! by [`needs_rehash`] so login can upgrade them.

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, Params,
};
use rand_core::OsRng;
use sha2::{Digest, Sha512};
use thiserror::Error;

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 12;

/// Maximum password length.
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// Special characters accepted by the strength rule.
pub const PASSWORD_SPECIAL_CHARS: &str = "!@#$%^&*";

/// Password-related errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PasswordError {
    /// Password is too short.
    #[error("password must be at least {MIN_PASSWORD_LENGTH} characters")]
    TooShort,

    /// Password is too long.
    #[error("password must be at most {MAX_PASSWORD_LENGTH} characters")]
    TooLong,

    /// Password has no uppercase letter.
    #[error("password must contain at least one uppercase letter")]
    MissingUppercase,

    /// Password has no special character.
    #[error("password must contain at least one special character (!@#$%^&*)")]
    MissingSpecial,

    /// Password hashing failed.
    #[error("password hashing failed: {0}")]
    HashError(String),

    /// Password hash is invalid.
    #[error("invalid password hash format")]
    InvalidHash,

    /// Password verification failed (wrong password).
    #[error("password verification failed")]
    VerificationFailed,
}

/// Argon2id with 19 MiB memory, 2 iterations, 1 lane.
fn create_argon2() -> Result<Argon2<'static>, PasswordError> {
    let params = Params::new(19 * 1024, 2, 1, None)
        .map_err(|e| PasswordError::HashError(e.to_string()))?;
    Ok(Argon2::new(
        argon2::Algorithm::Argon2id,
        argon2::Version::V0x13,
        params,
    ))
}

/// Hash a password using Argon2id.
///
/// The password is checked against the strength rules first.
///
/// # Examples
///
/// ```
/// use agora::hash_password;
///
/// let hash = hash_password("Correct-Horse1!").unwrap();
/// assert!(hash.starts_with("$argon2id$"));
/// ```
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    validate_password(password)?;
    hash_unchecked(password)
}

/// Hash without the strength rules, for re-hashing an already accepted password.
pub(crate) fn hash_unchecked(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = create_argon2()?
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::HashError(e.to_string()))?;

    Ok(hash.to_string())
}

/// Verify a password against a stored hash.
///
/// # Examples
///
/// ```
/// use agora::{hash_password, verify_password};
///
/// let hash = hash_password("Correct-Horse1!").unwrap();
/// assert!(verify_password("Correct-Horse1!", &hash).is_ok());
/// assert!(verify_password("wrong", &hash).is_err());
/// ```
pub fn verify_password(password: &str, hash: &str) -> Result<(), PasswordError> {
    if is_legacy_hash(hash) {
        let computed = legacy_digest(password);
        if constant_time_eq(computed.as_bytes(), hash.to_ascii_lowercase().as_bytes()) {
            return Ok(());
        }
        return Err(PasswordError::VerificationFailed);
    }

    let parsed_hash = PasswordHash::new(hash).map_err(|_| PasswordError::InvalidHash)?;

    // Parameters come from the parsed hash.
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| PasswordError::VerificationFailed)
}

/// Whether a stored hash should be replaced with a fresh Argon2id hash.
pub fn needs_rehash(hash: &str) -> bool {
    is_legacy_hash(hash)
}

/// Validate password strength.
///
/// Requirements:
/// - 12 to 128 characters
/// - at least one uppercase letter
/// - at least one of `!@#$%^&*`
///
/// # Examples
///
/// ```
/// use agora::validate_password;
///
/// assert!(validate_password("Correct-Horse1!").is_ok());
/// assert!(validate_password("short").is_err());
/// ```
pub fn validate_password(password: &str) -> Result<(), PasswordError> {
    let len = password.chars().count();
    if len < MIN_PASSWORD_LENGTH {
        return Err(PasswordError::TooShort);
    }
    if len > MAX_PASSWORD_LENGTH {
        return Err(PasswordError::TooLong);
    }
    if !password.chars().any(|c| c.is_uppercase()) {
        return Err(PasswordError::MissingUppercase);
    }
    if !password.chars().any(|c| PASSWORD_SPECIAL_CHARS.contains(c)) {
        return Err(PasswordError::MissingSpecial);
    }
    Ok(())
}

fn is_legacy_hash(hash: &str) -> bool {
    hash.len() == 128 && hash.chars().all(|c| c.is_ascii_hexdigit())
}

fn legacy_digest(password: &str) -> String {
    Sha512::digest(password.as_bytes())
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOOD: &str = "Sup3r-Secret!";

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password(GOOD).unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password(GOOD, &hash).is_ok());
        assert_eq!(
            verify_password("Sup3r-Secret?", &hash),
            Err(PasswordError::VerificationFailed)
        );
    }

    #[test]
    fn test_hash_uses_random_salt() {
        let a = hash_password(GOOD).unwrap();
        let b = hash_password(GOOD).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_hash_rejects_weak_password() {
        assert_eq!(hash_password("weak"), Err(PasswordError::TooShort));
    }

    #[test]
    fn test_validate_password_rules() {
        assert!(validate_password(GOOD).is_ok());
        assert_eq!(validate_password("Ab!"), Err(PasswordError::TooShort));
        assert_eq!(
            validate_password("all-lowercase-pw!"),
            Err(PasswordError::MissingUppercase)
        );
        assert_eq!(
            validate_password("NoSpecialChars123"),
            Err(PasswordError::MissingSpecial)
        );
        // '-' and '?' are not in the accepted special set
        assert_eq!(
            validate_password("Dashes-Only-Here?"),
            Err(PasswordError::MissingSpecial)
        );
        let long = format!("A!{}", "x".repeat(MAX_PASSWORD_LENGTH));
        assert_eq!(validate_password(&long), Err(PasswordError::TooLong));
    }

    #[test]
    fn test_verify_invalid_hash() {
        assert_eq!(
            verify_password(GOOD, "not-a-hash"),
            Err(PasswordError::InvalidHash)
        );
    }

    #[test]
    fn test_verify_legacy_sha512() {
        let legacy = legacy_digest("oldpassword");
        assert_eq!(legacy.len(), 128);
        assert!(verify_password("oldpassword", &legacy).is_ok());
        assert!(verify_password("oldpassword", &legacy.to_uppercase()).is_ok());
        assert_eq!(
            verify_password("newpassword", &legacy),
            Err(PasswordError::VerificationFailed)
        );
        assert!(needs_rehash(&legacy));
    }

    #[test]
    fn test_argon2_does_not_need_rehash() {
        let hash = hash_password(GOOD).unwrap();
        assert!(!needs_rehash(&hash));
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"ab"));
    }
}

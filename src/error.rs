//! Error types for Agora.

use thiserror::Error;

/// Common error type for Agora.
#[derive(Error, Debug)]
pub enum AgoraError {
    /// Database error.
    ///
    /// Errors from sqlx are converted into this variant.
    #[error("database error: {0}")]
    Database(String),

    /// Database connection error.
    #[error("database connection error: {0}")]
    DatabaseConnection(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Authentication error.
    #[error("authentication error: {0}")]
    Auth(String),

    /// Permission denied error.
    #[error("permission denied: {0}")]
    Permission(String),

    /// Validation error for user input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// Resource already exists or conflicts with current state.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Template error.
    #[error("template error: {0}")]
    Template(#[from] crate::template::TemplateError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<sqlx::Error> for AgoraError {
    fn from(e: sqlx::Error) -> Self {
        AgoraError::Database(e.to_string())
    }
}

/// Result type alias for Agora operations.
pub type Result<T> = std::result::Result<T, AgoraError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_error_display() {
        let err = AgoraError::Auth("invalid credentials".to_string());
        assert_eq!(err.to_string(), "authentication error: invalid credentials");
    }

    #[test]
    fn test_permission_error_display() {
        let err = AgoraError::Permission("admin access required".to_string());
        assert_eq!(err.to_string(), "permission denied: admin access required");
    }

    #[test]
    fn test_not_found_error_display() {
        let err = AgoraError::NotFound("thread".to_string());
        assert_eq!(err.to_string(), "thread not found");
    }

    #[test]
    fn test_conflict_error_display() {
        let err = AgoraError::Conflict("email already registered".to_string());
        assert_eq!(err.to_string(), "conflict: email already registered");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: AgoraError = io_err.into();
        assert!(matches!(err, AgoraError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_sqlx_error_conversion() {
        let err: AgoraError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, AgoraError::Database(_)));
    }
}

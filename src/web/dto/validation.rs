//! Validation utilities for Web API DTOs.

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::web::error::ApiError;

/// A JSON extractor that validates the request body.
///
/// A body that is not valid JSON for `T` is a 400; a body that fails
/// `validator` rules is a 422 with field-level details.
///
/// # Example
///
/// ```ignore
/// use agora::web::dto::{CreateThreadRequest, ValidatedJson};
///
/// async fn create_thread(
///     ValidatedJson(payload): ValidatedJson<CreateThreadRequest>,
/// ) -> Result<Json<ThreadResponse>, ApiError> {
///     // ...
/// }
/// ```
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| ApiError::bad_request(format!("Invalid JSON: {}", e)))?;

        value.validate().map_err(ApiError::from_validation_errors)?;

        Ok(ValidatedJson(value))
    }
}

/// Validate that a string does not contain control characters or NULL bytes.
pub fn no_control_chars(value: &str) -> Result<(), validator::ValidationError> {
    if value
        .chars()
        .any(|c| c.is_control() && c != '\n' && c != '\r' && c != '\t')
    {
        return Err(validator::ValidationError::new("no_control_chars")
            .with_message("Must not contain control characters".into()));
    }
    Ok(())
}

/// Validate that a string is not empty after trimming whitespace.
pub fn not_empty_trimmed(value: &str) -> Result<(), validator::ValidationError> {
    if value.trim().is_empty() {
        return Err(validator::ValidationError::new("not_empty_trimmed")
            .with_message("Must not be empty".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_control_chars_valid() {
        assert!(no_control_chars("Hello, world!").is_ok());
        assert!(no_control_chars("Line 1\nLine 2").is_ok());
        assert!(no_control_chars("Tab\there").is_ok());
        assert!(no_control_chars("Return\rhere").is_ok());
    }

    #[test]
    fn test_no_control_chars_invalid() {
        assert!(no_control_chars("Hello\x00World").is_err()); // NULL byte
        assert!(no_control_chars("Hello\x07World").is_err()); // Bell
        assert!(no_control_chars("Hello\x1bWorld").is_err()); // Escape
    }

    #[test]
    fn test_not_empty_trimmed_valid() {
        assert!(not_empty_trimmed("Hello").is_ok());
        assert!(not_empty_trimmed("  Hello  ").is_ok());
    }

    #[test]
    fn test_not_empty_trimmed_invalid() {
        assert!(not_empty_trimmed("").is_err());
        assert!(not_empty_trimmed("   ").is_err());
        assert!(not_empty_trimmed("\t\n").is_err());
    }

    mod extractor {
        use crate::web::dto::{CreateMessageRequest, ValidatedJson};
        use axum::{body::Body, http::Request, http::StatusCode, routing::post, Router};
        use tower::util::ServiceExt;

        async fn handler(ValidatedJson(req): ValidatedJson<CreateMessageRequest>) -> String {
            req.content
        }

        async fn send(body: &'static str) -> StatusCode {
            let app = Router::new().route("/", post(handler));
            let request = Request::builder()
                .method("POST")
                .uri("/")
                .header("content-type", "application/json")
                .body(Body::from(body))
                .unwrap();
            app.oneshot(request).await.unwrap().status()
        }

        #[tokio::test]
        async fn test_valid_body_passes() {
            assert_eq!(send(r#"{"content":"hello"}"#).await, StatusCode::OK);
        }

        #[tokio::test]
        async fn test_malformed_json_is_bad_request() {
            assert_eq!(send(r#"{"content":"#).await, StatusCode::BAD_REQUEST);
        }

        #[tokio::test]
        async fn test_rule_violation_is_unprocessable() {
            assert_eq!(
                send(r#"{"content":"hi","image_url":"http://x/\u0007"}"#).await,
                StatusCode::UNPROCESSABLE_ENTITY
            );
        }
    }
}

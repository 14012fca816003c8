//! Request DTOs for the HTTP API.

use serde::{Deserialize, Deserializer};
use validator::Validate;

use super::validation::{no_control_chars, not_empty_trimmed};
use crate::forum::normalize_tags;

/// Upper bound for any free-text field accepted by the API.
const MAX_TEXT_LENGTH: u64 = 10_000;

/// Deserialize a present field as `Some`, so `null` becomes `Some(None)`.
fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// User registration request.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(max = 64), custom(function = "no_control_chars"))]
    pub username: String,
    #[validate(length(max = 254), custom(function = "no_control_chars"))]
    pub email: String,
    #[validate(length(max = 128))]
    pub password: String,
}

/// Login request.
///
/// `login` is a username or an email address.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[serde(alias = "username", alias = "email")]
    #[validate(custom(function = "not_empty_trimmed"))]
    pub login: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Profile update request. Blank fields are left unchanged.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    #[validate(length(max = 64), custom(function = "no_control_chars"))]
    pub username: Option<String>,
    #[serde(default)]
    #[validate(length(max = 254), custom(function = "no_control_chars"))]
    pub email: Option<String>,
    #[serde(default)]
    #[validate(length(max = 2048), custom(function = "no_control_chars"))]
    pub profile_picture: Option<String>,
    #[serde(default)]
    #[validate(length(max = 10000))]
    pub biography: Option<String>,
}

/// Password change request.
#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,
    #[validate(length(min = 1, max = 128))]
    pub new_password: String,
}

/// Thread tags, sent either as a list or as a comma-separated string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TagsInput {
    List(Vec<String>),
    Text(String),
}

impl TagsInput {
    /// Normalized tag list.
    pub fn into_tags(self) -> Vec<String> {
        match self {
            TagsInput::List(tags) => normalize_tags(tags),
            TagsInput::Text(text) => normalize_tags([text]),
        }
    }
}

/// Thread creation request.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateThreadRequest {
    #[validate(length(max = 1000), custom(function = "no_control_chars"))]
    pub title: String,
    #[validate(length(max = MAX_TEXT_LENGTH))]
    pub description: String,
    #[serde(default)]
    pub tags: Option<TagsInput>,
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(default)]
    pub visibility: Option<String>,
}

/// Thread update request (author or admin).
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateThreadRequest {
    #[serde(default)]
    #[validate(length(max = 1000), custom(function = "no_control_chars"))]
    pub title: Option<String>,
    #[serde(default)]
    #[validate(length(max = MAX_TEXT_LENGTH))]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Option<TagsInput>,
    /// `null` removes the category.
    #[serde(default, deserialize_with = "deserialize_some")]
    pub category_id: Option<Option<i64>>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub visibility: Option<String>,
}

/// Message creation request.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateMessageRequest {
    #[validate(length(max = MAX_TEXT_LENGTH))]
    pub content: String,
    #[serde(default)]
    #[validate(length(max = 2048), custom(function = "no_control_chars"))]
    pub image_url: Option<String>,
}

/// Message update request.
///
/// An empty `image_url` removes the image.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateMessageRequest {
    #[serde(default)]
    #[validate(length(max = MAX_TEXT_LENGTH))]
    pub content: Option<String>,
    #[serde(default)]
    #[validate(length(max = 2048), custom(function = "no_control_chars"))]
    pub image_url: Option<String>,
}

/// Admin thread status change.
#[derive(Debug, Deserialize, Validate)]
pub struct ThreadStatusRequest {
    #[validate(custom(function = "not_empty_trimmed"))]
    pub status: String,
}

/// Admin thread moderation (status and/or visibility).
#[derive(Debug, Default, Deserialize, Validate)]
pub struct ModerateThreadRequest {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub visibility: Option<String>,
}

/// Category creation request.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCategoryRequest {
    #[validate(length(max = 1000), custom(function = "no_control_chars"))]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = MAX_TEXT_LENGTH))]
    pub description: Option<String>,
}

/// Category update request.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateCategoryRequest {
    #[serde(default)]
    #[validate(length(max = 1000), custom(function = "no_control_chars"))]
    pub name: Option<String>,
    #[serde(default)]
    #[validate(length(max = MAX_TEXT_LENGTH))]
    pub description: Option<String>,
}

/// `page` and `per_page` query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Thread list query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct ThreadListQuery {
    pub status: Option<String>,
    pub visibility: Option<String>,
    pub category_id: Option<i64>,
    pub author_id: Option<i64>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Message list query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct MessageListQuery {
    pub sort_by: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Search query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_request_aliases() {
        let req: LoginRequest =
            serde_json::from_str(r#"{"username":"alice","password":"x"}"#).unwrap();
        assert_eq!(req.login, "alice");

        let req: LoginRequest =
            serde_json::from_str(r#"{"email":"a@example.com","password":"x"}"#).unwrap();
        assert_eq!(req.login, "a@example.com");
    }

    #[test]
    fn test_tags_input() {
        let req: CreateThreadRequest = serde_json::from_str(
            r#"{"title":"t","description":"d","tags":["Rust"," web ","rust"]}"#,
        )
        .unwrap();
        assert_eq!(req.tags.unwrap().into_tags(), vec!["Rust", "web"]);

        let req: CreateThreadRequest =
            serde_json::from_str(r#"{"title":"t","description":"d","tags":"a, b"}"#).unwrap();
        assert_eq!(req.tags.unwrap().into_tags(), vec!["a", "b"]);
    }

    #[test]
    fn test_update_thread_category_null() {
        let req: UpdateThreadRequest = serde_json::from_str(r#"{"category_id":null}"#).unwrap();
        assert_eq!(req.category_id, Some(None));

        let req: UpdateThreadRequest = serde_json::from_str(r#"{"category_id":4}"#).unwrap();
        assert_eq!(req.category_id, Some(Some(4)));

        let req: UpdateThreadRequest = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(req.category_id, None);
    }

    #[test]
    fn test_validation_rejects_control_chars() {
        let req = CreateThreadRequest {
            title: "bad\u{0007}title".to_string(),
            description: "ok".to_string(),
            tags: None,
            category_id: None,
            visibility: None,
        };
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("title"));
    }
}

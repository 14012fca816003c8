//! Authentication handlers.

use axum::{extract::State, http::StatusCode, Json};
use jsonwebtoken::EncodingKey;
use std::sync::Arc;

use crate::auth::{authenticate, register as register_user, RegistrationRequest};
use crate::config::ForumConfig;
use crate::db::{User, UserRepository};
use crate::template::{builtin_engine, TemplateEngine};
use crate::web::dto::{
    ApiResponse, AuthResponse, LoginRequest, ProfileResponse, RegisterRequest, ValidatedJson,
};
use crate::web::error::ApiError;
use crate::web::middleware::{AuthUser, JwtClaims};
use crate::{AgoraError, Database};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    /// JWT encoding key.
    pub encoding_key: EncodingKey,
    /// Token lifetime in seconds.
    pub token_expiry: u64,
    /// Name and description shown on rendered pages.
    pub forum: ForumConfig,
    pub templates: Arc<TemplateEngine>,
}

impl AppState {
    /// Create a new application state with the built-in page templates.
    pub fn new(db: Database, jwt_secret: &str, token_expiry: u64) -> Result<Self, AgoraError> {
        Ok(Self {
            db,
            encoding_key: EncodingKey::from_secret(jwt_secret.as_bytes()),
            token_expiry,
            forum: ForumConfig::default(),
            templates: Arc::new(builtin_engine()?),
        })
    }

    pub fn with_forum(mut self, forum: ForumConfig) -> Self {
        self.forum = forum;
        self
    }

    /// Issue a bearer token for a user.
    pub fn generate_token(&self, user: &User) -> Result<String, ApiError> {
        JwtClaims::for_user(user, self.token_expiry).encode(&self.encoding_key)
    }

    fn auth_response(&self, user: User) -> Result<AuthResponse, ApiError> {
        Ok(AuthResponse {
            token: self.generate_token(&user)?,
            expires_in: self.token_expiry,
            user: user.into(),
        })
    }

    /// Load the account behind a token.
    ///
    /// Deleted accounts are 401 and banned accounts are 403, even while
    /// the token is still valid.
    pub async fn current_user(&self, claims: &JwtClaims) -> Result<User, ApiError> {
        let user = UserRepository::new(self.db.pool())
            .get_by_id(claims.sub)
            .await?
            .ok_or_else(|| ApiError::unauthorized("User no longer exists"))?;

        if user.is_banned {
            return Err(ApiError::forbidden("Account is banned"));
        }
        Ok(user)
    }

    /// Like [`AppState::current_user`], but anonymous, deleted and banned
    /// viewers are all treated as guests.
    pub async fn viewer(&self, claims: Option<&JwtClaims>) -> Result<Option<User>, ApiError> {
        let Some(claims) = claims else {
            return Ok(None);
        };
        match self.current_user(claims).await {
            Ok(user) => Ok(Some(user)),
            Err(e) if e.code().status_code().is_client_error() => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// POST /api/auth/register - Create an account and sign in.
pub async fn register(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AuthResponse>>), ApiError> {
    let repo = UserRepository::new(state.db.pool());
    let user = register_user(
        &repo,
        RegistrationRequest::new(req.username, req.email, req.password),
    )
    .await
    .map_err(AgoraError::from)?;

    tracing::info!(user_id = user.id, username = %user.username, "User registered");

    let response = state.auth_response(user)?;
    Ok((StatusCode::CREATED, Json(ApiResponse::new(response))))
}

/// POST /api/auth/login - Sign in with username or email.
pub async fn login(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<Json<ApiResponse<AuthResponse>>, ApiError> {
    let repo = UserRepository::new(state.db.pool());
    let user = authenticate(&repo, &req.login, &req.password)
        .await
        .map_err(AgoraError::from)?;

    tracing::info!(user_id = user.id, "User logged in");

    // Reload to report the recorded connection time.
    let user = repo.get_by_id(user.id).await?.unwrap_or(user);
    Ok(Json(ApiResponse::new(state.auth_response(user)?)))
}

/// GET /api/auth/me - Current user.
pub async fn me(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
) -> Result<Json<ApiResponse<ProfileResponse>>, ApiError> {
    let user = state.current_user(&claims).await?;
    Ok(Json(ApiResponse::new(user.into())))
}

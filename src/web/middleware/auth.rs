//! JWT authentication middleware.

use axum::{
    async_trait,
    body::Body,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, Request},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::db::{Role, User};
use crate::web::error::ApiError;

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject (user ID).
    pub sub: i64,
    pub username: String,
    /// User role (`user` or `admin`).
    pub role: String,
    /// Issued at timestamp.
    pub iat: u64,
    /// Expiration timestamp.
    pub exp: u64,
    /// JWT ID (unique identifier).
    pub jti: String,
}

impl JwtClaims {
    /// Claims for `user`, valid for `expiry_secs` from now.
    pub fn for_user(user: &User, expiry_secs: u64) -> Self {
        let now = chrono::Utc::now().timestamp().max(0) as u64;
        Self {
            sub: user.id,
            username: user.username.clone(),
            role: user.role.as_str().to_string(),
            iat: now,
            exp: now + expiry_secs,
            jti: uuid::Uuid::new_v4().to_string(),
        }
    }

    /// Parsed role. Unknown values are treated as guest.
    pub fn role(&self) -> Role {
        self.role.parse().unwrap_or(Role::Guest)
    }

    pub fn is_admin(&self) -> bool {
        self.role() == Role::Admin
    }

    /// Sign the claims.
    pub fn encode(&self, key: &EncodingKey) -> Result<String, ApiError> {
        encode(&Header::default(), self, key).map_err(|e| {
            tracing::error!(error = %e, "Failed to encode JWT");
            ApiError::internal("Failed to generate token")
        })
    }
}

/// Application state for JWT authentication.
#[derive(Clone)]
pub struct JwtState {
    /// Decoding key for JWT verification.
    pub decoding_key: DecodingKey,
    /// Validation settings.
    pub validation: Validation,
}

impl JwtState {
    /// Create a new JWT state from a secret key.
    pub fn new(secret: &str) -> Self {
        let decoding_key = DecodingKey::from_secret(secret.as_bytes());
        let mut validation = Validation::default();
        validation.validate_exp = true;

        Self {
            decoding_key,
            validation,
        }
    }

    /// Decode and validate a token.
    pub fn verify(&self, token: &str) -> Result<JwtClaims, ApiError> {
        decode::<JwtClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "JWT validation failed");
                ApiError::unauthorized("Invalid or expired token")
            })
    }
}

/// Token from the `Authorization: Bearer` header, or from a `token`
/// query parameter for plain page navigation.
fn extract_token(parts: &Parts) -> Option<String> {
    if let Some(header) = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
    {
        return header.strip_prefix("Bearer ").map(|t| t.trim().to_string());
    }

    parts.uri.query().unwrap_or("").split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        if key == "token" {
            urlencoding::decode(value).ok().map(|s| s.into_owned())
        } else {
            None
        }
    })
}

fn jwt_state(parts: &Parts) -> Result<&Arc<JwtState>, ApiError> {
    parts
        .extensions
        .get::<Arc<JwtState>>()
        .ok_or_else(|| ApiError::internal("JWT state not configured"))
}

/// Extractor for authenticated users.
///
/// The handler receives the JWT claims if the token is valid.
#[derive(Debug, Clone)]
pub struct AuthUser(pub JwtClaims);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token =
            extract_token(parts).ok_or_else(|| ApiError::unauthorized("Missing authorization"))?;
        let claims = jwt_state(parts)?.verify(&token)?;
        Ok(AuthUser(claims))
    }
}

/// Optional authentication extractor.
///
/// Similar to AuthUser but doesn't fail if no token, or an invalid one,
/// is provided.
#[derive(Debug, Clone)]
pub struct OptionalAuthUser(pub Option<JwtClaims>);

#[async_trait]
impl<S> FromRequestParts<S> for OptionalAuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(token) = extract_token(parts) else {
            return Ok(OptionalAuthUser(None));
        };
        let Some(state) = parts.extensions.get::<Arc<JwtState>>() else {
            return Ok(OptionalAuthUser(None));
        };
        Ok(OptionalAuthUser(state.verify(&token).ok()))
    }
}

/// Extractor that requires a token carrying the admin role.
///
/// The role in the database is checked again by the forum service.
#[derive(Debug, Clone)]
pub struct AdminUser(pub JwtClaims);

#[async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthUser(claims) = AuthUser::from_request_parts(parts, state).await?;
        if !claims.is_admin() {
            tracing::warn!(user_id = claims.sub, "Non-admin attempted admin access");
            return Err(ApiError::forbidden("admin access required"));
        }
        Ok(AdminUser(claims))
    }
}

/// Middleware function to inject JWT state into request extensions.
pub async fn jwt_auth(
    jwt_state: Arc<JwtState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    request.extensions_mut().insert(jwt_state);
    next.run(request).await
}

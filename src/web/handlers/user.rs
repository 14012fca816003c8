//! Current-user handlers: profile, password and own content.

use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;

use super::AppState;
use crate::auth::{
    change_password as change_user_password, update_profile as update_user_profile,
    ProfileUpdateRequest,
};
use crate::db::UserRepository;
use crate::forum::{ForumService, Pagination};
use crate::web::dto::{
    ApiResponse, ChangePasswordRequest, MessageResponse, PageQuery, PaginatedResponse,
    ProfileResponse, ThreadResponse, UpdateProfileRequest, UserStatsResponse, ValidatedJson,
};
use crate::web::error::ApiError;
use crate::web::middleware::AuthUser;
use crate::AgoraError;

/// GET /api/users/me - Own profile.
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
) -> Result<Json<ApiResponse<ProfileResponse>>, ApiError> {
    let user = state.current_user(&claims).await?;
    Ok(Json(ApiResponse::new(user.into())))
}

/// PUT /api/users/me - Update own profile. Blank fields are ignored.
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    ValidatedJson(req): ValidatedJson<UpdateProfileRequest>,
) -> Result<Json<ApiResponse<ProfileResponse>>, ApiError> {
    let user = state.current_user(&claims).await?;

    let request = ProfileUpdateRequest {
        username: req.username,
        email: req.email,
        profile_picture: req.profile_picture,
        biography: req.biography,
    };

    let repo = UserRepository::new(state.db.pool());
    let updated = update_user_profile(&repo, user.id, request)
        .await
        .map_err(AgoraError::from)?;

    Ok(Json(ApiResponse::new(updated.into())))
}

/// PUT /api/users/me/password - Change own password.
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    ValidatedJson(req): ValidatedJson<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let user = state.current_user(&claims).await?;

    let repo = UserRepository::new(state.db.pool());
    change_user_password(&repo, user.id, &req.current_password, &req.new_password)
        .await
        .map_err(AgoraError::from)?;

    Ok(Json(ApiResponse::new(())))
}

/// GET /api/users/stats - Own statistics.
pub async fn user_stats(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
) -> Result<Json<ApiResponse<UserStatsResponse>>, ApiError> {
    let user = state.current_user(&claims).await?;
    let stats = ForumService::new(&state.db).user_stats(&user).await?;
    Ok(Json(ApiResponse::new(stats.into())))
}

/// GET /api/users/threads - Own threads, any status or visibility.
pub async fn user_threads(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Query(query): Query<PageQuery>,
) -> Result<Json<PaginatedResponse<ThreadResponse>>, ApiError> {
    let user = state.current_user(&claims).await?;
    let pagination = Pagination::from_page(query.page, query.per_page);

    let result = ForumService::new(&state.db)
        .list_user_threads(&user, pagination)
        .await?;
    Ok(Json(PaginatedResponse::from_result(result)))
}

/// GET /api/users/messages - Own messages, newest first.
pub async fn user_messages(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Query(query): Query<PageQuery>,
) -> Result<Json<PaginatedResponse<MessageResponse>>, ApiError> {
    let user = state.current_user(&claims).await?;
    let pagination = Pagination::from_page(query.page, query.per_page);

    let result = ForumService::new(&state.db)
        .list_user_messages(&user, pagination)
        .await?;
    Ok(Json(PaginatedResponse::from_result(result)))
}

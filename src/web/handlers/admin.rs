//! Admin handlers for Web API.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use super::thread::thread_filter;
use super::{parse_param, AppState};
use crate::forum::{ForumService, Pagination, ThreadFilter, ThreadStatus, Visibility};
use crate::web::dto::{
    AdminStatsResponse, ApiResponse, ModerateThreadRequest, PageQuery, PaginatedResponse,
    ProfileResponse, ThreadListQuery, ThreadResponse, ThreadStatusRequest, ValidatedJson,
};
use crate::web::error::ApiError;
use crate::web::middleware::AdminUser;

// ============================================================================
// Statistics and users
// ============================================================================

/// GET /api/admin/stats - Moderation statistics.
pub async fn admin_stats(
    State(state): State<Arc<AppState>>,
    AdminUser(claims): AdminUser,
) -> Result<Json<ApiResponse<AdminStatsResponse>>, ApiError> {
    let admin = state.current_user(&claims).await?;
    let stats = ForumService::new(&state.db).admin_stats(&admin).await?;
    Ok(Json(ApiResponse::new(stats.into())))
}

/// GET /api/admin/users - List all users.
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    AdminUser(claims): AdminUser,
    Query(query): Query<PageQuery>,
) -> Result<Json<PaginatedResponse<ProfileResponse>>, ApiError> {
    let admin = state.current_user(&claims).await?;
    let pagination = Pagination::from_page(query.page, query.per_page);

    let result = ForumService::new(&state.db)
        .list_users(&admin, pagination)
        .await?;
    Ok(Json(PaginatedResponse::from_result(result)))
}

/// POST /api/admin/users/:id/ban
pub async fn ban_user(
    State(state): State<Arc<AppState>>,
    AdminUser(claims): AdminUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<ProfileResponse>>, ApiError> {
    let admin = state.current_user(&claims).await?;
    let user = ForumService::new(&state.db)
        .set_user_banned(&admin, id, true)
        .await?;
    Ok(Json(ApiResponse::new(user.into())))
}

/// POST /api/admin/users/:id/unban
pub async fn unban_user(
    State(state): State<Arc<AppState>>,
    AdminUser(claims): AdminUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<ProfileResponse>>, ApiError> {
    let admin = state.current_user(&claims).await?;
    let user = ForumService::new(&state.db)
        .set_user_banned(&admin, id, false)
        .await?;
    Ok(Json(ApiResponse::new(user.into())))
}

// ============================================================================
// Thread moderation
// ============================================================================

/// GET /api/admin/threads - Every thread unless filtered.
pub async fn admin_list_threads(
    State(state): State<Arc<AppState>>,
    AdminUser(claims): AdminUser,
    Query(query): Query<ThreadListQuery>,
) -> Result<Json<PaginatedResponse<ThreadResponse>>, ApiError> {
    let admin = state.current_user(&claims).await?;
    let filter = thread_filter(ThreadFilter::any(), &query)?;
    let pagination = Pagination::from_page(query.page, query.per_page);

    let result = ForumService::new(&state.db)
        .admin_list_threads(&admin, filter, pagination)
        .await?;
    Ok(Json(PaginatedResponse::from_result(result)))
}

/// PUT /api/admin/threads/:id/status
pub async fn set_thread_status(
    State(state): State<Arc<AppState>>,
    AdminUser(claims): AdminUser,
    Path(id): Path<i64>,
    ValidatedJson(req): ValidatedJson<ThreadStatusRequest>,
) -> Result<Json<ApiResponse<ThreadResponse>>, ApiError> {
    let admin = state.current_user(&claims).await?;
    let status: ThreadStatus = req.status.parse().map_err(ApiError::bad_request)?;

    let thread = ForumService::new(&state.db)
        .moderate_thread(&admin, id, Some(status), None)
        .await?;
    Ok(Json(ApiResponse::new(thread.into())))
}

/// PUT /api/admin/threads/:id - Change status and/or visibility.
pub async fn moderate_thread(
    State(state): State<Arc<AppState>>,
    AdminUser(claims): AdminUser,
    Path(id): Path<i64>,
    ValidatedJson(req): ValidatedJson<ModerateThreadRequest>,
) -> Result<Json<ApiResponse<ThreadResponse>>, ApiError> {
    let admin = state.current_user(&claims).await?;
    let status = parse_param::<ThreadStatus>(req.status.as_deref())?;
    let visibility = parse_param::<Visibility>(req.visibility.as_deref())?;

    let thread = ForumService::new(&state.db)
        .moderate_thread(&admin, id, status, visibility)
        .await?;
    Ok(Json(ApiResponse::new(thread.into())))
}

/// DELETE /api/admin/threads/:id
pub async fn admin_delete_thread(
    State(state): State<Arc<AppState>>,
    AdminUser(claims): AdminUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let admin = state.current_user(&claims).await?;
    ForumService::new(&state.db)
        .delete_thread(&admin, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/admin/messages/:id
pub async fn admin_delete_message(
    State(state): State<Arc<AppState>>,
    AdminUser(claims): AdminUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let admin = state.current_user(&claims).await?;
    ForumService::new(&state.db)
        .delete_message(&admin, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

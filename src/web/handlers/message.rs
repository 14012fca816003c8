//! Message and reaction handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use super::AppState;
use crate::forum::{ForumService, MessageSort, MessageUpdate, Pagination, ReactionKind};
use crate::web::dto::{
    ApiResponse, CreateMessageRequest, MessageListQuery, MessageResponse, PaginatedResponse,
    ReactionResponse, UpdateMessageRequest, ValidatedJson,
};
use crate::web::error::ApiError;
use crate::web::middleware::{AuthUser, OptionalAuthUser};

/// GET /api/threads/:id/messages - List messages of a thread.
///
/// `sort_by` is `newest` (default), `oldest` or `likes`.
pub async fn list_messages(
    State(state): State<Arc<AppState>>,
    OptionalAuthUser(claims): OptionalAuthUser,
    Path(thread_id): Path<i64>,
    Query(query): Query<MessageListQuery>,
) -> Result<Json<PaginatedResponse<MessageResponse>>, ApiError> {
    let viewer = state.viewer(claims.as_ref()).await?;
    let sort = MessageSort::from_query(query.sort_by.as_deref());
    let pagination = Pagination::from_page(query.page, query.per_page);

    let result = ForumService::new(&state.db)
        .list_messages(viewer.as_ref(), thread_id, sort, pagination)
        .await?;
    Ok(Json(PaginatedResponse::from_result(result)))
}

/// POST /api/threads/:id/messages - Post a message in an open thread.
pub async fn create_message(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path(thread_id): Path<i64>,
    ValidatedJson(req): ValidatedJson<CreateMessageRequest>,
) -> Result<(StatusCode, Json<ApiResponse<MessageResponse>>), ApiError> {
    let user = state.current_user(&claims).await?;
    let message = ForumService::new(&state.db)
        .post_message(&user, thread_id, &req.content, req.image_url)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::new(message.into()))))
}

/// PUT /api/messages/:id - Edit a message (author or admin).
pub async fn update_message(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path(id): Path<i64>,
    ValidatedJson(req): ValidatedJson<UpdateMessageRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let user = state.current_user(&claims).await?;

    let update = MessageUpdate {
        content: req.content,
        image_url: req.image_url.map(Some),
    };
    if update.content.is_none() && update.image_url.is_none() {
        return Err(ApiError::bad_request("Nothing to update"));
    }

    let message = ForumService::new(&state.db)
        .update_message(&user, id, update)
        .await?;
    Ok(Json(ApiResponse::new(message.into())))
}

/// DELETE /api/messages/:id - Delete a message (author or admin).
pub async fn delete_message(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let user = state.current_user(&claims).await?;
    ForumService::new(&state.db).delete_message(&user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn react(
    state: &AppState,
    claims: &crate::web::middleware::JwtClaims,
    message_id: i64,
    kind: ReactionKind,
) -> Result<Json<ApiResponse<ReactionResponse>>, ApiError> {
    let user = state.current_user(claims).await?;
    let summary = ForumService::new(&state.db)
        .react(&user, message_id, kind)
        .await?;
    Ok(Json(ApiResponse::new(summary.into())))
}

/// POST /api/messages/:id/like
pub async fn like_message(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<ReactionResponse>>, ApiError> {
    react(&state, &claims, id, ReactionKind::Like).await
}

/// POST /api/messages/:id/dislike
pub async fn dislike_message(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<ReactionResponse>>, ApiError> {
    react(&state, &claims, id, ReactionKind::Dislike).await
}

/// DELETE /api/messages/:id/reaction - Withdraw own like or dislike.
pub async fn remove_reaction(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<ReactionResponse>>, ApiError> {
    let user = state.current_user(&claims).await?;
    let summary = ForumService::new(&state.db)
        .remove_reaction(&user, id)
        .await?;
    Ok(Json(ApiResponse::new(summary.into())))
}

//! Thread handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use super::{parse_filter_param, parse_param, AppState};
use crate::forum::{
    ForumService, NewThread, Pagination, ThreadFilter, ThreadStatus, ThreadUpdate, Visibility,
};
use crate::web::dto::{
    ApiResponse, CreateThreadRequest, PaginatedResponse, ThreadDetailResponse, ThreadListQuery,
    ThreadResponse, UpdateThreadRequest, ValidatedJson,
};
use crate::web::error::ApiError;
use crate::web::middleware::{AuthUser, OptionalAuthUser};

/// Build a thread filter from query parameters on top of `base`.
///
/// `all` clears the status or visibility criterion.
pub(super) fn thread_filter(
    base: ThreadFilter,
    query: &ThreadListQuery,
) -> Result<ThreadFilter, ApiError> {
    Ok(ThreadFilter {
        status: parse_filter_param::<ThreadStatus>(query.status.as_deref(), base.status)?,
        visibility: parse_filter_param::<Visibility>(
            query.visibility.as_deref(),
            base.visibility,
        )?,
        category_id: query.category_id.or(base.category_id),
        author_id: query.author_id.or(base.author_id),
    })
}

/// GET /api/threads - List threads (open and public by default).
pub async fn list_threads(
    State(state): State<Arc<AppState>>,
    OptionalAuthUser(claims): OptionalAuthUser,
    Query(query): Query<ThreadListQuery>,
) -> Result<Json<PaginatedResponse<ThreadResponse>>, ApiError> {
    let viewer = state.viewer(claims.as_ref()).await?;
    let filter = thread_filter(ThreadFilter::default(), &query)?;
    let pagination = Pagination::from_page(query.page, query.per_page);

    let result = ForumService::new(&state.db)
        .list_threads(viewer.as_ref(), filter, pagination)
        .await?;
    Ok(Json(PaginatedResponse::from_result(result)))
}

/// GET /api/threads/:id - Thread with its newest messages. Counts a view.
pub async fn get_thread(
    State(state): State<Arc<AppState>>,
    OptionalAuthUser(claims): OptionalAuthUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<ThreadDetailResponse>>, ApiError> {
    let viewer = state.viewer(claims.as_ref()).await?;
    let view = ForumService::new(&state.db)
        .view_thread(viewer.as_ref(), id)
        .await?;
    Ok(Json(ApiResponse::new(view.into())))
}

/// POST /api/threads - Create a thread.
pub async fn create_thread(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    ValidatedJson(req): ValidatedJson<CreateThreadRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ThreadResponse>>), ApiError> {
    let user = state.current_user(&claims).await?;

    let mut new_thread = NewThread::new(req.title, req.description, user.id);
    if let Some(tags) = req.tags {
        new_thread = new_thread.with_tags(tags.into_tags());
    }
    if let Some(category_id) = req.category_id {
        new_thread = new_thread.with_category(category_id);
    }
    if let Some(visibility) = parse_param::<Visibility>(req.visibility.as_deref())? {
        new_thread = new_thread.with_visibility(visibility);
    }

    let thread = ForumService::new(&state.db)
        .create_thread(&user, new_thread)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::new(thread.into()))))
}

/// PUT /api/threads/:id - Edit a thread (author or admin).
pub async fn update_thread(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path(id): Path<i64>,
    ValidatedJson(req): ValidatedJson<UpdateThreadRequest>,
) -> Result<Json<ApiResponse<ThreadResponse>>, ApiError> {
    let user = state.current_user(&claims).await?;

    let update = ThreadUpdate {
        title: req.title,
        description: req.description,
        tags: req.tags.map(|t| t.into_tags()),
        category_id: req.category_id,
        status: parse_param::<ThreadStatus>(req.status.as_deref())?,
        visibility: parse_param::<Visibility>(req.visibility.as_deref())?,
    };
    if update.is_empty() {
        return Err(ApiError::bad_request("Nothing to update"));
    }

    let thread = ForumService::new(&state.db)
        .update_thread(&user, id, update)
        .await?;
    Ok(Json(ApiResponse::new(thread.into())))
}

/// DELETE /api/threads/:id - Delete a thread and its messages (author or admin).
pub async fn delete_thread(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let user = state.current_user(&claims).await?;
    ForumService::new(&state.db).delete_thread(&user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

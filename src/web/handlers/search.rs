//! Thread search handler.

use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;

use super::AppState;
use crate::forum::{ForumService, Pagination};
use crate::web::dto::{PaginatedResponse, SearchQuery, ThreadResponse};
use crate::web::error::ApiError;

/// GET /api/search?q= - Search public threads by title, description and tag.
///
/// A missing or blank `q` is a 400.
pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<PaginatedResponse<ThreadResponse>>, ApiError> {
    let pagination = Pagination::from_page(query.page, query.per_page);
    let result = ForumService::new(&state.db)
        .search(query.q.as_deref().unwrap_or(""), pagination)
        .await?;
    Ok(Json(PaginatedResponse::from_result(result)))
}

//! Public statistics handler.

use axum::{extract::State, Json};
use std::sync::Arc;

use super::AppState;
use crate::forum::ForumService;
use crate::web::dto::{ApiResponse, GlobalStatsResponse};
use crate::web::error::ApiError;

/// GET /api/stats - Forum totals, recent threads and most active users.
pub async fn global_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<GlobalStatsResponse>>, ApiError> {
    let stats = ForumService::new(&state.db).global_stats().await?;
    Ok(Json(ApiResponse::new(stats.into())))
}

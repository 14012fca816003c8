//! Category handlers. Reads are public; writes are admin-only.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use super::AppState;
use crate::forum::{CategoryUpdate, ForumService};
use crate::web::dto::{
    ApiResponse, CategoryResponse, CreateCategoryRequest, UpdateCategoryRequest, ValidatedJson,
};
use crate::web::error::ApiError;
use crate::web::middleware::AdminUser;

/// GET /api/categories
pub async fn list_categories(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<CategoryResponse>>>, ApiError> {
    let categories = ForumService::new(&state.db).list_categories().await?;
    Ok(Json(ApiResponse::new(
        categories.into_iter().map(Into::into).collect(),
    )))
}

/// GET /api/categories/:id
pub async fn get_category(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<CategoryResponse>>, ApiError> {
    let category = ForumService::new(&state.db).get_category(id).await?;
    Ok(Json(ApiResponse::new(category.into())))
}

/// POST /api/admin/categories
pub async fn create_category(
    State(state): State<Arc<AppState>>,
    AdminUser(claims): AdminUser,
    ValidatedJson(req): ValidatedJson<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CategoryResponse>>), ApiError> {
    let admin = state.current_user(&claims).await?;
    let category = ForumService::new(&state.db)
        .create_category(&admin, &req.name, req.description.as_deref().unwrap_or(""))
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::new(category.into()))))
}

/// PUT /api/admin/categories/:id
pub async fn update_category(
    State(state): State<Arc<AppState>>,
    AdminUser(claims): AdminUser,
    Path(id): Path<i64>,
    ValidatedJson(req): ValidatedJson<UpdateCategoryRequest>,
) -> Result<Json<ApiResponse<CategoryResponse>>, ApiError> {
    let admin = state.current_user(&claims).await?;

    let update = CategoryUpdate {
        name: req.name,
        description: req.description,
    };
    if update.is_empty() {
        return Err(ApiError::bad_request("Nothing to update"));
    }

    let category = ForumService::new(&state.db)
        .update_category(&admin, id, update)
        .await?;
    Ok(Json(ApiResponse::new(category.into())))
}

/// DELETE /api/admin/categories/:id - Removes the category's threads too.
pub async fn delete_category(
    State(state): State<Arc<AppState>>,
    AdminUser(claims): AdminUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let admin = state.current_user(&claims).await?;
    ForumService::new(&state.db)
        .delete_category(&admin, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

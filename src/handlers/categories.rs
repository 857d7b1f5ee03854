use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;

use crate::services::categories::{CategoryView, CreateCategoryRequest};
use crate::{ApiResponse, ApiResult, AppState};

#[derive(Debug, Deserialize)]
pub struct RenameCategoryRequest {
    pub name: String,
}

pub async fn create_category(
    State(state): State<AppState>,
    Json(payload): Json<CreateCategoryRequest>,
) -> ApiResult<CategoryView> {
    let category = state.services.categories.create_category(payload).await?;
    Ok(Json(ApiResponse::ok(
        "Category created successfully",
        category,
    )))
}

pub async fn list_categories(State(state): State<AppState>) -> ApiResult<Vec<CategoryView>> {
    let categories = state.services.categories.list_categories().await?;
    Ok(Json(ApiResponse::ok(
        "Categories fetched successfully",
        categories,
    )))
}

pub async fn rename_category(
    State(state): State<AppState>,
    Path(category_id): Path<i32>,
    Json(payload): Json<RenameCategoryRequest>,
) -> ApiResult<CategoryView> {
    let category = state
        .services
        .categories
        .rename_category(category_id, payload.name)
        .await?;
    Ok(Json(ApiResponse::ok("Category renamed", category)))
}

pub async fn activate(
    State(state): State<AppState>,
    Path(category_id): Path<i32>,
) -> ApiResult<CategoryView> {
    let category = state
        .services
        .categories
        .set_active(category_id, true)
        .await?;
    Ok(Json(ApiResponse::ok("Category activated", category)))
}

pub async fn deactivate(
    State(state): State<AppState>,
    Path(category_id): Path<i32>,
) -> ApiResult<CategoryView> {
    let category = state
        .services
        .categories
        .set_active(category_id, false)
        .await?;
    Ok(Json(ApiResponse::ok("Category deactivated", category)))
}

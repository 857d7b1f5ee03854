use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use crate::services::menu_items::{CreateMenuItemRequest, MenuItemView, UpdateMenuItemRequest};
use crate::{ApiResponse, ApiResult, AppState};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItemListQuery {
    pub category_id: Option<i32>,
    #[serde(default)]
    pub active_only: bool,
}

pub async fn create_menu_item(
    State(state): State<AppState>,
    Json(payload): Json<CreateMenuItemRequest>,
) -> ApiResult<MenuItemView> {
    let item = state.services.menu_items.create_menu_item(payload).await?;
    Ok(Json(ApiResponse::ok("MenuItem created successfully", item)))
}

pub async fn list_menu_items(
    State(state): State<AppState>,
    Query(query): Query<MenuItemListQuery>,
) -> ApiResult<Vec<MenuItemView>> {
    let items = state
        .services
        .menu_items
        .list_menu_items(query.category_id, query.active_only)
        .await?;
    Ok(Json(ApiResponse::ok("MenuItems fetched successfully", items)))
}

pub async fn update_menu_item(
    State(state): State<AppState>,
    Path(menu_item_id): Path<i32>,
    Json(payload): Json<UpdateMenuItemRequest>,
) -> ApiResult<MenuItemView> {
    let item = state
        .services
        .menu_items
        .update_menu_item(menu_item_id, payload)
        .await?;
    Ok(Json(ApiResponse::ok("MenuItem updated", item)))
}

pub async fn activate(
    State(state): State<AppState>,
    Path(menu_item_id): Path<i32>,
) -> ApiResult<MenuItemView> {
    let item = state
        .services
        .menu_items
        .set_active(menu_item_id, true)
        .await?;
    Ok(Json(ApiResponse::ok("MenuItem activated", item)))
}

pub async fn deactivate(
    State(state): State<AppState>,
    Path(menu_item_id): Path<i32>,
) -> ApiResult<MenuItemView> {
    let item = state
        .services
        .menu_items
        .set_active(menu_item_id, false)
        .await?;
    Ok(Json(ApiResponse::ok("MenuItem deactivated", item)))
}

use axum::{
    extract::{Path, State},
    Json,
};

use crate::services::tables::{CreateTableRequest, TableView};
use crate::{ApiResponse, ApiResult, AppState};

pub async fn create_table(
    State(state): State<AppState>,
    Json(payload): Json<CreateTableRequest>,
) -> ApiResult<TableView> {
    let table = state.services.tables.create_table(payload).await?;
    Ok(Json(ApiResponse::ok("Table created successfully", table)))
}

pub async fn list_tables(State(state): State<AppState>) -> ApiResult<Vec<TableView>> {
    let tables = state.services.tables.list_tables().await?;
    Ok(Json(ApiResponse::ok("Tables fetched successfully", tables)))
}

pub async fn get_table(
    State(state): State<AppState>,
    Path(table_id): Path<i32>,
) -> ApiResult<TableView> {
    let table = state.services.tables.get_table(table_id).await?;
    Ok(Json(ApiResponse::ok("Table fetched successfully", table)))
}

pub async fn activate(
    State(state): State<AppState>,
    Path(table_id): Path<i32>,
) -> ApiResult<TableView> {
    let table = state.services.tables.set_active(table_id, true).await?;
    Ok(Json(ApiResponse::ok("Table activated", table)))
}

pub async fn deactivate(
    State(state): State<AppState>,
    Path(table_id): Path<i32>,
) -> ApiResult<TableView> {
    let table = state.services.tables.set_active(table_id, false).await?;
    Ok(Json(ApiResponse::ok("Table deactivated", table)))
}

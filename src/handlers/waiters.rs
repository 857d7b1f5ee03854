use axum::{extract::State, Json};

use crate::services::waiters::{CreateWaiterRequest, WaiterView};
use crate::{ApiResponse, ApiResult, AppState};

pub async fn create_waiter(
    State(state): State<AppState>,
    Json(payload): Json<CreateWaiterRequest>,
) -> ApiResult<WaiterView> {
    let waiter = state.services.waiters.create_waiter(payload).await?;
    Ok(Json(ApiResponse::ok("Waiter created successfully", waiter)))
}

pub async fn list_waiters(State(state): State<AppState>) -> ApiResult<Vec<WaiterView>> {
    let waiters = state.services.waiters.list_waiters().await?;
    Ok(Json(ApiResponse::ok("Waiters fetched successfully", waiters)))
}

use axum::{
    extract::{Path, State},
    Json,
};

use crate::kitchen::QueuedItem;
use crate::{ApiResponse, ApiResult, AppState};

pub async fn get_queue(State(state): State<AppState>) -> ApiResult<Vec<QueuedItem>> {
    let items = state.services.kitchen.get_queue().await?;
    Ok(Json(ApiResponse::ok("Queue fetched successfully", items)))
}

pub async fn mark_ready(
    State(state): State<AppState>,
    Path(order_item_id): Path<i32>,
) -> ApiResult<bool> {
    state.services.kitchen.mark_ready(order_item_id).await?;
    Ok(Json(ApiResponse::ok("OrderItem marked as Ready", true)))
}

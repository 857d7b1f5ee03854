use axum::{
    extract::{Path, State},
    Json,
};

use crate::services::discounts::{CreateDiscountRequest, DiscountView};
use crate::{ApiResponse, ApiResult, AppState};

pub async fn create_discount(
    State(state): State<AppState>,
    Json(payload): Json<CreateDiscountRequest>,
) -> ApiResult<DiscountView> {
    let discount = state.services.discounts.create_discount(payload).await?;
    Ok(Json(ApiResponse::ok(
        "Discount created successfully",
        discount,
    )))
}

pub async fn list_active(State(state): State<AppState>) -> ApiResult<Vec<DiscountView>> {
    let discounts = state.services.discounts.list_active().await?;
    Ok(Json(ApiResponse::ok(
        "Active discounts fetched successfully",
        discounts,
    )))
}

pub async fn end_discount(
    State(state): State<AppState>,
    Path(discount_id): Path<i32>,
) -> ApiResult<bool> {
    state.services.discounts.end_discount(discount_id).await?;
    Ok(Json(ApiResponse::ok("Discount ended successfully", true)))
}

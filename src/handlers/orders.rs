use axum::{
    extract::{Path, Query, State},
    Json,
};
use rust_decimal::Decimal;

use crate::services::orders::{
    AddItemRequest, CreateOrderRequest, OrderItemView, OrderListFilter, OrderPage, OrderSummary,
    OrderWithItems,
};
use crate::{ApiResponse, ApiResult, AppState};

pub async fn create_order(
    State(state): State<AppState>,
    Json(payload): Json<CreateOrderRequest>,
) -> ApiResult<OrderSummary> {
    let order = state.services.orders.create_order(payload).await?;
    Ok(Json(ApiResponse::ok("Order created successfully", order)))
}

pub async fn list_orders(
    State(state): State<AppState>,
    Query(filter): Query<OrderListFilter>,
) -> ApiResult<OrderPage> {
    let page = state.services.orders.list_orders(filter).await?;
    Ok(Json(ApiResponse::ok("Orders fetched successfully", page)))
}

pub async fn get_order(
    State(state): State<AppState>,
    Path(order_id): Path<i32>,
) -> ApiResult<OrderWithItems> {
    let order = state.services.orders.get_order(order_id).await?;
    Ok(Json(ApiResponse::ok("Order fetched successfully", order)))
}

pub async fn add_item(
    State(state): State<AppState>,
    Path(order_id): Path<i32>,
    Json(payload): Json<AddItemRequest>,
) -> ApiResult<OrderItemView> {
    let item = state.services.orders.add_item(order_id, payload).await?;
    Ok(Json(ApiResponse::ok("OrderItem added", item)))
}

pub async fn remove_item(
    State(state): State<AppState>,
    Path((order_id, order_item_id)): Path<(i32, i32)>,
) -> ApiResult<bool> {
    state
        .services
        .orders
        .remove_item(order_id, order_item_id)
        .await?;
    Ok(Json(ApiResponse::ok("OrderItem removed", true)))
}

pub async fn confirm_order(
    State(state): State<AppState>,
    Path(order_id): Path<i32>,
) -> ApiResult<bool> {
    state.services.orders.confirm(order_id).await?;
    Ok(Json(ApiResponse::ok("Order confirmed", true)))
}

pub async fn pay_order(
    State(state): State<AppState>,
    Path(order_id): Path<i32>,
) -> ApiResult<bool> {
    state.services.orders.pay(order_id).await?;
    Ok(Json(ApiResponse::ok("Order paid", true)))
}

pub async fn cancel_order(
    State(state): State<AppState>,
    Path(order_id): Path<i32>,
) -> ApiResult<bool> {
    state.services.orders.cancel(order_id).await?;
    Ok(Json(ApiResponse::ok("Order cancelled", true)))
}

pub async fn get_order_total(
    State(state): State<AppState>,
    Path(order_id): Path<i32>,
) -> ApiResult<Decimal> {
    let total = state.services.orders.get_total(order_id).await?;
    Ok(Json(ApiResponse::ok("Total calculated successfully", total)))
}

pub async fn serve_item(
    State(state): State<AppState>,
    Path(order_item_id): Path<i32>,
) -> ApiResult<bool> {
    state.services.orders.serve_item(order_item_id).await?;
    Ok(Json(ApiResponse::ok("OrderItem served", true)))
}

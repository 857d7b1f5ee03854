//! Tableside API Library
//!
//! Dine-in ordering backend: order lifecycle, kitchen preparation
//! queue, and payment settlement.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod kitchen;
pub mod migrator;
pub mod services;

use std::sync::Arc;

use axum::{
    routing::{delete, get, patch, post, put},
    Json, Router,
};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub services: services::AppServices,
}

/// Success envelope: status code, message, optional payload. Failures
/// mirror it through [`errors::ServiceError`]'s response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub status: u16,
    pub message: String,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            status: 200,
            message: message.into(),
            data: Some(data),
        }
    }
}

/// Standard result type for JSON handlers.
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, errors::ServiceError>;

pub fn api_v1_routes() -> Router<AppState> {
    let orders = Router::new()
        .route(
            "/orders",
            post(handlers::orders::create_order).get(handlers::orders::list_orders),
        )
        .route("/orders/:id", get(handlers::orders::get_order))
        .route("/orders/:id/items", post(handlers::orders::add_item))
        .route(
            "/orders/:id/items/:item_id",
            delete(handlers::orders::remove_item),
        )
        .route("/orders/:id/confirm", post(handlers::orders::confirm_order))
        .route("/orders/:id/pay", post(handlers::orders::pay_order))
        .route("/orders/:id/cancel", post(handlers::orders::cancel_order))
        .route("/orders/:id/total", get(handlers::orders::get_order_total))
        .route(
            "/order-items/:id/serve",
            post(handlers::orders::serve_item),
        );

    let kitchen = Router::new()
        .route("/kitchen/queue", get(handlers::kitchen::get_queue))
        .route(
            "/kitchen/items/:id/ready",
            post(handlers::kitchen::mark_ready),
        );

    let management = Router::new()
        .route(
            "/tables",
            post(handlers::tables::create_table).get(handlers::tables::list_tables),
        )
        .route("/tables/:id", get(handlers::tables::get_table))
        .route("/tables/:id/activate", post(handlers::tables::activate))
        .route("/tables/:id/deactivate", post(handlers::tables::deactivate))
        .route(
            "/categories",
            post(handlers::categories::create_category).get(handlers::categories::list_categories),
        )
        .route("/categories/:id", put(handlers::categories::rename_category))
        .route(
            "/categories/:id/activate",
            post(handlers::categories::activate),
        )
        .route(
            "/categories/:id/deactivate",
            post(handlers::categories::deactivate),
        )
        .route(
            "/menu-items",
            post(handlers::menu_items::create_menu_item).get(handlers::menu_items::list_menu_items),
        )
        .route(
            "/menu-items/:id",
            patch(handlers::menu_items::update_menu_item),
        )
        .route(
            "/menu-items/:id/activate",
            post(handlers::menu_items::activate),
        )
        .route(
            "/menu-items/:id/deactivate",
            post(handlers::menu_items::deactivate),
        )
        .route(
            "/discounts",
            post(handlers::discounts::create_discount),
        )
        .route("/discounts/active", get(handlers::discounts::list_active))
        .route("/discounts/:id/end", post(handlers::discounts::end_discount))
        .route(
            "/waiters",
            post(handlers::waiters::create_waiter).get(handlers::waiters::list_waiters),
        );

    orders.merge(kitchen).merge(management)
}

/// Assembles the full application router.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .nest("/api/v1", api_v1_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

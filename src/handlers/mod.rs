use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::AppState;

pub mod categories;
pub mod discounts;
pub mod kitchen;
pub mod menu_items;
pub mod orders;
pub mod tables;
pub mod waiters;

/// Liveness probe with a record-store ping.
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    let database = match state.db.ping().await {
        Ok(()) => "up",
        Err(_) => "down",
    };
    Json(json!({
        "status": "ok",
        "database": database,
        "environment": state.config.environment,
    }))
}

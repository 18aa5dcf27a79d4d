//! Liveness probe. Mounted outside both gates, so it answers for anonymous
//! and signed-in callers alike.

use axum::Json;
use serde_json::{json, Value};

/// `GET /health`: `{"status":"healthy","service":..,"version":..}`
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

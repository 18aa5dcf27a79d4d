//! # Page Handlers
//!
//! A public landing page and one protected page.

use crate::error::{AppError, AppResult};
use crate::principal::AuthState;
use axum::{Extension, Json};
use serde_json::{json, Value};

/// Public landing page
///
/// ## Route
/// GET /
pub async fn home(Extension(state): Extension<AuthState>) -> Json<Value> {
    let greeting = match state.principal() {
        Some(principal) => format!("Welcome back, {}", principal.username),
        None => "Welcome, please log in".to_string(),
    };

    Json(json!({ "message": greeting }))
}

/// Protected dashboard
///
/// ## Route
/// GET /dashboard
///
/// ## Authentication
/// Sits behind the access gate, so only tenant members get here. The
/// principal is still checked because the handler can be mounted without
/// the gate.
///
/// ## Response
/// ```json
/// {
///   "username": "alice",
///   "tenants": ["oak", "pine"]
/// }
/// ```
pub async fn dashboard(Extension(state): Extension<AuthState>) -> AppResult<Json<Value>> {
    let principal = state
        .principal()
        .ok_or_else(|| AppError::Unauthorized("Not authenticated".to_string()))?;

    Ok(Json(json!({
        "username": principal.username,
        "tenants": principal.tenants
    })))
}

use crate::error::{AppError, AppResult};
use crate::middleware::identity::{sign_in, sign_out, take_return_to};
use crate::principal::{AuthState, Principal};
use axum::{response::Redirect, Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_sessions::Session;

/// Body of `POST /login`
///
/// The identity is taken as given. Verifying credentials is the job of a
/// real identity provider sitting in front of this endpoint.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    #[serde(default)]
    pub tenants: Vec<String>,
}

pub async fn login_form() -> Json<Value> {
    Json(json!({
        "message": "POST a JSON body to /login to sign in",
        "example": { "username": "alice", "tenants": ["oak"] }
    }))
}

/// Sign in and go back to the page that sent the user here
pub async fn login(session: Session, Json(req): Json<LoginRequest>) -> AppResult<Redirect> {
    let username = req.username.trim();
    if username.is_empty() {
        return Err(AppError::BadRequest("username must not be empty".to_string()));
    }

    let return_to = take_return_to(&session).await?;
    sign_in(&session, &Principal::new(username, req.tenants)).await?;

    Ok(Redirect::to(return_to.as_deref().unwrap_or("/")))
}

pub async fn logout(session: Session) -> AppResult<Json<Value>> {
    sign_out(&session).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Logged out successfully"
    })))
}

pub async fn session_info(Extension(state): Extension<AuthState>) -> Json<Value> {
    match state.principal() {
        Some(principal) => Json(json!({
            "authenticated": true,
            "principal": principal
        })),
        None => Json(json!({
            "authenticated": false
        })),
    }
}

//! # Error Handling
//!
//! Error type for the identity layer and the demo handlers, and its mapping
//! to HTTP responses.
//!
//! Gate outcomes (login redirects, tenant denials) are not errors; they are
//! ordinary responses built by the middleware. This type only covers real
//! failures such as an unreachable session store, plus the 403 the access
//! gate sends when configured to forbid instead of redirect.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-wide error type
///
/// `#[from]` lets `?` convert session store errors directly.
#[derive(Error, Debug)]
pub enum AppError {
    /// Session store failures (load, save, id cycling)
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Client sent invalid data (400)
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// No authenticated session (401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated, but not allowed here (403)
    #[error("Forbidden: {0}")]
    Forbidden(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Session(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
        }
    }
}

/// Convert AppError into an HTTP response
///
/// Internal details are logged and replaced by a generic message; client
/// errors carry their own message.
///
/// Body format: `{ "error": "error message here" }`
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_message = match &self {
            AppError::Session(e) => {
                tracing::error!("Session error: {:?}", e);
                "Session error".to_string()
            }
            AppError::BadRequest(_) | AppError::Unauthorized(_) | AppError::Forbidden(_) => {
                self.to_string()
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// `Result<T, AppError>` shorthand
pub type AppResult<T> = Result<T, AppError>;

//! # Middleware Module
//!
//! Request interceptors that decide whether a route may run.
//!
//! ## Our Middleware
//! - `identity`: loads the signed-in principal from the session and
//!   publishes the request's [`AuthState`](crate::principal::AuthState)
//! - `ensure_logged_in`: protected routes; redirects anonymous users to the
//!   login page and checks tenant membership
//! - `ensure_logged_out`: login-style routes; sends signed-in users away
//!
//! `identity` must run before either gate (add it as an outer layer), and
//! the session layer must run before `identity`.

pub mod ensure_logged_in;
pub mod ensure_logged_out;
pub mod identity;

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

/// Terminal redirect with an explicit status code
///
/// `axum::response::Redirect` has no 302 constructor, and the gates need
/// both 302 and 303.
pub(crate) fn redirect(status: StatusCode, location: &str) -> Response {
    (status, [(header::LOCATION, location.to_owned())]).into_response()
}

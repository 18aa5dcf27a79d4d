//! # ensure-login
//!
//! Route gates for session-based login on axum.
//!
//! - [`ensure_logged_in`]: protected routes. Anonymous requests are sent to
//!   the login page (303) with the requested path remembered in the session
//!   as `returnTo`; authenticated requests can also be required to belong to
//!   the tenant the request is for.
//! - [`ensure_not_logged_in`]: login-style routes. Signed-in users are sent
//!   elsewhere (302).
//!
//! Both gates read the request's [`AuthState`], published by
//! [`middleware::identity::load_identity`] from a `tower-sessions` session.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use axum::{middleware::from_fn, routing::get, Router};
//! use ensure_login::{ensure_logged_in, ensure_not_logged_in, middleware::identity::load_identity};
//! use tower_sessions::{MemoryStore, SessionManagerLayer};
//!
//! let app = Router::new()
//!     .route("/profile", get(profile).route_layer(ensure_logged_in("/signin")))
//!     .route("/signin", get(signin).route_layer(ensure_not_logged_in("/profile")))
//!     .layer(from_fn(load_identity))
//!     .layer(SessionManagerLayer::new(MemoryStore::default()));
//! ```

pub mod app;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod principal;
pub mod tenant;

pub use error::{AppError, AppResult};
pub use middleware::ensure_logged_in::{
    Denial, EnsureLoggedIn, EnsureLoggedInConfig, EnsureLoggedInLayer,
};
pub use middleware::ensure_logged_out::{
    EnsureLoggedOut, EnsureLoggedOutConfig, EnsureLoggedOutLayer,
};
pub use principal::{AuthState, Principal};
pub use tenant::{FixedTenant, HostSubdomain, TenantResolver};

/// Gate a route on an authenticated session
///
/// Accepts an [`EnsureLoggedInConfig`] or a bare login path.
pub fn ensure_logged_in(config: impl Into<EnsureLoggedInConfig>) -> EnsureLoggedInLayer {
    EnsureLoggedInLayer::new(config)
}

/// Keep signed-in users off a route
///
/// Accepts an [`EnsureLoggedOutConfig`] or a bare redirect path.
pub fn ensure_not_logged_in(config: impl Into<EnsureLoggedOutConfig>) -> EnsureLoggedOutLayer {
    EnsureLoggedOutLayer::new(config)
}

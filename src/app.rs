//! Router of the demo server.

use crate::config::Config;
use crate::handlers::{auth, health::health_check, pages};
use crate::middleware::identity::load_identity;
use crate::{ensure_logged_in, ensure_not_logged_in};
use axum::{
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use time::Duration;
use tower_sessions::{Expiry, SessionManagerLayer, SessionStore};

/// Idle time after which a session expires
pub const SESSION_IDLE_HOURS: i64 = 24;

/// Build the application router on top of `store`
///
/// Layer order, outermost first: sessions, identity, then the per-route
/// gates.
pub fn build_router<Store>(config: &Config, store: Store) -> Router
where
    Store: SessionStore + Clone,
{
    let session_layer = SessionManagerLayer::new(store)
        .with_secure(config.cookie_secure)
        .with_expiry(Expiry::OnInactivity(Duration::hours(SESSION_IDLE_HOURS)));

    // Tenant members only
    let protected_routes = Router::new()
        .route("/dashboard", get(pages::dashboard))
        .route_layer(ensure_logged_in(config.access_gate()));

    // Anonymous users only
    let guest_routes = Router::new()
        .route("/login", get(auth::login_form).post(auth::login))
        .route_layer(ensure_not_logged_in(config.logout_gate()));

    Router::new()
        .route("/health", get(health_check))
        .route("/", get(pages::home))
        .route("/logout", post(auth::logout))
        .route("/api/session", get(auth::session_info))
        .merge(protected_routes)
        .merge(guest_routes)
        .layer(from_fn(load_identity))
        .layer(session_layer)
}

//! # ensure-login demo server
//!
//! Runs the login and tenant gates in front of a few routes, with sessions
//! kept in SQLite.

use anyhow::Context;
use ensure_login::{app::build_router, config::Config};
use sqlx::sqlite::SqlitePool;
// CORS (Cross-Origin Resource Sharing) - allows a frontend on another origin
use tower_http::cors::{Any, CorsLayer};
// HTTP request/response tracing
use tower_http::trace::TraceLayer;
use tower_sessions_sqlx_store::SqliteStore;
// Structured logging setup
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main application entry point
///
/// 1. Sets up logging
/// 2. Loads configuration from environment variables
/// 3. Opens the SQLite session store
/// 4. Builds the router with both gates
/// 5. Starts the HTTP server
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Default: info level for most crates, debug level for our app
    // Can be overridden with RUST_LOG environment variable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,ensure_login=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    tracing::info!("Configuration loaded: {:?}", config);

    // Sessions: a cookie holds the id, the data stays server-side in SQLite
    let pool = SqlitePool::connect(&config.database_url)
        .await
        .with_context(|| format!("failed to open session database {}", config.database_url))?;
    let session_store = SqliteStore::new(pool);
    // Creates the session table if needed
    session_store.migrate().await?;

    // Restrict origins in production
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = build_router(&config, session_store)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let bind_addr = config.bind_address();
    tracing::info!("Starting server on {}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

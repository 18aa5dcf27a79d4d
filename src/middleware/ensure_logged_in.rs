//! Gate for protected routes.
//!
//! An anonymous request is redirected (303) to the login page, after the
//! requested path is remembered in the session under `returnTo`. An
//! authenticated request can additionally be checked for tenant
//! membership: the configured [`TenantResolver`] names the tenant the
//! request is for, and the principal must hold that tenant label.
//!
//! ## Example
//! ```rust,ignore
//! use ensure_login::{ensure_logged_in, EnsureLoggedInConfig, tenant::HostSubdomain};
//!
//! let protected = Router::new()
//!     .route("/dashboard", get(dashboard))
//!     .route_layer(ensure_logged_in(
//!         EnsureLoggedInConfig::new()
//!             .redirect_to("/signin")
//!             .tenant(HostSubdomain::new()),
//!     ));
//! ```

use crate::error::AppError;
use crate::middleware::{identity::RETURN_TO_KEY, redirect};
use crate::principal::AuthState;
use crate::tenant::TenantResolver;
use axum::{
    body::Body,
    extract::{OriginalUri, Request},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
};
use std::{
    fmt,
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};
use tower::{Layer, Service};
use tower_sessions::Session;

/// Default login page
pub const DEFAULT_LOGIN_PATH: &str = "/login";

/// Body message of a forbidden tenant response
pub const ACCESS_DENIED: &str = "Access denied";

/// What to answer when the principal is not a member of the tenant
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Denial {
    /// 302 Found to the given path
    Redirect(String),
    /// 403 with [`ACCESS_DENIED`]
    Forbidden,
}

impl Default for Denial {
    fn default() -> Self {
        Denial::Redirect("/".to_string())
    }
}

impl Denial {
    fn respond(self) -> Response {
        match self {
            Denial::Redirect(to) => redirect(StatusCode::FOUND, &to),
            Denial::Forbidden => AppError::Forbidden(ACCESS_DENIED.to_string()).into_response(),
        }
    }
}

/// Access gate configuration
///
/// A bare path converts into a configuration with that `redirect_to`:
/// `EnsureLoggedInConfig::from("/signin")`.
#[derive(Clone)]
pub struct EnsureLoggedInConfig {
    /// Where anonymous requests are sent
    pub redirect_to: String,

    /// Remember the requested path in the session before redirecting
    pub set_return_to: bool,

    /// Tenant strategy; `None` skips the membership check
    pub tenant: Option<Arc<dyn TenantResolver>>,

    /// Answer for authenticated non-members
    pub denial: Denial,
}

impl Default for EnsureLoggedInConfig {
    fn default() -> Self {
        Self {
            redirect_to: DEFAULT_LOGIN_PATH.to_string(),
            set_return_to: true,
            tenant: None,
            denial: Denial::default(),
        }
    }
}

impl fmt::Debug for EnsureLoggedInConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnsureLoggedInConfig")
            .field("redirect_to", &self.redirect_to)
            .field("set_return_to", &self.set_return_to)
            .field("tenant", &self.tenant.as_ref().map(|_| "TenantResolver"))
            .field("denial", &self.denial)
            .finish()
    }
}

impl EnsureLoggedInConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn redirect_to(mut self, path: impl Into<String>) -> Self {
        self.redirect_to = path.into();
        self
    }

    pub fn set_return_to(mut self, enabled: bool) -> Self {
        self.set_return_to = enabled;
        self
    }

    /// Require membership of the tenant named by `resolver`
    pub fn tenant(mut self, resolver: impl TenantResolver + 'static) -> Self {
        self.tenant = Some(Arc::new(resolver));
        self
    }

    pub fn denial(mut self, denial: Denial) -> Self {
        self.denial = denial;
        self
    }
}

impl From<&str> for EnsureLoggedInConfig {
    fn from(path: &str) -> Self {
        Self::new().redirect_to(path)
    }
}

impl From<String> for EnsureLoggedInConfig {
    fn from(path: String) -> Self {
        Self::new().redirect_to(path)
    }
}

/// Result of checking one request
#[derive(Debug, PartialEq, Eq)]
enum Access {
    Granted,
    LoginRequired,
    Denied,
}

/// Decide the request's fate. Reads only; logs denials.
fn check_access(config: &EnsureLoggedInConfig, parts: &Parts) -> Access {
    let Some(principal) = parts
        .extensions
        .get::<AuthState>()
        .and_then(AuthState::principal)
    else {
        return Access::LoginRequired;
    };

    let Some(resolver) = &config.tenant else {
        return Access::Granted;
    };

    match resolver.resolve(parts) {
        Some(tenant) if principal.is_member_of(&tenant) => Access::Granted,
        Some(tenant) => {
            tracing::warn!(
                username = %principal.username,
                tenant = %tenant.to_lowercase(),
                "Access denied for {} to tenant {}",
                principal.username,
                tenant.to_lowercase()
            );
            Access::Denied
        }
        None => {
            tracing::warn!(
                username = %principal.username,
                "Access denied for {}: no tenant could be derived from the request",
                principal.username
            );
            Access::Denied
        }
    }
}

/// Store the original path and query in the session, if there is one
async fn remember_return_to(parts: &Parts) {
    let Some(session) = parts.extensions.get::<Session>() else {
        return;
    };

    let uri = parts
        .extensions
        .get::<OriginalUri>()
        .map_or(&parts.uri, |original| &original.0);
    let return_to = uri
        .path_and_query()
        .map_or_else(|| uri.path(), |pq| pq.as_str())
        .to_string();

    match session.insert(RETURN_TO_KEY, &return_to).await {
        Ok(()) => tracing::debug!(return_to = %return_to, "Stored return path in session"),
        Err(e) => tracing::error!("Failed to store return path: {:?}", e),
    }
}

/// Tower layer for the access gate
#[derive(Debug, Clone)]
pub struct EnsureLoggedInLayer {
    config: Arc<EnsureLoggedInConfig>,
}

impl EnsureLoggedInLayer {
    pub fn new(config: impl Into<EnsureLoggedInConfig>) -> Self {
        Self {
            config: Arc::new(config.into()),
        }
    }

    pub fn config(&self) -> &EnsureLoggedInConfig {
        &self.config
    }
}

impl Default for EnsureLoggedInLayer {
    fn default() -> Self {
        Self::new(EnsureLoggedInConfig::default())
    }
}

impl<S> Layer<S> for EnsureLoggedInLayer {
    type Service = EnsureLoggedIn<S>;

    fn layer(&self, inner: S) -> Self::Service {
        EnsureLoggedIn {
            inner,
            config: Arc::clone(&self.config),
        }
    }
}

/// Access gate service
#[derive(Debug, Clone)]
pub struct EnsureLoggedIn<S> {
    inner: S,
    config: Arc<EnsureLoggedInConfig>,
}

impl<S> Service<Request<Body>> for EnsureLoggedIn<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        // the readied service goes into the future, a fresh clone stays behind
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let config = Arc::clone(&self.config);

        Box::pin(async move {
            let (parts, body) = request.into_parts();

            match check_access(&config, &parts) {
                Access::Granted => inner.call(Request::from_parts(parts, body)).await,
                Access::LoginRequired => {
                    if config.set_return_to {
                        remember_return_to(&parts).await;
                    }
                    tracing::debug!(to = %config.redirect_to, "Not logged in, redirecting");
                    Ok(redirect(StatusCode::SEE_OTHER, &config.redirect_to))
                }
                Access::Denied => Ok(config.denial.clone().respond()),
            }
        })
    }
}

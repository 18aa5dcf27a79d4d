//! Gate for routes that only make sense while logged out (login, sign-up).
//!
//! An authenticated request is redirected (302) to `redirect_to`, `/` by
//! default. Everything else reaches the route.

use crate::middleware::redirect;
use crate::principal::AuthState;
use axum::{
    body::Body,
    extract::Request,
    http::StatusCode,
    response::Response,
};
use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};
use tower::{Layer, Service};

/// Default destination for signed-in users
pub const DEFAULT_HOME_PATH: &str = "/";

/// Logged-out gate configuration
///
/// A bare path is shorthand for `redirect_to`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnsureLoggedOutConfig {
    pub redirect_to: String,
}

impl Default for EnsureLoggedOutConfig {
    fn default() -> Self {
        Self {
            redirect_to: DEFAULT_HOME_PATH.to_string(),
        }
    }
}

impl EnsureLoggedOutConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn redirect_to(mut self, path: impl Into<String>) -> Self {
        self.redirect_to = path.into();
        self
    }
}

impl From<&str> for EnsureLoggedOutConfig {
    fn from(path: &str) -> Self {
        Self::new().redirect_to(path)
    }
}

impl From<String> for EnsureLoggedOutConfig {
    fn from(path: String) -> Self {
        Self::new().redirect_to(path)
    }
}

/// Tower layer for the logged-out gate
#[derive(Debug, Clone)]
pub struct EnsureLoggedOutLayer {
    config: Arc<EnsureLoggedOutConfig>,
}

impl EnsureLoggedOutLayer {
    pub fn new(config: impl Into<EnsureLoggedOutConfig>) -> Self {
        Self {
            config: Arc::new(config.into()),
        }
    }

    pub fn config(&self) -> &EnsureLoggedOutConfig {
        &self.config
    }
}

impl Default for EnsureLoggedOutLayer {
    fn default() -> Self {
        Self::new(EnsureLoggedOutConfig::default())
    }
}

impl<S> Layer<S> for EnsureLoggedOutLayer {
    type Service = EnsureLoggedOut<S>;

    fn layer(&self, inner: S) -> Self::Service {
        EnsureLoggedOut {
            inner,
            config: Arc::clone(&self.config),
        }
    }
}

/// Logged-out gate service
#[derive(Debug, Clone)]
pub struct EnsureLoggedOut<S> {
    inner: S,
    config: Arc<EnsureLoggedOutConfig>,
}

impl<S> Service<Request<Body>> for EnsureLoggedOut<S>
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
        let authenticated = request
            .extensions()
            .get::<AuthState>()
            .is_some_and(AuthState::is_authenticated);

        if authenticated {
            tracing::debug!(to = %self.config.redirect_to, "Already logged in, redirecting");
            let response = redirect(StatusCode::FOUND, &self.config.redirect_to);
            return Box::pin(async move { Ok(response) });
        }

        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        Box::pin(async move { inner.call(request).await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::principal::Principal;
    use axum::http::{header::LOCATION, Request};
    use std::convert::Infallible;
    use tower::{service_fn, ServiceExt};

    fn inner() -> impl Service<
        Request<Body>,
        Response = Response,
        Error = Infallible,
        Future = std::future::Ready<Result<Response, Infallible>>,
    > + Clone
           + Send
           + 'static {
        service_fn(|_req: Request<Body>| {
            std::future::ready(Ok::<_, Infallible>(Response::new(Body::from("login page"))))
        })
    }

    fn request(state: Option<AuthState>) -> Request<Body> {
        let mut request = Request::builder()
            .uri("/login")
            .body(Body::empty())
            .unwrap();
        if let Some(state) = state {
            request.extensions_mut().insert(state);
        }
        request
    }

    #[test]
    fn test_config_shorthand() {
        assert_eq!(EnsureLoggedOutConfig::default().redirect_to, "/");
        assert_eq!(EnsureLoggedOutConfig::from("/home").redirect_to, "/home");
        assert_eq!(
            EnsureLoggedOutLayer::new(String::from("/account")).config().redirect_to,
            "/account"
        );
    }

    #[tokio::test]
    async fn test_authenticated_is_redirected() {
        let service = EnsureLoggedOutLayer::default().layer(inner());
        let state = AuthState::Authenticated(Principal::new("alice", ["oak"]));

        let response = service.oneshot(request(Some(state))).await.unwrap();

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[LOCATION], "/");
    }

    #[tokio::test]
    async fn test_custom_redirect_target() {
        let service = EnsureLoggedOutLayer::new("/home").layer(inner());
        let state = AuthState::Authenticated(Principal::new("alice", Vec::<String>::new()));

        let response = service.oneshot(request(Some(state))).await.unwrap();

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[LOCATION], "/home");
    }

    #[tokio::test]
    async fn test_anonymous_reaches_route() {
        let service = EnsureLoggedOutLayer::default().layer(inner());

        let response = service
            .oneshot(request(Some(AuthState::Anonymous)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"login page");
    }

    #[tokio::test]
    async fn test_missing_auth_state_reaches_route() {
        let service = EnsureLoggedOutLayer::default().layer(inner());

        let response = service.oneshot(request(None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}

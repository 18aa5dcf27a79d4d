//! End-to-end checks of both gates through the demo router, with sessions
//! carried between requests by cookie.

use axum::{
    body::Body,
    http::{
        header::{CONTENT_TYPE, COOKIE, HOST, LOCATION, SET_COOKIE},
        Method, Request, StatusCode,
    },
    response::Response,
    Router,
};
use axum::{
    middleware::from_fn,
    routing::{get, post},
};
use ensure_login::{
    app::build_router,
    config::{Config, TenantSource},
    ensure_logged_in,
    handlers::{auth, pages},
    middleware::identity::{load_identity, USER_KEY},
    Denial,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use tower_sessions::{MemoryStore, Session, SessionManagerLayer};

/// Test client that keeps the latest session cookie
struct Client {
    app: Router,
    cookie: Option<String>,
}

impl Client {
    fn new(config: Config) -> Self {
        Self::with_router(build_router(&config, MemoryStore::default()))
    }

    fn with_router(app: Router) -> Self {
        Self { app, cookie: None }
    }

    async fn send(&mut self, mut request: Request<Body>) -> Response {
        if let Some(cookie) = &self.cookie {
            request
                .headers_mut()
                .insert(COOKIE, cookie.parse().unwrap());
        }

        let response = self.app.clone().oneshot(request).await.unwrap();

        if let Some(set_cookie) = response.headers().get(SET_COOKIE) {
            let pair = set_cookie.to_str().unwrap().split(';').next().unwrap();
            self.cookie = Some(pair.to_string());
        }
        response
    }

    async fn get(&mut self, host: &str, uri: &str) -> Response {
        let request = Request::builder()
            .uri(uri)
            .header(HOST, host)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    async fn login(&mut self, host: &str, username: &str, tenants: &[&str]) -> Response {
        let body = json!({ "username": username, "tenants": tenants });
        let request = Request::builder()
            .method(Method::POST)
            .uri("/login")
            .header(HOST, host)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    async fn post(&mut self, host: &str, uri: &str) -> Response {
        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(HOST, host)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    async fn logout(&mut self, host: &str) -> Response {
        self.post(host, "/logout").await
    }
}

fn location(response: &Response) -> &str {
    response.headers()[LOCATION].to_str().unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health() {
    let mut client = Client::new(Config::default());
    let response = client.get("localhost", "/health").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "ensure-login");

    // no gate on the probe, even for a signed-in session
    client.login("oak.example.com", "alice", &["oak"]).await;
    let response = client.get("oak.example.com", "/health").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_anonymous_is_sent_to_login_and_back() {
    let mut client = Client::new(Config::default());
    let host = "Oak.ABCSalesTracking.com";

    let response = client.get(host, "/dashboard?tab=sales").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
    assert!(client.cookie.is_some());

    // login returns to the recorded path
    let response = client.login(host, "alice", &["Oak", "Pine"]).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/dashboard?tab=sales");

    let response = client.get(host, "/dashboard?tab=sales").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["username"], "alice");
    assert_eq!(body["tenants"], json!(["Oak", "Pine"]));
}

#[tokio::test]
async fn test_return_to_is_consumed_once() {
    let mut client = Client::new(Config::default());
    let host = "oak.example.com";

    client.get(host, "/dashboard").await;
    let response = client.login(host, "alice", &["oak"]).await;
    assert_eq!(location(&response), "/dashboard");

    client.logout(host).await;
    let response = client.login(host, "alice", &["oak"]).await;
    assert_eq!(location(&response), "/");
}

#[tokio::test]
async fn test_return_to_disabled() {
    let config = Config {
        set_return_to: false,
        ..Config::default()
    };
    let mut client = Client::new(config);
    let host = "oak.example.com";

    let response = client.get(host, "/dashboard").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let response = client.login(host, "alice", &["oak"]).await;
    assert_eq!(location(&response), "/");
}

#[tokio::test]
async fn test_non_member_host_is_redirected_home() {
    let mut client = Client::new(Config::default());

    client.login("unknown.example.com", "alice", &["oak"]).await;

    let response = client.get("unknown.example.com", "/dashboard").await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "/");

    // same session, the tenant it belongs to
    let response = client.get("oak.example.com", "/dashboard").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_fixed_tenant_forbidden_variant() {
    let config = Config {
        tenant_source: TenantSource::Fixed("oak".to_string()),
        denial: Denial::Forbidden,
        ..Config::default()
    };

    let mut member = Client::new(config.clone());
    member.login("localhost", "alice", &["OAK"]).await;
    let response = member.get("localhost", "/dashboard").await;
    assert_eq!(response.status(), StatusCode::OK);

    let mut outsider = Client::new(config);
    outsider.login("localhost", "bob", &[]).await;
    let response = outsider.get("localhost", "/dashboard").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(json_body(response).await["error"], "Forbidden: Access denied");
}

#[tokio::test]
async fn test_login_page_rejects_signed_in_users() {
    let mut client = Client::new(Config::default());
    let host = "oak.example.com";

    let response = client.get(host, "/login").await;
    assert_eq!(response.status(), StatusCode::OK);

    client.login(host, "alice", &["oak"]).await;

    let response = client.get(host, "/login").await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "/");

    let response = client.login(host, "alice", &["oak"]).await;
    assert_eq!(response.status(), StatusCode::FOUND);
}

#[tokio::test]
async fn test_logout_closes_protected_routes() {
    let config = Config {
        logged_in_redirect: "/dashboard".to_string(),
        ..Config::default()
    };
    let mut client = Client::new(config);
    let host = "oak.example.com";

    client.login(host, "alice", &["oak"]).await;
    let response = client.get(host, "/login").await;
    assert_eq!(location(&response), "/dashboard");

    let response = client.logout(host).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = client.get(host, "/dashboard").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");

    let response = client.get(host, "/api/session").await;
    assert_eq!(json_body(response).await["authenticated"], false);
}

#[tokio::test]
async fn test_empty_username_is_rejected() {
    let mut client = Client::new(Config::default());
    let response = client.login("oak.example.com", "  ", &["oak"]).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_session_info_reports_principal() {
    let mut client = Client::new(Config::default());
    let host = "oak.example.com";

    client.login(host, "alice", &["oak"]).await;

    let body = json_body(client.get(host, "/api/session").await).await;
    assert_eq!(body["authenticated"], true);
    assert_eq!(body["principal"]["username"], "alice");

    let body = json_body(client.get(host, "/").await).await;
    assert_eq!(body["message"], "Welcome back, alice");
}

/// Writes a principal in a shape `Principal` cannot read (no username)
async fn store_stale_user(session: Session) {
    session
        .insert(USER_KEY, json!({ "tenants": ["oak"] }))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_unreadable_principal_is_treated_as_anonymous() {
    let app = Router::new()
        .route("/stale", post(store_stale_user))
        .route("/logout", post(auth::logout))
        .route(
            "/dashboard",
            get(pages::dashboard).route_layer(ensure_logged_in("/login")),
        )
        .layer(from_fn(load_identity))
        .layer(SessionManagerLayer::new(MemoryStore::default()));
    let mut client = Client::with_router(app);
    let host = "oak.example.com";

    client.post(host, "/stale").await;
    let response = client.get(host, "/dashboard").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");

    client.post(host, "/stale").await;
    let response = client.logout(host).await;
    assert_eq!(response.status(), StatusCode::OK);
}

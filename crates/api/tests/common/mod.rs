#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::PgPool;
use tower::ServiceExt;

use sitesmith_api::auth::jwt::JwtConfig;
use sitesmith_api::config::ServerConfig;
use sitesmith_api::editor::EditorSessions;
use sitesmith_api::router::build_app_router;
use sitesmith_api::state::AppState;
use sitesmith_core::generation::{
    GenerationError, GenerationOrchestrator, GenerationRequest, TextGenerator,
};

/// Reply used by [`build_test_app`]'s default generator.
pub const BAKERY_REPLY: &str = "<style>h1{color:brown}</style><h1>Bakery</h1>";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        initial_credits: 10,
        editor_idle_timeout_mins: 120,
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            access_token_expiry_mins: 15,
            refresh_token_expiry_days: 7,
        },
    }
}

// ---------------------------------------------------------------------------
// Fake text generators
// ---------------------------------------------------------------------------

/// Replies with a fixed text and records each request.
pub struct CannedGenerator {
    reply: String,
    pub requests: Mutex<Vec<GenerationRequest>>,
}

impl CannedGenerator {
    pub fn new(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.to_string(),
            requests: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl TextGenerator for CannedGenerator {
    async fn complete(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(self.reply.clone())
    }
}

/// Always fails like an exhausted provider quota.
pub struct FailingGenerator;

#[async_trait]
impl TextGenerator for FailingGenerator {
    async fn complete(&self, _request: &GenerationRequest) -> Result<String, GenerationError> {
        Err(GenerationError::Provider("quota exceeded".to_string()))
    }
}

/// Never replies, like a provider that stopped answering.
pub struct HangingGenerator;

#[async_trait]
impl TextGenerator for HangingGenerator {
    async fn complete(&self, _request: &GenerationRequest) -> Result<String, GenerationError> {
        std::future::pending().await
    }
}

// ---------------------------------------------------------------------------
// App builders
// ---------------------------------------------------------------------------

/// The full application router backed by `pool` and a canned generator.
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with(pool, CannedGenerator::new(BAKERY_REPLY))
}

/// The full application router with a caller-supplied generator.
pub fn build_test_app_with(pool: PgPool, generator: Arc<dyn TextGenerator>) -> Router {
    build_test_app_with_config(pool, generator, test_config())
}

/// The full application router with a caller-supplied generator and config.
pub fn build_test_app_with_config(
    pool: PgPool,
    generator: Arc<dyn TextGenerator>,
    config: ServerConfig,
) -> Router {
    let idle_timeout = chrono::Duration::minutes(config.editor_idle_timeout_mins);
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        generator: GenerationOrchestrator::new(generator),
        editor_sessions: Arc::new(EditorSessions::with_idle_timeout(idle_timeout)),
    };
    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

async fn send(
    app: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    app.oneshot(builder.body(body).unwrap()).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None, None).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::GET, uri, Some(token), None).await
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> Response<Body> {
    send(app, Method::POST, uri, None, Some(body)).await
}

pub async fn post_json_auth(app: Router, uri: &str, token: &str, body: Value) -> Response<Body> {
    send(app, Method::POST, uri, Some(token), Some(body)).await
}

pub async fn post_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::POST, uri, Some(token), None).await
}

pub async fn put_json_auth(app: Router, uri: &str, token: &str, body: Value) -> Response<Body> {
    send(app, Method::PUT, uri, Some(token), Some(body)).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::DELETE, uri, Some(token), None).await
}

/// Send a raw (possibly malformed) JSON body.
pub async fn post_raw_auth(app: Router, uri: &str, token: &str, raw: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .header("content-type", "application/json")
        .body(Body::from(raw.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

// ---------------------------------------------------------------------------
// Account helpers
// ---------------------------------------------------------------------------

/// Sign up through the API. Returns `(access_token, user_id)`.
pub async fn sign_up(app: Router, email: &str) -> (String, i64) {
    let response = post_json(
        app,
        "/api/v1/auth/sign-up",
        serde_json::json!({ "email": email, "password": "correct-horse-battery" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    (
        json["access_token"].as_str().unwrap().to_string(),
        json["user"]["id"].as_i64().unwrap(),
    )
}

/// Sign up and receive the initial credit grant.
pub async fn funded_user(app: Router, email: &str) -> (String, i64) {
    let (token, user_id) = sign_up(app.clone(), email).await;
    let response = post_json_auth(
        app,
        "/api/v1/init-user",
        &token,
        serde_json::json!({ "user_id": user_id, "email": email }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    (token, user_id)
}

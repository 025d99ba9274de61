//! Shared fixtures for gateway integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, Response},
    Router,
};
use devrpg_common::{AnalysisKind, AnalysisRequest, ServiceKind, SubReport};
use devrpg_gateway::backend::{AnalysisBackend, BackendError};
use devrpg_gateway::{build_router, AppState, GatewayConfig};
use http_body_util::BodyExt;
use serde_json::{json, Map, Value};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tower::util::ServiceExt;

/// Address nothing listens on; connections are refused immediately
pub const DEAD_URL: &str = "http://127.0.0.1:9";

/// Fresh in-memory database with the full schema
///
/// A single connection that never expires, since every new in-memory
/// connection would see an empty database.
pub async fn memory_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .min_connections(1)
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("Should open in-memory database");

    devrpg_gateway::db::init_schema(&pool)
        .await
        .expect("Should create schema");
    pool
}

/// Configuration whose backends all point at `DEAD_URL`
pub fn dead_config() -> GatewayConfig {
    let mut config = GatewayConfig::default();
    for url in config.services.values_mut() {
        *url = DEAD_URL.to_string();
    }
    config.workflow_url = DEAD_URL.to_string();
    config.ollama_url = DEAD_URL.to_string();
    config.analysis_timeout = Duration::from_secs(2);
    config
}

/// Serve `router` on an ephemeral local port and return its base URL
pub async fn spawn_server(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Should bind ephemeral port");
    let addr = listener.local_addr().expect("Should have local address");
    tokio::spawn(async move {
        axum::serve(listener, router).await.ok();
    });
    format!("http://{}", addr)
}

/// How the mock backend answers one kind
#[derive(Debug, Clone, Copy)]
pub enum MockBehavior {
    /// Answer with this score after the mock's delay
    Score(u8),
    /// Answer HTTP 500
    Fail,
    /// Never answer within any reasonable timeout
    Hang,
}

/// In-process stand-in for the analysis backends
pub struct MockBackend {
    behaviors: BTreeMap<AnalysisKind, MockBehavior>,
    default: MockBehavior,
    delay: Duration,
}

impl MockBackend {
    /// Every kind answers with `score`
    pub fn scoring(score: u8) -> Self {
        Self {
            behaviors: BTreeMap::new(),
            default: MockBehavior::Score(score),
            delay: Duration::ZERO,
        }
    }

    pub fn with(mut self, kind: AnalysisKind, behavior: MockBehavior) -> Self {
        self.behaviors.insert(kind, behavior);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl AnalysisBackend for MockBackend {
    async fn analyze(
        &self,
        kind: AnalysisKind,
        _request: &AnalysisRequest,
    ) -> Result<SubReport, BackendError> {
        let behavior = self.behaviors.get(&kind).copied().unwrap_or(self.default);
        match behavior {
            MockBehavior::Score(score) => {
                tokio::time::sleep(self.delay).await;
                let mut body = Map::new();
                body.insert(kind.score_field().to_string(), json!(score));
                body.insert("model_used".to_string(), json!("mock"));
                Ok(SubReport::from_value(kind, &Value::Object(body)))
            }
            MockBehavior::Fail => Err(BackendError::Status {
                service: kind.service(),
                status: 500,
            }),
            MockBehavior::Hang => {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Err(BackendError::Timeout(kind.service()))
            }
        }
    }
}

/// App whose fan-out is served by `backend`
pub fn app_with_backend(db: Option<SqlitePool>, backend: MockBackend) -> Router {
    build_router(AppState::with_backend(db, dead_config(), Arc::new(backend)))
}

/// App talking to real HTTP backends as configured
pub fn app_with_config(db: Option<SqlitePool>, config: GatewayConfig) -> Router {
    build_router(AppState::new(db, config))
}

/// Configuration with `service` pointing at `url`
pub fn config_with_service(service: ServiceKind, url: &str) -> GatewayConfig {
    let mut config = dead_config();
    config.services.insert(service, url.to_string());
    config
}

pub fn request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn json_request(method: &str, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Send one request through a fresh copy of `app`
pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

/// Extract JSON body from response
pub async fn extract_json(body: Body) -> Value {
    let bytes = body
        .collect()
        .await
        .expect("Should read body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

/// Create a user through the API and return its id
pub async fn create_user(app: &Router, username: &str) -> String {
    let body = json!({
        "username": username,
        "email": format!("{}@example.com", username),
        "password": "secret123",
    });
    let response = send(app, json_request("POST", "/api/users", &body)).await;
    let user = extract_json(response.into_body()).await;
    user["id"].as_str().expect("Should return user id").to_string()
}

/// Create a project through the API and return its id
pub async fn create_project(app: &Router, owner_id: &str) -> String {
    let response = send(
        app,
        json_request(
            "POST",
            &format!("/api/projects?owner_id={}", owner_id),
            &json!({"name": "demo", "language": "python"}),
        ),
    )
    .await;
    let project = extract_json(response.into_body()).await;
    project["id"].as_str().expect("Should return project id").to_string()
}

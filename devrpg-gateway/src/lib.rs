//! devrpg-gateway library
//!
//! HTTP gateway that fans analysis requests out to the analysis backends,
//! scores the combined result and records it with its experience and badges.

use axum::extract::DefaultBodyLimit;
use axum::Router;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod backend;
pub mod config;
pub mod db;
pub mod error;
pub mod pagination;

pub use config::{Args, GatewayConfig};
pub use error::{ApiError, ApiResult};

use backend::{AnalysisBackend, HttpBackendClient, Orchestrator};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database pool, `None` when the database could not be opened at startup
    pub db: Option<SqlitePool>,
    pub config: Arc<GatewayConfig>,
    /// Direct access to the backends (health, pass-through)
    pub backends: HttpBackendClient,
    pub orchestrator: Orchestrator,
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    /// State backed by the configured HTTP backends
    pub fn new(db: Option<SqlitePool>, config: GatewayConfig) -> Self {
        let backends = HttpBackendClient::new(config.services.clone(), config.analysis_timeout);
        let fan_out: Arc<dyn AnalysisBackend> = Arc::new(backends.clone());
        Self::assemble(db, config, backends, fan_out)
    }

    /// State whose fan-out uses `backend` instead of HTTP
    pub fn with_backend(
        db: Option<SqlitePool>,
        config: GatewayConfig,
        backend: Arc<dyn AnalysisBackend>,
    ) -> Self {
        let backends = HttpBackendClient::new(config.services.clone(), config.analysis_timeout);
        Self::assemble(db, config, backends, backend)
    }

    fn assemble(
        db: Option<SqlitePool>,
        config: GatewayConfig,
        backends: HttpBackendClient,
        fan_out: Arc<dyn AnalysisBackend>,
    ) -> Self {
        let orchestrator = Orchestrator::new(fan_out, config.analysis_timeout);
        Self {
            db,
            config: Arc::new(config),
            backends,
            orchestrator,
            startup_time: Utc::now(),
        }
    }

    /// Database pool, or `DATABASE_UNAVAILABLE`
    pub fn pool(&self) -> ApiResult<&SqlitePool> {
        self.db.as_ref().ok_or(ApiError::DatabaseUnavailable)
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post};

    let api = Router::new()
        .route("/api/buildinfo", get(api::get_build_info))
        .route("/api/users", post(api::create_user).get(api::list_users))
        .route("/api/users/:id", get(api::get_user))
        .route("/api/projects", post(api::create_project).get(api::list_projects))
        .route("/api/projects/:id", get(api::get_project))
        .route("/api/analyze", post(api::analyze_code))
        .route("/api/analyze/lighthouse", post(api::analyze_lighthouse))
        .route("/api/reports", get(api::list_reports).post(api::report_callback))
        .route("/api/reports/:id", get(api::get_report))
        .route("/api/leaderboard", get(api::get_leaderboard))
        .route("/api/dashboard/:user_id", get(api::get_dashboard))
        .route("/api/webhook/:ci_system", post(api::ci_webhook))
        .route("/api/mcp/status", get(api::mcp_status))
        .route("/api/mcp/:service/analyze", post(api::mcp_passthrough));

    Router::new()
        .merge(api)
        .merge(api::health_routes())
        // Source files of any size are accepted
        .layer(DefaultBodyLimit::disable())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

//! Service descriptor and dependency health

use axum::{extract::State, routing::get, Json, Router};
use devrpg_common::time;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;

use crate::backend::ProbeStatus;
use crate::{db, AppState};

pub const SERVICE_NAME: &str = "dev_rpg_backend";

/// Overall gateway health
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OverallStatus {
    Healthy,
    Degraded,
    Critical,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: OverallStatus,
    pub service: String,
    /// `healthy` or `unavailable`
    pub database: String,
    pub ollama: ProbeStatus,
    pub mcps: BTreeMap<String, ProbeStatus>,
    pub uptime_seconds: u64,
    pub timestamp: String,
}

/// Critical when no backend answers at all; degraded when only the database
/// is down
pub fn overall_status(database_healthy: bool, mcps: &BTreeMap<String, ProbeStatus>) -> OverallStatus {
    if mcps.values().all(|s| *s == ProbeStatus::Unavailable) {
        OverallStatus::Critical
    } else if !database_healthy {
        OverallStatus::Degraded
    } else {
        OverallStatus::Healthy
    }
}

/// GET /
pub async fn root() -> Json<Value> {
    Json(json!({
        "service": "Dev-RPG Backend API",
        "version": env!("CARGO_PKG_VERSION"),
        "health": "/health",
    }))
}

/// GET /health
///
/// Database, LLM host and every backend are probed concurrently.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let database = async {
        match &state.db {
            Some(pool) => db::ping(pool).await,
            None => false,
        }
    };

    let (database_healthy, ollama, probes) = tokio::join!(
        database,
        state.backends.probe(&state.config.ollama_url),
        state.backends.probe_all(),
    );

    let uptime = chrono::Utc::now().signed_duration_since(state.startup_time);
    let mcps: BTreeMap<String, ProbeStatus> = probes
        .into_iter()
        .map(|(service, status)| (service.as_str().to_string(), status))
        .collect();

    Json(HealthResponse {
        status: overall_status(database_healthy, &mcps),
        service: SERVICE_NAME.to_string(),
        database: if database_healthy { "healthy" } else { "unavailable" }.to_string(),
        ollama,
        mcps,
        uptime_seconds: uptime.num_seconds().max(0) as u64,
        timestamp: time::now_rfc3339(),
    })
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
}

//! Direct access to individual analysis backends

use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    extract::{Path, State},
    Json,
};
use devrpg_common::ServiceKind;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::info;

use crate::backend::ProbeStatus;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct ServiceStatus {
    pub url: String,
    pub status: ProbeStatus,
}

/// Body of `POST /api/analyze/lighthouse`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LighthouseRequest {
    pub url: String,
    #[serde(default = "default_categories")]
    pub categories: Vec<String>,
    #[serde(default = "default_device")]
    pub device: String,
}

fn default_categories() -> Vec<String> {
    ["performance", "accessibility", "best-practices", "seo"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_device() -> String {
    "desktop".to_string()
}

/// GET /api/mcp/status
pub async fn mcp_status(State(state): State<AppState>) -> Json<BTreeMap<String, ServiceStatus>> {
    let backends = &state.backends;
    let probes = backends.urls().iter().map(|(service, url)| async move {
        let status = backends.probe(url).await;
        (
            service.as_str().to_string(),
            ServiceStatus {
                url: url.clone(),
                status,
            },
        )
    });

    Json(join_all(probes).await.into_iter().collect())
}

/// POST /api/mcp/:service/analyze
///
/// The body is forwarded unchanged and the backend's structured answer is
/// returned as-is.
pub async fn mcp_passthrough(
    State(state): State<AppState>,
    service: Result<Path<String>, PathRejection>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Path(service) = service?;
    let service: ServiceKind = service
        .parse()
        .map_err(|e: devrpg_common::Error| ApiError::NotFound(e.to_string()))?;
    let Json(body) = payload?;

    info!(service = %service, "Direct backend request");
    Ok(Json(state.backends.forward(service, &body).await?))
}

/// POST /api/analyze/lighthouse
pub async fn analyze_lighthouse(
    State(state): State<AppState>,
    payload: Result<Json<LighthouseRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(request) = payload?;
    if request.url.trim().is_empty() {
        return Err(ApiError::BadRequest("url must not be empty".to_string()));
    }

    info!(url = %request.url, device = %request.device, "Lighthouse audit requested");
    let body = serde_json::to_value(&request)
        .map_err(|e| ApiError::Internal(format!("Failed to encode request: {}", e)))?;
    Ok(Json(state.backends.forward(ServiceKind::Lighthouse, &body).await?))
}

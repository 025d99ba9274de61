//! HTTP handlers
//!
//! Every backend serves the same three routes; what `/analyze` accepts and
//! what `/health` probes depend on the engine behind the service.

use axum::{
    extract::{rejection::JsonRejection, State},
    response::{IntoResponse, Response},
    Json,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Value};
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::lighthouse::{check_url, LighthouseRequest};
use crate::service::CodeAnalysisRequest;
use crate::{Engine, McpState};

const LIGHTHOUSE_DESCRIPTION: &str = "Web performance analysis using Google Lighthouse";

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `healthy` or `degraded`
    pub status: &'static str,
    pub service: String,
    /// LLM provider reachable (code-analysis backends)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ollama_connected: Option<bool>,
    /// Lighthouse CLI installed (Lighthouse backend)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lighthouse_available: Option<bool>,
    pub timestamp: String,
}

/// GET /
pub async fn root(State(state): State<McpState>) -> Json<Value> {
    let description = match &state.engine {
        Engine::Llm(service) => service.profile().description,
        Engine::Lighthouse(_) => LIGHTHOUSE_DESCRIPTION,
    };

    Json(json!({
        "service": state.service.service_name(),
        "version": env!("CARGO_PKG_VERSION"),
        "description": description,
        "endpoints": {
            "analyze": "POST /analyze",
            "health": "GET /health",
        },
    }))
}

/// GET /health
pub async fn health_check(State(state): State<McpState>) -> Json<HealthResponse> {
    let (healthy, ollama_connected, lighthouse_available) = match &state.engine {
        Engine::Llm(service) => {
            let connected = service.llm().health_check().await;
            (connected, Some(connected), None)
        }
        Engine::Lighthouse(runner) => {
            let available = runner.is_available().await;
            (available, None, Some(available))
        }
    };

    Json(HealthResponse {
        status: if healthy { "healthy" } else { "degraded" },
        service: state.service.service_name(),
        ollama_connected,
        lighthouse_available,
        timestamp: devrpg_common::time::now_rfc3339(),
    })
}

fn parse_body<T: DeserializeOwned>(body: Value) -> ApiResult<T> {
    serde_json::from_value(body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid request body: {}", e)))
}

/// POST /analyze
pub async fn analyze(
    State(state): State<McpState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(body) = payload?;

    match &state.engine {
        Engine::Llm(service) => {
            let request: CodeAnalysisRequest = parse_body(body)?;
            if request.code.trim().is_empty() {
                return Err(ApiError::BadRequest("code must not be empty".to_string()));
            }

            let report = service.analyze(&request).await.map_err(|e| {
                ApiError::AnalysisFailed(format!("{} analysis failed: {}", service.kind(), e))
            })?;
            info!(
                kind = %service.kind(),
                score = report.score(),
                degraded = report.is_degraded(),
                "Analysis complete"
            );
            Ok(Json(report).into_response())
        }
        Engine::Lighthouse(runner) => {
            let request: LighthouseRequest = parse_body(body)?;
            if request.url.trim().is_empty() {
                return Err(ApiError::BadRequest("url must not be empty".to_string()));
            }
            check_url(&request.url).map_err(|e| ApiError::BadRequest(e.to_string()))?;

            info!(url = %request.url, "Analyzing URL");
            let report = runner
                .audit(&request)
                .await
                .map_err(|e| ApiError::AnalysisFailed(format!("Lighthouse analysis failed: {}", e)))?;
            Ok(Json(report).into_response())
        }
    }
}

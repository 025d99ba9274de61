//! CI commit webhooks, forwarded to the workflow engine

use axum::{
    extract::rejection::JsonRejection,
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{error, info, warn};

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Timeout for the workflow trigger
pub const WORKFLOW_TIMEOUT: Duration = Duration::from_secs(30);

/// Path on the workflow engine that starts an analysis
pub const WORKFLOW_TRIGGER_PATH: &str = "/webhook/analyze-code";

/// Commit event posted by a CI system
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitEvent {
    pub commit_id: String,
    pub branch: String,
    pub repository: String,
    pub author: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub files: Option<Vec<Value>>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[derive(Debug, Serialize)]
struct WorkflowTrigger<'a> {
    #[serde(flatten)]
    event: &'a CommitEvent,
    ci_system: &'a str,
}

/// POST /api/webhook/:ci_system
pub async fn ci_webhook(
    State(state): State<AppState>,
    Path(ci_system): Path<String>,
    payload: Result<Json<CommitEvent>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(event) = payload?;
    info!(ci_system = %ci_system, commit_id = %event.commit_id, "Received CI webhook");

    let url = format!("{}{}", state.config.workflow_url, WORKFLOW_TRIGGER_PATH);
    let trigger = WorkflowTrigger {
        event: &event,
        ci_system: &ci_system,
    };

    let response = state
        .backends
        .http()
        .post(&url)
        .timeout(WORKFLOW_TIMEOUT)
        .json(&trigger)
        .send()
        .await
        .map_err(|e| {
            error!(url = %url, error = %e, "Failed to trigger workflow");
            if e.is_timeout() {
                ApiError::BackendTimeout(format!("Workflow engine timeout: {}", e))
            } else {
                ApiError::BadGateway(format!("Failed to trigger analysis: {}", e))
            }
        })?;

    let status = response.status();
    let text = response.text().await.unwrap_or_default();

    if status.is_success() {
        let workflow_response =
            serde_json::from_str::<Value>(&text).unwrap_or(Value::String(text));
        Ok(Json(json!({
            "status": "success",
            "message": "Analysis triggered",
            "commit_id": event.commit_id,
            "n8n_response": workflow_response,
        })))
    } else {
        warn!(status = status.as_u16(), "Workflow engine rejected trigger");
        Ok(Json(json!({
            "status": "warning",
            "message": format!("Workflow engine returned {}", status.as_u16()),
            "trigger_status": status.as_u16(),
            "details": text,
        })))
    }
}

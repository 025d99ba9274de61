//! Analysis backend access
//!
//! The fan-out only sees the [`AnalysisBackend`] trait; [`HttpBackendClient`]
//! is the production implementation that talks to the deployed backends.
//! Ordinary backend failures are [`BackendError`]s, which the orchestrator
//! turns into absent sub-reports.

mod client;
pub mod orchestrator;

pub use client::{HttpBackendClient, HEALTH_TIMEOUT, PASSTHROUGH_TIMEOUT};
pub use orchestrator::Orchestrator;

use async_trait::async_trait;
use devrpg_common::{AnalysisKind, AnalysisRequest, ServiceKind, SubReport};
use serde::Serialize;
use thiserror::Error;

/// Failure to obtain a usable response from a backend
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("MCP service {0} timeout")]
    Timeout(ServiceKind),

    #[error("MCP service {service} unavailable: {message}")]
    Transport { service: ServiceKind, message: String },

    #[error("MCP service {service} returned HTTP {status}")]
    Status { service: ServiceKind, status: u16 },
}

impl BackendError {
    pub(crate) fn from_reqwest(service: ServiceKind, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            BackendError::Timeout(service)
        } else {
            BackendError::Transport {
                service,
                message: err.to_string(),
            }
        }
    }
}

/// Source of per-kind sub-reports
#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    /// Analyze `request` for one kind
    ///
    /// Unreadable backend output is not an error: it yields a degraded
    /// sub-report.
    async fn analyze(
        &self,
        kind: AnalysisKind,
        request: &AnalysisRequest,
    ) -> Result<SubReport, BackendError>;
}

/// Result of a `/health` probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeStatus {
    /// Answered 200
    Healthy,
    /// Answered with any other status
    Degraded,
    /// Did not answer
    Unavailable,
}

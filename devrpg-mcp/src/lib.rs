//! devrpg-mcp library
//!
//! One analysis backend per process. Four kinds review code through an LLM
//! (code quality, architecture, event loop, cost); the fifth audits URLs
//! with Lighthouse.

pub mod api;
pub mod config;
pub mod error;
pub mod lighthouse;
pub mod llm;
pub mod prompts;
pub mod service;

pub use config::{Args, LlmSettings, McpConfig};
pub use error::{ApiError, ApiResult};

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use devrpg_common::ServiceKind;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::lighthouse::LighthouseRunner;
use crate::llm::{select_client, LlmError, RetryPolicy};
use crate::service::AnalysisService;

/// What answers `/analyze`
#[derive(Clone)]
pub enum Engine {
    Llm(Arc<AnalysisService>),
    Lighthouse(LighthouseRunner),
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct McpState {
    pub service: ServiceKind,
    pub engine: Engine,
}

impl McpState {
    /// State for the configured service
    ///
    /// Fails only for an unknown LLM provider or an unbuildable HTTP client.
    pub fn from_config(config: &McpConfig) -> Result<Self, LlmError> {
        let engine = match config.service.analysis_kind() {
            Some(kind) => {
                let llm = select_client(&config.llm)?;
                Engine::Llm(Arc::new(AnalysisService::new(kind, llm, RetryPolicy::default())))
            }
            None => Engine::Lighthouse(LighthouseRunner::new(config.lighthouse_bin.as_str())),
        };

        Ok(Self {
            service: config.service,
            engine,
        })
    }

    pub fn llm(service: AnalysisService) -> Self {
        Self {
            service: service.kind().service(),
            engine: Engine::Llm(Arc::new(service)),
        }
    }

    pub fn lighthouse(runner: LighthouseRunner) -> Self {
        Self {
            service: ServiceKind::Lighthouse,
            engine: Engine::Lighthouse(runner),
        }
    }
}

pub fn build_router(state: McpState) -> Router {
    Router::new()
        .route("/", get(api::root))
        .route("/health", get(api::health_check))
        .route("/analyze", post(api::analyze))
        .layer(DefaultBodyLimit::disable())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

//! LLM-backed code analysis
//!
//! One [`AnalysisService`] serves any [`AnalysisKind`]: the kind's profile
//! builds the prompt, the LLM answers, and the answer is recovered and
//! normalized into that kind's [`SubReport`]. Unreadable answers degrade the
//! report; only a failed LLM call is an error.

use devrpg_common::{extract_structured, is_parse_failure, AnalysisKind, SubReport};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::llm::{LlmClient, LlmError, RetryPolicy};
use crate::prompts::AnalysisProfile;

/// Body of `POST /analyze` on a code-analysis backend
///
/// The context fields are optional and read only by the kinds that use them.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CodeAnalysisRequest {
    pub code: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub commit_id: Option<String>,
    /// Architecture: project file layout
    #[serde(default)]
    pub project_structure: Option<String>,
    /// Event loop: target runtime, e.g. `node` or `asyncio`
    #[serde(default)]
    pub runtime: Option<String>,
    /// Cost: expected input size
    #[serde(default)]
    pub expected_data_size: Option<String>,
    /// Cost: target cloud provider
    #[serde(default)]
    pub cloud_provider: Option<String>,
}

pub struct AnalysisService {
    profile: AnalysisProfile,
    llm: Arc<dyn LlmClient>,
    retry: RetryPolicy,
}

impl AnalysisService {
    pub fn new(kind: AnalysisKind, llm: Arc<dyn LlmClient>, retry: RetryPolicy) -> Self {
        Self {
            profile: AnalysisProfile::for_kind(kind),
            llm,
            retry,
        }
    }

    pub fn kind(&self) -> AnalysisKind {
        self.profile.kind
    }

    pub fn profile(&self) -> &AnalysisProfile {
        &self.profile
    }

    pub fn llm(&self) -> &dyn LlmClient {
        self.llm.as_ref()
    }

    /// Analyze `request` into a sub-report of this service's kind
    pub async fn analyze(&self, request: &CodeAnalysisRequest) -> Result<SubReport, LlmError> {
        let kind = self.kind();
        info!(
            kind = %kind,
            file = request.file_path.as_deref().unwrap_or("unnamed file"),
            "Analyzing code"
        );

        let prompt = self.profile.build_prompt(request);
        let system = self.profile.system_prompt();
        let llm = self.llm.as_ref();

        let raw = self
            .retry
            .run(kind.as_str(), || llm.generate(&prompt, Some(system.as_str())))
            .await?;
        let preview: String = raw.chars().take(500).collect();
        debug!(kind = %kind, raw = %preview, "LLM response");

        let recovered = extract_structured(&raw);
        if is_parse_failure(&recovered) || !recovered.is_object() {
            warn!(kind = %kind, "Could not read LLM response, returning degraded report");
        }

        Ok(SubReport::from_recovered(kind, &recovered).with_model(llm.model()))
    }
}

//! Typed per-kind analysis results

use serde::Serialize;

use super::AnalysisKind;

/// Score given when a backend reports none, or its output could not be read
pub const DEFAULT_SCORE: u8 = 50;

/// Entry type marking a synthetic finding for an unreadable analysis
pub const ANALYSIS_ERROR: &str = "analysis_error";

/// Summary of a degraded sub-report
pub const DEGRADED_SUMMARY: &str = "Analysis incomplete due to parsing error";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CodeIssue {
    #[serde(rename = "type")]
    pub issue_type: String,
    pub severity: String,
    pub line: Option<u32>,
    pub message: String,
    pub suggestion: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CodeQualityReport {
    pub score: u8,
    pub issues: Vec<CodeIssue>,
    pub summary: String,
    pub analyzed_at: String,
    pub model_used: String,
    /// Stands in for unreadable backend output; never serialized
    #[serde(skip)]
    pub degraded: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerInfo {
    pub name: String,
    pub imports: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DependencyIssue {
    #[serde(rename = "type")]
    pub issue_type: String,
    pub severity: String,
    pub source: String,
    pub target: Option<String>,
    pub message: String,
    pub suggestion: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArchitectureReport {
    pub architecture_score: u8,
    pub detected_layers: Vec<LayerInfo>,
    pub dependency_issues: Vec<DependencyIssue>,
    pub circular_dependencies: Vec<String>,
    pub layer_violations: Vec<String>,
    pub summary: String,
    pub recommendations: Vec<String>,
    pub analyzed_at: String,
    pub model_used: String,
    /// Stands in for unreadable backend output; never serialized
    #[serde(skip)]
    pub degraded: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockingOperation {
    #[serde(rename = "type")]
    pub issue_type: String,
    pub severity: String,
    pub line: Option<u32>,
    pub operation: String,
    pub blocking_time_estimate: Option<String>,
    pub message: String,
    pub async_alternative: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventLoopReport {
    pub event_loop_score: u8,
    pub blocking_operations: Vec<BlockingOperation>,
    pub total_blocking_calls: u32,
    pub estimated_freeze_risk: String,
    pub async_patterns_used: Vec<String>,
    pub summary: String,
    pub recommendations: Vec<String>,
    pub analyzed_at: String,
    pub model_used: String,
    /// Stands in for unreadable backend output; never serialized
    #[serde(skip)]
    pub degraded: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComplexityEntry {
    pub function_name: String,
    pub time_complexity: String,
    pub space_complexity: String,
    pub explanation: String,
    pub hotspot: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostFactor {
    pub category: String,
    pub impact: String,
    pub description: String,
    pub optimization: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostReport {
    pub efficiency_score: u8,
    pub overall_time_complexity: String,
    pub overall_space_complexity: String,
    pub complexity_breakdown: Vec<ComplexityEntry>,
    pub cloud_cost_impact: String,
    pub cost_factors: Vec<CostFactor>,
    pub estimated_monthly_impact: Option<String>,
    pub scalability_assessment: String,
    pub summary: String,
    pub optimizations: Vec<String>,
    pub analyzed_at: String,
    pub model_used: String,
    /// Stands in for unreadable backend output; never serialized
    #[serde(skip)]
    pub degraded: bool,
}

/// Result of one analysis kind
///
/// Serializes to the flat JSON object the backends return for that kind, so
/// the variant is implied by the score field name rather than tagged.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SubReport {
    CodeQuality(CodeQualityReport),
    Architecture(ArchitectureReport),
    EventLoop(EventLoopReport),
    Cost(CostReport),
}

impl SubReport {
    pub fn kind(&self) -> AnalysisKind {
        match self {
            SubReport::CodeQuality(_) => AnalysisKind::CodeQuality,
            SubReport::Architecture(_) => AnalysisKind::Architecture,
            SubReport::EventLoop(_) => AnalysisKind::EventLoop,
            SubReport::Cost(_) => AnalysisKind::Cost,
        }
    }

    /// Score in [0, 100]
    pub fn score(&self) -> u8 {
        match self {
            SubReport::CodeQuality(r) => r.score,
            SubReport::Architecture(r) => r.architecture_score,
            SubReport::EventLoop(r) => r.event_loop_score,
            SubReport::Cost(r) => r.efficiency_score,
        }
    }

    pub fn summary(&self) -> &str {
        match self {
            SubReport::CodeQuality(r) => &r.summary,
            SubReport::Architecture(r) => &r.summary,
            SubReport::EventLoop(r) => &r.summary,
            SubReport::Cost(r) => &r.summary,
        }
    }

    pub fn model_used(&self) -> &str {
        match self {
            SubReport::CodeQuality(r) => &r.model_used,
            SubReport::Architecture(r) => &r.model_used,
            SubReport::EventLoop(r) => &r.model_used,
            SubReport::Cost(r) => &r.model_used,
        }
    }

    /// Replace the reported model name
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        let model = model.into();
        match &mut self {
            SubReport::CodeQuality(r) => r.model_used = model,
            SubReport::Architecture(r) => r.model_used = model,
            SubReport::EventLoop(r) => r.model_used = model,
            SubReport::Cost(r) => r.model_used = model,
        }
        self
    }

    /// True when this report stands in for unreadable backend output
    pub fn is_degraded(&self) -> bool {
        match self {
            SubReport::CodeQuality(r) => r.degraded,
            SubReport::Architecture(r) => r.degraded,
            SubReport::EventLoop(r) => r.degraded,
            SubReport::Cost(r) => r.degraded,
        }
    }
}

//! Analysis request and result model
//!
//! An [`AnalysisRequest`] is fanned out to one backend per [`AnalysisKind`];
//! each backend answers with a [`SubReport`] of its own kind. The gateway
//! collects whatever came back into a [`SubReportSet`], where a missing kind
//! means that backend failed or timed out.

mod normalize;
mod sub_report;

pub use normalize::{coerce_score, coerce_xp};
pub use sub_report::{
    ArchitectureReport, BlockingOperation, CodeIssue, CodeQualityReport, ComplexityEntry,
    CostFactor, CostReport, DependencyIssue, EventLoopReport, LayerInfo, SubReport,
    ANALYSIS_ERROR, DEFAULT_SCORE, DEGRADED_SUMMARY,
};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::scoring::Badge;
use crate::Error;

/// One of the four code-analysis dimensions that feed the overall score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisKind {
    CodeQuality,
    Architecture,
    EventLoop,
    Cost,
}

impl AnalysisKind {
    /// All kinds in fan-out order
    pub const ALL: [AnalysisKind; 4] = [
        AnalysisKind::CodeQuality,
        AnalysisKind::Architecture,
        AnalysisKind::EventLoop,
        AnalysisKind::Cost,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisKind::CodeQuality => "code_quality",
            AnalysisKind::Architecture => "architecture",
            AnalysisKind::EventLoop => "event_loop",
            AnalysisKind::Cost => "cost",
        }
    }

    /// Name of the score field in this kind's backend response
    pub fn score_field(&self) -> &'static str {
        match self {
            AnalysisKind::CodeQuality => "score",
            AnalysisKind::Architecture => "architecture_score",
            AnalysisKind::EventLoop => "event_loop_score",
            AnalysisKind::Cost => "efficiency_score",
        }
    }

    /// Key of this kind's sub-report in a serialized report
    pub fn report_key(&self) -> &'static str {
        match self {
            AnalysisKind::Cost => "cost_analysis",
            other => other.as_str(),
        }
    }

    /// Weight in the overall score, in hundredths
    pub fn weight_pct(&self) -> u32 {
        match self {
            AnalysisKind::CodeQuality => 30,
            AnalysisKind::Architecture => 25,
            AnalysisKind::EventLoop => 20,
            AnalysisKind::Cost => 25,
        }
    }

    /// Badge awarded when this kind scores 90 or more
    pub fn badge(&self) -> Badge {
        match self {
            AnalysisKind::CodeQuality => Badge::CleanCoder,
            AnalysisKind::Architecture => Badge::ArchitectMaster,
            AnalysisKind::EventLoop => Badge::AsyncNinja,
            AnalysisKind::Cost => Badge::Optimizer,
        }
    }

    /// Backend service that produces this kind
    pub fn service(&self) -> ServiceKind {
        match self {
            AnalysisKind::CodeQuality => ServiceKind::CodeQuality,
            AnalysisKind::Architecture => ServiceKind::Architect,
            AnalysisKind::EventLoop => ServiceKind::EventLoop,
            AnalysisKind::Cost => ServiceKind::Cost,
        }
    }
}

impl fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a deployed analysis backend
///
/// Lighthouse audits URLs and is reached through its own endpoint; the other
/// four serve one [`AnalysisKind`] each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceKind {
    Lighthouse,
    CodeQuality,
    Architect,
    EventLoop,
    Cost,
}

impl ServiceKind {
    pub const ALL: [ServiceKind; 5] = [
        ServiceKind::Lighthouse,
        ServiceKind::CodeQuality,
        ServiceKind::Architect,
        ServiceKind::EventLoop,
        ServiceKind::Cost,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceKind::Lighthouse => "lighthouse",
            ServiceKind::CodeQuality => "code_quality",
            ServiceKind::Architect => "architect",
            ServiceKind::EventLoop => "event_loop",
            ServiceKind::Cost => "cost",
        }
    }

    /// Service name reported by the backend's health endpoint
    pub fn service_name(&self) -> String {
        format!("{}_mcp", self.as_str())
    }

    /// Analysis kind served by this backend (None for Lighthouse)
    pub fn analysis_kind(&self) -> Option<AnalysisKind> {
        match self {
            ServiceKind::Lighthouse => None,
            ServiceKind::CodeQuality => Some(AnalysisKind::CodeQuality),
            ServiceKind::Architect => Some(AnalysisKind::Architecture),
            ServiceKind::EventLoop => Some(AnalysisKind::EventLoop),
            ServiceKind::Cost => Some(AnalysisKind::Cost),
        }
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "lighthouse" => Ok(ServiceKind::Lighthouse),
            "code_quality" => Ok(ServiceKind::CodeQuality),
            "architect" | "architecture" => Ok(ServiceKind::Architect),
            "event_loop" => Ok(ServiceKind::EventLoop),
            "cost" => Ok(ServiceKind::Cost),
            _ => Err(Error::InvalidInput(format!("Unknown MCP service: {}", s))),
        }
    }
}

/// Code analysis request accepted by the gateway
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRequest {
    /// Source code to analyze
    pub code: String,
    /// Programming language
    #[serde(default)]
    pub language: Option<String>,
    /// File path
    #[serde(default)]
    pub file_path: Option<String>,
    /// Git commit ID
    #[serde(default)]
    pub commit_id: Option<String>,
    /// Project the report is stored under
    #[serde(default)]
    pub project_id: Option<String>,
    /// User credited with the earned experience
    #[serde(default)]
    pub user_id: Option<String>,
}

impl AnalysisRequest {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            language: None,
            file_path: None,
            commit_id: None,
            project_id: None,
            user_id: None,
        }
    }

    /// The subset of this request forwarded to every backend
    pub fn backend_payload(&self) -> BackendPayload<'_> {
        BackendPayload {
            code: &self.code,
            language: self.language.as_deref(),
            file_path: self.file_path.as_deref(),
            commit_id: self.commit_id.as_deref(),
        }
    }

    /// Label used in log lines
    pub fn display_path(&self) -> &str {
        self.file_path.as_deref().unwrap_or("unnamed file")
    }
}

/// Body of `POST /analyze` sent to a code-analysis backend
#[derive(Debug, Clone, Copy, Serialize)]
pub struct BackendPayload<'a> {
    pub code: &'a str,
    pub language: Option<&'a str>,
    pub file_path: Option<&'a str>,
    pub commit_id: Option<&'a str>,
}

/// Sub-reports collected from one fan-out, absent where the backend failed
#[derive(Debug, Clone, Default, Serialize)]
pub struct SubReportSet {
    pub code_quality: Option<SubReport>,
    pub architecture: Option<SubReport>,
    pub event_loop: Option<SubReport>,
    #[serde(rename = "cost_analysis")]
    pub cost: Option<SubReport>,
}

impl SubReportSet {
    pub fn get(&self, kind: AnalysisKind) -> Option<&SubReport> {
        self.slot(kind).as_ref()
    }

    /// Store `report` under its own kind, replacing any previous entry
    pub fn insert(&mut self, report: SubReport) {
        let kind = report.kind();
        *self.slot_mut(kind) = Some(report);
    }

    /// Present sub-reports in fan-out order
    pub fn present(&self) -> impl Iterator<Item = &SubReport> {
        AnalysisKind::ALL.into_iter().filter_map(move |kind| self.get(kind))
    }

    /// Kinds with no sub-report
    pub fn missing(&self) -> Vec<AnalysisKind> {
        AnalysisKind::ALL
            .into_iter()
            .filter(|kind| self.get(*kind).is_none())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.present().next().is_none()
    }

    /// Score of `kind`, if present
    pub fn score(&self, kind: AnalysisKind) -> Option<u8> {
        self.get(kind).map(SubReport::score)
    }

    fn slot(&self, kind: AnalysisKind) -> &Option<SubReport> {
        match kind {
            AnalysisKind::CodeQuality => &self.code_quality,
            AnalysisKind::Architecture => &self.architecture,
            AnalysisKind::EventLoop => &self.event_loop,
            AnalysisKind::Cost => &self.cost,
        }
    }

    fn slot_mut(&mut self, kind: AnalysisKind) -> &mut Option<SubReport> {
        match kind {
            AnalysisKind::CodeQuality => &mut self.code_quality,
            AnalysisKind::Architecture => &mut self.architecture,
            AnalysisKind::EventLoop => &mut self.event_loop,
            AnalysisKind::Cost => &mut self.cost,
        }
    }
}

impl FromIterator<SubReport> for SubReportSet {
    fn from_iter<I: IntoIterator<Item = SubReport>>(iter: I) -> Self {
        let mut set = SubReportSet::default();
        for report in iter {
            set.insert(report);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_service_kind_aliases() {
        assert_eq!("architecture".parse::<ServiceKind>().unwrap(), ServiceKind::Architect);
        assert_eq!("Event-Loop".parse::<ServiceKind>().unwrap(), ServiceKind::EventLoop);
        assert!("security".parse::<ServiceKind>().is_err());
    }

    #[test]
    fn test_weights_sum_to_one_hundred() {
        let total: u32 = AnalysisKind::ALL.iter().map(AnalysisKind::weight_pct).sum();
        assert_eq!(total, 100);
    }

    #[test]
    fn test_backend_payload_drops_gateway_fields() {
        let mut request = AnalysisRequest::new("fn main() {}");
        request.project_id = Some("p1".to_string());
        request.user_id = Some("u1".to_string());
        request.language = Some("rust".to_string());

        let payload = serde_json::to_value(request.backend_payload()).unwrap();
        assert_eq!(payload["code"], "fn main() {}");
        assert_eq!(payload["language"], "rust");
        assert!(payload.get("project_id").is_none());
        assert!(payload.get("user_id").is_none());
    }

    #[test]
    fn test_set_serializes_absent_kinds_as_null() {
        let mut set = SubReportSet::default();
        set.insert(SubReport::from_value(AnalysisKind::Cost, &json!({"efficiency_score": 70})));

        let value = serde_json::to_value(&set).unwrap();
        assert!(value["code_quality"].is_null());
        assert_eq!(value["cost_analysis"]["efficiency_score"], 70);
        assert_eq!(set.missing().len(), 3);
    }
}

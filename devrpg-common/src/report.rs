//! Combined analysis report

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;

use crate::analysis::{coerce_score, coerce_xp, AnalysisKind, AnalysisRequest, SubReport, SubReportSet};
use crate::scoring::{compose, Badge, Status, LEVEL_UP_THRESHOLD};
use crate::{time, Error, Result};

/// Gamification outcome of one report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RpgSummary {
    pub xp_earned: i64,
    pub badges_earned: BTreeSet<Badge>,
    pub level_up: bool,
}

/// Scored result of one analysis run
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub report_id: String,
    pub project_id: Option<String>,
    pub commit_id: Option<String>,
    pub file_path: Option<String>,
    pub overall_score: u8,
    pub status: Status,
    #[serde(flatten)]
    pub sub_reports: SubReportSet,
    pub rpg_summary: RpgSummary,
    pub analyzed_at: String,
}

impl Report {
    /// Score `sub_reports` and build the report for `request`
    pub fn from_analysis(
        request: &AnalysisRequest,
        sub_reports: SubReportSet,
        analyzed_at: DateTime<Utc>,
    ) -> Report {
        let composition = compose(&sub_reports);

        Report {
            report_id: time::report_id_at(analyzed_at),
            project_id: request.project_id.clone(),
            commit_id: request.commit_id.clone(),
            file_path: request.file_path.clone(),
            overall_score: composition.overall_score,
            status: composition.status,
            sub_reports,
            rpg_summary: RpgSummary {
                xp_earned: composition.xp_earned,
                badges_earned: composition.badges,
                level_up: composition.level_up,
            },
            analyzed_at: time::to_rfc3339(analyzed_at),
        }
    }

    /// Read a report posted by an external workflow
    ///
    /// Only `report_id` is required. The score is clamped (default 0), an
    /// unknown or missing status is derived from the score, sub-reports are
    /// normalized per kind, and unknown badge names are dropped.
    pub fn from_callback(body: &Value) -> Result<Report> {
        let map = body
            .as_object()
            .ok_or_else(|| Error::InvalidInput("Report body must be a JSON object".to_string()))?;

        let report_id = map
            .get("report_id")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| Error::InvalidInput("report_id is required".to_string()))?
            .to_string();

        let overall_score = map.get("overall_score").and_then(coerce_score).unwrap_or(0);
        let status = map
            .get("status")
            .and_then(Value::as_str)
            .and_then(|s| s.parse::<Status>().ok())
            .unwrap_or_else(|| Status::from_score(overall_score));

        let sub_reports = AnalysisKind::ALL
            .into_iter()
            .filter_map(|kind| {
                map.get(kind.report_key())
                    .filter(|v| v.is_object())
                    .map(|v| SubReport::from_recovered(kind, v))
            })
            .collect();

        let summary = map.get("rpg_summary").and_then(Value::as_object);
        let xp_earned = summary
            .and_then(|s| s.get("xp_earned"))
            .and_then(coerce_xp)
            .unwrap_or(0);
        let badges_earned = summary
            .and_then(|s| s.get("badges_earned"))
            .and_then(Value::as_array)
            .map(|names| {
                names
                    .iter()
                    .filter_map(Value::as_str)
                    .filter_map(|name| name.parse::<Badge>().ok())
                    .collect()
            })
            .unwrap_or_default();
        let level_up = summary
            .and_then(|s| s.get("level_up"))
            .and_then(Value::as_bool)
            .unwrap_or(overall_score >= LEVEL_UP_THRESHOLD);

        let text = |key: &str| map.get(key).and_then(Value::as_str).map(str::to_string);

        Ok(Report {
            report_id,
            project_id: text("project_id"),
            commit_id: text("commit_id"),
            file_path: text("file_path"),
            overall_score,
            status,
            sub_reports,
            rpg_summary: RpgSummary {
                xp_earned,
                badges_earned,
                level_up,
            },
            analyzed_at: text("analyzed_at").unwrap_or_else(time::now_rfc3339),
        })
    }

    /// Badge names in report order
    pub fn badge_names(&self) -> Vec<&'static str> {
        self.rpg_summary.badges_earned.iter().map(Badge::name).collect()
    }
}

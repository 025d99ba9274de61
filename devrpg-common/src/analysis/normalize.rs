//! Normalization of loosely-typed backend output into [`SubReport`]s
//!
//! Every field has a default, so any JSON object yields a complete
//! sub-report. Nested entries that are not objects are skipped.

use serde_json::{Map, Value};

use super::sub_report::*;
use super::AnalysisKind;
use crate::json_recovery::is_parse_failure;
use crate::time;

/// Model name recorded when the body does not say
const UNKNOWN_MODEL: &str = "unknown";

const DEFAULT_SUMMARY: &str = "Analysis complete";

impl SubReport {
    /// Build a sub-report of `kind` from a backend body or recovered LLM value
    ///
    /// The score is read from the kind's own score field, then from a generic
    /// `score` field, then defaults to 50. Non-object input yields a report
    /// made entirely of defaults.
    pub fn from_value(kind: AnalysisKind, body: &Value) -> SubReport {
        let empty = Map::new();
        let map = body.as_object().unwrap_or(&empty);

        let score = map
            .get(kind.score_field())
            .and_then(coerce_score)
            .or_else(|| map.get("score").and_then(coerce_score))
            .unwrap_or(DEFAULT_SCORE);
        let summary = str_or(map, "summary", DEFAULT_SUMMARY);
        let analyzed_at = str_or(map, "analyzed_at", "");
        let analyzed_at = if analyzed_at.is_empty() {
            time::now_rfc3339()
        } else {
            analyzed_at
        };
        let model_used = str_or(map, "model_used", UNKNOWN_MODEL);

        match kind {
            AnalysisKind::CodeQuality => SubReport::CodeQuality(CodeQualityReport {
                score,
                issues: entries(map, "issues", |e| CodeIssue {
                    issue_type: str_or(e, "type", "unknown"),
                    severity: str_or(e, "severity", "medium"),
                    line: opt_line(e, "line"),
                    message: str_or(e, "message", "No description"),
                    suggestion: opt_str(e, "suggestion"),
                }),
                summary,
                analyzed_at,
                model_used,
                degraded: false,
            }),
            AnalysisKind::Architecture => SubReport::Architecture(ArchitectureReport {
                architecture_score: score,
                detected_layers: entries(map, "detected_layers", |e| LayerInfo {
                    name: str_or(e, "name", "unknown"),
                    imports: string_list(e, "imports"),
                }),
                dependency_issues: entries(map, "dependency_issues", |e| DependencyIssue {
                    issue_type: str_or(e, "type", "unknown"),
                    severity: str_or(e, "severity", "medium"),
                    source: str_or(e, "source", "unknown"),
                    target: opt_str(e, "target"),
                    message: str_or(e, "message", "No description"),
                    suggestion: opt_str(e, "suggestion"),
                }),
                circular_dependencies: string_list(map, "circular_dependencies"),
                layer_violations: string_list(map, "layer_violations"),
                summary,
                recommendations: string_list(map, "recommendations"),
                analyzed_at,
                model_used,
                degraded: false,
            }),
            AnalysisKind::EventLoop => {
                let blocking_operations = entries(map, "blocking_operations", |e| {
                    BlockingOperation {
                        issue_type: str_or(e, "type", "unknown"),
                        severity: str_or(e, "severity", "medium"),
                        line: opt_line(e, "line"),
                        operation: str_or(e, "operation", "unknown"),
                        blocking_time_estimate: opt_str(e, "blocking_time_estimate"),
                        message: str_or(e, "message", "Blocking operation detected"),
                        async_alternative: opt_str(e, "async_alternative"),
                    }
                });
                let total_blocking_calls = opt_line(map, "total_blocking_calls")
                    .unwrap_or(blocking_operations.len() as u32);

                SubReport::EventLoop(EventLoopReport {
                    event_loop_score: score,
                    blocking_operations,
                    total_blocking_calls,
                    estimated_freeze_risk: str_or(map, "estimated_freeze_risk", "unknown"),
                    async_patterns_used: string_list(map, "async_patterns_used"),
                    summary,
                    recommendations: string_list(map, "recommendations"),
                    analyzed_at,
                    model_used,
                    degraded: false,
                })
            }
            AnalysisKind::Cost => SubReport::Cost(CostReport {
                efficiency_score: score,
                overall_time_complexity: str_or(map, "overall_time_complexity", "O(?)"),
                overall_space_complexity: str_or(map, "overall_space_complexity", "O(?)"),
                complexity_breakdown: entries(map, "complexity_breakdown", |e| ComplexityEntry {
                    function_name: str_or(e, "function_name", "unknown"),
                    time_complexity: str_or(e, "time_complexity", "O(?)"),
                    space_complexity: str_or(e, "space_complexity", "O(?)"),
                    explanation: str_or(e, "explanation", ""),
                    hotspot: bool_or(e, "hotspot", false),
                }),
                cloud_cost_impact: str_or(map, "cloud_cost_impact", "Medium"),
                cost_factors: entries(map, "cost_factors", |e| CostFactor {
                    category: str_or(e, "category", "compute"),
                    impact: str_or(e, "impact", "Medium"),
                    description: str_or(e, "description", ""),
                    optimization: opt_str(e, "optimization"),
                }),
                estimated_monthly_impact: opt_str(map, "estimated_monthly_impact"),
                scalability_assessment: str_or(map, "scalability_assessment", "Unknown"),
                summary,
                optimizations: string_list(map, "optimizations"),
                analyzed_at,
                model_used,
                degraded: false,
            }),
        }
    }

    /// Neutral sub-report standing in for output that could not be read
    pub fn degraded(kind: AnalysisKind, model: &str) -> SubReport {
        let analyzed_at = time::now_rfc3339();
        let summary = DEGRADED_SUMMARY.to_string();
        let model_used = model.to_string();

        match kind {
            AnalysisKind::CodeQuality => SubReport::CodeQuality(CodeQualityReport {
                score: DEFAULT_SCORE,
                issues: vec![CodeIssue {
                    issue_type: ANALYSIS_ERROR.to_string(),
                    severity: "medium".to_string(),
                    line: None,
                    message: "Could not fully analyze code - LLM response parsing failed"
                        .to_string(),
                    suggestion: Some("Try again or manually review the code".to_string()),
                }],
                summary,
                analyzed_at,
                model_used,
                degraded: true,
            }),
            AnalysisKind::Architecture => SubReport::Architecture(ArchitectureReport {
                architecture_score: DEFAULT_SCORE,
                detected_layers: Vec::new(),
                dependency_issues: vec![DependencyIssue {
                    issue_type: ANALYSIS_ERROR.to_string(),
                    severity: "medium".to_string(),
                    source: "unknown".to_string(),
                    target: None,
                    message: "Could not fully analyze architecture - LLM response parsing failed"
                        .to_string(),
                    suggestion: Some("Try again or manually review".to_string()),
                }],
                circular_dependencies: Vec::new(),
                layer_violations: Vec::new(),
                summary,
                recommendations: Vec::new(),
                analyzed_at,
                model_used,
                degraded: true,
            }),
            AnalysisKind::EventLoop => SubReport::EventLoop(EventLoopReport {
                event_loop_score: DEFAULT_SCORE,
                blocking_operations: vec![BlockingOperation {
                    issue_type: ANALYSIS_ERROR.to_string(),
                    severity: "medium".to_string(),
                    line: None,
                    operation: "unknown".to_string(),
                    blocking_time_estimate: None,
                    message: "Could not fully analyze - LLM response parsing failed".to_string(),
                    async_alternative: Some("Try again or manually review".to_string()),
                }],
                total_blocking_calls: 0,
                estimated_freeze_risk: "unknown".to_string(),
                async_patterns_used: Vec::new(),
                summary,
                recommendations: Vec::new(),
                analyzed_at,
                model_used,
                degraded: true,
            }),
            AnalysisKind::Cost => SubReport::Cost(CostReport {
                efficiency_score: DEFAULT_SCORE,
                overall_time_complexity: "O(?)".to_string(),
                overall_space_complexity: "O(?)".to_string(),
                complexity_breakdown: Vec::new(),
                cloud_cost_impact: "Unknown".to_string(),
                cost_factors: vec![CostFactor {
                    category: ANALYSIS_ERROR.to_string(),
                    impact: "Medium".to_string(),
                    description: "Could not fully analyze cost - LLM response parsing failed"
                        .to_string(),
                    optimization: Some("Try again or manually review".to_string()),
                }],
                estimated_monthly_impact: None,
                scalability_assessment: "Unable to assess".to_string(),
                summary,
                optimizations: Vec::new(),
                analyzed_at,
                model_used,
                degraded: true,
            }),
        }
    }

    /// Sub-report for a value produced by JSON recovery
    ///
    /// The parse-failure sentinel and non-object values degrade; anything
    /// else is normalized with [`SubReport::from_value`].
    pub fn from_recovered(kind: AnalysisKind, value: &Value) -> SubReport {
        if is_parse_failure(value) || !value.is_object() {
            SubReport::degraded(kind, UNKNOWN_MODEL)
        } else {
            SubReport::from_value(kind, value)
        }
    }
}

/// Read a score from a JSON value, clamped into [0, 100]
///
/// Accepts integers, floats (truncated toward zero) and numeric strings.
pub fn coerce_score(value: &Value) -> Option<u8> {
    coerce_number(value).map(|raw| raw.trunc().clamp(0.0, 100.0) as u8)
}

/// Read an experience amount the same way as [`coerce_score`], floored at 0
pub fn coerce_xp(value: &Value) -> Option<i64> {
    // `as` saturates at i64::MAX
    coerce_number(value).map(|raw| raw.trunc().max(0.0) as i64)
}

fn coerce_number(value: &Value) -> Option<f64> {
    let raw = match value {
        Value::Number(n) => n
            .as_i64()
            .map(|i| i as f64)
            .or_else(|| n.as_u64().map(|u| u as f64))
            .or_else(|| n.as_f64())?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    raw.is_finite().then_some(raw)
}

fn entries<T>(map: &Map<String, Value>, key: &str, build: impl Fn(&Map<String, Value>) -> T) -> Vec<T> {
    map.get(key)
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Value::as_object).map(build).collect())
        .unwrap_or_default()
}

fn str_or(map: &Map<String, Value>, key: &str, default: &str) -> String {
    opt_str(map, key).unwrap_or_else(|| default.to_string())
}

fn opt_str(map: &Map<String, Value>, key: &str) -> Option<String> {
    match map.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn opt_line(map: &Map<String, Value>, key: &str) -> Option<u32> {
    match map.get(key)? {
        Value::Number(n) => n.as_u64().and_then(|v| u32::try_from(v).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn bool_or(map: &Map<String, Value>, key: &str, default: bool) -> bool {
    map.get(key).and_then(Value::as_bool).unwrap_or(default)
}

fn string_list(map: &Map<String, Value>, key: &str) -> Vec<String> {
    map.get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s.clone()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coerce_score_variants() {
        assert_eq!(coerce_score(&json!(85)), Some(85));
        assert_eq!(coerce_score(&json!(72.9)), Some(72));
        assert_eq!(coerce_score(&json!("64")), Some(64));
        assert_eq!(coerce_score(&json!(" 33.5 ")), Some(33));
        assert_eq!(coerce_score(&json!(150)), Some(100));
        assert_eq!(coerce_score(&json!(-20)), Some(0));
        assert_eq!(coerce_score(&json!("high")), None);
        assert_eq!(coerce_score(&json!(null)), None);
    }

    #[test]
    fn test_kind_score_field_preferred_over_generic() {
        let body = json!({"architecture_score": 91, "score": 10});
        let report = SubReport::from_value(AnalysisKind::Architecture, &body);
        assert_eq!(report.score(), 91);

        let body = json!({"score": 77});
        let report = SubReport::from_value(AnalysisKind::EventLoop, &body);
        assert_eq!(report.score(), 77);

        let report = SubReport::from_value(AnalysisKind::Cost, &json!({}));
        assert_eq!(report.score(), DEFAULT_SCORE);
    }

    #[test]
    fn test_entry_defaults_and_non_objects_skipped() {
        let body = json!({
            "score": 80,
            "issues": [{"line": 4}, "not an object", {"type": "naming", "message": "bad name"}]
        });
        let SubReport::CodeQuality(report) = SubReport::from_value(AnalysisKind::CodeQuality, &body)
        else {
            panic!("expected code quality report");
        };
        assert_eq!(report.issues.len(), 2);
        assert_eq!(report.issues[0].issue_type, "unknown");
        assert_eq!(report.issues[0].severity, "medium");
        assert_eq!(report.issues[0].line, Some(4));
        assert_eq!(report.issues[0].message, "No description");
        assert_eq!(report.issues[1].issue_type, "naming");
        assert_eq!(report.summary, "Analysis complete");
        assert_eq!(report.model_used, "unknown");
    }

    #[test]
    fn test_total_blocking_calls_defaults_to_operation_count() {
        let body = json!({"blocking_operations": [{}, {}, {}]});
        let SubReport::EventLoop(report) = SubReport::from_value(AnalysisKind::EventLoop, &body)
        else {
            panic!("expected event loop report");
        };
        assert_eq!(report.total_blocking_calls, 3);
        assert_eq!(report.blocking_operations[0].message, "Blocking operation detected");
    }

    #[test]
    fn test_serialized_type_field_name() {
        let body = json!({"dependency_issues": [{"type": "cycle"}]});
        let report = SubReport::from_value(AnalysisKind::Architecture, &body);
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["dependency_issues"][0]["type"], "cycle");
        assert_eq!(value["dependency_issues"][0]["source"], "unknown");
    }

    #[test]
    fn test_degraded_reports() {
        for kind in AnalysisKind::ALL {
            let report = SubReport::degraded(kind, "llama3");
            assert_eq!(report.score(), DEFAULT_SCORE);
            assert_eq!(report.model_used(), "llama3");
            assert!(report.is_degraded());
            assert_eq!(report.kind(), kind);
        }

        let value = serde_json::to_value(SubReport::degraded(AnalysisKind::Cost, "m")).unwrap();
        assert_eq!(value["cost_factors"][0]["category"], ANALYSIS_ERROR);
        assert_eq!(value["cost_factors"][0]["impact"], "Medium");
    }

    #[test]
    fn test_from_recovered_degrades_sentinel_and_arrays() {
        let sentinel = crate::json_recovery::parse_failure("garbage");
        assert!(SubReport::from_recovered(AnalysisKind::CodeQuality, &sentinel).is_degraded());
        assert!(SubReport::from_recovered(AnalysisKind::CodeQuality, &json!([1])).is_degraded());
        assert!(!SubReport::from_recovered(AnalysisKind::CodeQuality, &json!({"score": 1}))
            .is_degraded());
    }

    #[test]
    fn test_degraded_is_not_inferred_from_summary() {
        let body = json!({"score": 72, "summary": DEGRADED_SUMMARY});
        let report = SubReport::from_value(AnalysisKind::CodeQuality, &body);
        assert_eq!(report.summary(), DEGRADED_SUMMARY);
        assert!(!report.is_degraded());

        let value = serde_json::to_value(SubReport::degraded(AnalysisKind::CodeQuality, "m")).unwrap();
        assert!(value.get("degraded").is_none());
    }

    #[test]
    fn test_with_model_overrides() {
        let report = SubReport::from_value(AnalysisKind::Cost, &json!({"model_used": "x"}))
            .with_model("llama-3.1-8b-instant");
        assert_eq!(report.model_used(), "llama-3.1-8b-instant");
    }
}

//! Lighthouse web audits
//!
//! Runs the Lighthouse CLI as a subprocess and reduces its JSON report to
//! category scores and a handful of headline metrics. When the CLI is not
//! installed the runner answers with a simulated report flagged
//! `simulated: true`.

use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tracing::{error, info, warn};

const VERSION_TIMEOUT: Duration = Duration::from_secs(10);
const RUN_TIMEOUT: Duration = Duration::from_secs(120);
const CHROME_FLAGS: &str = "--chrome-flags=--headless --no-sandbox --disable-gpu";

/// Audits reported under `performance_metrics`, keyed with `_` for `-`
pub const KEY_METRICS: [&str; 5] = [
    "first-contentful-paint",
    "largest-contentful-paint",
    "total-blocking-time",
    "cumulative-layout-shift",
    "speed-index",
];

#[derive(Debug, Error)]
pub enum LighthouseError {
    #[error("Failed to start Lighthouse: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("Lighthouse analysis timed out after {0} s")]
    Timeout(u64),

    #[error("Lighthouse failed: {0}")]
    Failed(String),

    #[error("Failed to parse Lighthouse output: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Not an http(s) URL: {0}")]
    InvalidUrl(String),
}

/// Accept only absolute `http`/`https` URLs with a host
///
/// The URL is a positional CLI argument, so anything else (including text
/// starting with `-`) never reaches the subprocess.
pub fn check_url(url: &str) -> Result<(), LighthouseError> {
    match reqwest::Url::parse(url.trim()) {
        Ok(parsed)
            if matches!(parsed.scheme(), "http" | "https") && parsed.host_str().is_some() =>
        {
            Ok(())
        }
        _ => Err(LighthouseError::InvalidUrl(url.to_string())),
    }
}

/// Body of `POST /analyze` on the Lighthouse backend
#[derive(Debug, Clone, Deserialize)]
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

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryScore {
    pub name: String,
    pub score: u8,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LighthouseReport {
    pub url: String,
    /// Performance category score
    pub overall_score: u8,
    pub categories: Vec<CategoryScore>,
    pub performance_metrics: BTreeMap<String, String>,
    pub simulated: bool,
    pub analyzed_at: String,
}

/// Lighthouse fraction (0.0 to 1.0, possibly null) as a 0-100 score
fn percent(score: Option<&Value>) -> u8 {
    let fraction = score.and_then(Value::as_f64).unwrap_or(0.0);
    (fraction * 100.0).clamp(0.0, 100.0) as u8
}

/// Reduce a Lighthouse JSON report
pub fn parse_report(url: &str, raw: &Value) -> LighthouseReport {
    let categories = raw
        .get("categories")
        .and_then(Value::as_object)
        .map(|map| {
            map.iter()
                .map(|(id, data)| CategoryScore {
                    name: id.clone(),
                    score: percent(data.get("score")),
                    description: data
                        .get("description")
                        .and_then(Value::as_str)
                        .map(String::from),
                })
                .collect()
        })
        .unwrap_or_default();

    let audits = raw.get("audits");
    let performance_metrics = KEY_METRICS
        .iter()
        .filter_map(|metric| {
            let audit = audits?.get(*metric)?;
            let display = audit
                .get("displayValue")
                .and_then(Value::as_str)
                .unwrap_or("N/A");
            Some((metric.replace('-', "_"), display.to_string()))
        })
        .collect();

    let overall_score = percent(
        raw.get("categories")
            .and_then(|c| c.get("performance"))
            .and_then(|p| p.get("score")),
    );

    LighthouseReport {
        url: url.to_string(),
        overall_score,
        categories,
        performance_metrics,
        simulated: false,
        analyzed_at: devrpg_common::time::now_rfc3339(),
    }
}

/// Plausible random report for hosts without the Lighthouse CLI
pub fn simulate(url: &str) -> LighthouseReport {
    let mut rng = rand::thread_rng();

    let categories = [
        ("performance", 50..=100),
        ("accessibility", 70..=100),
        ("best-practices", 60..=100),
        ("seo", 80..=100),
    ]
    .into_iter()
    .map(|(name, range)| CategoryScore {
        name: name.to_string(),
        score: rng.gen_range(range),
        description: None,
    })
    .collect();

    let performance_metrics = BTreeMap::from([
        (
            "first_contentful_paint".to_string(),
            format!("{:.1}s", rng.gen_range(0.5..3.0)),
        ),
        (
            "largest_contentful_paint".to_string(),
            format!("{:.1}s", rng.gen_range(1.0..5.0)),
        ),
        (
            "total_blocking_time".to_string(),
            format!("{}ms", rng.gen_range(50..=500)),
        ),
        (
            "cumulative_layout_shift".to_string(),
            format!("{:.3}", rng.gen_range(0.0..0.25)),
        ),
        (
            "speed_index".to_string(),
            format!("{:.1}s", rng.gen_range(1.0..5.0)),
        ),
    ]);

    LighthouseReport {
        url: url.to_string(),
        overall_score: rng.gen_range(60..=95),
        categories,
        performance_metrics,
        simulated: true,
        analyzed_at: devrpg_common::time::now_rfc3339(),
    }
}

/// Lighthouse CLI wrapper
#[derive(Debug, Clone)]
pub struct LighthouseRunner {
    bin: String,
}

impl LighthouseRunner {
    pub fn new(bin: impl Into<String>) -> Self {
        Self { bin: bin.into() }
    }

    /// True when `<bin> --version` exits successfully within 10 s
    pub async fn is_available(&self) -> bool {
        let status = Command::new(&self.bin)
            .arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status();

        matches!(
            tokio::time::timeout(VERSION_TIMEOUT, status).await,
            Ok(Ok(status)) if status.success()
        )
    }

    /// Run the CLI against `request.url` and return its raw JSON report
    pub async fn run(&self, request: &LighthouseRequest) -> Result<Value, LighthouseError> {
        check_url(&request.url)?;

        let mut command = Command::new(&self.bin);
        command
            .arg(&request.url)
            .arg("--output=json")
            .arg("--quiet")
            .arg(CHROME_FLAGS);
        // Mobile is Lighthouse's default form factor; desktop has a preset
        if request.device == "desktop" {
            command.arg("--preset=desktop");
        } else {
            command.arg(format!("--form-factor={}", request.device));
        }
        if !request.categories.is_empty() {
            command.arg(format!("--only-categories={}", request.categories.join(",")));
        }
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        info!(bin = %self.bin, url = %request.url, device = %request.device, "Running Lighthouse");
        let output = tokio::time::timeout(RUN_TIMEOUT, command.output())
            .await
            .map_err(|_| LighthouseError::Timeout(RUN_TIMEOUT.as_secs()))??;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            error!(status = %output.status, stderr = %stderr, "Lighthouse failed");
            return Err(LighthouseError::Failed(stderr));
        }

        Ok(serde_json::from_slice(&output.stdout)?)
    }

    /// Audit `request.url`, simulating when the CLI is unavailable
    pub async fn audit(&self, request: &LighthouseRequest) -> Result<LighthouseReport, LighthouseError> {
        check_url(&request.url)?;
        if !self.is_available().await {
            warn!(bin = %self.bin, "Lighthouse CLI not available, using simulated results");
            return Ok(simulate(&request.url));
        }

        let raw = self.run(request).await?;
        Ok(parse_report(&request.url, &raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_check_url() {
        assert!(check_url("https://example.com").is_ok());
        assert!(check_url("http://localhost:3000/app").is_ok());
        assert!(matches!(
            check_url("--output-path=/etc/passwd"),
            Err(LighthouseError::InvalidUrl(_))
        ));
        assert!(check_url("-v").is_err());
        assert!(check_url("file:///etc/hosts").is_err());
        assert!(check_url("example.com").is_err());
    }

    #[test]
    fn test_parse_report() {
        let raw = json!({
            "categories": {
                "performance": {"score": 0.5, "description": "Speed"},
                "seo": {"score": 1.0},
                "accessibility": {"score": null}
            },
            "audits": {
                "first-contentful-paint": {"displayValue": "1.2 s"},
                "speed-index": {"displayValue": "2.0 s"},
                "cumulative-layout-shift": {"score": 1},
                "interactive": {"displayValue": "3.1 s"}
            }
        });

        let report = parse_report("https://example.com", &raw);
        assert_eq!(report.overall_score, 50);
        assert!(!report.simulated);

        let scores: BTreeMap<_, _> = report
            .categories
            .iter()
            .map(|c| (c.name.as_str(), c.score))
            .collect();
        assert_eq!(scores["performance"], 50);
        assert_eq!(scores["seo"], 100);
        assert_eq!(scores["accessibility"], 0);

        let metrics = &report.performance_metrics;
        assert_eq!(metrics.len(), 3);
        assert_eq!(metrics["first_contentful_paint"], "1.2 s");
        assert_eq!(metrics["speed_index"], "2.0 s");
        assert_eq!(metrics["cumulative_layout_shift"], "N/A");
        assert!(!metrics.contains_key("interactive"));
    }

    #[test]
    fn test_parse_report_without_categories() {
        let report = parse_report("https://example.com", &json!({}));
        assert_eq!(report.overall_score, 0);
        assert!(report.categories.is_empty());
        assert!(report.performance_metrics.is_empty());
    }

    #[test]
    fn test_simulated_values_in_range() {
        for _ in 0..20 {
            let report = simulate("https://example.com");
            assert!(report.simulated);
            assert!((60..=95).contains(&report.overall_score));
            assert_eq!(report.categories.len(), 4);
            assert!(report.categories.iter().all(|c| (50..=100).contains(&c.score)));
            assert_eq!(report.performance_metrics.len(), 5);
            assert!(report.performance_metrics["total_blocking_time"].ends_with("ms"));
        }
    }

    #[test]
    fn test_request_defaults() {
        let request: LighthouseRequest =
            serde_json::from_value(json!({"url": "https://example.com"})).unwrap();
        assert_eq!(request.device, "desktop");
        assert_eq!(
            request.categories,
            vec!["performance", "accessibility", "best-practices", "seo"]
        );
    }

    #[tokio::test]
    async fn test_missing_cli_is_simulated() {
        let runner = LighthouseRunner::new("devrpg-no-such-lighthouse");
        assert!(!runner.is_available().await);

        let request: LighthouseRequest =
            serde_json::from_value(json!({"url": "https://example.com"})).unwrap();
        let report = runner.audit(&request).await.unwrap();
        assert!(report.simulated);
        assert_eq!(report.url, "https://example.com");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_empty_cli_output_is_parse_error() {
        // `true` accepts any arguments and prints nothing
        let runner = LighthouseRunner::new("true");
        assert!(runner.is_available().await);

        let request: LighthouseRequest =
            serde_json::from_value(json!({"url": "https://example.com"})).unwrap();
        assert!(matches!(
            runner.audit(&request).await,
            Err(LighthouseError::Parse(_))
        ));
    }
}

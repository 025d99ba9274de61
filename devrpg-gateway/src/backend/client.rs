//! HTTP client for the deployed analysis backends

use async_trait::async_trait;
use devrpg_common::{
    extract_structured, is_parse_failure, AnalysisKind, AnalysisRequest, ServiceKind, SubReport,
};
use futures::future::join_all;
use reqwest::Client;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::{AnalysisBackend, BackendError, ProbeStatus};

/// Timeout for direct pass-through calls
pub const PASSTHROUGH_TIMEOUT: Duration = Duration::from_secs(120);

/// Timeout for `/health` probes
pub const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

/// Client for every configured backend
///
/// Cheap to clone; clones share one connection pool.
#[derive(Clone)]
pub struct HttpBackendClient {
    http: Client,
    urls: Arc<BTreeMap<ServiceKind, String>>,
    analysis_timeout: Duration,
}

impl HttpBackendClient {
    pub fn new(urls: BTreeMap<ServiceKind, String>, analysis_timeout: Duration) -> Self {
        Self {
            http: Client::new(),
            urls: Arc::new(urls),
            analysis_timeout,
        }
    }

    /// Underlying HTTP client, shared with other outbound calls
    pub fn http(&self) -> &Client {
        &self.http
    }

    /// Configured backends and their base URLs
    pub fn urls(&self) -> &BTreeMap<ServiceKind, String> {
        &self.urls
    }

    fn url(&self, service: ServiceKind) -> Result<&str, BackendError> {
        self.urls
            .get(&service)
            .map(String::as_str)
            .ok_or_else(|| BackendError::Transport {
                service,
                message: "no URL configured".to_string(),
            })
    }

    /// POST `body` to `{service}/analyze` and return its recovered JSON
    ///
    /// Used by the direct pass-through endpoints, which return the backend's
    /// structured result as-is.
    pub async fn forward(&self, service: ServiceKind, body: &Value) -> Result<Value, BackendError> {
        let url = format!("{}/analyze", self.url(service)?);
        debug!(service = %service, url = %url, "Forwarding analysis request");

        let text = self.post_text(service, &url, body, PASSTHROUGH_TIMEOUT).await?;
        Ok(extract_structured(&text))
    }

    async fn post_text<B: serde::Serialize + ?Sized>(
        &self,
        service: ServiceKind,
        url: &str,
        body: &B,
        timeout: Duration,
    ) -> Result<String, BackendError> {
        let response = self
            .http
            .post(url)
            .timeout(timeout)
            .json(body)
            .send()
            .await
            .map_err(|e| BackendError::from_reqwest(service, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Status {
                service,
                status: status.as_u16(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| BackendError::from_reqwest(service, e))
    }

    /// GET `{base_url}/health`
    pub async fn probe(&self, base_url: &str) -> ProbeStatus {
        let url = format!("{}/health", base_url.trim_end_matches('/'));
        match self.http.get(&url).timeout(HEALTH_TIMEOUT).send().await {
            Ok(response) if response.status() == reqwest::StatusCode::OK => ProbeStatus::Healthy,
            Ok(response) => {
                debug!(url = %url, status = %response.status(), "Health probe degraded");
                ProbeStatus::Degraded
            }
            Err(e) => {
                debug!(url = %url, error = %e, "Health probe failed");
                ProbeStatus::Unavailable
            }
        }
    }

    /// Probe every configured backend concurrently
    pub async fn probe_all(&self) -> BTreeMap<ServiceKind, ProbeStatus> {
        let probes = self.urls.iter().map(|(service, url)| async move {
            (*service, self.probe(url).await)
        });
        join_all(probes).await.into_iter().collect()
    }
}

#[async_trait]
impl AnalysisBackend for HttpBackendClient {
    async fn analyze(
        &self,
        kind: AnalysisKind,
        request: &AnalysisRequest,
    ) -> Result<SubReport, BackendError> {
        let service = kind.service();
        let url = format!("{}/analyze", self.url(service)?);

        let text = self
            .post_text(service, &url, &request.backend_payload(), self.analysis_timeout)
            .await?;

        let value = extract_structured(&text);
        if is_parse_failure(&value) || !value.is_object() {
            warn!(kind = %kind, "Backend response unreadable, using degraded sub-report");
        }
        Ok(SubReport::from_recovered(kind, &value))
    }
}

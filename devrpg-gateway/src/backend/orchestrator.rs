//! Concurrent fan-out of one analysis request to every analysis kind

use devrpg_common::{AnalysisKind, AnalysisRequest, SubReportSet};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::AnalysisBackend;

/// Fan-out executor
///
/// Calls every kind concurrently, each under its own timeout, and waits for
/// all of them. A failed or timed-out kind is absent from the result and
/// never cancels the others, so wall time is bounded by the slowest call (at
/// most the timeout), not the sum.
#[derive(Clone)]
pub struct Orchestrator {
    backend: Arc<dyn AnalysisBackend>,
    kinds: Vec<AnalysisKind>,
    timeout: Duration,
}

impl Orchestrator {
    /// Orchestrator over all four analysis kinds
    pub fn new(backend: Arc<dyn AnalysisBackend>, timeout: Duration) -> Self {
        Self::with_kinds(backend, AnalysisKind::ALL.to_vec(), timeout)
    }

    pub fn with_kinds(
        backend: Arc<dyn AnalysisBackend>,
        kinds: Vec<AnalysisKind>,
        timeout: Duration,
    ) -> Self {
        Self {
            backend,
            kinds,
            timeout,
        }
    }

    /// Run every kind and collect the sub-reports that came back
    pub async fn analyze(&self, request: &AnalysisRequest) -> SubReportSet {
        let calls = self.kinds.iter().map(|&kind| {
            let backend = Arc::clone(&self.backend);
            async move {
                match tokio::time::timeout(self.timeout, backend.analyze(kind, request)).await {
                    Ok(Ok(report)) => {
                        debug!(kind = %kind, score = report.score(), "Analysis complete");
                        Some(report)
                    }
                    Ok(Err(e)) => {
                        warn!(kind = %kind, error = %e, "Analysis failed, sub-report absent");
                        None
                    }
                    Err(_) => {
                        warn!(
                            kind = %kind,
                            timeout_secs = self.timeout.as_secs_f64(),
                            "Analysis timed out, sub-report absent"
                        );
                        None
                    }
                }
            }
        });

        let set: SubReportSet = join_all(calls).await.into_iter().flatten().collect();

        info!(
            file = request.display_path(),
            present = set.present().count(),
            missing = ?set.missing(),
            "Fan-out settled"
        );
        set
    }
}

//! Fan-out isolation and timing

mod helpers;

use devrpg_common::{AnalysisKind, AnalysisRequest};
use devrpg_gateway::backend::{HttpBackendClient, Orchestrator};
use helpers::{MockBackend, MockBehavior, DEAD_URL};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[tokio::test]
async fn test_all_kinds_present() {
    let orchestrator = Orchestrator::new(Arc::new(MockBackend::scoring(75)), Duration::from_secs(2));

    let set = orchestrator.analyze(&AnalysisRequest::new("x = 1")).await;
    assert!(set.missing().is_empty());
    for kind in AnalysisKind::ALL {
        assert_eq!(set.score(kind), Some(75));
        assert_eq!(set.get(kind).unwrap().model_used(), "mock");
    }
}

#[tokio::test]
async fn test_hanging_backend_is_absent_within_timeout() {
    let backend = MockBackend::scoring(80)
        .with_delay(Duration::from_millis(50))
        .with(AnalysisKind::Architecture, MockBehavior::Hang);
    let timeout = Duration::from_millis(300);
    let orchestrator = Orchestrator::new(Arc::new(backend), timeout);

    let started = Instant::now();
    let set = orchestrator.analyze(&AnalysisRequest::new("x = 1")).await;
    let elapsed = started.elapsed();

    assert_eq!(set.missing(), vec![AnalysisKind::Architecture]);
    assert_eq!(set.present().count(), 3);
    assert!(elapsed >= timeout);
    assert!(elapsed < Duration::from_secs(2), "took {:?}", elapsed);
}

#[tokio::test]
async fn test_calls_run_concurrently() {
    let backend = MockBackend::scoring(80).with_delay(Duration::from_millis(400));
    let orchestrator = Orchestrator::new(Arc::new(backend), Duration::from_secs(5));

    let started = Instant::now();
    let set = orchestrator.analyze(&AnalysisRequest::new("x = 1")).await;

    assert_eq!(set.present().count(), 4);
    // Sequential calls would take at least 1.6 s
    assert!(started.elapsed() < Duration::from_millis(1200));
}

#[tokio::test]
async fn test_failures_do_not_cancel_siblings() {
    let backend = MockBackend::scoring(60)
        .with(AnalysisKind::CodeQuality, MockBehavior::Fail)
        .with(AnalysisKind::Cost, MockBehavior::Fail);
    let orchestrator = Orchestrator::new(Arc::new(backend), Duration::from_secs(2));

    let set = orchestrator.analyze(&AnalysisRequest::new("x = 1")).await;
    assert_eq!(set.missing(), vec![AnalysisKind::CodeQuality, AnalysisKind::Cost]);
    assert_eq!(set.score(AnalysisKind::EventLoop), Some(60));
}

#[tokio::test]
async fn test_subset_of_kinds() {
    let orchestrator = Orchestrator::with_kinds(
        Arc::new(MockBackend::scoring(70)),
        vec![AnalysisKind::EventLoop],
        Duration::from_secs(1),
    );

    let set = orchestrator.analyze(&AnalysisRequest::new("x = 1")).await;
    assert_eq!(set.present().count(), 1);
    assert_eq!(set.score(AnalysisKind::EventLoop), Some(70));
}

#[tokio::test]
async fn test_unreachable_http_backends_are_absent() {
    let urls: BTreeMap<_, _> = devrpg_common::ServiceKind::ALL
        .into_iter()
        .map(|service| (service, DEAD_URL.to_string()))
        .collect();
    let client = HttpBackendClient::new(urls, Duration::from_secs(2));
    let orchestrator = Orchestrator::new(Arc::new(client), Duration::from_secs(2));

    let set = orchestrator.analyze(&AnalysisRequest::new("x = 1")).await;
    assert!(set.is_empty());
    assert_eq!(devrpg_common::compose(&set).overall_score, 0);
}

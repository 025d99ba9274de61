//! Backend router tests with a scripted LLM

mod helpers;

use axum::http::StatusCode;
use axum::Router;
use devrpg_common::analysis::DEGRADED_SUMMARY;
use devrpg_common::AnalysisKind;
use devrpg_mcp::lighthouse::LighthouseRunner;
use devrpg_mcp::llm::{LlmClient, LlmError, RetryPolicy};
use devrpg_mcp::service::AnalysisService;
use devrpg_mcp::{build_router, McpState};
use helpers::{extract_json, json_request, request, send, ScriptedLlm, MOCK_MODEL};
use serde_json::json;
use std::sync::Arc;

fn app(kind: AnalysisKind, llm: Arc<ScriptedLlm>) -> Router {
    let llm: Arc<dyn LlmClient> = llm;
    let service = AnalysisService::new(kind, llm, RetryPolicy::immediate(3));
    build_router(McpState::llm(service))
}

fn lighthouse_app() -> Router {
    build_router(McpState::lighthouse(LighthouseRunner::new(
        "devrpg-no-such-lighthouse",
    )))
}

#[tokio::test]
async fn test_root_describes_service() {
    let app = app(AnalysisKind::Cost, Arc::new(ScriptedLlm::failing()));

    let response = send(&app, request("GET", "/")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["service"], "cost_mcp");
    assert_eq!(
        body["description"],
        "AI-powered Big-O complexity and cloud cost estimation"
    );
    assert_eq!(body["endpoints"]["analyze"], "POST /analyze");
}

#[tokio::test]
async fn test_health_reports_llm_connectivity() {
    let healthy = app(AnalysisKind::CodeQuality, Arc::new(ScriptedLlm::failing()));
    let body = extract_json(send(&healthy, request("GET", "/health")).await.into_body()).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "code_quality_mcp");
    assert_eq!(body["ollama_connected"], true);
    assert!(body.get("lighthouse_available").is_none());
    assert!(body["timestamp"].is_string());

    let degraded = app(
        AnalysisKind::CodeQuality,
        Arc::new(ScriptedLlm::failing().unhealthy()),
    );
    let body = extract_json(send(&degraded, request("GET", "/health")).await.into_body()).await;
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["ollama_connected"], false);
}

#[tokio::test]
async fn test_fenced_answer_is_normalized() {
    let reply = "Sure! Here is the review:\n```json\n{\"score\": 88, \"issues\": [{\"type\": \"naming\", \"severity\": \"low\", \"line\": 3, \"message\": \"short name\"}], \"summary\": \"Tidy\", \"model_used\": \"hallucinated\"}\n```";
    let llm = Arc::new(ScriptedLlm::replying(reply));
    let app = app(AnalysisKind::CodeQuality, llm.clone());

    let response = send(&app, json_request("/analyze", &json!({"code": "x = 1"}))).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["score"], 88);
    assert_eq!(body["summary"], "Tidy");
    assert_eq!(body["model_used"], MOCK_MODEL);
    assert_eq!(body["issues"][0]["type"], "naming");
    assert_eq!(body["issues"][0]["line"], 3);
    assert_eq!(llm.calls(), 1);
}

#[tokio::test]
async fn test_out_of_range_score_is_clamped() {
    let llm = Arc::new(ScriptedLlm::replying("{\"event_loop_score\": 140}"));
    let app = app(AnalysisKind::EventLoop, llm);

    let body = extract_json(
        send(&app, json_request("/analyze", &json!({"code": "fs.readFileSync(p)"})))
            .await
            .into_body(),
    )
    .await;
    assert_eq!(body["event_loop_score"], 100);
}

#[tokio::test]
async fn test_garbage_answer_degrades() {
    let llm = Arc::new(ScriptedLlm::replying("I cannot review this code, sorry."));
    let app = app(AnalysisKind::Architecture, llm);

    let response = send(&app, json_request("/analyze", &json!({"code": "import a"}))).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["architecture_score"], 50);
    assert_eq!(body["summary"], DEGRADED_SUMMARY);
    assert_eq!(body["model_used"], MOCK_MODEL);
    assert_eq!(body["dependency_issues"][0]["type"], "analysis_error");
}

#[tokio::test]
async fn test_transient_failure_is_retried() {
    let llm = Arc::new(ScriptedLlm::new(vec![
        Err(LlmError::Timeout),
        Ok("{\"efficiency_score\": 77}".to_string()),
    ]));
    let app = app(AnalysisKind::Cost, llm.clone());

    let body = extract_json(
        send(&app, json_request("/analyze", &json!({"code": "for x in xs: pass"})))
            .await
            .into_body(),
    )
    .await;
    assert_eq!(body["efficiency_score"], 77);
    assert_eq!(llm.calls(), 2);
}

#[tokio::test]
async fn test_llm_failure_is_server_error() {
    let llm = Arc::new(ScriptedLlm::failing());
    let app = app(AnalysisKind::CodeQuality, llm.clone());

    let response = send(&app, json_request("/analyze", &json!({"code": "x = 1"}))).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "ANALYSIS_FAILED");
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .starts_with("code_quality analysis failed"));
    assert_eq!(llm.calls(), 3);
}

#[tokio::test]
async fn test_invalid_bodies_are_rejected() {
    let llm = Arc::new(ScriptedLlm::failing());
    let app = app(AnalysisKind::CodeQuality, llm.clone());

    let blank = send(&app, json_request("/analyze", &json!({"code": "   "}))).await;
    assert_eq!(blank.status(), StatusCode::BAD_REQUEST);

    let missing = send(&app, json_request("/analyze", &json!({"language": "python"}))).await;
    assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(missing.into_body()).await;
    assert_eq!(body["error"]["code"], "BAD_REQUEST");

    assert_eq!(llm.calls(), 0);
}

#[tokio::test]
async fn test_context_reaches_prompt() {
    let llm = Arc::new(ScriptedLlm::replying("{\"architecture_score\": 70}"));
    let app = app(AnalysisKind::Architecture, llm.clone());

    let body = json!({
        "code": "from app.db import session",
        "language": "python",
        "project_structure": "app/\n  api/\n  db/",
        "runtime": "asyncio",
    });
    let response = send(&app, json_request("/analyze", &body)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let prompt = llm.last_prompt().unwrap();
    assert!(prompt.contains("Project structure:\napp/\n  api/\n  db/"));
    assert!(prompt.contains("(Language: python)"));
    assert!(!prompt.contains("Target runtime"));
}

#[tokio::test]
async fn test_large_source_reaches_llm() {
    let llm = Arc::new(ScriptedLlm::replying("{\"score\": 64}"));
    let app = app(AnalysisKind::CodeQuality, llm.clone());
    let code = "let a = 1;\n".repeat(320 * 1024);
    assert!(code.len() > 3 * 1024 * 1024);

    let response = send(&app, json_request("/analyze", &json!({"code": code}))).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["score"], 64);
    assert!(llm.last_prompt().unwrap().len() > code.len());
}

#[tokio::test]
async fn test_lighthouse_without_cli_is_simulated() {
    let app = lighthouse_app();

    let response = send(
        &app,
        json_request("/analyze", &json!({"url": "https://example.com"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["url"], "https://example.com");
    assert_eq!(body["simulated"], true);
    assert_eq!(body["categories"].as_array().unwrap().len(), 4);
    assert!(body["performance_metrics"]["speed_index"].is_string());
}

#[tokio::test]
async fn test_lighthouse_health_and_validation() {
    let app = lighthouse_app();

    let body = extract_json(send(&app, request("GET", "/health")).await.into_body()).await;
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["service"], "lighthouse_mcp");
    assert_eq!(body["lighthouse_available"], false);
    assert!(body.get("ollama_connected").is_none());

    let root = extract_json(send(&app, request("GET", "/")).await.into_body()).await;
    assert_eq!(
        root["description"],
        "Web performance analysis using Google Lighthouse"
    );

    let blank = send(&app, json_request("/analyze", &json!({"url": ""}))).await;
    assert_eq!(blank.status(), StatusCode::BAD_REQUEST);

    for url in ["--view", "ftp://example.com/site", "example.com"] {
        let response = send(&app, json_request("/analyze", &json!({"url": url}))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", url);
    }
}

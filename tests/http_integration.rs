//! Integration tests for the HTTP surface.
//!
//! Every test builds the full component graph with a mock provider and
//! drives the axum router in-process with `tower::ServiceExt::oneshot`.

use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use secrecy::SecretString;
use serde_json::{json, Value};
use tower::ServiceExt;

use coach_orchestrator::adapters::ai::MockAIProvider;
use coach_orchestrator::adapters::http::app_router;
use coach_orchestrator::app::AppBuilder;
use coach_orchestrator::config::AppConfig;
use coach_orchestrator::domain::orchestration::AIError;
use coach_orchestrator::domain::webhook::WebhookVerifier;

// =============================================================================
// Test Infrastructure
// =============================================================================

const SECRET: &str = "whsec_integration";

const VALID_ASSESSMENT: &str = r#"{
    "score": 72,
    "category": "healthy",
    "summary": "Solid foundation with room to grow.",
    "strengths": ["Shared humour"],
    "growth_areas": ["Listening"],
    "insights": [{"title": "Feeling heard", "description": "Listening gaps show up often.", "confidence": 0.8}],
    "recommendations": [{"title": "Reflective listening", "description": "Repeat back before replying.", "priority": "high"}]
}"#;

fn config() -> AppConfig {
    let mut config = AppConfig::default();
    config.webhooks.openai_secret = Some(SecretString::new(SECRET.to_string()));
    config.webhooks.anthropic_secret = Some(SecretString::new(SECRET.to_string()));
    config.webhooks.custom_secret = Some(SecretString::new(SECRET.to_string()));
    config
}

async fn app_with(provider: Arc<MockAIProvider>) -> Router {
    let app = AppBuilder::new(config())
        .with_backend("mock", provider)
        .build()
        .await
        .unwrap();
    app_router(app.state, &app.settings)
}

async fn app() -> Router {
    app_with(Arc::new(MockAIProvider::new())).await
}

fn sign(body: &[u8]) -> String {
    format!("sha256={}", WebhookVerifier::new(SECRET).sign(body).unwrap())
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post_signed(uri: &str, header: &str, body: &Value) -> Request<Body> {
    let bytes = serde_json::to_vec(body).unwrap();
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header(header, sign(&bytes))
        .body(Body::from(bytes))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn assessment_request() -> Value {
    json!({
        "user_id": "user-42",
        "input": {
            "assessment_type": "communication",
            "answers": [{"question_id": "q1", "question": "How often do you feel heard?", "answer": "Sometimes", "score": 60}]
        }
    })
}

fn daily_member(n: usize) -> Value {
    json!({
        "agent_type": "daily_insight",
        "user_id": format!("user-{}", n),
        "input": {"focus_area": "appreciation", "date": "2026-03-01"}
    })
}

async fn wait_for_terminal(app: &Router, batch_id: &str) -> Value {
    for _ in 0..200 {
        let (status, body) = send(app, get(&format!("/api/batch/{}", batch_id))).await;
        assert_eq!(status, StatusCode::OK);
        if body.get("results").is_some() {
            return body;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("batch {} did not finish", batch_id);
}

// =============================================================================
// Health and Agents
// =============================================================================

#[tokio::test]
async fn health_reports_ok() {
    let (status, body) = send(&app().await, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn agent_request_hits_provider_then_cache() {
    let provider = Arc::new(MockAIProvider::new().with_response(VALID_ASSESSMENT));
    let app = app_with(provider.clone()).await;

    let (status, first) = send(&app, post_json("/api/agents/analyze_assessment", assessment_request())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["source"], "provider");
    assert_eq!(first["agent_type"], "assessment_analysis");
    assert_eq!(first["output"]["score"], 72.0);

    let (status, second) = send(&app, post_json("/api/agents/analyze_assessment", assessment_request())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["source"], "cache");
    assert_eq!(second["output"], first["output"]);
    assert_eq!(provider.call_count(), 1);
}

#[tokio::test]
async fn provider_failure_returns_fallback_output() {
    let provider = Arc::new(MockAIProvider::new().with_error(AIError::unavailable("upstream down")));
    let app = app_with(provider).await;

    let (status, body) = send(&app, post_json("/api/agents/analyze_assessment", assessment_request())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["source"], "fallback");
    let score = body["output"]["score"].as_f64().unwrap();
    assert!((0.0..=100.0).contains(&score));
    assert!(!body["output"]["insights"].as_array().unwrap().is_empty());
    assert!(!body["output"]["recommendations"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn unknown_operation_is_rejected() {
    let (status, body) = send(&app().await, post_json("/api/agents/read_minds", assessment_request())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_FAILED");
}

#[tokio::test]
async fn invalid_input_is_rejected_without_provider_call() {
    let provider = Arc::new(MockAIProvider::new());
    let app = app_with(provider.clone()).await;
    let request = json!({
        "user_id": "user-42",
        "input": {"assessment_type": "communication", "answers": []}
    });

    let (status, _) = send(&app, post_json("/api/agents/analyze_assessment", request)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(provider.call_count(), 0);
}

// =============================================================================
// Batches
// =============================================================================

#[tokio::test]
async fn batch_runs_every_member_in_chunks() {
    let app = app().await;
    let members: Vec<Value> = (0..12).map(daily_member).collect();

    let (status, accepted) = send(
        &app,
        post_json("/api/batch", json!({"members": members, "options": {"max_concurrency": 5}})),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(accepted["status"], "accepted");
    let batch_id = accepted["batch_id"].as_str().unwrap().to_string();
    assert_eq!(accepted["status_url"], format!("/api/batch/{}", batch_id));

    let done = wait_for_terminal(&app, &batch_id).await;

    assert_eq!(done["status"], "completed");
    assert_eq!(done["completed_count"], 12);
    assert_eq!(done["total"], 12);
    assert_eq!(done["progress"], 100);
    assert_eq!(done["results"].as_array().unwrap().len(), 12);
}

#[tokio::test]
async fn oversized_batch_is_rejected() {
    let members: Vec<Value> = (0..51).map(daily_member).collect();
    let (status, _) = send(&app().await, post_json("/api/batch", json!({"members": members}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_and_malformed_batch_ids() {
    let app = app().await;

    let (status, body) = send(&app, get(&format!("/api/batch/{}", uuid::Uuid::new_v4()))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "BATCH_NOT_FOUND");

    let (status, _) = send(&app, get("/api/batch/not-a-uuid")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn cancelling_a_finished_batch_conflicts() {
    let app = app().await;
    let (_, accepted) = send(&app, post_json("/api/batch", json!({"members": [daily_member(1)]}))).await;
    let batch_id = accepted["batch_id"].as_str().unwrap().to_string();
    wait_for_terminal(&app, &batch_id).await;

    let (status, body) = send(&app, post_json(&format!("/api/batch/{}/cancel", batch_id), json!({}))).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "INVALID_STATE_TRANSITION");
}

#[tokio::test]
async fn scheduled_batch_is_queued_and_counted() {
    let app = app().await;
    let mut member = daily_member(1);
    member["scheduled_at"] = json!("2099-01-01T08:00:00Z");

    let (status, receipt) = send(&app, post_json("/api/batch/schedule", json!({"members": [member]}))).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(receipt["queue_position"], 1);
    assert_eq!(receipt["scheduled"], 1);
    assert_eq!(receipt["batches"], 1);

    let (status, stats) = send(&app, get("/api/batch/stats")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["queued"], 1);
    assert_eq!(stats["active"], 0);
}

// =============================================================================
// Webhooks
// =============================================================================

#[tokio::test]
async fn tampered_webhook_is_unauthorized() {
    let app = app().await;
    let signed = serde_json::to_vec(&json!({"id": "evt_1", "type": "response.completed"})).unwrap();
    let request = Request::builder()
        .method("POST")
        .uri("/api/webhooks/openai")
        .header("x-openai-signature", sign(&signed))
        .body(Body::from(r#"{"id":"evt_1","type":"response.failed"}"#))
        .unwrap();

    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "INVALID_SIGNATURE");
}

#[tokio::test]
async fn unsigned_webhook_is_unauthorized() {
    let request = post_json("/api/webhooks/anthropic", json!({"id": "evt_1"}));
    let (status, _) = send(&app().await, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn signed_malformed_webhook_is_bad_request() {
    let request = post_signed("/api/webhooks/custom", "x-webhook-signature", &json!({"unexpected": true}));
    let (status, _) = send(&app().await, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn replayed_delivery_is_acknowledged_once() {
    let app = app().await;
    let uri = format!("/api/webhooks/callbacks/{}", uuid::Uuid::new_v4());
    let body = json!({"status": "failed", "error": "overloaded"});

    let (status, first) = send(&app, post_signed(&uri, "x-webhook-signature", &body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["outcome"], "ignored");

    let (status, second) = send(&app, post_signed(&uri, "x-webhook-signature", &body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["outcome"], "already_processed");
}

#[tokio::test]
async fn callback_registration_validates_url() {
    let app = app().await;
    let request_id = uuid::Uuid::new_v4().to_string();

    let (status, body) = send(
        &app,
        post_json(
            "/api/webhooks/callbacks",
            json!({"request_id": request_id, "callback_url": "https://app.example.com/hooks", "expiration_minutes": 30}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["request_id"], request_id.as_str());

    let (status, _) = send(
        &app,
        post_json(
            "/api/webhooks/callbacks",
            json!({"request_id": request_id, "callback_url": "ftp://nope"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn asynchronous_completion_settles_through_webhook() {
    let provider = Arc::new(MockAIProvider::new().with_async_completion());
    let app = app_with(provider.clone()).await;

    let pending = {
        let app = app.clone();
        tokio::spawn(async move {
            send(&app, post_json("/api/agents/analyze_assessment", assessment_request())).await
        })
    };

    let mut calls = provider.get_calls();
    for _ in 0..200 {
        if !calls.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
        calls = provider.get_calls();
    }
    let request_id = calls[0].metadata.request_id;

    let delivery = json!({"status": "completed", "content": VALID_ASSESSMENT, "model": "mock-model-1"});
    let (status, ack) = send(
        &app,
        post_signed(
            &format!("/api/webhooks/callbacks/{}", request_id),
            "x-webhook-signature",
            &delivery,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["outcome"], "processed");

    let (status, body) = pending.await.unwrap();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["source"], "provider");
    assert_eq!(body["output"]["score"], 72.0);
}

// SPDX-FileCopyrightText: 2026 Outreach Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Router-level tests driven through `tower::ServiceExt::oneshot`.

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use tower::ServiceExt;

use outreach_core::{BatchSummary, CampaignSummary, MessageStatus, NewMessage, QueueMessage};
use outreach_gateway::handlers::{EnqueueResponse, ErrorResponse, HealthResponse};
use outreach_gateway::{AuthConfig, GatewayState, HealthState, build_router};
use outreach_test_utils::{MockOutcome, MockTransport, TestHarness};

fn router(h: &TestHarness, token: Option<&str>) -> Router {
    build_router(GatewayState {
        store: h.storage.clone(),
        runner: h.runner.clone(),
        auth: AuthConfig {
            bearer_token: token.map(String::from),
        },
        health: HealthState::default(),
    })
}

async fn harness() -> TestHarness {
    TestHarness::builder()
        .with_sender("s1", "+15550000001", 100)
        .build()
        .await
        .unwrap()
}

async fn json_body<T: serde::de::DeserializeOwned>(resp: axum::response::Response) -> T {
    let bytes = to_bytes(resp.into_body(), 1 << 20).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn health_reports_version() {
    let h = harness().await;
    let resp = router(&h, Some("token")).oneshot(get("/health")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let health: HealthResponse = json_body(resp).await;
    assert_eq!(health.status, "ok");
    assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn metrics_render_when_enabled() {
    let h = harness().await;
    let app = build_router(GatewayState {
        store: h.storage.clone(),
        runner: h.runner.clone(),
        auth: AuthConfig::default(),
        health: HealthState {
            start_time: std::time::Instant::now(),
            prometheus_render: Some(Arc::new(|| "outreach_messages_sent_total 3\n".to_string())),
        },
    });
    let resp = app.oneshot(get("/metrics")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = to_bytes(resp.into_body(), 1 << 20).await.unwrap();
    assert!(String::from_utf8_lossy(&bytes).contains("outreach_messages_sent_total 3"));

    let resp = router(&h, None).oneshot(get("/metrics")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn enqueue_returns_created_pending_message() {
    let h = harness().await;
    let resp = router(&h, None)
        .oneshot(post_json(
            "/v1/messages",
            serde_json::json!({
                "recipient": "(555) 123-4567",
                "body": "Your appointment is tomorrow",
                "campaign_id": "reminders",
                "priority": 2
            }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let created: EnqueueResponse = json_body(resp).await;
    assert_eq!(created.status, MessageStatus::Pending);

    let stored = h.message(&created.id).await.unwrap();
    assert_eq!(stored.recipient, "+15551234567");
    assert_eq!(stored.original_recipient, "(555) 123-4567");
    assert_eq!(stored.priority, 2);
    assert_eq!(stored.max_attempts, h.settings.default_max_attempts);
}

#[tokio::test]
async fn enqueue_rejects_empty_fields() {
    let h = harness().await;
    for body in [
        serde_json::json!({"recipient": "", "body": "hi"}),
        serde_json::json!({"recipient": "+15551234567", "body": "  "}),
    ] {
        let resp = router(&h, None)
            .oneshot(post_json("/v1/messages", body))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let err: ErrorResponse = json_body(resp).await;
        assert!(err.error.contains("must not be empty"));
    }
}

#[tokio::test]
async fn dispatch_run_returns_summary() {
    let h = harness().await;
    h.enqueue(NewMessage::new("+15551234567", "hi")).await.unwrap();

    let resp = router(&h, None)
        .oneshot(post_json("/v1/dispatch/run", serde_json::Value::Null))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let summary: BatchSummary = json_body(resp).await;
    assert_eq!(summary.processed, 1);
    assert_eq!(summary.sent, 1);
}

#[tokio::test]
async fn dispatch_run_with_nothing_due_is_ok() {
    let h = harness().await;
    let req = Request::builder()
        .method("POST")
        .uri("/v1/dispatch/run")
        .body(Body::empty())
        .unwrap();
    let resp = router(&h, None).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let summary: BatchSummary = json_body(resp).await;
    assert_eq!(summary.processed, 0);
}

#[tokio::test]
async fn message_lookup_reflects_dispatch() {
    let h = TestHarness::builder()
        .with_sender("s1", "+15550000001", 100)
        .with_transport(MockTransport::with_script(vec![MockOutcome::Fail(
            MockTransport::server_error(),
        )]))
        .build()
        .await
        .unwrap();
    let queued = h.enqueue(NewMessage::new("+15551234567", "hi")).await.unwrap();
    h.run_batch().await.unwrap();

    let resp = router(&h, None)
        .oneshot(get(&format!("/v1/messages/{}", queued.id)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let msg: QueueMessage = json_body(resp).await;
    assert_eq!(msg.status, MessageStatus::Pending);
    assert_eq!(msg.attempts, 1);
    assert!(msg.last_error.is_some());
}

#[tokio::test]
async fn unknown_ids_are_not_found() {
    let h = harness().await;
    for uri in ["/v1/messages/nope", "/v1/campaigns/nope"] {
        let resp = router(&h, None).oneshot(get(uri)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{uri}");
    }
}

#[tokio::test]
async fn campaign_summary_after_batch() {
    let h = harness().await;
    h.enqueue(NewMessage::new("+15551234567", "hi").with_campaign("spring"))
        .await
        .unwrap();
    h.run_batch().await.unwrap();

    let resp = router(&h, None)
        .oneshot(get("/v1/campaigns/spring"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let campaign: CampaignSummary = json_body(resp).await;
    assert_eq!(campaign.counters.sent, 1);
    assert_eq!(campaign.counters.pending, 0);
}

#[tokio::test]
async fn api_routes_require_token_when_configured() {
    let h = harness().await;

    let resp = router(&h, Some("s3cret"))
        .oneshot(get("/v1/campaigns/spring"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = Request::builder()
        .method("POST")
        .uri("/v1/dispatch/run")
        .header(header::AUTHORIZATION, "Bearer s3cret")
        .body(Body::empty())
        .unwrap();
    let resp = router(&h, Some("s3cret")).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

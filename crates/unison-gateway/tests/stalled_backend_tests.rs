// SPDX-FileCopyrightText: 2026 Unison Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Router behaviour against a backend that accepts connections but never
//! answers.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use unison_gateway::{build_router, GatewayState, OpenGate, RequestLimits};
use unison_kv::HttpKvBackend;
use unison_resilience::RetryPolicy;
use unison_test_utils::TestHarness;
use wiremock::matchers::any;
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn stalled_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(30)))
        .mount(&server)
        .await;
    server
}

/// Every backend call costs 2 x 200ms attempts plus 10ms of backoff.
fn stalled_app(harness: &TestHarness, server: &MockServer, limits: RequestLimits) -> Router {
    let retry = RetryPolicy::new(
        2,
        Duration::from_millis(10),
        Duration::from_millis(10),
        Duration::from_millis(200),
    );
    let backend = HttpKvBackend::new(&server.uri(), retry).unwrap();
    let state = GatewayState::assemble(
        &harness.config,
        harness.database.clone(),
        Arc::new(backend),
        None,
        harness.cipher.clone(),
        Arc::new(OpenGate),
    );
    build_router(state, limits)
}

fn put_request() -> Request<Body> {
    let body = json!({
        "person_id": "u1",
        "tier": "B",
        "items": {"u1:profile:a": 1, "u1:profile:b": 2},
    });
    Request::post("/kv/put")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn tier_b_put_degrades_within_one_retry_budget() {
    let harness = TestHarness::new().await.unwrap();
    let server = stalled_server().await;
    // Room for one backend call (~410ms) but not for the item writes plus
    // the index read and index write.
    let limits = RequestLimits {
        max_concurrent: 8,
        timeout: Duration::from_millis(1_000),
    };
    let app = stalled_app(&harness, &server, limits);

    let response = app.clone().oneshot(put_request()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body, json!({"ok": true, "count": 2, "storage_ok": false}));
}

#[tokio::test]
async fn concurrency_cap_spans_all_routes() {
    let harness = TestHarness::new().await.unwrap();
    let server = stalled_server().await;
    let limits = RequestLimits {
        max_concurrent: 1,
        timeout: Duration::from_secs(5),
    };
    let app = stalled_app(&harness, &server, limits);

    let slow = tokio::spawn(app.clone().oneshot(put_request()));
    tokio::time::sleep(Duration::from_millis(50)).await;

    // The only permit is held by the put on another route.
    let health = Request::get("/health").body(Body::empty()).unwrap();
    let blocked = tokio::time::timeout(Duration::from_millis(150), app.clone().oneshot(health)).await;
    assert!(blocked.is_err(), "health should wait for the in-flight put");

    let put = slow.await.unwrap().unwrap();
    assert_eq!(put.status(), StatusCode::OK);

    let health = Request::get("/health").body(Body::empty()).unwrap();
    let response = app.oneshot(health).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

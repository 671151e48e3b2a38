// SPDX-FileCopyrightText: 2026 Unison Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end router tests with an open gate.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use unison_core::PolicyDirectory;
use unison_gateway::{build_router, GatewayState, OpenGate, RequestLimits};
use unison_test_utils::TestHarness;

fn state_for(harness: &TestHarness) -> GatewayState {
    let policy = harness
        .config
        .policy
        .validate_groups
        .then(|| harness.policy.clone() as Arc<dyn PolicyDirectory>);
    GatewayState::assemble(
        &harness.config,
        harness.database.clone(),
        harness.backend.clone(),
        policy,
        harness.cipher.clone(),
        Arc::new(OpenGate),
    )
}

fn app(harness: &TestHarness) -> Router {
    build_router(state_for(harness), RequestLimits::default())
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

#[tokio::test]
async fn health_names_service() {
    let harness = TestHarness::new().await.unwrap();
    let (status, body) = get(&app(&harness), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok", "service": "unison-context"}));
}

#[tokio::test]
async fn readiness_follows_backend_health() {
    let harness = TestHarness::new().await.unwrap();
    let app = app(&harness);

    let (status, body) = get(&app, "/ready").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"ready": true, "backend": "ok", "database": "ok"}));

    harness.backend.set_available(false);
    let (status, body) = get(&app, "/ready").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["ready"], json!(false));
    assert_eq!(body["backend"], json!("unavailable"));
    assert_eq!(body["database"], json!("ok"));
}

#[tokio::test]
async fn metrics_endpoint_uses_renderer() {
    let harness = TestHarness::new().await.unwrap();
    let (status, _) = get(&app(&harness), "/metrics").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let state =
        state_for(&harness).with_metrics_render(Arc::new(|| "# TYPE x counter\n".to_string()));
    let app = build_router(state, RequestLimits::default());
    let response = app
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"# TYPE x counter\n");
}

#[tokio::test]
async fn tier_b_put_then_export() {
    let harness = TestHarness::new().await.unwrap();
    let app = app(&harness);

    let (status, body) = post(
        &app,
        "/kv/put",
        json!({
            "person_id": "u1",
            "tier": "B",
            "items": {"u1:profile:color": "blue", "u1:profile:food": "pho"}
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"ok": true, "count": 2, "storage_ok": true}));

    let (_, export) = get(&app, "/profile/u1/export").await;
    assert_eq!(export["ok"], json!(true));
    assert_eq!(export["person_id"], json!("u1"));
    assert_eq!(
        export["items"],
        json!({"u1:profile:color": "blue", "u1:profile:food": "pho"})
    );
    assert!(export["exported_at"].as_f64().unwrap() > 0.0);
}

#[tokio::test]
async fn tier_mismatch_is_a_structured_rejection() {
    let harness = TestHarness::new().await.unwrap();
    let (status, body) = post(
        &app(&harness),
        "/kv/put",
        json!({"person_id": "u1", "tier": "B", "items": {"u1:something:k": 1}}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], json!(false));
    assert_eq!(body["error"], json!("tier-mismatch"));
    assert_eq!(body["key"], json!("u1:something:k"));
    assert_eq!(harness.backend.put_count(), 0);
}

#[tokio::test]
async fn put_validation_order() {
    let harness = TestHarness::new().await.unwrap();
    let app = app(&harness);

    let (_, body) = post(&app, "/kv/put", json!({"tier": "A"})).await;
    assert_eq!(body["error"], json!("invalid-person_id"));

    let (_, body) = post(&app, "/kv/put", json!({"person_id": "u1", "tier": "Z"})).await;
    assert_eq!(body["error"], json!("invalid-tier"));

    let (_, body) = post(
        &app,
        "/kv/put",
        json!({"person_id": "u1", "tier": "A", "items": [1, 2]}),
    )
    .await;
    assert_eq!(body["error"], json!("invalid-items"));

    let (_, body) = post(
        &app,
        "/kv/put",
        json!({"person_id": "u1", "tier": "A", "items": {"u2:x": 1}}),
    )
    .await;
    assert_eq!(body["error"], json!("invalid-namespace"));
}

#[tokio::test]
async fn backend_outage_degrades_but_keeps_value_readable() {
    let harness = TestHarness::new().await.unwrap();
    let app = app(&harness);
    harness.backend.set_available(false);

    let (_, body) = post(
        &app,
        "/kv/put",
        json!({"person_id": "u1", "tier": "A", "items": {"u1:mood": "calm"}}),
    )
    .await;
    assert_eq!(body, json!({"ok": true, "count": 1, "storage_ok": false}));

    let (_, body) = post(&app, "/kv/get", json!({"keys": ["u1:mood", "u1:missing"]})).await;
    assert_eq!(
        body,
        json!({"ok": true, "values": {"u1:mood": "calm", "u1:missing": null}})
    );
}

#[tokio::test]
async fn kv_get_prefers_backend_value() {
    let harness = TestHarness::new().await.unwrap();
    let app = app(&harness);
    harness.backend.seed("u1:k", json!("durable"));

    let (_, body) = post(&app, "/kv/set", json!({"key": "u1:k", "value": "cached"})).await;
    assert_eq!(body, json!({"ok": true}));

    let (_, body) = post(&app, "/kv/get", json!({"keys": ["u1:k"]})).await;
    assert_eq!(body["values"]["u1:k"], json!("durable"));
}

#[tokio::test]
async fn kv_get_requires_string_list() {
    let harness = TestHarness::new().await.unwrap();
    let app = app(&harness);
    let (_, body) = post(&app, "/kv/get", json!({"keys": "u1:k"})).await;
    assert_eq!(body["error"], json!("invalid-keys"));
    let (_, body) = post(&app, "/kv/set", json!({"value": 1})).await;
    assert_eq!(body["error"], json!("invalid-keys"));
}

#[tokio::test]
async fn profile_round_trip_with_redaction() {
    let harness = TestHarness::new().await.unwrap();
    let app = app(&harness);

    let (_, body) = get(&app, "/profile/u1").await;
    assert_eq!(body, json!({"ok": true, "person_id": "u1", "profile": null}));

    let profile = json!({"name": "Ada", "security": {"pin": "1234"}});
    let (_, body) = post(&app, "/profile/u1", json!({"profile": profile})).await;
    assert_eq!(body, json!({"ok": true, "person_id": "u1"}));

    let (_, body) = get(&app, "/profile/u1").await;
    assert_eq!(body["profile"], profile);
    assert_eq!(body["profile_redacted"]["security"]["pin"], json!("***"));
    assert_eq!(body["profile_redacted"]["name"], json!("Ada"));
    assert!(body["updated_at"].as_f64().is_some());
}

#[tokio::test]
async fn profile_rejects_non_object() {
    let harness = TestHarness::new().await.unwrap();
    let (_, body) = post(&app(&harness), "/profile/u1", json!({"profile": [1]})).await;
    assert_eq!(body["error"], json!("invalid-profile"));
}

#[tokio::test]
async fn relational_failures_are_structured() {
    let harness = TestHarness::new().await.unwrap();
    let app = app(&harness);
    harness.break_table("person_profiles").await.unwrap();
    harness.break_table("person_dashboards").await.unwrap();

    let (status, body) = post(&app, "/profile/u1", json!({"profile": {"name": "Ada"}})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], json!(false));
    assert_eq!(body["error"], json!("profile-store-failed"));

    let (_, body) = post(&app, "/dashboard/u1", json!({"dashboard": {"cards": []}})).await;
    assert_eq!(body["error"], json!("dashboard-store-failed"));
    let (_, body) = get(&app, "/dashboard/u1").await;
    assert_eq!(body["error"], json!("dashboard-store-failed"));
}

#[tokio::test]
async fn profile_policy_group_checked_when_enabled() {
    let harness = TestHarness::builder()
        .with_policy_groups(["family"])
        .build()
        .await
        .unwrap();
    let app = app(&harness);

    let (_, body) = post(
        &app,
        "/profile/u1",
        json!({"profile": {"policy_group": "strangers"}}),
    )
    .await;
    assert_eq!(body["error"], json!("invalid-policy-group"));
    assert_eq!(body["policy_group"], json!("strangers"));

    let (_, body) = post(
        &app,
        "/profile/u1",
        json!({"profile": {"policy_group": "family"}}),
    )
    .await;
    assert_eq!(body["ok"], json!(true));
}

#[tokio::test]
async fn dashboard_round_trip_and_rejections() {
    let harness = TestHarness::builder().with_max_cards(2).build().await.unwrap();
    let app = app(&harness);

    let (_, body) = get(&app, "/dashboard/u1").await;
    assert_eq!(body, json!({"ok": true, "dashboard": null}));

    let (_, body) = post(&app, "/dashboard/u1", json!({"dashboard": "nope"})).await;
    assert_eq!(body["error"], json!("invalid-dashboard"));

    let (_, body) = post(&app, "/dashboard/u1", json!({"dashboard": {"cards": 3}})).await;
    assert_eq!(body["error"], json!("invalid-dashboard-cards"));

    let dashboard = json!({"cards": [{"id": 1}, "junk", {"id": 2}, {"id": 3}]});
    let (_, body) = post(&app, "/dashboard/u1", json!({"dashboard": dashboard})).await;
    assert_eq!(body["ok"], json!(true));

    let (_, body) = get(&app, "/dashboard/u1").await;
    let stored = &body["dashboard"];
    assert_eq!(stored["cards"], json!([{"id": 1}, {"id": 2}]));
    assert_eq!(stored["preferences"], json!({}));
    assert_eq!(stored["person_id"], json!("u1"));
}

#[tokio::test]
async fn conversation_store_and_load() {
    let harness = TestHarness::new().await.unwrap();
    let app = app(&harness);

    let (_, body) = get(&app, "/conversation/u1/s1").await;
    assert_eq!(body["messages"], json!([]));
    assert_eq!(body["response"], json!({}));
    assert_eq!(body["summary"], json!(""));
    assert_eq!(body["updated_at"], Value::Null);

    let (_, body) = post(
        &app,
        "/conversation/u1/s1",
        json!({
            "messages": [{"role": "user", "text": "hi"}],
            "response": {"text": "hello"},
            "summary": "greeting"
        }),
    )
    .await;
    assert_eq!(body["ok"], json!(true));
    assert!(body["updated_at"].as_f64().is_some());

    let (_, body) = get(&app, "/conversation/u1/s1").await;
    assert_eq!(body["messages"], json!([{"role": "user", "text": "hi"}]));
    assert_eq!(body["response"], json!({"text": "hello"}));
    assert_eq!(body["summary"], json!("greeting"));
}

#[tokio::test]
async fn conversation_health_is_public() {
    let harness = TestHarness::new().await.unwrap();
    let (status, body) = get(&app(&harness), "/conversation/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"ok": true}));
}

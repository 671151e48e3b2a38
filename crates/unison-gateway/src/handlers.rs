// SPDX-FileCopyrightText: 2026 Unison Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Route handlers.
//!
//! Validation failures are answered with `200` and an `{ok: false, error}`
//! body; only the access gate produces non-2xx statuses.

use std::time::Instant;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Map, Value};
use unison_core::{HealthStatus, PluginAdapter, Rejection};
use unison_prometheus::{record_latency, record_request};

use crate::auth::Operation;
use crate::server::GatewayState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: String,
}

#[derive(Debug, Serialize)]
pub struct ReadyResponse {
    pub ready: bool,
    pub backend: String,
    pub database: String,
}

/// Record the outcome and render the result body.
fn finish(operation: Operation, started: Instant, result: Result<Value, Rejection>) -> Response {
    let label = operation.label();
    record_latency(label, started.elapsed().as_secs_f64());
    match result {
        Ok(body) => {
            record_request(label, "ok");
            Json(body).into_response()
        }
        Err(rejection) => {
            record_request(label, "rejected");
            tracing::debug!(operation = label, code = rejection.code(), "request rejected");
            Json(rejection.to_json()).into_response()
        }
    }
}

fn str_field<'a>(body: &'a Value, field: &str) -> &'a str {
    body.get(field).and_then(Value::as_str).unwrap_or("")
}

/// Tier as sent. Non-string tiers are echoed in their JSON form so the
/// rejection names what the caller sent.
fn tier_field(body: &Value) -> String {
    match body.get("tier") {
        Some(Value::String(tier)) => tier.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

pub async fn health(State(state): State<GatewayState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: state.service_name.clone(),
    })
}

/// Ready when both the durable backend and the database report healthy.
pub async fn ready(State(state): State<GatewayState>) -> Response {
    let (backend, database) = tokio::join!(
        health_of(state.kv.backend().as_ref()),
        health_of(state.database.as_ref()),
    );
    let body = ReadyResponse {
        ready: backend.is_healthy() && database.is_healthy(),
        backend: backend.label().to_string(),
        database: database.label().to_string(),
    };
    let code = if body.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(body)).into_response()
}

async fn health_of(adapter: &dyn PluginAdapter) -> HealthStatus {
    match adapter.health_check().await {
        Ok(status) => status,
        Err(e) => {
            tracing::warn!(adapter = adapter.name(), error = %e, "health check failed");
            HealthStatus::Unhealthy(e.to_string())
        }
    }
}

pub async fn metrics(State(state): State<GatewayState>) -> Response {
    match &state.metrics_render {
        Some(render) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            render(),
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "metrics exporter disabled").into_response(),
    }
}

pub async fn conversation_health() -> Json<Value> {
    Json(json!({ "ok": true }))
}

async fn run_kv_put(state: &GatewayState, body: &Value) -> Result<Value, Rejection> {
    let person_id = str_field(body, "person_id");
    let tier = tier_field(body);
    let Some(Value::Object(items)) = body.get("items") else {
        // Surface person/tier problems before complaining about the items.
        unison_kv::validate(person_id, &tier, std::iter::empty())?;
        return Err(Rejection::InvalidItems);
    };
    let outcome = state.kv.put(person_id, &tier, items).await?;
    Ok(json!({
        "ok": true,
        "count": outcome.count,
        "storage_ok": outcome.storage_ok,
    }))
}

pub async fn kv_put(State(state): State<GatewayState>, Json(body): Json<Value>) -> Response {
    let started = Instant::now();
    let result = run_kv_put(&state, &body).await;
    finish(Operation::KvPut, started, result)
}

fn string_list(value: Option<&Value>) -> Option<Vec<String>> {
    value?
        .as_array()?
        .iter()
        .map(|v| v.as_str().map(str::to_string))
        .collect()
}

pub async fn kv_get(State(state): State<GatewayState>, Json(body): Json<Value>) -> Response {
    let started = Instant::now();
    let result = match string_list(body.get("keys")) {
        Some(keys) => Ok(json!({ "ok": true, "values": state.kv.get(&keys).await })),
        None => Err(Rejection::InvalidKeys),
    };
    finish(Operation::KvGet, started, result)
}

pub async fn kv_set(State(state): State<GatewayState>, Json(body): Json<Value>) -> Response {
    let started = Instant::now();
    let result = match body.get("key").and_then(Value::as_str) {
        Some(key) if !key.is_empty() => {
            let value = body.get("value").cloned().unwrap_or(Value::Null);
            state.kv.set(key, value);
            Ok(json!({ "ok": true }))
        }
        _ => Err(Rejection::InvalidKeys),
    };
    finish(Operation::KvSet, started, result)
}

pub async fn profile_get(
    State(state): State<GatewayState>,
    Path(person_id): Path<String>,
) -> Response {
    let started = Instant::now();
    let result = state.profiles.get(&person_id).await.map(|view| match view {
        Some(view) => json!({
            "ok": true,
            "person_id": person_id,
            "profile": view.profile,
            "profile_redacted": view.profile_redacted,
            "updated_at": view.updated_at,
        }),
        None => json!({ "ok": true, "person_id": person_id, "profile": null }),
    });
    finish(Operation::ProfileGet, started, result)
}

pub async fn profile_put(
    State(state): State<GatewayState>,
    Path(person_id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    let started = Instant::now();
    let null = Value::Null;
    let profile = body.get("profile").unwrap_or(&null);
    let result = state
        .profiles
        .put(&person_id, profile)
        .await
        .map(|()| json!({ "ok": true, "person_id": person_id }));
    finish(Operation::ProfilePut, started, result)
}

pub async fn profile_export(
    State(state): State<GatewayState>,
    Path(person_id): Path<String>,
) -> Response {
    let started = Instant::now();
    let report = state.export.export(&person_id).await;
    let result = Ok(json!({
        "ok": true,
        "person_id": report.person_id,
        "items": report.items,
        "exported_at": report.exported_at,
    }));
    finish(Operation::ProfileExport, started, result)
}

pub async fn dashboard_get(
    State(state): State<GatewayState>,
    Path(person_id): Path<String>,
) -> Response {
    let started = Instant::now();
    let result = state
        .dashboards
        .get(&person_id)
        .await
        .map(|dashboard| json!({ "ok": true, "dashboard": dashboard }));
    finish(Operation::DashboardGet, started, result)
}

pub async fn dashboard_put(
    State(state): State<GatewayState>,
    Path(person_id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    let started = Instant::now();
    let null = Value::Null;
    let dashboard = body.get("dashboard").unwrap_or(&null);
    let result = state
        .dashboards
        .put(&person_id, dashboard)
        .await
        .map(|()| json!({ "ok": true, "person_id": person_id }));
    finish(Operation::DashboardPut, started, result)
}

pub async fn conversation_store(
    State(state): State<GatewayState>,
    Path((person_id, session_id)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Response {
    let started = Instant::now();
    let messages = match body.get("messages") {
        Some(Value::Array(messages)) => messages.clone(),
        _ => Vec::new(),
    };
    let response = body
        .get("response")
        .cloned()
        .unwrap_or_else(|| Value::Object(Map::new()));
    let summary = str_field(&body, "summary").to_string();

    let record = state
        .conversations
        .store(&person_id, &session_id, messages, response, summary)
        .await;
    let result = Ok(json!({
        "ok": true,
        "person_id": person_id,
        "session_id": session_id,
        "updated_at": record.updated_at,
    }));
    finish(Operation::ConversationStore, started, result)
}

pub async fn conversation_load(
    State(state): State<GatewayState>,
    Path((person_id, session_id)): Path<(String, String)>,
) -> Response {
    let started = Instant::now();
    let record = state.conversations.load(&person_id, &session_id).await;
    let result = Ok(json!({
        "ok": true,
        "person_id": person_id,
        "session_id": session_id,
        "messages": record.messages,
        "response": record.response,
        "summary": record.summary,
        "updated_at": record.updated_at,
    }));
    finish(Operation::ConversationLoad, started, result)
}

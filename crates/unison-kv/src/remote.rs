// SPDX-FileCopyrightText: 2026 Unison Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the durable key/value backend.
//!
//! Contract: `PUT {base}/kv/context/{key}` with `{"value": v}` and
//! `GET {base}/kv/context/{key}` answering `{"value": v}` or 404. Every call
//! runs under the backend [`RetryPolicy`]; 429 and 5xx responses and
//! transport failures are retried, other 4xx are not.

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde_json::{json, Value};
use tracing::debug;
use unison_config::model::BackendConfig;
use unison_core::{AdapterType, ContextError, HealthStatus, KvBackend, PluginAdapter};
use unison_resilience::{Attempt, RetryPolicy};

/// Durable backend reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpKvBackend {
    client: reqwest::Client,
    base: Url,
    retry: RetryPolicy,
}

impl HttpKvBackend {
    pub fn new(base_url: &str, retry: RetryPolicy) -> Result<Self, ContextError> {
        let base = Url::parse(base_url).map_err(|e| {
            ContextError::Config(format!("invalid backend url `{base_url}`: {e}"))
        })?;
        if base.cannot_be_a_base() {
            return Err(ContextError::Config(format!(
                "backend url `{base_url}` cannot carry a path"
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(retry.attempt_timeout)
            .build()
            .map_err(|e| ContextError::Backend {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base,
            retry,
        })
    }

    pub fn from_config(config: &BackendConfig) -> Result<Self, ContextError> {
        Self::new(
            &config.base_url(),
            RetryPolicy::new(
                config.max_attempts,
                config.base_delay(),
                config.max_delay(),
                config.attempt_timeout(),
            ),
        )
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn url_for(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// `{base}/kv/context/{key}` with the key percent-encoded as one segment.
    pub fn kv_url(&self, key: &str) -> Url {
        self.url_for(&["kv", "context", key])
    }
}

fn transport_failure(e: reqwest::Error) -> Attempt<ContextError> {
    let permanent = e.is_builder() || e.is_decode();
    let err = ContextError::Backend {
        message: format!("backend request failed: {e}"),
        source: Some(Box::new(e)),
    };
    if permanent {
        Attempt::Permanent(err)
    } else {
        Attempt::Transient(err)
    }
}

/// Returns true for statuses worth retrying.
fn is_transient_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn status_failure(status: StatusCode) -> Attempt<ContextError> {
    let err = ContextError::Backend {
        message: format!("backend returned {status}"),
        source: None,
    };
    if is_transient_status(status) {
        Attempt::Transient(err)
    } else {
        Attempt::Permanent(err)
    }
}

#[async_trait]
impl PluginAdapter for HttpKvBackend {
    fn name(&self) -> &str {
        "http-kv"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::KvBackend
    }

    /// One unretried call to `{base}/health`.
    async fn health_check(&self) -> Result<HealthStatus, ContextError> {
        let url = self.url_for(&["health"]);
        match self.client.get(url).send().await {
            Ok(response) if response.status().is_success() => Ok(HealthStatus::Healthy),
            Ok(response) => Ok(HealthStatus::Unhealthy(format!(
                "backend health returned {}",
                response.status()
            ))),
            Err(e) => Ok(HealthStatus::Unhealthy(format!("backend unreachable: {e}"))),
        }
    }

    async fn shutdown(&self) -> Result<(), ContextError> {
        Ok(())
    }
}

#[async_trait]
impl KvBackend for HttpKvBackend {
    async fn put(&self, key: &str, value: &Value) -> Result<(), ContextError> {
        let url = self.kv_url(key);
        let body = json!({ "value": value });

        self.retry
            .run("kv.backend.put", || {
                let request = self.client.put(url.clone()).json(&body);
                async move {
                    let response = request.send().await.map_err(transport_failure)?;
                    let status = response.status();
                    if status.is_success() {
                        Ok(())
                    } else {
                        Err(status_failure(status))
                    }
                }
            })
            .await?;

        debug!(key, "backend write complete");
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Value>, ContextError> {
        let url = self.kv_url(key);

        let value = self
            .retry
            .run("kv.backend.get", || {
                let request = self.client.get(url.clone());
                async move {
                    let response = request.send().await.map_err(transport_failure)?;
                    let status = response.status();
                    if status == StatusCode::NOT_FOUND {
                        return Ok(None);
                    }
                    if !status.is_success() {
                        return Err(status_failure(status));
                    }
                    let body: Value = response.json().await.map_err(transport_failure)?;
                    Ok(match body.get("value") {
                        None | Some(Value::Null) => None,
                        Some(v) => Some(v.clone()),
                    })
                }
            })
            .await?;

        Ok(value)
    }
}

// SPDX-FileCopyrightText: 2026 Unison Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the policy collaborator's group directory.

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use tracing::debug;
use unison_config::model::PolicyConfig;
use unison_core::{AdapterType, ContextError, HealthStatus, PluginAdapter, PolicyDirectory};
use unison_resilience::{Attempt, RetryPolicy};

/// `GET {base}/groups/{name}`: 2xx means the group exists, 404 that it
/// does not. 429, 5xx and transport errors are retried.
#[derive(Debug, Clone)]
pub struct HttpPolicyDirectory {
    client: reqwest::Client,
    base: Url,
    retry: RetryPolicy,
}

impl HttpPolicyDirectory {
    pub fn new(base_url: &str, retry: RetryPolicy) -> Result<Self, ContextError> {
        let base = Url::parse(base_url)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| ContextError::Config(format!("invalid policy url `{base_url}`")))?;
        let client = reqwest::Client::builder()
            .timeout(retry.attempt_timeout)
            .build()
            .map_err(|e| ContextError::Policy {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(Self {
            client,
            base,
            retry,
        })
    }

    pub fn from_config(config: &PolicyConfig) -> Result<Self, ContextError> {
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

    fn group_url(&self, name: &str) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().push("groups").push(name);
        }
        url
    }
}

fn policy_failure(message: String, transient: bool) -> Attempt<ContextError> {
    let err = ContextError::Policy {
        message,
        source: None,
    };
    if transient {
        Attempt::Transient(err)
    } else {
        Attempt::Permanent(err)
    }
}

#[async_trait]
impl PluginAdapter for HttpPolicyDirectory {
    fn name(&self) -> &str {
        "http-policy"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Policy
    }

    async fn health_check(&self) -> Result<HealthStatus, ContextError> {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().push("health");
        }
        Ok(match self.client.get(url).send().await {
            Ok(response) if response.status().is_success() => HealthStatus::Healthy,
            Ok(response) => HealthStatus::Degraded(format!("policy health returned {}", response.status())),
            Err(e) => HealthStatus::Unhealthy(format!("policy unreachable: {e}")),
        })
    }

    async fn shutdown(&self) -> Result<(), ContextError> {
        Ok(())
    }
}

#[async_trait]
impl PolicyDirectory for HttpPolicyDirectory {
    async fn group_exists(&self, name: &str) -> Result<bool, ContextError> {
        let url = self.group_url(name);
        let exists = self
            .retry
            .run("policy.group", || {
                let request = self.client.get(url.clone());
                async move {
                    let response = request
                        .send()
                        .await
                        .map_err(|e| policy_failure(format!("policy request failed: {e}"), true))?;
                    let status = response.status();
                    if status.is_success() {
                        Ok(true)
                    } else if status == StatusCode::NOT_FOUND {
                        Ok(false)
                    } else {
                        let transient =
                            status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error();
                        Err(policy_failure(format!("policy returned {status}"), transient))
                    }
                }
            })
            .await?;
        debug!(group = name, exists, "policy group lookup");
        Ok(exists)
    }
}

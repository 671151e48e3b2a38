// SPDX-FileCopyrightText: 2026 Unison Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Consent and role gating for the gateway.
//!
//! Every protected route maps to an [`Operation`], which names the scope and
//! roles it needs. The [`AccessGate`] chosen at startup decides whether a
//! bearer token carries them:
//! - [`OpenGate`] when consent is not required,
//! - [`ConsentGate`] which introspects tokens against the consent service.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    extract::{MatchedPath, Request, State},
    http::{HeaderMap, Method, StatusCode},
    middleware::Next,
    response::Response,
};
use reqwest::Url;
use serde::Deserialize;
use unison_config::model::SecurityConfig;
use unison_core::ContextError;
use unison_prometheus::record_request;

/// OAuth-style scopes understood by the consent service.
pub mod scopes {
    pub const INGEST_WRITE: &str = "ingest.write";
    pub const INGEST_READ: &str = "ingest.read";
    pub const REPLAY_READ: &str = "replay.read";
    /// Satisfies every scope and role requirement.
    pub const ADMIN_ALL: &str = "admin.all";
}

const PRIVILEGED_ROLES: &[&str] = &["admin", "operator"];

/// A gated logical operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::IntoStaticStr)]
pub enum Operation {
    #[strum(serialize = "kv.put")]
    KvPut,
    #[strum(serialize = "kv.get")]
    KvGet,
    #[strum(serialize = "kv.set")]
    KvSet,
    #[strum(serialize = "profile.get")]
    ProfileGet,
    #[strum(serialize = "profile.put")]
    ProfilePut,
    #[strum(serialize = "profile.export")]
    ProfileExport,
    #[strum(serialize = "dashboard.get")]
    DashboardGet,
    #[strum(serialize = "dashboard.put")]
    DashboardPut,
    #[strum(serialize = "conversation.store")]
    ConversationStore,
    #[strum(serialize = "conversation.load")]
    ConversationLoad,
}

impl Operation {
    /// Metric and log label, e.g. `kv.put`.
    pub fn label(self) -> &'static str {
        self.into()
    }

    pub fn required_scope(self) -> &'static str {
        match self {
            Operation::KvPut
            | Operation::KvSet
            | Operation::ProfilePut
            | Operation::DashboardPut
            | Operation::ConversationStore => scopes::INGEST_WRITE,
            Operation::ProfileExport => scopes::INGEST_READ,
            Operation::KvGet
            | Operation::ProfileGet
            | Operation::DashboardGet
            | Operation::ConversationLoad => scopes::REPLAY_READ,
        }
    }

    /// Roles of which the caller must hold at least one. Empty means any.
    pub fn required_roles(self) -> &'static [&'static str] {
        match self {
            Operation::ProfilePut | Operation::ProfileExport => PRIVILEGED_ROLES,
            _ => &[],
        }
    }

    /// Map a matched route template to its operation.
    pub fn resolve(method: &Method, route: &str) -> Option<Self> {
        let operation = match (method.as_str(), route) {
            ("POST", "/kv/put") => Operation::KvPut,
            ("POST", "/kv/get") => Operation::KvGet,
            ("POST", "/kv/set") => Operation::KvSet,
            ("GET", "/profile/{person_id}") => Operation::ProfileGet,
            ("POST", "/profile/{person_id}") => Operation::ProfilePut,
            ("GET", "/profile/{person_id}/export") => Operation::ProfileExport,
            ("GET", "/dashboard/{person_id}") => Operation::DashboardGet,
            ("POST", "/dashboard/{person_id}") => Operation::DashboardPut,
            ("POST", "/conversation/{person_id}/{session_id}") => Operation::ConversationStore,
            ("GET", "/conversation/{person_id}/{session_id}") => Operation::ConversationLoad,
            _ => return None,
        };
        Some(operation)
    }
}

/// Why a request was turned away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    /// No token, or the consent service says it is inactive.
    Unauthenticated,
    /// Token is valid but lacks the scope or role.
    Forbidden,
    /// The consent service could not be asked.
    Unavailable,
}

impl Denial {
    pub fn status(self) -> StatusCode {
        match self {
            Denial::Unauthenticated => StatusCode::UNAUTHORIZED,
            Denial::Forbidden => StatusCode::FORBIDDEN,
            Denial::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

/// Decides whether a bearer token may perform an operation.
#[async_trait]
pub trait AccessGate: Send + Sync {
    async fn authorize(&self, token: Option<&str>, operation: Operation) -> Result<(), Denial>;
}

/// Allows every request. Used when consent is not required.
#[derive(Debug, Default, Clone, Copy)]
pub struct OpenGate;

#[async_trait]
impl AccessGate for OpenGate {
    async fn authorize(&self, _token: Option<&str>, _operation: Operation) -> Result<(), Denial> {
        Ok(())
    }
}

/// Introspection result for a bearer token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Grant {
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default)]
    pub roles: Vec<String>,
}

impl Grant {
    fn is_admin(&self) -> bool {
        self.scopes.iter().any(|s| s == scopes::ADMIN_ALL)
    }

    pub fn permits(&self, operation: Operation) -> Result<(), Denial> {
        if !self.active {
            return Err(Denial::Unauthenticated);
        }
        if self.is_admin() {
            return Ok(());
        }
        if !self.scopes.iter().any(|s| s == operation.required_scope()) {
            return Err(Denial::Forbidden);
        }
        let roles = operation.required_roles();
        if !roles.is_empty() && !self.roles.iter().any(|r| roles.contains(&r.as_str())) {
            return Err(Denial::Forbidden);
        }
        Ok(())
    }
}

/// Gate backed by the consent service's `POST /introspect`.
#[derive(Debug, Clone)]
pub struct ConsentGate {
    client: reqwest::Client,
    introspect_url: Url,
}

impl ConsentGate {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ContextError> {
        let introspect_url = Url::parse(base_url)
            .and_then(|base| base.join("/introspect"))
            .map_err(|e| ContextError::Config(format!("invalid consent url `{base_url}`: {e}")))?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ContextError::Internal(format!("failed to build consent client: {e}")))?;
        Ok(Self {
            client,
            introspect_url,
        })
    }

    pub fn from_config(config: &SecurityConfig) -> Result<Self, ContextError> {
        Self::new(
            &config.consent_url(),
            Duration::from_millis(config.consent_timeout_ms),
        )
    }

    /// Ask the consent service about `token`. Non-2xx answers count as inactive.
    pub async fn introspect(&self, token: &str) -> Result<Grant, ContextError> {
        let response = self
            .client
            .post(self.introspect_url.clone())
            .json(&serde_json::json!({ "token": token }))
            .send()
            .await
            .map_err(|e| ContextError::Policy {
                message: "consent introspection failed".into(),
                source: Some(Box::new(e)),
            })?;

        if !response.status().is_success() {
            tracing::debug!(status = %response.status(), "consent service rejected token");
            return Ok(Grant::default());
        }

        response.json::<Grant>().await.map_err(|e| ContextError::Policy {
            message: "malformed introspection response".into(),
            source: Some(Box::new(e)),
        })
    }
}

#[async_trait]
impl AccessGate for ConsentGate {
    async fn authorize(&self, token: Option<&str>, operation: Operation) -> Result<(), Denial> {
        let Some(token) = token else {
            return Err(Denial::Unauthenticated);
        };
        let grant = self.introspect(token).await.map_err(|e| {
            tracing::warn!(error = %e, operation = operation.label(), "consent service unavailable");
            Denial::Unavailable
        })?;
        let verdict = grant.permits(operation);
        if verdict.is_err() {
            tracing::info!(
                sub = grant.sub.as_deref().unwrap_or("-"),
                operation = operation.label(),
                "access denied"
            );
        }
        verdict
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

/// Route-layer middleware that resolves the operation and consults the gate.
///
/// Routes that cannot be resolved to an operation are refused (fail-closed).
pub async fn access_middleware(
    State(gate): State<Arc<dyn AccessGate>>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let operation = request
        .extensions()
        .get::<MatchedPath>()
        .and_then(|route| Operation::resolve(request.method(), route.as_str()));
    let Some(operation) = operation else {
        tracing::error!(uri = %request.uri(), "gated route has no operation mapping");
        return Err(StatusCode::FORBIDDEN);
    };

    let token = bearer_token(request.headers());
    match gate.authorize(token.as_deref(), operation).await {
        Ok(()) => Ok(next.run(request).await),
        Err(denial) => {
            record_request(operation.label(), "denied");
            Err(denial.status())
        }
    }
}

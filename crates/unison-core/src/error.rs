// SPDX-FileCopyrightText: 2026 Unison Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Unison context service.
//!
//! Two families live here:
//! - [`ContextError`] is the internal failure type for storage, collaborators,
//!   crypto and configuration. It never crosses the HTTP boundary verbatim.
//! - [`Rejection`] is the caller-facing taxonomy. Every variant has a stable
//!   machine-readable code and enough context to let the caller fix the input.

use serde_json::{json, Value};
use thiserror::Error;

/// The primary internal error type used across adapters and stores.
#[derive(Debug, Error)]
pub enum ContextError {
    /// Configuration errors (invalid TOML, bad key material, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Local relational storage errors (connection, query, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Durable KV backend errors (HTTP failure, unexpected status, bad body).
    #[error("backend error: {message}")]
    Backend {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Policy collaborator errors.
    #[error("policy error: {message}")]
    Policy {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Encryption or decryption failures.
    #[error("crypto error: {0}")]
    Crypto(String),

    /// A downstream call exceeded its per-attempt timeout.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ContextError {
    /// Wrap any error as a storage failure.
    pub fn storage<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        ContextError::Storage {
            source: Box::new(err),
        }
    }
}

/// Caller-facing validation and persistence failures.
///
/// These are always returned as a structured `{ok: false, error: <code>}`
/// result, never as a transport-level fault.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("person_id must be a non-empty string")]
    InvalidPersonId,

    #[error("tier `{tier}` is not one of A, B, C")]
    InvalidTier { tier: String },

    #[error("key `{key}` is outside the person namespace")]
    InvalidNamespace { key: String },

    #[error("key `{key}` lacks the `{expected}` segment required by its tier")]
    TierMismatch { key: String, expected: String },

    #[error("items must be an object of key/value pairs")]
    InvalidItems,

    #[error("keys must be a list of strings")]
    InvalidKeys,

    #[error("profile must be an object")]
    InvalidProfile,

    #[error("policy group `{group}` could not be confirmed")]
    InvalidPolicyGroup { group: String },

    #[error("dashboard must be an object")]
    InvalidDashboard,

    #[error("dashboard cards must be a list")]
    InvalidDashboardCards,

    #[error("failed to persist {record}")]
    StorageFailed { record: StoredRecord },
}

/// Which relational record a persistence failure concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum StoredRecord {
    Profile,
    Dashboard,
}

impl Rejection {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Rejection::InvalidPersonId => "invalid-person_id",
            Rejection::InvalidTier { .. } => "invalid-tier",
            Rejection::InvalidNamespace { .. } => "invalid-namespace",
            Rejection::TierMismatch { .. } => "tier-mismatch",
            Rejection::InvalidItems => "invalid-items",
            Rejection::InvalidKeys => "invalid-keys",
            Rejection::InvalidProfile => "invalid-profile",
            Rejection::InvalidPolicyGroup { .. } => "invalid-policy-group",
            Rejection::InvalidDashboard => "invalid-dashboard",
            Rejection::InvalidDashboardCards => "invalid-dashboard-cards",
            Rejection::StorageFailed {
                record: StoredRecord::Profile,
            } => "profile-store-failed",
            Rejection::StorageFailed {
                record: StoredRecord::Dashboard,
            } => "dashboard-store-failed",
        }
    }

    /// Render as the `{ok: false, ...}` result body.
    pub fn to_json(&self) -> Value {
        let mut body = json!({
            "ok": false,
            "error": self.code(),
            "message": self.to_string(),
        });
        match self {
            Rejection::InvalidNamespace { key } => {
                body["key"] = json!(key);
            }
            Rejection::TierMismatch { key, expected } => {
                body["key"] = json!(key);
                body["expected"] = json!(expected);
            }
            Rejection::InvalidTier { tier } => {
                body["tier"] = json!(tier);
            }
            Rejection::InvalidPolicyGroup { group } => {
                body["policy_group"] = json!(group);
            }
            _ => {}
        }
        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_match_wire_contract() {
        assert_eq!(Rejection::InvalidPersonId.code(), "invalid-person_id");
        assert_eq!(
            Rejection::TierMismatch {
                key: "u1:x".into(),
                expected: ":profile:".into()
            }
            .code(),
            "tier-mismatch"
        );
        assert_eq!(
            Rejection::StorageFailed {
                record: StoredRecord::Dashboard
            }
            .code(),
            "dashboard-store-failed"
        );
    }

    #[test]
    fn tier_mismatch_body_names_key_and_segment() {
        let body = Rejection::TierMismatch {
            key: "u1:something:k".into(),
            expected: ":profile:".into(),
        }
        .to_json();
        assert_eq!(body["ok"], json!(false));
        assert_eq!(body["error"], json!("tier-mismatch"));
        assert_eq!(body["key"], json!("u1:something:k"));
        assert_eq!(body["expected"], json!(":profile:"));
    }

    #[test]
    fn storage_failed_message_names_record() {
        let rejection = Rejection::StorageFailed {
            record: StoredRecord::Profile,
        };
        assert_eq!(rejection.to_string(), "failed to persist profile");
    }
}

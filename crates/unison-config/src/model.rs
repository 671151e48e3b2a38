// SPDX-FileCopyrightText: 2026 Unison Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Unison context service.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::time::Duration;

use base64::Engine;
use serde::{Deserialize, Serialize};

/// Top-level service configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ContextConfig {
    /// Listener and logging settings.
    #[serde(default)]
    pub service: ServiceConfig,

    /// Remote durable KV backend.
    #[serde(default)]
    pub backend: BackendConfig,

    /// Local relational store.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Policy collaborator used to confirm `policy_group` on profiles.
    #[serde(default)]
    pub policy: PolicyConfig,

    /// Consent enforcement settings.
    #[serde(default)]
    pub security: SecurityConfig,

    /// At-rest encryption for profile and dashboard blobs.
    #[serde(default)]
    pub encryption: EncryptionConfig,

    /// Dashboard limits.
    #[serde(default)]
    pub dashboard: DashboardConfig,

    /// Prometheus metrics exporter.
    #[serde(default)]
    pub prometheus: PrometheusConfig,
}

/// HTTP listener and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Service name reported by `/health`.
    #[serde(default = "default_service_name")]
    pub name: String,

    /// Address to bind the HTTP listener to.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Port to bind the HTTP listener to.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Upper bound on requests served concurrently.
    #[serde(default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: usize,

    /// Whole-request timeout in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            bind_address: default_bind_address(),
            port: default_port(),
            log_level: default_log_level(),
            max_concurrent_requests: default_max_concurrent_requests(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

fn default_service_name() -> String {
    "unison-context".to_string()
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8081
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_concurrent_requests() -> usize {
    256
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

/// Remote durable KV backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BackendConfig {
    /// URL scheme (`http` or `https`).
    #[serde(default = "default_scheme")]
    pub scheme: String,

    /// Backend host name.
    #[serde(default = "default_backend_host")]
    pub host: String,

    /// Backend port.
    #[serde(default = "default_backend_port")]
    pub port: u16,

    /// Per-attempt timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum attempts per call, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry, doubled on each further retry.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Upper bound on the backoff delay.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            scheme: default_scheme(),
            host: default_backend_host(),
            port: default_backend_port(),
            timeout_ms: default_timeout_ms(),
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

impl BackendConfig {
    pub fn base_url(&self) -> String {
        format!("{}://{}:{}", self.scheme, self.host, self.port)
    }

    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    /// Longest one retried call can take: every attempt times out and every
    /// backoff between them is slept.
    pub fn worst_case_call(&self) -> Duration {
        let attempts = u64::from(self.max_attempts.max(1));
        let mut total = attempts.saturating_mul(self.timeout_ms);
        for retry in 0..attempts - 1 {
            let delay = self
                .base_delay_ms
                .saturating_mul(1u64 << retry.min(16))
                .min(self.max_delay_ms);
            total = total.saturating_add(delay);
        }
        Duration::from_millis(total)
    }
}

fn default_scheme() -> String {
    "http".to_string()
}

fn default_backend_host() -> String {
    "storage".to_string()
}

fn default_backend_port() -> u16 {
    8082
}

fn default_timeout_ms() -> u64 {
    2_000
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    100
}

fn default_max_delay_ms() -> u64 {
    2_000
}

/// Local SQLite store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub path: String,

    /// Enable WAL journal mode (single writer, concurrent readers).
    #[serde(default = "default_wal_mode", deserialize_with = "flag::deserialize")]
    pub wal_mode: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    "./unison-context.db".to_string()
}

fn default_wal_mode() -> bool {
    true
}

/// Policy collaborator configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyConfig {
    /// Confirm `policy_group` on profile writes.
    #[serde(default, deserialize_with = "flag::deserialize")]
    pub validate_groups: bool,

    #[serde(default = "default_scheme")]
    pub scheme: String,

    #[serde(default = "default_policy_host")]
    pub host: String,

    #[serde(default = "default_policy_port")]
    pub port: u16,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            validate_groups: false,
            scheme: default_scheme(),
            host: default_policy_host(),
            port: default_policy_port(),
            timeout_ms: default_timeout_ms(),
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

impl PolicyConfig {
    pub fn base_url(&self) -> String {
        format!("{}://{}:{}", self.scheme, self.host, self.port)
    }

    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }
}

fn default_policy_host() -> String {
    "policy".to_string()
}

fn default_policy_port() -> u16 {
    8083
}

/// Consent enforcement configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SecurityConfig {
    /// Require a consent grant (bearer token) on protected endpoints.
    #[serde(default, deserialize_with = "flag::deserialize")]
    pub require_consent: bool,

    #[serde(default = "default_scheme")]
    pub consent_scheme: String,

    #[serde(default = "default_consent_host")]
    pub consent_host: String,

    #[serde(default = "default_consent_port")]
    pub consent_port: u16,

    /// Timeout for a single introspection call.
    #[serde(default = "default_timeout_ms")]
    pub consent_timeout_ms: u64,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            require_consent: false,
            consent_scheme: default_scheme(),
            consent_host: default_consent_host(),
            consent_port: default_consent_port(),
            consent_timeout_ms: default_timeout_ms(),
        }
    }
}

impl SecurityConfig {
    pub fn consent_url(&self) -> String {
        format!(
            "{}://{}:{}",
            self.consent_scheme, self.consent_host, self.consent_port
        )
    }
}

fn default_consent_host() -> String {
    "consent".to_string()
}

fn default_consent_port() -> u16 {
    7072
}

/// At-rest encryption configuration.
///
/// Debug output never includes the key.
#[derive(Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EncryptionConfig {
    /// 32-byte key as 64 hex characters or standard base64. `None` stores plaintext.
    #[serde(default)]
    pub key: Option<String>,
}

impl std::fmt::Debug for EncryptionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptionConfig")
            .field("key", &self.key.as_ref().map(|_| "[redacted]"))
            .finish()
    }
}

impl EncryptionConfig {
    /// Decode the configured key into raw bytes.
    ///
    /// Returns `Ok(None)` when no key (or an empty key) is configured.
    pub fn decode_key(&self) -> Result<Option<[u8; 32]>, String> {
        let Some(raw) = self.key.as_deref().map(str::trim) else {
            return Ok(None);
        };
        if raw.is_empty() {
            return Ok(None);
        }

        let bytes = if raw.len() == 64 && raw.chars().all(|c| c.is_ascii_hexdigit()) {
            hex::decode(raw).map_err(|e| format!("invalid hex key: {e}"))?
        } else {
            base64::engine::general_purpose::STANDARD
                .decode(raw)
                .map_err(|e| format!("key is neither 64 hex chars nor base64: {e}"))?
        };

        let key: [u8; 32] = bytes
            .try_into()
            .map_err(|b: Vec<u8>| format!("key must be 32 bytes, got {}", b.len()))?;
        Ok(Some(key))
    }
}

/// Dashboard limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DashboardConfig {
    /// Maximum number of cards kept per dashboard; the excess is trimmed.
    #[serde(default = "default_max_cards")]
    pub max_cards: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            max_cards: default_max_cards(),
        }
    }
}

fn default_max_cards() -> usize {
    100
}

/// Prometheus exporter configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PrometheusConfig {
    #[serde(default = "default_prometheus_enabled", deserialize_with = "flag::deserialize")]
    pub enabled: bool,
}

impl Default for PrometheusConfig {
    fn default() -> Self {
        Self {
            enabled: default_prometheus_enabled(),
        }
    }
}

fn default_prometheus_enabled() -> bool {
    true
}

/// Boolean switches that also accept the legacy environment spellings:
/// `1/true/yes/on` and `0/false/no/off` in any case.
mod flag {
    use std::fmt;

    use serde::de::{self, Deserializer, Visitor};

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        deserializer.deserialize_any(FlagVisitor)
    }

    pub(super) fn parse(value: &str) -> Option<bool> {
        match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" | "" => Some(false),
            _ => None,
        }
    }

    struct FlagVisitor;

    impl Visitor<'_> for FlagVisitor {
        type Value = bool;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a boolean or one of 1/true/yes/on, 0/false/no/off")
        }

        fn visit_bool<E: de::Error>(self, v: bool) -> Result<bool, E> {
            Ok(v)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<bool, E> {
            match v {
                0 => Ok(false),
                1 => Ok(true),
                _ => Err(E::invalid_value(de::Unexpected::Signed(v), &self)),
            }
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<bool, E> {
            match v {
                0 => Ok(false),
                1 => Ok(true),
                _ => Err(E::invalid_value(de::Unexpected::Unsigned(v), &self)),
            }
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<bool, E> {
            parse(v).ok_or_else(|| E::invalid_value(de::Unexpected::Str(v), &self))
        }
    }
}

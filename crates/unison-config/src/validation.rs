// SPDX-FileCopyrightText: 2026 Unison Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as bind addresses, retry budgets, and encryption key material.

use crate::diagnostic::ConfigError;
use crate::model::ContextConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];
const SCHEMES: &[&str] = &["http", "https"];
const TIERED_PUT_PHASES: u32 = 3;

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every failure instead of stopping at the first one.
pub fn validate_config(config: &ContextConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let addr = config.service.bind_address.trim();
    if addr.is_empty() {
        errors.push(validation("service.bind_address must not be empty"));
    } else {
        let is_valid_ip = addr.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = addr
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            errors.push(validation(format!(
                "service.bind_address `{addr}` is not a valid IP address or hostname"
            )));
        }
    }

    if !LOG_LEVELS.contains(&config.service.log_level.as_str()) {
        errors.push(validation(format!(
            "service.log_level must be one of {}, got `{}`",
            LOG_LEVELS.join(", "),
            config.service.log_level
        )));
    }

    if config.service.max_concurrent_requests == 0 {
        errors.push(validation("service.max_concurrent_requests must be at least 1"));
    }

    if config.service.request_timeout_ms == 0 {
        errors.push(validation("service.request_timeout_ms must be greater than zero"));
    }

    // A Tier-B put makes up to three sequential backend calls (item writes,
    // index read, index write); all of them must fit in the request timeout.
    if config.service.request_timeout_ms > 0 && config.backend.max_attempts > 0 {
        let budget = config
            .backend
            .worst_case_call()
            .saturating_mul(TIERED_PUT_PHASES);
        if budget.as_millis() >= u128::from(config.service.request_timeout_ms) {
            errors.push(validation(format!(
                "service.request_timeout_ms ({}) must exceed the worst-case tiered put \
                 of {}ms ({TIERED_PUT_PHASES} x backend retry budget)",
                config.service.request_timeout_ms,
                budget.as_millis()
            )));
        }
    }

    if config.database.path.trim().is_empty() {
        errors.push(validation("database.path must not be empty"));
    }

    check_remote(
        &mut errors,
        "backend",
        &config.backend.scheme,
        &config.backend.host,
        config.backend.timeout_ms,
        config.backend.max_attempts,
        config.backend.base_delay_ms,
        config.backend.max_delay_ms,
    );

    if config.policy.validate_groups {
        check_remote(
            &mut errors,
            "policy",
            &config.policy.scheme,
            &config.policy.host,
            config.policy.timeout_ms,
            config.policy.max_attempts,
            config.policy.base_delay_ms,
            config.policy.max_delay_ms,
        );
    }

    if config.security.require_consent && config.security.consent_host.trim().is_empty() {
        errors.push(validation(
            "security.consent_host must not be empty when require_consent is set",
        ));
    }

    if let Err(reason) = config.encryption.decode_key() {
        errors.push(validation(format!("encryption.key is invalid: {reason}")));
    }

    if config.dashboard.max_cards == 0 {
        errors.push(validation("dashboard.max_cards must be at least 1"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[allow(clippy::too_many_arguments)]
fn check_remote(
    errors: &mut Vec<ConfigError>,
    section: &str,
    scheme: &str,
    host: &str,
    timeout_ms: u64,
    max_attempts: u32,
    base_delay_ms: u64,
    max_delay_ms: u64,
) {
    if !SCHEMES.contains(&scheme) {
        errors.push(validation(format!(
            "{section}.scheme must be http or https, got `{scheme}`"
        )));
    }
    if host.trim().is_empty() {
        errors.push(validation(format!("{section}.host must not be empty")));
    }
    if timeout_ms == 0 {
        errors.push(validation(format!("{section}.timeout_ms must be positive")));
    }
    if max_attempts == 0 {
        errors.push(validation(format!("{section}.max_attempts must be at least 1")));
    }
    if base_delay_ms > max_delay_ms {
        errors.push(validation(format!(
            "{section}.base_delay_ms ({base_delay_ms}) must not exceed max_delay_ms ({max_delay_ms})"
        )));
    }
}

fn validation(message: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        message: message.into(),
    }
}

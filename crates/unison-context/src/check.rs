// SPDX-FileCopyrightText: 2026 Unison Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `unison-context config check`: print the effective settings.

use unison_config::ContextConfig;

/// Human-readable summary of `config`. Secrets are never printed; the
/// encryption key is reported only as enabled or disabled.
pub fn render_summary(config: &ContextConfig) -> String {
    let encryption = match config.encryption.decode_key() {
        Ok(Some(_)) => "enabled",
        Ok(None) => "disabled (plaintext)",
        Err(_) => "invalid key",
    };
    let policy = if config.policy.validate_groups {
        config.policy.base_url()
    } else {
        "disabled".to_string()
    };
    let consent = if config.security.require_consent {
        config.security.consent_url()
    } else {
        "disabled".to_string()
    };

    let rows = [
        ("service.name", config.service.name.clone()),
        (
            "service.listen",
            format!("{}:{}", config.service.bind_address, config.service.port),
        ),
        ("service.log_level", config.service.log_level.clone()),
        (
            "service.max_concurrent_requests",
            config.service.max_concurrent_requests.to_string(),
        ),
        (
            "service.request_timeout_ms",
            config.service.request_timeout_ms.to_string(),
        ),
        ("backend.url", config.backend.base_url()),
        (
            "backend.retry",
            format!(
                "{} attempts, {}ms base, {}ms timeout",
                config.backend.max_attempts, config.backend.base_delay_ms, config.backend.timeout_ms
            ),
        ),
        ("database.path", config.database.path.clone()),
        ("database.wal_mode", config.database.wal_mode.to_string()),
        ("policy.groups", policy),
        ("security.consent", consent),
        ("encryption", encryption.to_string()),
        ("dashboard.max_cards", config.dashboard.max_cards.to_string()),
        ("prometheus.enabled", config.prometheus.enabled.to_string()),
    ];

    let width = rows.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
    let mut out = String::new();
    for (key, value) in rows {
        out.push_str(&format!("{key:<width$}  {value}\n"));
    }
    out
}

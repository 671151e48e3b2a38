// SPDX-FileCopyrightText: 2026 Unison Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the configuration system.

use unison_config::diagnostic::ConfigError;
use unison_config::{load_and_validate_str, load_config, load_config_from_str};

/// Valid TOML with all sections deserializes successfully.
#[test]
fn valid_toml_deserializes_into_context_config() {
    let toml = r#"
[service]
name = "ctx"
bind_address = "127.0.0.1"
port = 9100
log_level = "debug"

[backend]
host = "kv"
port = 9000
max_attempts = 5

[database]
path = "/tmp/ctx.db"
wal_mode = false

[policy]
validate_groups = true
host = "policy.internal"

[security]
require_consent = true

[dashboard]
max_cards = 25

[prometheus]
enabled = false
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.service.name, "ctx");
    assert_eq!(config.service.port, 9100);
    assert_eq!(config.backend.base_url(), "http://kv:9000");
    assert_eq!(config.backend.max_attempts, 5);
    assert_eq!(config.database.path, "/tmp/ctx.db");
    assert!(!config.database.wal_mode);
    assert!(config.policy.validate_groups);
    assert!(config.security.require_consent);
    assert_eq!(config.dashboard.max_cards, 25);
    assert!(!config.prometheus.enabled);
}

/// Unknown field produces a diagnostic with a suggestion.
#[test]
fn unknown_field_in_backend_suggests_correction() {
    let toml = r#"
[backend]
hots = "kv"
"#;

    let errors = load_and_validate_str(toml).expect_err("should reject unknown field");
    let found = errors.iter().any(|e| {
        matches!(
            e,
            ConfigError::UnknownKey { key, suggestion, .. }
                if key == "hots" && suggestion.as_deref() == Some("host")
        )
    });
    assert!(found, "expected UnknownKey(hots -> host), got: {errors:?}");
}

/// Wrong value type is reported as InvalidType.
#[test]
fn wrong_type_is_reported() {
    let toml = r#"
[dashboard]
max_cards = "lots"
"#;
    let errors = load_and_validate_str(toml).expect_err("should reject string for usize");
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::InvalidType { .. })),
        "got: {errors:?}"
    );
}

/// Semantic validation runs after a clean parse.
#[test]
fn semantic_validation_rejects_zero_cards() {
    let errors = load_and_validate_str("[dashboard]\nmax_cards = 0\n").unwrap_err();
    assert!(errors[0].to_string().contains("max_cards"));
}

#[test]
fn settings_defaults_without_env() {
    figment::Jail::expect_with(|_jail| {
        let config = load_config()?;
        assert_eq!(config.backend.host, "storage");
        assert_eq!(config.backend.port, 8082);
        assert!(!config.security.require_consent);
        Ok(())
    });
}

/// Legacy flat environment names keep working.
#[test]
fn settings_env_overrides() {
    figment::Jail::expect_with(|jail| {
        jail.set_env("UNISON_STORAGE_HOST", "context-storage");
        jail.set_env("UNISON_STORAGE_PORT", "9000");
        jail.set_env("UNISON_REQUIRE_CONSENT", "TRUE");
        jail.set_env("UNISON_DASHBOARD_MAX_CARDS", "12");
        jail.set_env("UNISON_ALLOWED_HOSTS", "testclient,localhost");

        let config = load_config()?;
        assert_eq!(config.backend.host, "context-storage");
        assert_eq!(config.backend.port, 9000);
        assert!(config.security.require_consent);
        assert_eq!(config.dashboard.max_cards, 12);
        Ok(())
    });
}

/// Switches take the legacy truthy and falsy spellings in any case.
#[test]
fn env_switches_accept_legacy_spellings() {
    for (raw, expected) in [
        ("True", true),
        ("1", true),
        ("yes", true),
        ("ON", true),
        ("0", false),
        ("off", false),
        ("No", false),
    ] {
        figment::Jail::expect_with(|jail| {
            jail.set_env("UNISON_REQUIRE_CONSENT", raw);
            jail.set_env("UNISON_PROMETHEUS_ENABLED", raw);
            let config = load_config()?;
            assert_eq!(config.security.require_consent, expected, "{raw}");
            assert_eq!(config.prometheus.enabled, expected, "{raw}");
            Ok(())
        });
    }
}

#[test]
fn env_switch_rejects_unknown_spelling() {
    figment::Jail::expect_with(|jail| {
        jail.set_env("UNISON_REQUIRE_CONSENT", "sometimes");
        assert!(load_config().is_err());
        Ok(())
    });
}

/// Local file is layered under env overrides.
#[test]
fn local_file_then_env() {
    figment::Jail::expect_with(|jail| {
        jail.create_file(
            "unison-context.toml",
            r#"
[backend]
host = "from-file"
port = 7000
"#,
        )?;
        jail.set_env("UNISON_BACKEND_PORT", "7001");

        let config = load_config()?;
        assert_eq!(config.backend.host, "from-file");
        assert_eq!(config.backend.port, 7001);
        Ok(())
    });
}

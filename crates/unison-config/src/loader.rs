// SPDX-FileCopyrightText: 2026 Unison Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./unison-context.toml` > `~/.config/unison/context.toml`
//! > `/etc/unison/context.toml` with environment variable overrides via `UNISON_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::ContextConfig;
use crate::{LOCAL_CONFIG_FILE, SYSTEM_CONFIG_FILE};

/// Legacy flat environment names, mapped to their section keys.
const ENV_ALIASES: &[(&str, &str)] = &[
    ("storage_host", "backend.host"),
    ("storage_port", "backend.port"),
    ("require_consent", "security.require_consent"),
    ("context_encryption_key", "encryption.key"),
];

/// Config sections that accept `UNISON_<SECTION>_<FIELD>` overrides.
const ENV_SECTIONS: &[&str] = &[
    "service",
    "backend",
    "database",
    "policy",
    "security",
    "encryption",
    "dashboard",
    "prometheus",
];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/unison/context.toml` (system-wide)
/// 3. `~/.config/unison/context.toml` (user XDG config)
/// 4. `./unison-context.toml` (local directory)
/// 5. `UNISON_*` environment variables
pub fn load_config() -> Result<ContextConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<ContextConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ContextConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<ContextConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ContextConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(ContextConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_FILE))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("unison/context.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file(LOCAL_CONFIG_FILE))
        .merge(env_provider())
}

/// Map a prefix-stripped, lowercased env key to its dotted config path.
///
/// Returns `None` for keys this service does not own, so unrelated `UNISON_*`
/// variables in a shared environment never trip `deny_unknown_fields`.
pub fn map_env_key(key: &str) -> Option<String> {
    let key = key.to_ascii_lowercase();
    let key = key.as_str();
    if let Some((_, target)) = ENV_ALIASES.iter().find(|(alias, _)| *alias == key) {
        return Some((*target).to_string());
    }
    ENV_SECTIONS.iter().find_map(|section| {
        key.strip_prefix(section)
            .and_then(|rest| rest.strip_prefix('_'))
            .filter(|field| !field.is_empty())
            .map(|field| format!("{section}.{field}"))
    })
}

/// Create the environment variable provider.
///
/// Uses explicit mapping instead of `Env::split("_")`: field names contain
/// underscores (`UNISON_BACKEND_MAX_ATTEMPTS` is `backend.max_attempts`).
fn env_provider() -> Env {
    Env::prefixed("UNISON_")
        .filter(|key| map_env_key(key.as_str()).is_some())
        .map(|key| {
            map_env_key(key.as_str())
                .unwrap_or_else(|| key.as_str().to_string())
                .into()
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_map_to_sections() {
        assert_eq!(map_env_key("storage_host").as_deref(), Some("backend.host"));
        assert_eq!(
            map_env_key("require_consent").as_deref(),
            Some("security.require_consent")
        );
    }

    #[test]
    fn section_fields_keep_underscores() {
        assert_eq!(
            map_env_key("backend_max_attempts").as_deref(),
            Some("backend.max_attempts")
        );
        assert_eq!(
            map_env_key("dashboard_max_cards").as_deref(),
            Some("dashboard.max_cards")
        );
    }

    #[test]
    fn foreign_keys_are_ignored() {
        assert_eq!(map_env_key("allowed_hosts"), None);
        assert_eq!(map_env_key("backend"), None);
        assert_eq!(map_env_key("backend_"), None);
    }
}

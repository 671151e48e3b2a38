// SPDX-FileCopyrightText: 2026 Unison Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Config load failures as miette diagnostics.
//!
//! Every error names the dotted key and the layer it came from (a TOML file
//! or the `UNISON_` environment), and unknown keys get a Jaro-Winkler
//! "did you mean" suggestion.

#![allow(unused_assignments)] // miette's Diagnostic derive generates code triggering this lint

use figment::error::Kind;
use miette::Diagnostic;
use thiserror::Error;

/// Minimum Jaro-Winkler similarity score to suggest a correction.
const SUGGESTION_THRESHOLD: f64 = 0.75;

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("unknown configuration key `{key}` in [{section}] ({origin})")]
    #[diagnostic(
        code(unison::config::unknown_key),
        help("{}", unknown_key_help(suggestion.as_deref(), valid_keys))
    )]
    UnknownKey {
        key: String,
        section: String,
        suggestion: Option<String>,
        valid_keys: String,
        origin: String,
    },

    #[error("invalid type for `{key}` ({origin}): found {found}")]
    #[diagnostic(code(unison::config::invalid_type), help("expected {expected}"))]
    InvalidType {
        key: String,
        found: String,
        expected: String,
        origin: String,
    },

    /// Right type, unusable value (for example a switch set to `sometimes`).
    #[error("invalid value for `{key}` ({origin}): {found}")]
    #[diagnostic(code(unison::config::invalid_value), help("expected {expected}"))]
    InvalidValue {
        key: String,
        found: String,
        expected: String,
        origin: String,
    },

    /// Semantic check failed after a clean parse.
    #[error("validation error: {message}")]
    #[diagnostic(code(unison::config::validation))]
    Validation { message: String },

    #[error("configuration error: {0}")]
    #[diagnostic(code(unison::config::other))]
    Other(String),
}

fn unknown_key_help(suggestion: Option<&str>, valid_keys: &str) -> String {
    match suggestion {
        Some(s) => format!("did you mean `{s}`? Valid keys: {valid_keys}"),
        None => format!("valid keys: {valid_keys}"),
    }
}

/// Convert every error held by a `figment::Error`.
pub fn figment_to_config_errors(err: figment::Error) -> Vec<ConfigError> {
    err.into_iter()
        .map(|error| {
            let origin = origin_of(&error);
            let path = error.path.join(".");
            match &error.kind {
                Kind::UnknownField(field, expected) => ConfigError::UnknownKey {
                    key: field.clone(),
                    section: if path.is_empty() { "root".to_string() } else { path },
                    suggestion: suggest_key(field, expected),
                    valid_keys: expected.join(", "),
                    origin,
                },
                Kind::InvalidType(found, expected) => ConfigError::InvalidType {
                    key: path,
                    found: found.to_string(),
                    expected: expected.clone(),
                    origin,
                },
                Kind::InvalidValue(found, expected) => ConfigError::InvalidValue {
                    key: path,
                    found: found.to_string(),
                    expected: expected.clone(),
                    origin,
                },
                _ => ConfigError::Other(error.to_string()),
            }
        })
        .collect()
}

/// Which provider supplied the offending value.
fn origin_of(error: &figment::Error) -> String {
    match error.metadata.as_ref() {
        Some(meta) => match meta.source.as_ref() {
            Some(source) => format!("{} {source}", meta.name),
            None => meta.name.to_string(),
        },
        None => "built-in defaults".to_string(),
    }
}

/// Closest valid key above the similarity threshold.
pub fn suggest_key(unknown: &str, valid_keys: &[&str]) -> Option<String> {
    valid_keys
        .iter()
        .map(|key| (strsim::jaro_winkler(unknown, key), *key))
        .filter(|(score, _)| *score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, key)| key.to_string())
}

/// Render a list of `ConfigError`s to stderr using miette's graphical handler.
pub fn render_errors(errors: &[ConfigError]) {
    let handler = miette::GraphicalReportHandler::new();
    for error in errors {
        let mut buf = String::new();
        if handler.render_report(&mut buf, error as &dyn Diagnostic).is_ok() {
            eprint!("{buf}");
        } else {
            eprintln!("Error: {error}");
        }
    }
}

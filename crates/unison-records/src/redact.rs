// SPDX-FileCopyrightText: 2026 Unison Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! PII masking for profile reads.

use serde_json::{Map, Value};

/// Field names whose values are always masked, compared case-insensitively.
pub const SENSITIVE_KEYS: &[&str] = &[
    "pin",
    "password",
    "auth",
    "faceprint",
    "voiceprint",
    "biometric",
    "token",
    "secret",
];

/// Replacement for masked values.
pub const MASK: &str = "***";

fn is_sensitive(key: &str) -> bool {
    SENSITIVE_KEYS
        .iter()
        .any(|sensitive| key.eq_ignore_ascii_case(sensitive))
}

/// A copy of `value` with every sensitive field masked, at any depth.
pub fn redact(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut out = Map::with_capacity(map.len());
            for (key, inner) in map {
                let masked = if is_sensitive(key) {
                    Value::String(MASK.to_string())
                } else {
                    redact(inner)
                };
                out.insert(key.clone(), masked);
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(redact).collect()),
        other => other.clone(),
    }
}

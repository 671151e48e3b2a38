// SPDX-FileCopyrightText: 2026 Unison Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Allow-list sanitizer for the `payments` section of a profile.

use serde_json::{Map, Value};

/// Fields an instrument may keep.
pub const INSTRUMENT_FIELDS: &[&str] = &[
    "id",
    "type",
    "brand",
    "provider",
    "label",
    "last4",
    "exp_month",
    "exp_year",
    "is_default",
];

/// Reduce a `last4`-style value to its final four characters.
fn trailing_four(value: &Value) -> Option<Value> {
    let text = match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    let skip = text.chars().count().saturating_sub(4);
    Some(Value::String(text.chars().skip(skip).collect()))
}

fn sanitize_instrument(instrument: &Map<String, Value>) -> Map<String, Value> {
    let mut clean = Map::new();
    for (key, value) in instrument {
        if !INSTRUMENT_FIELDS.contains(&key.as_str()) {
            continue;
        }
        if key.to_ascii_lowercase().ends_with("last4") {
            if let Some(v) = trailing_four(value) {
                clean.insert(key.clone(), v);
            }
        } else {
            clean.insert(key.clone(), value.clone());
        }
    }
    clean
}

/// Sanitize a `payments` value. Always returns an object.
pub fn sanitize_payments(payments: &Value) -> Value {
    let Value::Object(payments) = payments else {
        return Value::Object(Map::new());
    };

    let mut clean = Map::new();

    if let Some(Value::Array(instruments)) = payments.get("instruments") {
        let kept: Vec<Value> = instruments
            .iter()
            .filter_map(Value::as_object)
            .map(|instrument| Value::Object(sanitize_instrument(instrument)))
            .collect();
        clean.insert("instruments".to_string(), Value::Array(kept));
    }

    if let Some(preferences @ Value::Object(_)) = payments.get("preferences") {
        clean.insert("preferences".to_string(), preferences.clone());
    }

    if let Some(default_id @ Value::String(_)) = payments.get("default_instrument_id") {
        clean.insert("default_instrument_id".to_string(), default_id.clone());
    }

    Value::Object(clean)
}

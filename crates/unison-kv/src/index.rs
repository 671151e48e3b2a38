// SPDX-FileCopyrightText: 2026 Unison Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The Tier-B export index.
//!
//! One entry per person at `index:{person_id}:profile`, holding the
//! deduplicated list of every key ever written at tier B.

use serde_json::Value;

/// Key under which a person's Tier-B index is stored.
pub fn index_key(person_id: &str) -> String {
    format!("index:{person_id}:profile")
}

/// Read an index value. Anything that is not a list of strings counts as
/// empty; non-string members are skipped.
pub fn index_entries(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}

/// Union `new_keys` into `existing`, keeping first-seen order.
pub fn merge(existing: Vec<String>, new_keys: &[String]) -> Vec<String> {
    let mut merged: Vec<String> = Vec::with_capacity(existing.len() + new_keys.len());
    for key in existing.into_iter().chain(new_keys.iter().cloned()) {
        if !merged.contains(&key) {
            merged.push(key);
        }
    }
    merged
}

// SPDX-FileCopyrightText: 2026 Unison Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable key/value backend contract.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ContextError;
use crate::traits::adapter::PluginAdapter;

/// Remote durable store addressed by opaque string keys.
///
/// Implementations own their retry and timeout budget: a call returns once
/// the budget is spent, it never hangs. Callers treat `Err` from `put` as a
/// failed durable write and `Err` from `get` as a miss.
#[async_trait]
pub trait KvBackend: PluginAdapter {
    /// Store `value` under `key`, overwriting any prior value.
    async fn put(&self, key: &str, value: &Value) -> Result<(), ContextError>;

    /// Fetch the value stored under `key`. `Ok(None)` is a clean miss.
    async fn get(&self, key: &str) -> Result<Option<Value>, ContextError>;
}

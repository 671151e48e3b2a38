// SPDX-FileCopyrightText: 2026 Unison Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory durable backend.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;
use unison_core::{AdapterType, ContextError, HealthStatus, KvBackend, PluginAdapter};

/// Backend double. While [`set_available(false)`](Self::set_available) is in
/// effect every call fails the way an exhausted retry budget would.
#[derive(Debug, Default)]
pub struct InMemoryKvBackend {
    entries: Mutex<HashMap<String, Value>>,
    unavailable: AtomicBool,
    puts: AtomicUsize,
    gets: AtomicUsize,
}

impl InMemoryKvBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_available(&self, available: bool) {
        self.unavailable.store(!available, Ordering::SeqCst);
    }

    /// Store a value directly, bypassing the outage switch and counters.
    pub fn seed(&self, key: &str, value: Value) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_string(), value);
        }
    }

    /// What the backend currently holds for `key`.
    pub fn stored(&self, key: &str) -> Option<Value> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    pub fn get_count(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> Result<(), ContextError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(ContextError::Backend {
                message: "backend unavailable".to_string(),
                source: None,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl PluginAdapter for InMemoryKvBackend {
    fn name(&self) -> &str {
        "memory-kv"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::KvBackend
    }

    async fn health_check(&self) -> Result<HealthStatus, ContextError> {
        Ok(match self.check_available() {
            Ok(()) => HealthStatus::Healthy,
            Err(e) => HealthStatus::Unhealthy(e.to_string()),
        })
    }

    async fn shutdown(&self) -> Result<(), ContextError> {
        Ok(())
    }
}

#[async_trait]
impl KvBackend for InMemoryKvBackend {
    async fn put(&self, key: &str, value: &Value) -> Result<(), ContextError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| ContextError::Internal(format!("backend double poisoned: {e}")))?;
        entries.insert(key.to_string(), value.clone());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Value>, ContextError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        Ok(self.stored(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn outage_switch_fails_calls() {
        let backend = InMemoryKvBackend::new();
        backend.put("k", &json!(1)).await.unwrap();
        backend.set_available(false);
        assert!(backend.get("k").await.is_err());
        assert!(!backend.health_check().await.unwrap().is_healthy());
        backend.set_available(true);
        assert_eq!(backend.get("k").await.unwrap(), Some(json!(1)));
        assert_eq!(backend.put_count(), 1);
        assert_eq!(backend.get_count(), 2);
    }
}

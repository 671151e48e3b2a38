// SPDX-FileCopyrightText: 2026 Unison Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Two-level key/value store: in-process cache in front of the durable
//! backend.
//!
//! Writes go to the cache unconditionally and then to the backend; a failed
//! backend write degrades the result (`storage_ok: false`) but is never
//! rolled back. Reads ask the backend first and fall back to the cache.
//! There is no transaction across the two levels and no reconciliation
//! beyond subsequent reads and writes.

use std::sync::Arc;

use futures::future::join_all;
use serde_json::{Map, Value};
use tracing::{debug, warn};
use unison_core::{KvBackend, MemoryCache, Rejection};
use unison_prometheus::record_backend_degraded;

use crate::index::{index_entries, index_key, merge};
use crate::namespace::validate;

/// The shared key/value cache.
pub type KvCache = MemoryCache<String, Value>;

/// Result of an admitted [`TieredKvStore::put`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PutOutcome {
    /// Items written (always the full batch).
    pub count: usize,
    /// False if any durable write failed.
    pub storage_ok: bool,
}

pub struct TieredKvStore {
    cache: Arc<KvCache>,
    backend: Arc<dyn KvBackend>,
}

impl TieredKvStore {
    pub fn new(cache: Arc<KvCache>, backend: Arc<dyn KvBackend>) -> Self {
        Self { cache, backend }
    }

    pub fn cache(&self) -> &Arc<KvCache> {
        &self.cache
    }

    pub fn backend(&self) -> &Arc<dyn KvBackend> {
        &self.backend
    }

    /// Validate and write a batch for one person.
    ///
    /// The whole batch is validated before anything is written. Tier-B
    /// batches then merge their keys into the person's export index.
    pub async fn put(
        &self,
        person_id: &str,
        tier: &str,
        items: &Map<String, Value>,
    ) -> Result<PutOutcome, Rejection> {
        let tier = validate(person_id, tier, items.keys().map(String::as_str))?;

        for (key, value) in items {
            self.cache.insert(key.clone(), value.clone());
        }

        let writes = items
            .iter()
            .map(|(key, value)| async move { (key, self.backend.put(key, value).await) });
        let mut failed = 0;
        for (key, result) in join_all(writes).await {
            if let Err(e) = result {
                warn!(key = %key, error = %e, "durable write failed, value held in cache only");
                record_backend_degraded("kv.put");
                failed += 1;
            }
        }
        let storage_ok = failed == 0;

        if tier.is_indexed() && !items.is_empty() {
            let keys: Vec<String> = items.keys().cloned().collect();
            if failed == items.len() {
                // Backend already spent its retry budget on every item.
                self.merge_cached_index(person_id, &keys);
            } else {
                self.merge_index(person_id, &keys).await;
            }
        }

        debug!(person_id, %tier, count = items.len(), storage_ok, "kv put");
        Ok(PutOutcome {
            count: items.len(),
            storage_ok,
        })
    }

    /// Read every key, durable backend first. Unknown keys map to null.
    pub async fn get(&self, keys: &[String]) -> Map<String, Value> {
        let reads = keys
            .iter()
            .map(|key| async move { (key, self.read(key).await) });

        let mut values = Map::new();
        for (key, value) in join_all(reads).await {
            values.insert(key.clone(), value.unwrap_or(Value::Null));
        }
        values
    }

    /// Cache-only write with no namespace checks.
    pub fn set(&self, key: &str, value: Value) {
        self.cache.insert(key.to_string(), value);
    }

    /// One key: backend, then cache.
    pub async fn read(&self, key: &str) -> Option<Value> {
        match self.backend.get(key).await {
            Ok(Some(value)) => Some(value),
            Ok(None) => self.cache.get(key),
            Err(e) => {
                warn!(key, error = %e, "durable read failed, falling back to cache");
                record_backend_degraded("kv.get");
                self.cache.get(key)
            }
        }
    }

    /// Read-merge-write of the Tier-B index. Not atomic across writers;
    /// the durable write is best-effort.
    async fn merge_index(&self, person_id: &str, new_keys: &[String]) {
        let key = index_key(person_id);
        let existing = index_entries(self.read(&key).await.as_ref());
        let merged = Value::from(merge(existing, new_keys));

        self.cache.insert(key.clone(), merged.clone());
        if let Err(e) = self.backend.put(&key, &merged).await {
            warn!(person_id, error = %e, "index write failed, index held in cache only");
            record_backend_degraded("kv.index");
        }
    }

    /// Index merge against the cache only, for batches that never reached
    /// the backend.
    fn merge_cached_index(&self, person_id: &str, new_keys: &[String]) {
        let key = index_key(person_id);
        let existing = index_entries(self.cache.get(&key).as_ref());
        self.cache.insert(key, Value::from(merge(existing, new_keys)));
        record_backend_degraded("kv.index");
    }
}

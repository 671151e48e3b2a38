// SPDX-FileCopyrightText: 2026 Unison Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Data-portability export of a person's Tier-B keys.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;
use unison_core::now_epoch_secs;
use unison_core::types::PROFILE_SEGMENT;

use crate::index::{index_entries, index_key};
use crate::tiered::TieredKvStore;

/// A person's exported dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportReport {
    pub person_id: String,
    pub items: Map<String, Value>,
    /// Seconds since the Unix epoch.
    pub exported_at: f64,
}

/// Rebuilds a person's Tier-B dataset from the export index and the cache.
pub struct ExportEngine {
    store: Arc<TieredKvStore>,
}

impl ExportEngine {
    pub fn new(store: Arc<TieredKvStore>) -> Self {
        Self { store }
    }

    /// Collect every `{person_id}:...:profile:...` key the index or the
    /// cache knows about, with its current value. Never fails; an unknown
    /// person yields an empty map.
    pub async fn export(&self, person_id: &str) -> ExportReport {
        let prefix = format!("{person_id}:");
        let belongs = |key: &str| key.starts_with(&prefix) && key.contains(PROFILE_SEGMENT);

        let indexed = self.store.read(&index_key(person_id)).await;
        let mut keys: Vec<String> = index_entries(indexed.as_ref())
            .into_iter()
            .filter(|key| belongs(key))
            .collect();
        for key in self.store.cache().keys_where(|key| belongs(key)) {
            if !keys.contains(&key) {
                keys.push(key);
            }
        }

        let items: Map<String, Value> = self
            .store
            .get(&keys)
            .await
            .into_iter()
            .filter(|(_, value)| !value.is_null())
            .collect();

        debug!(person_id, count = items.len(), "export assembled");
        ExportReport {
            person_id: person_id.to_string(),
            items,
            exported_at: now_epoch_secs(),
        }
    }
}

// SPDX-FileCopyrightText: 2026 Unison Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dashboard state store.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, error};
use unison_core::{now_epoch_secs, Rejection, StoredRecord};
use unison_prometheus::record_decrypt_fallback;
use unison_storage::queries::dashboards;
use unison_storage::{Database, DashboardRow};
use unison_vault::PayloadCipher;

const RECORD: &str = "dashboard";

/// Default upper bound on stored cards.
pub const DEFAULT_MAX_CARDS: usize = 100;

pub struct DashboardStore {
    db: Arc<Database>,
    cipher: PayloadCipher,
    max_cards: usize,
}

/// Normalize a dashboard for storage.
///
/// Non-object cards are dropped and the list is truncated to `max_cards`
/// without error. `preferences` is forced to an object and `person_id` is
/// stamped from the owner.
pub fn normalize(
    person_id: &str,
    dashboard: &Value,
    max_cards: usize,
) -> Result<Map<String, Value>, Rejection> {
    let Value::Object(fields) = dashboard else {
        return Err(Rejection::InvalidDashboard);
    };

    let cards = match fields.get("cards") {
        None => Vec::new(),
        Some(Value::Array(cards)) => cards
            .iter()
            .filter(|card| card.is_object())
            .take(max_cards)
            .cloned()
            .collect(),
        Some(_) => return Err(Rejection::InvalidDashboardCards),
    };

    let mut normalized = fields.clone();
    normalized.insert("cards".to_string(), Value::Array(cards));
    if !matches!(normalized.get("preferences"), Some(Value::Object(_))) {
        normalized.insert("preferences".to_string(), Value::Object(Map::new()));
    }
    normalized.insert("person_id".to_string(), Value::String(person_id.to_string()));
    Ok(normalized)
}

impl DashboardStore {
    pub fn new(db: Arc<Database>, cipher: PayloadCipher, max_cards: usize) -> Self {
        Self {
            db,
            cipher,
            max_cards,
        }
    }

    pub async fn put(&self, person_id: &str, dashboard: &Value) -> Result<(), Rejection> {
        if person_id.is_empty() {
            return Err(Rejection::InvalidPersonId);
        }
        let normalized = normalize(person_id, dashboard, self.max_cards)?;
        let cards = normalized
            .get("cards")
            .and_then(Value::as_array)
            .map_or(0, Vec::len);

        let failed = || Rejection::StorageFailed {
            record: StoredRecord::Dashboard,
        };
        let blob = self.cipher.encode(&Value::Object(normalized)).map_err(|e| {
            error!(person_id, error = %e, "failed to encode dashboard");
            failed()
        })?;

        let row = DashboardRow {
            person_id: person_id.to_string(),
            dashboard_blob: blob,
            updated_at: now_epoch_secs(),
        };
        dashboards::upsert_dashboard(&self.db, &row)
            .await
            .map_err(|e| {
                error!(person_id, error = %e, "failed to persist dashboard");
                failed()
            })?;

        debug!(person_id, cards, "dashboard stored");
        Ok(())
    }

    /// Stored dashboard annotated with `updated_at` and `person_id`, or
    /// `Ok(None)` when absent.
    pub async fn get(&self, person_id: &str) -> Result<Option<Value>, Rejection> {
        let row = dashboards::get_dashboard(&self.db, person_id)
            .await
            .map_err(|e| {
                error!(person_id, error = %e, "failed to read dashboard");
                Rejection::StorageFailed {
                    record: StoredRecord::Dashboard,
                }
            })?;
        let Some(row) = row else {
            return Ok(None);
        };

        let decoded = self.cipher.decode(RECORD, &row.dashboard_blob);
        if decoded.fallback {
            record_decrypt_fallback(RECORD);
        }

        let mut dashboard = match decoded.value {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        dashboard.insert("updated_at".to_string(), Value::from(row.updated_at));
        dashboard.insert("person_id".to_string(), Value::String(person_id.to_string()));
        Ok(Some(Value::Object(dashboard)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use unison_test_utils::TestHarness;

    #[tokio::test]
    async fn persistence_failure_is_dashboard_store_failed() {
        let harness = TestHarness::new().await.unwrap();
        let store = DashboardStore::new(harness.database.clone(), harness.cipher.clone(), 10);
        harness.break_table("person_dashboards").await.unwrap();

        let err = store.put("p1", &json!({"cards": []})).await.unwrap_err();
        assert_eq!(err.code(), "dashboard-store-failed");
        let err = store.get("p1").await.unwrap_err();
        assert_eq!(err.code(), "dashboard-store-failed");
    }

    #[test]
    fn rejects_non_object_and_bad_cards() {
        assert_eq!(
            normalize("p1", &json!("not-a-dict"), 10),
            Err(Rejection::InvalidDashboard)
        );
        assert_eq!(
            normalize("p1", &json!({"cards": "nope"}), 10),
            Err(Rejection::InvalidDashboardCards)
        );
        assert_eq!(
            normalize("p1", &json!({"cards": null}), 10),
            Err(Rejection::InvalidDashboardCards)
        );
    }

    #[test]
    fn fills_defaults_and_stamps_owner() {
        let normalized = normalize("p1", &json!({"person_id": "someone-else", "preferences": 3}), 10).unwrap();
        assert_eq!(
            Value::Object(normalized),
            json!({"person_id": "p1", "cards": [], "preferences": {}})
        );
    }

    #[test]
    fn filters_then_truncates_cards() {
        let cards: Vec<Value> = (0..150)
            .map(|i| if i % 10 == 0 { json!("junk") } else { json!({"id": i}) })
            .collect();
        let normalized = normalize("p1", &json!({"cards": cards}), DEFAULT_MAX_CARDS).unwrap();
        let kept = normalized["cards"].as_array().unwrap();
        assert_eq!(kept.len(), DEFAULT_MAX_CARDS);
        assert!(kept.iter().all(Value::is_object));
        assert_eq!(kept[0], json!({"id": 1}));
    }
}

// SPDX-FileCopyrightText: 2026 Unison Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Export engine over a tiered store backed by the in-memory double.

use std::sync::Arc;

use serde_json::{json, Map, Value};
use unison_kv::tiered::KvCache;
use unison_kv::{ExportEngine, TieredKvStore};
use unison_test_utils::InMemoryKvBackend;

fn items(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap()
}

fn engine() -> (Arc<InMemoryKvBackend>, Arc<TieredKvStore>, ExportEngine) {
    let backend = Arc::new(InMemoryKvBackend::new());
    let store = Arc::new(TieredKvStore::new(KvCache::shared(), backend.clone()));
    let engine = ExportEngine::new(store.clone());
    (backend, store, engine)
}

#[tokio::test]
async fn exports_tier_b_keys_only() {
    let (_backend, store, engine) = engine();
    store
        .put("p1", "B", &items(json!({"p1:profile:lang": "en", "p1:profile:tz": "UTC"})))
        .await
        .unwrap();
    store
        .put("p1", "A", &items(json!({"p1:prefs:theme": "dark"})))
        .await
        .unwrap();
    store
        .put("p2", "B", &items(json!({"p2:profile:lang": "fr"})))
        .await
        .unwrap();

    let report = engine.export("p1").await;
    assert_eq!(report.person_id, "p1");
    assert_eq!(
        Value::Object(report.items),
        json!({"p1:profile:lang": "en", "p1:profile:tz": "UTC"})
    );
    assert!(report.exported_at > 0.0);
}

#[tokio::test]
async fn unknown_person_exports_nothing() {
    let (_backend, _store, engine) = engine();
    let report = engine.export("ghost").await;
    assert!(report.items.is_empty());
}

#[tokio::test]
async fn index_survives_cache_loss() {
    let (backend, _store, _engine) = engine();
    backend.seed("index:p1:profile", json!(["p1:profile:lang", "p9:profile:x"]));
    backend.seed("p1:profile:lang", json!("de"));
    backend.seed("p9:profile:x", json!("leak"));

    let fresh = Arc::new(TieredKvStore::new(KvCache::shared(), backend.clone()));
    let report = ExportEngine::new(fresh).export("p1").await;
    assert_eq!(Value::Object(report.items), json!({"p1:profile:lang": "de"}));
}

#[tokio::test]
async fn cached_keys_export_during_backend_outage() {
    let (backend, store, engine) = engine();
    backend.set_available(false);
    let outcome = store
        .put("p1", "B", &items(json!({"p1:profile:lang": "en"})))
        .await
        .unwrap();
    assert!(!outcome.storage_ok);

    let report = engine.export("p1").await;
    assert_eq!(report.items.get("p1:profile:lang"), Some(&json!("en")));
}

// SPDX-FileCopyrightText: 2026 Unison Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process read-through/write-through cache.
//!
//! The cache is a shadow of durable storage, not the source of truth. It is
//! owned by the service instance and handed to components as an `Arc`.

use std::borrow::Borrow;
use std::hash::Hash;
use std::sync::Arc;

use dashmap::DashMap;

/// Concurrent map shared between request handlers.
#[derive(Debug)]
pub struct MemoryCache<K, V>
where
    K: Eq + Hash,
{
    entries: DashMap<K, V>,
}

impl<K, V> Default for MemoryCache<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }
}

impl<K, V> MemoryCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Convenience constructor for the common shared-handle case.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    /// Insert or overwrite. Last write wins.
    pub fn insert(&self, key: K, value: V) {
        self.entries.insert(key, value);
    }

    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Snapshot of keys matching `pred`. Iteration order is unspecified.
    pub fn keys_where<F>(&self, pred: F) -> Vec<K>
    where
        F: Fn(&K) -> bool,
    {
        self.entries
            .iter()
            .filter(|entry| pred(entry.key()))
            .map(|entry| entry.key().clone())
            .collect()
    }
}

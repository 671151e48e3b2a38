// SPDX-FileCopyrightText: 2026 Unison Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Unison context service.
//!
//! This crate provides the error taxonomy, shared types, and the adapter
//! traits that the storage, KV, and gateway crates are written against. The
//! in-process [`MemoryCache`] lives here too so that every component receives
//! an explicit shared handle instead of reaching for global state.

pub mod cache;
pub mod error;
pub mod traits;
pub mod types;

pub use cache::MemoryCache;
pub use error::{ContextError, Rejection, StoredRecord};
pub use types::{now_epoch_secs, AdapterType, HealthStatus, Tier};

pub use traits::{KvBackend, PluginAdapter, PolicyDirectory};

// SPDX-FileCopyrightText: 2026 Unison Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tiered person-scoped key/value storage.
//!
//! Writes are admitted by the [`namespace`] validator, land in the in-process
//! cache unconditionally, and are then pushed to the durable backend through
//! [`remote::HttpKvBackend`]. Tier-B writes also maintain a per-person export
//! [`index`], which the [`export`] engine reads back for data-portability
//! requests.

pub mod export;
pub mod index;
pub mod namespace;
pub mod remote;
pub mod tiered;

pub use export::{ExportEngine, ExportReport};
pub use index::index_key;
pub use namespace::validate;
pub use remote::HttpKvBackend;
pub use tiered::{PutOutcome, TieredKvStore};

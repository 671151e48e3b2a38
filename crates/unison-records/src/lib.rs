// SPDX-FileCopyrightText: 2026 Unison Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Relational person records: profiles, dashboards and conversations.
//!
//! Profiles and dashboards are sanitized, serialized, optionally encrypted
//! and upserted as one blob per person. Conversations live in an in-process
//! cache backed by SQLite.

pub mod conversation;
pub mod dashboard;
pub mod payments;
pub mod policy;
pub mod profile;
pub mod redact;

pub use conversation::{ConversationCache, ConversationRecord, ConversationStore};
pub use dashboard::DashboardStore;
pub use policy::HttpPolicyDirectory;
pub use profile::{ProfileStore, ProfileView};
pub use redact::redact;

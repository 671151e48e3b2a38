// SPDX-FileCopyrightText: 2026 Unison Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Row types for the three context tables.
//!
//! Blobs are stored as text exactly as produced by the payload cipher;
//! this crate never interprets them.

use serde::{Deserialize, Serialize};

/// A row of `person_profiles`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileRow {
    pub person_id: String,
    pub profile_blob: String,
    /// Seconds since the Unix epoch.
    pub updated_at: f64,
}

/// A row of `person_dashboards`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardRow {
    pub person_id: String,
    pub dashboard_blob: String,
    pub updated_at: f64,
}

/// A row of `conversations`. `messages` and `response` are JSON text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationRow {
    pub person_id: String,
    pub session_id: String,
    pub messages: String,
    pub response: String,
    pub summary: String,
    pub updated_at: f64,
}

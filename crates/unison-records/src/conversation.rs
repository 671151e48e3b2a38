// SPDX-FileCopyrightText: 2026 Unison Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation session store.
//!
//! Every write lands in the in-process cache first, so a process always
//! reads its own writes even if SQLite is failing. Durable failures are
//! logged and swallowed.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, error, warn};
use unison_core::{now_epoch_secs, MemoryCache};
use unison_storage::queries::conversations;
use unison_storage::{ConversationRow, Database};

/// One conversation session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationRecord {
    pub messages: Vec<Value>,
    pub response: Value,
    pub summary: String,
    /// `None` only for the empty shape returned on a miss.
    pub updated_at: Option<f64>,
}

impl ConversationRecord {
    /// What `load` returns for an unknown session.
    pub fn empty() -> Self {
        Self {
            messages: Vec::new(),
            response: Value::Object(Map::new()),
            summary: String::new(),
            updated_at: None,
        }
    }

    fn from_row(row: ConversationRow) -> Self {
        let messages = match serde_json::from_str::<Value>(&row.messages) {
            Ok(Value::Array(messages)) => messages,
            _ => {
                warn!(person_id = %row.person_id, session_id = %row.session_id, "stored messages unreadable");
                Vec::new()
            }
        };
        let response = serde_json::from_str(&row.response).unwrap_or_else(|_| {
            warn!(person_id = %row.person_id, session_id = %row.session_id, "stored response unreadable");
            Value::Object(Map::new())
        });
        Self {
            messages,
            response,
            summary: row.summary,
            updated_at: Some(row.updated_at),
        }
    }
}

/// Cache keyed by `(person_id, session_id)`.
pub type ConversationCache = MemoryCache<(String, String), ConversationRecord>;

pub struct ConversationStore {
    db: Arc<Database>,
    cache: Arc<ConversationCache>,
}

impl ConversationStore {
    pub fn new(db: Arc<Database>, cache: Arc<ConversationCache>) -> Self {
        Self { db, cache }
    }

    /// Replace a session. Never fails from the caller's point of view.
    pub async fn store(
        &self,
        person_id: &str,
        session_id: &str,
        messages: Vec<Value>,
        response: Value,
        summary: String,
    ) -> ConversationRecord {
        let record = ConversationRecord {
            messages,
            response,
            summary,
            updated_at: Some(now_epoch_secs()),
        };
        self.cache.insert(
            (person_id.to_string(), session_id.to_string()),
            record.clone(),
        );

        match self.to_row(person_id, session_id, &record) {
            Ok(row) => {
                if let Err(e) = conversations::upsert_conversation(&self.db, &row).await {
                    error!(person_id, session_id, error = %e, "failed to persist conversation");
                }
            }
            Err(e) => error!(person_id, session_id, error = %e, "failed to serialize conversation"),
        }

        debug!(person_id, session_id, messages = record.messages.len(), "conversation stored");
        record
    }

    fn to_row(
        &self,
        person_id: &str,
        session_id: &str,
        record: &ConversationRecord,
    ) -> Result<ConversationRow, serde_json::Error> {
        Ok(ConversationRow {
            person_id: person_id.to_string(),
            session_id: session_id.to_string(),
            messages: serde_json::to_string(&record.messages)?,
            response: serde_json::to_string(&record.response)?,
            summary: record.summary.clone(),
            updated_at: record.updated_at.unwrap_or_else(now_epoch_secs),
        })
    }

    /// Cache, then SQLite (populating the cache), then the empty shape.
    pub async fn load(&self, person_id: &str, session_id: &str) -> ConversationRecord {
        let key = (person_id.to_string(), session_id.to_string());
        if let Some(record) = self.cache.get(&key) {
            return record;
        }

        match conversations::get_conversation(&self.db, person_id, session_id).await {
            Ok(Some(row)) => {
                let record = ConversationRecord::from_row(row);
                self.cache.insert(key, record.clone());
                record
            }
            Ok(None) => ConversationRecord::empty(),
            Err(e) => {
                warn!(person_id, session_id, error = %e, "failed to load conversation");
                ConversationRecord::empty()
            }
        }
    }
}

// SPDX-FileCopyrightText: 2026 Unison Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation session upsert and lookup.

use rusqlite::params;
use unison_core::ContextError;

use crate::database::{map_tr_err, Database};
use crate::models::ConversationRow;

/// Replace the session identified by `(person_id, session_id)`.
pub async fn upsert_conversation(db: &Database, row: &ConversationRow) -> Result<(), ContextError> {
    let row = row.clone();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO conversations (person_id, session_id, messages, response, summary, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(person_id, session_id) DO UPDATE SET
                    messages = excluded.messages,
                    response = excluded.response,
                    summary = excluded.summary,
                    updated_at = excluded.updated_at",
                params![
                    row.person_id,
                    row.session_id,
                    row.messages,
                    row.response,
                    row.summary,
                    row.updated_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Fetch one session.
pub async fn get_conversation(
    db: &Database,
    person_id: &str,
    session_id: &str,
) -> Result<Option<ConversationRow>, ContextError> {
    let person_id = person_id.to_string();
    let session_id = session_id.to_string();
    db.connection()
        .call(move |conn| -> Result<Option<ConversationRow>, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT person_id, session_id, messages, response, summary, updated_at
                 FROM conversations WHERE person_id = ?1 AND session_id = ?2",
            )?;
            let result = stmt.query_row(params![person_id, session_id], |row| {
                Ok(ConversationRow {
                    person_id: row.get(0)?,
                    session_id: row.get(1)?,
                    messages: row.get(2)?,
                    response: row.get(3)?,
                    summary: row.get(4)?,
                    updated_at: row.get(5)?,
                })
            });
            match result {
                Ok(row) => Ok(Some(row)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    fn make_row(person_id: &str, session_id: &str, summary: &str) -> ConversationRow {
        ConversationRow {
            person_id: person_id.to_string(),
            session_id: session_id.to_string(),
            messages: r#"[{"role":"user","content":"hi"}]"#.to_string(),
            response: r#"{"text":"hello"}"#.to_string(),
            summary: summary.to_string(),
            updated_at: 1_700_000_000.25,
        }
    }

    #[tokio::test]
    async fn store_and_load_session() {
        let (db, _dir) = setup_db().await;
        upsert_conversation(&db, &make_row("p1", "s1", "greeting")).await.unwrap();

        let row = get_conversation(&db, "p1", "s1").await.unwrap().unwrap();
        assert_eq!(row.summary, "greeting");
        assert_eq!(row.messages, r#"[{"role":"user","content":"hi"}]"#);
        assert_eq!(row.updated_at, 1_700_000_000.25);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn sessions_are_keyed_by_pair() {
        let (db, _dir) = setup_db().await;
        upsert_conversation(&db, &make_row("p1", "s1", "one")).await.unwrap();
        upsert_conversation(&db, &make_row("p1", "s2", "two")).await.unwrap();
        upsert_conversation(&db, &make_row("p2", "s1", "three")).await.unwrap();
        upsert_conversation(&db, &make_row("p1", "s1", "one-again")).await.unwrap();

        assert_eq!(get_conversation(&db, "p1", "s1").await.unwrap().unwrap().summary, "one-again");
        assert_eq!(get_conversation(&db, "p1", "s2").await.unwrap().unwrap().summary, "two");
        assert_eq!(get_conversation(&db, "p2", "s1").await.unwrap().unwrap().summary, "three");
        assert!(get_conversation(&db, "p2", "s2").await.unwrap().is_none());
    }
}

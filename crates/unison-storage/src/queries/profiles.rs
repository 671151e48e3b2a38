// SPDX-FileCopyrightText: 2026 Unison Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `person_profiles` upsert and lookup.

use rusqlite::params;
use unison_core::ContextError;

use crate::database::{map_tr_err, Database};
use crate::models::ProfileRow;

/// Insert or replace the profile row for `row.person_id`.
pub async fn upsert_profile(db: &Database, row: &ProfileRow) -> Result<(), ContextError> {
    let row = row.clone();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO person_profiles (person_id, profile_blob, updated_at)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(person_id) DO UPDATE SET
                    profile_blob = excluded.profile_blob,
                    updated_at = excluded.updated_at",
                params![row.person_id, row.profile_blob, row.updated_at],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Fetch the profile row for a person.
pub async fn get_profile(db: &Database, person_id: &str) -> Result<Option<ProfileRow>, ContextError> {
    let person_id = person_id.to_string();
    db.connection()
        .call(move |conn| -> Result<Option<ProfileRow>, rusqlite::Error> {
            let result = conn.query_row(
                "SELECT person_id, profile_blob, updated_at FROM person_profiles WHERE person_id = ?1",
                params![person_id],
                |row| {
                    Ok(ProfileRow {
                        person_id: row.get(0)?,
                        profile_blob: row.get(1)?,
                        updated_at: row.get(2)?,
                    })
                },
            );
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

    fn row(person_id: &str, blob: &str, updated_at: f64) -> ProfileRow {
        ProfileRow {
            person_id: person_id.to_string(),
            profile_blob: blob.to_string(),
            updated_at,
        }
    }

    #[tokio::test]
    async fn upsert_then_get() {
        let (db, _dir) = setup_db().await;
        upsert_profile(&db, &row("p1", r#"{"name":"ada"}"#, 10.5)).await.unwrap();

        let fetched = get_profile(&db, "p1").await.unwrap().unwrap();
        assert_eq!(fetched.profile_blob, r#"{"name":"ada"}"#);
        assert_eq!(fetched.updated_at, 10.5);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn upsert_replaces_previous_row() {
        let (db, _dir) = setup_db().await;
        upsert_profile(&db, &row("p1", "first", 1.0)).await.unwrap();
        upsert_profile(&db, &row("p1", "second", 2.0)).await.unwrap();

        let fetched = get_profile(&db, "p1").await.unwrap().unwrap();
        assert_eq!(fetched.profile_blob, "second");
        assert_eq!(fetched.updated_at, 2.0);
    }

    #[tokio::test]
    async fn missing_profile_is_none() {
        let (db, _dir) = setup_db().await;
        assert!(get_profile(&db, "nobody").await.unwrap().is_none());
    }
}

// SPDX-FileCopyrightText: 2026 Unison Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `person_dashboards` upsert and lookup.
//!
//! Mirrors the profile table: one row per person, replaced wholesale.

use rusqlite::params;
use unison_core::ContextError;

use crate::database::{map_tr_err, Database};
use crate::models::DashboardRow;

/// Insert or replace the dashboard row for `row.person_id`.
pub async fn upsert_dashboard(db: &Database, row: &DashboardRow) -> Result<(), ContextError> {
    let row = row.clone();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO person_dashboards (person_id, dashboard_blob, updated_at)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(person_id) DO UPDATE SET
                    dashboard_blob = excluded.dashboard_blob,
                    updated_at = excluded.updated_at",
                params![row.person_id, row.dashboard_blob, row.updated_at],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Fetch the dashboard row for a person.
pub async fn get_dashboard(db: &Database, person_id: &str) -> Result<Option<DashboardRow>, ContextError> {
    let person_id = person_id.to_string();
    db.connection()
        .call(move |conn| -> Result<Option<DashboardRow>, rusqlite::Error> {
            let result = conn.query_row(
                "SELECT person_id, dashboard_blob, updated_at FROM person_dashboards WHERE person_id = ?1",
                params![person_id],
                |row| {
                    Ok(DashboardRow {
                        person_id: row.get(0)?,
                        dashboard_blob: row.get(1)?,
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

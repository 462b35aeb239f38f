// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Confirmed bookings.

use rusqlite::params;

use parley_core::ParleyError;
use parley_core::types::{AppointmentDetails, SenderKey};

use crate::database::{Database, map_tr_err};
use crate::models::now_rfc3339;

pub async fn insert(
    db: &Database,
    key: &SenderKey,
    details: &AppointmentDetails,
) -> Result<i64, ParleyError> {
    let raw = serde_json::to_string(details).map_err(|e| ParleyError::Storage {
        source: Box::new(e),
    })?;
    let key = key.clone();
    db.connection()
        .call(move |conn| -> Result<i64, rusqlite::Error> {
            conn.execute(
                "INSERT INTO appointments (owner_id, sender_id, details_json, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![key.owner_id, key.sender_id, raw, now_rfc3339()],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(map_tr_err)
}

/// All appointments recorded for a business, oldest first.
pub async fn list_for_owner(
    db: &Database,
    owner_id: &str,
) -> Result<Vec<(String, AppointmentDetails)>, ParleyError> {
    let owner_id = owner_id.to_string();
    let rows = db
        .connection()
        .call(move |conn| -> Result<Vec<(String, String)>, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT sender_id, details_json FROM appointments
                 WHERE owner_id = ?1 ORDER BY id ASC",
            )?;
            let rows = stmt.query_map(params![owner_id], |row| Ok((row.get(0)?, row.get(1)?)))?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)?;

    rows.into_iter()
        .map(|(sender_id, raw)| {
            serde_json::from_str(&raw)
                .map(|details| (sender_id, details))
                .map_err(|e| ParleyError::Storage {
                    source: Box::new(e),
                })
        })
        .collect()
}

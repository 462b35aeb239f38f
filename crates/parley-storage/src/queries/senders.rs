// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-sender switches and removal.

use rusqlite::{OptionalExtension, params};

use parley_core::ParleyError;
use parley_core::types::SenderKey;

use crate::database::{Database, map_tr_err};
use crate::models::now_rfc3339;

/// Whether the bot answers this sender. Unknown senders are active.
pub async fn is_active(db: &Database, key: &SenderKey) -> Result<bool, ParleyError> {
    let key = key.clone();
    let flag = db
        .connection()
        .call(move |conn| -> Result<Option<bool>, rusqlite::Error> {
            conn.query_row(
                "SELECT bot_active FROM senders WHERE owner_id = ?1 AND sender_id = ?2",
                params![key.owner_id, key.sender_id],
                |row| row.get(0),
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)?;
    Ok(flag.unwrap_or(true))
}

pub async fn set_active(db: &Database, key: &SenderKey, active: bool) -> Result<(), ParleyError> {
    let key = key.clone();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO senders (owner_id, sender_id, bot_active, created_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT (owner_id, sender_id) DO UPDATE SET bot_active = excluded.bot_active",
                params![key.owner_id, key.sender_id, active, now_rfc3339()],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Removes a sender and its whole conversation. Returns the number of deleted messages.
pub async fn delete(db: &Database, key: &SenderKey) -> Result<usize, ParleyError> {
    let key = key.clone();
    db.connection()
        .call(move |conn| -> Result<usize, rusqlite::Error> {
            let tx = conn.transaction()?;
            let removed = tx.execute(
                "DELETE FROM messages WHERE owner_id = ?1 AND sender_id = ?2",
                params![key.owner_id, key.sender_id],
            )?;
            tx.execute(
                "DELETE FROM senders WHERE owner_id = ?1 AND sender_id = ?2",
                params![key.owner_id, key.sender_id],
            )?;
            tx.commit()?;
            Ok(removed)
        })
        .await
        .map_err(map_tr_err)
}

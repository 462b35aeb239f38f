// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Business account settings: bot switch, instruction and published data.

use rusqlite::{OptionalExtension, params};

use parley_core::ParleyError;

use crate::database::{Database, map_tr_err};
use crate::models::now_rfc3339;

/// Whether the bot is switched on for the business. Unknown owners are active.
pub async fn is_bot_active(db: &Database, owner_id: &str) -> Result<bool, ParleyError> {
    let owner_id = owner_id.to_string();
    let flag = db
        .connection()
        .call(move |conn| -> Result<Option<bool>, rusqlite::Error> {
            conn.query_row(
                "SELECT bot_active FROM owners WHERE owner_id = ?1",
                params![owner_id],
                |row| row.get(0),
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)?;
    Ok(flag.unwrap_or(true))
}

pub async fn set_bot_active(db: &Database, owner_id: &str, active: bool) -> Result<(), ParleyError> {
    let owner_id = owner_id.to_string();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO owners (owner_id, bot_active, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT (owner_id) DO UPDATE
                 SET bot_active = excluded.bot_active, updated_at = excluded.updated_at",
                params![owner_id, active, now_rfc3339()],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

pub async fn instruction(db: &Database, owner_id: &str) -> Result<Option<String>, ParleyError> {
    let owner_id = owner_id.to_string();
    let value = db
        .connection()
        .call(move |conn| -> Result<Option<Option<String>>, rusqlite::Error> {
            conn.query_row(
                "SELECT instruction FROM owners WHERE owner_id = ?1",
                params![owner_id],
                |row| row.get(0),
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)?;
    Ok(value.flatten())
}

pub async fn set_instruction(
    db: &Database,
    owner_id: &str,
    instruction: &str,
) -> Result<(), ParleyError> {
    let owner_id = owner_id.to_string();
    let instruction = instruction.to_string();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO owners (owner_id, instruction, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT (owner_id) DO UPDATE
                 SET instruction = excluded.instruction, updated_at = excluded.updated_at",
                params![owner_id, instruction, now_rfc3339()],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Stored business data document, `{}` when the owner has none.
pub async fn business_data(db: &Database, owner_id: &str) -> Result<serde_json::Value, ParleyError> {
    let owner_id = owner_id.to_string();
    let raw = db
        .connection()
        .call(move |conn| -> Result<Option<String>, rusqlite::Error> {
            conn.query_row(
                "SELECT business_data_json FROM owners WHERE owner_id = ?1",
                params![owner_id],
                |row| row.get(0),
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)?;

    match raw {
        Some(raw) => serde_json::from_str(&raw).map_err(|e| ParleyError::Storage {
            source: Box::new(e),
        }),
        None => Ok(serde_json::Value::Object(Default::default())),
    }
}

pub async fn set_business_data(
    db: &Database,
    owner_id: &str,
    data: &serde_json::Value,
) -> Result<(), ParleyError> {
    let owner_id = owner_id.to_string();
    let raw = serde_json::to_string(data).map_err(|e| ParleyError::Storage {
        source: Box::new(e),
    })?;
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO owners (owner_id, business_data_json, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT (owner_id) DO UPDATE
                 SET business_data_json = excluded.business_data_json,
                     updated_at = excluded.updated_at",
                params![owner_id, raw, now_rfc3339()],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

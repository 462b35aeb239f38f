// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation history queries.
//!
//! Every write runs in one transaction on the connection's single thread,
//! so concurrent appends for the same conversation serialize and never
//! reuse a `seq`.

use rusqlite::{Connection, Transaction, params};

use parley_core::ParleyError;
use parley_core::types::{ConversationHistory, ConversationMessage, SenderKey};

use crate::database::{Database, map_tr_err};
use crate::models::{MessageRow, encode_all, now_rfc3339};

fn ensure_sender(tx: &Transaction<'_>, owner_id: &str, sender_id: &str) -> rusqlite::Result<()> {
    tx.execute(
        "INSERT OR IGNORE INTO senders (owner_id, sender_id, bot_active, created_at)
         VALUES (?1, ?2, 1, ?3)",
        params![owner_id, sender_id, now_rfc3339()],
    )?;
    Ok(())
}

fn count_rows(conn: &Connection, owner_id: &str, sender_id: &str) -> rusqlite::Result<usize> {
    conn.query_row(
        "SELECT COUNT(*) FROM messages WHERE owner_id = ?1 AND sender_id = ?2",
        params![owner_id, sender_id],
        |row| row.get::<_, i64>(0),
    )
    .map(|n| n as usize)
}

fn insert_rows(
    tx: &Transaction<'_>,
    owner_id: &str,
    sender_id: &str,
    first_seq: i64,
    rows: &[MessageRow],
) -> rusqlite::Result<()> {
    let mut stmt = tx.prepare(
        "INSERT INTO messages (owner_id, sender_id, seq, role, content_json, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )?;
    for (offset, row) in rows.iter().enumerate() {
        stmt.execute(params![
            owner_id,
            sender_id,
            first_seq + offset as i64,
            row.role,
            row.content_json,
            row.created_at,
        ])?;
    }
    Ok(())
}

/// Append messages after the conversation's current last message.
pub async fn append(
    db: &Database,
    key: &SenderKey,
    messages: &[ConversationMessage],
) -> Result<(), ParleyError> {
    if messages.is_empty() {
        return Ok(());
    }
    let rows = encode_all(messages)?;
    let key = key.clone();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            let tx = conn.transaction()?;
            ensure_sender(&tx, &key.owner_id, &key.sender_id)?;
            let last: i64 = tx.query_row(
                "SELECT COALESCE(MAX(seq), 0) FROM messages WHERE owner_id = ?1 AND sender_id = ?2",
                params![key.owner_id, key.sender_id],
                |row| row.get(0),
            )?;
            insert_rows(&tx, &key.owner_id, &key.sender_id, last + 1, &rows)?;
            tx.commit()
        })
        .await
        .map_err(map_tr_err)
}

/// Read the whole conversation, oldest first.
pub async fn read(db: &Database, key: &SenderKey) -> Result<ConversationHistory, ParleyError> {
    let key = key.clone();
    let rows = db
        .connection()
        .call(move |conn| -> Result<Vec<MessageRow>, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT role, content_json, created_at FROM messages
                 WHERE owner_id = ?1 AND sender_id = ?2
                 ORDER BY seq ASC",
            )?;
            let rows = stmt.query_map(params![key.owner_id, key.sender_id], |row| {
                Ok(MessageRow {
                    role: row.get(0)?,
                    content_json: row.get(1)?,
                    created_at: row.get(2)?,
                })
            })?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)?;

    rows.into_iter().map(MessageRow::decode).collect()
}

/// Replace the conversation with `messages` if it still holds `expected_len` rows.
///
/// Returns `false`, leaving the conversation untouched, when another write
/// changed it first.
pub async fn overwrite(
    db: &Database,
    key: &SenderKey,
    expected_len: usize,
    messages: &[ConversationMessage],
) -> Result<bool, ParleyError> {
    let rows = encode_all(messages)?;
    let key = key.clone();
    db.connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            let tx = conn.transaction()?;
            if count_rows(&tx, &key.owner_id, &key.sender_id)? != expected_len {
                return Ok(false);
            }
            ensure_sender(&tx, &key.owner_id, &key.sender_id)?;
            tx.execute(
                "DELETE FROM messages WHERE owner_id = ?1 AND sender_id = ?2",
                params![key.owner_id, key.sender_id],
            )?;
            insert_rows(&tx, &key.owner_id, &key.sender_id, 1, &rows)?;
            tx.commit()?;
            Ok(true)
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn setup() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("messages.db");
        let db = Database::open(path.to_str().unwrap(), true).await.unwrap();
        (db, dir)
    }

    fn texts(history: &ConversationHistory) -> Vec<String> {
        history.iter().map(ConversationMessage::text).collect()
    }

    #[tokio::test]
    async fn append_and_read_in_order() {
        let (db, _dir) = setup().await;
        let key = SenderKey::new("biz", "user");
        append(&db, &key, &[ConversationMessage::user_text("hi")])
            .await
            .unwrap();
        append(
            &db,
            &key,
            &[
                ConversationMessage::assistant_text("hello"),
                ConversationMessage::user_text("price?"),
            ],
        )
        .await
        .unwrap();

        let history = read(&db, &key).await.unwrap();
        assert_eq!(texts(&history), vec!["hi", "hello", "price?"]);
    }

    #[tokio::test]
    async fn conversations_are_isolated() {
        let (db, _dir) = setup().await;
        let a = SenderKey::new("biz", "a");
        let b = SenderKey::new("other-biz", "a");
        append(&db, &a, &[ConversationMessage::user_text("for biz")])
            .await
            .unwrap();
        assert!(read(&db, &b).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn concurrent_appends_lose_nothing() {
        let (db, _dir) = setup().await;
        let key = SenderKey::new("biz", "user");
        let mut handles = Vec::new();
        for i in 0..20 {
            let db = db.clone();
            let key = key.clone();
            handles.push(tokio::spawn(async move {
                append(&db, &key, &[ConversationMessage::user_text(format!("m{i}"))])
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(read(&db, &key).await.unwrap().len(), 20);
    }

    #[tokio::test]
    async fn overwrite_replaces_and_renumbers() {
        let (db, _dir) = setup().await;
        let key = SenderKey::new("biz", "user");
        append(&db, &key, &[ConversationMessage::user_text("local")])
            .await
            .unwrap();

        let remote = vec![
            ConversationMessage::user_text("r0"),
            ConversationMessage::assistant_text("r1"),
            ConversationMessage::user_text("r2"),
        ];
        assert!(overwrite(&db, &key, 1, &remote).await.unwrap());
        append(&db, &key, &[ConversationMessage::user_text("after")])
            .await
            .unwrap();

        let history = read(&db, &key).await.unwrap();
        assert_eq!(texts(&history), vec!["r0", "r1", "r2", "after"]);
    }

    #[tokio::test]
    async fn overwrite_refuses_when_history_changed() {
        let (db, _dir) = setup().await;
        let key = SenderKey::new("biz", "user");
        append(&db, &key, &[ConversationMessage::user_text("hi")])
            .await
            .unwrap();
        // Appended after the reconciler read one message.
        append(&db, &key, &[ConversationMessage::user_text("one more thing")])
            .await
            .unwrap();

        let remote = vec![
            ConversationMessage::user_text("r0"),
            ConversationMessage::assistant_text("r1"),
            ConversationMessage::user_text("r2"),
        ];
        assert!(!overwrite(&db, &key, 1, &remote).await.unwrap());
        assert_eq!(
            texts(&read(&db, &key).await.unwrap()),
            vec!["hi", "one more thing"]
        );
    }
}

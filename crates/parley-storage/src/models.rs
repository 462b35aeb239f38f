// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Row types and their conversion to core types.
//!
//! JSON encoding and decoding happens outside the database thread; rows
//! carry raw strings across the `tokio-rusqlite` boundary.

use std::str::FromStr;

use chrono::{DateTime, Utc};

use parley_core::ParleyError;
use parley_core::types::{ContentBlock, ConversationMessage, Role};

/// One `messages` row as stored.
#[derive(Debug, Clone)]
pub struct MessageRow {
    pub role: String,
    pub content_json: String,
    pub created_at: String,
}

impl MessageRow {
    pub fn encode(message: &ConversationMessage) -> Result<Self, ParleyError> {
        let content_json =
            serde_json::to_string(&message.content).map_err(|e| ParleyError::Storage {
                source: Box::new(e),
            })?;
        Ok(Self {
            role: message.role.to_string(),
            content_json,
            created_at: message.timestamp.to_rfc3339(),
        })
    }

    pub fn decode(self) -> Result<ConversationMessage, ParleyError> {
        let role = Role::from_str(&self.role).map_err(|e| ParleyError::Storage {
            source: format!("invalid role `{}`: {e}", self.role).into(),
        })?;
        let content: Vec<ContentBlock> =
            serde_json::from_str(&self.content_json).map_err(|e| ParleyError::Storage {
                source: Box::new(e),
            })?;
        let timestamp = DateTime::parse_from_rfc3339(&self.created_at)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| ParleyError::Storage {
                source: Box::new(e),
            })?;
        Ok(ConversationMessage {
            role,
            content,
            timestamp,
        })
    }
}

pub fn encode_all(messages: &[ConversationMessage]) -> Result<Vec<MessageRow>, ParleyError> {
    messages.iter().map(MessageRow::encode).collect()
}

/// Current time in the format used by every `*_at` column.
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339()
}

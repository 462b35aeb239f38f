// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across collaborator traits and the Parley engine.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Compound identifier for one end-user conversation with one business account.
///
/// All per-conversation state (dispatch lifecycle, stored history) is keyed by it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SenderKey {
    /// The business account that owns the inbox.
    pub owner_id: String,
    /// The end user writing to the business.
    pub sender_id: String,
}

impl SenderKey {
    pub fn new(owner_id: impl Into<String>, sender_id: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
            sender_id: sender_id.into(),
        }
    }
}

impl fmt::Display for SenderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.owner_id, self.sender_id)
    }
}

/// Author role of a conversation message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    Tool,
}

/// One block of message content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Plain text.
    Text { text: String },
    /// An image referenced by URL; generators fetch and inline it as needed.
    Image { url: String, mime_type: String },
    /// A function call requested by the response generator.
    ToolCall {
        name: String,
        args: serde_json::Value,
    },
    /// The result handed back to the generator for a previous call.
    ToolResult { name: String, content: String },
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// True for blocks that carry nothing worth storing.
    pub fn is_blank(&self) -> bool {
        match self {
            ContentBlock::Text { text } => text.trim().is_empty(),
            ContentBlock::Image { url, .. } => url.is_empty(),
            ContentBlock::ToolCall { name, .. } | ContentBlock::ToolResult { name, .. } => {
                name.is_empty()
            }
        }
    }
}

/// A single message in a sender's conversation history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub role: Role,
    pub content: Vec<ContentBlock>,
    pub timestamp: DateTime<Utc>,
}

impl ConversationMessage {
    pub fn new(role: Role, content: Vec<ContentBlock>) -> Self {
        Self {
            role,
            content,
            timestamp: Utc::now(),
        }
    }

    /// A user message containing a single text block.
    pub fn user_text(text: impl Into<String>) -> Self {
        Self::new(Role::User, vec![ContentBlock::text(text)])
    }

    /// An assistant message containing a single text block.
    pub fn assistant_text(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, vec![ContentBlock::text(text)])
    }

    /// Concatenation of all text blocks, ignoring images and tool exchanges.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }

    /// True when the message has no non-blank content block.
    pub fn is_empty(&self) -> bool {
        self.content.iter().all(ContentBlock::is_blank)
    }
}

/// Ordered conversation history, oldest first.
pub type ConversationHistory = Vec<ConversationMessage>;

/// A media attachment on an inbound or remote platform message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Platform attachment type (`image`, `video`, `audio`, `file`, ...).
    pub kind: String,
    pub url: String,
}

/// Message body of an inbound webhook event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundPayload {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

/// One inbound messaging event delivered by the platform webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundEvent {
    /// The business account the webhook entry belongs to.
    pub owner_id: String,
    pub sender_id: String,
    pub recipient_id: String,
    /// Platform-assigned identifier, unique per logical message.
    pub event_id: String,
    pub message: InboundPayload,
}

impl InboundEvent {
    pub fn sender_key(&self) -> SenderKey {
        SenderKey::new(self.owner_id.clone(), self.sender_id.clone())
    }

    /// True when the business itself sent the message (an echo of outbound traffic).
    pub fn is_echo(&self) -> bool {
        self.sender_id == self.owner_id
    }
}

/// A message as returned by the platform's conversation history API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformMessage {
    pub id: String,
    /// Identifier of the account that wrote the message.
    pub author_id: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Details of a confirmed, deposit-backed booking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppointmentDetails {
    pub service: String,
    pub deposit: f64,
    pub deal_price: f64,
    pub booked_datetime: String,
    pub name: String,
    pub phone_number: String,
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of collaborator an adapter fills.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Store,
    Platform,
    Generator,
}

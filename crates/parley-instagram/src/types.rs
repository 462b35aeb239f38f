// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Graph API request and response types.

use chrono::{DateTime, Utc};
use parley_core::types::{Attachment, PlatformMessage};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct SendMessageRequest<'a> {
    pub recipient: Recipient<'a>,
    pub message: OutgoingText<'a>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Recipient<'a> {
    pub id: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutgoingText<'a> {
    pub text: &'a str,
}

/// Paged list wrapper used throughout the Graph API.
#[derive(Debug, Clone, Deserialize)]
pub struct Paged<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Conversation {
    pub id: String,
    #[serde(default)]
    pub messages: Option<Paged<GraphMessage>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphMessage {
    pub id: String,
    #[serde(default)]
    pub created_time: Option<String>,
    #[serde(default)]
    pub from: Option<GraphUser>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub attachments: Option<Paged<GraphAttachment>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphUser {
    pub id: String,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphAttachment {
    #[serde(default)]
    pub image_data: Option<MediaData>,
    #[serde(default)]
    pub video_data: Option<MediaData>,
    #[serde(default)]
    pub file_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediaData {
    pub url: String,
}

impl GraphAttachment {
    fn into_attachment(self) -> Option<Attachment> {
        if let Some(image) = self.image_data {
            return Some(Attachment {
                kind: "image".into(),
                url: image.url,
            });
        }
        if let Some(video) = self.video_data {
            return Some(Attachment {
                kind: "video".into(),
                url: video.url,
            });
        }
        self.file_url.map(|url| Attachment {
            kind: "file".into(),
            url,
        })
    }
}

/// Graph timestamps look like `2026-03-04T15:20:11+0000`.
pub fn parse_graph_time(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%z")
        .or_else(|_| DateTime::parse_from_rfc3339(value))
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

impl GraphMessage {
    pub fn into_platform_message(self) -> PlatformMessage {
        PlatformMessage {
            id: self.id,
            author_id: self.from.map(|f| f.id).unwrap_or_default(),
            text: self.message.filter(|t| !t.is_empty()),
            attachments: self
                .attachments
                .map(|list| {
                    list.data
                        .into_iter()
                        .filter_map(GraphAttachment::into_attachment)
                        .collect()
                })
                .unwrap_or_default(),
            created_at: self.created_time.as_deref().and_then(parse_graph_time),
        }
    }
}

/// Error envelope returned with non-success statuses.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphErrorResponse {
    pub error: GraphError,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphError {
    pub message: String,
    #[serde(rename = "type", default)]
    pub type_: Option<String>,
    #[serde(default)]
    pub code: Option<i64>,
}

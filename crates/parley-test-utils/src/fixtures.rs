// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Builders for inbound events and remote platform messages.

use chrono::{Duration, TimeZone, Utc};

use parley_core::types::{Attachment, InboundEvent, InboundPayload, PlatformMessage};

/// A text event from `sender_id` to the business `owner_id`.
pub fn text_event(owner_id: &str, sender_id: &str, event_id: &str, text: &str) -> InboundEvent {
    InboundEvent {
        owner_id: owner_id.to_string(),
        sender_id: sender_id.to_string(),
        recipient_id: owner_id.to_string(),
        event_id: event_id.to_string(),
        message: InboundPayload {
            text: Some(text.to_string()),
            attachments: Vec::new(),
        },
    }
}

/// An event carrying one image attachment and no text.
pub fn image_event(owner_id: &str, sender_id: &str, event_id: &str, url: &str) -> InboundEvent {
    InboundEvent {
        message: InboundPayload {
            text: None,
            attachments: vec![Attachment {
                kind: "image".to_string(),
                url: url.to_string(),
            }],
        },
        ..text_event(owner_id, sender_id, event_id, "")
    }
}

/// A remote conversation alternating between the sender and the owner,
/// starting with the sender, oldest first.
pub fn alternating_remote(owner_id: &str, sender_id: &str, count: usize) -> Vec<PlatformMessage> {
    let start = Utc
        .with_ymd_and_hms(2026, 1, 1, 12, 0, 0)
        .single()
        .unwrap_or_else(Utc::now);
    (0..count)
        .map(|i| PlatformMessage {
            id: format!("remote-{i}"),
            author_id: if i % 2 == 0 { sender_id } else { owner_id }.to_string(),
            text: Some(format!("remote message {i}")),
            attachments: Vec::new(),
            created_at: Some(start + Duration::minutes(i as i64)),
        })
        .collect()
}

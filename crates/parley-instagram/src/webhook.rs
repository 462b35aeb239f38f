// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Webhook payloads and request authentication.
//!
//! The platform batches notifications as `entry[].messaging[]`. Each entry
//! belongs to one business account (its `id` is the owner); each messaging
//! item is one event. Only items carrying a `message` become
//! [`InboundEvent`]s; read receipts, reactions and postbacks are dropped.

use hmac::{Hmac, Mac};
use parley_core::types::{Attachment, InboundEvent, InboundPayload};
use serde::Deserialize;
use sha2::Sha256;
use tracing::debug;

/// Header carrying the payload signature.
pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub object: Option<String>,
    #[serde(default)]
    pub entry: Vec<WebhookEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEntry {
    /// The business account the notification is for.
    pub id: String,
    #[serde(default)]
    pub time: Option<i64>,
    #[serde(default)]
    pub messaging: Vec<MessagingItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessagingItem {
    pub sender: Participant,
    pub recipient: Participant,
    #[serde(default)]
    pub timestamp: Option<i64>,
    #[serde(default)]
    pub message: Option<WebhookMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Participant {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookMessage {
    pub mid: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub attachments: Vec<WebhookAttachment>,
    #[serde(default)]
    pub is_echo: bool,
    #[serde(default)]
    pub is_deleted: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookAttachment {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub payload: Option<AttachmentPayload>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AttachmentPayload {
    #[serde(default)]
    pub url: Option<String>,
}

impl WebhookPayload {
    /// Flattens the payload into inbound events, in delivery order.
    pub fn into_events(self) -> Vec<InboundEvent> {
        let mut events = Vec::new();
        for entry in self.entry {
            for item in entry.messaging {
                let Some(message) = item.message else {
                    debug!(owner_id = %entry.id, "skipping non-message webhook item");
                    continue;
                };
                if message.is_deleted {
                    continue;
                }
                events.push(InboundEvent {
                    owner_id: entry.id.clone(),
                    sender_id: item.sender.id,
                    recipient_id: item.recipient.id,
                    event_id: message.mid,
                    message: InboundPayload {
                        text: message.text,
                        attachments: message
                            .attachments
                            .into_iter()
                            .filter_map(|a| {
                                let url = a.payload?.url?;
                                Some(Attachment { kind: a.kind, url })
                            })
                            .collect(),
                    },
                });
            }
        }
        events
    }
}

/// Checks an `X-Hub-Signature-256` header (`sha256=<hex>`) against the raw body.
pub fn verify_signature(app_secret: &str, body: &[u8], header: Option<&str>) -> bool {
    let Some(signature) = header.and_then(|h| h.strip_prefix("sha256=")) else {
        return false;
    };
    let Ok(expected) = hex::decode(signature) else {
        return false;
    };
    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(app_secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

/// Returns the challenge to echo back when a subscription request is valid.
pub fn verify_subscription(
    mode: Option<&str>,
    token: Option<&str>,
    challenge: Option<&str>,
    expected_token: &str,
) -> Option<String> {
    match (mode, token, challenge) {
        (Some("subscribe"), Some(token), Some(challenge)) if token == expected_token => {
            Some(challenge.to_string())
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAYLOAD: &str = r#"{
        "object": "instagram",
        "entry": [{
            "id": "17841400000000001",
            "time": 1741000000000,
            "messaging": [
                {
                    "sender": {"id": "5550001"},
                    "recipient": {"id": "17841400000000001"},
                    "timestamp": 1741000000000,
                    "message": {"mid": "aWdfZAG1", "text": "hi, do you have openings friday?"}
                },
                {
                    "sender": {"id": "5550001"},
                    "recipient": {"id": "17841400000000001"},
                    "timestamp": 1741000000500,
                    "message": {
                        "mid": "aWdfZAG2",
                        "attachments": [
                            {"type": "image", "payload": {"url": "https://cdn.example/ig/1.jpg"}},
                            {"type": "story_mention", "payload": {}}
                        ]
                    }
                },
                {
                    "sender": {"id": "5550001"},
                    "recipient": {"id": "17841400000000001"},
                    "read": {"mid": "aWdfZAG0"}
                }
            ]
        }]
    }"#;

    #[test]
    fn messaging_items_become_events() {
        let payload: WebhookPayload = serde_json::from_str(PAYLOAD).unwrap();
        let events = payload.into_events();
        assert_eq!(events.len(), 2);

        assert_eq!(events[0].owner_id, "17841400000000001");
        assert_eq!(events[0].sender_id, "5550001");
        assert_eq!(events[0].event_id, "aWdfZAG1");
        assert_eq!(
            events[0].message.text.as_deref(),
            Some("hi, do you have openings friday?")
        );

        assert_eq!(events[1].message.text, None);
        assert_eq!(
            events[1].message.attachments,
            vec![Attachment {
                kind: "image".into(),
                url: "https://cdn.example/ig/1.jpg".into()
            }]
        );
    }

    #[test]
    fn echoes_keep_owner_as_sender() {
        let json = r#"{"entry": [{"id": "biz", "messaging": [{
            "sender": {"id": "biz"}, "recipient": {"id": "user"},
            "message": {"mid": "m1", "text": "Booked!", "is_echo": true}
        }]}]}"#;
        let events = serde_json::from_str::<WebhookPayload>(json)
            .unwrap()
            .into_events();
        assert!(events[0].is_echo());
    }

    #[test]
    fn deleted_messages_are_dropped() {
        let json = r#"{"entry": [{"id": "biz", "messaging": [{
            "sender": {"id": "user"}, "recipient": {"id": "biz"},
            "message": {"mid": "m1", "is_deleted": true}
        }]}]}"#;
        let events = serde_json::from_str::<WebhookPayload>(json)
            .unwrap()
            .into_events();
        assert!(events.is_empty());
    }

    fn sign(secret: &str, body: &[u8]) -> String {
        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(body);
        format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
    }

    #[test]
    fn signature_verification() {
        let body = PAYLOAD.as_bytes();
        let header = sign("app-secret", body);
        assert!(verify_signature("app-secret", body, Some(&header)));
        assert!(!verify_signature("other-secret", body, Some(&header)));
        assert!(!verify_signature("app-secret", b"tampered", Some(&header)));
        assert!(!verify_signature("app-secret", body, None));
        assert!(!verify_signature("app-secret", body, Some("sha256=zz")));
        assert!(!verify_signature("app-secret", body, Some(header.trim_start_matches("sha256="))));
    }

    #[test]
    fn subscription_requires_mode_and_token() {
        assert_eq!(
            verify_subscription(Some("subscribe"), Some("tok"), Some("c123"), "tok").as_deref(),
            Some("c123")
        );
        assert_eq!(verify_subscription(Some("subscribe"), Some("bad"), Some("c123"), "tok"), None);
        assert_eq!(verify_subscription(Some("unsubscribe"), Some("tok"), Some("c123"), "tok"), None);
        assert_eq!(verify_subscription(Some("subscribe"), Some("tok"), None, "tok"), None);
    }
}

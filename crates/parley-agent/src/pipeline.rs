// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inbound pipeline: the single entry point for webhook events.
//!
//! Filters echoes and redeliveries, converts the platform payload into
//! content blocks, honours the business's pause switches and hands the
//! message to the [`DispatchEngine`].

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info};

use parley_core::ParleyError;
use parley_core::traits::ConversationStore;
use parley_core::types::{ContentBlock, ConversationMessage, InboundEvent, InboundPayload, Role};

use crate::dedup::Deduplicator;
use crate::dispatch::{DispatchEngine, Submission};
use crate::reconcile::IMAGE_MIME_TYPE;

/// What happened to one inbound event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InboundOutcome {
    /// The event id was already processed within the dedup window.
    Duplicate,
    /// The business's own outgoing message echoed back.
    Echo,
    /// Nothing usable in the payload (stickers, reactions, unsupported media).
    Empty,
    /// Stored without scheduling a reply; the bot is paused.
    Stored,
    /// Stored and handed to the dispatch engine.
    Dispatched(Submission),
}

impl fmt::Display for InboundOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InboundOutcome::Duplicate => write!(f, "duplicate"),
            InboundOutcome::Echo => write!(f, "echo"),
            InboundOutcome::Empty => write!(f, "empty"),
            InboundOutcome::Stored => write!(f, "stored"),
            InboundOutcome::Dispatched(Submission::Scheduled) => write!(f, "scheduled"),
            InboundOutcome::Dispatched(Submission::Absorbed(_)) => write!(f, "absorbed"),
        }
    }
}

pub struct InboundPipeline {
    dedup: Deduplicator,
    store: Arc<dyn ConversationStore>,
    engine: DispatchEngine,
}

impl InboundPipeline {
    pub fn new(dedup: Deduplicator, store: Arc<dyn ConversationStore>, engine: DispatchEngine) -> Self {
        Self {
            dedup,
            store,
            engine,
        }
    }

    pub fn engine(&self) -> &DispatchEngine {
        &self.engine
    }

    /// Processes one inbound event.
    ///
    /// Errors come only from the conversation store; the event id is already
    /// consumed by then, so a redelivery will not retry it.
    pub async fn handle(&self, event: InboundEvent) -> Result<InboundOutcome, ParleyError> {
        if event.is_echo() {
            debug!(owner_id = %event.owner_id, event_id = %event.event_id, "ignoring echo event");
            return Ok(InboundOutcome::Echo);
        }

        if !self.dedup.accept(&event.event_id) {
            debug!(
                owner_id = %event.owner_id,
                sender_id = %event.sender_id,
                event_id = %event.event_id,
                "duplicate event dropped"
            );
            return Ok(InboundOutcome::Duplicate);
        }

        let content = content_blocks(&event.message);
        if content.is_empty() {
            debug!(event_id = %event.event_id, "event has no usable content");
            return Ok(InboundOutcome::Empty);
        }

        let key = event.sender_key();
        let message = ConversationMessage::new(Role::User, content);

        let bot_active = self.store.is_owner_bot_active(&key.owner_id).await?
            && self.store.is_sender_active(&key).await?;
        if !bot_active {
            self.store.append(&key, &[message]).await?;
            info!(
                owner_id = %key.owner_id,
                sender_id = %key.sender_id,
                "bot paused, message stored without reply"
            );
            return Ok(InboundOutcome::Stored);
        }

        let submission = self.engine.submit(&key, message).await?;
        Ok(InboundOutcome::Dispatched(submission))
    }
}

/// Text and image attachments of a payload as content blocks.
///
/// Attachments other than images are ignored.
pub fn content_blocks(payload: &InboundPayload) -> Vec<ContentBlock> {
    let mut blocks = Vec::new();
    if let Some(text) = payload.text.as_deref().filter(|t| !t.trim().is_empty()) {
        blocks.push(ContentBlock::text(text));
    }
    for attachment in &payload.attachments {
        if attachment.kind == "image" && !attachment.url.is_empty() {
            blocks.push(ContentBlock::Image {
                url: attachment.url.clone(),
                mime_type: IMAGE_MIME_TYPE.to_string(),
            });
        }
    }
    blocks
}

// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reconciliation of a short local history with the platform's copy.
//!
//! A conversation that started before the service was deployed, or whose
//! early messages were lost, has a suspiciously short local history. Before
//! each generation cycle the reconciler compares it with the conversation the
//! platform holds and adopts the remote copy when it is strictly longer.
//! Local history therefore never shrinks, and the replacement is refused
//! when a message was stored while the remote copy was being fetched.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use parley_core::traits::{ConversationStore, MessagingPlatform};
use parley_core::types::{
    ContentBlock, ConversationHistory, ConversationMessage, PlatformMessage, Role, SenderKey,
};
use parley_core::ParleyError;

/// MIME type assumed for image attachments; platforms serve them as JPEG.
pub const IMAGE_MIME_TYPE: &str = "image/jpeg";

/// Replaces short local histories with longer remote ones.
pub struct HistoryReconciler {
    store: Arc<dyn ConversationStore>,
    platform: Arc<dyn MessagingPlatform>,
    threshold: usize,
}

impl HistoryReconciler {
    pub fn new(
        store: Arc<dyn ConversationStore>,
        platform: Arc<dyn MessagingPlatform>,
        threshold: usize,
    ) -> Self {
        Self {
            store,
            platform,
            threshold,
        }
    }

    /// Returns the history generation should see for `key`.
    ///
    /// Only a failure to read the local history is an error; remote fetch
    /// and overwrite failures fall back to the local copy.
    pub async fn reconcile(&self, key: &SenderKey) -> Result<ConversationHistory, ParleyError> {
        let local = self.store.read(key).await?;
        if local.len() >= self.threshold {
            return Ok(local);
        }

        let remote = match self.platform.fetch_remote_history(key).await {
            Ok(remote) => remote,
            Err(e) => {
                warn!(
                    owner_id = %key.owner_id,
                    sender_id = %key.sender_id,
                    error = %e,
                    "remote history fetch failed, using local history"
                );
                return Ok(local);
            }
        };
        if remote.len() <= local.len() {
            return Ok(local);
        }

        let transformed: ConversationHistory = remote
            .iter()
            .filter_map(|msg| to_conversation_message(key, msg))
            .collect();
        if transformed.len() <= local.len() {
            debug!(
                sender_id = %key.sender_id,
                local = local.len(),
                usable_remote = transformed.len(),
                "remote history not longer after filtering"
            );
            return Ok(local);
        }

        match self.store.overwrite(key, local.len(), &transformed).await {
            Ok(true) => {
                info!(
                    owner_id = %key.owner_id,
                    sender_id = %key.sender_id,
                    local = local.len(),
                    remote = transformed.len(),
                    "local history replaced with remote copy"
                );
                Ok(transformed)
            }
            Ok(false) => {
                debug!(
                    sender_id = %key.sender_id,
                    "local history changed during reconciliation, rereading"
                );
                self.store.read(key).await
            }
            Err(e) => {
                warn!(
                    sender_id = %key.sender_id,
                    error = %e,
                    "failed to store remote history, using local history"
                );
                Ok(local)
            }
        }
    }
}

/// Maps a remote message into the local model.
///
/// Messages written by anyone other than the sender or the owner, and
/// messages without text or image content, are dropped.
pub fn to_conversation_message(
    key: &SenderKey,
    msg: &PlatformMessage,
) -> Option<ConversationMessage> {
    let role = if msg.author_id == key.sender_id {
        Role::User
    } else if msg.author_id == key.owner_id {
        Role::Assistant
    } else {
        return None;
    };

    let mut content = Vec::new();
    if let Some(text) = msg.text.as_deref().filter(|t| !t.trim().is_empty()) {
        content.push(ContentBlock::text(text));
    }
    content.extend(
        msg.attachments
            .iter()
            .filter(|a| a.kind == "image" && !a.url.is_empty())
            .map(|a| ContentBlock::Image {
                url: a.url.clone(),
                mime_type: IMAGE_MIME_TYPE.to_string(),
            }),
    );
    if content.is_empty() {
        return None;
    }

    Some(ConversationMessage {
        role,
        content,
        timestamp: msg.created_at.unwrap_or_else(Utc::now),
    })
}

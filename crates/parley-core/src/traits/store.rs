// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation store trait for persistence backends.

use async_trait::async_trait;

use crate::error::ParleyError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ConversationHistory, ConversationMessage, SenderKey};

/// Persistence contract for per-sender conversation history.
///
/// Implementations must make `append` atomic: two concurrent appends for the
/// same sender may interleave but must never lose a message.
#[async_trait]
pub trait ConversationStore: PluginAdapter {
    /// Appends messages to the end of the sender's history, in order.
    async fn append(
        &self,
        key: &SenderKey,
        messages: &[ConversationMessage],
    ) -> Result<(), ParleyError>;

    /// Reads the full history for the sender, oldest first.
    async fn read(&self, key: &SenderKey) -> Result<ConversationHistory, ParleyError>;

    /// Replaces the sender's whole history. Used by reconciliation only.
    ///
    /// The replacement happens only if the stored history still holds
    /// exactly `expected_len` messages, checked atomically with the write.
    /// Returns `false` without writing when it does not, so a message
    /// appended since the caller's read is never erased.
    async fn overwrite(
        &self,
        key: &SenderKey,
        expected_len: usize,
        messages: &[ConversationMessage],
    ) -> Result<bool, ParleyError>;

    /// Whether the bot should answer this particular sender.
    async fn is_sender_active(&self, key: &SenderKey) -> Result<bool, ParleyError>;

    /// Whether the bot is switched on for the business account as a whole.
    async fn is_owner_bot_active(&self, owner_id: &str) -> Result<bool, ParleyError>;
}

// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Messaging platform trait for outbound delivery and remote history.

use async_trait::async_trait;

use crate::error::ParleyError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{PlatformMessage, SenderKey};

/// Outbound half of a messaging platform integration.
///
/// Inbound traffic arrives through the HTTP webhook and is not part of
/// this trait.
#[async_trait]
pub trait MessagingPlatform: PluginAdapter {
    /// Fetches the authoritative conversation between the owner and the sender,
    /// oldest message first.
    async fn fetch_remote_history(
        &self,
        key: &SenderKey,
    ) -> Result<Vec<PlatformMessage>, ParleyError>;

    /// Sends one text message to the sender.
    async fn send_text(&self, key: &SenderKey, text: &str) -> Result<(), ParleyError>;
}

// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Response generator trait for reply production.

use async_trait::async_trait;

use crate::error::ParleyError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ConversationMessage, SenderKey};

/// Produces the next messages of a conversation.
///
/// A generator may run several tool round trips internally; the dispatch
/// engine treats each call as one blocking step.
#[async_trait]
pub trait ResponseGenerator: PluginAdapter {
    /// Returns the newly generated messages (assistant text, tool calls and
    /// tool results) in the order they were produced.
    async fn generate(
        &self,
        key: &SenderKey,
        history: &[ConversationMessage],
    ) -> Result<Vec<ConversationMessage>, ParleyError>;
}

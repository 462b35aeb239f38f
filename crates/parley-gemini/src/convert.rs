// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversion from stored conversation messages to Gemini contents.

use parley_core::types::{ContentBlock, ConversationMessage, Role};
use tracing::warn;

use crate::client::GeminiClient;
use crate::types::{Content, Part};

pub fn role_name(role: Role) -> &'static str {
    match role {
        Role::User => "user",
        Role::Assistant => "model",
        Role::Tool => "function",
    }
}

/// Converts one content block, fetching images through `client`.
///
/// An image that cannot be fetched is dropped with a warning.
async fn convert_block(client: &GeminiClient, block: &ContentBlock) -> Option<Part> {
    match block {
        ContentBlock::Text { text } => {
            if text.trim().is_empty() {
                None
            } else {
                Some(Part::text(text.clone()))
            }
        }
        ContentBlock::Image { url, mime_type } => match client.fetch_image(url, mime_type).await {
            Ok((mime, data)) => Some(Part::inline_data(mime, data)),
            Err(e) => {
                warn!(url = %url, error = %e, "dropping image that could not be fetched");
                None
            }
        },
        ContentBlock::ToolCall { name, args } => Some(Part::function_call(name.clone(), args.clone())),
        ContentBlock::ToolResult { name, content } => {
            Some(Part::function_response(name.clone(), content.clone()))
        }
    }
}

/// Builds the `contents` array for a history, skipping messages left without parts.
pub async fn to_contents(client: &GeminiClient, history: &[ConversationMessage]) -> Vec<Content> {
    let mut contents = Vec::with_capacity(history.len());
    for message in history {
        let mut parts = Vec::with_capacity(message.content.len());
        for block in &message.content {
            if let Some(part) = convert_block(client, block).await {
                parts.push(part);
            }
        }
        if !parts.is_empty() {
            contents.push(Content::new(role_name(message.role), parts));
        }
    }
    contents
}

// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Instagram Graph API messaging endpoints.

use std::time::Duration;

use parley_core::ParleyError;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use tracing::debug;

use crate::types::{
    Conversation, GraphErrorResponse, GraphMessage, OutgoingText, Paged, Recipient,
    SendMessageRequest,
};

/// Fields requested for each message of a conversation.
const MESSAGE_FIELDS: &str = "messages{id,created_time,from,message,attachments}";

#[derive(Debug, Clone)]
pub struct InstagramClient {
    client: reqwest::Client,
    base_url: String,
    api_version: String,
}

impl InstagramClient {
    /// Creates a client authenticating every request with `access_token`.
    pub fn new(
        access_token: &str,
        base_url: &str,
        api_version: &str,
    ) -> Result<Self, ParleyError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {access_token}")).map_err(|e| {
                ParleyError::Config(format!("invalid access token header value: {e}"))
            })?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ParleyError::Platform {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_version: api_version.to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}/{path}", self.base_url, self.api_version)
    }

    /// Sends a text message to `recipient_id`.
    pub async fn send_text(&self, recipient_id: &str, text: &str) -> Result<(), ParleyError> {
        let body = SendMessageRequest {
            recipient: Recipient { id: recipient_id },
            message: OutgoingText { text },
        };
        let response = self
            .client
            .post(self.endpoint("me/messages"))
            .json(&body)
            .send()
            .await
            .map_err(request_failed)?;

        let status = response.status();
        debug!(status = %status, recipient_id, "send response received");
        if !status.is_success() {
            return Err(api_error(status, response).await);
        }
        Ok(())
    }

    /// Messages of the conversation with `user_id`, newest first as the API returns them.
    pub async fn conversation_messages(
        &self,
        user_id: &str,
    ) -> Result<Vec<GraphMessage>, ParleyError> {
        let url = reqwest::Url::parse_with_params(
            &self.endpoint("me/conversations"),
            &[
                ("platform", "instagram"),
                ("user_id", user_id),
                ("fields", MESSAGE_FIELDS),
            ],
        )
        .map_err(|e| ParleyError::Config(format!("invalid Graph API URL: {e}")))?;

        let response = self.client.get(url).send().await.map_err(request_failed)?;
        let status = response.status();
        debug!(status = %status, user_id, "conversation response received");
        if !status.is_success() {
            return Err(api_error(status, response).await);
        }

        let conversations: Paged<Conversation> =
            response.json().await.map_err(|e| ParleyError::Platform {
                message: format!("failed to parse conversation response: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(conversations
            .data
            .into_iter()
            .next()
            .and_then(|c| c.messages)
            .map(|m| m.data)
            .unwrap_or_default())
    }
}

fn request_failed(e: reqwest::Error) -> ParleyError {
    ParleyError::Platform {
        message: format!("HTTP request failed: {e}"),
        source: Some(Box::new(e)),
    }
}

async fn api_error(status: reqwest::StatusCode, response: reqwest::Response) -> ParleyError {
    let body = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<GraphErrorResponse>(&body) {
        Ok(err) => format!(
            "Graph API error ({}): {}",
            err.error.code.map(|c| c.to_string()).unwrap_or_else(|| status.to_string()),
            err.error.message
        ),
        Err(_) => format!("Graph API returned {status}: {body}"),
    };
    ParleyError::platform(message)
}

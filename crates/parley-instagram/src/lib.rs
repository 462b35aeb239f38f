// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Instagram messaging platform adapter for Parley.
//!
//! Outbound delivery and conversation history go through the Graph API
//! ([`client::InstagramClient`]); inbound traffic arrives as webhook
//! notifications parsed by [`webhook`].

pub mod client;
pub mod types;
pub mod webhook;

use async_trait::async_trait;
use parley_config::model::InstagramConfig;
use parley_core::ParleyError;
use parley_core::traits::{MessagingPlatform, PluginAdapter};
use parley_core::types::{AdapterType, HealthStatus, PlatformMessage, SenderKey};
use tracing::{debug, info};

use crate::client::InstagramClient;

pub use webhook::{WebhookPayload, verify_signature, verify_subscription};

/// Instagram implementation of [`MessagingPlatform`].
///
/// Access token resolution order: config -> `INSTAGRAM_ACCESS_TOKEN` env var -> error.
pub struct InstagramPlatform {
    client: InstagramClient,
}

impl InstagramPlatform {
    pub fn new(config: &InstagramConfig) -> Result<Self, ParleyError> {
        let token = resolve_access_token(&config.access_token)?;
        let client = InstagramClient::new(&token, &config.api_base_url, &config.api_version)?;
        info!(api_version = %config.api_version, "Instagram platform initialized");
        Ok(Self { client })
    }

    pub fn with_client(client: InstagramClient) -> Self {
        Self { client }
    }
}

fn resolve_access_token(config_token: &Option<String>) -> Result<String, ParleyError> {
    if let Some(token) = config_token.as_deref().filter(|t| !t.is_empty()) {
        return Ok(token.to_string());
    }

    std::env::var("INSTAGRAM_ACCESS_TOKEN").map_err(|_| {
        ParleyError::Config(
            "Instagram access token not found. Set instagram.access_token in config or INSTAGRAM_ACCESS_TOKEN environment variable.".into(),
        )
    })
}

#[async_trait]
impl PluginAdapter for InstagramPlatform {
    fn name(&self) -> &str {
        "instagram"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Platform
    }

    async fn health_check(&self) -> Result<HealthStatus, ParleyError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl MessagingPlatform for InstagramPlatform {
    async fn fetch_remote_history(
        &self,
        key: &SenderKey,
    ) -> Result<Vec<PlatformMessage>, ParleyError> {
        let mut messages: Vec<PlatformMessage> = self
            .client
            .conversation_messages(&key.sender_id)
            .await?
            .into_iter()
            .map(|m| m.into_platform_message())
            .collect();
        messages.reverse();
        debug!(
            owner_id = %key.owner_id,
            sender_id = %key.sender_id,
            count = messages.len(),
            "remote history fetched"
        );
        Ok(messages)
    }

    async fn send_text(&self, key: &SenderKey, text: &str) -> Result<(), ParleyError> {
        self.client.send_text(&key.sender_id, text).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn platform_for(server: &MockServer) -> InstagramPlatform {
        InstagramPlatform::new(&InstagramConfig {
            access_token: Some("IGQ-test".into()),
            api_base_url: server.uri(),
            api_version: "v21.0".into(),
        })
        .unwrap()
    }

    #[test]
    fn access_token_from_config_wins() {
        assert_eq!(resolve_access_token(&Some("IGQ-1".into())).unwrap(), "IGQ-1");
    }

    #[test]
    fn empty_access_token_falls_back_to_env() {
        // Succeeds only when the env var is set; either way the empty string is never used.
        match resolve_access_token(&Some(String::new())) {
            Ok(token) => assert!(!token.is_empty()),
            Err(e) => assert!(e.to_string().contains("access token not found")),
        }
    }

    #[tokio::test]
    async fn remote_history_is_oldest_first() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v21.0/me/conversations"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{"id": "c", "messages": {"data": [
                    {"id": "m3", "from": {"id": "biz"}, "message": "See you then"},
                    {"id": "m2", "from": {"id": "user"}, "message": "Friday 2pm?"},
                    {"id": "m1", "from": {"id": "user"}, "message": "hi"}
                ]}}]
            })))
            .mount(&server)
            .await;

        let history = platform_for(&server)
            .fetch_remote_history(&SenderKey::new("biz", "user"))
            .await
            .unwrap();
        let ids: Vec<&str> = history.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["m1", "m2", "m3"]);
        assert_eq!(history[2].author_id, "biz");
    }

    #[tokio::test]
    async fn send_failure_is_platform_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let result = platform_for(&server)
            .send_text(&SenderKey::new("biz", "user"), "hi")
            .await;
        assert!(matches!(result, Err(ParleyError::Platform { .. })));
    }

    #[tokio::test]
    async fn adapter_identity() {
        let server = MockServer::start().await;
        let platform = platform_for(&server);
        assert_eq!(platform.name(), "instagram");
        assert_eq!(platform.adapter_type(), AdapterType::Platform);
        assert_eq!(platform.health_check().await.unwrap(), HealthStatus::Healthy);
    }
}

// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Google Gemini response generator for Parley.
//!
//! This crate implements [`ResponseGenerator`] on top of the Gemini
//! `generateContent` API, including the function-calling loop that lets the
//! model consult the business tools before answering.

pub mod client;
pub mod convert;
pub mod types;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parley_config::model::GeminiConfig;
use parley_core::ParleyError;
use parley_core::traits::{BusinessDirectory, PluginAdapter, ResponseGenerator};
use parley_core::types::{
    AdapterType, ContentBlock, ConversationMessage, HealthStatus, Role, SenderKey,
};
use parley_skill::{ToolContext, ToolRegistry};
use tracing::{debug, info, warn};

use crate::client::GeminiClient;
use crate::types::{Content, GenerateContentRequest, GenerationConfig, Part, ToolDeclarations};

/// Gemini generator implementing [`ResponseGenerator`].
///
/// API key resolution order: config -> `GEMINI_API_KEY` env var -> error.
pub struct GeminiGenerator {
    client: GeminiClient,
    directory: Arc<dyn BusinessDirectory>,
    tools: Arc<ToolRegistry>,
    generation_config: GenerationConfig,
    max_tool_rounds: usize,
}

impl GeminiGenerator {
    pub fn new(
        config: &GeminiConfig,
        directory: Arc<dyn BusinessDirectory>,
        tools: Arc<ToolRegistry>,
    ) -> Result<Self, ParleyError> {
        let api_key = resolve_api_key(&config.api_key)?;
        let client = GeminiClient::new(api_key, config.model.clone())?
            .with_base_url(config.api_base_url.clone())
            .with_retries(
                config.max_retries,
                Duration::from_millis(config.retry_delay_ms),
            )
            .with_request_timeout(config.request_timeout());

        info!(model = %config.model, tools = tools.len(), "Gemini generator initialized");

        Ok(Self::with_client(client, config, directory, tools))
    }

    /// Creates a generator around an existing client.
    pub fn with_client(
        client: GeminiClient,
        config: &GeminiConfig,
        directory: Arc<dyn BusinessDirectory>,
        tools: Arc<ToolRegistry>,
    ) -> Self {
        Self {
            client,
            directory,
            tools,
            generation_config: GenerationConfig {
                temperature: config.temperature,
                max_output_tokens: config.max_output_tokens,
            },
            max_tool_rounds: config.max_tool_rounds,
        }
    }

    fn build_request(
        &self,
        contents: Vec<Content>,
        instruction: Option<&str>,
    ) -> GenerateContentRequest {
        let declarations = self.tools.function_declarations();
        GenerateContentRequest {
            contents,
            system_instruction: instruction.map(Content::system),
            tools: if declarations.is_empty() {
                Vec::new()
            } else {
                vec![ToolDeclarations {
                    function_declarations: declarations,
                }]
            },
            generation_config: self.generation_config.clone(),
        }
    }
}

fn resolve_api_key(config_key: &Option<String>) -> Result<String, ParleyError> {
    if let Some(key) = config_key.as_deref().filter(|k| !k.is_empty()) {
        return Ok(key.to_string());
    }

    std::env::var("GEMINI_API_KEY").map_err(|_| {
        ParleyError::Config(
            "Gemini API key not found. Set gemini.api_key in config or GEMINI_API_KEY environment variable.".into(),
        )
    })
}

#[async_trait]
impl PluginAdapter for GeminiGenerator {
    fn name(&self) -> &str {
        "gemini"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Generator
    }

    async fn health_check(&self) -> Result<HealthStatus, ParleyError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl ResponseGenerator for GeminiGenerator {
    async fn generate(
        &self,
        key: &SenderKey,
        history: &[ConversationMessage],
    ) -> Result<Vec<ConversationMessage>, ParleyError> {
        let instruction = self.directory.instruction(&key.owner_id).await?;
        let mut contents = convert::to_contents(&self.client, history).await;
        let ctx = ToolContext::new(key.clone());
        let mut produced = Vec::new();

        for round in 0..=self.max_tool_rounds {
            let request = self.build_request(contents.clone(), instruction.as_deref());
            let response = self.client.generate_content(&request).await?;

            let Some(parts) = response.first_parts() else {
                let reason = response
                    .prompt_feedback
                    .as_ref()
                    .and_then(|f| f.block_reason.clone())
                    .unwrap_or_else(|| "no candidates".to_string());
                return Err(ParleyError::generator(format!(
                    "Gemini returned no content: {reason}"
                )));
            };

            let text: String = parts.iter().filter_map(|p| p.text.as_deref()).collect();
            let calls: Vec<_> = parts
                .iter()
                .filter_map(|p| p.function_call.clone())
                .collect();

            if calls.is_empty() {
                if !text.trim().is_empty() {
                    produced.push(ConversationMessage::assistant_text(text));
                }
                return Ok(produced);
            }

            if round == self.max_tool_rounds {
                warn!(
                    owner_id = %key.owner_id,
                    sender_id = %key.sender_id,
                    rounds = self.max_tool_rounds,
                    "tool round limit reached, dropping pending calls"
                );
                if !text.trim().is_empty() {
                    produced.push(ConversationMessage::assistant_text(text));
                }
                return Ok(produced);
            }

            let mut call_blocks = Vec::new();
            if !text.trim().is_empty() {
                call_blocks.push(ContentBlock::text(text));
            }
            let mut result_blocks = Vec::new();
            let mut response_parts = Vec::new();

            for call in &calls {
                debug!(sender_id = %key.sender_id, function = %call.name, round, "invoking tool");
                let output = match self.tools.invoke(&ctx, &call.name, call.args.clone()).await {
                    Ok(output) if output.is_error => format!("error: {}", output.content),
                    Ok(output) => output.content,
                    Err(e) => {
                        warn!(function = %call.name, error = %e, "tool invocation failed");
                        format!("error: {e}")
                    }
                };
                call_blocks.push(ContentBlock::ToolCall {
                    name: call.name.clone(),
                    args: call.args.clone(),
                });
                response_parts.push(Part::function_response(call.name.clone(), output.clone()));
                result_blocks.push(ContentBlock::ToolResult {
                    name: call.name.clone(),
                    content: output,
                });
            }

            contents.push(Content::new("model", parts.to_vec()));
            contents.push(Content::new("function", response_parts));
            produced.push(ConversationMessage::new(Role::Assistant, call_blocks));
            produced.push(ConversationMessage::new(Role::Tool, result_blocks));
        }

        Ok(produced)
    }
}

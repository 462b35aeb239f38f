// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tool trait and registry for the generator's function calls.
//!
//! The [`Tool`] trait is the interface every callable function implements.
//! The [`ToolRegistry`] manages lookup by name and generates Gemini-format
//! function declarations for the response generator.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use parley_core::ParleyError;
use parley_core::types::SenderKey;
use serde::{Deserialize, Serialize};

/// What a tool hands back to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOutput {
    /// The content handed back to the model (plain text or JSON).
    pub content: String,
    /// Whether the invocation failed in a way the model should see.
    pub is_error: bool,
}

impl ToolOutput {
    pub fn ok(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: false,
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: true,
        }
    }
}

/// The conversation a tool call is made on behalf of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolContext {
    pub key: SenderKey,
}

impl ToolContext {
    pub fn new(key: SenderKey) -> Self {
        Self { key }
    }

    pub fn owner_id(&self) -> &str {
        &self.key.owner_id
    }
}

/// A function the model can call while composing a reply.
///
/// `invoke` receives the parsed `args` of the model's `functionCall` part.
/// Problems the model should see (bad arguments, missing data) are returned
/// as [`ToolOutput::error`]; an `Err` is reserved for infrastructure failures.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Function name as declared to the model.
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON schema of the `args` object.
    fn parameters_schema(&self) -> serde_json::Value;

    async fn invoke(
        &self,
        ctx: &ToolContext,
        input: serde_json::Value,
    ) -> Result<ToolOutput, ParleyError>;
}

/// Tools the generator may call, keyed by function name.
///
/// Names iterate in sorted order, so declarations are stable across requests.
#[derive(Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `tool` under its `name()`, replacing any tool of the same name.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).map(Arc::clone)
    }

    /// `(name, description)` of every tool.
    pub fn list(&self) -> Vec<(&str, &str)> {
        self.tools
            .iter()
            .map(|(name, tool)| (name.as_str(), tool.description()))
            .collect()
    }

    /// Function declarations in the shape Gemini expects:
    /// `{"name": .., "description": .., "parameters": <schema>}`.
    pub fn function_declarations(&self) -> Vec<serde_json::Value> {
        self.tools
            .values()
            .map(|tool| {
                serde_json::json!({
                    "name": tool.name(),
                    "description": tool.description(),
                    "parameters": tool.parameters_schema(),
                })
            })
            .collect()
    }

    /// Invokes the named tool.
    ///
    /// An unknown name is reported to the model as an error output rather
    /// than failing the generation.
    pub async fn invoke(
        &self,
        ctx: &ToolContext,
        name: &str,
        input: serde_json::Value,
    ) -> Result<ToolOutput, ParleyError> {
        match self.tools.get(name) {
            Some(tool) => tool.invoke(ctx, input).await,
            None => Ok(ToolOutput::error(format!("unknown function `{name}`"))),
        }
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

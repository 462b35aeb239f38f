// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Business information lookup by topic.

use std::sync::Arc;

use async_trait::async_trait;
use parley_core::ParleyError;
use parley_core::traits::BusinessDirectory;
use tracing::debug;

use crate::tool::{Tool, ToolContext, ToolOutput};

/// Topics a business can publish.
pub const INFO_TOPICS: &[&str] = &[
    "businessDescription",
    "booking",
    "services",
    "training",
    "policy",
    "payment_plans",
    "contact",
];

/// Returns one topic of the owner's published business data.
pub struct GetInformationTool {
    directory: Arc<dyn BusinessDirectory>,
}

impl GetInformationTool {
    pub fn new(directory: Arc<dyn BusinessDirectory>) -> Self {
        Self { directory }
    }
}

#[async_trait]
impl Tool for GetInformationTool {
    fn name(&self) -> &str {
        "get_information"
    }

    fn description(&self) -> &str {
        "Look up information about the business: description, booking process, \
         services and prices, training, policies, payment plans or contact details"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "info": {
                    "type": "string",
                    "enum": INFO_TOPICS,
                    "description": "The topic to look up"
                }
            },
            "required": ["info"]
        })
    }

    async fn invoke(
        &self,
        ctx: &ToolContext,
        input: serde_json::Value,
    ) -> Result<ToolOutput, ParleyError> {
        let Some(topic) = input["info"].as_str() else {
            return Ok(ToolOutput::error("missing required 'info' parameter"));
        };
        if !INFO_TOPICS.contains(&topic) {
            return Ok(ToolOutput::error(format!(
                "unknown topic '{topic}', expected one of: {}",
                INFO_TOPICS.join(", ")
            )));
        }

        match self.directory.business_info(ctx.owner_id(), topic).await? {
            Some(info) => Ok(ToolOutput::ok(info)),
            None => {
                debug!(owner_id = ctx.owner_id(), topic, "no business data for topic");
                Ok(ToolOutput::error(format!("data not found: {topic}")))
            }
        }
    }
}

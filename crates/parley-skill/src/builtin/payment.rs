// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Booking confirmation once the sender has paid the deposit.

use std::sync::Arc;

use async_trait::async_trait;
use parley_core::ParleyError;
use parley_core::traits::BusinessDirectory;
use parley_core::types::AppointmentDetails;
use serde_json::{Value, json};

use crate::tool::{Tool, ToolContext, ToolOutput};

/// Records a confirmed appointment for the sender.
pub struct ConfirmPaymentTool {
    directory: Arc<dyn BusinessDirectory>,
}

impl ConfirmPaymentTool {
    pub fn new(directory: Arc<dyn BusinessDirectory>) -> Self {
        Self { directory }
    }
}

#[async_trait]
impl Tool for ConfirmPaymentTool {
    fn name(&self) -> &str {
        "confirm_payment"
    }

    fn description(&self) -> &str {
        "Confirm the booking after the customer sent the deposit screenshot and their details"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "service": { "type": "string", "description": "Name of the booked service" },
                "deposit": { "type": "number", "description": "Deposit shown in the payment screenshot" },
                "deal_price": { "type": "number", "description": "Agreed price of the service" },
                "booked_datetime": { "type": "string", "description": "Date and time of the appointment" },
                "name": { "type": "string", "description": "Customer's full name" },
                "phone_number": { "type": "string", "description": "Customer's phone number" }
            },
            "required": ["service", "deposit", "deal_price", "booked_datetime", "name", "phone_number"]
        })
    }

    async fn invoke(&self, ctx: &ToolContext, input: Value) -> Result<ToolOutput, ParleyError> {
        let details: AppointmentDetails = match serde_json::from_value(input) {
            Ok(details) => details,
            Err(e) => return Ok(ToolOutput::error(format!("invalid booking details: {e}"))),
        };

        self.directory.record_appointment(&ctx.key, &details).await?;
        Ok(ToolOutput::ok(format!(
            "Appointment confirmed: {} on {} for {} (deposit {} of {})",
            details.service, details.booked_datetime, details.name, details.deposit, details.deal_price
        )))
    }
}

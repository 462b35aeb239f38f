// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Business directory trait: per-owner data the generator and its tools read.

use async_trait::async_trait;

use crate::error::ParleyError;
use crate::types::{AppointmentDetails, SenderKey};

/// Per-business data used while generating replies.
#[async_trait]
pub trait BusinessDirectory: Send + Sync + 'static {
    /// The system instruction configured for the business, if any.
    async fn instruction(&self, owner_id: &str) -> Result<Option<String>, ParleyError>;

    /// One topic of the business's published information (services, policy, ...).
    async fn business_info(
        &self,
        owner_id: &str,
        topic: &str,
    ) -> Result<Option<String>, ParleyError>;

    /// Records a booking confirmed by the sender.
    async fn record_appointment(
        &self,
        key: &SenderKey,
        details: &AppointmentDetails,
    ) -> Result<(), ParleyError>;
}

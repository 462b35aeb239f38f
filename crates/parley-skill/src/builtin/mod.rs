// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Built-in tools offered to the response generator.

pub mod availability;
pub mod information;
pub mod payment;

pub use availability::CheckAvailabilityTool;
pub use information::GetInformationTool;
pub use payment::ConfirmPaymentTool;

use std::sync::Arc;

use parley_config::model::SchedulingConfig;
use parley_core::traits::BusinessDirectory;

use crate::ToolRegistry;

/// Registers all built-in tools into the given registry.
pub fn register_builtins(
    registry: &mut ToolRegistry,
    directory: Arc<dyn BusinessDirectory>,
    scheduling: SchedulingConfig,
) {
    registry.register(Arc::new(GetInformationTool::new(directory.clone())));
    registry.register(Arc::new(CheckAvailabilityTool::new(scheduling)));
    registry.register(Arc::new(ConfirmPaymentTool::new(directory)));
}

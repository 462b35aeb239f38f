// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tool trait, registry, and built-in tools for Parley.
//!
//! The [`ToolRegistry`] manages tool lookup and generates Gemini-format
//! function declarations for the response generator.
//!
//! Built-in tools:
//! - [`builtin::GetInformationTool`] -- Business information by topic
//! - [`builtin::CheckAvailabilityTool`] -- Open appointment slots
//! - [`builtin::ConfirmPaymentTool`] -- Record a deposit-backed booking

pub mod builtin;
pub mod tool;

pub use tool::{Tool, ToolContext, ToolOutput, ToolRegistry};

// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for Parley.
//!
//! This crate provides the collaborator trait definitions, error types, and
//! common types shared by the dispatch engine and every adapter crate.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::ParleyError;
pub use types::{
    AdapterType, ContentBlock, ConversationHistory, ConversationMessage, HealthStatus,
    InboundEvent, Role, SenderKey,
};

pub use traits::{
    BusinessDirectory, ConversationStore, MessagingPlatform, PluginAdapter, ResponseGenerator,
};

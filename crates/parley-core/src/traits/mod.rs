// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator trait definitions consumed by the dispatch engine.
//!
//! Every adapter extends the [`PluginAdapter`] base trait and uses
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod directory;
pub mod generator;
pub mod platform;
pub mod store;

pub use adapter::PluginAdapter;
pub use directory::BusinessDirectory;
pub use generator::ResponseGenerator;
pub use platform::MessagingPlatform;
pub use store::ConversationStore;

// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Parley.
//!
//! Provides in-memory collaborators for fast, deterministic tests without
//! external services.
//!
//! # Components
//!
//! - [`MemoryStore`] - Conversation store and business directory backed by hash maps
//! - [`MockPlatform`] - Messaging platform with scripted remote history and captured sends
//! - [`MockGenerator`] - Response generator with scripted replies, delay and concurrency tracking

pub mod fixtures;
pub mod memory_store;
pub mod mock_generator;
pub mod mock_platform;

pub use memory_store::MemoryStore;
pub use mock_generator::MockGenerator;
pub use mock_platform::MockPlatform;

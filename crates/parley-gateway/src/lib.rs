// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Webhook HTTP gateway for Parley.
//!
//! Exposes the platform's webhook endpoints (subscription verification and
//! event delivery) plus a health check. Delivered events are handed to the
//! [`parley_agent::InboundPipeline`] on a background task so the platform
//! always gets a fast acknowledgement.

pub mod handlers;
pub mod server;

pub use server::{GatewayState, ServerConfig, WebhookAuth, router, start_server};

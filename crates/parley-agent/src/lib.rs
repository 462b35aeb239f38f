// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Debounced per-sender dispatch for Parley.
//!
//! Inbound webhook events flow through the [`InboundPipeline`]: echoes and
//! redeliveries are dropped by the [`Deduplicator`], the message is stored,
//! and the [`DispatchEngine`] turns each burst of messages from one sender
//! into a single generation cycle. Before generating, the
//! [`HistoryReconciler`] tops up suspiciously short local histories from the
//! platform.

pub mod dedup;
pub mod dispatch;
pub mod pipeline;
pub mod reconcile;
pub mod shutdown;

pub use dedup::Deduplicator;
pub use dispatch::{
    DispatchEngine, DispatchPhase, DispatchSettings, Submission, deliverable_texts,
};
pub use pipeline::{InboundOutcome, InboundPipeline};
pub use reconcile::HistoryReconciler;

// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock response generator for deterministic testing.
//!
//! `MockGenerator` pops scripted replies from a FIFO queue, records the
//! history it was given on every call, optionally sleeps to simulate a slow
//! model, and tracks how many calls overlap per sender.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use parley_core::ParleyError;
use parley_core::traits::{PluginAdapter, ResponseGenerator};
use parley_core::types::{AdapterType, ConversationMessage, HealthStatus, SenderKey};

/// One scripted outcome of a `generate` call.
#[derive(Debug, Clone)]
pub enum MockReply {
    Messages(Vec<ConversationMessage>),
    Error(String),
}

#[derive(Default)]
struct Concurrency {
    current: HashMap<SenderKey, usize>,
    max: HashMap<SenderKey, usize>,
}

/// A mock response generator.
///
/// When the script is empty every call answers with a single assistant text
/// `"mock reply"`.
#[derive(Clone, Default)]
pub struct MockGenerator {
    script: Arc<Mutex<VecDeque<MockReply>>>,
    calls: Arc<Mutex<Vec<(SenderKey, Vec<ConversationMessage>)>>>,
    concurrency: Arc<Mutex<Concurrency>>,
    delay: Duration,
}

impl MockGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Each call sleeps for `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Queue an assistant text reply.
    pub async fn push_text(&self, text: &str) {
        self.push(MockReply::Messages(vec![ConversationMessage::assistant_text(
            text,
        )]))
        .await;
    }

    /// Queue a failing call.
    pub async fn push_error(&self, message: &str) {
        self.push(MockReply::Error(message.to_string())).await;
    }

    pub async fn push(&self, reply: MockReply) {
        self.script.lock().await.push_back(reply);
    }

    /// Histories passed to `generate`, one entry per call.
    pub async fn calls(&self) -> Vec<(SenderKey, Vec<ConversationMessage>)> {
        self.calls.lock().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.calls.lock().await.len()
    }

    /// Highest number of simultaneously running calls observed for a sender.
    pub async fn max_in_flight(&self, key: &SenderKey) -> usize {
        self.concurrency
            .lock()
            .await
            .max
            .get(key)
            .copied()
            .unwrap_or(0)
    }

    async fn enter(&self, key: &SenderKey) {
        let mut c = self.concurrency.lock().await;
        let current = c.current.entry(key.clone()).or_insert(0);
        *current += 1;
        let now = *current;
        let max = c.max.entry(key.clone()).or_insert(0);
        *max = (*max).max(now);
    }

    async fn leave(&self, key: &SenderKey) {
        let mut c = self.concurrency.lock().await;
        if let Some(current) = c.current.get_mut(key) {
            *current = current.saturating_sub(1);
        }
    }
}

#[async_trait]
impl PluginAdapter for MockGenerator {
    fn name(&self) -> &str {
        "mock-generator"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Generator
    }

    async fn health_check(&self) -> Result<HealthStatus, ParleyError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl ResponseGenerator for MockGenerator {
    async fn generate(
        &self,
        key: &SenderKey,
        history: &[ConversationMessage],
    ) -> Result<Vec<ConversationMessage>, ParleyError> {
        self.calls
            .lock()
            .await
            .push((key.clone(), history.to_vec()));
        self.enter(key).await;
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let reply = self.script.lock().await.pop_front();
        self.leave(key).await;

        match reply {
            Some(MockReply::Messages(messages)) => Ok(messages),
            Some(MockReply::Error(message)) => Err(ParleyError::generator(message)),
            None => Ok(vec![ConversationMessage::assistant_text("mock reply")]),
        }
    }
}

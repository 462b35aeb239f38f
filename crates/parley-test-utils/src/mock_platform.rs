// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock messaging platform for deterministic testing.
//!
//! `MockPlatform` serves scripted remote histories and captures every
//! outbound `send_text` call for assertion in tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use parley_core::ParleyError;
use parley_core::traits::{MessagingPlatform, PluginAdapter};
use parley_core::types::{AdapterType, HealthStatus, PlatformMessage, SenderKey};

/// A mock messaging platform.
#[derive(Clone, Default)]
pub struct MockPlatform {
    remote: Arc<Mutex<HashMap<SenderKey, Vec<PlatformMessage>>>>,
    sent: Arc<Mutex<Vec<(SenderKey, String)>>>,
    fail_fetch: Arc<AtomicBool>,
    fail_send: Arc<AtomicBool>,
    fetches: Arc<AtomicUsize>,
    fetch_delay: Duration,
    send_delay: Duration,
}

impl MockPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Each fetch snapshots the remote history, then sleeps for `delay`
    /// before returning it.
    pub fn with_fetch_delay(mut self, delay: Duration) -> Self {
        self.fetch_delay = delay;
        self
    }

    /// Each send sleeps for `delay` before it is captured.
    pub fn with_send_delay(mut self, delay: Duration) -> Self {
        self.send_delay = delay;
        self
    }

    /// Set the remote history returned for a sender (oldest first).
    pub async fn set_remote_history(&self, key: &SenderKey, messages: Vec<PlatformMessage>) {
        self.remote.lock().await.insert(key.clone(), messages);
    }

    /// Make `fetch_remote_history` return an error.
    pub fn fail_fetch(&self, fail: bool) {
        self.fail_fetch.store(fail, Ordering::SeqCst);
    }

    /// Make `send_text` return an error. Failed sends are not captured.
    pub fn fail_send(&self, fail: bool) {
        self.fail_send.store(fail, Ordering::SeqCst);
    }

    /// Number of `fetch_remote_history` calls, including failed ones.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// All texts delivered so far, in send order.
    pub async fn sent(&self) -> Vec<(SenderKey, String)> {
        self.sent.lock().await.clone()
    }

    /// Texts delivered to one sender.
    pub async fn sent_to(&self, key: &SenderKey) -> Vec<String> {
        self.sent
            .lock()
            .await
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, text)| text.clone())
            .collect()
    }
}

#[async_trait]
impl PluginAdapter for MockPlatform {
    fn name(&self) -> &str {
        "mock-platform"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Platform
    }

    async fn health_check(&self) -> Result<HealthStatus, ParleyError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl MessagingPlatform for MockPlatform {
    async fn fetch_remote_history(
        &self,
        key: &SenderKey,
    ) -> Result<Vec<PlatformMessage>, ParleyError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(ParleyError::platform("mock fetch failure"));
        }
        let snapshot = self
            .remote
            .lock()
            .await
            .get(key)
            .cloned()
            .unwrap_or_default();
        if !self.fetch_delay.is_zero() {
            tokio::time::sleep(self.fetch_delay).await;
        }
        Ok(snapshot)
    }

    async fn send_text(&self, key: &SenderKey, text: &str) -> Result<(), ParleyError> {
        if self.fail_send.load(Ordering::SeqCst) {
            return Err(ParleyError::platform("mock send failure"));
        }
        if !self.send_delay.is_zero() {
            tokio::time::sleep(self.send_delay).await;
        }
        self.sent.lock().await.push((key.clone(), text.to_string()));
        Ok(())
    }
}

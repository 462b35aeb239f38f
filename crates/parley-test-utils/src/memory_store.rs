// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory conversation store for deterministic testing.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use parley_core::ParleyError;
use parley_core::traits::{BusinessDirectory, ConversationStore, PluginAdapter};
use parley_core::types::{
    AdapterType, AppointmentDetails, ConversationHistory, ConversationMessage, HealthStatus,
    SenderKey,
};

/// A conversation store that keeps everything in hash maps.
///
/// Also implements [`BusinessDirectory`] so generator and tool tests can use
/// one object for all per-business data.
#[derive(Clone, Default)]
pub struct MemoryStore {
    histories: Arc<Mutex<HashMap<SenderKey, ConversationHistory>>>,
    paused_senders: Arc<Mutex<HashSet<SenderKey>>>,
    paused_owners: Arc<Mutex<HashSet<String>>>,
    instructions: Arc<Mutex<HashMap<String, String>>>,
    business_info: Arc<Mutex<HashMap<(String, String), String>>>,
    appointments: Arc<Mutex<Vec<(SenderKey, AppointmentDetails)>>>,
    fail_writes: Arc<AtomicBool>,
    overwrites: Arc<AtomicUsize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a sender's history directly, bypassing `append`.
    pub async fn seed(&self, key: &SenderKey, messages: Vec<ConversationMessage>) {
        self.histories.lock().await.insert(key.clone(), messages);
    }

    /// Snapshot of a sender's history.
    pub async fn history(&self, key: &SenderKey) -> ConversationHistory {
        self.histories
            .lock()
            .await
            .get(key)
            .cloned()
            .unwrap_or_default()
    }

    /// Make every subsequent `append`/`overwrite` fail.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful `overwrite` calls.
    pub fn overwrite_count(&self) -> usize {
        self.overwrites.load(Ordering::SeqCst)
    }

    pub async fn pause_sender(&self, key: &SenderKey) {
        self.paused_senders.lock().await.insert(key.clone());
    }

    pub async fn pause_owner(&self, owner_id: &str) {
        self.paused_owners.lock().await.insert(owner_id.to_string());
    }

    pub async fn set_instruction(&self, owner_id: &str, instruction: &str) {
        self.instructions
            .lock()
            .await
            .insert(owner_id.to_string(), instruction.to_string());
    }

    pub async fn set_business_info(&self, owner_id: &str, topic: &str, value: &str) {
        self.business_info
            .lock()
            .await
            .insert((owner_id.to_string(), topic.to_string()), value.to_string());
    }

    /// Appointments recorded through [`BusinessDirectory::record_appointment`].
    pub async fn appointments(&self) -> Vec<(SenderKey, AppointmentDetails)> {
        self.appointments.lock().await.clone()
    }

    fn check_writable(&self) -> Result<(), ParleyError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(ParleyError::Storage {
                source: "memory store configured to fail writes".into(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl PluginAdapter for MemoryStore {
    fn name(&self) -> &str {
        "memory-store"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Store
    }

    async fn health_check(&self) -> Result<HealthStatus, ParleyError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl ConversationStore for MemoryStore {
    async fn append(
        &self,
        key: &SenderKey,
        messages: &[ConversationMessage],
    ) -> Result<(), ParleyError> {
        self.check_writable()?;
        self.histories
            .lock()
            .await
            .entry(key.clone())
            .or_default()
            .extend_from_slice(messages);
        Ok(())
    }

    async fn read(&self, key: &SenderKey) -> Result<ConversationHistory, ParleyError> {
        Ok(self.history(key).await)
    }

    async fn overwrite(
        &self,
        key: &SenderKey,
        expected_len: usize,
        messages: &[ConversationMessage],
    ) -> Result<bool, ParleyError> {
        self.check_writable()?;
        let mut histories = self.histories.lock().await;
        let current = histories.get(key).map_or(0, Vec::len);
        if current != expected_len {
            return Ok(false);
        }
        histories.insert(key.clone(), messages.to_vec());
        self.overwrites.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }

    async fn is_sender_active(&self, key: &SenderKey) -> Result<bool, ParleyError> {
        Ok(!self.paused_senders.lock().await.contains(key))
    }

    async fn is_owner_bot_active(&self, owner_id: &str) -> Result<bool, ParleyError> {
        Ok(!self.paused_owners.lock().await.contains(owner_id))
    }
}

#[async_trait]
impl BusinessDirectory for MemoryStore {
    async fn instruction(&self, owner_id: &str) -> Result<Option<String>, ParleyError> {
        Ok(self.instructions.lock().await.get(owner_id).cloned())
    }

    async fn business_info(
        &self,
        owner_id: &str,
        topic: &str,
    ) -> Result<Option<String>, ParleyError> {
        Ok(self
            .business_info
            .lock()
            .await
            .get(&(owner_id.to_string(), topic.to_string()))
            .cloned())
    }

    async fn record_appointment(
        &self,
        key: &SenderKey,
        details: &AppointmentDetails,
    ) -> Result<(), ParleyError> {
        self.check_writable()?;
        self.appointments
            .lock()
            .await
            .push((key.clone(), details.clone()));
        Ok(())
    }
}

// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the conversation store and business directory.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use parley_config::model::StorageConfig;
use parley_core::traits::{BusinessDirectory, ConversationStore, PluginAdapter};
use parley_core::types::{
    AdapterType, AppointmentDetails, ConversationHistory, ConversationMessage, HealthStatus,
    SenderKey,
};
use parley_core::ParleyError;

use crate::database::{Database, map_tr_err};
use crate::queries;

/// SQLite-backed store.
///
/// The database is opened lazily by [`SqliteStore::initialize`]; every
/// other operation fails until then.
pub struct SqliteStore {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStore {
    /// Create a store for the configured path without opening it.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Create and initialize in one step.
    pub async fn open(config: StorageConfig) -> Result<Self, ParleyError> {
        let store = Self::new(config);
        store.initialize().await?;
        Ok(store)
    }

    /// Open the database and run migrations.
    pub async fn initialize(&self) -> Result<(), ParleyError> {
        let db = Database::open(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| ParleyError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite store initialized");
        Ok(())
    }

    fn db(&self) -> Result<&Database, ParleyError> {
        self.db.get().ok_or_else(|| ParleyError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }

    // --- Admin operations ---

    pub async fn set_sender_active(&self, key: &SenderKey, active: bool) -> Result<(), ParleyError> {
        queries::senders::set_active(self.db()?, key, active).await?;
        info!(owner_id = %key.owner_id, sender_id = %key.sender_id, active, "sender bot switch changed");
        Ok(())
    }

    pub async fn set_owner_bot_active(&self, owner_id: &str, active: bool) -> Result<(), ParleyError> {
        queries::owners::set_bot_active(self.db()?, owner_id, active).await?;
        info!(owner_id, active, "owner bot switch changed");
        Ok(())
    }

    pub async fn set_instruction(&self, owner_id: &str, instruction: &str) -> Result<(), ParleyError> {
        queries::owners::set_instruction(self.db()?, owner_id, instruction).await
    }

    /// Replace the business data document (`{topic: value, ...}`) for an owner.
    pub async fn set_business_data(
        &self,
        owner_id: &str,
        data: &serde_json::Value,
    ) -> Result<(), ParleyError> {
        queries::owners::set_business_data(self.db()?, owner_id, data).await
    }

    /// Delete a sender and its conversation. Returns the number of removed messages.
    pub async fn delete_sender(&self, key: &SenderKey) -> Result<usize, ParleyError> {
        let removed = queries::senders::delete(self.db()?, key).await?;
        info!(owner_id = %key.owner_id, sender_id = %key.sender_id, removed, "sender deleted");
        Ok(removed)
    }

    pub async fn appointments(
        &self,
        owner_id: &str,
    ) -> Result<Vec<(String, AppointmentDetails)>, ParleyError> {
        queries::appointments::list_for_owner(self.db()?, owner_id).await
    }
}

#[async_trait]
impl PluginAdapter for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Store
    }

    async fn health_check(&self) -> Result<HealthStatus, ParleyError> {
        let Ok(db) = self.db() else {
            return Ok(HealthStatus::Unhealthy("database not initialized".into()));
        };
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> { conn.execute_batch("SELECT 1;") })
            .await
            .map_err(map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), ParleyError> {
        if let Some(db) = self.db.get() {
            db.checkpoint().await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl ConversationStore for SqliteStore {
    async fn append(
        &self,
        key: &SenderKey,
        messages: &[ConversationMessage],
    ) -> Result<(), ParleyError> {
        queries::messages::append(self.db()?, key, messages).await
    }

    async fn read(&self, key: &SenderKey) -> Result<ConversationHistory, ParleyError> {
        queries::messages::read(self.db()?, key).await
    }

    async fn overwrite(
        &self,
        key: &SenderKey,
        expected_len: usize,
        messages: &[ConversationMessage],
    ) -> Result<bool, ParleyError> {
        queries::messages::overwrite(self.db()?, key, expected_len, messages).await
    }

    async fn is_sender_active(&self, key: &SenderKey) -> Result<bool, ParleyError> {
        queries::senders::is_active(self.db()?, key).await
    }

    async fn is_owner_bot_active(&self, owner_id: &str) -> Result<bool, ParleyError> {
        queries::owners::is_bot_active(self.db()?, owner_id).await
    }
}

#[async_trait]
impl BusinessDirectory for SqliteStore {
    async fn instruction(&self, owner_id: &str) -> Result<Option<String>, ParleyError> {
        queries::owners::instruction(self.db()?, owner_id).await
    }

    async fn business_info(
        &self,
        owner_id: &str,
        topic: &str,
    ) -> Result<Option<String>, ParleyError> {
        let data = queries::owners::business_data(self.db()?, owner_id).await?;
        Ok(data.get(topic).map(|value| match value {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }))
    }

    async fn record_appointment(
        &self,
        key: &SenderKey,
        details: &AppointmentDetails,
    ) -> Result<(), ParleyError> {
        let id = queries::appointments::insert(self.db()?, key, details).await?;
        info!(
            owner_id = %key.owner_id,
            sender_id = %key.sender_id,
            appointment_id = id,
            service = %details.service,
            "appointment recorded"
        );
        Ok(())
    }
}

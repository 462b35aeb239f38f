// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `parley admin` command implementation.
//!
//! Operates directly on the SQLite database, so it works whether or not the
//! server is running. Pause switches take effect on the next inbound message.

use std::path::{Path, PathBuf};

use clap::Subcommand;
use parley_config::model::ParleyConfig;
use parley_core::ParleyError;
use parley_core::types::SenderKey;
use parley_storage::SqliteStore;

#[derive(Subcommand, Debug)]
pub enum AdminCommand {
    /// Stop replying to one customer. Their messages are still stored.
    PauseSender { owner_id: String, sender_id: String },
    /// Resume replying to one customer.
    ResumeSender { owner_id: String, sender_id: String },
    /// Stop replying to every customer of a business.
    PauseBot { owner_id: String },
    /// Resume replying for a business.
    ResumeBot { owner_id: String },
    /// Replace a business's system instruction with the contents of a file.
    SetInstruction { owner_id: String, file: PathBuf },
    /// Replace a business's information topics with a JSON object file.
    SetBusinessData { owner_id: String, file: PathBuf },
    /// Delete a customer and their stored conversation.
    DeleteSender { owner_id: String, sender_id: String },
}

pub async fn run_admin(config: &ParleyConfig, command: AdminCommand) -> Result<(), ParleyError> {
    let store = SqliteStore::open(config.storage.clone()).await?;

    match command {
        AdminCommand::PauseSender { owner_id, sender_id } => {
            store
                .set_sender_active(&SenderKey::new(owner_id, sender_id), false)
                .await?;
            println!("sender paused");
        }
        AdminCommand::ResumeSender { owner_id, sender_id } => {
            store
                .set_sender_active(&SenderKey::new(owner_id, sender_id), true)
                .await?;
            println!("sender resumed");
        }
        AdminCommand::PauseBot { owner_id } => {
            store.set_owner_bot_active(&owner_id, false).await?;
            println!("bot paused for {owner_id}");
        }
        AdminCommand::ResumeBot { owner_id } => {
            store.set_owner_bot_active(&owner_id, true).await?;
            println!("bot resumed for {owner_id}");
        }
        AdminCommand::SetInstruction { owner_id, file } => {
            let instruction = read_file(&file)?;
            store.set_instruction(&owner_id, instruction.trim()).await?;
            println!("instruction updated for {owner_id}");
        }
        AdminCommand::SetBusinessData { owner_id, file } => {
            let data = parse_business_data(&read_file(&file)?)?;
            store.set_business_data(&owner_id, &data).await?;
            println!("business data updated for {owner_id}");
        }
        AdminCommand::DeleteSender { owner_id, sender_id } => {
            let removed = store
                .delete_sender(&SenderKey::new(owner_id, sender_id))
                .await?;
            println!("sender deleted ({removed} messages removed)");
        }
    }
    Ok(())
}

fn read_file(path: &Path) -> Result<String, ParleyError> {
    std::fs::read_to_string(path)
        .map_err(|e| ParleyError::Config(format!("cannot read {}: {e}", path.display())))
}

/// Business data must be a JSON object keyed by topic.
fn parse_business_data(content: &str) -> Result<serde_json::Value, ParleyError> {
    let data: serde_json::Value = serde_json::from_str(content)
        .map_err(|e| ParleyError::Config(format!("business data is not valid JSON: {e}")))?;
    if !data.is_object() {
        return Err(ParleyError::Config(
            "business data must be a JSON object keyed by topic".into(),
        ));
    }
    Ok(data)
}

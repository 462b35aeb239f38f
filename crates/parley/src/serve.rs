// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `parley serve` command implementation.
//!
//! Opens SQLite storage, builds the Instagram platform, the business tools
//! and the Gemini generator, wires them into the dispatch engine and inbound
//! pipeline, and serves the webhook gateway until a shutdown signal arrives.

use std::sync::Arc;
use std::time::Duration;

use parley_agent::{Deduplicator, DispatchEngine, DispatchSettings, InboundPipeline, shutdown};
use parley_config::model::ParleyConfig;
use parley_core::ParleyError;
use parley_core::traits::PluginAdapter;
use parley_gateway::{GatewayState, ServerConfig, WebhookAuth, start_server};
use parley_gemini::GeminiGenerator;
use parley_instagram::InstagramPlatform;
use parley_skill::ToolRegistry;
use parley_skill::builtin::register_builtins;
use parley_storage::SqliteStore;
use tracing::{info, warn};

/// Runs the `parley serve` command.
///
/// Returns once the gateway has stopped and in-flight dispatch cycles have
/// drained or the drain timeout expired.
pub async fn run_serve(config: ParleyConfig) -> Result<(), ParleyError> {
    init_tracing(&config.agent.log_level);

    info!(name = %config.agent.name, "starting parley serve");

    let store = Arc::new(SqliteStore::open(config.storage.clone()).await?);
    let platform = Arc::new(InstagramPlatform::new(&config.instagram)?);

    let mut tools = ToolRegistry::new();
    register_builtins(&mut tools, store.clone(), config.scheduling.clone());
    let tools = Arc::new(tools);
    info!(count = tools.len(), "tool registry initialized");

    let generator = Arc::new(GeminiGenerator::new(&config.gemini, store.clone(), tools)?);

    let engine = DispatchEngine::new(
        store.clone(),
        platform,
        generator,
        DispatchSettings::from(&config.dispatch),
    );
    let pipeline = Arc::new(InboundPipeline::new(
        Deduplicator::new(config.dispatch.dedup_expiry()),
        store.clone(),
        engine.clone(),
    ));
    info!(
        batch_window_ms = config.dispatch.batch_window_ms,
        dedup_expiry_secs = config.dispatch.dedup_expiry_secs,
        "dispatch engine ready"
    );

    if config.gateway.verify_token.is_none() {
        warn!("gateway.verify_token is not set; webhook subscription requests will be rejected");
    }
    if config.gateway.app_secret.is_none() {
        warn!("gateway.app_secret is not set; webhook payload signatures are not checked");
    }

    let cancel = shutdown::install_signal_handler();
    let state = GatewayState::new(pipeline, WebhookAuth::from(&config.gateway));
    let served = start_server(&ServerConfig::from(&config.gateway), state, cancel.clone()).await;
    cancel.cancel();

    shutdown_services(&engine, &store, config.dispatch.drain_timeout()).await;

    served?;
    info!("parley serve shutdown complete");
    Ok(())
}

/// Drains in-flight dispatch cycles, then checkpoints storage.
async fn shutdown_services(engine: &DispatchEngine, store: &SqliteStore, drain_timeout: Duration) {
    shutdown::drain_dispatch(engine, drain_timeout).await;
    if let Err(e) = store.shutdown().await {
        warn!(error = %e, "storage shutdown failed");
    }
}

/// Initializes the tracing subscriber. `RUST_LOG` overrides the configured level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("parley={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_core::traits::ConversationStore;
    use parley_core::types::{ConversationMessage, SenderKey};
    use parley_test_utils::{MockGenerator, MockPlatform};

    #[tokio::test]
    async fn shutdown_drains_cycles_and_checkpoints_storage() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = parley_config::load_and_validate_str("").unwrap();
        config.storage.database_path = dir.path().join("serve.db").display().to_string();
        let store = Arc::new(SqliteStore::open(config.storage.clone()).await.unwrap());
        let engine = DispatchEngine::new(
            store.clone(),
            Arc::new(MockPlatform::new()),
            Arc::new(MockGenerator::new()),
            DispatchSettings {
                batch_window: Duration::from_millis(50),
                restart_delay: Duration::from_millis(10),
                short_history_threshold: 1,
            },
        );
        let key = SenderKey::new("biz", "user");
        engine
            .submit(&key, ConversationMessage::user_text("hi"))
            .await
            .unwrap();

        shutdown_services(&engine, &store, Duration::from_secs(5)).await;

        assert_eq!(engine.active_cycles(), 0);
        assert_eq!(store.read(&key).await.unwrap().len(), 2);
        let wal = dir.path().join("serve.db-wal");
        let wal_len = std::fs::metadata(&wal).map(|m| m.len()).unwrap_or(0);
        assert_eq!(wal_len, 0);
    }
}

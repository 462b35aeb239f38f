// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Parley dispatch service.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level Parley configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ParleyConfig {
    /// Service identity and logging.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Debounce, dedup and reconciliation tuning.
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Webhook HTTP server settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Instagram Graph API settings.
    #[serde(default)]
    pub instagram: InstagramConfig,

    /// Gemini API settings.
    #[serde(default)]
    pub gemini: GeminiConfig,

    /// Appointment scheduling service settings.
    #[serde(default)]
    pub scheduling: SchedulingConfig,
}

/// Service identity configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Display name used in logs and the health endpoint.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_agent_name() -> String {
    "parley".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Dispatch engine tuning.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DispatchConfig {
    /// Debounce window measured from the first event of a burst.
    #[serde(default = "default_batch_window_ms")]
    pub batch_window_ms: u64,

    /// How long a processed event id is remembered.
    #[serde(default = "default_dedup_expiry_secs")]
    pub dedup_expiry_secs: u64,

    /// Local histories shorter than this are checked against the platform.
    #[serde(default = "default_short_history_threshold")]
    pub short_history_threshold: usize,

    /// Pause before re-running a cycle whose input went stale.
    #[serde(default = "default_restart_delay_ms")]
    pub restart_delay_ms: u64,

    /// How long shutdown waits for in-flight cycles.
    #[serde(default = "default_drain_timeout_secs")]
    pub drain_timeout_secs: u64,
}

impl DispatchConfig {
    pub fn batch_window(&self) -> Duration {
        Duration::from_millis(self.batch_window_ms)
    }

    pub fn dedup_expiry(&self) -> Duration {
        Duration::from_secs(self.dedup_expiry_secs)
    }

    pub fn restart_delay(&self) -> Duration {
        Duration::from_millis(self.restart_delay_ms)
    }

    pub fn drain_timeout(&self) -> Duration {
        Duration::from_secs(self.drain_timeout_secs)
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            batch_window_ms: default_batch_window_ms(),
            dedup_expiry_secs: default_dedup_expiry_secs(),
            short_history_threshold: default_short_history_threshold(),
            restart_delay_ms: default_restart_delay_ms(),
            drain_timeout_secs: default_drain_timeout_secs(),
        }
    }
}

fn default_batch_window_ms() -> u64 {
    5_000
}

fn default_dedup_expiry_secs() -> u64 {
    60
}

fn default_short_history_threshold() -> usize {
    4
}

fn default_restart_delay_ms() -> u64 {
    100
}

fn default_drain_timeout_secs() -> u64 {
    30
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL mode for concurrent reads.
    #[serde(default = "default_true")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: true,
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|d| d.join("parley").join("parley.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("parley.db"))
        .display()
        .to_string()
}

fn default_true() -> bool {
    true
}

/// Webhook HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Address the HTTP server binds to.
    #[serde(default = "default_host")]
    pub host: String,

    /// TCP port the HTTP server listens on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Token the platform echoes during webhook verification.
    #[serde(default)]
    pub verify_token: Option<String>,

    /// App secret for `X-Hub-Signature-256` checks. `None` disables the check.
    #[serde(default)]
    pub app_secret: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            verify_token: None,
            app_secret: None,
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Instagram Graph API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct InstagramConfig {
    /// Page access token. `None` requires the `INSTAGRAM_ACCESS_TOKEN` env var.
    #[serde(default)]
    pub access_token: Option<String>,

    /// Graph API base URL.
    #[serde(default = "default_instagram_base_url")]
    pub api_base_url: String,

    /// Graph API version segment.
    #[serde(default = "default_instagram_api_version")]
    pub api_version: String,
}

impl Default for InstagramConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            api_base_url: default_instagram_base_url(),
            api_version: default_instagram_api_version(),
        }
    }
}

fn default_instagram_base_url() -> String {
    "https://graph.instagram.com".to_string()
}

fn default_instagram_api_version() -> String {
    "v21.0".to_string()
}

/// Gemini API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GeminiConfig {
    /// API key. `None` requires the `GEMINI_API_KEY` env var.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model used for `generateContent`.
    #[serde(default = "default_gemini_model")]
    pub model: String,

    #[serde(default = "default_gemini_base_url")]
    pub api_base_url: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    /// Attempts per request before giving up.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay between retry attempts.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Function-calling round trips allowed per generation.
    #[serde(default = "default_max_tool_rounds")]
    pub max_tool_rounds: usize,

    /// Deadline for one `generateContent` request.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl GeminiConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_gemini_model(),
            api_base_url: default_gemini_base_url(),
            temperature: default_temperature(),
            max_output_tokens: default_max_output_tokens(),
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            max_tool_rounds: default_max_tool_rounds(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_gemini_model() -> String {
    "gemini-1.5-pro".to_string()
}

fn default_gemini_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_temperature() -> f32 {
    1.0
}

fn default_max_output_tokens() -> u32 {
    8192
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    5_000
}

fn default_max_tool_rounds() -> usize {
    5
}

fn default_request_timeout_secs() -> u64 {
    120
}

/// Appointment scheduling service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SchedulingConfig {
    /// Base URL of the scheduling service.
    #[serde(default = "default_scheduling_base_url")]
    pub base_url: String,

    /// Business identifier in scheduling URLs.
    #[serde(default)]
    pub business_slug: String,

    /// Service whose availability is queried.
    #[serde(default)]
    pub service_id: String,

    /// Time zone name as the scheduling service spells it.
    #[serde(default = "default_time_zone")]
    pub time_zone: String,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            base_url: default_scheduling_base_url(),
            business_slug: String::new(),
            service_id: String::new(),
            time_zone: default_time_zone(),
        }
    }
}

fn default_scheduling_base_url() -> String {
    "https://www.schedulista.com".to_string()
}

fn default_time_zone() -> String {
    "Eastern Time (US & Canada)".to_string()
}

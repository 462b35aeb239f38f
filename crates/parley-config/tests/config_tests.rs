// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Parley configuration system.

use parley_config::diagnostic::ConfigError;
use parley_config::model::ParleyConfig;
use parley_config::{load_and_validate_str, load_config_from_str};

/// Valid TOML with all known sections deserializes successfully.
#[test]
fn valid_toml_deserializes_into_parley_config() {
    let toml = r#"
[agent]
name = "salon-bot"
log_level = "debug"

[dispatch]
batch_window_ms = 3000
dedup_expiry_secs = 120
short_history_threshold = 6
restart_delay_ms = 250

[storage]
database_path = "/tmp/parley-test.db"
wal_mode = false

[gateway]
host = "0.0.0.0"
port = 9000
verify_token = "verify-me"
app_secret = "s3cret"

[instagram]
access_token = "IGQ-token"
api_version = "v19.0"

[gemini]
api_key = "gm-key"
model = "gemini-1.5-flash"
max_retries = 2
retry_delay_ms = 10

[scheduling]
business_slug = "lash-studio"
service_id = "1234"
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.agent.name, "salon-bot");
    assert_eq!(config.agent.log_level, "debug");
    assert_eq!(config.dispatch.batch_window_ms, 3000);
    assert_eq!(config.dispatch.dedup_expiry_secs, 120);
    assert_eq!(config.dispatch.short_history_threshold, 6);
    assert_eq!(config.dispatch.restart_delay_ms, 250);
    assert_eq!(config.storage.database_path, "/tmp/parley-test.db");
    assert!(!config.storage.wal_mode);
    assert_eq!(config.gateway.port, 9000);
    assert_eq!(config.gateway.verify_token.as_deref(), Some("verify-me"));
    assert_eq!(config.gateway.app_secret.as_deref(), Some("s3cret"));
    assert_eq!(config.instagram.access_token.as_deref(), Some("IGQ-token"));
    assert_eq!(config.instagram.api_version, "v19.0");
    assert_eq!(config.instagram.api_base_url, "https://graph.instagram.com");
    assert_eq!(config.gemini.model, "gemini-1.5-flash");
    assert_eq!(config.gemini.max_retries, 2);
    assert_eq!(config.scheduling.business_slug, "lash-studio");
    assert_eq!(config.scheduling.time_zone, "Eastern Time (US & Canada)");
}

/// Empty TOML produces the documented defaults.
#[test]
fn empty_toml_uses_defaults() {
    let config = load_config_from_str("").expect("empty config should load");
    assert_eq!(config.agent.name, "parley");
    assert_eq!(config.dispatch.batch_window_ms, 5000);
    assert_eq!(config.dispatch.dedup_expiry_secs, 60);
    assert_eq!(config.dispatch.short_history_threshold, 4);
    assert_eq!(config.dispatch.restart_delay_ms, 100);
    assert_eq!(config.gateway.port, 8080);
    assert!(config.storage.wal_mode);
    assert!(config.gateway.verify_token.is_none());
    assert!(config.gemini.api_key.is_none());
}

#[test]
fn dispatch_durations_follow_fields() {
    let config = ParleyConfig::default();
    assert_eq!(config.dispatch.batch_window().as_millis(), 5000);
    assert_eq!(config.dispatch.dedup_expiry().as_secs(), 60);
    assert_eq!(config.dispatch.restart_delay().as_millis(), 100);
}

/// Unknown field in [dispatch] produces an UnknownKey diagnostic with a suggestion.
#[test]
fn unknown_dispatch_key_is_suggested() {
    let toml = r#"
[dispatch]
batch_windw_ms = 10
"#;

    let errors = load_and_validate_str(toml).expect_err("should reject unknown field");
    let found = errors.iter().any(|e| {
        matches!(
            e,
            ConfigError::UnknownKey { key, suggestion: Some(s), .. }
                if key == "batch_windw_ms" && s == "batch_window_ms"
        )
    });
    assert!(found, "expected a suggestion for batch_window_ms");
}

/// Unknown top-level section is rejected.
#[test]
fn unknown_section_is_rejected() {
    let toml = r#"
[telegram]
bot_token = "abc"
"#;

    let err = load_config_from_str(toml).expect_err("should reject unknown section");
    assert!(format!("{err}").contains("telegram"));
}

/// Wrong value types are reported, not silently coerced.
#[test]
fn wrong_type_is_reported() {
    let toml = r#"
[gateway]
port = "eighty"
"#;

    let errors = load_and_validate_str(toml).expect_err("should reject wrong type");
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::InvalidType { .. }))
    );
}

/// Semantic validation runs after a successful parse.
#[test]
fn validation_errors_surface_through_load_and_validate() {
    let toml = r#"
[dispatch]
batch_window_ms = 0
dedup_expiry_secs = 0
"#;

    let errors = load_and_validate_str(toml).expect_err("zero windows are invalid");
    assert_eq!(errors.len(), 2);
    assert!(
        errors
            .iter()
            .all(|e| matches!(e, ConfigError::Validation { .. }))
    );
}

/// Diagnostics render through miette without panicking.
#[test]
fn diagnostics_render_with_help_text() {
    use miette::Diagnostic;

    let errors = load_and_validate_str("[gateway]\nverfy_token = \"x\"\n").unwrap_err();
    let help = errors[0].help().map(|h| h.to_string()).unwrap_or_default();
    assert!(help.contains("verify_token"), "help was: {help}");
}

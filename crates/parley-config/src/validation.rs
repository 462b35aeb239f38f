// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes.
//! All problems are collected; validation never fails fast.

use crate::diagnostic::ConfigError;
use crate::model::ParleyConfig;

/// Validate a deserialized configuration for semantic correctness.
pub fn validate_config(config: &ParleyConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let dispatch = &config.dispatch;
    if dispatch.batch_window_ms == 0 {
        errors.push(ConfigError::validation(
            "dispatch.batch_window_ms must be greater than zero",
        ));
    }
    if dispatch.dedup_expiry_secs == 0 {
        errors.push(ConfigError::validation(
            "dispatch.dedup_expiry_secs must be greater than zero",
        ));
    }
    if dispatch.short_history_threshold == 0 {
        errors.push(ConfigError::validation(
            "dispatch.short_history_threshold must be at least 1",
        ));
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::validation(
            "storage.database_path must not be empty",
        ));
    }

    let host = config.gateway.host.trim();
    if host.is_empty() {
        errors.push(ConfigError::validation("gateway.host must not be empty"));
    } else {
        let is_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_hostname = host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-');
        if !is_ip && !is_hostname {
            errors.push(ConfigError::validation(format!(
                "gateway.host `{host}` is not a valid IP address or hostname"
            )));
        }
    }
    if config.gateway.port == 0 {
        errors.push(ConfigError::validation("gateway.port must not be zero"));
    }

    if config.gemini.max_retries == 0 {
        errors.push(ConfigError::validation(
            "gemini.max_retries must be at least 1",
        ));
    }
    if config.gemini.request_timeout_secs == 0 {
        errors.push(ConfigError::validation(
            "gemini.request_timeout_secs must not be zero",
        ));
    }
    if !(0.0..=2.0).contains(&config.gemini.temperature) {
        errors.push(ConfigError::validation(format!(
            "gemini.temperature must be between 0.0 and 2.0, got {}",
            config.gemini.temperature
        )));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

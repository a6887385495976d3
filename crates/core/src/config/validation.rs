//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `generation`, `api_host` or `user_agent` is empty
    /// - `local_assets` is empty or an entry does not resolve against `scope_url`
    /// - `scope_url` is not an absolute http(s) URL
    /// - a `remote_assets` entry is not an absolute http(s) URL
    /// - `max_bytes` is 0 or exceeds 50MB
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.generation.trim().is_empty() {
            return Err(invalid("generation", "must not be empty"));
        }

        if self.api_host.trim().is_empty() {
            return Err(invalid("api_host", "must not be empty"));
        }

        if self.user_agent.is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }

        let scope = self.scope().map_err(|reason| invalid("scope_url", reason))?;

        if self.local_assets.is_empty() {
            return Err(invalid("local_assets", "at least one mandatory asset is required"));
        }
        for asset in &self.local_assets {
            crate::request::resolve(&scope, asset).map_err(|e| invalid("local_assets", format!("{asset}: {e}")))?;
        }

        for asset in &self.remote_assets {
            crate::request::canonicalize(asset)
                .map_err(|e| invalid("remote_assets", format!("{asset}: {e}")))?;
        }

        if self.max_bytes == 0 {
            return Err(invalid("max_bytes", "must be greater than 0"));
        }
        if self.max_bytes > 50 * 1024 * 1024 {
            return Err(invalid("max_bytes", "must not exceed 50MB"));
        }

        if self.timeout_ms < 100 {
            return Err(invalid("timeout_ms", "must be at least 100ms"));
        }
        if self.timeout_ms > 300_000 {
            return Err(invalid("timeout_ms", "must not exceed 5 minutes (300000ms)"));
        }

        if self.remote_assets.is_empty() {
            tracing::warn!("no remote assets configured; only mandatory assets will be precached");
        }

        Ok(())
    }
}

//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (GRAINES_*)
//! 2. TOML config file (if GRAINES_CONFIG_FILE set)
//! 3. Built-in defaults
//!
//! The defaults describe the deployed application; a configuration is fixed
//! for the lifetime of one coordinator.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use url::Url;

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (GRAINES_*)
/// 2. TOML config file (if GRAINES_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Name of the current cache generation.
    ///
    /// Set via GRAINES_GENERATION environment variable.
    #[serde(default = "default_generation")]
    pub generation: String,

    /// Base URL the worker is registered under; relative assets resolve against it.
    ///
    /// Set via GRAINES_SCOPE_URL environment variable.
    #[serde(default = "default_scope_url")]
    pub scope_url: String,

    /// Mandatory assets, bundled with the deployment.
    #[serde(default = "default_local_assets")]
    pub local_assets: Vec<String>,

    /// Best-effort assets served from a CDN.
    #[serde(default = "default_remote_assets")]
    pub remote_assets: Vec<String>,

    /// Host whose requests always go to the network.
    ///
    /// Set via GRAINES_API_HOST environment variable.
    #[serde(default = "default_api_host")]
    pub api_host: String,

    /// Path to SQLite cache database.
    ///
    /// Set via GRAINES_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for HTTP requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum bytes to fetch per request.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// HTTP request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_generation() -> String {
    "gardien-graines-v3".into()
}

fn default_scope_url() -> String {
    "http://localhost:8080/".into()
}

fn default_local_assets() -> Vec<String> {
    vec!["./index.html".into(), "./manifest.json".into()]
}

fn default_remote_assets() -> Vec<String> {
    [
        "https://cdnjs.cloudflare.com/ajax/libs/font-awesome/6.4.0/css/all.min.css",
        "https://cdnjs.cloudflare.com/ajax/libs/font-awesome/6.4.0/webfonts/fa-solid-900.woff2",
        "https://cdnjs.cloudflare.com/ajax/libs/font-awesome/6.4.0/webfonts/fa-regular-400.woff2",
        "https://cdnjs.cloudflare.com/ajax/libs/jspdf/2.5.1/jspdf.umd.min.js",
        "https://cdnjs.cloudflare.com/ajax/libs/jspdf-autotable/3.5.29/jspdf.plugin.autotable.min.js",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_api_host() -> String {
    "api.github.com".into()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./graines-cache.sqlite")
}

fn default_user_agent() -> String {
    "graines-worker/0.1".into()
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_timeout_ms() -> u64 {
    20_000
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            generation: default_generation(),
            scope_url: default_scope_url(),
            local_assets: default_local_assets(),
            remote_assets: default_remote_assets(),
            api_host: default_api_host(),
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Parsed scope URL.
    pub fn scope(&self) -> Result<Url, String> {
        let url = Url::parse(&self.scope_url).map_err(|e| e.to_string())?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            scheme => Err(format!("unsupported scheme: {scheme}")),
        }
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("GRAINES_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("GRAINES_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}

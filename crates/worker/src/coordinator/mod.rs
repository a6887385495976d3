//! The offline cache coordinator.
//!
//! Four entry points, one per host trigger:
//!
//! - [`Coordinator::install`] precaches a fresh generation
//! - [`Coordinator::activate`] purges every other generation and claims clients
//! - [`Coordinator::handle_fetch`] routes an intercepted request
//! - [`Coordinator::on_message`] applies control commands
//!
//! The coordinator owns no I/O of its own; cache, network and lifecycle
//! controls arrive as [`Capabilities`].

pub mod activate;
pub mod control;
pub mod install;
pub mod route;
pub mod write_behind;

use std::sync::Arc;

use graines_core::{AppConfig, CacheStorage, ClientControl, Error, Network, request};
use url::Url;

pub use activate::ActivateReport;
pub use control::{ControlCommand, MessageOutcome};
pub use install::InstallReport;
pub use route::{Classification, FetchOutcome, ResponseSource};
pub use write_behind::WriteBehind;

/// Host-provided capabilities.
#[derive(Clone)]
pub struct Capabilities {
    pub cache: Arc<dyn CacheStorage>,
    pub network: Arc<dyn Network>,
    pub control: Arc<dyn ClientControl>,
}

/// Configuration resolved once at construction.
#[derive(Debug, Clone)]
pub struct Settings {
    pub generation: String,
    pub local_assets: Vec<Url>,
    pub remote_assets: Vec<Url>,
    pub api_host: String,
}

impl Settings {
    pub fn from_config(config: &AppConfig) -> Result<Self, Error> {
        let scope = config.scope().map_err(Error::InvalidUrl)?;

        let local_assets = config
            .local_assets
            .iter()
            .map(|asset| request::resolve(&scope, asset).map_err(|e| Error::InvalidUrl(format!("{asset}: {e}"))))
            .collect::<Result<Vec<_>, _>>()?;

        let remote_assets = config
            .remote_assets
            .iter()
            .map(|asset| request::canonicalize(asset).map_err(|e| Error::InvalidUrl(format!("{asset}: {e}"))))
            .collect::<Result<Vec<_>, _>>()?;

        if config.generation.trim().is_empty() {
            return Err(Error::InvalidInput("generation cannot be empty".into()));
        }

        Ok(Self {
            generation: config.generation.clone(),
            local_assets,
            remote_assets,
            api_host: config.api_host.to_ascii_lowercase(),
        })
    }
}

/// Offline cache coordinator for one deployed version.
pub struct Coordinator {
    settings: Settings,
    cache: Arc<dyn CacheStorage>,
    network: Arc<dyn Network>,
    control: Arc<dyn ClientControl>,
    writes: WriteBehind,
}

impl Coordinator {
    pub fn new(config: &AppConfig, capabilities: Capabilities) -> Result<Self, Error> {
        let settings = Settings::from_config(config)?;
        Ok(Self::with_settings(settings, capabilities))
    }

    pub fn with_settings(settings: Settings, capabilities: Capabilities) -> Self {
        let Capabilities { cache, network, control } = capabilities;
        Self { settings, cache, network, control, writes: WriteBehind::default() }
    }

    /// Name of the current cache generation.
    pub fn generation(&self) -> &str {
        &self.settings.generation
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Wait for every detached cache write spawned so far.
    pub async fn settle(&self) -> usize {
        self.writes.settle().await
    }
}

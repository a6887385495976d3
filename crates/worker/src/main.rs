//! graines-worker entry point.
//!
//! Boots the offline cache coordinator behind the stdio bridge: one JSON
//! trigger per stdin line, one JSON reply per stdout line.
//! Logging goes to stderr to keep stdout for replies.

use std::sync::Arc;

use anyhow::Result;
use graines_client::{FetchClient, FetchConfig};
use graines_core::{AppConfig, CacheDb};
use graines_worker::{Capabilities, Coordinator, Host, Lifecycle};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    tracing::info!(generation = %config.generation, db = %config.db_path.display(), "starting graines worker on stdio");

    let cache = Arc::new(CacheDb::open(&config.db_path).await?);
    let network = Arc::new(FetchClient::new(FetchConfig::from(&config))?);
    let lifecycle = Arc::new(Lifecycle::default());
    let capabilities = Capabilities { cache, network, control: lifecycle.clone() };
    let host = Host::new(Coordinator::new(&config, capabilities)?, lifecycle);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        for reply in host.handle_line(&line).await {
            stdout.write_all(reply.to_line().as_bytes()).await?;
            stdout.write_all(b"\n").await?;
        }
        stdout.flush().await?;
    }

    let settled = host.coordinator().settle().await;
    tracing::info!(settled, "input closed; pending cache writes settled");

    Ok(())
}

//! Activate trigger: drop stale generations and take over clients.

use futures_util::future::join_all;
use graines_core::Error;
use serde::Serialize;

use super::Coordinator;

/// Outcome of a successful activation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivateReport {
    pub generation: String,
    /// Namespaces removed, in the order they were listed.
    pub deleted: Vec<String>,
}

impl Coordinator {
    /// Delete every namespace other than the current generation, then claim
    /// all open clients.
    ///
    /// Clients are only claimed once every deletion has completed.
    pub async fn activate(&self) -> Result<ActivateReport, Error> {
        let generation = self.settings.generation.clone();
        tracing::info!(generation = %generation, "activating");

        let stale: Vec<String> = self
            .cache
            .keys()
            .await?
            .into_iter()
            .filter(|name| *name != generation)
            .collect();

        let deletions = stale.iter().map(|name| async move {
            tracing::info!(namespace = %name, "deleting stale cache generation");
            self.cache.delete(name).await.map(|existed| existed.then(|| name.clone()))
        });
        let deleted: Vec<String> = join_all(deletions)
            .await
            .into_iter()
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .flatten()
            .collect();

        self.control.claim_clients().await?;

        Ok(ActivateReport { generation, deleted })
    }
}

//! Install trigger: precache a fresh generation.
//!
//! Mandatory assets ship with the deployment, so any failure to fetch or
//! store one fails the install and the runtime retries later. Best-effort
//! assets come from a CDN that may be unreachable at first load; each is
//! attempted independently and failures are dropped.

use futures_util::future::join_all;
use graines_core::{Error, InterceptedRequest, RequestKey, ResponseSnapshot};
use serde::Serialize;
use url::Url;

use super::Coordinator;

/// Outcome of a successful install.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallReport {
    pub generation: String,
    /// Mandatory assets stored.
    pub mandatory: usize,
    /// Best-effort assets stored.
    pub best_effort_stored: usize,
    /// Best-effort assets that could not be fetched or stored.
    pub best_effort_failed: usize,
}

impl Coordinator {
    /// Populate the current generation.
    ///
    /// Order: open the namespace, store all mandatory assets, ask the runtime
    /// to take over without waiting, then settle every best-effort asset.
    ///
    /// # Errors
    ///
    /// Fails if the namespace cannot be opened, a mandatory asset cannot be
    /// fetched, answers with a non-2xx status or cannot be stored, or the
    /// runtime rejects the take-over request.
    pub async fn install(&self) -> Result<InstallReport, Error> {
        let generation = self.settings.generation.clone();
        tracing::info!(generation = %generation, "installing");

        self.cache.open(&generation).await?;

        let mandatory = self.store_mandatory().await?;
        tracing::info!(generation = %generation, count = mandatory, "mandatory assets cached");

        self.control.skip_waiting().await?;

        let (best_effort_stored, best_effort_failed) = self.store_best_effort().await;
        if best_effort_failed > 0 {
            tracing::warn!(
                generation = %generation,
                stored = best_effort_stored,
                failed = best_effort_failed,
                "some best-effort assets were not cached"
            );
        }

        Ok(InstallReport { generation, mandatory, best_effort_stored, best_effort_failed })
    }

    /// Fetch every mandatory asset, then store them together.
    ///
    /// Nothing is stored unless every fetch succeeded with a 2xx status.
    async fn store_mandatory(&self) -> Result<usize, Error> {
        let fetches = self.settings.local_assets.iter().map(|url| self.fetch_mandatory(url));
        let entries = join_all(fetches).await.into_iter().collect::<Result<Vec<_>, _>>()?;
        let count = entries.len();

        self.cache.put_all(&self.settings.generation, entries).await?;

        Ok(count)
    }

    async fn fetch_mandatory(&self, url: &Url) -> Result<(RequestKey, ResponseSnapshot), Error> {
        let request = InterceptedRequest::from_url(url.clone());
        let response = self.network.fetch(&request).await?;
        if !response.is_ok() {
            return Err(Error::HttpError(format!("{} returned status {}", url, response.status)));
        }
        Ok((request.key(), response))
    }

    /// Fetch and store each best-effort asset independently.
    ///
    /// Returns (stored, failed).
    async fn store_best_effort(&self) -> (usize, usize) {
        let attempts = self.settings.remote_assets.iter().map(|url| async move {
            let request = InterceptedRequest::from_url(url.clone());
            let result = match self.network.fetch(&request).await {
                Ok(response) => self.cache.put(&self.settings.generation, &request.key(), &response).await,
                Err(e) => Err(e),
            };
            if let Err(e) = &result {
                tracing::debug!(url = %url, error = %e, "best-effort asset skipped");
            }
            result.is_ok()
        });

        let outcomes = join_all(attempts).await;
        let stored = outcomes.iter().filter(|ok| **ok).count();
        (stored, outcomes.len() - stored)
    }
}

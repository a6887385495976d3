//! The cache capability consumed by the coordinator.

use async_trait::async_trait;

use super::ResponseSnapshot;
use crate::{Error, RequestKey};

/// A set of named cache namespaces holding response snapshots.
///
/// Mirrors the host runtime's cache storage: namespaces are created on
/// demand, matched in creation order and deleted wholesale.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Create the namespace if it does not exist yet.
    async fn open(&self, namespace: &str) -> Result<(), Error>;

    /// Store `response` under `key`, replacing any previous entry.
    ///
    /// Creates the namespace if needed. Non-GET keys are rejected with
    /// [`Error::UnsupportedMethod`].
    async fn put(&self, namespace: &str, key: &RequestKey, response: &ResponseSnapshot) -> Result<(), Error>;

    /// Store every entry, or none of them.
    async fn put_all(&self, namespace: &str, entries: Vec<(RequestKey, ResponseSnapshot)>) -> Result<(), Error> {
        for (key, response) in &entries {
            self.put(namespace, key, response).await?;
        }
        Ok(())
    }

    /// First entry matching `key` across all namespaces, oldest namespace first.
    ///
    /// Non-GET keys never match.
    async fn match_request(&self, key: &RequestKey) -> Result<Option<ResponseSnapshot>, Error>;

    /// Names of all existing namespaces, in creation order.
    async fn keys(&self) -> Result<Vec<String>, Error>;

    /// Delete a namespace and all its entries. Returns whether it existed.
    async fn delete(&self, namespace: &str) -> Result<bool, Error>;

    /// Request identities stored in a namespace.
    async fn entries(&self, namespace: &str) -> Result<Vec<RequestKey>, Error>;
}

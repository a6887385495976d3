//! Detached cache writes.
//!
//! Write-through persistence must never delay or fail the response it copies.
//! Each write runs as its own task; the response path does not await it and a
//! failed write is logged and dropped. [`WriteBehind::settle`] lets a host
//! drain outstanding writes before it shuts down.

use std::sync::{Arc, Mutex, PoisonError};

use graines_core::{CacheStorage, RequestKey, ResponseSnapshot};
use tokio::task::JoinSet;

/// Tracker for detached cache writes.
#[derive(Clone, Default)]
pub struct WriteBehind {
    tasks: Arc<Mutex<JoinSet<()>>>,
}

impl WriteBehind {
    /// Spawn a write of `response` under `key` without waiting for it.
    pub fn detach(&self, cache: Arc<dyn CacheStorage>, namespace: &str, key: RequestKey, response: ResponseSnapshot) {
        let namespace = namespace.to_string();
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);

        while tasks.try_join_next().is_some() {}

        tasks.spawn(async move {
            match cache.put(&namespace, &key, &response).await {
                Ok(()) => tracing::debug!(namespace = %namespace, url = %key.url, "cache write completed"),
                Err(e) => tracing::warn!(namespace = %namespace, url = %key.url, error = %e, "cache write failed"),
            }
        });
    }

    /// Number of writes not yet reaped.
    pub fn pending(&self) -> usize {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Await every write spawned so far. Returns how many were awaited.
    pub async fn settle(&self) -> usize {
        let mut tasks = std::mem::take(&mut *self.tasks.lock().unwrap_or_else(PoisonError::into_inner));
        let mut settled = 0;
        while let Some(result) = tasks.join_next().await {
            if let Err(e) = result {
                tracing::warn!(error = %e, "cache write task aborted");
            }
            settled += 1;
        }
        settled
    }
}

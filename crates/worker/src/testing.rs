//! Test doubles for the coordinator's capabilities.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use graines_core::{
    AppConfig, CacheDb, CacheStorage, ClientControl, Error, InterceptedRequest, Network, RequestKey,
    ResponseSnapshot,
};

use crate::coordinator::{Capabilities, Coordinator};

/// Network that answers only the URLs it was told about; everything else
/// fails as if offline. Counts calls per URL.
#[derive(Default)]
pub struct ScriptedNetwork {
    responses: Mutex<HashMap<String, ResponseSnapshot>>,
    calls: Mutex<HashMap<String, usize>>,
}

impl ScriptedNetwork {
    pub fn respond(&self, url: &str, response: ResponseSnapshot) {
        let url = url::Url::parse(url).unwrap().to_string();
        self.responses.lock().unwrap().insert(url, response);
    }

    pub fn calls(&self, url: &str) -> usize {
        let url = url::Url::parse(url).unwrap().to_string();
        self.calls.lock().unwrap().get(&url).copied().unwrap_or(0)
    }
}

#[async_trait]
impl Network for ScriptedNetwork {
    async fn fetch(&self, request: &InterceptedRequest) -> Result<ResponseSnapshot, Error> {
        let url = request.url.to_string();
        *self.calls.lock().unwrap().entry(url.clone()).or_default() += 1;
        self.responses
            .lock()
            .unwrap()
            .get(&url)
            .cloned()
            .ok_or_else(|| Error::Network(format!("offline: {url}")))
    }
}

/// Client control that records calls and can be told to refuse them.
#[derive(Default)]
pub struct RecordingControl {
    skip_waiting: AtomicUsize,
    claims: AtomicUsize,
    reject_skip_waiting: AtomicBool,
    reject_claim: AtomicBool,
}

impl RecordingControl {
    pub fn skip_waiting_calls(&self) -> usize {
        self.skip_waiting.load(Ordering::SeqCst)
    }

    pub fn claim_calls(&self) -> usize {
        self.claims.load(Ordering::SeqCst)
    }

    pub fn reject_skip_waiting(&self) {
        self.reject_skip_waiting.store(true, Ordering::SeqCst);
    }

    pub fn reject_claim(&self) {
        self.reject_claim.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl ClientControl for RecordingControl {
    async fn skip_waiting(&self) -> Result<(), Error> {
        if self.reject_skip_waiting.load(Ordering::SeqCst) {
            return Err(Error::ClientControl("skip waiting refused".into()));
        }
        self.skip_waiting.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn claim_clients(&self) -> Result<(), Error> {
        if self.reject_claim.load(Ordering::SeqCst) {
            return Err(Error::ClientControl("claim refused".into()));
        }
        self.claims.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Cache whose every operation fails.
pub struct RejectingCache;

#[async_trait]
impl CacheStorage for RejectingCache {
    async fn open(&self, _namespace: &str) -> Result<(), Error> {
        Err(Error::CorruptEntry("storage unavailable".into()))
    }

    async fn put(&self, _namespace: &str, _key: &RequestKey, _response: &ResponseSnapshot) -> Result<(), Error> {
        Err(Error::CorruptEntry("storage unavailable".into()))
    }

    async fn match_request(&self, _key: &RequestKey) -> Result<Option<ResponseSnapshot>, Error> {
        Err(Error::CorruptEntry("storage unavailable".into()))
    }

    async fn keys(&self) -> Result<Vec<String>, Error> {
        Err(Error::CorruptEntry("storage unavailable".into()))
    }

    async fn delete(&self, _namespace: &str) -> Result<bool, Error> {
        Err(Error::CorruptEntry("storage unavailable".into()))
    }

    async fn entries(&self, _namespace: &str) -> Result<Vec<RequestKey>, Error> {
        Err(Error::CorruptEntry("storage unavailable".into()))
    }
}

/// In-memory cache that can be told to refuse writes: every batch write,
/// or single writes for chosen URLs. Reads and namespace changes pass through.
pub struct SelectiveCache {
    pub inner: CacheDb,
    reject_put_all: AtomicBool,
    reject_urls: Mutex<HashSet<String>>,
}

impl SelectiveCache {
    pub async fn new() -> Self {
        Self {
            inner: CacheDb::open_in_memory().await.unwrap(),
            reject_put_all: AtomicBool::new(false),
            reject_urls: Mutex::new(HashSet::new()),
        }
    }

    pub fn reject_put_all(&self) {
        self.reject_put_all.store(true, Ordering::SeqCst);
    }

    pub fn reject_put(&self, url: &str) {
        let url = url::Url::parse(url).unwrap().to_string();
        self.reject_urls.lock().unwrap().insert(url);
    }
}

#[async_trait]
impl CacheStorage for SelectiveCache {
    async fn open(&self, namespace: &str) -> Result<(), Error> {
        self.inner.open(namespace).await
    }

    async fn put(&self, namespace: &str, key: &RequestKey, response: &ResponseSnapshot) -> Result<(), Error> {
        if self.reject_urls.lock().unwrap().contains(&key.url) {
            return Err(Error::CorruptEntry(format!("disk full writing {}", key.url)));
        }
        self.inner.put(namespace, key, response).await
    }

    async fn put_all(&self, namespace: &str, entries: Vec<(RequestKey, ResponseSnapshot)>) -> Result<(), Error> {
        if self.reject_put_all.load(Ordering::SeqCst) {
            return Err(Error::CorruptEntry("disk full".into()));
        }
        self.inner.put_all(namespace, entries).await
    }

    async fn match_request(&self, key: &RequestKey) -> Result<Option<ResponseSnapshot>, Error> {
        self.inner.match_request(key).await
    }

    async fn keys(&self) -> Result<Vec<String>, Error> {
        self.inner.keys().await
    }

    async fn delete(&self, namespace: &str) -> Result<bool, Error> {
        self.inner.delete(namespace).await
    }

    async fn entries(&self, namespace: &str) -> Result<Vec<RequestKey>, Error> {
        self.inner.entries(namespace).await
    }
}

/// A coordinator wired to test doubles, with handles on each of them.
pub struct Harness<C = CacheDb> {
    pub coordinator: Coordinator,
    pub cache: Arc<C>,
    pub network: Arc<ScriptedNetwork>,
    pub control: Arc<RecordingControl>,
}

fn build<C: CacheStorage + 'static>(cache: Arc<C>, network: ScriptedNetwork) -> Harness<C> {
    let network = Arc::new(network);
    let control = Arc::new(RecordingControl::default());
    let capabilities = Capabilities { cache: cache.clone(), network: network.clone(), control: control.clone() };
    let coordinator = Coordinator::new(&AppConfig::default(), capabilities).unwrap();
    Harness { coordinator, cache, network, control }
}

impl Harness<CacheDb> {
    /// Default configuration, empty in-memory cache, fully offline network.
    pub async fn new() -> Self {
        let cache = Arc::new(CacheDb::open_in_memory().await.unwrap());
        build(cache, ScriptedNetwork::default())
    }
}

impl Harness<RejectingCache> {
    pub fn with_rejecting_cache(network: ScriptedNetwork) -> Self {
        build(Arc::new(RejectingCache), network)
    }
}

impl Harness<SelectiveCache> {
    /// Like [`Harness::new`], but writes can be made to fail.
    pub async fn with_selective_cache() -> Self {
        build(Arc::new(SelectiveCache::new().await), ScriptedNetwork::default())
    }
}

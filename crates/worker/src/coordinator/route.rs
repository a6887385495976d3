//! Fetch trigger: classify an intercepted request and apply its strategy.
//!
//! | class            | strategy                                   |
//! |------------------|--------------------------------------------|
//! | API passthrough  | network only, synthesized offline payload  |
//! | navigation       | network first, cache fallback              |
//! | static asset     | cache first, network fallback              |
//!
//! Every path resolves to a [`FetchOutcome`]; no error leaves the router.

use graines_core::{InterceptedRequest, ResponseSnapshot};
use serde::Serialize;
use url::Url;

use super::Coordinator;

/// Body of the response synthesized for an unreachable API.
pub const OFFLINE_PAYLOAD: &str = r#"{"error":"Hors-ligne"}"#;

/// Request category, derived fresh for every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    ApiPassthrough,
    Navigation,
    StaticAsset,
}

/// Classify a request URL. Precedence: API host, then document paths.
pub fn classify(url: &Url, api_host: &str) -> Classification {
    if url.host_str().is_some_and(|host| host.eq_ignore_ascii_case(api_host)) {
        return Classification::ApiPassthrough;
    }

    let path = url.path();
    if path.ends_with('/') || path.ends_with("index.html") {
        return Classification::Navigation;
    }

    Classification::StaticAsset
}

/// Where a served response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseSource {
    Network,
    Cache,
    Synthesized,
}

/// Result of routing one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Served { response: ResponseSnapshot, source: ResponseSource },
    /// Nothing usable; the page sees a network error.
    Empty,
}

impl FetchOutcome {
    fn network(response: ResponseSnapshot) -> Self {
        Self::Served { response, source: ResponseSource::Network }
    }

    fn cache(response: ResponseSnapshot) -> Self {
        Self::Served { response, source: ResponseSource::Cache }
    }

    pub fn response(&self) -> Option<&ResponseSnapshot> {
        match self {
            Self::Served { response, .. } => Some(response),
            Self::Empty => None,
        }
    }

    pub fn source(&self) -> Option<ResponseSource> {
        match self {
            Self::Served { source, .. } => Some(*source),
            Self::Empty => None,
        }
    }
}

/// The minimal JSON response returned when the API cannot be reached.
pub fn offline_response() -> ResponseSnapshot {
    ResponseSnapshot::new(200, OFFLINE_PAYLOAD).with_header("content-type", "application/json")
}

impl Coordinator {
    /// Route one intercepted request.
    pub async fn handle_fetch(&self, request: &InterceptedRequest) -> FetchOutcome {
        let class = classify(&request.url, &self.settings.api_host);
        tracing::debug!(method = %request.method, url = %request.url, ?class, "routing request");

        match class {
            Classification::ApiPassthrough => self.network_only(request).await,
            Classification::Navigation => self.network_first(request).await,
            Classification::StaticAsset => self.cache_first(request).await,
        }
    }

    async fn network_only(&self, request: &InterceptedRequest) -> FetchOutcome {
        match self.network.fetch(request).await {
            Ok(response) => FetchOutcome::network(response),
            Err(e) => {
                tracing::debug!(url = %request.url, error = %e, "api unreachable, answering offline");
                FetchOutcome::Served { response: offline_response(), source: ResponseSource::Synthesized }
            }
        }
    }

    async fn network_first(&self, request: &InterceptedRequest) -> FetchOutcome {
        match self.network.fetch(request).await {
            Ok(response) => {
                self.write_through(request, &response);
                FetchOutcome::network(response)
            }
            Err(e) => {
                tracing::debug!(url = %request.url, error = %e, "network failed, falling back to cache");
                self.lookup(request).await.map_or(FetchOutcome::Empty, FetchOutcome::cache)
            }
        }
    }

    async fn cache_first(&self, request: &InterceptedRequest) -> FetchOutcome {
        if let Some(cached) = self.lookup(request).await {
            return FetchOutcome::cache(cached);
        }

        match self.network.fetch(request).await {
            Ok(response) => {
                if response.status == 200 {
                    self.write_through(request, &response);
                }
                FetchOutcome::network(response)
            }
            Err(e) => {
                tracing::debug!(url = %request.url, error = %e, "asset unavailable offline");
                FetchOutcome::Empty
            }
        }
    }

    /// Cache lookup where a storage failure counts as a miss.
    async fn lookup(&self, request: &InterceptedRequest) -> Option<ResponseSnapshot> {
        match self.cache.match_request(&request.key()).await {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(url = %request.url, error = %e, "cache lookup failed");
                None
            }
        }
    }

    /// Persist a copy of `response` without holding up the caller.
    fn write_through(&self, request: &InterceptedRequest, response: &ResponseSnapshot) {
        if !request.is_get() {
            tracing::debug!(method = %request.method, url = %request.url, "not caching non-GET response");
            return;
        }
        self.writes
            .detach(self.cache.clone(), &self.settings.generation, request.key(), response.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Harness, ScriptedNetwork};
    use graines_core::CacheStorage;
    use std::collections::BTreeMap;

    const GENERATION: &str = "gardien-graines-v3";

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    fn get(s: &str) -> InterceptedRequest {
        InterceptedRequest::get(s).unwrap()
    }

    #[test]
    fn test_classify_api_host() {
        let class = classify(&url("https://api.github.com/repos/x/y/contents/data.json"), "api.github.com");
        assert_eq!(class, Classification::ApiPassthrough);
    }

    #[test]
    fn test_classify_api_beats_navigation() {
        assert_eq!(classify(&url("https://api.github.com/"), "api.github.com"), Classification::ApiPassthrough);
    }

    #[test]
    fn test_classify_navigation() {
        assert_eq!(classify(&url("http://localhost:8080/"), "api.github.com"), Classification::Navigation);
        assert_eq!(classify(&url("http://localhost:8080/app/"), "api.github.com"), Classification::Navigation);
        assert_eq!(
            classify(&url("http://localhost:8080/index.html?from=pwa"), "api.github.com"),
            Classification::Navigation
        );
    }

    #[test]
    fn test_classify_static_assets() {
        for asset in [
            "http://localhost:8080/manifest.json",
            "https://cdnjs.cloudflare.com/ajax/libs/font-awesome/6.4.0/css/all.min.css",
            "https://cdnjs.cloudflare.com/ajax/libs/jspdf/2.5.1/jspdf.umd.min.js",
            "http://localhost:8080/icons/icon-192.png",
        ] {
            assert_eq!(classify(&url(asset), "api.github.com"), Classification::StaticAsset, "{asset}");
        }
    }

    #[test]
    fn test_classify_subdomain_is_not_api() {
        assert_eq!(classify(&url("https://raw.github.com/a.js"), "api.github.com"), Classification::StaticAsset);
    }

    #[tokio::test]
    async fn test_api_success_passes_through_uncached() {
        let harness = Harness::new().await;
        let api = "https://api.github.com/repos/graines/data";
        harness.network.respond(api, ResponseSnapshot::new(201, "[]"));

        let outcome = harness.coordinator.handle_fetch(&get(api)).await;
        harness.coordinator.settle().await;

        assert_eq!(outcome.source(), Some(ResponseSource::Network));
        assert_eq!(outcome.response().unwrap().status, 201);
        assert!(harness.cache.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_api_offline_synthesizes_json() {
        let harness = Harness::new().await;

        let outcome = harness.coordinator.handle_fetch(&get("https://api.github.com/repos/graines/data")).await;

        assert_eq!(outcome.source(), Some(ResponseSource::Synthesized));
        let response = outcome.response().unwrap();
        assert_eq!(response.content_type(), Some("application/json"));
        let body: serde_json::Value = serde_json::from_slice(&response.body).unwrap();
        assert_eq!(body, serde_json::json!({ "error": "Hors-ligne" }));
    }

    #[tokio::test]
    async fn test_api_ignores_cached_copy() {
        let harness = Harness::new().await;
        let api = "https://api.github.com/user";
        harness.cache.put(GENERATION, &get(api).key(), &ResponseSnapshot::new(200, "stale")).await.unwrap();

        let outcome = harness.coordinator.handle_fetch(&get(api)).await;

        assert_eq!(outcome.source(), Some(ResponseSource::Synthesized));
        assert_eq!(harness.network.calls(api), 1);
    }

    #[tokio::test]
    async fn test_navigation_online_returns_live_and_updates_cache() {
        let harness = Harness::new().await;
        let page = "http://localhost:8080/index.html";
        harness.cache.put(GENERATION, &get(page).key(), &ResponseSnapshot::new(200, "old")).await.unwrap();
        harness.network.respond(page, ResponseSnapshot::new(200, "new"));

        let outcome = harness.coordinator.handle_fetch(&get(page)).await;
        assert_eq!(outcome.source(), Some(ResponseSource::Network));
        assert_eq!(&outcome.response().unwrap().body[..], b"new");

        harness.coordinator.settle().await;
        let cached = harness.cache.match_request(&get(page).key()).await.unwrap().unwrap();
        assert_eq!(&cached.body[..], b"new");
    }

    #[tokio::test]
    async fn test_navigation_caches_any_status() {
        let harness = Harness::new().await;
        let page = "http://localhost:8080/missing/";
        harness.network.respond(page, ResponseSnapshot::new(404, "not here"));

        harness.coordinator.handle_fetch(&get(page)).await;
        harness.coordinator.settle().await;

        let cached = harness.cache.match_request(&get(page).key()).await.unwrap().unwrap();
        assert_eq!(cached.status, 404);
    }

    #[tokio::test]
    async fn test_navigation_offline_falls_back_to_cache() {
        let harness = Harness::new().await;
        let page = "http://localhost:8080/";
        harness.cache.put(GENERATION, &get(page).key(), &ResponseSnapshot::new(200, "shell")).await.unwrap();

        let outcome = harness.coordinator.handle_fetch(&get(page)).await;

        assert_eq!(outcome.source(), Some(ResponseSource::Cache));
        assert_eq!(&outcome.response().unwrap().body[..], b"shell");
    }

    #[tokio::test]
    async fn test_navigation_offline_without_cache_is_empty() {
        let harness = Harness::new().await;
        let outcome = harness.coordinator.handle_fetch(&get("http://localhost:8080/")).await;
        assert_eq!(outcome, FetchOutcome::Empty);
    }

    #[tokio::test]
    async fn test_navigation_falls_back_to_older_generation() {
        let harness = Harness::new().await;
        let page = "http://localhost:8080/index.html";
        harness
            .cache
            .put("gardien-graines-v2", &get(page).key(), &ResponseSnapshot::new(200, "v2 shell"))
            .await
            .unwrap();

        let outcome = harness.coordinator.handle_fetch(&get(page)).await;

        assert_eq!(&outcome.response().unwrap().body[..], b"v2 shell");
    }

    #[tokio::test]
    async fn test_static_hit_skips_network() {
        let harness = Harness::new().await;
        let css = "https://cdnjs.cloudflare.com/ajax/libs/font-awesome/6.4.0/css/all.min.css";
        harness.cache.put(GENERATION, &get(css).key(), &ResponseSnapshot::new(200, "cached css")).await.unwrap();
        harness.network.respond(css, ResponseSnapshot::new(200, "fresh css"));

        let outcome = harness.coordinator.handle_fetch(&get(css)).await;

        assert_eq!(outcome.source(), Some(ResponseSource::Cache));
        assert_eq!(&outcome.response().unwrap().body[..], b"cached css");
        assert_eq!(harness.network.calls(css), 0);
    }

    #[tokio::test]
    async fn test_static_miss_fetches_and_caches_200() {
        let harness = Harness::new().await;
        let js = "http://localhost:8080/js/app.js";
        harness.network.respond(js, ResponseSnapshot::new(200, "console.log(1)"));

        let outcome = harness.coordinator.handle_fetch(&get(js)).await;
        assert_eq!(outcome.source(), Some(ResponseSource::Network));

        harness.coordinator.settle().await;
        assert_eq!(harness.cache.count_entries(GENERATION).await.unwrap(), 1);

        let again = harness.coordinator.handle_fetch(&get(js)).await;
        assert_eq!(again.source(), Some(ResponseSource::Cache));
        assert_eq!(harness.network.calls(js), 1);
    }

    #[tokio::test]
    async fn test_static_non_200_is_returned_but_not_cached() {
        let harness = Harness::new().await;
        for (path, status) in [("/img/a.png", 404), ("/img/b.png", 204), ("/img/c.png", 301)] {
            let asset = format!("http://localhost:8080{path}");
            harness.network.respond(&asset, ResponseSnapshot::new(status, ""));

            let outcome = harness.coordinator.handle_fetch(&get(&asset)).await;
            assert_eq!(outcome.response().unwrap().status, status);
        }

        harness.coordinator.settle().await;
        assert!(harness.cache.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_static_offline_miss_is_empty() {
        let harness = Harness::new().await;
        let outcome = harness.coordinator.handle_fetch(&get("http://localhost:8080/css/app.css")).await;
        assert_eq!(outcome, FetchOutcome::Empty);
    }

    #[tokio::test]
    async fn test_non_get_is_never_cached() {
        let harness = Harness::new().await;
        let form = "http://localhost:8080/";
        harness.network.respond(form, ResponseSnapshot::new(200, "posted"));
        let request = InterceptedRequest {
            method: "POST".into(),
            url: url(form),
            headers: BTreeMap::new(),
        };

        let outcome = harness.coordinator.handle_fetch(&request).await;
        harness.coordinator.settle().await;

        assert_eq!(outcome.source(), Some(ResponseSource::Network));
        assert!(harness.cache.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failing_cache_write_does_not_affect_response() {
        let network = ScriptedNetwork::default();
        let page = "http://localhost:8080/index.html";
        network.respond(page, ResponseSnapshot::new(200, "live"));
        let harness = Harness::with_rejecting_cache(network);

        let outcome = harness.coordinator.handle_fetch(&get(page)).await;
        assert_eq!(harness.coordinator.settle().await, 1);

        assert_eq!(outcome.source(), Some(ResponseSource::Network));
        assert_eq!(&outcome.response().unwrap().body[..], b"live");
    }

    #[tokio::test]
    async fn test_failing_cache_lookup_falls_through_to_network() {
        let network = ScriptedNetwork::default();
        let js = "http://localhost:8080/app.js";
        network.respond(js, ResponseSnapshot::new(200, "js"));
        let harness = Harness::with_rejecting_cache(network);

        let outcome = harness.coordinator.handle_fetch(&get(js)).await;

        assert_eq!(outcome.source(), Some(ResponseSource::Network));
    }
}

//! Intercepted requests and their cache identity.
//!
//! A request is identified by its method and its URL without fragment.
//! Only GET requests participate in caching.

pub mod url;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::Error;
use crate::cache::hash::compute_entry_key;

pub use self::url::{UrlError, canonicalize, resolve};

/// A network request handed over by the host runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterceptedRequest {
    pub method: String,
    pub url: ::url::Url,
    pub headers: BTreeMap<String, String>,
}

/// Wire shape of an intercepted request as the host describes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestDescriptor {
    #[serde(default = "default_method")]
    pub method: String,
    pub url: String,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

fn default_method() -> String {
    "GET".into()
}

impl InterceptedRequest {
    /// A GET request for an absolute URL.
    pub fn get(url: &str) -> Result<Self, Error> {
        let url = canonicalize(url).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        Ok(Self { method: "GET".into(), url, headers: BTreeMap::new() })
    }

    /// A GET request for an already resolved URL.
    pub fn from_url(mut url: ::url::Url) -> Self {
        url.set_fragment(None);
        Self { method: "GET".into(), url, headers: BTreeMap::new() }
    }

    /// Build a request from its host description.
    ///
    /// The method is uppercased and header names lowercased.
    pub fn from_descriptor(descriptor: RequestDescriptor) -> Result<Self, Error> {
        let method = descriptor.method.trim().to_ascii_uppercase();
        if method.is_empty() {
            return Err(Error::InvalidInput("request method cannot be empty".into()));
        }

        let url = canonicalize(&descriptor.url).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        let headers = descriptor
            .headers
            .into_iter()
            .map(|(name, value)| (name.to_ascii_lowercase(), value))
            .collect();

        Ok(Self { method, url, headers })
    }

    pub fn is_get(&self) -> bool {
        self.method == "GET"
    }

    /// Cache identity of this request.
    pub fn key(&self) -> RequestKey {
        RequestKey::new(&self.method, &self.url)
    }
}

/// Identity of a cached entry: method plus fragment-free URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestKey {
    pub method: String,
    pub url: String,
}

impl RequestKey {
    pub fn new(method: &str, url: &::url::Url) -> Self {
        let mut url = url.clone();
        url.set_fragment(None);
        Self { method: method.to_ascii_uppercase(), url: url.into() }
    }

    /// Key for a GET of `url`, as stored by the installer.
    pub fn get(url: &::url::Url) -> Self {
        Self::new("GET", url)
    }

    pub fn is_get(&self) -> bool {
        self.method == "GET"
    }

    /// Content-addressed form used as the storage primary key.
    pub fn hash(&self) -> String {
        compute_entry_key(&self.method, &self.url)
    }
}

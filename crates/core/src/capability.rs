//! Capabilities the coordinator consumes from its host.
//!
//! The coordinator never talks to the network or the runtime directly; it is
//! handed implementations of these traits at construction, which keeps every
//! handler testable without a live runtime.

use async_trait::async_trait;

use crate::{Error, InterceptedRequest, ResponseSnapshot};

/// Network fetch primitive.
///
/// Resolves with whatever response the server returned, any status included.
/// Only a failure to obtain a response at all is an error.
#[async_trait]
pub trait Network: Send + Sync {
    async fn fetch(&self, request: &InterceptedRequest) -> Result<ResponseSnapshot, Error>;
}

/// Lifecycle controls offered by the host runtime.
#[async_trait]
pub trait ClientControl: Send + Sync {
    /// Promote the installed (waiting) version to active without waiting
    /// for existing clients to close.
    async fn skip_waiting(&self) -> Result<(), Error>;

    /// Take control of every open client, not only those opened later.
    async fn claim_clients(&self) -> Result<(), Error>;
}

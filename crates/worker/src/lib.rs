//! Offline cache coordinator for Le Gardien des Graines.
//!
//! The coordinator decides, per intercepted request, whether to answer from
//! the local cache, the network, or one falling back to the other, and
//! manages the lifecycle of cache generations across deployed versions.
//!
//! The `graines-worker` binary hosts it behind a line-oriented stdio bridge.

pub mod coordinator;
pub mod error;
pub mod handler;
pub mod host;

#[cfg(test)]
mod testing;

pub use coordinator::{Capabilities, Coordinator};
pub use host::{Host, Lifecycle};

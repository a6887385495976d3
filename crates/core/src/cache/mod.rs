//! SQLite-backed response cache organised in generations.
//!
//! This module provides the cache capability the coordinator consumes:
//!
//! - Named namespaces (one per deployed generation), deleted wholesale
//! - Entries keyed by request identity (SHA-256 of method and URL)
//! - Automatic schema migrations
//! - WAL mode for concurrent access

pub mod connection;
pub mod entries;
pub mod hash;
pub mod migrations;
pub mod snapshot;
pub mod storage;

pub use crate::Error;

pub use connection::CacheDb;
pub use snapshot::ResponseSnapshot;
pub use storage::CacheStorage;

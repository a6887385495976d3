//! Core types and shared functionality for the graines offline worker.
//!
//! This crate provides:
//! - Response cache with SQLite backend, organised in generations
//! - Request identity and URL resolution against the worker scope
//! - Capability traits consumed from the host runtime
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod capability;
pub mod config;
pub mod error;
pub mod request;

pub use cache::{CacheDb, CacheStorage, ResponseSnapshot};
pub use capability::{ClientControl, Network};
pub use config::AppConfig;
pub use error::Error;
pub use request::{InterceptedRequest, RequestDescriptor, RequestKey};

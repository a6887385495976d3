//! Client code for the graines offline worker.
//!
//! This crate provides the HTTP fetch primitive the coordinator uses as its
//! network capability.

pub mod fetch;

pub use fetch::{FetchClient, FetchConfig};

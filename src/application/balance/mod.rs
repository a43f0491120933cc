//! Balance cache, refresh policy, fetcher, and the service composing them.
//!
//! Dependency order, leaves first:
//!
//! - [`cache`] - in-memory store keyed by `(chain, address, token)`
//! - [`fetcher`] - provider failover, post-send trust window, bulk path
//! - [`policy`] - cache-vs-network decision per address
//! - [`service`] - single and batch lookups under bounded concurrency

pub mod cache;
pub mod fetcher;
pub mod policy;
pub mod service;

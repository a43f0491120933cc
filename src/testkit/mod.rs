//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`clients`] - Scripted provider clients with call counters and a
//!   concurrency gauge.
//! - [`domain`] - Builders for cache entries, metadata and raw amounts.
//! - [`config`] - Canonical test configurations (provider choice, fast retry).
//! - [`fixture`] - A fetcher wired to mocks and a fresh cache.

pub mod clients;
pub mod config;
pub mod domain;
pub mod fixture;

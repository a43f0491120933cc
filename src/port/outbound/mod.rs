//! Outbound ports (driven side): interfaces implemented by outbound adapters.
//!
//! These contracts describe infrastructure dependencies: chain providers,
//! cache storage, address metadata, and configuration.

pub mod cache;
pub mod chain;
pub mod config;
pub mod metadata;

//! Infrastructure layer.
//!
//! Technical concerns supporting the application without containing
//! business logic.
//!
//! # Submodules
//!
//! - [`bootstrap`] - Composition root for the balance stack
//! - [`config`] - Configuration loading and validation
//! - [`retry`] - Exponential backoff for provider calls
//! - [`transport`] - Process-wide HTTP connection pool

pub mod bootstrap;
pub mod config;
pub mod retry;
pub mod transport;

//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! The balance engine is defined purely by the operations it calls on its
//! collaborators, so any backing store or provider can satisfy a port.
//!
//! # Architecture
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │      Application        │
//!                    │ policy · fetcher · svc  │
//!     ┌──────────────┤                         ├──────────────┐
//!     │              └─────────────────────────┘              │
//!     │                         │                             │
//!     ▼                         ▼                             ▼
//! ┌─────────┐            ┌─────────────┐              ┌───────────┐
//! │ Chain   │            │ Cache /     │              │ Metadata  │
//! │ clients │            │ Storage     │              │ provider  │
//! └─────────┘            └─────────────┘              └───────────┘
//! ```
//!
//! # Available Ports
//!
//! - [`outbound::cache`] - Balance cache and its persistence
//! - [`outbound::metadata`] - Address activity history
//! - [`outbound::chain`] - ETH and BSV balance providers
//! - [`outbound::config`] - Provider endpoints and preferences

pub mod outbound;

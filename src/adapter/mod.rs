//! Adapters connecting the ports to concrete providers and stores.
//!
//! - [`outbound::eth`] - JSON-RPC and Etherscan clients
//! - [`outbound::bsv`] - WhatsOnChain client
//! - [`outbound::storage`] - JSON file persistence for the cache
//! - [`outbound::memory`] - in-memory address metadata

pub mod outbound;

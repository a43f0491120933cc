//! Chainbalance - cached multi-chain wallet balance fetching.
//!
//! Balances for ETH (plus tracked ERC-20 tokens) and BSV addresses are read
//! from public providers and cached per `(chain, address, token)`. A refresh
//! policy decides per address whether the cache is good enough, and batch
//! lookups run under bounded concurrency with BSV addresses going through the
//! provider's bulk endpoint.
//!
//! # Architecture
//!
//! - **`domain`** - chains, cache entries, request and result shapes
//! - **`port`** - traits for stores, providers and configuration
//! - **`application`** - cache, fetcher, refresh policy, service
//! - **`adapter`** - JSON-RPC, Etherscan and WhatsOnChain clients, JSON file
//!   persistence, in-memory metadata
//! - **`infrastructure`** - TOML configuration, logging, retry, shared HTTP
//!   transport, composition root
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use chainbalance::adapter::outbound::memory::metadata::InMemoryMetadataStore;
//! use chainbalance::domain::{chain::Chain, request::FetchRequest};
//! use chainbalance::infrastructure::bootstrap::BalanceEngine;
//! use chainbalance::infrastructure::config::settings::Config;
//!
//! # async fn run() -> chainbalance::error::Result<()> {
//! let config = Config::load("chainbalance.toml")?;
//! config.init_logging();
//!
//! let engine = BalanceEngine::build(config, Arc::new(InMemoryMetadataStore::new()))?;
//! engine.hydrate()?;
//!
//! let result = engine
//!     .service
//!     .fetch_balance(&FetchRequest::new(Chain::Bsv, "1BoatSLRHtKNngkdXEeobR76b53LETtpyT"))
//!     .await?;
//! println!("{:?}", result.native());
//!
//! engine.flush()?;
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;

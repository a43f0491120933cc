//! Chain provider ports.
//!
//! Wire protocols live in the adapters; the engine only sees balances in
//! base units.

use std::collections::HashMap;
use std::sync::Arc;

use alloy_primitives::U256;
use async_trait::async_trait;

use crate::domain::token::TrackedToken;
use crate::error::ProviderError;

/// Account-model balance source for Ethereum (JSON-RPC node or indexer API).
#[async_trait]
pub trait EthBalanceClient: Send + Sync {
    /// Native balance in wei.
    async fn native_balance(&self, address: &str) -> Result<U256, ProviderError>;

    /// ERC-20 balance in the token's base units.
    async fn token_balance(&self, address: &str, token: &TrackedToken)
        -> Result<U256, ProviderError>;

    /// Endpoint description for logs.
    fn endpoint(&self) -> &str;
}

/// Builds JSON-RPC clients for an endpoint URL.
///
/// Every client built by one factory shares the factory's HTTP transport;
/// dropping a client never closes pooled connections.
#[async_trait]
pub trait EthClientFactory: Send + Sync {
    async fn connect(&self, url: &str) -> Result<Arc<dyn EthBalanceClient>, ProviderError>;
}

/// Confirmed and pending balance of a UTXO address, in satoshis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SatoshiBalance {
    pub confirmed: i64,
    pub unconfirmed: i64,
}

impl SatoshiBalance {
    #[must_use]
    pub const fn new(confirmed: i64, unconfirmed: i64) -> Self {
        Self {
            confirmed,
            unconfirmed,
        }
    }
}

/// BSV balance source.
#[async_trait]
pub trait BsvBalanceClient: Send + Sync {
    async fn native_balance(&self, address: &str) -> Result<SatoshiBalance, ProviderError>;

    /// Balances for many addresses in one call.
    ///
    /// Providers may silently omit addresses (for instance ones they judge
    /// empty); callers treat absence as "unknown", not zero.
    async fn bulk_native_balance(
        &self,
        addresses: &[String],
    ) -> Result<HashMap<String, SatoshiBalance>, ProviderError>;
}

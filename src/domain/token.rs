//! Tokens tracked alongside each chain's native asset.

use std::collections::HashMap;

use serde::Deserialize;

use super::chain::Chain;

/// Mainnet USDC contract on Ethereum.
pub const USDC_ETH_CONTRACT: &str = "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48";

/// A token whose balance is fetched and cached next to the native balance.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TrackedToken {
    /// Display ticker, e.g. "USDC".
    pub symbol: String,
    /// Contract address / identifier; part of the cache key.
    pub contract: String,
    pub decimals: u8,
}

impl TrackedToken {
    pub fn new(symbol: impl Into<String>, contract: impl Into<String>, decimals: u8) -> Self {
        Self {
            symbol: symbol.into(),
            contract: contract.into(),
            decimals,
        }
    }

    /// USDC on Ethereum mainnet.
    #[must_use]
    pub fn usdc() -> Self {
        Self::new("USDC", USDC_ETH_CONTRACT, 6)
    }
}

/// Per-chain list of tracked tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedTokens {
    by_chain: HashMap<Chain, Vec<TrackedToken>>,
}

impl TrackedTokens {
    /// No tokens tracked on any chain.
    #[must_use]
    pub fn none() -> Self {
        Self {
            by_chain: HashMap::new(),
        }
    }

    /// Replace the token list for a chain.
    #[must_use]
    pub fn with_chain(mut self, chain: Chain, tokens: Vec<TrackedToken>) -> Self {
        self.by_chain.insert(chain, tokens);
        self
    }

    /// Tokens tracked on `chain`, in fetch order.
    #[must_use]
    pub fn for_chain(&self, chain: Chain) -> &[TrackedToken] {
        self.by_chain.get(&chain).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// USDC on Ethereum; nothing elsewhere.
impl Default for TrackedTokens {
    fn default() -> Self {
        Self::none().with_chain(Chain::Eth, vec![TrackedToken::usdc()])
    }
}

//! Provider configuration port.

use std::fmt;

/// Preferred Ethereum balance source; the other one is the failover.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EthProvider {
    /// JSON-RPC node first.
    Rpc,
    /// Etherscan API first.
    #[default]
    Etherscan,
}

impl EthProvider {
    /// `"rpc"` selects [`EthProvider::Rpc`]; anything else is Etherscan.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("rpc") {
            Self::Rpc
        } else {
            Self::Etherscan
        }
    }
}

impl fmt::Display for EthProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rpc => f.write_str("rpc"),
            Self::Etherscan => f.write_str("etherscan"),
        }
    }
}

/// Endpoint settings consumed by the fetcher.
pub trait ConfigProvider: Send + Sync {
    /// Primary JSON-RPC URL; `None` when unset.
    fn eth_rpc(&self) -> Option<String>;

    /// Fallback JSON-RPC URLs, tried in order.
    fn eth_fallback_rpcs(&self) -> Vec<String>;

    fn eth_provider(&self) -> EthProvider;

    fn etherscan_api_key(&self) -> Option<String>;
}

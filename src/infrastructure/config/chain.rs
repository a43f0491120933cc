//! Per-chain provider configuration.

use serde::Deserialize;

use crate::domain::token::TrackedToken;
use crate::port::outbound::config::EthProvider;

/// Ethereum provider settings.
#[derive(Debug, Clone, Deserialize)]
pub struct EthConfig {
    /// Primary JSON-RPC endpoint. Overridden by `WALLET_ETH_RPC`.
    #[serde(default)]
    pub rpc_url: Option<String>,
    /// Endpoints tried in order when the primary cannot be reached.
    #[serde(default)]
    pub fallback_rpc_urls: Vec<String>,
    /// Primary provider: `"rpc"` or `"etherscan"`. Anything else means Etherscan.
    #[serde(default = "default_eth_provider")]
    pub provider: String,
    /// Etherscan API key. Overridden by `ETHERSCAN_API_KEY`.
    #[serde(default)]
    pub etherscan_api_key: Option<String>,
    #[serde(default = "default_etherscan_url")]
    pub etherscan_url: String,
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,
    /// Tokens fetched next to ETH. Defaults to mainnet USDC.
    #[serde(default = "default_eth_tokens")]
    pub tokens: Vec<TrackedToken>,
}

impl EthConfig {
    /// Resolved primary provider.
    #[must_use]
    pub fn provider(&self) -> EthProvider {
        EthProvider::parse(&self.provider)
    }
}

fn default_eth_provider() -> String {
    "etherscan".into()
}

fn default_etherscan_url() -> String {
    "https://api.etherscan.io/v2/api".into()
}

fn default_chain_id() -> u64 {
    1
}

fn default_eth_tokens() -> Vec<TrackedToken> {
    vec![TrackedToken::usdc()]
}

impl Default for EthConfig {
    fn default() -> Self {
        Self {
            rpc_url: None,
            fallback_rpc_urls: Vec::new(),
            provider: default_eth_provider(),
            etherscan_api_key: None,
            etherscan_url: default_etherscan_url(),
            chain_id: default_chain_id(),
            tokens: default_eth_tokens(),
        }
    }
}

/// BSV provider settings (WhatsOnChain).
#[derive(Debug, Clone, Deserialize)]
pub struct BsvConfig {
    #[serde(default = "default_bsv_api_url")]
    pub api_url: String,
    /// Maximum addresses per bulk request.
    #[serde(default = "default_bulk_limit")]
    pub bulk_limit: usize,
}

fn default_bsv_api_url() -> String {
    "https://api.whatsonchain.com/v1/bsv/main".into()
}

fn default_bulk_limit() -> usize {
    20
}

impl Default for BsvConfig {
    fn default() -> Self {
        Self {
            api_url: default_bsv_api_url(),
            bulk_limit: default_bulk_limit(),
        }
    }
}

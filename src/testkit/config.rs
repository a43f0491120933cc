//! Canonical test configurations.

use crate::infrastructure::config::{http::RetryConfig, settings::Config};
use crate::port::outbound::config::EthProvider;

/// Two attempts, millisecond backoff.
#[must_use]
pub fn fast_retry() -> RetryConfig {
    RetryConfig {
        max_attempts: 2,
        initial_delay_ms: 1,
        max_delay_ms: 2,
        backoff_multiplier: 2.0,
    }
}

/// Config selecting `provider`, with the given RPC endpoints.
#[must_use]
pub fn rpc_config(rpc_url: Option<&str>, fallbacks: &[&str], provider: EthProvider) -> Config {
    let mut config = Config::default();
    config.eth.rpc_url = rpc_url.map(ToString::to_string);
    config.eth.fallback_rpc_urls = fallbacks.iter().map(ToString::to_string).collect();
    config.eth.provider = provider.to_string();
    config.retry = fast_retry();
    config
}

/// Etherscan-first config with no RPC endpoint.
#[must_use]
pub fn etherscan_config() -> Config {
    rpc_config(None, &[], EthProvider::Etherscan)
}

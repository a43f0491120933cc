//! Ethereum: two providers with failover, RPC endpoint fallback.

use std::fmt;
use std::sync::Arc;

use alloy_primitives::U256;
use tracing::{debug, info, warn};

use super::{BalanceFetcher, FetchOutcome};
use crate::domain::amount::format_units;
use crate::domain::{balance::CacheEntry, chain::Chain};
use crate::error::{ConfigError, ProviderError, Result};
use crate::infrastructure::retry::retry_with_backoff;
use crate::port::{outbound::chain::EthBalanceClient, outbound::config::EthProvider};

const ETH_RPC_HINT: &str = "set eth.rpc_url or WALLET_ETH_RPC";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EthStrategy {
    Rpc,
    Etherscan,
}

impl EthStrategy {
    /// Configured provider first, the other one second.
    fn order(preferred: EthProvider) -> [Self; 2] {
        match preferred {
            EthProvider::Rpc => [Self::Rpc, Self::Etherscan],
            EthProvider::Etherscan => [Self::Etherscan, Self::Rpc],
        }
    }
}

impl fmt::Display for EthStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rpc => f.write_str("rpc"),
            Self::Etherscan => f.write_str("etherscan"),
        }
    }
}

impl BalanceFetcher {
    /// ETH and tracked-token balances for `address`.
    ///
    /// Order: trust window, primary provider, secondary provider, stale
    /// cache. With no cache the primary provider's error is returned.
    pub async fn fetch_eth(&self, address: &str) -> Result<FetchOutcome> {
        if let Some(entries) = self.trusted_entries(Chain::Eth, address) {
            return Ok(FetchOutcome::fresh(entries));
        }

        let [primary, secondary] = EthStrategy::order(self.config.eth_provider());

        let primary_err = match self.run_eth_strategy(primary, address).await {
            Ok(entries) => return Ok(FetchOutcome::fresh(entries)),
            Err(err) => err,
        };
        warn!(address, provider = %primary, error = %primary_err, "Primary ETH provider failed");

        match self.run_eth_strategy(secondary, address).await {
            Ok(entries) => {
                info!(address, provider = %secondary, "ETH balance served by secondary provider");
                return Ok(FetchOutcome::fresh(entries));
            }
            Err(err) => {
                warn!(address, provider = %secondary, error = %err, "Secondary ETH provider failed");
            }
        }

        let cached = self.cached_entries(Chain::Eth, address);
        if cached.is_empty() {
            return Err(primary_err);
        }
        warn!(address, entries = cached.len(), "All ETH providers failed, serving stale cache");
        Ok(FetchOutcome::stale(cached))
    }

    async fn run_eth_strategy(&self, strategy: EthStrategy, address: &str) -> Result<Vec<CacheEntry>> {
        match strategy {
            EthStrategy::Rpc => self.fetch_eth_rpc(address).await,
            EthStrategy::Etherscan => self.fetch_eth_etherscan(address).await,
        }
    }

    async fn fetch_eth_etherscan(&self, address: &str) -> Result<Vec<CacheEntry>> {
        let client = Arc::clone(&self.etherscan);
        let wei = retry_with_backoff(&self.retry, "etherscan balance", || {
            client.native_balance(address)
        })
        .await?;
        self.cache_eth_balances(client.as_ref(), address, wei).await
    }

    async fn fetch_eth_rpc(&self, address: &str) -> Result<Vec<CacheEntry>> {
        let primary_url = self.config.eth_rpc().ok_or(ConfigError::MissingField {
            field: "eth.rpc_url",
            hint: ETH_RPC_HINT,
        })?;
        let fallbacks = self.config.eth_fallback_rpcs();

        let (client, connected_url) = self.connect_eth(&primary_url, &fallbacks).await?;

        let native = retry_with_backoff(&self.retry, "eth_getBalance", || {
            client.native_balance(address)
        })
        .await;

        let (client, wei) = match native {
            Ok(wei) => (client, wei),
            Err(err) => {
                warn!(
                    address,
                    url = %connected_url,
                    error = %err,
                    "ETH RPC balance failed after retries, trying fallback endpoints"
                );
                // The failed client is dropped, never closed: the transport
                // behind it is shared with every other request in flight.
                match self
                    .native_balance_from_fallbacks(&connected_url, &fallbacks, address)
                    .await
                {
                    Some(found) => found,
                    None => return Err(err.into()),
                }
            }
        };

        self.cache_eth_balances(client.as_ref(), address, wei).await
    }

    /// Connect to `primary`, then each fallback in order.
    async fn connect_eth(
        &self,
        primary: &str,
        fallbacks: &[String],
    ) -> std::result::Result<(Arc<dyn EthBalanceClient>, String), ProviderError> {
        let primary_err = match self.eth_clients.connect(primary).await {
            Ok(client) => return Ok((client, primary.to_string())),
            Err(err) => err,
        };
        warn!(url = primary, error = %primary_err, "ETH RPC connect failed, trying fallbacks");

        for url in fallbacks.iter().filter(|url| url.as_str() != primary) {
            match self.eth_clients.connect(url).await {
                Ok(client) => {
                    info!(url = %url, "Connected to fallback ETH RPC");
                    return Ok((client, url.clone()));
                }
                Err(err) => warn!(url = %url, error = %err, "Fallback ETH RPC connect failed"),
            }
        }
        Err(primary_err)
    }

    /// Native balance from the first fallback endpoint that answers.
    async fn native_balance_from_fallbacks(
        &self,
        failed_url: &str,
        fallbacks: &[String],
        address: &str,
    ) -> Option<(Arc<dyn EthBalanceClient>, U256)> {
        for url in fallbacks.iter().filter(|url| url.as_str() != failed_url) {
            let client = match self.eth_clients.connect(url).await {
                Ok(client) => client,
                Err(err) => {
                    warn!(url = %url, error = %err, "Fallback ETH RPC connect failed");
                    continue;
                }
            };
            match client.native_balance(address).await {
                Ok(wei) => {
                    info!(url = %url, address, "ETH balance served by fallback RPC");
                    return Some((client, wei));
                }
                Err(err) => warn!(url = %url, address, error = %err, "Fallback ETH RPC balance failed"),
            }
        }
        None
    }

    /// Write the native entry, then each tracked token, to the cache.
    ///
    /// A failed native write fails the strategy. Token failures are logged
    /// and the token is left out.
    async fn cache_eth_balances(
        &self,
        client: &dyn EthBalanceClient,
        address: &str,
        wei: U256,
    ) -> Result<Vec<CacheEntry>> {
        let balance = format_units(&wei.to_string(), Chain::Eth.native_decimals());
        let native = CacheEntry::native(Chain::Eth, address, balance);
        self.store.set(native.clone())?;

        let mut entries = vec![native];
        for token in self.tokens.for_chain(Chain::Eth) {
            let raw = match client.token_balance(address, token).await {
                Ok(raw) => raw,
                Err(err) => {
                    debug!(
                        address,
                        token = %token.symbol,
                        endpoint = client.endpoint(),
                        error = %err,
                        "Token balance unavailable"
                    );
                    continue;
                }
            };
            let entry = CacheEntry::for_token(
                Chain::Eth,
                address,
                token,
                format_units(&raw.to_string(), token.decimals),
            );
            if let Err(err) = self.store.set(entry.clone()) {
                debug!(address, token = %token.symbol, error = %err, "Token cache write failed");
                continue;
            }
            entries.push(entry);
        }
        Ok(entries)
    }
}

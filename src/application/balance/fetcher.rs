//! Network balance fetching with cache write-through.
//!
//! Every chain shares the same outer shape: serve from cache inside the
//! post-send trust window, otherwise go to the providers, write what they
//! return into the cache, and fall back to cached data when they fail.
//! Chain specifics live in [`eth`] and [`bsv`].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use super::cache::entries_for_address;
use crate::domain::{balance::CacheEntry, chain::Chain, token::TrackedTokens};
use crate::error::{BalanceError, Result};
use crate::infrastructure::config::http::RetryConfig;
use crate::port::{
    outbound::cache::BalanceStore, outbound::chain::BsvBalanceClient,
    outbound::chain::EthBalanceClient, outbound::chain::EthClientFactory,
    outbound::config::ConfigProvider,
};

mod bsv;
mod eth;

/// Cache entries younger than this are served without any network call.
///
/// Covers the gap after a local send, when providers may still report the
/// pre-send balance.
pub const POST_SEND_TRUST_WINDOW: Duration = Duration::from_secs(30);

/// Maximum addresses per bulk request.
pub const DEFAULT_BULK_LIMIT: usize = 20;

/// Entries produced for one address.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchOutcome {
    pub entries: Vec<CacheEntry>,
    /// The entries came from cache after every provider failed.
    pub stale: bool,
}

impl FetchOutcome {
    pub(crate) fn fresh(entries: Vec<CacheEntry>) -> Self {
        Self {
            entries,
            stale: false,
        }
    }

    pub(crate) fn stale(entries: Vec<CacheEntry>) -> Self {
        Self {
            entries,
            stale: true,
        }
    }

    #[must_use]
    pub fn native(&self) -> Option<&CacheEntry> {
        self.entries.iter().find(|e| e.is_native())
    }
}

/// Result of a bulk fetch.
///
/// Addresses absent from `balances` had neither fresh data nor a cache
/// entry, or were cut off by the deadline and are listed in `canceled`.
#[derive(Debug, Default)]
pub struct BulkOutcome {
    pub balances: HashMap<String, FetchOutcome>,
    /// Set when the bulk call failed and some addresses were served from cache.
    pub error: Option<BalanceError>,
    /// Addresses whose fetch had not finished when the deadline passed.
    pub canceled: Vec<String>,
}

pub struct BalanceFetcher {
    store: Arc<dyn BalanceStore>,
    config: Arc<dyn ConfigProvider>,
    eth_clients: Arc<dyn EthClientFactory>,
    etherscan: Arc<dyn EthBalanceClient>,
    bsv: Arc<dyn BsvBalanceClient>,
    tokens: TrackedTokens,
    retry: RetryConfig,
    trust_window: Duration,
    bulk_limit: usize,
}

impl BalanceFetcher {
    pub fn new(
        store: Arc<dyn BalanceStore>,
        config: Arc<dyn ConfigProvider>,
        eth_clients: Arc<dyn EthClientFactory>,
        etherscan: Arc<dyn EthBalanceClient>,
        bsv: Arc<dyn BsvBalanceClient>,
    ) -> Self {
        Self {
            store,
            config,
            eth_clients,
            etherscan,
            bsv,
            tokens: TrackedTokens::default(),
            retry: RetryConfig::default(),
            trust_window: POST_SEND_TRUST_WINDOW,
            bulk_limit: DEFAULT_BULK_LIMIT,
        }
    }

    #[must_use]
    pub fn with_tokens(mut self, tokens: TrackedTokens) -> Self {
        self.tokens = tokens;
        self
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub fn with_trust_window(mut self, trust_window: Duration) -> Self {
        self.trust_window = trust_window;
        self
    }

    /// Zero is treated as one.
    #[must_use]
    pub fn with_bulk_limit(mut self, bulk_limit: usize) -> Self {
        self.bulk_limit = bulk_limit.max(1);
        self
    }

    /// Fetch balances for one address.
    ///
    /// Chains without a provider (BTC, BCH) yield an empty, non-stale outcome.
    pub async fn fetch(&self, chain: Chain, address: &str) -> Result<FetchOutcome> {
        match chain {
            Chain::Eth => self.fetch_eth(address).await,
            Chain::Bsv => self.fetch_bsv(address).await,
            Chain::Btc | Chain::Bch => {
                debug!(%chain, address, "No balance provider for chain");
                Ok(FetchOutcome::default())
            }
        }
    }

    /// [`fetch`](Self::fetch) with a textual chain identifier.
    ///
    /// # Errors
    ///
    /// Unknown identifiers yield [`BalanceError::UnsupportedChain`].
    pub async fn fetch_by_id(&self, chain: &str, address: &str) -> Result<FetchOutcome> {
        let chain: Chain = chain.parse()?;
        self.fetch(chain, address).await
    }

    /// Cached native and tracked-token entries for an address.
    #[must_use]
    pub fn cached_entries(&self, chain: Chain, address: &str) -> Vec<CacheEntry> {
        entries_for_address(self.store.as_ref(), &self.tokens, chain, address)
    }

    #[must_use]
    pub fn tokens(&self) -> &TrackedTokens {
        &self.tokens
    }

    /// Entries to serve without a network call, if the native entry is
    /// younger than the trust window.
    fn trusted_entries(&self, chain: Chain, address: &str) -> Option<Vec<CacheEntry>> {
        let (_, age) = self.store.get(chain, address, "")?;
        if age >= self.trust_window {
            return None;
        }
        debug!(
            %chain,
            address,
            age_ms = age.as_millis() as u64,
            "Within post-send trust window, serving cache"
        );
        Some(self.cached_entries(chain, address))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::{clients::MockBsvClient, clients::MockEthClient, fixture::FetcherFixture};
    use crate::domain::amount::format_satoshis;
    use crate::testkit::domain::entry_aged;

    #[tokio::test]
    async fn btc_and_bch_return_empty_outcome() {
        let fx = FetcherFixture::builder().build();
        for chain in [Chain::Btc, Chain::Bch] {
            let outcome = fx.fetcher.fetch(chain, "addr").await.unwrap();
            assert!(outcome.entries.is_empty());
            assert!(!outcome.stale);
        }
        assert_eq!(fx.etherscan.native_calls(), 0);
        assert_eq!(fx.bsv.single_calls().len(), 0);
    }

    #[tokio::test]
    async fn unknown_chain_id_is_rejected() {
        let fx = FetcherFixture::builder().build();
        let err = fx.fetcher.fetch_by_id("doge", "D1").await.unwrap_err();
        assert_eq!(
            err.as_balance(),
            Some(&BalanceError::UnsupportedChain("doge".into()))
        );
    }

    #[tokio::test]
    async fn trust_window_skips_network_on_every_chain() {
        let fx = FetcherFixture::builder()
            .etherscan(MockEthClient::new("etherscan").with_native("0x1", alloy_primitives::U256::from(5u64)))
            .bsv(MockBsvClient::new().with_balance("1A", 5, 0))
            .cached(entry_aged(Chain::Eth, "0x1", "1.5", Duration::from_secs(10)))
            .cached(entry_aged(Chain::Bsv, "1A", "0.001", Duration::from_secs(10)))
            .build();

        let eth = fx.fetcher.fetch(Chain::Eth, "0x1").await.unwrap();
        assert_eq!(eth.native().unwrap().balance, "1.5");
        assert!(!eth.stale);

        let bsv = fx.fetcher.fetch(Chain::Bsv, "1A").await.unwrap();
        assert_eq!(bsv.native().unwrap().balance, "0.001");

        assert_eq!(fx.etherscan.native_calls(), 0);
        assert!(fx.bsv.single_calls().is_empty());
    }

    #[tokio::test]
    async fn trust_window_expires() {
        let fx = FetcherFixture::builder()
            .bsv(MockBsvClient::new().with_balance("1A", 250_000, 0))
            .cached(entry_aged(Chain::Bsv, "1A", "0.001", Duration::from_secs(31)))
            .build();

        let outcome = fx.fetcher.fetch(Chain::Bsv, "1A").await.unwrap();
        assert_eq!(outcome.native().unwrap().balance, format_satoshis(250_000));
        assert_eq!(fx.bsv.single_calls(), vec!["1A".to_string()]);
    }
}

//! A [`BalanceFetcher`] wired to mock providers and a fresh cache.

use std::sync::Arc;
use std::time::Duration;

use super::clients::{MockBsvClient, MockEthClient, MockEthFactory};
use super::config::etherscan_config;
use crate::application::balance::{
    cache::BalanceCache, fetcher::BalanceFetcher, service::BalanceService,
};
use crate::domain::{balance::CacheEntry, token::TrackedTokens};
use crate::infrastructure::config::settings::Config;
use crate::port::outbound::cache::BalanceStore;

pub struct FetcherFixture {
    pub cache: Arc<BalanceCache>,
    pub factory: Arc<MockEthFactory>,
    pub etherscan: Arc<MockEthClient>,
    pub bsv: Arc<MockBsvClient>,
    pub fetcher: Arc<BalanceFetcher>,
}

impl FetcherFixture {
    pub fn builder() -> FetcherFixtureBuilder {
        FetcherFixtureBuilder::default()
    }

    /// The RPC client registered for `url`.
    pub fn rpc_client(&self, url: &str) -> Arc<MockEthClient> {
        self.factory.client(url)
    }

    /// A policy-free service over this fetcher.
    pub fn service(&self) -> BalanceService {
        BalanceService::new(Arc::clone(&self.fetcher))
    }
}

pub struct FetcherFixtureBuilder {
    config: Config,
    tokens: TrackedTokens,
    factory: MockEthFactory,
    etherscan: MockEthClient,
    bsv: MockBsvClient,
    cached: Vec<CacheEntry>,
    bulk_limit: Option<usize>,
    trust_window: Option<Duration>,
}

impl Default for FetcherFixtureBuilder {
    fn default() -> Self {
        Self {
            config: etherscan_config(),
            tokens: TrackedTokens::default(),
            factory: MockEthFactory::new(),
            etherscan: MockEthClient::new("etherscan"),
            bsv: MockBsvClient::new(),
            cached: Vec::new(),
            bulk_limit: None,
            trust_window: None,
        }
    }
}

impl FetcherFixtureBuilder {
    /// Provider choice and RPC endpoints. Retry settings are taken from it too.
    #[must_use]
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn tokens(mut self, tokens: TrackedTokens) -> Self {
        self.tokens = tokens;
        self
    }

    /// Register a JSON-RPC node reachable at `url`.
    #[must_use]
    pub fn rpc(mut self, url: &str, client: MockEthClient) -> Self {
        self.factory = self.factory.with_client(url, client);
        self
    }

    #[must_use]
    pub fn etherscan(mut self, client: MockEthClient) -> Self {
        self.etherscan = client;
        self
    }

    #[must_use]
    pub fn bsv(mut self, client: MockBsvClient) -> Self {
        self.bsv = client;
        self
    }

    /// Seed the cache.
    #[must_use]
    pub fn cached(mut self, entry: CacheEntry) -> Self {
        self.cached.push(entry);
        self
    }

    #[must_use]
    pub fn bulk_limit(mut self, bulk_limit: usize) -> Self {
        self.bulk_limit = Some(bulk_limit);
        self
    }

    #[must_use]
    pub fn trust_window(mut self, trust_window: Duration) -> Self {
        self.trust_window = Some(trust_window);
        self
    }

    pub fn build(self) -> FetcherFixture {
        let cache = Arc::new(BalanceCache::with_tokens(self.tokens.clone()));
        for entry in self.cached {
            cache.set(entry).expect("in-memory cache write");
        }

        let factory = Arc::new(self.factory);
        let etherscan = Arc::new(self.etherscan);
        let bsv = Arc::new(self.bsv);
        let retry = self.config.retry.clone();

        let mut fetcher = BalanceFetcher::new(
            cache.clone(),
            Arc::new(self.config),
            factory.clone(),
            etherscan.clone(),
            bsv.clone(),
        )
        .with_tokens(self.tokens)
        .with_retry(retry);
        if let Some(limit) = self.bulk_limit {
            fetcher = fetcher.with_bulk_limit(limit);
        }
        if let Some(window) = self.trust_window {
            fetcher = fetcher.with_trust_window(window);
        }

        FetcherFixture {
            cache,
            factory,
            etherscan,
            bsv,
            fetcher: Arc::new(fetcher),
        }
    }
}

//! Composition root: build the balance stack from configuration.

use std::sync::Arc;

use tracing::info;

use super::config::settings::Config;
use super::transport::SharedTransport;
use crate::adapter::outbound::bsv::whatsonchain::WhatsOnChainClient;
use crate::adapter::outbound::eth::{etherscan::EtherscanClient, rpc::RpcClientFactory};
use crate::adapter::outbound::storage::json_file::JsonFileStorage;
use crate::application::balance::{
    cache::BalanceCache, fetcher::BalanceFetcher, policy::RefreshPolicy, service::BalanceService,
};
use crate::error::Result;
use crate::port::{
    outbound::cache::CacheStorage, outbound::config::ConfigProvider,
    outbound::metadata::AddressMetadataProvider,
};

/// The wired balance stack.
///
/// The cache is exposed for local post-send writes and persistence; the
/// service answers lookups.
pub struct BalanceEngine {
    pub cache: Arc<BalanceCache>,
    pub service: BalanceService,
    storage: JsonFileStorage,
}

impl BalanceEngine {
    /// Wire providers, cache, policy and service from `config`.
    ///
    /// `metadata` is the wallet's activity store, consulted by the refresh
    /// policy. Nothing is read from disk; call [`hydrate`](Self::hydrate).
    ///
    /// # Errors
    ///
    /// Returns an error if `config` fails validation.
    #[allow(clippy::result_large_err)]
    pub fn build(config: Config, metadata: Arc<dyn AddressMetadataProvider>) -> Result<Self> {
        config.validate()?;

        let transport = SharedTransport::global(&config.http);
        let http = transport.http().clone();
        let tokens = config.tracked_tokens();

        let cache = Arc::new(BalanceCache::with_tokens(tokens.clone()));
        let etherscan = Arc::new(EtherscanClient::new(
            http.clone(),
            config.eth.etherscan_url.clone(),
            config.eth.chain_id,
            config.etherscan_api_key(),
        ));
        let bsv = Arc::new(WhatsOnChainClient::new(http.clone(), config.bsv.api_url.clone()));
        let rpc = Arc::new(RpcClientFactory::new(http));

        info!(
            eth_provider = %config.eth_provider(),
            rpc_configured = config.eth_rpc().is_some(),
            fallback_rpcs = config.eth.fallback_rpc_urls.len(),
            bulk_limit = config.bsv.bulk_limit,
            "Building balance engine"
        );

        let storage = JsonFileStorage::new(config.cache_path());
        let balance = config.balance.clone();
        let retry = config.retry.clone();
        let bulk_limit = config.bsv.bulk_limit;
        let config: Arc<dyn ConfigProvider> = Arc::new(config);

        let fetcher = BalanceFetcher::new(cache.clone(), config, rpc, etherscan, bsv)
            .with_tokens(tokens.clone())
            .with_retry(retry)
            .with_trust_window(balance.trust_window())
            .with_bulk_limit(bulk_limit);

        let policy = RefreshPolicy::new(cache.clone(), metadata)
            .with_tokens(tokens)
            .with_thresholds(balance.thresholds());

        let mut service = BalanceService::new(Arc::new(fetcher))
            .with_policy(Arc::new(policy))
            .with_max_concurrent(balance.max_concurrent)
            .with_stale_after(balance.stale_after());
        if let Some(limit) = balance.request_timeout() {
            service = service.with_request_timeout(limit);
        }

        Ok(Self {
            cache,
            service,
            storage,
        })
    }

    /// Load the persisted cache. Returns the number of entries taken.
    #[allow(clippy::result_large_err)]
    pub fn hydrate(&self) -> Result<usize> {
        self.cache.hydrate(&self.storage)
    }

    /// Persist the cache. Returns the number of entries written.
    #[allow(clippy::result_large_err)]
    pub fn flush(&self) -> Result<usize> {
        self.cache.flush(&self.storage)
    }

    #[must_use]
    pub fn storage(&self) -> &dyn CacheStorage {
        &self.storage
    }
}

//! Balance lookups for callers: policy, fetch, stale fallback, batching.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::Mutex;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::{timeout, timeout_at, Instant};
use tracing::{debug, error, info, warn};

use super::fetcher::{BalanceFetcher, BulkOutcome, FetchOutcome};
use super::policy::RefreshPolicy;
use crate::domain::{
    balance::BalanceEntry, balance::DEFAULT_STALE_AFTER, chain::Chain, request::AddressError,
    request::AddressRef, request::FetchBatchRequest, request::FetchBatchResult,
    request::FetchRequest, request::FetchResult,
};
use crate::error::{BalanceError, Error, Result};

/// Concurrent non-bulk fetches per batch unless the request says otherwise.
pub const DEFAULT_MAX_CONCURRENT: usize = 8;

type Sink<T> = Arc<Mutex<Vec<T>>>;

/// Entry point for balance lookups.
///
/// Cheap to clone; clones share the fetcher and policy.
#[derive(Clone)]
pub struct BalanceService {
    fetcher: Arc<BalanceFetcher>,
    policy: Option<Arc<RefreshPolicy>>,
    max_concurrent: usize,
    stale_after: Duration,
    request_timeout: Option<Duration>,
}

impl BalanceService {
    /// A service without a refresh policy: every non-trusted lookup goes to
    /// the network.
    pub fn new(fetcher: Arc<BalanceFetcher>) -> Self {
        Self {
            fetcher,
            policy: None,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            stale_after: DEFAULT_STALE_AFTER,
            request_timeout: None,
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: Arc<RefreshPolicy>) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Zero is treated as one; values above the semaphore limit are capped.
    #[must_use]
    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.clamp(1, Semaphore::MAX_PERMITS);
        self
    }

    #[must_use]
    pub fn with_stale_after(mut self, stale_after: Duration) -> Self {
        self.stale_after = stale_after;
        self
    }

    /// Default bound on a single fetch when the request sets none.
    #[must_use]
    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = Some(request_timeout);
        self
    }

    #[must_use]
    pub fn fetcher(&self) -> &Arc<BalanceFetcher> {
        &self.fetcher
    }

    /// Balances for one address.
    ///
    /// Unless forced, the refresh policy may answer from cache. A failed
    /// fetch degrades to cached data marked stale, with the error attached.
    ///
    /// # Errors
    ///
    /// The fetch error, when nothing is cached for the address.
    pub async fn fetch_balance(&self, request: &FetchRequest) -> Result<FetchResult> {
        let chain = request.chain;
        let address = request.address.as_str();

        if !request.force_refresh {
            if let Some(result) = self.cached_if_policy_allows(chain, address) {
                return Ok(result);
            }
        }

        let fetched = match request.timeout.or(self.request_timeout) {
            Some(limit) => timeout(limit, self.fetcher.fetch(chain, address))
                .await
                .unwrap_or_else(|_| Err(canceled(chain, address))),
            None => self.fetcher.fetch(chain, address).await,
        };

        match fetched {
            Ok(outcome) => Ok(self.to_result(chain, address, outcome)),
            Err(err) => self.stale_fallback(chain, address, err),
        }
    }

    /// Balances for many addresses.
    ///
    /// BSV addresses share one bulk path; every other address is fetched on
    /// its own task, at most `max_concurrent` at a time. Per-address failures
    /// land in `errors` and never abort the batch. Results are in completion
    /// order. A timeout too large to express as a deadline means none.
    pub async fn fetch_balances(&self, request: FetchBatchRequest) -> FetchBatchResult {
        let deadline = request
            .timeout
            .and_then(|t| Instant::now().checked_add(t));
        let limit = request
            .max_concurrent
            .filter(|n| *n > 0)
            .unwrap_or(self.max_concurrent)
            .min(Semaphore::MAX_PERMITS);
        let force_refresh = request.force_refresh;
        let total = request.addresses.len();

        let (bulk, individual): (Vec<_>, Vec<_>) = request
            .addresses
            .into_iter()
            .partition(|target| target.chain.supports_bulk());

        debug!(
            total,
            bulk = bulk.len(),
            individual = individual.len(),
            max_concurrent = limit,
            "Starting batch balance fetch"
        );

        let results: Sink<FetchResult> = Arc::new(Mutex::new(Vec::with_capacity(total)));
        let errors: Sink<AddressError> = Arc::new(Mutex::new(Vec::new()));
        let semaphore = Arc::new(Semaphore::new(limit));
        let mut tasks = JoinSet::new();

        if !bulk.is_empty() {
            let service = self.clone();
            let results = Arc::clone(&results);
            let errors = Arc::clone(&errors);
            tasks.spawn(async move {
                service
                    .fetch_bulk_group(bulk, force_refresh, deadline, &results, &errors)
                    .await;
            });
        }

        for target in individual {
            let service = self.clone();
            let semaphore = Arc::clone(&semaphore);
            let results = Arc::clone(&results);
            let errors = Arc::clone(&errors);
            tasks.spawn(async move {
                let outcome = service
                    .fetch_admitted(&semaphore, &target, force_refresh, deadline)
                    .await;
                record(outcome, target.chain, target.address, &results, &errors);
            });
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(err) = joined {
                error!(error = %err, "Balance fetch task failed");
            }
        }

        let batch = FetchBatchResult {
            results: std::mem::take(&mut *results.lock()),
            errors: std::mem::take(&mut *errors.lock()),
        };
        info!(
            results = batch.results.len(),
            errors = batch.errors.len(),
            "Batch balance fetch complete"
        );
        batch
    }

    /// Whatever is cached, without touching the network. Every result is
    /// marked stale; addresses with nothing cached get
    /// [`BalanceError::NoCachedBalance`].
    #[must_use]
    pub fn fetch_cached_balances(&self, request: &FetchBatchRequest) -> FetchBatchResult {
        let mut batch = FetchBatchResult::default();
        for target in &request.addresses {
            let entries = self.fetcher.cached_entries(target.chain, &target.address);
            if entries.is_empty() {
                batch.errors.push(AddressError {
                    chain: target.chain,
                    address: target.address.clone(),
                    error: BalanceError::NoCachedBalance {
                        chain: target.chain,
                        address: target.address.clone(),
                    }
                    .into(),
                });
                continue;
            }
            batch.results.push(FetchResult {
                chain: target.chain,
                address: target.address.clone(),
                balances: entries.into_iter().map(BalanceEntry::stale).collect(),
                stale: true,
                error: None,
            });
        }
        batch
    }

    /// Wait for a concurrency slot, then fetch. Gives up with
    /// [`BalanceError::Canceled`] if the deadline passes first.
    async fn fetch_admitted(
        &self,
        semaphore: &Semaphore,
        target: &AddressRef,
        force_refresh: bool,
        deadline: Option<Instant>,
    ) -> Result<FetchResult> {
        let acquired = match deadline {
            Some(deadline) => timeout_at(deadline, semaphore.acquire())
                .await
                .map_err(|_| canceled(target.chain, &target.address))?,
            None => semaphore.acquire().await,
        };
        let _permit = acquired.map_err(|_| canceled(target.chain, &target.address))?;

        let mut request = FetchRequest::new(target.chain, target.address.clone());
        request.force_refresh = force_refresh;
        if let Some(deadline) = deadline {
            let remaining = deadline.saturating_duration_since(Instant::now());
            request.timeout = Some(
                self.request_timeout
                    .map_or(remaining, |default| default.min(remaining)),
            );
        }
        self.fetch_balance(&request).await
    }

    async fn fetch_bulk_group(
        &self,
        targets: Vec<AddressRef>,
        force_refresh: bool,
        deadline: Option<Instant>,
        results: &Mutex<Vec<FetchResult>>,
        errors: &Mutex<Vec<AddressError>>,
    ) {
        let mut seen = HashSet::new();
        let mut pending = Vec::new();
        for target in targets {
            if !seen.insert(target.address.clone()) {
                continue;
            }
            if !force_refresh {
                if let Some(result) = self.cached_if_policy_allows(Chain::Bsv, &target.address) {
                    results.lock().push(result);
                    continue;
                }
            }
            pending.push(target.address);
        }
        if pending.is_empty() {
            return;
        }

        let bulk = self.fetcher.fetch_bsv_bulk_until(&pending, deadline).await;

        let BulkOutcome {
            mut balances,
            error: bulk_error,
            canceled: cut_off,
        } = bulk;
        if let Some(err) = &bulk_error {
            warn!(error = %err, "Bulk BSV fetch degraded to cache");
        }
        if !cut_off.is_empty() {
            warn!(addresses = cut_off.len(), "Bulk BSV fetch hit batch deadline");
        }
        let cut_off: HashSet<String> = cut_off.into_iter().collect();

        for address in pending {
            if cut_off.contains(&address) {
                let outcome =
                    self.stale_fallback(Chain::Bsv, &address, canceled(Chain::Bsv, &address));
                record(outcome, Chain::Bsv, address, results, errors);
                continue;
            }
            let Some(outcome) = balances.remove(&address) else {
                let reason = bulk_error
                    .as_ref()
                    .map_or_else(|| "no balance returned by provider".to_string(), ToString::to_string);
                errors.lock().push(AddressError {
                    chain: Chain::Bsv,
                    error: BalanceError::CacheNotFound {
                        chain: Chain::Bsv,
                        address: address.clone(),
                        reason,
                    }
                    .into(),
                    address,
                });
                continue;
            };

            let mut result = self.to_result(Chain::Bsv, &address, outcome);
            if result.stale {
                result.error = bulk_error.clone().map(Error::from);
            }
            results.lock().push(result);
        }
    }

    fn cached_if_policy_allows(&self, chain: Chain, address: &str) -> Option<FetchResult> {
        let policy = self.policy.as_ref()?;
        if policy.should_refresh(chain, address).is_refresh_required() {
            return None;
        }
        let entries = self.fetcher.cached_entries(chain, address);
        if entries.is_empty() {
            return None;
        }
        debug!(%chain, address, "Refresh policy allows cached balance");
        Some(FetchResult::new(
            chain,
            address,
            entries.into_iter().map(BalanceEntry::fresh).collect(),
        ))
    }

    fn to_result(&self, chain: Chain, address: &str, outcome: FetchOutcome) -> FetchResult {
        let now = Utc::now();
        let stale = outcome.stale;
        let balances = outcome
            .entries
            .into_iter()
            .map(|entry| {
                let mut balance = BalanceEntry::from_cache_entry(entry, now, self.stale_after);
                balance.stale |= stale;
                balance
            })
            .collect();
        FetchResult {
            chain,
            address: address.to_string(),
            balances,
            stale,
            error: None,
        }
    }

    fn stale_fallback(&self, chain: Chain, address: &str, err: Error) -> Result<FetchResult> {
        let cached = self.fetcher.cached_entries(chain, address);
        if cached.is_empty() {
            return Err(err);
        }
        warn!(%chain, address, error = %err, "Balance fetch failed, serving stale cache");
        Ok(FetchResult {
            chain,
            address: address.to_string(),
            balances: cached.into_iter().map(BalanceEntry::stale).collect(),
            stale: true,
            error: Some(err),
        })
    }
}

fn record(
    outcome: Result<FetchResult>,
    chain: Chain,
    address: String,
    results: &Mutex<Vec<FetchResult>>,
    errors: &Mutex<Vec<AddressError>>,
) {
    match outcome {
        Ok(result) => results.lock().push(result),
        Err(error) => errors.lock().push(AddressError {
            chain,
            address,
            error,
        }),
    }
}

fn canceled(chain: Chain, address: &str) -> Error {
    BalanceError::Canceled {
        chain,
        address: address.to_string(),
    }
    .into()
}

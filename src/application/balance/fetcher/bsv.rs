//! BSV: single-address and bulk fetches with cache fallback.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;

use tokio::time::{timeout_at, Instant};
use tracing::{debug, warn};

use super::{BalanceFetcher, BulkOutcome, FetchOutcome};
use crate::domain::amount::{format_satoshis, format_unconfirmed};
use crate::domain::{balance::CacheEntry, chain::Chain};
use crate::error::{BalanceError, ProviderError, Result};
use crate::infrastructure::retry::retry_with_backoff;
use crate::port::outbound::chain::SatoshiBalance;

fn bsv_entry(address: &str, sats: SatoshiBalance) -> CacheEntry {
    CacheEntry::native(Chain::Bsv, address, format_satoshis(sats.confirmed))
        .with_unconfirmed(format_unconfirmed(sats.unconfirmed))
}

/// `None` when `deadline` passes before `fut` completes.
async fn until<F: Future>(deadline: Option<Instant>, fut: F) -> Option<F::Output> {
    match deadline {
        Some(deadline) => timeout_at(deadline, fut).await.ok(),
        None => Some(fut.await),
    }
}

impl BalanceFetcher {
    /// BSV balance for `address`.
    ///
    /// Falls back to cache when the provider fails.
    ///
    /// # Errors
    ///
    /// [`BalanceError::CacheNotFound`] when the provider fails and nothing
    /// is cached.
    pub async fn fetch_bsv(&self, address: &str) -> Result<FetchOutcome> {
        if let Some(entries) = self.trusted_entries(Chain::Bsv, address) {
            return Ok(FetchOutcome::fresh(entries));
        }
        self.fetch_bsv_from_network(address).await
    }

    async fn fetch_bsv_from_network(&self, address: &str) -> Result<FetchOutcome> {
        let client = Arc::clone(&self.bsv);
        let fetched = retry_with_backoff(&self.retry, "bsv balance", || {
            client.native_balance(address)
        })
        .await;

        match fetched {
            Ok(sats) => {
                let entry = bsv_entry(address, sats);
                self.store.set(entry.clone())?;
                Ok(FetchOutcome::fresh(vec![entry]))
            }
            Err(err) => self.bsv_cache_fallback(address, &err),
        }
    }

    fn bsv_cache_fallback(&self, address: &str, err: &ProviderError) -> Result<FetchOutcome> {
        let cached = self.cached_entries(Chain::Bsv, address);
        if cached.is_empty() {
            return Err(BalanceError::CacheNotFound {
                chain: Chain::Bsv,
                address: address.to_string(),
                reason: err.to_string(),
            }
            .into());
        }
        warn!(address, error = %err, "BSV provider failed, serving stale cache");
        Ok(FetchOutcome::stale(cached))
    }

    /// Balances for many BSV addresses.
    ///
    /// Addresses are deduplicated and requested in chunks of the bulk limit.
    /// Per address: trust window, then bulk result, then an individual fetch
    /// for addresses the bulk response left out, then cache if the whole
    /// chunk failed.
    pub async fn fetch_bsv_bulk(&self, addresses: &[String]) -> BulkOutcome {
        self.fetch_bsv_bulk_until(addresses, None).await
    }

    /// [`fetch_bsv_bulk`](Self::fetch_bsv_bulk) bounded by `deadline`.
    ///
    /// The deadline applies per network call, so chunks that finished before
    /// it keep their fresh balances. Addresses still waiting end up in
    /// [`BulkOutcome::canceled`].
    pub async fn fetch_bsv_bulk_until(
        &self,
        addresses: &[String],
        deadline: Option<Instant>,
    ) -> BulkOutcome {
        let mut outcome = BulkOutcome::default();
        let mut seen = HashSet::new();
        let mut pending = Vec::new();

        for address in addresses {
            if !seen.insert(address.as_str()) {
                continue;
            }
            match self.trusted_entries(Chain::Bsv, address) {
                Some(entries) => {
                    outcome
                        .balances
                        .insert(address.clone(), FetchOutcome::fresh(entries));
                }
                None => pending.push(address.clone()),
            }
        }

        let mut served_from_cache = 0;
        let mut first_failure: Option<ProviderError> = None;

        for chunk in pending.chunks(self.bulk_limit) {
            let Some(fetched) = until(deadline, self.bsv.bulk_native_balance(chunk)).await else {
                debug!(addresses = chunk.len(), "Bulk BSV chunk cut off by deadline");
                outcome.canceled.extend(chunk.iter().cloned());
                continue;
            };
            match fetched {
                Ok(found) => self.apply_bulk_chunk(chunk, found, deadline, &mut outcome).await,
                Err(err) => {
                    warn!(
                        addresses = chunk.len(),
                        error = %err,
                        "Bulk BSV fetch failed, falling back to cache"
                    );
                    for address in chunk {
                        let cached = self.cached_entries(Chain::Bsv, address);
                        if cached.is_empty() {
                            debug!(address, "No cached BSV balance");
                            continue;
                        }
                        outcome
                            .balances
                            .insert(address.clone(), FetchOutcome::stale(cached));
                        served_from_cache += 1;
                    }
                    first_failure.get_or_insert(err);
                }
            }
        }

        if let Some(err) = first_failure {
            outcome.error = Some(BalanceError::BulkFallback {
                fallback: served_from_cache,
                reason: err.to_string(),
            });
        }
        outcome
    }

    async fn apply_bulk_chunk(
        &self,
        chunk: &[String],
        mut found: HashMap<String, SatoshiBalance>,
        deadline: Option<Instant>,
        outcome: &mut BulkOutcome,
    ) {
        let mut missing = Vec::new();
        for address in chunk {
            let Some(sats) = found.remove(address) else {
                missing.push(address);
                continue;
            };
            let entry = bsv_entry(address, sats);
            if let Err(err) = self.store.set(entry.clone()) {
                warn!(address, error = %err, "BSV cache write failed");
            }
            outcome
                .balances
                .insert(address.clone(), FetchOutcome::fresh(vec![entry]));
        }

        for address in missing {
            debug!(address, "Address missing from bulk response, fetching individually");
            match until(deadline, self.fetch_bsv_from_network(address)).await {
                Some(Ok(single)) => {
                    outcome.balances.insert(address.clone(), single);
                }
                Some(Err(err)) => debug!(address, error = %err, "No BSV balance available"),
                None => outcome.canceled.push(address.clone()),
            }
        }
    }
}

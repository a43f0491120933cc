//! Refresh policy: decide between cached data and a network fetch.
//!
//! Addresses are ranked by how likely their balance is to change:
//!
//! | has activity | has balance | priority | cache tolerance |
//! |--------------|-------------|----------|-----------------|
//! | yes          | yes         | high     | none            |
//! | yes          | no          | medium   | 30 minutes      |
//! | no           | no          | low      | 2 hours         |
//! | no           | yes         | -        | none            |
//!
//! Two overrides come first: no cache or no metadata means refresh, and an
//! address scanned within the last 24 hours is treated as new and refreshed.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::debug;

use crate::domain::amount::is_zero_amount;
use crate::domain::{
    balance::CacheEntry, chain::Chain, request::Priority, request::RefreshDecision,
    token::TrackedTokens,
};
use crate::port::{outbound::cache::BalanceStore, outbound::metadata::AddressMetadataProvider};

/// Cache tolerance for used-but-empty addresses.
pub const MEDIUM_PRIORITY_TTL: Duration = Duration::from_secs(30 * 60);

/// Cache tolerance for never-used addresses.
pub const LOW_PRIORITY_TTL: Duration = Duration::from_secs(2 * 60 * 60);

/// Addresses scanned within this window are always refreshed.
pub const NEW_ADDRESS_WINDOW: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolicyThresholds {
    pub medium_ttl: Duration,
    pub low_ttl: Duration,
    pub new_address_window: Duration,
}

impl Default for PolicyThresholds {
    fn default() -> Self {
        Self {
            medium_ttl: MEDIUM_PRIORITY_TTL,
            low_ttl: LOW_PRIORITY_TTL,
            new_address_window: NEW_ADDRESS_WINDOW,
        }
    }
}

pub struct RefreshPolicy {
    store: Arc<dyn BalanceStore>,
    metadata: Arc<dyn AddressMetadataProvider>,
    tokens: TrackedTokens,
    thresholds: PolicyThresholds,
}

impl RefreshPolicy {
    pub fn new(store: Arc<dyn BalanceStore>, metadata: Arc<dyn AddressMetadataProvider>) -> Self {
        Self {
            store,
            metadata,
            tokens: TrackedTokens::default(),
            thresholds: PolicyThresholds::default(),
        }
    }

    #[must_use]
    pub fn with_tokens(mut self, tokens: TrackedTokens) -> Self {
        self.tokens = tokens;
        self
    }

    #[must_use]
    pub fn with_thresholds(mut self, thresholds: PolicyThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Decide whether `address` needs a network fetch.
    pub fn should_refresh(&self, chain: Chain, address: &str) -> RefreshDecision {
        let Some((native, age)) = self.store.get(chain, address, "") else {
            debug!(%chain, address, "No cached balance, refresh required");
            return RefreshDecision::RefreshRequired;
        };

        let Some(meta) = self.metadata.get_address(chain, address) else {
            debug!(%chain, address, "No address metadata, refresh required");
            return RefreshDecision::RefreshRequired;
        };

        if let Some(scanned) = meta.last_scanned {
            let since_scan = (Utc::now() - scanned).to_std().unwrap_or(Duration::ZERO);
            if since_scan < self.thresholds.new_address_window {
                debug!(%chain, address, "Recently scanned address, refresh required");
                return RefreshDecision::RefreshRequired;
            }
        }

        let has_balance = self.has_balance(chain, address, &native);
        let decision = match Self::priority(meta.has_activity, has_balance) {
            Some(Priority::Medium) if age < self.thresholds.medium_ttl => RefreshDecision::CacheOk,
            Some(Priority::Low) if age < self.thresholds.low_ttl => RefreshDecision::CacheOk,
            _ => RefreshDecision::RefreshRequired,
        };

        debug!(
            %chain,
            address,
            has_activity = meta.has_activity,
            has_balance,
            age_secs = age.as_secs(),
            ?decision,
            "Refresh policy evaluated"
        );
        decision
    }

    /// Priority tier for an address.
    ///
    /// Returns `None` for funded addresses without recorded activity; that
    /// combination means the activity data is behind and is never cached.
    #[must_use]
    pub const fn priority(has_activity: bool, has_balance: bool) -> Option<Priority> {
        match (has_activity, has_balance) {
            (true, true) => Some(Priority::High),
            (true, false) => Some(Priority::Medium),
            (false, false) => Some(Priority::Low),
            (false, true) => None,
        }
    }

    fn has_balance(&self, chain: Chain, address: &str, native: &CacheEntry) -> bool {
        if !is_zero_amount(&native.balance) {
            return true;
        }
        self.tokens.for_chain(chain).iter().any(|token| {
            self.store
                .get(chain, address, &token.contract)
                .is_some_and(|(entry, _)| !is_zero_amount(&entry.balance))
        })
    }
}

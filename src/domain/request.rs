//! Request and result shapes for balance lookups.

use std::fmt;
use std::time::Duration;

use super::balance::BalanceEntry;
use super::chain::Chain;
use crate::error::Error;

/// Output of the refresh policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshDecision {
    /// Go to the network.
    RefreshRequired,
    /// Serve from cache.
    CacheOk,
}

impl RefreshDecision {
    #[must_use]
    pub const fn is_refresh_required(self) -> bool {
        matches!(self, Self::RefreshRequired)
    }
}

/// Cache tolerance tier derived from activity history and current balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Priority {
    /// Used and funded: never served from cache.
    High,
    /// Used but empty.
    Medium,
    /// Never used.
    Low,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::High => f.write_str("high"),
            Self::Medium => f.write_str("medium"),
            Self::Low => f.write_str("low"),
        }
    }
}

/// One `(chain, address)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AddressRef {
    pub chain: Chain,
    pub address: String,
}

impl AddressRef {
    pub fn new(chain: Chain, address: impl Into<String>) -> Self {
        Self {
            chain,
            address: address.into(),
        }
    }
}

impl fmt::Display for AddressRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.chain, self.address)
    }
}

/// Balance lookup for a single address.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub chain: Chain,
    pub address: String,
    /// Skip the refresh policy and go to the network.
    pub force_refresh: bool,
    /// Upper bound on the network work for this request.
    pub timeout: Option<Duration>,
}

impl FetchRequest {
    pub fn new(chain: Chain, address: impl Into<String>) -> Self {
        Self {
            chain,
            address: address.into(),
            force_refresh: false,
            timeout: None,
        }
    }

    #[must_use]
    pub fn force_refresh(mut self) -> Self {
        self.force_refresh = true;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Balances for a single address.
#[derive(Debug)]
pub struct FetchResult {
    pub chain: Chain,
    pub address: String,
    pub balances: Vec<BalanceEntry>,
    /// The data was served from cache after a failed or skipped network fetch.
    pub stale: bool,
    /// The failure that caused a stale fallback, kept for visibility.
    pub error: Option<Error>,
}

impl FetchResult {
    pub fn new(chain: Chain, address: impl Into<String>, balances: Vec<BalanceEntry>) -> Self {
        Self {
            chain,
            address: address.into(),
            balances,
            stale: false,
            error: None,
        }
    }

    /// Native-asset balance, if present.
    #[must_use]
    pub fn native(&self) -> Option<&BalanceEntry> {
        self.balances.iter().find(|b| b.entry.is_native())
    }

    /// Balance of a token by contract, if present.
    #[must_use]
    pub fn token(&self, contract: &str) -> Option<&BalanceEntry> {
        self.balances.iter().find(|b| b.entry.token == contract)
    }
}

/// Balance lookup for many addresses.
///
/// Results come back in completion order; correlate by `(chain, address)`.
#[derive(Debug, Clone, Default)]
pub struct FetchBatchRequest {
    pub addresses: Vec<AddressRef>,
    pub force_refresh: bool,
    /// Cap on concurrent non-bulk fetches; `None` or zero uses the default.
    pub max_concurrent: Option<usize>,
    /// Deadline for the whole batch, measured from the call.
    pub timeout: Option<Duration>,
}

impl FetchBatchRequest {
    pub fn new(addresses: Vec<AddressRef>) -> Self {
        Self {
            addresses,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn force_refresh(mut self) -> Self {
        self.force_refresh = true;
        self
    }

    #[must_use]
    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = Some(max_concurrent);
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// A failure for one address in a batch.
#[derive(Debug)]
pub struct AddressError {
    pub chain: Chain,
    pub address: String,
    pub error: Error,
}

impl fmt::Display for AddressError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.chain, self.address, self.error)
    }
}

/// Outcome of a batch lookup. Per-address failures never abort the batch.
#[derive(Debug, Default)]
pub struct FetchBatchResult {
    pub results: Vec<FetchResult>,
    pub errors: Vec<AddressError>,
}

impl FetchBatchResult {
    /// Result for an address, if one was produced.
    #[must_use]
    pub fn result_for(&self, chain: Chain, address: &str) -> Option<&FetchResult> {
        self.results
            .iter()
            .find(|r| r.chain == chain && r.address == address)
    }

    /// Error recorded for an address, if any.
    #[must_use]
    pub fn error_for(&self, chain: Chain, address: &str) -> Option<&AddressError> {
        self.errors
            .iter()
            .find(|e| e.chain == chain && e.address == address)
    }
}

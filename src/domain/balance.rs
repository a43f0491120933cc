//! Cached balance snapshots and their keys.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::chain::Chain;
use crate::error::BalanceError;

/// Age beyond which a cached balance is reported as stale.
pub const DEFAULT_STALE_AFTER: Duration = Duration::from_secs(5 * 60);

/// Uniqueness key of a cache entry: `(chain, address, token)`.
///
/// An empty `token` denotes the chain's native asset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    pub chain: Chain,
    pub address: String,
    pub token: String,
}

impl CacheKey {
    pub fn new(chain: Chain, address: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            chain,
            address: address.into(),
            token: token.into(),
        }
    }

    /// Key of the native-asset entry for an address.
    pub fn native(chain: Chain, address: impl Into<String>) -> Self {
        Self::new(chain, address, String::new())
    }
}

/// Renders the persisted form `<chain>:<address>[:<token>]`.
impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.token.is_empty() {
            write!(f, "{}:{}", self.chain, self.address)
        } else {
            write!(f, "{}:{}:{}", self.chain, self.address, self.token)
        }
    }
}

impl FromStr for CacheKey {
    type Err = BalanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(3, ':');
        let chain: Chain = parts.next().unwrap_or_default().parse()?;
        let address = parts.next().unwrap_or_default();
        let token = parts.next().unwrap_or_default();
        Ok(Self::new(chain, address, token))
    }
}

/// One observed balance snapshot.
///
/// A write always replaces the previous entry for the same [`CacheKey`]
/// wholesale; callers preserving symbol or decimals read first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub chain: Chain,
    pub address: String,
    /// Confirmed balance in human units.
    pub balance: String,
    /// Signed pending delta in human units; empty when zero.
    #[serde(default)]
    pub unconfirmed: String,
    pub symbol: String,
    /// Empty for the native asset, otherwise the token contract/identifier.
    #[serde(default)]
    pub token: String,
    pub decimals: u8,
    pub updated_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Native-asset entry observed now.
    pub fn native(chain: Chain, address: impl Into<String>, balance: impl Into<String>) -> Self {
        Self {
            chain,
            address: address.into(),
            balance: balance.into(),
            unconfirmed: String::new(),
            symbol: chain.native_symbol().to_string(),
            token: String::new(),
            decimals: chain.native_decimals(),
            updated_at: Utc::now(),
        }
    }

    /// Token entry observed now.
    pub fn for_token(
        chain: Chain,
        address: impl Into<String>,
        token: &super::token::TrackedToken,
        balance: impl Into<String>,
    ) -> Self {
        Self {
            chain,
            address: address.into(),
            balance: balance.into(),
            unconfirmed: String::new(),
            symbol: token.symbol.clone(),
            token: token.contract.clone(),
            decimals: token.decimals,
            updated_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn with_unconfirmed(mut self, unconfirmed: impl Into<String>) -> Self {
        self.unconfirmed = unconfirmed.into();
        self
    }

    #[must_use]
    pub fn with_updated_at(mut self, updated_at: DateTime<Utc>) -> Self {
        self.updated_at = updated_at;
        self
    }

    #[must_use]
    pub fn key(&self) -> CacheKey {
        CacheKey::new(self.chain, self.address.clone(), self.token.clone())
    }

    #[must_use]
    pub fn is_native(&self) -> bool {
        self.token.is_empty()
    }

    /// Time since the observation; zero for timestamps in the future.
    #[must_use]
    pub fn age_at(&self, now: DateTime<Utc>) -> Duration {
        (now - self.updated_at).to_std().unwrap_or(Duration::ZERO)
    }
}

/// A cache entry as reported to callers, with the derived staleness flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceEntry {
    #[serde(flatten)]
    pub entry: CacheEntry,
    pub stale: bool,
}

impl BalanceEntry {
    /// Flag the entry stale iff its age exceeds `stale_after`.
    #[must_use]
    pub fn from_cache_entry(entry: CacheEntry, now: DateTime<Utc>, stale_after: Duration) -> Self {
        let stale = entry.age_at(now) > stale_after;
        Self { entry, stale }
    }

    /// Report the entry as stale regardless of its age.
    #[must_use]
    pub fn stale(entry: CacheEntry) -> Self {
        Self { entry, stale: true }
    }

    /// Report the entry as fresh regardless of its age.
    #[must_use]
    pub fn fresh(entry: CacheEntry) -> Self {
        Self {
            entry,
            stale: false,
        }
    }
}

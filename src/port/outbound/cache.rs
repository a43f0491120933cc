//! Balance cache ports.

use std::time::Duration;

use crate::domain::{balance::CacheEntry, chain::Chain};
use crate::error::Result;

/// Key-value store of the last known balance per `(chain, address, token)`.
///
/// Implementations must make every `set` visible to subsequent `get`s from
/// any caller. Staleness is the reader's concern: a store never drops an
/// entry on its own.
pub trait BalanceStore: Send + Sync {
    /// Entry for the key and its age at read time. `token = ""` is the native asset.
    fn get(&self, chain: Chain, address: &str, token: &str) -> Option<(CacheEntry, Duration)>;

    /// Replace the entry for the entry's key wholesale.
    fn set(&self, entry: CacheEntry) -> Result<()>;
}

/// Load/save of the persisted cache file.
pub trait CacheStorage: Send + Sync {
    /// All persisted entries. A missing file is an empty cache.
    fn load(&self) -> Result<Vec<CacheEntry>>;

    /// Replace the persisted contents with `entries`.
    fn save(&self, entries: &[CacheEntry]) -> Result<()>;
}

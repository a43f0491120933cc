//! Thread-safe balance cache.

use std::collections::HashMap;
use std::time::Duration;

use chrono::Utc;
use parking_lot::RwLock;
use tracing::debug;

use crate::domain::{balance::CacheEntry, balance::CacheKey, chain::Chain, token::TrackedTokens};
use crate::error::Result;
use crate::port::{outbound::cache::BalanceStore, outbound::cache::CacheStorage};

/// Native entry plus every tracked token entry present for an address.
///
/// With the default token list this is 0, 1 or 2 entries: the native
/// balance and, on ETH only, USDC.
pub fn entries_for_address(
    store: &dyn BalanceStore,
    tokens: &TrackedTokens,
    chain: Chain,
    address: &str,
) -> Vec<CacheEntry> {
    let native = store.get(chain, address, "").map(|(entry, _)| entry);
    let tracked = tokens
        .for_chain(chain)
        .iter()
        .filter_map(|token| store.get(chain, address, &token.contract))
        .map(|(entry, _)| entry);
    native.into_iter().chain(tracked).collect()
}

/// In-memory balance cache guarded by a single whole-store lock.
///
/// Entries are never evicted; staleness is interpreted by readers from the
/// age returned with each read.
pub struct BalanceCache {
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
    tokens: TrackedTokens,
}

impl BalanceCache {
    /// Create an empty cache tracking the default token list.
    #[must_use]
    pub fn new() -> Self {
        Self::with_tokens(TrackedTokens::default())
    }

    #[must_use]
    pub fn with_tokens(tokens: TrackedTokens) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            tokens,
        }
    }

    /// Cached entries for an address: native first, then tracked tokens.
    #[must_use]
    pub fn get_all_for_address(&self, chain: Chain, address: &str) -> Vec<CacheEntry> {
        entries_for_address(self, &self.tokens, chain, address)
    }

    /// Record a locally computed native balance, e.g. right after a send.
    ///
    /// Symbol and decimals of an existing entry are kept. The fresh timestamp
    /// opens the post-send trust window for this address.
    pub fn record_local_balance(
        &self,
        chain: Chain,
        address: &str,
        balance: impl Into<String>,
        unconfirmed: impl Into<String>,
    ) {
        let key = CacheKey::native(chain, address);
        let mut entries = self.entries.write();
        let entry = match entries.get(&key) {
            Some(existing) => CacheEntry {
                balance: balance.into(),
                unconfirmed: unconfirmed.into(),
                updated_at: Utc::now(),
                ..existing.clone()
            },
            None => CacheEntry::native(chain, address, balance).with_unconfirmed(unconfirmed),
        };
        entries.insert(key, entry);
    }

    /// Drop the native and token entries of an address. Returns the count removed.
    pub fn invalidate(&self, chain: Chain, address: &str) -> usize {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|key, _| !(key.chain == chain && key.address == address));
        before - entries.len()
    }

    /// Copy of every entry, ordered by key.
    #[must_use]
    pub fn snapshot(&self) -> Vec<CacheEntry> {
        let entries = self.entries.read();
        let mut keyed: Vec<_> = entries.iter().collect();
        keyed.sort_by(|a, b| a.0.cmp(b.0));
        keyed.into_iter().map(|(_, entry)| entry.clone()).collect()
    }

    /// Merge persisted entries, keeping whichever side was observed last.
    ///
    /// Returns the number of entries taken from storage.
    pub fn hydrate(&self, storage: &dyn CacheStorage) -> Result<usize> {
        let loaded = storage.load()?;
        let mut entries = self.entries.write();
        let mut taken = 0;
        for entry in loaded {
            let key = entry.key();
            let newer = entries
                .get(&key)
                .map_or(true, |current| entry.updated_at > current.updated_at);
            if newer {
                entries.insert(key, entry);
                taken += 1;
            }
        }
        debug!(entries = taken, "Hydrated balance cache");
        Ok(taken)
    }

    /// Persist the current contents. Returns the number of entries written.
    pub fn flush(&self, storage: &dyn CacheStorage) -> Result<usize> {
        let snapshot = self.snapshot();
        storage.save(&snapshot)?;
        debug!(entries = snapshot.len(), "Flushed balance cache");
        Ok(snapshot.len())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for BalanceCache {
    fn default() -> Self {
        Self::new()
    }
}

impl BalanceStore for BalanceCache {
    fn get(&self, chain: Chain, address: &str, token: &str) -> Option<(CacheEntry, Duration)> {
        let key = CacheKey::new(chain, address, token);
        let entry = self.entries.read().get(&key).cloned()?;
        let age = entry.age_at(Utc::now());
        Some((entry, age))
    }

    fn set(&self, entry: CacheEntry) -> Result<()> {
        self.entries.write().insert(entry.key(), entry);
        Ok(())
    }
}

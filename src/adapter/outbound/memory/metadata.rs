//! Address metadata held in memory.
//!
//! The wallet's activity scanner upserts records here; the refresh policy
//! reads them through [`AddressMetadataProvider`].

use dashmap::DashMap;

use crate::domain::{chain::Chain, metadata::AddressMetadata, request::AddressRef};
use crate::port::outbound::metadata::AddressMetadataProvider;

#[derive(Default)]
pub struct InMemoryMetadataStore {
    records: DashMap<AddressRef, AddressMetadata>,
}

impl InMemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the record for the metadata's address.
    pub fn upsert(&self, metadata: AddressMetadata) {
        let key = AddressRef::new(metadata.chain, metadata.address.clone());
        self.records.insert(key, metadata);
    }

    /// Remove an address. Returns the previous record.
    pub fn remove(&self, chain: Chain, address: &str) -> Option<AddressMetadata> {
        self.records
            .remove(&AddressRef::new(chain, address))
            .map(|(_, metadata)| metadata)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl AddressMetadataProvider for InMemoryMetadataStore {
    fn get_address(&self, chain: Chain, address: &str) -> Option<AddressMetadata> {
        self.records
            .get(&AddressRef::new(chain, address))
            .map(|record| record.value().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn upsert_replaces_and_scopes_by_chain() {
        let store = InMemoryMetadataStore::new();
        store.upsert(AddressMetadata::new(Chain::Bsv, "1A"));
        store.upsert(
            AddressMetadata::new(Chain::Bsv, "1A")
                .with_activity(true)
                .with_last_scanned(Utc::now()),
        );

        assert_eq!(store.len(), 1);
        assert!(store.get_address(Chain::Bsv, "1A").unwrap().has_activity);
        assert!(store.get_address(Chain::Eth, "1A").is_none());
    }

    #[test]
    fn remove_returns_previous() {
        let store = InMemoryMetadataStore::new();
        store.upsert(AddressMetadata::new(Chain::Eth, "0x1"));
        assert!(store.remove(Chain::Eth, "0x1").is_some());
        assert!(store.is_empty());
    }
}

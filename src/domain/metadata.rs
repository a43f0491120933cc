//! Address activity metadata, owned by the wallet's activity store.

use chrono::{DateTime, Utc};

use super::chain::Chain;

/// What the wallet knows about an address's history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressMetadata {
    pub chain: Chain,
    pub address: String,
    /// The address has ever received funds.
    pub has_activity: bool,
    /// Last time the local activity scan touched the address; `None` if never.
    pub last_scanned: Option<DateTime<Utc>>,
}

impl AddressMetadata {
    pub fn new(chain: Chain, address: impl Into<String>) -> Self {
        Self {
            chain,
            address: address.into(),
            has_activity: false,
            last_scanned: None,
        }
    }

    #[must_use]
    pub fn with_activity(mut self, has_activity: bool) -> Self {
        self.has_activity = has_activity;
        self
    }

    #[must_use]
    pub fn with_last_scanned(mut self, last_scanned: DateTime<Utc>) -> Self {
        self.last_scanned = Some(last_scanned);
        self
    }
}

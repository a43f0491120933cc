//! Address metadata port.

use crate::domain::{chain::Chain, metadata::AddressMetadata};

/// Read-only view of the wallet's address activity store.
pub trait AddressMetadataProvider: Send + Sync {
    /// Metadata for an address; `None` for new or unknown addresses.
    fn get_address(&self, chain: Chain, address: &str) -> Option<AddressMetadata>;
}

//! Builders for domain primitives.

use std::time::Duration;

use alloy_primitives::U256;
use chrono::Utc;

use crate::domain::{
    balance::CacheEntry, chain::Chain, metadata::AddressMetadata, token::TrackedToken,
};

fn ago(age: Duration) -> chrono::DateTime<Utc> {
    Utc::now() - chrono::Duration::from_std(age).expect("age fits chrono range")
}

/// Native entry observed `age` ago.
pub fn entry_aged(chain: Chain, address: &str, balance: &str, age: Duration) -> CacheEntry {
    CacheEntry::native(chain, address, balance).with_updated_at(ago(age))
}

/// Token entry observed `age` ago.
pub fn token_entry_aged(
    chain: Chain,
    address: &str,
    token: &TrackedToken,
    balance: &str,
    age: Duration,
) -> CacheEntry {
    CacheEntry::for_token(chain, address, token, balance).with_updated_at(ago(age))
}

/// Metadata with an optional scan `scanned_ago`.
pub fn metadata(
    chain: Chain,
    address: &str,
    has_activity: bool,
    scanned_ago: Option<Duration>,
) -> AddressMetadata {
    let meta = AddressMetadata::new(chain, address).with_activity(has_activity);
    match scanned_ago {
        Some(age) => meta.with_last_scanned(ago(age)),
        None => meta,
    }
}

/// Base units for a human amount: `units("1.5", 6)` is 1_500_000.
pub fn units(amount: &str, decimals: u8) -> U256 {
    let (int_part, frac_part) = amount.split_once('.').unwrap_or((amount, ""));
    let scale = usize::from(decimals);
    assert!(frac_part.len() <= scale, "{amount} has more than {decimals} decimals");
    let digits = format!("{int_part}{frac_part:0<scale$}");
    U256::from_str_radix(&digits, 10).expect("decimal amount")
}

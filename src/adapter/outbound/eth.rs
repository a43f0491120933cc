//! Ethereum balance providers.

use std::str::FromStr;

use alloy_primitives::{Address, U256};

use crate::error::ProviderError;

pub mod etherscan;
pub mod rpc;

pub(crate) fn parse_address(address: &str) -> Result<Address, ProviderError> {
    Address::from_str(address.trim()).map_err(|_| ProviderError::InvalidAddress(address.to_string()))
}

/// Parse a `0x`-prefixed hex quantity. `"0x"` alone is zero.
pub(crate) fn parse_hex_quantity(value: &str) -> Result<U256, ProviderError> {
    let digits = value
        .strip_prefix("0x")
        .ok_or_else(|| ProviderError::Malformed(format!("expected hex quantity, got '{value}'")))?;
    if digits.is_empty() {
        return Ok(U256::ZERO);
    }
    U256::from_str_radix(digits, 16)
        .map_err(|e| ProviderError::Malformed(format!("bad hex quantity '{value}': {e}")))
}

/// Parse a base-10 integer as returned by Etherscan.
pub(crate) fn parse_decimal_quantity(value: &str) -> Result<U256, ProviderError> {
    U256::from_str_radix(value.trim(), 10)
        .map_err(|e| ProviderError::Malformed(format!("bad quantity '{value}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_quantities() {
        assert_eq!(parse_hex_quantity("0x0").unwrap(), U256::ZERO);
        assert_eq!(parse_hex_quantity("0x").unwrap(), U256::ZERO);
        assert_eq!(
            parse_hex_quantity("0xde0b6b3a7640000").unwrap(),
            U256::from(1_000_000_000_000_000_000u128)
        );
        assert!(parse_hex_quantity("123").is_err());
        assert!(parse_hex_quantity("0xzz").is_err());
    }

    #[test]
    fn decimal_quantities() {
        assert_eq!(parse_decimal_quantity("42").unwrap(), U256::from(42u64));
        assert!(parse_decimal_quantity("Max rate limit reached").is_err());
    }

    #[test]
    fn addresses() {
        assert!(parse_address("0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48").is_ok());
        assert!(matches!(
            parse_address("0x123"),
            Err(ProviderError::InvalidAddress(_))
        ));
    }
}

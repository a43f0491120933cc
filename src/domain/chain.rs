//! Chain identifiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::BalanceError;

/// Blockchains known to the wallet.
///
/// Only [`Chain::Eth`] and [`Chain::Bsv`] are fetchable; BTC and BCH are
/// recognized so callers can pass them through without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chain {
    Eth,
    Bsv,
    Btc,
    Bch,
}

impl Chain {
    /// Identifier used in cache keys and persisted records.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Eth => "eth",
            Self::Bsv => "bsv",
            Self::Btc => "btc",
            Self::Bch => "bch",
        }
    }

    /// Ticker of the chain's native asset.
    #[must_use]
    pub const fn native_symbol(self) -> &'static str {
        match self {
            Self::Eth => "ETH",
            Self::Bsv => "BSV",
            Self::Btc => "BTC",
            Self::Bch => "BCH",
        }
    }

    /// Decimal scale of the native asset.
    #[must_use]
    pub const fn native_decimals(self) -> u8 {
        match self {
            Self::Eth => 18,
            Self::Bsv | Self::Btc | Self::Bch => 8,
        }
    }

    /// Whether balances on this chain can be fetched in this version.
    #[must_use]
    pub const fn is_fetchable(self) -> bool {
        matches!(self, Self::Eth | Self::Bsv)
    }

    /// Whether the chain has a bulk (multi-address) balance path.
    #[must_use]
    pub const fn supports_bulk(self) -> bool {
        matches!(self, Self::Bsv)
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Chain {
    type Err = BalanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "eth" => Ok(Self::Eth),
            "bsv" => Ok(Self::Bsv),
            "btc" => Ok(Self::Btc),
            "bch" => Ok(Self::Bch),
            _ => Err(BalanceError::UnsupportedChain(s.to_string())),
        }
    }
}

//! Chain-agnostic balance domain types.
//!
//! Nothing here touches the network or the filesystem; amounts are handled as
//! decimal strings and raw `U256` values.

pub mod amount;
pub mod balance;
pub mod chain;
pub mod metadata;
pub mod request;
pub mod token;

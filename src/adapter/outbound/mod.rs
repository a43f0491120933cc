//! Outbound adapters: provider clients and storage.

pub mod bsv;
pub mod eth;
pub mod http;
pub mod memory;
pub mod storage;

//! Infrastructure configuration modules.

pub mod balance;
pub mod chain;
pub mod http;
pub mod logging;
pub mod settings;

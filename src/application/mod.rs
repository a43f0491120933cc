//! Application services (use cases).
//!
//! These services orchestrate domain logic and coordinate adapters
//! to implement the balance lookups.

pub mod balance;

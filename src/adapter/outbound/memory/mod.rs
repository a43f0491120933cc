//! In-memory adapters.

pub mod metadata;

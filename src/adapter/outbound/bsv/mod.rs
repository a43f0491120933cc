//! BSV balance providers.

pub mod whatsonchain;

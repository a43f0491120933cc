//! Cache persistence adapters.

pub mod json_file;

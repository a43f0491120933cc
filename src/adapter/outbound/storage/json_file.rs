//! JSON file persistence for the balance cache.
//!
//! The file is a single object keyed by `<chain>:<address>[:<token>]`:
//!
//! ```json
//! {
//!   "eth:0xabc": { "chain": "eth", "address": "0xabc", "balance": "1.5", ... },
//!   "eth:0xabc:0xA0b8...": { "chain": "eth", "symbol": "USDC", ... }
//! }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::domain::balance::CacheEntry;
use crate::error::Result;
use crate::port::outbound::cache::CacheStorage;

pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "balances.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl CacheStorage for JsonFileStorage {
    /// A missing file loads as an empty cache.
    fn load(&self) -> Result<Vec<CacheEntry>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No balance cache file yet");
                return Ok(Vec::new());
            }
            Err(err) => return Err(err.into()),
        };

        let stored: BTreeMap<String, CacheEntry> = serde_json::from_slice(&bytes)?;
        let entries = stored
            .into_iter()
            .map(|(key, entry)| {
                if key != entry.key().to_string() {
                    warn!(key = %key, actual = %entry.key(), "Cache file key does not match entry");
                }
                entry
            })
            .collect();
        Ok(entries)
    }

    /// Written to a sibling temp file, then renamed over the target.
    fn save(&self, entries: &[CacheEntry]) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }

        let keyed: BTreeMap<String, &CacheEntry> = entries
            .iter()
            .map(|entry| (entry.key().to_string(), entry))
            .collect();
        let json = serde_json::to_vec_pretty(&keyed)?;

        let temp = self.temp_path();
        {
            let mut file = fs::File::create(&temp)?;
            file.write_all(&json)?;
            file.sync_all()?;
        }
        fs::rename(&temp, &self.path)?;

        debug!(path = %self.path.display(), entries = keyed.len(), "Balance cache saved");
        Ok(())
    }
}

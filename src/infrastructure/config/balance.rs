//! Cache freshness and fetch concurrency settings.

use std::time::Duration;

use serde::Deserialize;

use crate::application::balance::policy::PolicyThresholds;

#[derive(Debug, Clone, Deserialize)]
pub struct BalanceConfig {
    /// Cache entries younger than this skip the network entirely (seconds).
    #[serde(default = "default_trust_window_secs")]
    pub trust_window_secs: u64,
    /// Age beyond which results are reported stale (seconds).
    #[serde(default = "default_stale_after_secs")]
    pub stale_after_secs: u64,
    /// Cache tolerance for used-but-empty addresses (seconds).
    #[serde(default = "default_medium_ttl_secs")]
    pub medium_ttl_secs: u64,
    /// Cache tolerance for never-used addresses (seconds).
    #[serde(default = "default_low_ttl_secs")]
    pub low_ttl_secs: u64,
    /// Addresses scanned within this window are always refreshed (seconds).
    #[serde(default = "default_new_address_window_secs")]
    pub new_address_window_secs: u64,
    /// Concurrent non-bulk fetches per batch.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
    /// Upper bound on a single fetch (milliseconds). Unset means no bound.
    #[serde(default)]
    pub request_timeout_ms: Option<u64>,
}

fn default_trust_window_secs() -> u64 {
    30
}

fn default_stale_after_secs() -> u64 {
    300 // 5 minutes
}

fn default_medium_ttl_secs() -> u64 {
    1800 // 30 minutes
}

fn default_low_ttl_secs() -> u64 {
    7200 // 2 hours
}

fn default_new_address_window_secs() -> u64 {
    86400 // 24 hours
}

fn default_max_concurrent() -> usize {
    8
}

impl BalanceConfig {
    #[must_use]
    pub fn trust_window(&self) -> Duration {
        Duration::from_secs(self.trust_window_secs)
    }

    #[must_use]
    pub fn stale_after(&self) -> Duration {
        Duration::from_secs(self.stale_after_secs)
    }

    #[must_use]
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }

    #[must_use]
    pub fn thresholds(&self) -> PolicyThresholds {
        PolicyThresholds {
            medium_ttl: Duration::from_secs(self.medium_ttl_secs),
            low_ttl: Duration::from_secs(self.low_ttl_secs),
            new_address_window: Duration::from_secs(self.new_address_window_secs),
        }
    }
}

impl Default for BalanceConfig {
    fn default() -> Self {
        Self {
            trust_window_secs: default_trust_window_secs(),
            stale_after_secs: default_stale_after_secs(),
            medium_ttl_secs: default_medium_ttl_secs(),
            low_ttl_secs: default_low_ttl_secs(),
            new_address_window_secs: default_new_address_window_secs(),
            max_concurrent: default_max_concurrent(),
            request_timeout_ms: None,
        }
    }
}

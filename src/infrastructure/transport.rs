//! Process-wide HTTP transport.
//!
//! Every provider client borrows the same pooled [`reqwest::Client`].
//! Clients are cheap handles over the pool, so dropping or replacing a
//! provider client never tears down connections other requests are using.

use std::sync::OnceLock;

use reqwest::Client as HttpClient;
use tracing::{info, warn};

use super::config::http::HttpConfig;

static GLOBAL: OnceLock<SharedTransport> = OnceLock::new();

/// Pooled HTTP client shared across providers.
#[derive(Debug, Clone)]
pub struct SharedTransport {
    http: HttpClient,
}

impl SharedTransport {
    /// Build a transport from `config`.
    ///
    /// Falls back to reqwest defaults if the configured client cannot be built.
    #[must_use]
    pub fn new(config: &HttpConfig) -> Self {
        let http = HttpClient::builder()
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .build()
            .unwrap_or_else(|err| {
                warn!(error = %err, "Failed to build HTTP client, using defaults");
                HttpClient::new()
            });
        Self { http }
    }

    /// The process-wide transport, created on first use.
    ///
    /// `config` only matters for the first caller; later callers get the
    /// existing instance.
    pub fn global(config: &HttpConfig) -> &'static Self {
        GLOBAL.get_or_init(|| {
            info!(
                timeout_ms = config.timeout_ms,
                pool_max_idle_per_host = config.pool_max_idle_per_host,
                "Initializing shared HTTP transport"
            );
            Self::new(config)
        })
    }

    #[must_use]
    pub fn http(&self) -> &HttpClient {
        &self.http
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_is_a_singleton() {
        let first = SharedTransport::global(&HttpConfig::default());
        let second = SharedTransport::global(&HttpConfig {
            timeout_ms: 1,
            ..HttpConfig::default()
        });
        assert!(std::ptr::eq(first, second));
    }
}

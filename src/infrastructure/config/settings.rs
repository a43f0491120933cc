//! Application configuration loading and validation.
//!
//! Provides the [`Config`] struct aggregating all settings. Configuration is
//! loaded from a TOML file; secrets and endpoints can be overridden from the
//! environment (`ETHERSCAN_API_KEY`, `WALLET_ETH_RPC`).
//!
//! # Example
//!
//! ```no_run
//! use chainbalance::infrastructure::config::settings::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("chainbalance.toml")?;
//!     config.init_logging();
//!     Ok(())
//! }
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tokio::sync::Semaphore;
use url::Url;

use super::balance::BalanceConfig;
use super::chain::{BsvConfig, EthConfig};
use super::http::{HttpConfig, RetryConfig};
use super::logging::LoggingConfig;
use crate::domain::{chain::Chain, token::TrackedTokens};
use crate::error::{ConfigError, Result};
use crate::port::{outbound::config::ConfigProvider, outbound::config::EthProvider};

/// Environment variable overriding `eth.etherscan_api_key`.
pub const ETHERSCAN_API_KEY_ENV: &str = "ETHERSCAN_API_KEY";

/// Environment variable overriding `eth.rpc_url`.
pub const ETH_RPC_ENV: &str = "WALLET_ETH_RPC";

/// Main configuration.
///
/// Every section is optional; an empty file yields the defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub eth: EthConfig,

    #[serde(default)]
    pub bsv: BsvConfig,

    /// Cache freshness, refresh policy, and batch concurrency.
    #[serde(default)]
    pub balance: BalanceConfig,

    #[serde(default)]
    pub http: HttpConfig,

    /// Backoff for individual provider calls.
    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Where the cache is persisted between runs.
    ///
    /// Defaults to `~/.chainbalance/balances.json`.
    #[serde(default)]
    pub cache_path: Option<PathBuf>,
}

impl Config {
    /// Parse configuration from a TOML string and apply environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed or validation fails.
    #[allow(clippy::result_large_err)]
    pub fn parse_toml(content: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.apply_env_overrides(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, the TOML is malformed,
    /// or validation fails.
    #[allow(clippy::result_large_err)]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse_toml(&content)
    }

    /// Overlay values from `lookup`, which maps variable names to values.
    ///
    /// Empty values are ignored.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|value: &String| !value.trim().is_empty());
        if let Some(key) = non_empty(ETHERSCAN_API_KEY_ENV) {
            self.eth.etherscan_api_key = Some(key);
        }
        if let Some(url) = non_empty(ETH_RPC_ENV) {
            self.eth.rpc_url = Some(url);
        }
    }

    /// Check that values are within acceptable ranges.
    ///
    /// A missing `eth.rpc_url` is not an error here: the RPC strategy reports
    /// it per fetch so Etherscan can still serve.
    ///
    /// # Errors
    ///
    /// Returns the first invalid field found.
    #[allow(clippy::result_large_err)]
    pub fn validate(&self) -> Result<()> {
        if let Some(url) = &self.eth.rpc_url {
            check_url("eth.rpc_url", url)?;
        }
        for url in &self.eth.fallback_rpc_urls {
            check_url("eth.fallback_rpc_urls", url)?;
        }
        check_url("eth.etherscan_url", &self.eth.etherscan_url)?;
        check_url("bsv.api_url", &self.bsv.api_url)?;

        if let Some(token) = self
            .eth
            .tokens
            .iter()
            .find(|t| t.contract.trim().is_empty() || t.symbol.trim().is_empty())
        {
            return Err(invalid(
                "eth.tokens",
                format!("token '{}' needs a symbol and a contract", token.symbol),
            ));
        }

        if self.bsv.bulk_limit == 0 {
            return Err(invalid("bsv.bulk_limit", "must be greater than 0"));
        }
        if self.balance.max_concurrent == 0 {
            return Err(invalid("balance.max_concurrent", "must be greater than 0"));
        }
        if self.balance.max_concurrent > Semaphore::MAX_PERMITS {
            return Err(invalid(
                "balance.max_concurrent",
                format!("must be at most {}", Semaphore::MAX_PERMITS),
            ));
        }
        if self.balance.request_timeout_ms == Some(0) {
            return Err(invalid("balance.request_timeout_ms", "must be greater than 0"));
        }
        if self.http.timeout_ms == 0 {
            return Err(invalid("http.timeout_ms", "must be greater than 0"));
        }

        if self.retry.max_attempts == 0 {
            return Err(invalid("retry.max_attempts", "must be at least 1"));
        }
        if self.retry.max_delay_ms < self.retry.initial_delay_ms {
            return Err(invalid("retry.max_delay_ms", "must be >= initial_delay_ms"));
        }
        if self.retry.backoff_multiplier < 1.0 {
            return Err(invalid("retry.backoff_multiplier", "must be >= 1.0"));
        }

        Ok(())
    }

    /// Tokens tracked per chain, from the `[eth]` token list.
    #[must_use]
    pub fn tracked_tokens(&self) -> TrackedTokens {
        TrackedTokens::none().with_chain(Chain::Eth, self.eth.tokens.clone())
    }

    /// Resolved cache file location.
    #[must_use]
    pub fn cache_path(&self) -> PathBuf {
        self.cache_path.clone().unwrap_or_else(default_cache_path)
    }

    /// Initialize logging based on configuration.
    pub fn init_logging(&self) -> bool {
        self.logging.init()
    }
}

impl ConfigProvider for Config {
    fn eth_rpc(&self) -> Option<String> {
        self.eth.rpc_url.clone().filter(|url| !url.trim().is_empty())
    }

    fn eth_fallback_rpcs(&self) -> Vec<String> {
        self.eth.fallback_rpc_urls.clone()
    }

    fn eth_provider(&self) -> EthProvider {
        self.eth.provider()
    }

    fn etherscan_api_key(&self) -> Option<String> {
        self.eth.etherscan_api_key.clone()
    }
}

fn default_cache_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".chainbalance")
        .join("balances.json")
}

fn invalid(field: &'static str, reason: impl Into<String>) -> crate::error::Error {
    ConfigError::InvalidValue {
        field,
        reason: reason.into(),
    }
    .into()
}

#[allow(clippy::result_large_err)]
fn check_url(field: &'static str, value: &str) -> Result<()> {
    let url = Url::parse(value).map_err(|e| invalid(field, format!("'{value}': {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(invalid(field, format!("unsupported scheme '{other}'"))),
    }
}

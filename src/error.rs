use thiserror::Error;

use crate::domain::chain::Chain;

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field} ({hint})")]
    MissingField {
        field: &'static str,
        hint: &'static str,
    },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

/// A single provider call failed.
///
/// Variants carry rendered messages rather than the transport error itself so
/// the same failure can be recorded in a log line and returned to a caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("JSON-RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("provider API error: {0}")]
    Api(String),

    #[error("malformed provider response: {0}")]
    Malformed(String),

    #[error("invalid address '{0}'")]
    InvalidAddress(String),

    #[error("invalid endpoint '{url}': {reason}")]
    InvalidEndpoint { url: String, reason: String },
}

impl ProviderError {
    /// Whether another attempt against the same endpoint could succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout(_) | Self::Connect(_) | Self::Transport(_) => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_connect() {
            Self::Connect(err.to_string())
        } else if let Some(status) = err.status() {
            Self::Status {
                status: status.as_u16(),
                body: err.to_string(),
            }
        } else if err.is_decode() {
            Self::Malformed(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// Balance subsystem outcomes that callers are expected to handle.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BalanceError {
    #[error("unsupported chain: {0}")]
    UnsupportedChain(String),

    #[error("no cached balance for {chain}:{address} after fetch failure: {reason}")]
    CacheNotFound {
        chain: Chain,
        address: String,
        reason: String,
    },

    #[error("no cached balance for {chain}:{address}")]
    NoCachedBalance { chain: Chain, address: String },

    #[error("bulk balance fetch failed, {fallback} address(es) served from cache: {reason}")]
    BulkFallback { fallback: usize, reason: String },

    #[error("balance request for {chain}:{address} canceled before completion")]
    Canceled { chain: Chain, address: String },

    #[error("cache write failed: {0}")]
    CacheWrite(String),
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Balance(#[from] BalanceError),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),
}

impl Error {
    /// The balance-level cause, if this error is one.
    #[must_use]
    pub fn as_balance(&self) -> Option<&BalanceError> {
        match self {
            Self::Balance(err) => Some(err),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

//! Ethereum JSON-RPC client.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use alloy_primitives::{hex, U256};
use alloy_sol_types::{sol, SolCall};
use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;
use url::Url;

use super::{parse_address, parse_hex_quantity};
use crate::adapter::outbound::http::read_json;
use crate::domain::token::TrackedToken;
use crate::error::ProviderError;
use crate::port::{outbound::chain::EthBalanceClient, outbound::chain::EthClientFactory};

sol! {
    interface IERC20 {
        function balanceOf(address account) external view returns (uint256);
    }
}

#[derive(Debug, Deserialize)]
struct RpcReply {
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

/// Balance reads over `eth_getBalance` and `eth_call`.
pub struct JsonRpcEthClient {
    http: HttpClient,
    url: String,
    next_id: AtomicU64,
}

impl JsonRpcEthClient {
    /// Client for `url` over an existing pooled HTTP client.
    ///
    /// # Errors
    ///
    /// [`ProviderError::InvalidEndpoint`] unless `url` is an http(s) URL.
    pub fn new(http: HttpClient, url: &str) -> Result<Self, ProviderError> {
        let parsed = Url::parse(url).map_err(|e| ProviderError::InvalidEndpoint {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ProviderError::InvalidEndpoint {
                url: url.to_string(),
                reason: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }
        Ok(Self {
            http,
            url: url.to_string(),
            next_id: AtomicU64::new(1),
        })
    }

    async fn call(&self, method: &str, params: Value) -> Result<String, ProviderError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        debug!(url = %self.url, method, id, "JSON-RPC request");
        let response = self.http.post(&self.url).json(&body).send().await?;
        let reply: RpcReply = read_json(response).await?;

        if let Some(err) = reply.error {
            return Err(ProviderError::Rpc {
                code: err.code,
                message: err.message,
            });
        }
        reply
            .result
            .ok_or_else(|| ProviderError::Malformed(format!("{method}: reply has no result")))
    }
}

#[async_trait]
impl EthBalanceClient for JsonRpcEthClient {
    async fn native_balance(&self, address: &str) -> Result<U256, ProviderError> {
        let owner = parse_address(address)?;
        let result = self
            .call("eth_getBalance", json!([owner.to_string(), "latest"]))
            .await?;
        parse_hex_quantity(&result)
    }

    async fn token_balance(&self, address: &str, token: &TrackedToken) -> Result<U256, ProviderError> {
        let owner = parse_address(address)?;
        let contract = parse_address(&token.contract)?;
        let data = IERC20::balanceOfCall { account: owner }.abi_encode();
        let result = self
            .call(
                "eth_call",
                json!([
                    { "to": contract.to_string(), "data": hex::encode_prefixed(data) },
                    "latest"
                ]),
            )
            .await?;
        parse_hex_quantity(&result)
    }

    fn endpoint(&self) -> &str {
        &self.url
    }
}

/// Builds [`JsonRpcEthClient`]s that share one HTTP connection pool.
///
/// Connecting only validates the URL; no handshake is made.
#[derive(Clone)]
pub struct RpcClientFactory {
    http: HttpClient,
}

impl RpcClientFactory {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }
}

#[async_trait]
impl EthClientFactory for RpcClientFactory {
    async fn connect(&self, url: &str) -> Result<Arc<dyn EthBalanceClient>, ProviderError> {
        let client = JsonRpcEthClient::new(self.http.clone(), url)?;
        Ok(Arc::new(client))
    }
}

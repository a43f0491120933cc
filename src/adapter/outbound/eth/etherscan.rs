//! Etherscan v2 account API.

use alloy_primitives::U256;
use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::Deserialize;
use tracing::debug;

use super::{parse_address, parse_decimal_quantity};
use crate::adapter::outbound::http::read_json;
use crate::domain::token::TrackedToken;
use crate::error::ProviderError;
use crate::port::outbound::chain::EthBalanceClient;

/// `{status, message, result}` envelope; `status` is `"1"` on success and
/// `result` carries the error text otherwise.
#[derive(Debug, Deserialize)]
struct Envelope {
    status: String,
    message: String,
    result: String,
}

pub struct EtherscanClient {
    http: HttpClient,
    base_url: String,
    chain_id: u64,
    api_key: Option<String>,
}

impl EtherscanClient {
    pub fn new(http: HttpClient, base_url: impl Into<String>, chain_id: u64, api_key: Option<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            chain_id,
            api_key,
        }
    }

    async fn account_query(&self, params: &[(&str, &str)]) -> Result<U256, ProviderError> {
        let chain_id = self.chain_id.to_string();
        let mut query: Vec<(&str, &str)> = vec![("chainid", chain_id.as_str()), ("module", "account")];
        query.extend_from_slice(params);
        query.push(("tag", "latest"));
        if let Some(key) = &self.api_key {
            query.push(("apikey", key.as_str()));
        }

        let response = self.http.get(&self.base_url).query(&query).send().await?;
        let envelope: Envelope = read_json(response).await?;
        if envelope.status != "1" {
            debug!(message = %envelope.message, result = %envelope.result, "Etherscan query rejected");
            return Err(ProviderError::Api(format!(
                "{}: {}",
                envelope.message, envelope.result
            )));
        }
        parse_decimal_quantity(&envelope.result)
    }
}

#[async_trait]
impl EthBalanceClient for EtherscanClient {
    async fn native_balance(&self, address: &str) -> Result<U256, ProviderError> {
        let owner = parse_address(address)?.to_string();
        self.account_query(&[("action", "balance"), ("address", owner.as_str())])
            .await
    }

    async fn token_balance(&self, address: &str, token: &TrackedToken) -> Result<U256, ProviderError> {
        let owner = parse_address(address)?.to_string();
        self.account_query(&[
            ("action", "tokenbalance"),
            ("contractaddress", token.contract.as_str()),
            ("address", owner.as_str()),
        ])
        .await
    }

    fn endpoint(&self) -> &str {
        &self.base_url
    }
}

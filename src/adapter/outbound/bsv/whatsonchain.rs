//! WhatsOnChain REST client.

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::adapter::outbound::http::read_json;
use crate::error::ProviderError;
use crate::port::{outbound::chain::BsvBalanceClient, outbound::chain::SatoshiBalance};

#[derive(Debug, Deserialize)]
struct BalanceBody {
    confirmed: i64,
    unconfirmed: i64,
}

impl From<BalanceBody> for SatoshiBalance {
    fn from(body: BalanceBody) -> Self {
        Self::new(body.confirmed, body.unconfirmed)
    }
}

#[derive(Debug, Serialize)]
struct BulkRequest<'a> {
    addresses: &'a [String],
}

#[derive(Debug, Deserialize)]
struct BulkItem {
    address: String,
    #[serde(default)]
    balance: Option<BalanceBody>,
    #[serde(default)]
    error: String,
}

pub struct WhatsOnChainClient {
    http: HttpClient,
    base_url: String,
}

impl WhatsOnChainClient {
    /// `base_url` includes the network, e.g. `https://api.whatsonchain.com/v1/bsv/main`.
    pub fn new(http: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl BsvBalanceClient for WhatsOnChainClient {
    async fn native_balance(&self, address: &str) -> Result<SatoshiBalance, ProviderError> {
        if address.trim().is_empty() || !address.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ProviderError::InvalidAddress(address.to_string()));
        }
        let url = format!("{}/address/{address}/balance", self.base_url);
        let response = self.http.get(&url).send().await?;
        let body: BalanceBody = read_json(response).await?;
        Ok(body.into())
    }

    /// Addresses the provider reports an error for are left out of the map.
    async fn bulk_native_balance(
        &self,
        addresses: &[String],
    ) -> Result<HashMap<String, SatoshiBalance>, ProviderError> {
        if addresses.is_empty() {
            return Ok(HashMap::new());
        }
        let url = format!("{}/addresses/balance", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(&BulkRequest { addresses })
            .send()
            .await?;
        let items: Vec<BulkItem> = read_json(response).await?;

        let mut balances = HashMap::with_capacity(items.len());
        for item in items {
            match item.balance {
                Some(balance) if item.error.is_empty() => {
                    balances.insert(item.address, balance.into());
                }
                _ => debug!(address = %item.address, error = %item.error, "Bulk entry skipped"),
            }
        }
        Ok(balances)
    }
}

//! Scripted provider clients.
//!
//! Each mock answers from a per-address script, counts its calls, and can
//! report into a shared [`ConcurrencyGauge`] to observe in-flight requests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::U256;
use async_trait::async_trait;
use parking_lot::Mutex;

use crate::domain::token::TrackedToken;
use crate::error::ProviderError;
use crate::port::{
    outbound::chain::BsvBalanceClient, outbound::chain::EthBalanceClient,
    outbound::chain::EthClientFactory, outbound::chain::SatoshiBalance,
};

/// Tracks how many calls are in flight and the highest count seen.
#[derive(Debug, Default)]
pub struct ConcurrencyGauge {
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl ConcurrencyGauge {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Count a call as in flight until the guard drops.
    pub fn enter(self: &Arc<Self>) -> GaugeGuard {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        GaugeGuard {
            gauge: Arc::clone(self),
        }
    }

    pub fn current(&self) -> usize {
        self.current.load(Ordering::SeqCst)
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

pub struct GaugeGuard {
    gauge: Arc<ConcurrencyGauge>,
}

impl Drop for GaugeGuard {
    fn drop(&mut self) {
        self.gauge.current.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Replies consumed front to back; the last one repeats.
type Script<T> = VecDeque<Result<T, ProviderError>>;

fn next_reply<T: Clone>(script: Option<&mut Script<T>>, what: &str) -> Result<T, ProviderError> {
    match script {
        Some(replies) if replies.len() > 1 => replies
            .pop_front()
            .unwrap_or_else(|| Err(ProviderError::Api(format!("script exhausted for {what}")))),
        Some(replies) => replies
            .front()
            .cloned()
            .unwrap_or_else(|| Err(ProviderError::Api(format!("script exhausted for {what}")))),
        None => Err(ProviderError::Api(format!("nothing scripted for {what}"))),
    }
}

/// Scripted Ethereum client.
///
/// Unscripted native balances fail with a permanent API error; unscripted
/// token balances are zero.
pub struct MockEthClient {
    endpoint: String,
    native: Mutex<HashMap<String, Script<U256>>>,
    tokens: Mutex<HashMap<(String, String), Script<U256>>>,
    native_calls: AtomicUsize,
    token_calls: AtomicUsize,
    delay: Duration,
    gauge: Option<Arc<ConcurrencyGauge>>,
}

impl MockEthClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            native: Mutex::new(HashMap::new()),
            tokens: Mutex::new(HashMap::new()),
            native_calls: AtomicUsize::new(0),
            token_calls: AtomicUsize::new(0),
            delay: Duration::ZERO,
            gauge: None,
        }
    }

    #[must_use]
    pub fn with_native(self, address: &str, wei: impl Into<U256>) -> Self {
        self.with_native_replies(address, vec![Ok(wei.into())])
    }

    #[must_use]
    pub fn failing_native(self, address: &str, err: ProviderError) -> Self {
        self.with_native_replies(address, vec![Err(err)])
    }

    /// Replies returned in order for `address`; the last one repeats.
    #[must_use]
    pub fn with_native_replies(self, address: &str, replies: Vec<Result<U256, ProviderError>>) -> Self {
        self.native.lock().insert(address.to_string(), replies.into());
        self
    }

    #[must_use]
    pub fn with_token(self, address: &str, contract: &str, raw: impl Into<U256>) -> Self {
        self.tokens
            .lock()
            .insert((address.to_string(), contract.to_string()), vec![Ok(raw.into())].into());
        self
    }

    #[must_use]
    pub fn failing_token(self, address: &str, contract: &str, err: ProviderError) -> Self {
        self.tokens
            .lock()
            .insert((address.to_string(), contract.to_string()), vec![Err(err)].into());
        self
    }

    /// Sleep this long inside every call.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    #[must_use]
    pub fn with_gauge(mut self, gauge: Arc<ConcurrencyGauge>) -> Self {
        self.gauge = Some(gauge);
        self
    }

    pub fn native_calls(&self) -> usize {
        self.native_calls.load(Ordering::SeqCst)
    }

    pub fn token_calls(&self) -> usize {
        self.token_calls.load(Ordering::SeqCst)
    }

    async fn simulate_latency(&self) -> Option<GaugeGuard> {
        let guard = self.gauge.as_ref().map(ConcurrencyGauge::enter);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        guard
    }
}

#[async_trait]
impl EthBalanceClient for MockEthClient {
    async fn native_balance(&self, address: &str) -> Result<U256, ProviderError> {
        self.native_calls.fetch_add(1, Ordering::SeqCst);
        let _guard = self.simulate_latency().await;
        next_reply(self.native.lock().get_mut(address), address)
    }

    async fn token_balance(&self, address: &str, token: &TrackedToken) -> Result<U256, ProviderError> {
        self.token_calls.fetch_add(1, Ordering::SeqCst);
        let mut tokens = self.tokens.lock();
        match tokens.get_mut(&(address.to_string(), token.contract.clone())) {
            Some(script) => next_reply(Some(script), &token.symbol),
            None => Ok(U256::ZERO),
        }
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Hands out registered clients by URL; unknown URLs fail to connect.
#[derive(Default)]
pub struct MockEthFactory {
    clients: HashMap<String, Arc<MockEthClient>>,
    connects: Mutex<Vec<String>>,
}

impl MockEthFactory {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_client(mut self, url: &str, client: MockEthClient) -> Self {
        self.clients.insert(url.to_string(), Arc::new(client));
        self
    }

    /// The client registered for `url`.
    ///
    /// # Panics
    ///
    /// If no client was registered for `url`.
    pub fn client(&self, url: &str) -> Arc<MockEthClient> {
        Arc::clone(self.clients.get(url).expect("client registered for url"))
    }

    /// URLs passed to `connect`, in call order.
    pub fn connects(&self) -> Vec<String> {
        self.connects.lock().clone()
    }
}

#[async_trait]
impl EthClientFactory for MockEthFactory {
    async fn connect(&self, url: &str) -> Result<Arc<dyn EthBalanceClient>, ProviderError> {
        self.connects.lock().push(url.to_string());
        match self.clients.get(url) {
            Some(client) => Ok(Arc::clone(client) as Arc<dyn EthBalanceClient>),
            None => Err(ProviderError::Connect(format!("no node at {url}"))),
        }
    }
}

/// Scripted BSV client.
///
/// [`with_balance`](Self::with_balance) answers both single and bulk calls;
/// [`with_single`](Self::with_single) answers single calls only, so the bulk
/// response omits the address.
#[derive(Default)]
pub struct MockBsvClient {
    single: HashMap<String, Result<SatoshiBalance, ProviderError>>,
    bulk: HashMap<String, SatoshiBalance>,
    bulk_failure: Option<ProviderError>,
    single_calls: Mutex<Vec<String>>,
    bulk_calls: Mutex<Vec<Vec<String>>>,
    delay: Duration,
    gauge: Option<Arc<ConcurrencyGauge>>,
}

impl MockBsvClient {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_balance(mut self, address: &str, confirmed: i64, unconfirmed: i64) -> Self {
        let sats = SatoshiBalance::new(confirmed, unconfirmed);
        self.single.insert(address.to_string(), Ok(sats));
        self.bulk.insert(address.to_string(), sats);
        self
    }

    #[must_use]
    pub fn with_single(mut self, address: &str, confirmed: i64, unconfirmed: i64) -> Self {
        self.single
            .insert(address.to_string(), Ok(SatoshiBalance::new(confirmed, unconfirmed)));
        self
    }

    #[must_use]
    pub fn failing_single(mut self, address: &str, err: ProviderError) -> Self {
        self.single.insert(address.to_string(), Err(err));
        self
    }

    #[must_use]
    pub fn failing_bulk(mut self, err: ProviderError) -> Self {
        self.bulk_failure = Some(err);
        self
    }

    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    #[must_use]
    pub fn with_gauge(mut self, gauge: Arc<ConcurrencyGauge>) -> Self {
        self.gauge = Some(gauge);
        self
    }

    /// Addresses passed to single fetches, in call order.
    pub fn single_calls(&self) -> Vec<String> {
        self.single_calls.lock().clone()
    }

    /// Address lists passed to bulk fetches, in call order.
    pub fn bulk_calls(&self) -> Vec<Vec<String>> {
        self.bulk_calls.lock().clone()
    }

    async fn simulate_latency(&self) -> Option<GaugeGuard> {
        let guard = self.gauge.as_ref().map(ConcurrencyGauge::enter);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        guard
    }
}

#[async_trait]
impl BsvBalanceClient for MockBsvClient {
    async fn native_balance(&self, address: &str) -> Result<SatoshiBalance, ProviderError> {
        self.single_calls.lock().push(address.to_string());
        let _guard = self.simulate_latency().await;
        self.single
            .get(address)
            .cloned()
            .unwrap_or_else(|| Err(ProviderError::Api(format!("nothing scripted for {address}"))))
    }

    async fn bulk_native_balance(
        &self,
        addresses: &[String],
    ) -> Result<HashMap<String, SatoshiBalance>, ProviderError> {
        self.bulk_calls.lock().push(addresses.to_vec());
        let _guard = self.simulate_latency().await;
        if let Some(err) = &self.bulk_failure {
            return Err(err.clone());
        }
        Ok(addresses
            .iter()
            .filter_map(|address| self.bulk.get(address).map(|sats| (address.clone(), *sats)))
            .collect())
    }
}

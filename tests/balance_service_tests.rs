use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chainbalance::adapter::outbound::memory::metadata::InMemoryMetadataStore;
use chainbalance::application::balance::policy::RefreshPolicy;
use chainbalance::domain::{
    chain::Chain, request::AddressRef, request::FetchBatchRequest, request::FetchRequest,
};
use chainbalance::error::{BalanceError, Error, ProviderError};
use chainbalance::testkit::clients::{ConcurrencyGauge, MockBsvClient, MockEthClient};
use chainbalance::testkit::domain::{entry_aged, metadata, units};
use chainbalance::testkit::fixture::FetcherFixture;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn eth_address(n: usize) -> String {
    format!("0x{n:040x}")
}

fn is_canceled(err: &Error) -> bool {
    matches!(err.as_balance(), Some(BalanceError::Canceled { .. }))
}

#[tokio::test]
async fn batch_routes_bsv_through_one_bulk_call_and_eth_individually() {
    let eth_a = eth_address(1);
    let eth_b = eth_address(2);
    let fixture = FetcherFixture::builder()
        .etherscan(
            MockEthClient::new("etherscan")
                .with_native(&eth_a, units("1.5", 18))
                .with_native(&eth_b, units("0.25", 18)),
        )
        .bsv(
            MockBsvClient::new()
                .with_balance("1AliceBsv", 150_000_000, 0)
                .with_balance("1BobBsv", 2_500, -500),
        )
        .build();

    let batch = fixture
        .service()
        .fetch_balances(FetchBatchRequest::new(vec![
            AddressRef::new(Chain::Eth, eth_a.clone()),
            AddressRef::new(Chain::Bsv, "1AliceBsv"),
            AddressRef::new(Chain::Eth, eth_b.clone()),
            AddressRef::new(Chain::Bsv, "1BobBsv"),
        ]))
        .await;

    assert!(batch.errors.is_empty(), "unexpected errors: {:?}", batch.errors);
    assert_eq!(batch.results.len(), 4);

    let bulk_calls = fixture.bsv.bulk_calls();
    assert_eq!(bulk_calls.len(), 1);
    assert_eq!(bulk_calls[0], vec!["1AliceBsv".to_string(), "1BobBsv".to_string()]);
    assert!(fixture.bsv.single_calls().is_empty());
    assert_eq!(fixture.etherscan.native_calls(), 2);

    let alice = batch.result_for(Chain::Bsv, "1AliceBsv").expect("alice result");
    let alice_native = alice.native().expect("alice native");
    assert_eq!(Decimal::from_str(&alice_native.entry.balance).unwrap(), dec!(1.5));
    assert!(!alice.stale);

    let bob = batch.result_for(Chain::Bsv, "1BobBsv").expect("bob result");
    assert_eq!(bob.native().expect("bob native").entry.unconfirmed, "-0.000005");

    let eth = batch.result_for(Chain::Eth, &eth_b).expect("eth result");
    assert_eq!(eth.native().expect("eth native").entry.balance, "0.25");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn batch_never_exceeds_max_concurrent_fetches() {
    let gauge = ConcurrencyGauge::new();
    let addresses: Vec<String> = (1..=12).map(eth_address).collect();

    let mut etherscan = MockEthClient::new("etherscan")
        .with_delay(Duration::from_millis(20))
        .with_gauge(Arc::clone(&gauge));
    for address in &addresses {
        etherscan = etherscan.with_native(address, units("1", 18));
    }
    let fixture = FetcherFixture::builder().etherscan(etherscan).build();

    let request = FetchBatchRequest::new(
        addresses
            .iter()
            .map(|a| AddressRef::new(Chain::Eth, a.clone()))
            .collect(),
    )
    .with_max_concurrent(3);
    let batch = fixture.service().fetch_balances(request).await;

    assert_eq!(batch.results.len(), 12);
    assert!(batch.errors.is_empty());
    assert!(gauge.peak() <= 3, "peak in-flight fetches was {}", gauge.peak());
    assert!(gauge.peak() > 1, "fetches should overlap");
    assert_eq!(gauge.current(), 0);
}

#[tokio::test]
async fn batch_deadline_cancels_slow_and_waiting_addresses() {
    let addresses: Vec<String> = (1..=3).map(eth_address).collect();
    let mut etherscan = MockEthClient::new("etherscan").with_delay(Duration::from_millis(300));
    for address in &addresses {
        etherscan = etherscan.with_native(address, units("1", 18));
    }
    let fixture = FetcherFixture::builder().etherscan(etherscan).build();

    let request = FetchBatchRequest::new(
        addresses
            .iter()
            .map(|a| AddressRef::new(Chain::Eth, a.clone()))
            .collect(),
    )
    .with_max_concurrent(1)
    .with_timeout(Duration::from_millis(50));
    let batch = fixture.service().fetch_balances(request).await;

    assert!(batch.results.is_empty());
    assert_eq!(batch.errors.len(), 3);
    assert!(batch.errors.iter().all(|e| is_canceled(&e.error)));
}

#[tokio::test]
async fn bulk_deadline_serves_cache_and_reports_cancellation() {
    let fixture = FetcherFixture::builder()
        .bsv(
            MockBsvClient::new()
                .with_balance("1Cached", 100, 0)
                .with_balance("1Uncached", 200, 0)
                .with_delay(Duration::from_millis(300)),
        )
        .cached(entry_aged(Chain::Bsv, "1Cached", "0.5", Duration::from_secs(600)))
        .build();

    let request = FetchBatchRequest::new(vec![
        AddressRef::new(Chain::Bsv, "1Cached"),
        AddressRef::new(Chain::Bsv, "1Uncached"),
    ])
    .with_timeout(Duration::from_millis(50));
    let batch = fixture.service().fetch_balances(request).await;

    let cached = batch.result_for(Chain::Bsv, "1Cached").expect("cached result");
    assert!(cached.stale);
    assert_eq!(cached.native().expect("native").entry.balance, "0.5");
    assert!(cached.error.as_ref().is_some_and(is_canceled));

    let missing = batch.error_for(Chain::Bsv, "1Uncached").expect("uncached error");
    assert!(is_canceled(&missing.error));
}

#[tokio::test]
async fn bulk_deadline_keeps_chunks_that_finished_in_time() {
    let fixture = FetcherFixture::builder()
        .bsv(
            MockBsvClient::new()
                .with_balance("1Early", 100, 0)
                .with_balance("1Late", 200, 0)
                .with_delay(Duration::from_millis(200)),
        )
        .cached(entry_aged(Chain::Bsv, "1Late", "0.9", Duration::from_secs(600)))
        .bulk_limit(1)
        .build();

    let request = FetchBatchRequest::new(vec![
        AddressRef::new(Chain::Bsv, "1Early"),
        AddressRef::new(Chain::Bsv, "1Late"),
    ])
    .with_timeout(Duration::from_millis(300));
    let batch = fixture.service().fetch_balances(request).await;

    let early = batch.result_for(Chain::Bsv, "1Early").expect("early result");
    assert!(!early.stale);
    assert!(early.error.is_none());
    assert_eq!(early.native().expect("native").entry.balance, "0.000001");

    let late = batch.result_for(Chain::Bsv, "1Late").expect("late result");
    assert!(late.stale);
    assert_eq!(late.native().expect("native").entry.balance, "0.9");
    assert!(late.error.as_ref().is_some_and(is_canceled));
}

#[tokio::test]
async fn bulk_group_skips_addresses_the_policy_serves_from_cache() {
    let fixture = FetcherFixture::builder()
        .bsv(
            MockBsvClient::new()
                .with_balance("1Quiet", 0, 0)
                .with_balance("1Fresh", 300, 0),
        )
        .cached(entry_aged(Chain::Bsv, "1Quiet", "0", Duration::from_secs(600)))
        .build();

    let metadata_store = Arc::new(InMemoryMetadataStore::new());
    metadata_store.upsert(metadata(Chain::Bsv, "1Quiet", true, None));
    let policy = RefreshPolicy::new(fixture.cache.clone(), metadata_store);
    let service = fixture.service().with_policy(Arc::new(policy));

    let batch = service
        .fetch_balances(FetchBatchRequest::new(vec![
            AddressRef::new(Chain::Bsv, "1Quiet"),
            AddressRef::new(Chain::Bsv, "1Fresh"),
        ]))
        .await;

    assert_eq!(batch.results.len(), 2);
    assert_eq!(fixture.bsv.bulk_calls(), vec![vec!["1Fresh".to_string()]]);

    let quiet = batch.result_for(Chain::Bsv, "1Quiet").expect("quiet result");
    assert!(!quiet.stale);
    assert_eq!(quiet.native().expect("native").entry.balance, "0");
}

#[tokio::test]
async fn forced_batch_bypasses_the_policy() {
    let fixture = FetcherFixture::builder()
        .bsv(MockBsvClient::new().with_balance("1Quiet", 700, 0))
        .cached(entry_aged(Chain::Bsv, "1Quiet", "0", Duration::from_secs(600)))
        .build();

    let metadata_store = Arc::new(InMemoryMetadataStore::new());
    metadata_store.upsert(metadata(Chain::Bsv, "1Quiet", true, None));
    let policy = RefreshPolicy::new(fixture.cache.clone(), metadata_store);
    let service = fixture.service().with_policy(Arc::new(policy));

    let batch = service
        .fetch_balances(
            FetchBatchRequest::new(vec![AddressRef::new(Chain::Bsv, "1Quiet")]).force_refresh(),
        )
        .await;

    assert_eq!(fixture.bsv.bulk_calls().len(), 1);
    let quiet = batch.result_for(Chain::Bsv, "1Quiet").expect("quiet result");
    assert_eq!(quiet.native().expect("native").entry.balance, "0.000007");
}

#[tokio::test]
async fn failing_address_does_not_abort_the_batch() {
    let good = eth_address(7);
    let bad = eth_address(8);
    let fixture = FetcherFixture::builder()
        .etherscan(
            MockEthClient::new("etherscan")
                .with_native(&good, units("2", 18))
                .failing_native(&bad, ProviderError::Api("NOTOK".into())),
        )
        .build();

    let batch = fixture
        .service()
        .fetch_balances(FetchBatchRequest::new(vec![
            AddressRef::new(Chain::Eth, good.clone()),
            AddressRef::new(Chain::Eth, bad.clone()),
        ]))
        .await;

    assert_eq!(batch.results.len(), 1);
    assert!(batch.result_for(Chain::Eth, &good).is_some());
    let failure = batch.error_for(Chain::Eth, &bad).expect("bad address error");
    assert!(matches!(failure.error, Error::Provider(ProviderError::Api(_))));
}

#[tokio::test]
async fn cached_balances_never_touch_the_network() {
    let fixture = FetcherFixture::builder()
        .cached(entry_aged(Chain::Bsv, "1Known", "3.2", Duration::from_secs(5)))
        .build();

    let request = FetchBatchRequest::new(vec![
        AddressRef::new(Chain::Bsv, "1Known"),
        AddressRef::new(Chain::Bsv, "1Unknown"),
    ]);
    let batch = fixture.service().fetch_cached_balances(&request);

    let known = batch.result_for(Chain::Bsv, "1Known").expect("known result");
    assert!(known.stale);
    assert!(known.balances.iter().all(|b| b.stale));

    let unknown = batch.error_for(Chain::Bsv, "1Unknown").expect("unknown error");
    assert!(matches!(
        unknown.error.as_balance(),
        Some(BalanceError::NoCachedBalance { .. })
    ));
    assert!(fixture.bsv.bulk_calls().is_empty());
    assert!(fixture.bsv.single_calls().is_empty());
}

#[tokio::test]
async fn local_send_is_trusted_over_the_network() {
    let address = eth_address(42);
    let fixture = FetcherFixture::builder()
        .etherscan(MockEthClient::new("etherscan").with_native(&address, units("5", 18)))
        .build();

    fixture
        .cache
        .record_local_balance(Chain::Eth, &address, "4.9", "");

    let result = fixture
        .service()
        .fetch_balance(&FetchRequest::new(Chain::Eth, address.clone()))
        .await
        .expect("fetch");

    assert_eq!(result.native().expect("native").entry.balance, "4.9");
    assert_eq!(fixture.etherscan.native_calls(), 0);
}

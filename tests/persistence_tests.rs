use std::fs;
use std::sync::Arc;
use std::time::Duration;

use chainbalance::adapter::outbound::memory::metadata::InMemoryMetadataStore;
use chainbalance::adapter::outbound::storage::json_file::JsonFileStorage;
use chainbalance::application::balance::cache::BalanceCache;
use chainbalance::domain::{balance::CacheEntry, chain::Chain, token::TrackedToken};
use chainbalance::infrastructure::bootstrap::BalanceEngine;
use chainbalance::infrastructure::config::settings::Config;
use chainbalance::port::outbound::cache::{BalanceStore, CacheStorage};
use chainbalance::testkit::domain::entry_aged;
use serde_json::Value;
use tempfile::TempDir;

#[test]
fn missing_file_loads_as_empty_cache() {
    let dir = TempDir::new().expect("temp dir");
    let storage = JsonFileStorage::new(dir.path().join("absent.json"));

    assert!(storage.load().expect("load").is_empty());
}

#[test]
fn saved_cache_survives_a_restart() {
    let dir = TempDir::new().expect("temp dir");
    let storage = JsonFileStorage::new(dir.path().join("nested").join("balances.json"));

    let cache = BalanceCache::new();
    cache
        .set(CacheEntry::native(Chain::Bsv, "1Saved", "0.75").with_unconfirmed("0.01"))
        .expect("set bsv");
    cache
        .set(CacheEntry::for_token(Chain::Eth, "0xsaved", &TrackedToken::usdc(), "12.5"))
        .expect("set usdc");
    assert_eq!(cache.flush(&storage).expect("flush"), 2);

    let restarted = BalanceCache::new();
    assert_eq!(restarted.hydrate(&storage).expect("hydrate"), 2);

    let (bsv, _) = restarted.get(Chain::Bsv, "1Saved", "").expect("bsv entry");
    assert_eq!(bsv.balance, "0.75");
    assert_eq!(bsv.unconfirmed, "0.01");

    let usdc_contract = TrackedToken::usdc().contract;
    let (usdc, _) = restarted
        .get(Chain::Eth, "0xsaved", &usdc_contract)
        .expect("usdc entry");
    assert_eq!(usdc.symbol, "USDC");
    assert_eq!(usdc.decimals, 6);
}

#[test]
fn file_is_keyed_by_cache_key_and_leaves_no_temp_file() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("balances.json");
    let storage = JsonFileStorage::new(&path);

    storage
        .save(&[CacheEntry::native(Chain::Eth, "0xabc", "1.5")])
        .expect("save");

    let raw: Value = serde_json::from_str(&fs::read_to_string(&path).expect("read")).expect("json");
    let object = raw.as_object().expect("top-level object");
    assert!(object.contains_key("eth:0xabc"), "keys: {:?}", object.keys());
    assert_eq!(object["eth:0xabc"]["balance"], "1.5");

    let leftovers: Vec<_> = fs::read_dir(dir.path())
        .expect("list dir")
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().to_string())
        .filter(|name| name.ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty(), "temp files left behind: {leftovers:?}");
}

#[test]
fn hydrate_keeps_newer_in_memory_entries() {
    let dir = TempDir::new().expect("temp dir");
    let storage = JsonFileStorage::new(dir.path().join("balances.json"));
    storage
        .save(&[entry_aged(Chain::Bsv, "1Both", "1.0", Duration::from_secs(3600))])
        .expect("save");

    let cache = BalanceCache::new();
    cache
        .set(entry_aged(Chain::Bsv, "1Both", "2.0", Duration::from_secs(10)))
        .expect("set");

    assert_eq!(cache.hydrate(&storage).expect("hydrate"), 0);
    let (entry, _) = cache.get(Chain::Bsv, "1Both", "").expect("entry");
    assert_eq!(entry.balance, "2.0");
}

#[test]
fn corrupt_file_is_an_error() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("balances.json");
    fs::write(&path, "{ not json").expect("write");

    let cache = BalanceCache::new();
    assert!(cache.hydrate(&JsonFileStorage::new(&path)).is_err());
    assert!(cache.is_empty());
}

#[test]
fn engine_round_trips_through_its_cache_path() {
    let dir = TempDir::new().expect("temp dir");
    let mut config = Config::default();
    config.cache_path = Some(dir.path().join("engine.json"));

    let engine = BalanceEngine::build(config.clone(), Arc::new(InMemoryMetadataStore::new()))
        .expect("build engine");
    engine
        .cache
        .record_local_balance(Chain::Bsv, "1Engine", "0.3", "");
    assert_eq!(engine.flush().expect("flush"), 1);

    let reopened =
        BalanceEngine::build(config, Arc::new(InMemoryMetadataStore::new())).expect("rebuild");
    assert_eq!(reopened.hydrate().expect("hydrate"), 1);
    assert_eq!(reopened.cache.get_all_for_address(Chain::Bsv, "1Engine").len(), 1);
}

use ledger_storage::prelude::*;

#[test]
fn test_prelude_opens_cached_stack() {
    ledger_storage::init_logging();

    let config = DatabaseConfig::memory("state").with_read_cache(ReadCacheConfig::loading(8, true));
    let store = open_database(&config).unwrap();

    store.put(b"k", b"v").unwrap();
    assert_eq!(store.get(b"k").unwrap(), Some(b"v".to_vec()));
    assert_eq!(store.get(b"absent").unwrap(), None);

    store.close().unwrap();
    assert!(matches!(store.get(b"k"), Err(StoreError::NotOpen { .. })));
}

#[test]
fn test_init_logging_is_idempotent() {
    ledger_storage::init_logging();
    ledger_storage::init_logging();
}

#[test]
fn test_window_config_round_trips_through_toml() {
    let config = DatabaseConfig::memory("block").with_read_cache(ReadCacheConfig::window(32));
    let text = config.to_toml_string().unwrap();
    let parsed = DatabaseConfig::from_toml_str(&text).unwrap();
    assert_eq!(parsed.read_cache.strategy, ReadCacheStrategy::Window);

    let store = build_database(&parsed).unwrap();
    assert!(!store.is_open());
    assert!(store.open());
    assert_eq!(store.to_string(), "WindowCacheStore<32> over MemoryStore(block)");
}

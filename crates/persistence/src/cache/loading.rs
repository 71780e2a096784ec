use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use moka::notification::RemovalCause;
use moka::policy::EvictionPolicy;
use moka::sync::Cache;
use parking_lot::RwLock;
use tracing::{debug, error};

use super::stats::{CacheStats, StatsRecorder};
use crate::error::{StoreError, StoreResult};
use crate::traits::{KeyIter, KeyValueStore, PersistenceMethod};

/// Cached read result; `None` records that the store had no value.
type RecordCache = Cache<Vec<u8>, Option<Vec<u8>>>;

/// Load-through read cache for randomly accessed hot keys (trie nodes,
/// state entries).
///
/// Concurrent misses on one key are coalesced: the wrapped store is read
/// once and every waiter receives the same record. Absent keys are cached as
/// negative entries. Point writes update the cache in place; batch writes,
/// `commit`, `close` and `drop_all` invalidate everything.
///
/// The cache is materialized on the first successful [`open`](KeyValueStore::open),
/// or on first use if the wrapped store was already opened elsewhere.
pub struct LoadingCacheStore<S> {
    store: S,
    /// `0` leaves the cache unbounded.
    max_entries: u64,
    stats_enabled: bool,
    stats: Arc<StatsRecorder>,
    cache: RwLock<Option<RecordCache>>,
}

impl<S: KeyValueStore> LoadingCacheStore<S> {
    pub fn new(store: S, max_entries: u64, stats_enabled: bool) -> Self {
        Self {
            store,
            max_entries,
            stats_enabled,
            stats: Arc::new(StatsRecorder::default()),
            cache: RwLock::new(None),
        }
    }

    /// The wrapped store.
    pub fn inner(&self) -> &S {
        &self.store
    }

    pub fn max_entries(&self) -> u64 {
        self.max_entries
    }

    /// Counters, or `None` when statistics were not enabled.
    pub fn stats(&self) -> Option<CacheStats> {
        self.stats_enabled.then(|| self.stats.snapshot())
    }

    /// Settles pending evictions and returns the number of cached records.
    pub fn cached_entries(&self) -> u64 {
        match self.cache() {
            Some(cache) => {
                cache.run_pending_tasks();
                cache.entry_count()
            }
            None => 0,
        }
    }

    /// The live cache. Built on demand when the wrapped store was opened
    /// through another handle.
    fn cache(&self) -> Option<RecordCache> {
        if let Some(cache) = self.cache.read().as_ref() {
            return Some(cache.clone());
        }
        if !self.store.is_open() {
            return None;
        }
        self.ensure_cache();
        self.cache.read().clone()
    }

    fn build_cache(&self) -> RecordCache {
        let mut builder = RecordCache::builder().eviction_policy(EvictionPolicy::lru());
        if self.max_entries != 0 {
            builder = builder.max_capacity(self.max_entries);
        }
        if self.stats_enabled {
            let stats = Arc::clone(&self.stats);
            builder = builder.eviction_listener(move |_key, _value, cause| {
                if cause == RemovalCause::Size {
                    stats.record_eviction();
                }
            });
        }
        builder.build()
    }

    fn ensure_cache(&self) {
        let mut guard = self.cache.write();
        if guard.is_none() {
            *guard = Some(self.build_cache());
            debug!(store = %self.store, max_entries = self.max_entries, "read cache ready");
        }
    }

    fn invalidate_all(&self) {
        if let Some(cache) = self.cache() {
            cache.invalidate_all();
        }
    }

    fn log_stats(&self) {
        if self.stats_enabled {
            debug!(store = %self.store, stats = %self.stats.snapshot(), "read cache statistics");
        }
    }
}

impl<S: KeyValueStore> fmt::Display for LoadingCacheStore<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LoadingCacheStore<{}> over {}", self.max_entries, self.store)
    }
}

impl<S: KeyValueStore> KeyValueStore for LoadingCacheStore<S> {
    fn open(&self) -> bool {
        let open = self.store.open();
        if open {
            self.ensure_cache();
        }
        open
    }

    fn close(&self) -> StoreResult<()> {
        let result = self.store.close();
        self.invalidate_all();
        result
    }

    fn check(&self) -> StoreResult<()> {
        if self.store.is_open() {
            Ok(())
        } else {
            Err(StoreError::not_open(self.to_string()))
        }
    }

    fn commit(&self) -> StoreResult<bool> {
        self.invalidate_all();
        self.store.commit()
    }

    fn compact(&self) -> StoreResult<()> {
        self.store.compact()
    }

    fn drop_all(&self) -> StoreResult<()> {
        self.invalidate_all();
        self.store.drop_all()
    }

    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        let Some(cache) = self.cache() else {
            return self.store.get(key);
        };

        if let Some(record) = cache.get(key) {
            if self.stats_enabled {
                self.stats.record_hit();
            }
            debug!(store = %self.store, key = %hex::encode(key), "value from read cache");
            return Ok(record);
        }

        if self.stats_enabled {
            self.stats.record_miss();
        }
        match cache.try_get_with(key.to_vec(), || self.store.get(key)) {
            Ok(record) => Ok(record),
            Err(err) => {
                error!(
                    store = %self,
                    key = %hex::encode(key),
                    error = %err,
                    "cannot load from cache, loading directly from database"
                );
                self.store.get(key)
            }
        }
    }

    fn put(&self, key: &[u8], value: &[u8]) -> StoreResult<()> {
        let cache = self.cache();
        if let Some(cache) = &cache {
            cache.insert(key.to_vec(), Some(value.to_vec()));
        }

        if let Err(err) = self.store.put(key, value) {
            if let Some(cache) = &cache {
                cache.invalidate(key);
            }
            return Err(err);
        }
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> StoreResult<()> {
        if let Some(cache) = self.cache() {
            cache.invalidate(key);
        }
        self.store.delete(key)
    }

    fn put_batch(&self, entries: &HashMap<Vec<u8>, Vec<u8>>) -> StoreResult<()> {
        self.log_stats();
        self.invalidate_all();
        self.store.put_batch(entries)
    }

    fn put_to_batch(&self, key: &[u8], value: &[u8]) -> StoreResult<()> {
        self.store.put_to_batch(key, value)
    }

    fn commit_batch(&self) -> StoreResult<()> {
        self.log_stats();
        self.invalidate_all();
        self.store.commit_batch()
    }

    fn delete_batch(&self, keys: &[Vec<u8>]) -> StoreResult<()> {
        self.log_stats();
        self.invalidate_all();
        self.store.delete_batch(keys)
    }

    fn name(&self) -> Option<String> {
        self.store.name()
    }

    fn path(&self) -> Option<PathBuf> {
        self.store.path()
    }

    fn is_open(&self) -> bool {
        self.store.is_open()
    }

    fn is_closed(&self) -> bool {
        self.store.is_closed()
    }

    fn is_auto_commit_enabled(&self) -> bool {
        self.store.is_auto_commit_enabled()
    }

    fn persistence_method(&self) -> PersistenceMethod {
        self.store.persistence_method()
    }

    fn is_created_on_disk(&self) -> bool {
        self.store.is_created_on_disk()
    }

    fn approximate_size(&self) -> StoreResult<u64> {
        self.store.approximate_size()
    }

    fn is_empty(&self) -> StoreResult<bool> {
        if !self.store.is_empty()? {
            return Ok(false);
        }
        // Only a record written behind the store's back can still be cached here.
        let cached = self
            .cache()
            .map(|cache| cache.iter().any(|(_, record)| record.is_some()))
            .unwrap_or(false);
        Ok(!cached)
    }

    fn is_locked(&self) -> bool {
        self.store.is_locked()
    }

    fn keys(&self) -> StoreResult<KeyIter<'_>> {
        self.store.keys()
    }
}

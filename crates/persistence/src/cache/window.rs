use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use lru::LruCache;
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};
use crate::traits::{KeyIter, KeyValueStore, PersistenceMethod};

type Window = LruCache<Vec<u8>, Option<Vec<u8>>>;

/// Read cache for records that are read in ascending order, such as blocks
/// and block indices by height.
///
/// Holds at most `max_entries` records and evicts the oldest *inserted*
/// record first. Hits never reorder the window, so a record read once and
/// then re-read stays on its original eviction schedule.
///
/// There is no load coalescing and no statistics. The window sits behind a
/// mutex held only for its own bookkeeping, never across a call to the
/// wrapped store, so concurrent callers are memory safe but unordered: two
/// threads racing a read and a write of the same key may leave either record
/// in the window. Callers that need ordering must serialize access.
pub struct WindowCacheStore<S> {
    store: S,
    max_entries: usize,
    window: Mutex<Window>,
}

impl<S: KeyValueStore> WindowCacheStore<S> {
    /// Wraps `store`; a zero bound is raised to one.
    pub fn new(store: S, max_entries: usize) -> Self {
        let max_entries = if max_entries == 0 {
            warn!(store = %store, "window cache size 0 is not allowed, using 1");
            1
        } else {
            max_entries
        };

        Self {
            store,
            max_entries,
            window: Mutex::new(LruCache::unbounded()),
        }
    }

    /// Wraps `store`, rejecting a zero bound.
    pub fn try_new(store: S, max_entries: usize) -> StoreResult<Self> {
        if max_entries == 0 {
            return Err(StoreError::invalid_operation(
                "window cache requires a positive maximum size",
            ));
        }
        Ok(Self::new(store, max_entries))
    }

    pub fn inner(&self) -> &S {
        &self.store
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// Number of records currently in the window.
    pub fn window_len(&self) -> usize {
        self.window.lock().len()
    }

    pub fn window_contains(&self, key: &[u8]) -> bool {
        self.window.lock().contains(key)
    }

    /// Keys in the window, oldest insertion first.
    pub fn window_keys(&self) -> Vec<Vec<u8>> {
        self.window
            .lock()
            .iter()
            .rev()
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Inserts `record` as the newest entry, evicting the oldest ones so the
    /// window never holds more than `max_entries`.
    fn admit(&self, window: &mut Window, key: Vec<u8>, record: Option<Vec<u8>>) {
        window.pop(&key);
        while window.len() >= self.max_entries {
            if window.pop_lru().is_none() {
                break;
            }
        }
        window.put(key, record);
    }

    fn clear(&self) {
        self.window.lock().clear();
    }
}

impl<S: KeyValueStore> fmt::Display for WindowCacheStore<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WindowCacheStore<{}> over {}", self.max_entries, self.store)
    }
}

impl<S: KeyValueStore> KeyValueStore for WindowCacheStore<S> {
    fn open(&self) -> bool {
        self.store.open()
    }

    fn close(&self) -> StoreResult<()> {
        let result = self.store.close();
        self.clear();
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
        self.clear();
        self.store.commit()
    }

    fn compact(&self) -> StoreResult<()> {
        self.store.compact()
    }

    fn drop_all(&self) -> StoreResult<()> {
        self.clear();
        self.store.drop_all()
    }

    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        {
            let window = self.window.lock();
            if let Some(record) = window.peek(key) {
                debug!(
                    store = %self.store,
                    size = window.len(),
                    "value from read cache"
                );
                return Ok(record.clone());
            }
        }

        let record = self.store.get(key)?;
        let mut window = self.window.lock();
        self.admit(&mut window, key.to_vec(), record.clone());
        Ok(record)
    }

    fn put(&self, key: &[u8], value: &[u8]) -> StoreResult<()> {
        {
            let mut window = self.window.lock();
            self.admit(&mut window, key.to_vec(), Some(value.to_vec()));
        }

        if let Err(err) = self.store.put(key, value) {
            self.window.lock().pop(key);
            return Err(err);
        }
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> StoreResult<()> {
        self.window.lock().pop(key);
        self.store.delete(key)
    }

    fn put_batch(&self, entries: &HashMap<Vec<u8>, Vec<u8>>) -> StoreResult<()> {
        self.clear();
        self.store.put_batch(entries)
    }

    fn put_to_batch(&self, key: &[u8], value: &[u8]) -> StoreResult<()> {
        self.store.put_to_batch(key, value)
    }

    fn commit_batch(&self) -> StoreResult<()> {
        self.clear();
        self.store.commit_batch()
    }

    fn delete_batch(&self, keys: &[Vec<u8>]) -> StoreResult<()> {
        self.clear();
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
        let cached = self.window.lock().iter().any(|(_, record)| record.is_some());
        Ok(!cached)
    }

    fn is_locked(&self) -> bool {
        self.store.is_locked()
    }

    fn keys(&self) -> StoreResult<KeyIter<'_>> {
        self.store.keys()
    }
}

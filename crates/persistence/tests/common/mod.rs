//! Shared fixtures: a backing store that counts reads and fails on demand.

#![allow(dead_code)]

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use ledger_persistence::{
    KeyIter, KeyValueStore, MemoryStore, PersistenceMethod, StoreError, StoreResult,
};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Memory-backed store with read accounting and scripted failures.
pub struct ScriptedStore {
    inner: MemoryStore,
    reads: AtomicUsize,
    failing_reads: AtomicUsize,
    read_delay_ms: AtomicU64,
    fail_writes: AtomicBool,
    fail_close: AtomicBool,
    fail_commit: AtomicBool,
}

impl ScriptedStore {
    pub fn new(name: &str) -> Self {
        Self {
            inner: MemoryStore::new(name),
            reads: AtomicUsize::new(0),
            failing_reads: AtomicUsize::new(0),
            read_delay_ms: AtomicU64::new(0),
            fail_writes: AtomicBool::new(false),
            fail_close: AtomicBool::new(false),
            fail_commit: AtomicBool::new(false),
        }
    }

    /// Opened store pre-populated with `entries`.
    pub fn with_entries(name: &str, entries: &[(&str, &str)]) -> Self {
        let store = Self::new(name);
        assert!(store.inner.open());
        for (key, value) in entries {
            store.inner.put(key.as_bytes(), value.as_bytes()).unwrap();
        }
        store
    }

    /// Number of `get` calls that reached this store.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn fail_next_reads(&self, count: usize) {
        self.failing_reads.store(count, Ordering::SeqCst);
    }

    pub fn set_read_delay(&self, delay: Duration) {
        self.read_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_close(&self, fail: bool) {
        self.fail_close.store(fail, Ordering::SeqCst);
    }

    pub fn fail_commit(&self, fail: bool) {
        self.fail_commit.store(fail, Ordering::SeqCst);
    }

    /// Writes directly to the backing map, bypassing any decorator.
    pub fn put_behind(&self, key: &[u8], value: &[u8]) {
        self.inner.put(key, value).unwrap();
    }

    fn write_guard(&self) -> StoreResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(StoreError::backend("scripted write failure"))
        } else {
            Ok(())
        }
    }
}

impl fmt::Display for ScriptedStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Scripted{}", self.inner)
    }
}

impl KeyValueStore for ScriptedStore {
    fn open(&self) -> bool {
        self.inner.open()
    }

    fn close(&self) -> StoreResult<()> {
        if self.fail_close.load(Ordering::SeqCst) {
            return Err(StoreError::backend("scripted close failure"));
        }
        self.inner.close()
    }

    fn check(&self) -> StoreResult<()> {
        self.inner.check()
    }

    fn commit(&self) -> StoreResult<bool> {
        if self.fail_commit.load(Ordering::SeqCst) {
            return Err(StoreError::backend("scripted commit failure"));
        }
        self.inner.commit()
    }

    fn compact(&self) -> StoreResult<()> {
        self.inner.compact()
    }

    fn drop_all(&self) -> StoreResult<()> {
        self.inner.drop_all()
    }

    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        self.reads.fetch_add(1, Ordering::SeqCst);

        let delay = self.read_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            std::thread::sleep(Duration::from_millis(delay));
        }

        let fail = self
            .failing_reads
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if fail {
            return Err(StoreError::backend("scripted read failure"));
        }
        self.inner.get(key)
    }

    fn put(&self, key: &[u8], value: &[u8]) -> StoreResult<()> {
        self.write_guard()?;
        self.inner.put(key, value)
    }

    fn delete(&self, key: &[u8]) -> StoreResult<()> {
        self.write_guard()?;
        self.inner.delete(key)
    }

    fn put_batch(&self, entries: &HashMap<Vec<u8>, Vec<u8>>) -> StoreResult<()> {
        self.write_guard()?;
        self.inner.put_batch(entries)
    }

    fn put_to_batch(&self, key: &[u8], value: &[u8]) -> StoreResult<()> {
        self.inner.put_to_batch(key, value)
    }

    fn commit_batch(&self) -> StoreResult<()> {
        self.write_guard()?;
        self.inner.commit_batch()
    }

    fn delete_batch(&self, keys: &[Vec<u8>]) -> StoreResult<()> {
        self.write_guard()?;
        self.inner.delete_batch(keys)
    }

    fn name(&self) -> Option<String> {
        self.inner.name()
    }

    fn path(&self) -> Option<PathBuf> {
        self.inner.path()
    }

    fn is_open(&self) -> bool {
        self.inner.is_open()
    }

    fn is_auto_commit_enabled(&self) -> bool {
        self.inner.is_auto_commit_enabled()
    }

    fn persistence_method(&self) -> PersistenceMethod {
        self.inner.persistence_method()
    }

    fn is_created_on_disk(&self) -> bool {
        self.inner.is_created_on_disk()
    }

    fn approximate_size(&self) -> StoreResult<u64> {
        self.inner.approximate_size()
    }

    fn is_empty(&self) -> StoreResult<bool> {
        self.inner.is_empty()
    }

    fn is_locked(&self) -> bool {
        self.inner.is_locked()
    }

    fn keys(&self) -> StoreResult<KeyIter<'_>> {
        self.inner.keys()
    }
}

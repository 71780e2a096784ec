use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info};

use crate::batch::WriteBatch;
use crate::error::{StoreError, StoreResult};
use crate::traits::{KeyIter, KeyValueStore, PersistenceMethod};

/// Volatile store keeping every entry in a concurrent map.
///
/// Batches run under an exclusive guard so readers never observe half of a
/// batch; point operations take the shared side. Closing the store discards
/// its contents.
pub struct MemoryStore {
    name: String,
    open: AtomicBool,
    entries: DashMap<Vec<u8>, Vec<u8>>,
    guard: RwLock<()>,
    staged: Mutex<WriteBatch>,
}

impl MemoryStore {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            open: AtomicBool::new(false),
            entries: DashMap::new(),
            guard: RwLock::new(()),
            staged: Mutex::new(WriteBatch::new()),
        }
    }

    /// Number of committed entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl fmt::Display for MemoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MemoryStore({})", self.name)
    }
}

impl KeyValueStore for MemoryStore {
    fn open(&self) -> bool {
        if !self.open.swap(true, Ordering::SeqCst) {
            info!(store = %self.name, "opened in-memory store");
        }
        true
    }

    fn close(&self) -> StoreResult<()> {
        if self.open.swap(false, Ordering::SeqCst) {
            let _write = self.guard.write();
            self.entries.clear();
            *self.staged.lock() = WriteBatch::new();
            info!(store = %self.name, "closed in-memory store");
        }
        Ok(())
    }

    fn check(&self) -> StoreResult<()> {
        if self.open.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::not_open(self.to_string()))
        }
    }

    fn commit(&self) -> StoreResult<bool> {
        self.check()?;
        Ok(true)
    }

    fn compact(&self) -> StoreResult<()> {
        self.check()
    }

    fn drop_all(&self) -> StoreResult<()> {
        self.check()?;
        let _write = self.guard.write();
        self.entries.clear();
        Ok(())
    }

    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        self.check()?;
        let _read = self.guard.read();
        Ok(self.entries.get(key).map(|value| value.value().clone()))
    }

    fn put(&self, key: &[u8], value: &[u8]) -> StoreResult<()> {
        self.check()?;
        let _read = self.guard.read();
        self.entries.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> StoreResult<()> {
        self.check()?;
        let _read = self.guard.read();
        self.entries.remove(key);
        Ok(())
    }

    fn put_batch(&self, entries: &HashMap<Vec<u8>, Vec<u8>>) -> StoreResult<()> {
        self.check()?;
        let _write = self.guard.write();
        for (key, value) in entries {
            self.entries.insert(key.clone(), value.clone());
        }
        Ok(())
    }

    fn put_to_batch(&self, key: &[u8], value: &[u8]) -> StoreResult<()> {
        self.check()?;
        self.staged.lock().put(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn commit_batch(&self) -> StoreResult<()> {
        self.check()?;
        let batch = std::mem::take(&mut *self.staged.lock());
        if batch.is_empty() {
            return Ok(());
        }
        debug!(store = %self.name, ops = batch.len(), "committing staged batch");
        let _write = self.guard.write();
        for (key, value) in batch.into_entries() {
            self.entries.insert(key, value);
        }
        Ok(())
    }

    fn delete_batch(&self, keys: &[Vec<u8>]) -> StoreResult<()> {
        self.check()?;
        let _write = self.guard.write();
        for key in keys {
            self.entries.remove(key);
        }
        Ok(())
    }

    fn name(&self) -> Option<String> {
        Some(self.name.clone())
    }

    fn path(&self) -> Option<PathBuf> {
        None
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    fn is_auto_commit_enabled(&self) -> bool {
        true
    }

    fn persistence_method(&self) -> PersistenceMethod {
        PersistenceMethod::InMemory
    }

    fn is_created_on_disk(&self) -> bool {
        false
    }

    fn approximate_size(&self) -> StoreResult<u64> {
        self.check()?;
        let size = self
            .entries
            .iter()
            .map(|kv| (kv.key().len() + kv.value().len()) as u64)
            .sum();
        Ok(size)
    }

    fn is_empty(&self) -> StoreResult<bool> {
        self.check()?;
        Ok(self.entries.is_empty())
    }

    fn is_locked(&self) -> bool {
        self.guard.is_locked()
    }

    fn keys(&self) -> StoreResult<KeyIter<'_>> {
        self.check()?;
        let mut keys: Vec<Vec<u8>> = {
            let _read = self.guard.read();
            self.entries.iter().map(|kv| kv.key().clone()).collect()
        };
        keys.sort();
        Ok(Box::new(keys.into_iter()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_store() -> MemoryStore {
        let store = MemoryStore::new("test");
        assert!(store.open());
        store
    }

    #[test]
    fn test_operations_require_open() {
        let store = MemoryStore::new("closed");
        assert!(store.is_closed());
        assert!(store.check().unwrap_err().is_not_open());
        assert!(store.get(b"k").unwrap_err().is_not_open());
        assert!(store.put(b"k", b"v").unwrap_err().is_not_open());
        assert!(store.keys().is_err());
    }

    #[test]
    fn test_open_is_idempotent() {
        let store = open_store();
        store.put(b"k", b"v").unwrap();
        assert!(store.open());
        assert_eq!(store.get(b"k").unwrap(), Some(b"v".to_vec()));
    }

    #[test]
    fn test_put_get_delete() {
        let store = open_store();
        assert_eq!(store.get(b"missing").unwrap(), None);

        store.put(b"k", b"v").unwrap();
        assert_eq!(store.get(b"k").unwrap(), Some(b"v".to_vec()));

        store.delete(b"k").unwrap();
        assert_eq!(store.get(b"k").unwrap(), None);
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn test_staged_batch_visible_after_commit() {
        let store = open_store();
        store.put_to_batch(b"a", b"1").unwrap();
        store.put_to_batch(b"b", b"2").unwrap();
        assert_eq!(store.get(b"a").unwrap(), None);

        store.commit_batch().unwrap();
        assert_eq!(store.get(b"a").unwrap(), Some(b"1".to_vec()));
        assert_eq!(store.get(b"b").unwrap(), Some(b"2".to_vec()));
        assert!(!store.is_locked());
    }

    #[test]
    fn test_staged_writes_apply_in_order() {
        let store = open_store();
        store.put_to_batch(b"k", b"first").unwrap();
        store.put_to_batch(b"k", b"second").unwrap();
        store.commit_batch().unwrap();

        assert_eq!(store.get(b"k").unwrap(), Some(b"second".to_vec()));
        // Nothing left staged.
        store.commit_batch().unwrap();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_batches_and_size() {
        let store = open_store();
        let mut entries = HashMap::new();
        entries.insert(b"a".to_vec(), b"11".to_vec());
        entries.insert(b"bb".to_vec(), b"2".to_vec());
        store.put_batch(&entries).unwrap();
        assert_eq!(store.approximate_size().unwrap(), 6);

        store.delete_batch(&[b"a".to_vec()]).unwrap();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_keys_sorted_and_restartable() {
        let store = open_store();
        store.put(b"c", b"3").unwrap();
        store.put(b"a", b"1").unwrap();
        store.put(b"b", b"2").unwrap();

        let first: Vec<_> = store.keys().unwrap().collect();
        let second: Vec<_> = store.keys().unwrap().collect();
        assert_eq!(first, vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_close_discards_contents() {
        let store = open_store();
        store.put(b"k", b"v").unwrap();
        store.close().unwrap();
        assert!(store.is_closed());

        store.open();
        assert_eq!(store.get(b"k").unwrap(), None);
    }

    #[test]
    fn test_introspection() {
        let store = MemoryStore::new("state");
        assert_eq!(store.name(), Some("state".to_string()));
        assert_eq!(store.path(), None);
        assert_eq!(store.persistence_method(), PersistenceMethod::InMemory);
        assert!(store.is_auto_commit_enabled());
        assert!(!store.is_created_on_disk());
        assert_eq!(store.to_string(), "MemoryStore(state)");
    }
}

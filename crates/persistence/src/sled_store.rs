use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use parking_lot::{Mutex, RwLock};
use sled::{Batch, Db};
use tracing::{debug, error, info, warn};

use crate::batch::WriteBatch;
use crate::error::{StoreError, StoreResult};
use crate::traits::{KeyIter, KeyValueStore, PersistenceMethod};

/// Persistent store backed by the `sled` embedded database.
pub struct SledStore {
    name: String,
    path: PathBuf,
    db: RwLock<Option<Db>>,
    staged: Mutex<WriteBatch>,
}

impl SledStore {
    pub fn new<P: AsRef<Path>>(name: impl Into<String>, path: P) -> Self {
        Self {
            name: name.into(),
            path: path.as_ref().to_path_buf(),
            db: RwLock::new(None),
            staged: Mutex::new(WriteBatch::new()),
        }
    }

    fn with_db<T>(&self, f: impl FnOnce(&Db) -> sled::Result<T>) -> StoreResult<T> {
        let guard = self.db.read();
        let db = guard
            .as_ref()
            .ok_or_else(|| StoreError::not_open(self.to_string()))?;
        f(db).map_err(StoreError::from)
    }
}

impl fmt::Display for SledStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SledStore({})", self.name)
    }
}

impl KeyValueStore for SledStore {
    fn open(&self) -> bool {
        let mut guard = self.db.write();
        if guard.is_some() {
            return true;
        }

        match sled::open(&self.path) {
            Ok(db) => {
                info!(store = %self.name, path = ?self.path, recovered = db.was_recovered(), "opened sled store");
                *guard = Some(db);
                true
            }
            Err(err) => {
                error!(store = %self.name, path = ?self.path, error = %err, "failed to open sled store");
                false
            }
        }
    }

    fn close(&self) -> StoreResult<()> {
        let db = self.db.write().take();
        *self.staged.lock() = WriteBatch::new();
        if let Some(db) = db {
            db.flush()?;
            info!(store = %self.name, "closed sled store");
        }
        Ok(())
    }

    fn check(&self) -> StoreResult<()> {
        if self.is_open() {
            Ok(())
        } else {
            Err(StoreError::not_open(self.to_string()))
        }
    }

    fn commit(&self) -> StoreResult<bool> {
        let flushed = self.with_db(|db| db.flush())?;
        debug!(store = %self.name, bytes = flushed, "flushed sled store");
        Ok(true)
    }

    fn compact(&self) -> StoreResult<()> {
        // sled compacts in the background; flushing is all that can be forced.
        self.with_db(|db| db.flush()).map(|_| ())
    }

    fn drop_all(&self) -> StoreResult<()> {
        self.with_db(|db| {
            db.clear()?;
            db.flush()
        })
        .map(|_| ())
    }

    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        self.with_db(|db| db.get(key))
            .map(|value| value.map(|ivec| ivec.as_ref().to_vec()))
    }

    fn put(&self, key: &[u8], value: &[u8]) -> StoreResult<()> {
        self.with_db(|db| db.insert(key, value)).map(|_| ())
    }

    fn delete(&self, key: &[u8]) -> StoreResult<()> {
        self.with_db(|db| db.remove(key)).map(|_| ())
    }

    fn put_batch(&self, entries: &HashMap<Vec<u8>, Vec<u8>>) -> StoreResult<()> {
        let mut batch = Batch::default();
        for (key, value) in entries {
            batch.insert(key.as_slice(), value.as_slice());
        }
        self.with_db(|db| db.apply_batch(batch))
    }

    fn put_to_batch(&self, key: &[u8], value: &[u8]) -> StoreResult<()> {
        self.check()?;
        self.staged.lock().put(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn commit_batch(&self) -> StoreResult<()> {
        self.check()?;
        let staged = std::mem::take(&mut *self.staged.lock());
        if staged.is_empty() {
            return Ok(());
        }

        let mut batch = Batch::default();
        for (key, value) in staged.into_entries() {
            batch.insert(key, value);
        }
        self.with_db(|db| db.apply_batch(batch))
    }

    fn delete_batch(&self, keys: &[Vec<u8>]) -> StoreResult<()> {
        let mut batch = Batch::default();
        for key in keys {
            batch.remove(key.as_slice());
        }
        self.with_db(|db| db.apply_batch(batch))
    }

    fn name(&self) -> Option<String> {
        Some(self.name.clone())
    }

    fn path(&self) -> Option<PathBuf> {
        Some(self.path.clone())
    }

    fn is_open(&self) -> bool {
        self.db.read().is_some()
    }

    fn is_auto_commit_enabled(&self) -> bool {
        false
    }

    fn persistence_method(&self) -> PersistenceMethod {
        PersistenceMethod::FileBased
    }

    fn is_created_on_disk(&self) -> bool {
        self.path.exists()
    }

    fn approximate_size(&self) -> StoreResult<u64> {
        self.with_db(|db| db.size_on_disk())
    }

    fn is_empty(&self) -> StoreResult<bool> {
        self.with_db(|db| Ok(db.is_empty()))
    }

    fn is_locked(&self) -> bool {
        self.db.is_locked()
    }

    fn keys(&self) -> StoreResult<KeyIter<'_>> {
        let db = self.with_db(|db| Ok(db.clone()))?;
        let name = self.name.clone();
        let keys = db.iter().keys().map_while(move |key| match key {
            Ok(key) => Some(key.as_ref().to_vec()),
            Err(err) => {
                warn!(store = %name, error = %err, "key iteration stopped");
                None
            }
        });
        Ok(Box::new(keys))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sled_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = SledStore::new("index", dir.path().join("index"));
        assert!(store.get(b"k").unwrap_err().is_not_open());

        assert!(store.open());
        store.put(b"k", b"v").unwrap();
        assert_eq!(store.get(b"k").unwrap(), Some(b"v".to_vec()));
        assert!(store.commit().unwrap());
        store.close().unwrap();

        assert!(store.open());
        assert_eq!(store.get(b"k").unwrap(), Some(b"v".to_vec()));
        assert!(store.is_created_on_disk());
        assert_eq!(store.persistence_method(), PersistenceMethod::FileBased);
    }

    #[test]
    fn test_sled_store_batches() {
        let dir = tempfile::tempdir().unwrap();
        let store = SledStore::new("block", dir.path());
        assert!(store.open());

        store.put_to_batch(b"a", b"1").unwrap();
        store.put_to_batch(b"b", b"2").unwrap();
        assert_eq!(store.get(b"a").unwrap(), None);
        store.commit_batch().unwrap();

        let keys: Vec<_> = store.keys().unwrap().collect();
        assert_eq!(keys, vec![b"a".to_vec(), b"b".to_vec()]);

        store.delete_batch(&[b"a".to_vec()]).unwrap();
        assert_eq!(store.get(b"a").unwrap(), None);

        store.drop_all().unwrap();
        assert!(store.is_empty().unwrap());
    }
}

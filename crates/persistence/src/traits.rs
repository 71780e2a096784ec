use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::StoreResult;

/// Lazy sequence over the keys of a store. Calling [`KeyValueStore::keys`]
/// again starts a fresh pass.
pub type KeyIter<'a> = Box<dyn Iterator<Item = Vec<u8>> + 'a>;

/// How a store keeps its data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PersistenceMethod {
    /// Not reported by the backend.
    #[default]
    Unknown,
    /// Held in process memory; lost on close.
    InMemory,
    /// Embedded database files on local disk.
    FileBased,
    /// External database server.
    Dbms,
}

impl fmt::Display for PersistenceMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PersistenceMethod::Unknown => "unknown",
            PersistenceMethod::InMemory => "in-memory",
            PersistenceMethod::FileBased => "file-based",
            PersistenceMethod::Dbms => "dbms",
        };
        f.write_str(name)
    }
}

/// Abstraction exposed by byte-keyed storage backends and by every decorator
/// layered over them.
///
/// A read returns `Ok(None)` when the store has no value for the key. Every
/// operation except `open`, `check` and the introspection methods fails with
/// [`StoreError::NotOpen`](crate::StoreError::NotOpen) while the store is
/// closed.
pub trait KeyValueStore: Send + Sync + fmt::Display {
    /// Opens the store. Returns `true` if it is open afterwards, including
    /// when it was already open.
    fn open(&self) -> bool;

    /// Releases the store. Errors from the backend are returned.
    fn close(&self) -> StoreResult<()>;

    /// Fails with `NotOpen` unless the store is open.
    fn check(&self) -> StoreResult<()>;

    /// Persists pending state. `Ok(true)` once it is durable.
    fn commit(&self) -> StoreResult<bool>;

    /// Backend maintenance, such as reclaiming space.
    fn compact(&self) -> StoreResult<()>;

    /// Removes every entry from the store.
    fn drop_all(&self) -> StoreResult<()>;

    /// Point read; `Ok(None)` when the key is absent.
    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>>;

    /// Point write, replacing any existing value.
    fn put(&self, key: &[u8], value: &[u8]) -> StoreResult<()>;

    /// Point delete. Deleting an absent key succeeds.
    fn delete(&self, key: &[u8]) -> StoreResult<()>;

    /// Writes every entry in one step.
    fn put_batch(&self, entries: &HashMap<Vec<u8>, Vec<u8>>) -> StoreResult<()>;

    /// Stages a write that becomes visible on [`commit_batch`](Self::commit_batch).
    fn put_to_batch(&self, key: &[u8], value: &[u8]) -> StoreResult<()>;

    /// Applies writes staged with `put_to_batch`.
    fn commit_batch(&self) -> StoreResult<()>;

    /// Deletes every key in one step.
    fn delete_batch(&self, keys: &[Vec<u8>]) -> StoreResult<()>;

    /// Logical database name.
    fn name(&self) -> Option<String>;

    /// On-disk location, if any.
    fn path(&self) -> Option<PathBuf>;

    fn is_open(&self) -> bool;

    fn is_closed(&self) -> bool {
        !self.is_open()
    }

    /// Whether point writes are durable without an explicit `commit`.
    fn is_auto_commit_enabled(&self) -> bool;

    fn persistence_method(&self) -> PersistenceMethod;

    /// Whether the store's files exist on disk.
    fn is_created_on_disk(&self) -> bool;

    /// Rough size of the stored data in bytes.
    fn approximate_size(&self) -> StoreResult<u64>;

    /// Whether the store holds no values.
    fn is_empty(&self) -> StoreResult<bool>;

    /// Whether the store's internal lock is currently held. Advisory only.
    fn is_locked(&self) -> bool;

    /// Lazy pass over every key.
    fn keys(&self) -> StoreResult<KeyIter<'_>>;
}

macro_rules! forward_store {
    ($ty:ty) => {
        impl<S: KeyValueStore + ?Sized> KeyValueStore for $ty {
            fn open(&self) -> bool {
                (**self).open()
            }

            fn close(&self) -> StoreResult<()> {
                (**self).close()
            }

            fn check(&self) -> StoreResult<()> {
                (**self).check()
            }

            fn commit(&self) -> StoreResult<bool> {
                (**self).commit()
            }

            fn compact(&self) -> StoreResult<()> {
                (**self).compact()
            }

            fn drop_all(&self) -> StoreResult<()> {
                (**self).drop_all()
            }

            fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
                (**self).get(key)
            }

            fn put(&self, key: &[u8], value: &[u8]) -> StoreResult<()> {
                (**self).put(key, value)
            }

            fn delete(&self, key: &[u8]) -> StoreResult<()> {
                (**self).delete(key)
            }

            fn put_batch(&self, entries: &HashMap<Vec<u8>, Vec<u8>>) -> StoreResult<()> {
                (**self).put_batch(entries)
            }

            fn put_to_batch(&self, key: &[u8], value: &[u8]) -> StoreResult<()> {
                (**self).put_to_batch(key, value)
            }

            fn commit_batch(&self) -> StoreResult<()> {
                (**self).commit_batch()
            }

            fn delete_batch(&self, keys: &[Vec<u8>]) -> StoreResult<()> {
                (**self).delete_batch(keys)
            }

            fn name(&self) -> Option<String> {
                (**self).name()
            }

            fn path(&self) -> Option<PathBuf> {
                (**self).path()
            }

            fn is_open(&self) -> bool {
                (**self).is_open()
            }

            fn is_closed(&self) -> bool {
                (**self).is_closed()
            }

            fn is_auto_commit_enabled(&self) -> bool {
                (**self).is_auto_commit_enabled()
            }

            fn persistence_method(&self) -> PersistenceMethod {
                (**self).persistence_method()
            }

            fn is_created_on_disk(&self) -> bool {
                (**self).is_created_on_disk()
            }

            fn approximate_size(&self) -> StoreResult<u64> {
                (**self).approximate_size()
            }

            fn is_empty(&self) -> StoreResult<bool> {
                (**self).is_empty()
            }

            fn is_locked(&self) -> bool {
                (**self).is_locked()
            }

            fn keys(&self) -> StoreResult<KeyIter<'_>> {
                (**self).keys()
            }
        }
    };
}

forward_store!(Box<S>);
forward_store!(Arc<S>);

//! # Ledger Persistence Layer
//!
//! Byte-keyed storage for the ledger node and the read caches that sit in
//! front of it.
//!
//! ## Features
//!
//! - **One store contract**: [`KeyValueStore`] is implemented by every backend
//!   and by every decorator, so stacks can be assembled freely
//! - **Loading read cache**: [`LoadingCacheStore`] for random-access hot keys,
//!   with single-flight loads, negative caching and optional statistics
//! - **Window read cache**: [`WindowCacheStore`] for records read in
//!   ascending order, evicting by insertion order
//! - **Backends**: [`MemoryStore`] and, with the `sled` feature, `SledStore`
//! - **Configuration**: [`open_database`] builds a stack from a
//!   [`DatabaseConfig`](ledger_config::DatabaseConfig)
//!
//! ## Example Usage
//!
//! ```rust
//! use ledger_persistence::{KeyValueStore, LoadingCacheStore, MemoryStore, WindowCacheStore};
//!
//! // Window over a loading cache over an in-memory backend.
//! let store = WindowCacheStore::new(
//!     LoadingCacheStore::new(MemoryStore::new("block"), 1024, true),
//!     64,
//! );
//! assert!(store.open());
//!
//! store.put(b"height:1", b"block one").unwrap();
//! assert_eq!(store.get(b"height:1").unwrap(), Some(b"block one".to_vec()));
//! assert_eq!(store.get(b"height:2").unwrap(), None);
//! ```
//!
//! ## Consistency
//!
//! Caches never hold back a write: every mutation reaches the wrapped store.
//! Point writes update cached records in place, while batch writes,
//! `commit`, `close` and `drop_all` discard every cached record, even when
//! the wrapped store reports an error.

#![warn(rustdoc::missing_crate_level_docs)]

/// Staged write operations
pub mod batch;
/// Read-cache decorators
pub mod cache;
/// Store error taxonomy
pub mod error;
/// Store assembly from configuration
pub mod factory;
/// In-memory backend
pub mod memory;
/// Core store contract
pub mod traits;

#[cfg(feature = "sled")]
mod sled_store;

pub use batch::WriteBatch;
pub use cache::{CacheStats, LoadingCacheStore, WindowCacheStore};
pub use error::{StoreError, StoreResult};
pub use factory::{build_database, open_database, DynStore};
pub use memory::MemoryStore;
#[cfg(feature = "sled")]
pub use sled_store::SledStore;
pub use traits::{KeyIter, KeyValueStore, PersistenceMethod};

/// Result type for persistence operations
pub type Result<T> = StoreResult<T>;

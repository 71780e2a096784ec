//! # Ledger Storage
//!
//! Byte-keyed storage for a ledger node with stackable read caches.
//!
//! The workspace is split into two crates:
//!
//! - [`config`] - database and read-cache configuration, loadable from TOML
//! - [`persistence`] - the store contract, backends and cache decorators
//!
//! ## Quick Start
//!
//! ```rust
//! use ledger_storage::prelude::*;
//!
//! let config = DatabaseConfig::memory("state").with_read_cache(ReadCacheConfig::loading(256, true));
//! let store = open_database(&config).unwrap();
//!
//! store.put(b"key", b"value").unwrap();
//! assert_eq!(store.get(b"key").unwrap(), Some(b"value".to_vec()));
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

use tracing_subscriber::{fmt, EnvFilter};

pub use ledger_config as config;
pub use ledger_persistence as persistence;

/// Common imports for storage users
pub mod prelude {
    pub use crate::config::{
        BackendKind, DatabaseConfig, ReadCacheConfig, ReadCacheStrategy,
    };
    pub use crate::persistence::{
        build_database, open_database, CacheStats, DynStore, KeyValueStore, LoadingCacheStore,
        MemoryStore, StoreError, StoreResult, WindowCacheStore, WriteBatch,
    };
}

/// Installs a formatting subscriber filtered by `RUST_LOG`, defaulting to
/// `info`. Does nothing if a global subscriber is already set.
pub fn init_logging() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,ledger=info"));
    let _ = fmt().with_env_filter(env_filter).try_init();
}

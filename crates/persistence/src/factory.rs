//! Assembles a store stack from configuration.

use ledger_config::{BackendKind, DatabaseConfig, ReadCacheStrategy};
use tracing::info;

use crate::cache::{LoadingCacheStore, WindowCacheStore};
use crate::error::{StoreError, StoreResult};
use crate::memory::MemoryStore;
use crate::traits::KeyValueStore;

/// Boxed store as handed out by [`open_database`].
pub type DynStore = Box<dyn KeyValueStore>;

/// Builds the configured backend and read cache without opening them.
pub fn build_database(config: &DatabaseConfig) -> StoreResult<DynStore> {
    config.validate()?;

    let backend = build_backend(config)?;
    let cache = &config.read_cache;
    let store: DynStore = match cache.strategy {
        ReadCacheStrategy::None => backend,
        ReadCacheStrategy::Loading => Box::new(LoadingCacheStore::new(
            backend,
            cache.max_entries as u64,
            cache.enable_stats,
        )),
        ReadCacheStrategy::Window => {
            Box::new(WindowCacheStore::try_new(backend, cache.max_entries)?)
        }
    };
    Ok(store)
}

/// Builds and opens the configured store stack.
pub fn open_database(config: &DatabaseConfig) -> StoreResult<DynStore> {
    let store = build_database(config)?;
    if !store.open() {
        return Err(StoreError::open_failed(store.to_string()));
    }
    info!(database = %config.name, stack = %store, "database opened");
    Ok(store)
}

fn build_backend(config: &DatabaseConfig) -> StoreResult<DynStore> {
    match config.backend {
        BackendKind::Memory => Ok(Box::new(MemoryStore::new(config.name.clone()))),
        BackendKind::Sled => build_sled(config),
    }
}

#[cfg(feature = "sled")]
fn build_sled(config: &DatabaseConfig) -> StoreResult<DynStore> {
    let path = config.path.as_ref().ok_or_else(|| {
        StoreError::invalid_operation(format!("database '{}' has no path", config.name))
    })?;
    Ok(Box::new(crate::SledStore::new(config.name.clone(), path)))
}

#[cfg(not(feature = "sled"))]
fn build_sled(config: &DatabaseConfig) -> StoreResult<DynStore> {
    Err(StoreError::unsupported(format!(
        "database '{}' needs the sled backend, which is not compiled in",
        config.name
    )))
}

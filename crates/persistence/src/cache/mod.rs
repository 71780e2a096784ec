//! Read-cache decorators.
//!
//! Both decorators implement [`KeyValueStore`](crate::KeyValueStore) over any
//! other store, so they can replace a bare backend or be stacked on each
//! other. Every mutation is written through to the wrapped store.

mod loading;
mod stats;
mod window;

pub use loading::LoadingCacheStore;
pub use stats::CacheStats;
pub use window::WindowCacheStore;

//! In-memory backend used for tests, simulations and short-lived nodes.

mod store;

pub use store::MemoryStore;

//! Cache Module
//!
//! Provides the in-memory store, the expiration predicate and strategies,
//! and the public cache handle.

pub(crate) mod entry;
mod stats;
mod store;
pub(crate) mod strategy;
pub(crate) mod ttl_cache;


// Re-export public types
pub(crate) use entry::Entry;
pub use stats::CacheStats;
pub(crate) use store::EntryStore;
pub use strategy::{ExpireStrategy, PartialExpiry, DEFAULT_BATCH_SIZE, DEFAULT_CONTINUE_RATIO};
pub use ttl_cache::Cache;

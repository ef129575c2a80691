//! Ephemera - an in-process key-value cache with per-entry expiration
//!
//! Every value is stored with a time-to-live. Reads never return expired
//! values, and a background sweeper reclaims expired entries so abandoned
//! keys do not accumulate.

pub mod cache;
pub mod config;
pub mod error;
mod tasks;

pub use cache::{Cache, CacheStats, ExpireStrategy};
pub use config::CacheConfig;
pub use error::{CacheError, Result};

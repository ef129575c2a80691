//! Error types for the cache
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache.
///
/// Invalid input (a zero TTL, out-of-range strategy parameters) is never
/// reported here; it is ignored or coerced where it is received.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// `close` was called on a cache that is already closed
    #[error("cache: already closed")]
    AlreadyClosed,

    /// The cache was built outside of a Tokio runtime
    #[error("cache: no Tokio runtime available to run the sweeper")]
    RuntimeUnavailable,
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;

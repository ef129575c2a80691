//! Cache Entry Module
//!
//! Defines individual cache entries and the expiration predicate shared by
//! lazy (on read) and active (sweeper) expiration.

use std::sync::Arc;
use std::time::{Duration, Instant};

// == Cache Entry ==
/// A stored value together with its absolute expiration instant.
#[derive(Debug)]
pub struct Entry<V> {
    /// The stored value, shared with callers that read it
    pub value: Arc<V>,
    /// Expiration instant, None = never expires
    pub expire_at: Option<Instant>,
}

impl<V> Entry<V> {
    // == Constructor ==
    /// Creates an entry that expires `ttl` after `now`.
    pub fn new(value: Arc<V>, now: Instant, ttl: Duration) -> Self {
        Self {
            value,
            expire_at: now.checked_add(ttl),
        }
    }

    /// Creates an entry with no expiration deadline.
    #[cfg(test)]
    pub fn persistent(value: Arc<V>) -> Self {
        Self {
            value,
            expire_at: None,
        }
    }

    // == Time To Live ==
    /// Returns the time left before the deadline as of `now`, zero once it
    /// has been reached and `Duration::MAX` if the entry never expires.
    ///
    /// Says nothing about expiry; that is decided by [`is_expired`] alone.
    pub fn remaining(&self, now: Instant) -> Duration {
        match self.expire_at {
            None => Duration::MAX,
            Some(expire_at) => expire_at.saturating_duration_since(now),
        }
    }
}

impl<V> Clone for Entry<V> {
    fn clone(&self) -> Self {
        Self {
            value: Arc::clone(&self.value),
            expire_at: self.expire_at,
        }
    }
}

// == Is Expired ==
/// Reports whether `entry` is expired as of `now`.
///
/// An entry is expired only when it has a deadline and `now` is strictly
/// after it. Entries without a deadline never expire.
pub fn is_expired<V>(now: Instant, entry: &Entry<V>) -> bool {
    matches!(entry.expire_at, Some(expire_at) if now > expire_at)
}

//! Cache Facade Module
//!
//! Public cache handle. Every operation serializes through a single mutex
//! guarding the entry store and the lifecycle flags; the sweeper task shares
//! the same state.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::Notify;
use tracing::{debug, info, trace};

use crate::cache::entry::is_expired;
use crate::cache::{CacheStats, Entry, EntryStore, ExpireStrategy};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};
use crate::tasks::{spawn_sweeper, Sweeper};

/// State guarded by the cache mutex.
pub(crate) struct CacheState<V> {
    pub(crate) store: EntryStore<V>,
    pub(crate) stats: CacheStats,
    /// Set once by `close`, never cleared
    pub(crate) closed: bool,
    /// True from the sweeper's launch until it observes an empty or closed cache
    pub(crate) sweeper_running: bool,
}

/// State shared between cache handles and the sweeper.
pub(crate) struct Shared<V> {
    pub(crate) state: Mutex<CacheState<V>>,
    /// Wakes a waiting sweeper; a wake with no waiter is dropped
    pub(crate) wake: Arc<Notify>,
}

impl<V> Drop for Shared<V> {
    fn drop(&mut self) {
        // Last handle is gone, let a waiting sweeper notice and exit
        self.wake.notify_waiters();
    }
}

// == Cache ==
/// In-process key-value cache where every value carries an expiration
/// deadline.
///
/// Expired values are never returned: reads evict them lazily, and a
/// background sweeper started by the first write removes the rest. Handles
/// are cheap to clone and all clones share the same entries.
///
/// # Example
///
/// ```rust,no_run
/// use ephemera::Cache;
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() {
///     let cache: Cache<String> = Cache::new();
///     cache.set_ex("session", "abc".to_string(), Duration::from_secs(30));
///     assert_eq!(cache.get("session").as_deref(), Some(&"abc".to_string()));
///     cache.close().unwrap();
/// }
/// ```
pub struct Cache<V> {
    shared: Arc<Shared<V>>,
    sweep_interval: Duration,
    strategy: ExpireStrategy,
    runtime: Handle,
}

impl<V> Clone for Cache<V> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            sweep_interval: self.sweep_interval,
            strategy: self.strategy,
            runtime: self.runtime.clone(),
        }
    }
}

impl<V: Send + Sync + 'static> Cache<V> {
    // == Constructor ==
    /// Creates a cache with the default configuration.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime context. Use
    /// [`Cache::try_with_config`] or [`Cache::with_runtime`] to avoid that.
    pub fn new() -> Self {
        Self::with_config(CacheConfig::default())
    }

    /// Creates a cache with a custom configuration.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime context.
    pub fn with_config(config: CacheConfig) -> Self {
        match Self::try_with_config(config) {
            Ok(cache) => cache,
            Err(err) => panic!(
                "{err}: create the cache from within a Tokio runtime \
                 or pass a runtime handle to Cache::with_runtime"
            ),
        }
    }

    /// Creates a cache bound to the current Tokio runtime.
    ///
    /// Returns [`CacheError::RuntimeUnavailable`] when there is none.
    pub fn try_with_config(config: CacheConfig) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|_| CacheError::RuntimeUnavailable)?;
        Ok(Self::with_runtime(config, runtime))
    }

    /// Creates a cache whose sweeper runs on `runtime`. Usable from threads
    /// that are not part of any runtime.
    pub fn with_runtime(config: CacheConfig, runtime: Handle) -> Self {
        let store = if config.initial_capacity > 0 {
            EntryStore::with_capacity(config.initial_capacity)
        } else {
            EntryStore::new()
        };

        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(CacheState {
                    store,
                    stats: CacheStats::new(),
                    closed: false,
                    sweeper_running: false,
                }),
                wake: Arc::new(Notify::new()),
            }),
            sweep_interval: config.sweep_interval,
            strategy: config.strategy,
            runtime,
        }
    }

    // == Get ==
    /// Returns the value stored under `key`, or None if it is missing or
    /// expired. An expired entry is removed as a side effect.
    pub fn get(&self, key: &str) -> Option<Arc<V>> {
        let mut guard = self.shared.state.lock();
        let state = &mut *guard;
        let now = Instant::now();

        match state.store.get(key) {
            Some(entry) if !is_expired(now, entry) => {
                state.stats.record_hit();
                Some(Arc::clone(&entry.value))
            }
            Some(_) => {
                state.store.remove(key);
                state.stats.record_expired_on_read();
                state.stats.record_miss();
                trace!(key = %key, "Entry expired on read");
                None
            }
            None => {
                state.stats.record_miss();
                None
            }
        }
    }

    // == Set With Expiry ==
    /// Stores `value` under `key` for `ttl`, replacing any existing entry.
    ///
    /// A zero `ttl` is ignored, as is any write to a closed cache. The first
    /// write while no sweeper is running launches one.
    pub fn set_ex(&self, key: impl Into<String>, value: impl Into<Arc<V>>, ttl: Duration) {
        if ttl.is_zero() {
            return;
        }
        let key = key.into();
        let value = value.into();

        let mut state = self.shared.state.lock();
        if state.closed {
            trace!(key = %key, "Write to closed cache dropped");
            return;
        }

        state.store.insert(key, Entry::new(value, Instant::now(), ttl));

        if !state.sweeper_running {
            state.sweeper_running = true;
            spawn_sweeper(
                &self.runtime,
                Sweeper::new(
                    Arc::downgrade(&self.shared),
                    Arc::clone(&self.shared.wake),
                    self.sweep_interval,
                    self.strategy,
                ),
            );
        }
    }

    // == Time To Live ==
    /// Returns the time left before `key` expires, or None if it is missing
    /// or already expired. An expired entry is removed as a side effect.
    ///
    /// At exactly the deadline the entry is still live and reports zero.
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        self.ttl_at(key, Instant::now())
    }

    /// Same as [`ttl`](Self::ttl), judging expiry as of `now`.
    pub(crate) fn ttl_at(&self, key: &str, now: Instant) -> Option<Duration> {
        let mut guard = self.shared.state.lock();
        let state = &mut *guard;

        let entry = state.store.get(key)?;
        if !is_expired(now, entry) {
            return Some(entry.remaining(now));
        }
        state.store.remove(key);
        state.stats.record_expired_on_read();
        trace!(key = %key, "Entry expired on ttl lookup");
        None
    }

    // == Remove ==
    /// Removes `key`, returning its value if it had not expired.
    pub fn remove(&self, key: &str) -> Option<Arc<V>> {
        let mut state = self.shared.state.lock();
        let entry = state.store.remove(key)?;
        (!is_expired(Instant::now(), &entry)).then_some(entry.value)
    }

    // == Length ==
    /// Returns the number of stored entries, including expired entries the
    /// sweeper has not reached yet.
    pub fn len(&self) -> usize {
        self.shared.state.lock().store.len()
    }

    // == Is Empty ==
    /// Returns true if no entries are stored.
    pub fn is_empty(&self) -> bool {
        self.shared.state.lock().store.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn sweeper_running(&self) -> bool {
        self.shared.state.lock().sweeper_running
    }

    /// Returns true once `close` has succeeded.
    pub fn is_closed(&self) -> bool {
        self.shared.state.lock().closed
    }

    // == Stats ==
    /// Returns a snapshot of the cache statistics.
    pub fn stats(&self) -> CacheStats {
        let state = self.shared.state.lock();
        let mut stats = state.stats.clone();
        stats.set_total_entries(state.store.len());
        stats
    }

    // == Close ==
    /// Closes the cache: drops every entry, rejects later writes and wakes
    /// the sweeper so it can exit.
    ///
    /// Returns [`CacheError::AlreadyClosed`] if the cache was already closed.
    pub fn close(&self) -> Result<()> {
        let mut state = self.shared.state.lock();
        if state.closed {
            debug!("Close called on a closed cache");
            return Err(CacheError::AlreadyClosed);
        }

        state.closed = true;
        let dropped = state.store.len();
        state.store = EntryStore::new();
        if state.sweeper_running {
            self.shared.wake.notify_waiters();
        }

        info!(dropped, "Cache closed");
        Ok(())
    }
}

impl<V: Send + Sync + 'static> Default for Cache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> std::fmt::Debug for Cache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.shared.state.lock();
        f.debug_struct("Cache")
            .field("len", &state.store.len())
            .field("closed", &state.closed)
            .field("sweeper_running", &state.sweeper_running)
            .field("sweep_interval", &self.sweep_interval)
            .field("strategy", &self.strategy)
            .finish()
    }
}

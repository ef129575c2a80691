//! Expiration Sweeper Task
//!
//! Background task that periodically runs the cache's expiration strategy.
//! One sweeper exists per cache while it holds entries; it exits once it
//! finds the cache empty, closed or dropped.

use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::cache::strategy::Pass;
use crate::cache::ttl_cache::Shared;
use crate::cache::ExpireStrategy;

/// Outcome of one locked step of a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    /// Release the lock, yield, then run another pass
    Continue,
    /// Sweep finished, wait for the next tick
    Finished,
    /// Cache is empty, closed or gone; the sweeper exits
    Stop,
}

/// Periodic active expiration for one cache.
pub(crate) struct Sweeper<V> {
    shared: Weak<Shared<V>>,
    wake: Arc<Notify>,
    interval: Duration,
    strategy: ExpireStrategy,
}

impl<V: Send + Sync + 'static> Sweeper<V> {
    pub(crate) fn new(
        shared: Weak<Shared<V>>,
        wake: Arc<Notify>,
        interval: Duration,
        strategy: ExpireStrategy,
    ) -> Self {
        Self {
            shared,
            wake,
            interval,
            strategy,
        }
    }

    /// Runs until the cache is empty, closed or dropped.
    ///
    /// Each round waits for either the interval to elapse or a wake signal,
    /// sweeps, and re-arms the timer for a full interval.
    pub(crate) async fn run(self) {
        debug!(
            interval_ms = self.interval.as_millis() as u64,
            "Sweeper started"
        );

        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = self.wake.notified() => {
                    trace!("Sweeper woken early");
                }
            }

            if !self.sweep().await {
                break;
            }
        }

        debug!("Sweeper stopped");
    }

    /// Runs one sweep, yielding between batches. Returns false when the
    /// sweeper should exit.
    async fn sweep(&self) -> bool {
        let mut first = true;
        loop {
            match self.locked_step(first) {
                Step::Continue => tokio::task::yield_now().await,
                Step::Finished => return true,
                Step::Stop => return false,
            }
            first = false;
        }
    }

    /// Takes the cache lock for a single strategy pass.
    fn locked_step(&self, first: bool) -> Step {
        let Some(shared) = self.shared.upgrade() else {
            return Step::Stop;
        };
        let mut guard = shared.state.lock();
        let state = &mut *guard;

        if state.closed || (first && state.store.is_empty()) {
            state.sweeper_running = false;
            return Step::Stop;
        }

        if first {
            state.stats.record_sweep();
        }
        let pass = self.strategy.run_pass(&mut state.store, first);
        let (removed, step) = match pass {
            Pass::Done { removed } => (removed, Step::Finished),
            Pass::Again { removed } => (removed, Step::Continue),
        };
        state.stats.record_swept(removed);

        if removed > 0 {
            debug!(
                removed,
                remaining = state.store.len(),
                "Sweeper removed expired entries"
            );
        } else {
            trace!(remaining = state.store.len(), "Sweeper found no expired entries");
        }
        step
    }
}

/// Spawns `sweeper` on `runtime`.
///
/// The returned handle is only needed by callers that want to await the
/// sweeper's exit; dropping it leaves the task running.
pub(crate) fn spawn_sweeper<V: Send + Sync + 'static>(
    runtime: &Handle,
    sweeper: Sweeper<V>,
) -> JoinHandle<()> {
    runtime.spawn(sweeper.run())
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    use crate::cache::ttl_cache::CacheState;
    use crate::cache::{CacheStats, EntryStore};
    use crate::{Cache, CacheConfig};

    fn cache_with(strategy: ExpireStrategy, interval_ms: u64) -> Cache<usize> {
        Cache::with_config(
            CacheConfig::default()
                .with_sweep_interval(Duration::from_millis(interval_ms))
                .with_strategy(strategy),
        )
    }

    /// Shared state with a sweeper marked as running, holding no entries.
    fn bare_shared() -> Arc<Shared<usize>> {
        Arc::new(Shared {
            state: Mutex::new(CacheState {
                store: EntryStore::new(),
                stats: CacheStats::new(),
                closed: false,
                sweeper_running: true,
            }),
            wake: Arc::new(Notify::new()),
        })
    }

    fn spawn_for(shared: &Arc<Shared<usize>>, interval: Duration) -> JoinHandle<()> {
        spawn_sweeper(
            &Handle::current(),
            Sweeper::new(
                Arc::downgrade(shared),
                Arc::clone(&shared.wake),
                interval,
                ExpireStrategy::all(),
            ),
        )
    }

    #[tokio::test]
    async fn test_sweeper_removes_expired_entries() {
        let cache = cache_with(ExpireStrategy::all(), 50);

        cache.set_ex("expire_soon", 1usize, Duration::from_millis(10));
        cache.set_ex("long_lived", 2usize, Duration::from_secs(3600));

        // Wait for the entry to expire and a sweep to run
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert_eq!(cache.len(), 1, "Expired entry should have been swept");
        assert_eq!(cache.get("long_lived").as_deref(), Some(&2));
    }

    #[tokio::test]
    async fn test_sweeper_preserves_valid_entries() {
        let cache = cache_with(ExpireStrategy::default(), 20);

        for i in 0..10usize {
            cache.set_ex(format!("key{i}"), i, Duration::from_secs(3600));
        }

        tokio::time::sleep(Duration::from_millis(150)).await;

        assert_eq!(cache.len(), 10);
        assert!(cache.stats().sweeps >= 1);
        assert_eq!(cache.stats().expired_by_sweep, 0);
    }

    #[tokio::test]
    async fn test_partial_sweep_clears_large_expired_table() {
        let cache = cache_with(ExpireStrategy::partial(10, 0.5), 20);

        for i in 0..100usize {
            let ttl = if i < 60 {
                Duration::from_millis(5)
            } else {
                Duration::from_secs(3600)
            };
            cache.set_ex(format!("key{i}"), i, ttl);
        }

        tokio::time::sleep(Duration::from_millis(500)).await;

        assert_eq!(cache.len(), 40);
        assert_eq!(cache.stats().expired_by_sweep, 60);
        for i in 60..100 {
            assert!(cache.get(&format!("key{i}")).is_some(), "key{i} should survive");
        }
    }

    #[tokio::test]
    async fn test_sweeper_stops_on_empty_store() {
        let shared = bare_shared();
        let handle = spawn_for(&shared, Duration::from_millis(10));

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("sweeper should exit on an empty store")
            .unwrap();
        assert!(!shared.state.lock().sweeper_running);
    }

    #[tokio::test]
    async fn test_sweeper_exits_when_woken_after_close() {
        let shared = bare_shared();
        let handle = spawn_for(&shared, Duration::from_secs(3600));

        // Let the sweeper reach its wait before closing
        tokio::time::sleep(Duration::from_millis(20)).await;
        shared.state.lock().closed = true;
        shared.wake.notify_waiters();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("wake should end the sweeper promptly")
            .unwrap();
        assert!(!shared.state.lock().sweeper_running);
    }

    #[tokio::test]
    async fn test_sweeper_exits_when_cache_dropped() {
        let shared = bare_shared();
        let handle = spawn_for(&shared, Duration::from_secs(3600));

        tokio::time::sleep(Duration::from_millis(20)).await;
        drop(shared);

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("dropping the last handle should end the sweeper")
            .unwrap();
    }

    /// Loads `count` entries that are all expired by the first sweep.
    fn cache_full_of_stale(count: usize) -> Cache<usize> {
        let cache = cache_with(ExpireStrategy::partial(100, 0.5), 20);
        for i in 0..count {
            cache.set_ex(format!("key{i}"), i, Duration::from_millis(1));
        }
        cache
    }

    #[tokio::test]
    async fn test_partial_sweep_releases_lock_between_batches() {
        const TOTAL: usize = 20_000;
        let cache = cache_full_of_stale(TOTAL);

        // Runs alongside the sweeper, taking the lock between its batches
        let watcher = {
            let cache = cache.clone();
            tokio::spawn(async move {
                let mut seen = Vec::new();
                loop {
                    let len = cache.len();
                    if seen.last() != Some(&len) {
                        seen.push(len);
                    }
                    if len == 0 {
                        return seen;
                    }
                    tokio::task::yield_now().await;
                }
            })
        };

        let seen = tokio::time::timeout(Duration::from_secs(10), watcher)
            .await
            .expect("sweeper should drain the store")
            .unwrap();

        let intermediate: Vec<usize> =
            seen.iter().copied().filter(|&len| len > 0 && len < TOTAL).collect();
        assert!(
            intermediate.len() >= 100,
            "only {} intermediate lengths observed",
            intermediate.len()
        );
        // The lock is never released in the middle of a batch
        assert!(intermediate.iter().all(|len| len % 100 == 0));
        assert_eq!(cache.stats().expired_by_sweep, TOTAL as u64);
    }

    #[tokio::test]
    async fn test_close_between_batches_stops_sweep() {
        const TOTAL: usize = 20_000;
        let cache = cache_full_of_stale(TOTAL);

        let closer = {
            let cache = cache.clone();
            tokio::spawn(async move {
                loop {
                    let len = cache.len();
                    if len > 0 && len < TOTAL {
                        cache.close().unwrap();
                        return len;
                    }
                    tokio::task::yield_now().await;
                }
            })
        };

        let closed_at = tokio::time::timeout(Duration::from_secs(10), closer)
            .await
            .expect("sweep should start")
            .unwrap();
        tokio::time::timeout(Duration::from_secs(1), async {
            while cache.sweeper_running() {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("sweeper should stop after close");

        assert!(cache.is_closed());
        assert_eq!(cache.len(), 0);
        // No batch ran after the close
        assert_eq!(cache.stats().expired_by_sweep, (TOTAL - closed_at) as u64);
    }
}

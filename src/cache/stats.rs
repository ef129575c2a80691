//! Cache Statistics Module
//!
//! Tracks lookup outcomes and how entries left the cache.

use serde::Serialize;

// == Cache Stats ==
/// Tracks cache metrics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Number of lookups that returned a value
    pub hits: u64,
    /// Number of lookups that found nothing (missing or expired)
    pub misses: u64,
    /// Entries removed because a read found them expired
    pub expired_on_read: u64,
    /// Entries removed by the background sweeper
    pub expired_by_sweep: u64,
    /// Sweeps started by the background sweeper
    pub sweeps: u64,
    /// Current number of entries in the cache
    pub total_entries: usize,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    // == Record Hit ==
    /// Increments the hit counter.
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    // == Record Miss ==
    /// Increments the miss counter.
    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    /// Counts an entry that a read found expired and removed.
    pub fn record_expired_on_read(&mut self) {
        self.expired_on_read += 1;
    }

    /// Counts the start of a sweeper pass.
    pub fn record_sweep(&mut self) {
        self.sweeps += 1;
    }

    /// Counts entries removed by the sweeper.
    pub fn record_swept(&mut self, removed: usize) {
        self.expired_by_sweep += removed as u64;
    }

    // == Update Entry Count ==
    /// Updates the total entries count.
    pub fn set_total_entries(&mut self, count: usize) {
        self.total_entries = count;
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_new() {
        let stats = CacheStats::new();
        assert_eq!(stats, CacheStats::default());
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.sweeps, 0);
    }

    #[test]
    fn test_hit_rate_no_requests() {
        assert_eq!(CacheStats::new().hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        let mut stats = CacheStats::new();
        stats.record_hit();
        stats.record_hit();
        stats.record_hit();
        stats.record_miss();
        assert_eq!(stats.hit_rate(), 0.75);
    }

    #[test]
    fn test_expired_on_read() {
        let mut stats = CacheStats::new();
        stats.record_expired_on_read();
        assert_eq!(stats.expired_on_read, 1);
        assert_eq!(stats.misses, 0);
    }

    #[test]
    fn test_record_sweep() {
        let mut stats = CacheStats::new();
        stats.record_sweep();
        stats.record_swept(2);
        stats.record_swept(1);
        stats.record_sweep();
        assert_eq!(stats.sweeps, 2);
        assert_eq!(stats.expired_by_sweep, 3);
    }

    #[test]
    fn test_stats_serialize() {
        let mut stats = CacheStats::new();
        stats.record_hit();
        stats.set_total_entries(42);

        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["hits"], 1);
        assert_eq!(json["total_entries"], 42);
        assert_eq!(json["expired_by_sweep"], 0);
    }
}

//! Configuration Module
//!
//! Construction-time options for a cache: sweep interval, expiration
//! strategy and initial capacity. Values can be set with builder methods or
//! loaded from environment variables.

use std::env;
use std::time::Duration;

use crate::cache::{ExpireStrategy, DEFAULT_BATCH_SIZE, DEFAULT_CONTINUE_RATIO};

/// Default time between sweeper passes.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(10);

/// Shortest sweep interval accepted; shorter values are raised to this.
const MIN_SWEEP_INTERVAL: Duration = Duration::from_millis(1);

/// Cache configuration parameters.
///
/// # Example
///
/// ```rust
/// use ephemera::{CacheConfig, ExpireStrategy};
/// use std::time::Duration;
///
/// let config = CacheConfig::default()
///     .with_sweep_interval(Duration::from_secs(1))
///     .with_strategy(ExpireStrategy::partial(500, 0.25))
///     .with_initial_capacity(10_000);
/// assert_eq!(config.sweep_interval, Duration::from_secs(1));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
    /// Time between active expiration passes
    pub sweep_interval: Duration,
    /// Algorithm the sweeper runs on each pass
    pub strategy: ExpireStrategy,
    /// Number of entries to pre-size the store for, 0 = unsized
    pub initial_capacity: usize,
}

impl CacheConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the time between sweeper passes.
    ///
    /// A zero interval is raised to one millisecond.
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval.max(MIN_SWEEP_INTERVAL);
        self
    }

    /// Sets the expiration strategy run by the sweeper.
    pub fn with_strategy(mut self, strategy: ExpireStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Pre-sizes the store for `capacity` entries.
    pub fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `EPHEMERA_SWEEP_INTERVAL_MS` - Sweep interval in milliseconds (default: 10000)
    /// - `EPHEMERA_STRATEGY` - `all` or `partial` (default: partial)
    /// - `EPHEMERA_BATCH_SIZE` - Partial strategy batch size (default: 1000)
    /// - `EPHEMERA_CONTINUE_RATIO` - Partial strategy continue ratio (default: 0.2)
    /// - `EPHEMERA_INITIAL_CAPACITY` - Initial capacity hint (default: 0)
    ///
    /// Missing or unparsable values fall back to their defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds a configuration reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let parsed = |name: &str| -> Option<u64> {
            lookup(name).and_then(|v| v.trim().parse().ok())
        };

        let strategy = match lookup("EPHEMERA_STRATEGY").as_deref().map(str::trim) {
            Some(s) if s.eq_ignore_ascii_case("all") => ExpireStrategy::all(),
            _ => ExpireStrategy::partial(
                parsed("EPHEMERA_BATCH_SIZE")
                    .map(|v| v as usize)
                    .unwrap_or(DEFAULT_BATCH_SIZE),
                lookup("EPHEMERA_CONTINUE_RATIO")
                    .and_then(|v| v.trim().parse().ok())
                    .unwrap_or(DEFAULT_CONTINUE_RATIO),
            ),
        };

        Self::default()
            .with_sweep_interval(
                parsed("EPHEMERA_SWEEP_INTERVAL_MS")
                    .map(Duration::from_millis)
                    .unwrap_or(DEFAULT_SWEEP_INTERVAL),
            )
            .with_strategy(strategy)
            .with_initial_capacity(
                parsed("EPHEMERA_INITIAL_CAPACITY")
                    .map(|v| v as usize)
                    .unwrap_or(0),
            )
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            strategy: ExpireStrategy::default(),
            initial_capacity: 0,
        }
    }
}

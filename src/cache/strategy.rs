//! Expiration Strategy Module
//!
//! Active expiration algorithms run by the sweeper while it holds the cache
//! lock.

use std::time::Instant;

use crate::cache::store::EntryStore;

/// Batch size of the default partial strategy.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Continue ratio of the default partial strategy.
pub const DEFAULT_CONTINUE_RATIO: f64 = 0.2;

/// Ratio used when a non-positive continue ratio is requested.
const MIN_CONTINUE_RATIO: f64 = 0.01;

// == Expire Strategy ==
/// How the sweeper removes expired entries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExpireStrategy {
    /// Scan every entry on each sweep.
    All,
    /// Scan in bounded batches, releasing the lock between batches.
    Partial(PartialExpiry),
}

/// Parameters of the bounded-batch strategy. Built through
/// [`ExpireStrategy::partial`], which coerces out-of-range values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PartialExpiry {
    batch_size: usize,
    continue_ratio: f64,
}

impl PartialExpiry {
    /// Maximum number of entries examined per batch.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Minimum expired fraction of a batch needed to run another batch.
    pub fn continue_ratio(&self) -> f64 {
        self.continue_ratio
    }
}

/// What the sweeper should do after one locked pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Pass {
    /// The sweep is finished; `removed` entries were expired in this pass.
    Done { removed: usize },
    /// Release the lock, yield, and run another pass.
    Again { removed: usize },
}

impl ExpireStrategy {
    /// Exhaustive strategy.
    pub fn all() -> Self {
        ExpireStrategy::All
    }

    /// Bounded-batch strategy examining at most `batch_size` entries per
    /// batch and continuing while at least `continue_ratio` of a batch was
    /// expired.
    ///
    /// A zero `batch_size` becomes 1. A `continue_ratio` that is not
    /// positive (or NaN) becomes 0.01; values above 1 become 1.
    pub fn partial(batch_size: usize, continue_ratio: f64) -> Self {
        let continue_ratio = if continue_ratio.is_nan() || continue_ratio <= 0.0 {
            MIN_CONTINUE_RATIO
        } else {
            continue_ratio.min(1.0)
        };
        ExpireStrategy::Partial(PartialExpiry {
            batch_size: batch_size.max(1),
            continue_ratio,
        })
    }

    /// Runs one pass over `store`. The caller holds the cache lock.
    ///
    /// `first` marks the opening pass of a sweep: a partial strategy facing a
    /// store no larger than one batch degrades to an exhaustive scan there.
    pub(crate) fn run_pass<V>(&self, store: &mut EntryStore<V>, first: bool) -> Pass {
        self.run_pass_at(store, first, Instant::now())
    }

    /// Same as [`run_pass`](Self::run_pass), judging expiry as of `now`.
    pub(crate) fn run_pass_at<V>(
        &self,
        store: &mut EntryStore<V>,
        first: bool,
        now: Instant,
    ) -> Pass {
        match self {
            ExpireStrategy::All => Pass::Done {
                removed: store.expire_all(now),
            },
            ExpireStrategy::Partial(partial) => {
                if first && store.len() <= partial.batch_size {
                    return Pass::Done {
                        removed: store.expire_all(now),
                    };
                }
                let outcome = store.expire_batch(now, partial.batch_size);
                if outcome.ratio() < partial.continue_ratio {
                    Pass::Done {
                        removed: outcome.expired,
                    }
                } else {
                    Pass::Again {
                        removed: outcome.expired,
                    }
                }
            }
        }
    }
}

impl Default for ExpireStrategy {
    fn default() -> Self {
        Self::partial(DEFAULT_BATCH_SIZE, DEFAULT_CONTINUE_RATIO)
    }
}

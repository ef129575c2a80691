//! Entry Store Module
//!
//! Key to entry mapping backing the cache. Entries live in a dense slot
//! vector indexed by key, which lets the sweeper scan in fixed-size batches
//! from a cursor that persists between batches and sweeps.

use std::collections::HashMap;
use std::time::Instant;

use crate::cache::entry::{is_expired, Entry};

/// A slot in the dense entry vector.
#[derive(Debug)]
struct Slot<V> {
    key: String,
    entry: Entry<V>,
}

// == Entry Store ==
/// Storage for cache entries. Holds no locks of its own; callers serialize
/// access through the cache's mutex.
#[derive(Debug)]
pub struct EntryStore<V> {
    /// Entries in no particular order
    slots: Vec<Slot<V>>,
    /// Key to position in `slots`
    index: HashMap<String, usize>,
    /// Next position the batch scanner will look at
    cursor: usize,
}

/// Result of scanning one batch of the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchOutcome {
    /// Entries examined
    pub scanned: usize,
    /// Entries removed because they had expired
    pub expired: usize,
}

impl BatchOutcome {
    /// Fraction of scanned entries that had expired, 0.0 for an empty batch.
    pub fn ratio(&self) -> f64 {
        if self.scanned == 0 {
            0.0
        } else {
            self.expired as f64 / self.scanned as f64
        }
    }
}

impl<V> EntryStore<V> {
    // == Constructor ==
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty store pre-sized for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
            cursor: 0,
        }
    }

    // == Get ==
    /// Returns the entry stored under `key`.
    pub fn get(&self, key: &str) -> Option<&Entry<V>> {
        self.index.get(key).map(|&pos| &self.slots[pos].entry)
    }

    // == Insert ==
    /// Stores `entry` under `key`, returning the entry it replaced.
    pub fn insert(&mut self, key: String, entry: Entry<V>) -> Option<Entry<V>> {
        if let Some(&pos) = self.index.get(&key) {
            return Some(std::mem::replace(&mut self.slots[pos].entry, entry));
        }
        self.index.insert(key.clone(), self.slots.len());
        self.slots.push(Slot { key, entry });
        None
    }

    // == Remove ==
    /// Removes and returns the entry stored under `key`.
    pub fn remove(&mut self, key: &str) -> Option<Entry<V>> {
        let pos = *self.index.get(key)?;
        Some(self.remove_slot(pos))
    }

    /// Removes the slot at `pos`, moving the last slot into its place.
    fn remove_slot(&mut self, pos: usize) -> Entry<V> {
        let removed = self.slots.swap_remove(pos);
        self.index.remove(&removed.key);
        if let Some(moved) = self.slots.get(pos) {
            if let Some(idx) = self.index.get_mut(&moved.key) {
                *idx = pos;
            }
        }
        removed.entry
    }

    // == Expire All ==
    /// Removes every entry expired as of `now`. Returns how many were removed.
    pub fn expire_all(&mut self, now: Instant) -> usize {
        let mut removed = 0;
        let mut pos = 0;
        while pos < self.slots.len() {
            if is_expired(now, &self.slots[pos].entry) {
                self.remove_slot(pos);
                removed += 1;
            } else {
                pos += 1;
            }
        }
        self.wrap_cursor();
        removed
    }

    // == Expire Batch ==
    /// Examines up to `batch_size` entries starting at the scan cursor,
    /// removing the ones expired as of `now`.
    ///
    /// The cursor wraps around the end of the store and is kept between
    /// calls, so repeated batches eventually visit every entry.
    pub fn expire_batch(&mut self, now: Instant, batch_size: usize) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();
        let budget = batch_size.min(self.slots.len());
        self.wrap_cursor();

        while outcome.scanned < budget && !self.slots.is_empty() {
            if self.cursor >= self.slots.len() {
                self.cursor = 0;
            }
            outcome.scanned += 1;
            if is_expired(now, &self.slots[self.cursor].entry) {
                // The last slot moves into the cursor position and is examined next
                self.remove_slot(self.cursor);
                outcome.expired += 1;
            } else {
                self.cursor += 1;
            }
        }
        self.wrap_cursor();
        outcome
    }

    fn wrap_cursor(&mut self) {
        if self.cursor >= self.slots.len() {
            self.cursor = 0;
        }
    }

    // == Length ==
    /// Returns the number of stored entries, expired or not.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    // == Is Empty ==
    /// Returns true if the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Iterates over stored keys in storage order.
    #[cfg(test)]
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().map(|slot| slot.key.as_str())
    }
}

impl<V> Default for EntryStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

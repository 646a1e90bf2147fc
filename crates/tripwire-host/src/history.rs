//! Bounded, newest-first snapshot history.

use std::collections::VecDeque;

use tripwire_core::Snapshot;

/// A snapshot tagged with the block it was taken at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    pub block: u64,
    pub snapshot: Snapshot,
}

/// Keeps the most recent `capacity` samples, newest first.
#[derive(Debug, Clone)]
pub struct History {
    capacity: usize,
    entries: VecDeque<Sample>,
}

impl History {
    /// Create a history holding at most `capacity` samples (never fewer
    /// than two, the minimum any comparison needs).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(2);
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    /// Record a sample.
    ///
    /// Samples at or above `block` are discarded first, so re-sampling a
    /// block replaces it and a chain rewind drops the abandoned blocks.
    pub fn push(&mut self, block: u64, snapshot: Snapshot) {
        while self.entries.front().is_some_and(|s| s.block >= block) {
            self.entries.pop_front();
        }
        self.entries.push_front(Sample { block, snapshot });
        self.entries.truncate(self.capacity);
    }

    /// Snapshots ordered newest first, ready for the trap.
    pub fn snapshots(&self) -> Vec<Snapshot> {
        self.entries.iter().map(|s| s.snapshot.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sample> {
        self.entries.iter()
    }

    pub fn latest_block(&self) -> Option<u64> {
        self.entries.front().map(|s| s.block)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

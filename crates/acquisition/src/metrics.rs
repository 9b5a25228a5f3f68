//! Buffer counters

use std::sync::atomic::{AtomicU64, Ordering};

/// Shared buffer counters
///
/// Updated by the buffer after each insert/drain, readable without taking
/// the buffer lock.
#[derive(Debug, Default)]
pub struct BufferCounters {
    /// Records accepted into the buffer
    pub inserted_records: AtomicU64,

    /// Batches rejected because the buffer was full
    pub dropped_batches: AtomicU64,

    /// Records contained in rejected batches
    pub dropped_records: AtomicU64,

    /// Records handed out by drain
    pub drained_records: AtomicU64,

    /// Number of drain calls
    pub drain_calls: AtomicU64,
}

impl BufferCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_inserted(&self, records: usize) {
        self.inserted_records
            .fetch_add(records as u64, Ordering::Relaxed);
    }

    pub fn record_dropped(&self, records: usize) {
        self.dropped_batches.fetch_add(1, Ordering::Relaxed);
        self.dropped_records
            .fetch_add(records as u64, Ordering::Relaxed);
    }

    pub fn record_drained(&self, records: usize) {
        self.drain_calls.fetch_add(1, Ordering::Relaxed);
        self.drained_records
            .fetch_add(records as u64, Ordering::Relaxed);
    }

    /// Get snapshot (`len` and `max_entries` are filled in by the buffer)
    pub fn snapshot(&self, len: usize, max_entries: usize) -> BufferStats {
        BufferStats {
            len,
            max_entries,
            inserted_records: self.inserted_records.load(Ordering::Relaxed),
            dropped_batches: self.dropped_batches.load(Ordering::Relaxed),
            dropped_records: self.dropped_records.load(Ordering::Relaxed),
            drained_records: self.drained_records.load(Ordering::Relaxed),
            drain_calls: self.drain_calls.load(Ordering::Relaxed),
        }
    }
}

/// Buffer statistics snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BufferStats {
    /// Entries currently held
    pub len: usize,

    /// Capacity
    pub max_entries: usize,

    pub inserted_records: u64,
    pub dropped_batches: u64,
    pub dropped_records: u64,
    pub drained_records: u64,
    pub drain_calls: u64,
}

impl BufferStats {
    /// Fraction of produced records lost to backpressure, in percent
    pub fn drop_rate(&self) -> f64 {
        let total = self.inserted_records + self.dropped_records;
        if total > 0 {
            self.dropped_records as f64 / total as f64 * 100.0
        } else {
            0.0
        }
    }
}

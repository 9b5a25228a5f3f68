//! Shared bounded record buffer.
//!
//! Multi-map of timestamp → records, insertion order preserved among equal
//! timestamps. All workers insert into it and the controller drains the
//! oldest half. The lock is held only for the duration of one insert or
//! one drain, never across a poll cycle.

use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use contracts::{Record, Timestamp};

use crate::metrics::{BufferCounters, BufferStats};

/// Result of `insert_batch`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// Batch was empty, nothing to do
    Empty,
    /// Whole batch inserted
    Inserted { records: usize, len: usize },
    /// Whole batch discarded because it would exceed the cap
    Dropped { records: usize, len: usize },
}

#[derive(Debug, Default)]
struct BufferState {
    entries: BTreeMap<Timestamp, VecDeque<Record>>,
    len: usize,
}

/// Bounded, thread-safe record buffer
///
/// Backpressure keeps old data: a batch that does not fit is dropped as a
/// whole, existing entries are never evicted. The count therefore never
/// exceeds `max_entries`.
pub struct SharedBuffer {
    state: Mutex<BufferState>,
    max_entries: usize,
    counters: BufferCounters,
}

impl fmt::Debug for SharedBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedBuffer")
            .field("len", &self.len())
            .field("max_entries", &self.max_entries)
            .finish()
    }
}

impl SharedBuffer {
    /// Create an empty buffer holding at most `max_entries` records
    pub fn new(max_entries: usize) -> Self {
        Self {
            state: Mutex::new(BufferState::default()),
            max_entries,
            counters: BufferCounters::new(),
        }
    }

    // Every mutation leaves the state consistent, so a panic in another
    // holder cannot leave a torn entry behind.
    fn lock(&self) -> MutexGuard<'_, BufferState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert all records, or none of them
    pub fn insert_batch(&self, records: Vec<Record>) -> InsertOutcome {
        let batch = records.len();
        if batch == 0 {
            return InsertOutcome::Empty;
        }

        let outcome = {
            let mut state = self.lock();
            if state.len + batch > self.max_entries {
                InsertOutcome::Dropped {
                    records: batch,
                    len: state.len,
                }
            } else {
                for record in records {
                    state
                        .entries
                        .entry(record.timestamp())
                        .or_default()
                        .push_back(record);
                }
                state.len += batch;
                InsertOutcome::Inserted {
                    records: batch,
                    len: state.len,
                }
            }
        };

        match outcome {
            InsertOutcome::Inserted { records, .. } => self.counters.record_inserted(records),
            InsertOutcome::Dropped { records, .. } => self.counters.record_dropped(records),
            InsertOutcome::Empty => {}
        }
        outcome
    }

    /// Remove and return the oldest `floor(len / 2)` entries
    ///
    /// Entries come out ordered by timestamp, ties in insertion order.
    pub fn drain_oldest_half(&self) -> Vec<(Timestamp, Record)> {
        let drained = {
            let mut state = self.lock();
            let half = state.len / 2;
            let mut drained = Vec::with_capacity(half);

            while drained.len() < half {
                let Some(mut oldest) = state.entries.first_entry() else {
                    break;
                };
                let wanted = half - drained.len();
                let timestamp = *oldest.key();

                if oldest.get().len() <= wanted {
                    drained.extend(oldest.remove().into_iter().map(|r| (timestamp, r)));
                } else {
                    drained.extend(oldest.get_mut().drain(..wanted).map(|r| (timestamp, r)));
                }
            }

            state.len -= drained.len();
            drained
        };

        self.counters.record_drained(drained.len());
        drained
    }

    pub fn len(&self) -> usize {
        self.lock().len
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// Counter snapshot
    pub fn stats(&self) -> BufferStats {
        self.counters.snapshot(self.len(), self.max_entries)
    }
}

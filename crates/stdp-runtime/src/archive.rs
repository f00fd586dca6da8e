// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Access-counted post-synaptic spike archive
//!
//! One archive per post-synaptic target, shared by every event-driven
//! connection fanning into it.
//!
//! ## Retention
//!
//! Each entry counts how many registered readers have consumed it. When a new
//! spike is recorded, entries at the front that every reader has consumed are
//! dropped. Registering a reader marks everything up to its first read time as
//! already consumed by it, so old entries are not kept alive for its sake.
//! Without registered readers nothing is pruned.
//!
//! ## Concurrency
//!
//! Cursors hold a shared read lock and bump the per-entry counters atomically,
//! so any number of connections can replay the history at once. Recording a
//! spike takes the write lock.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::{RwLock, RwLockReadGuard};
use stdp_plasticity::{HistoryEntry, InvariantViolation, SpikeHistory};
use tracing::{debug, error, trace};

/// Tolerance when comparing spike times against slice bounds (ms)
pub const HISTORY_EPS_MS: f64 = 1e-6;

#[derive(Debug)]
struct ArchivedSpike {
    t: f64,
    access_counter: AtomicUsize,
}

#[derive(Debug, Default)]
pub struct SpikeArchive {
    history: RwLock<VecDeque<ArchivedSpike>>,
    readers: AtomicUsize,
}

impl SpikeArchive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered readers
    pub fn readers(&self) -> usize {
        self.readers.load(Ordering::Acquire)
    }

    /// Number of retained spikes
    pub fn len(&self) -> usize {
        self.history.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.read().is_empty()
    }

    /// Retained spike times, oldest first
    pub fn times(&self) -> Vec<f64> {
        self.history.read().iter().map(|spike| spike.t).collect()
    }

    pub fn last_spike(&self) -> Option<f64> {
        self.history.read().back().map(|spike| spike.t)
    }

    /// Append a post-synaptic spike at `t` ms, pruning fully consumed entries
    pub fn record_spike(&self, t: f64) -> Result<(), InvariantViolation> {
        let mut history = self.history.write();
        if let Some(last) = history.back() {
            if t < last.t {
                error!(previous = last.t, current = t, "Post-synaptic spike recorded out of order");
                return Err(InvariantViolation::NonMonotonicHistory {
                    previous: last.t,
                    current: t,
                });
            }
        }

        let readers = self.readers();
        if readers > 0 {
            let before = history.len();
            while history
                .front()
                .is_some_and(|spike| spike.access_counter.load(Ordering::Acquire) >= readers)
            {
                history.pop_front();
            }
            let pruned = before - history.len();
            if pruned > 0 {
                trace!(pruned, retained = history.len(), "Pruned spike archive");
            }
        }

        history.push_back(ArchivedSpike {
            t,
            access_counter: AtomicUsize::new(0),
        });
        Ok(())
    }

    /// Forget every spike; registered readers stay registered
    pub fn clear(&self) {
        self.history.write().clear();
    }
}

/// Lazy cursor over one slice of a [`SpikeArchive`]
///
/// Holds the archive's read lock until dropped. Every entry yielded counts as
/// one access.
pub struct HistoryCursor<'a> {
    history: RwLockReadGuard<'a, VecDeque<ArchivedSpike>>,
    next: usize,
    end: usize,
}

impl Iterator for HistoryCursor<'_> {
    type Item = HistoryEntry;

    fn next(&mut self) -> Option<HistoryEntry> {
        if self.next >= self.end {
            return None;
        }
        let spike = &self.history[self.next];
        self.next += 1;
        let access_counter = spike.access_counter.fetch_add(1, Ordering::AcqRel) + 1;
        Some(HistoryEntry {
            t: spike.t,
            access_counter,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.end.saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl SpikeHistory for SpikeArchive {
    type Cursor<'a> = HistoryCursor<'a>;

    fn history_slice(&self, t1: f64, t2: f64) -> HistoryCursor<'_> {
        let history = self.history.read();
        let start = history.partition_point(|spike| spike.t - HISTORY_EPS_MS <= t1);
        let end = history
            .partition_point(|spike| spike.t - HISTORY_EPS_MS <= t2)
            .max(start);
        HistoryCursor {
            history,
            next: start,
            end,
        }
    }

    fn register_connection(&self, t_first_read: f64) {
        let history = self.history.read();
        let mut marked = 0usize;
        for spike in history
            .iter()
            .take_while(|spike| t_first_read - spike.t > -HISTORY_EPS_MS)
        {
            spike.access_counter.fetch_add(1, Ordering::AcqRel);
            marked += 1;
        }
        let readers = self.readers.fetch_add(1, Ordering::AcqRel) + 1;
        debug!(t_first_read, readers, marked, "Registered spike archive reader");
    }
}

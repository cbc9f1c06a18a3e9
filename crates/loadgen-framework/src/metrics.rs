//! Run counters shared across governors, workers, and the output stage.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Shared counters for one run. Cloning shares the underlying counters.
#[derive(Debug, Clone, Default)]
pub struct RunMetrics {
    rounds: Arc<AtomicU64>,
    backfill_items: Arc<AtomicU64>,
    items_dispatched: Arc<AtomicU64>,
    items_dropped: Arc<AtomicU64>,
    deferrals: Arc<AtomicU64>,
    batches_written: Arc<AtomicU64>,
    events_written: Arc<AtomicU64>,
    bytes_written: Arc<AtomicU64>,
}

/// Point-in-time copy of the run counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub rounds: u64,
    pub backfill_items: u64,
    pub items_dispatched: u64,
    pub items_dropped: u64,
    pub deferrals: u64,
    pub batches_written: u64,
    pub events_written: u64,
    pub bytes_written: u64,
}

impl RunMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_round(&self) {
        self.rounds.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_backfill_item(&self) {
        self.backfill_items.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_dispatched(&self) {
        self.items_dispatched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_deferral(&self) {
        self.deferrals.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_batch(&self, events: u64, bytes: u64) {
        self.batches_written.fetch_add(1, Ordering::Relaxed);
        self.events_written.fetch_add(events, Ordering::Relaxed);
        self.bytes_written.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Shared drop counter handed to the bounded queues.
    pub fn dropped_handle(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.items_dropped)
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            rounds: self.rounds.load(Ordering::Relaxed),
            backfill_items: self.backfill_items.load(Ordering::Relaxed),
            items_dispatched: self.items_dispatched.load(Ordering::Relaxed),
            items_dropped: self.items_dropped.load(Ordering::Relaxed),
            deferrals: self.deferrals.load(Ordering::Relaxed),
            batches_written: self.batches_written.load(Ordering::Relaxed),
            events_written: self.events_written.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
        }
    }
}

impl MetricsSnapshot {
    /// Human-readable summary of the run.
    pub fn summary(&self) -> String {
        format!(
            "Rounds: {} ({} backfill items)\n\
             Dispatched: {} work items ({} dropped, {} deferrals)\n\
             Output: {} batches, {} events, {} bytes",
            self.rounds,
            self.backfill_items,
            self.items_dispatched,
            self.items_dropped,
            self.deferrals,
            self.batches_written,
            self.events_written,
            self.bytes_written,
        )
    }
}

//! Scheduler statistics.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use serde::{Deserialize, Serialize};

/// Statistics about scheduler utilization and outcomes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerStats {
    /// Number of armed or disposed triggers.
    pub trigger_count: usize,
    /// Admission capacity (concurrent work invocations allowed).
    pub capacity: usize,
    /// Admission units currently free.
    pub available_permits: usize,
    /// Firings waiting for admission right now. At most one per trigger.
    pub waiting: usize,
    /// Work invocations executing right now.
    pub running: usize,
    /// Highest number of simultaneously executing work invocations observed.
    pub peak_running: usize,
    /// Trigger firings dispatched.
    pub firings: u64,
    /// Firings granted an admission unit.
    pub admitted: u64,
    /// Work invocations that returned `Ok`.
    pub completed: u64,
    /// Work invocations that returned an error or panicked.
    pub failed: u64,
    /// Firings dropped before work because the scheduler stopped.
    pub abandoned: u64,
    /// Firings skipped because the previous firing of the task was still in flight.
    pub skipped_overlap: u64,
    /// Ticks skipped because the dispatcher fell behind.
    pub missed_ticks: u64,
    /// Ticks folded into a firing of the same task already waiting for admission.
    pub coalesced: u64,
}


/// Internal counters for scheduler statistics (thread-safe).
#[derive(Debug, Default)]
pub(crate) struct SchedulerCounters {
    pub firings: AtomicU64,
    pub admitted: AtomicU64,
    pub completed: AtomicU64,
    pub failed: AtomicU64,
    pub abandoned: AtomicU64,
    pub skipped_overlap: AtomicU64,
    pub missed_ticks: AtomicU64,
    pub coalesced: AtomicU64,
    pub waiting: AtomicUsize,
    pub running: AtomicUsize,
    pub peak_running: AtomicUsize,
}

impl SchedulerCounters {
    /// Mark one work invocation as started, tracking the peak.
    pub fn enter_running(&self) {
        let now = self.running.fetch_add(1, Ordering::AcqRel) + 1;
        self.peak_running.fetch_max(now, Ordering::AcqRel);
    }

    /// Mark one work invocation as finished.
    pub fn exit_running(&self) {
        self.running.fetch_sub(1, Ordering::AcqRel);
    }

    /// Get a snapshot of current statistics.
    pub fn snapshot(
        &self,
        trigger_count: usize,
        capacity: usize,
        available_permits: usize,
    ) -> SchedulerStats {
        SchedulerStats {
            trigger_count,
            capacity,
            available_permits,
            waiting: self.waiting.load(Ordering::Acquire),
            running: self.running.load(Ordering::Acquire),
            peak_running: self.peak_running.load(Ordering::Acquire),
            firings: self.firings.load(Ordering::Relaxed),
            admitted: self.admitted.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            abandoned: self.abandoned.load(Ordering::Relaxed),
            skipped_overlap: self.skipped_overlap.load(Ordering::Relaxed),
            missed_ticks: self.missed_ticks.load(Ordering::Relaxed),
            coalesced: self.coalesced.load(Ordering::Relaxed),
        }
    }
}

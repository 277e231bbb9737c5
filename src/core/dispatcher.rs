//! Single coordinating loop that fires every trigger.
//!
//! Instead of one timer per task, a min-heap keyed by next-fire time is serviced
//! by one async loop. Each due trigger gets its execution wrapper spawned and is
//! pushed back at `deadline + effective_period`, so cadence is anchored to when
//! the trigger was armed and never to when its work finished.
//!
//! If the loop falls behind by more than a period, the missed ticks are skipped
//! (phase is preserved) rather than fired in a burst. A tick for a trigger whose
//! previous firing is still waiting for admission is coalesced without spawning.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::core::execution::{run_firing, ExecutionContext};
use crate::core::trigger::TriggerHandle;
use crate::runtime::Spawn;

/// Heap entry. Ordered by deadline, ties broken by insertion sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Deadline {
    at: Instant,
    seq: u64,
    index: usize,
}

/// Time-ordered schedule of trigger deadlines.
#[derive(Debug, Default)]
pub(crate) struct Timeline {
    heap: BinaryHeap<Reverse<Deadline>>,
    seq: u64,
}

impl Timeline {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            heap: BinaryHeap::with_capacity(capacity),
            seq: 0,
        }
    }

    pub fn push(&mut self, at: Instant, index: usize) {
        self.seq = self.seq.wrapping_add(1);
        self.heap.push(Reverse(Deadline {
            at,
            seq: self.seq,
            index,
        }));
    }

    /// Earliest deadline, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.heap.peek().map(|Reverse(d)| d.at)
    }

    /// Pop the earliest entry if it is due at `now`.
    pub fn pop_due(&mut self, now: Instant) -> Option<(Instant, usize)> {
        if self.next_deadline()? > now {
            return None;
        }
        self.heap.pop().map(|Reverse(d)| (d.at, d.index))
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }
}

/// Next deadline after `fired_at`, skipping whole periods already in the past.
///
/// Returns the deadline and the number of ticks skipped.
pub(crate) fn next_deadline(fired_at: Instant, period: Duration, now: Instant) -> (Instant, u64) {
    let next = fired_at + period;
    if next > now {
        return (next, 0);
    }
    let behind = now.saturating_duration_since(next).as_nanos();
    let missed = behind / period.as_nanos().max(1) + 1;
    let skipped = u32::try_from(missed)
        .ok()
        .and_then(|m| period.checked_mul(m))
        .map_or(now + period, |skip| next + skip);
    (skipped, u64::try_from(missed).unwrap_or(u64::MAX))
}

/// Resolves once shutdown has been signalled or the scheduler is gone.
async fn shutdown_requested(rx: &mut watch::Receiver<bool>) {
    let _ = rx.wait_for(|stopped| *stopped).await;
}

/// Drive all triggers until shutdown or until every trigger is disposed.
///
/// Triggers must already be armed; `anchor + phase_offset` is each first deadline.
pub(crate) async fn run<S>(
    triggers: Vec<Arc<TriggerHandle>>,
    anchor: Instant,
    ctx: ExecutionContext,
    spawner: S,
) where
    S: Spawn + Send + 'static,
{
    let mut timeline = Timeline::with_capacity(triggers.len());
    for (index, trigger) in triggers.iter().enumerate() {
        if !trigger.is_disposed() {
            timeline.push(anchor + trigger.phase_offset(), index);
        }
    }
    debug!(entries = timeline.len(), "dispatcher running");

    let mut shutdown = ctx.shutdown.clone();
    while let Some(at) = timeline.next_deadline() {
        tokio::select! {
            biased;
            () = shutdown_requested(&mut shutdown) => break,
            () = tokio::time::sleep_until(at) => {}
        }

        let now = Instant::now();
        while let Some((fired_at, index)) = timeline.pop_due(now) {
            let trigger = &triggers[index];
            if trigger.is_disposed() {
                continue;
            }
            if trigger.is_waiting() {
                ctx.counters.coalesced.fetch_add(1, Ordering::Relaxed);
                ctx.counters.firings.fetch_add(1, Ordering::Relaxed);
            } else {
                spawner.spawn(run_firing(ctx.clone(), Arc::clone(trigger)));
            }

            let (next, missed) = next_deadline(fired_at, trigger.effective_period(), now);
            if missed > 0 {
                ctx.counters.missed_ticks.fetch_add(missed, Ordering::Relaxed);
                debug!(task_id = trigger.task_id(), missed, "dispatcher behind, skipping ticks");
            }
            timeline.push(next, index);
        }
    }

    info!("dispatcher stopped");
}

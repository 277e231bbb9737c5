//! Execution wrapper invoked for every trigger firing.
//!
//! Per firing: draw a settle delay, wait for admission, sleep the delay, run the
//! task's blocking work on the blocking pool, sleep the same delay again, then
//! give the admission unit back. The unit is owned by an [`AdmissionPermit`]
//! that travels into the blocking closure and back out, so it is returned on
//! every path: success, error, panic, shutdown, or the runtime dropping us.
//!
//! Only one firing per task waits for admission at a time. A tick arriving while
//! that slot is taken is coalesced into the waiting firing and counted, so the
//! number of parked firings never exceeds the number of triggers.
//!
//! Nothing escapes this module. Work errors and panics become `Failed` events.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, error, warn};

use crate::core::degradation::settle_delay;
use crate::core::events::{build_event, EventKind, EventSink};
use crate::core::limiter::AdmissionLimiter;
use crate::core::stats::SchedulerCounters;
use crate::core::trigger::{TriggerHandle, TriggerState};
use crate::util::clock::duration_ms;
use crate::util::random::RandomSource;

/// Shared state every firing needs. Cheap to clone.
#[derive(Clone)]
pub(crate) struct ExecutionContext {
    pub limiter: Arc<AdmissionLimiter>,
    pub random: Arc<dyn RandomSource>,
    pub events: Arc<Mutex<Box<dyn EventSink>>>,
    pub counters: Arc<SchedulerCounters>,
    pub jitter_margin: Duration,
    pub serialize_per_task: bool,
    pub shutdown: watch::Receiver<bool>,
}

/// Decrements the running counter when the work call ends, however it ends.
struct RunningGuard(Arc<SchedulerCounters>);

impl RunningGuard {
    fn enter(counters: &Arc<SchedulerCounters>) -> Self {
        counters.enter_running();
        Self(Arc::clone(counters))
    }
}

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.exit_running();
    }
}

/// Holds the trigger's single waiting-for-admission slot.
struct WaitingGuard {
    counters: Arc<SchedulerCounters>,
    trigger: Arc<TriggerHandle>,
}

impl WaitingGuard {
    fn enter(counters: &Arc<SchedulerCounters>, trigger: &Arc<TriggerHandle>) -> Option<Self> {
        if !trigger.try_enter_waiting() {
            return None;
        }
        counters.waiting.fetch_add(1, Ordering::AcqRel);
        Some(Self {
            counters: Arc::clone(counters),
            trigger: Arc::clone(trigger),
        })
    }
}

impl Drop for WaitingGuard {
    fn drop(&mut self) {
        self.counters.waiting.fetch_sub(1, Ordering::AcqRel);
        self.trigger.leave_waiting();
    }
}

/// Unregisters the firing from its trigger, re-arming it if it was the last.
struct ActiveGuard(Arc<TriggerHandle>);

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.end_firing();
    }
}

/// Clears the per-task in-flight flag on drop.
struct ClaimGuard(Arc<TriggerHandle>);

impl Drop for ClaimGuard {
    fn drop(&mut self) {
        self.0.release_claim();
    }
}

/// Resolves once shutdown has been signalled or the scheduler is gone.
async fn shutdown_requested(rx: &mut watch::Receiver<bool>) {
    let _ = rx.wait_for(|stopped| *stopped).await;
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string())
}

impl ExecutionContext {
    fn report(&self, trigger: &TriggerHandle, kind: EventKind, detail: Option<String>) {
        self.events
            .lock()
            .record(build_event(trigger.task_id(), kind, detail));
    }

    fn abandon(&self, trigger: &TriggerHandle, stage: &str) {
        self.counters.abandoned.fetch_add(1, Ordering::Relaxed);
        debug!(task_id = trigger.task_id(), stage, "firing abandoned");
        self.report(trigger, EventKind::Abandoned, Some(stage.to_string()));
    }

    fn stopping(&self, trigger: &TriggerHandle) -> bool {
        *self.shutdown.borrow() || trigger.is_disposed()
    }
}

/// Run one firing of `trigger` to completion.
pub(crate) async fn run_firing(ctx: ExecutionContext, trigger: Arc<TriggerHandle>) {
    let task_id = trigger.task_id();
    if trigger.is_disposed() {
        return;
    }

    let _claim = if ctx.serialize_per_task {
        if !trigger.try_claim() {
            ctx.counters.skipped_overlap.fetch_add(1, Ordering::Relaxed);
            ctx.counters.firings.fetch_add(1, Ordering::Relaxed);
            debug!(task_id, "previous firing still in flight, skipping");
            ctx.report(&trigger, EventKind::Skipped, None);
            return;
        }
        Some(ClaimGuard(Arc::clone(&trigger)))
    } else {
        None
    };

    let Some(waiting) = WaitingGuard::enter(&ctx.counters, &trigger) else {
        ctx.counters.coalesced.fetch_add(1, Ordering::Relaxed);
        ctx.counters.firings.fetch_add(1, Ordering::Relaxed);
        return;
    };
    ctx.counters.firings.fetch_add(1, Ordering::Relaxed);

    let generation = trigger.begin_firing();
    let _active = ActiveGuard(Arc::clone(&trigger));
    if !trigger.advance(generation, TriggerState::Firing) {
        ctx.abandon(&trigger, "disposed");
        return;
    }

    let settle = settle_delay(
        ctx.random.as_ref(),
        trigger.effective_period(),
        ctx.jitter_margin,
    );
    let mut shutdown = ctx.shutdown.clone();

    trigger.advance(generation, TriggerState::WaitingForAdmission);
    let permit = tokio::select! {
        biased;
        () = shutdown_requested(&mut shutdown) => {
            ctx.abandon(&trigger, "admission");
            return;
        }
        permit = ctx.limiter.acquire() => match permit {
            Ok(permit) => permit,
            Err(e) => {
                error!(task_id, error = %e, "admission failed");
                ctx.abandon(&trigger, "admission");
                return;
            }
        },
    };
    ctx.counters.admitted.fetch_add(1, Ordering::Relaxed);
    drop(waiting);
    trigger.advance(generation, TriggerState::Running);
    debug!(
        task_id,
        settle_ms = duration_ms(settle),
        available = ctx.limiter.available(),
        "admitted"
    );

    let interrupted = tokio::select! {
        biased;
        () = shutdown_requested(&mut shutdown) => true,
        () = tokio::time::sleep(settle) => false,
    };
    if interrupted || ctx.stopping(&trigger) {
        drop(permit);
        ctx.abandon(&trigger, "pre-delay");
        return;
    }

    // `stop` may land while this closure is queued on the blocking pool, so
    // disposal is checked again right before the work call.
    let counters = Arc::clone(&ctx.counters);
    let handle = Arc::clone(&trigger);
    let joined = tokio::task::spawn_blocking(move || {
        if handle.is_disposed() {
            return (None, permit);
        }
        let _running = RunningGuard::enter(&counters);
        let outcome = catch_unwind(AssertUnwindSafe(|| handle.task().run()));
        (Some(outcome), permit)
    })
    .await;

    let permit = match joined {
        Ok((None, permit)) => {
            drop(permit);
            ctx.abandon(&trigger, "dispatch");
            return;
        }
        Ok((Some(Ok(Ok(()))), permit)) => {
            ctx.counters.completed.fetch_add(1, Ordering::Relaxed);
            ctx.report(&trigger, EventKind::Completed, None);
            permit
        }
        Ok((Some(Ok(Err(e))), permit)) => {
            ctx.counters.failed.fetch_add(1, Ordering::Relaxed);
            warn!(task_id, error = %format!("{e:#}"), "task work failed");
            ctx.report(&trigger, EventKind::Failed, Some(format!("{e:#}")));
            permit
        }
        Ok((Some(Err(payload)), permit)) => {
            let message = panic_message(payload.as_ref());
            ctx.counters.failed.fetch_add(1, Ordering::Relaxed);
            error!(task_id, panic = %message, "task work panicked");
            ctx.report(&trigger, EventKind::Failed, Some(format!("panic: {message}")));
            permit
        }
        Err(e) => {
            // Blocking task cancelled by runtime shutdown; the permit went with it.
            ctx.counters.failed.fetch_add(1, Ordering::Relaxed);
            error!(task_id, error = %e, "blocking work did not complete");
            ctx.report(&trigger, EventKind::Failed, Some(e.to_string()));
            return;
        }
    };

    trigger.advance(generation, TriggerState::CoolingDown);
    tokio::select! {
        biased;
        () = shutdown_requested(&mut shutdown) => {}
        () = tokio::time::sleep(settle) => {}
    }
    drop(permit);
}

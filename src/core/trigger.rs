//! Per-task trigger handles.
//!
//! A trigger records a task's effective period and phase offset and tracks the
//! state of its most recent firing:
//!
//! ```text
//! Idle -> Armed -> Firing -> WaitingForAdmission -> Running -> CoolingDown -> Armed
//! ```
//!
//! `Disposed` is terminal and reachable from every state. The dispatcher stops
//! re-arming a disposed trigger and in-flight firings abandon before work.
//!
//! Firings of one task may overlap once admitted, but at most one may wait for
//! admission at a time; ticks arriving while that slot is taken are coalesced.
//! When firings overlap, the state is written only by the newest one and falls
//! back to `Armed` once the last of them has finished.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::task::{PeriodicTask, TaskId};
use crate::util::clock::duration_ms;

/// Lifecycle state of a trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum TriggerState {
    /// Created, not yet armed.
    Idle = 0,
    /// Waiting for the next firing.
    Armed = 1,
    /// Firing dispatched, jitter being computed.
    Firing = 2,
    /// Blocked on the admission limiter.
    WaitingForAdmission = 3,
    /// Admitted: settling or executing work.
    Running = 4,
    /// Work finished, sleeping the post-delay.
    CoolingDown = 5,
    /// Terminal. No further firings start.
    Disposed = 6,
}

impl TriggerState {
    const fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Idle,
            1 => Self::Armed,
            2 => Self::Firing,
            3 => Self::WaitingForAdmission,
            4 => Self::Running,
            5 => Self::CoolingDown,
            _ => Self::Disposed,
        }
    }
}

/// Serializable view of a trigger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerSnapshot {
    /// Task identifier.
    pub task_id: TaskId,
    /// Nominal interval requested by the task (ms).
    pub nominal_interval_ms: u64,
    /// Interval after degradation (ms).
    pub effective_period_ms: u64,
    /// Delay before the first firing (ms).
    pub phase_offset_ms: u64,
    /// Current state.
    pub state: TriggerState,
}

/// Trigger for one task. Owned by the scheduler.
pub struct TriggerHandle {
    task: Arc<dyn PeriodicTask>,
    task_id: TaskId,
    nominal_interval: Duration,
    effective_period: Duration,
    phase_offset: Duration,
    state: AtomicU8,
    in_flight: AtomicBool,
    waiting: AtomicBool,
    generation: AtomicU64,
    active: AtomicUsize,
}

impl TriggerHandle {
    pub(crate) fn new(
        task: Arc<dyn PeriodicTask>,
        effective_period: Duration,
        phase_offset: Duration,
    ) -> Self {
        Self {
            task_id: task.id(),
            nominal_interval: task.interval(),
            task,
            effective_period,
            phase_offset,
            state: AtomicU8::new(TriggerState::Idle as u8),
            in_flight: AtomicBool::new(false),
            waiting: AtomicBool::new(false),
            generation: AtomicU64::new(0),
            active: AtomicUsize::new(0),
        }
    }

    /// Identifier of the task this trigger fires.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Interval the task asked for.
    #[must_use]
    pub const fn nominal_interval(&self) -> Duration {
        self.nominal_interval
    }

    /// Interval the trigger actually fires at.
    #[must_use]
    pub const fn effective_period(&self) -> Duration {
        self.effective_period
    }

    /// Delay before the first firing.
    #[must_use]
    pub const fn phase_offset(&self) -> Duration {
        self.phase_offset
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> TriggerState {
        TriggerState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Whether the trigger has been disposed.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.state() == TriggerState::Disposed
    }

    /// Dispose the trigger. Returns `false` if it was already disposed.
    pub fn dispose(&self) -> bool {
        self.state.swap(TriggerState::Disposed as u8, Ordering::AcqRel)
            != TriggerState::Disposed as u8
    }

    /// Move to `to`. Refused (returns `false`) once disposed.
    pub(crate) fn transition(&self, to: TriggerState) -> bool {
        let mut current = self.state.load(Ordering::Acquire);
        loop {
            if current == TriggerState::Disposed as u8 {
                return false;
            }
            match self.state.compare_exchange_weak(
                current,
                to as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
    }

    /// Mark a firing of this task as in flight. Returns `false` if one already is.
    pub(crate) fn try_claim(&self) -> bool {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub(crate) fn release_claim(&self) {
        self.in_flight.store(false, Ordering::Release);
    }

    /// Take the single waiting-for-admission slot. Returns `false` if another
    /// firing of this task already holds it.
    pub(crate) fn try_enter_waiting(&self) -> bool {
        self.waiting
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub(crate) fn leave_waiting(&self) {
        self.waiting.store(false, Ordering::Release);
    }

    /// Whether a firing of this task is waiting for admission.
    #[must_use]
    pub fn is_waiting(&self) -> bool {
        self.waiting.load(Ordering::Acquire)
    }

    /// Number of firings of this task between admission wait and cool-down.
    #[must_use]
    pub fn active_firings(&self) -> usize {
        self.active.load(Ordering::Acquire)
    }

    /// Register a new firing and return its generation.
    pub(crate) fn begin_firing(&self) -> u64 {
        self.active.fetch_add(1, Ordering::AcqRel);
        self.generation.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Move to `to` on behalf of firing `generation`.
    ///
    /// A superseded firing leaves the state alone. Returns `false` only once the
    /// trigger is disposed.
    pub(crate) fn advance(&self, generation: u64, to: TriggerState) -> bool {
        if self.is_disposed() {
            return false;
        }
        if self.generation.load(Ordering::Acquire) != generation {
            return true;
        }
        self.transition(to)
    }

    /// Unregister a firing; the last one out re-arms the trigger.
    pub(crate) fn end_firing(&self) {
        if self.active.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.transition(TriggerState::Armed);
        }
    }

    pub(crate) const fn task(&self) -> &Arc<dyn PeriodicTask> {
        &self.task
    }

    /// Serializable view of this trigger.
    #[must_use]
    pub fn snapshot(&self) -> TriggerSnapshot {
        TriggerSnapshot {
            task_id: self.task_id,
            nominal_interval_ms: duration_ms(self.nominal_interval),
            effective_period_ms: duration_ms(self.effective_period),
            phase_offset_ms: duration_ms(self.phase_offset),
            state: self.state(),
        }
    }
}

impl fmt::Debug for TriggerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TriggerHandle")
            .field("task_id", &self.task_id)
            .field("effective_period", &self.effective_period)
            .field("phase_offset", &self.phase_offset)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

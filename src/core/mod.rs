//! Core scheduling abstractions and capacity accounting.

pub mod degradation;
pub(crate) mod dispatcher;
pub mod error;
pub mod events;
pub(crate) mod execution;
pub mod limiter;
pub mod scheduler;
pub mod stats;
pub mod task;
pub mod trigger;

pub use degradation::{effective_period, oversubscription_factor, phase_offset, settle_delay};
pub use error::{AppResult, SchedulerError};
pub use events::{
    build_event, EventKind, EventSink, ExecutionEvent, InMemoryEventSink, NullEventSink,
};
pub use limiter::{AdmissionLimiter, AdmissionPermit};
pub use scheduler::{Phase, Scheduler};
pub use stats::SchedulerStats;
pub use task::{PeriodicTask, TaskDescriptor, TaskId};
pub use trigger::{TriggerHandle, TriggerSnapshot, TriggerState};

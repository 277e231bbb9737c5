//! Task descriptor contract.
//!
//! A task is supplied by the caller and never constructed by the scheduler. It
//! carries an identifier, a nominal interval, and a blocking unit of work that is
//! expected to saturate one core for its duration.

use std::fmt;
use std::time::Duration;

use crate::core::error::AppResult;

/// Opaque task identifier.
pub type TaskId = u64;

/// Abstraction for a task that wants its work invoked periodically.
///
/// `run` is called from a blocking worker thread, never from an async context,
/// so implementations are free to spin the CPU. Errors (and panics) are caught at
/// the execution boundary and reported; they never stop the task's trigger.
///
/// # Example
///
/// ```rust,ignore
/// use std::time::Duration;
/// use prometheus_cadence::core::{AppResult, PeriodicTask, TaskId};
///
/// struct Checksum {
///     id: TaskId,
/// }
///
/// impl PeriodicTask for Checksum {
///     fn id(&self) -> TaskId {
///         self.id
///     }
///
///     fn interval(&self) -> Duration {
///         Duration::from_secs(5)
///     }
///
///     fn run(&self) -> AppResult<()> {
///         // CPU-bound work here
///         Ok(())
///     }
/// }
/// ```
pub trait PeriodicTask: Send + Sync + 'static {
    /// Unique identifier of this task.
    fn id(&self) -> TaskId;

    /// Nominal interval between invocations. Must be non-zero.
    fn interval(&self) -> Duration;

    /// Execute one unit of work, blocking the calling thread.
    ///
    /// # Errors
    ///
    /// Any error is reported to the scheduler's event sink and otherwise ignored.
    fn run(&self) -> AppResult<()>;
}

/// Closure-backed task descriptor.
///
/// Immutable after creation.
pub struct TaskDescriptor<F> {
    id: TaskId,
    interval: Duration,
    work: F,
}

impl<F> TaskDescriptor<F>
where
    F: Fn() -> AppResult<()> + Send + Sync + 'static,
{
    /// Create a descriptor from an id, a nominal interval and a work closure.
    pub const fn new(id: TaskId, interval: Duration, work: F) -> Self {
        Self { id, interval, work }
    }
}

impl<F> PeriodicTask for TaskDescriptor<F>
where
    F: Fn() -> AppResult<()> + Send + Sync + 'static,
{
    fn id(&self) -> TaskId {
        self.id
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    fn run(&self) -> AppResult<()> {
        (self.work)()
    }
}

impl<F> fmt::Debug for TaskDescriptor<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskDescriptor")
            .field("id", &self.id)
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}

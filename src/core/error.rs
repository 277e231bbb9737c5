//! Error types for scheduler operations.

use thiserror::Error;

use crate::core::task::TaskId;

/// Errors produced by scheduler components.
///
/// Configuration variants are only ever returned from `Scheduler::start` or from
/// configuration validation. Nothing in steady-state operation surfaces here;
/// failures of a task's work are reported through an `EventSink` instead.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Concurrency capacity must be at least one.
    #[error("invalid concurrency capacity {0}: must be at least 1")]
    InvalidConcurrency(usize),
    /// The task list is empty.
    #[error("at least one task must be specified")]
    NoTasks,
    /// A task declared a zero nominal interval.
    #[error("task {0} has a zero interval")]
    ZeroInterval(TaskId),
    /// Two tasks share the same identifier.
    #[error("duplicate task id {0}")]
    DuplicateTaskId(TaskId),
    /// `start` was called on a scheduler that already started.
    #[error("scheduler already started")]
    AlreadyStarted,
    /// Configuration could not be parsed or failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// The admission limiter rejected an acquisition.
    #[error("admission limiter error: {0}")]
    Limiter(String),
    /// No async runtime was available to drive the triggers.
    #[error("runtime error: {0}")]
    Runtime(String),
}

impl SchedulerError {
    /// Whether this error is a configuration error the caller must fix before retrying.
    #[must_use]
    pub const fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidConcurrency(_)
                | Self::NoTasks
                | Self::ZeroInterval(_)
                | Self::DuplicateTaskId(_)
                | Self::InvalidConfig(_)
        )
    }
}

/// Application-facing result using anyhow for higher-level contexts.
///
/// Task work returns this type; the scheduler never propagates it.
pub type AppResult<T> = Result<T, anyhow::Error>;

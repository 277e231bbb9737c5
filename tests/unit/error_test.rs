//! Tests for error types

use prometheus_cadence::core::SchedulerError;

#[test]
fn test_invalid_concurrency_error() {
    let err = SchedulerError::InvalidConcurrency(0);
    assert_eq!(
        format!("{err}"),
        "invalid concurrency capacity 0: must be at least 1"
    );
    assert!(err.is_config_error());
}

#[test]
fn test_no_tasks_error() {
    let err = SchedulerError::NoTasks;
    assert_eq!(format!("{err}"), "at least one task must be specified");
    assert!(err.is_config_error());
}

#[test]
fn test_task_errors_name_the_task() {
    assert_eq!(
        format!("{}", SchedulerError::ZeroInterval(17)),
        "task 17 has a zero interval"
    );
    assert_eq!(
        format!("{}", SchedulerError::DuplicateTaskId(3)),
        "duplicate task id 3"
    );
}

#[test]
fn test_lifecycle_errors_are_not_config_errors() {
    assert!(!SchedulerError::AlreadyStarted.is_config_error());
    assert!(!SchedulerError::Runtime("no runtime".into()).is_config_error());
    assert!(!SchedulerError::Limiter("closed".into()).is_config_error());
}

#[test]
fn test_error_converts_into_anyhow() {
    let err: anyhow::Error = SchedulerError::AlreadyStarted.into();
    assert_eq!(err.to_string(), "scheduler already started");
    assert!(err.downcast_ref::<SchedulerError>().is_some());
}

//! Tests for the scheduler builder

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use prometheus_cadence::builders::SchedulerBuilder;
use prometheus_cadence::config::SchedulerConfig;
use prometheus_cadence::core::{
    EventKind, InMemoryEventSink, PeriodicTask, Phase, SchedulerError, TaskDescriptor,
};
use prometheus_cadence::runtime::TokioSpawner;
use prometheus_cadence::util::SeededRandom;

fn task(id: u64, interval_ms: u64) -> Arc<dyn PeriodicTask> {
    Arc::new(TaskDescriptor::new(id, Duration::from_millis(interval_ms), || Ok(())))
}

#[test]
fn test_builder_collects_tasks_and_config() {
    let scheduler = SchedulerBuilder::new()
        .with_config(SchedulerConfig {
            jitter_margin_ms: 7,
            ..SchedulerConfig::default()
        })
        .with_capacity(3)
        .with_task(TaskDescriptor::new(1, Duration::from_secs(1), || Ok(())))
        .with_tasks([task(2, 500), task(3, 500)])
        .build();

    assert_eq!(scheduler.task_count(), 3);
    assert_eq!(scheduler.config().concurrency_capacity, 3);
    assert_eq!(scheduler.config().jitter_margin_ms, 7);
    assert_eq!(scheduler.phase(), Phase::Created);
}

#[test]
fn test_builder_does_not_validate_until_start() {
    let scheduler = SchedulerBuilder::new().with_capacity(0).build();
    assert!(matches!(
        scheduler.start(),
        Err(SchedulerError::InvalidConcurrency(0))
    ));
}

#[test]
fn test_builder_with_explicit_spawner_starts_off_runtime() {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .unwrap();

    let scheduler = SchedulerBuilder::new()
        .with_spawner(TokioSpawner::new(runtime.handle().clone()))
        .with_random(Arc::new(SeededRandom::new(5)))
        .with_task(TaskDescriptor::new(1, Duration::from_secs(60), || Ok(())))
        .build();

    scheduler.start().unwrap();
    assert_eq!(scheduler.phase(), Phase::Running);
    scheduler.stop();
    assert_eq!(scheduler.phase(), Phase::Stopped);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_builder_custom_sink_receives_events() {
    let sink = Arc::new(Mutex::new(InMemoryEventSink::new(256)));
    let scheduler = SchedulerBuilder::new()
        .with_config(SchedulerConfig {
            concurrency_capacity: 2,
            jitter_margin_ms: 1,
            ..SchedulerConfig::default()
        })
        .with_event_sink(Arc::clone(&sink))
        .with_tasks([task(1, 5), task(2, 5)])
        .build();

    scheduler.start().unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(scheduler.shutdown(Duration::from_secs(2)).await.unwrap());

    assert!(sink.lock().count(EventKind::Completed) > 0);
    assert!(scheduler.recent_events().is_empty());
}

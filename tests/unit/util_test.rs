//! Tests for utility helpers

use std::sync::Arc;
use std::time::Duration;

use prometheus_cadence::core::PeriodicTask;
use prometheus_cadence::util::clock::{duration_ms, now_ms};
use prometheus_cadence::util::{init_tracing, BusyTask, RandomSource, SeededRandom};

#[test]
fn test_now_ms_monotonic() {
    let t1 = now_ms();
    std::thread::sleep(Duration::from_millis(2));
    let t2 = now_ms();
    assert!(t2 >= t1);
}

#[test]
fn test_duration_ms_saturates() {
    assert_eq!(duration_ms(Duration::from_millis(1_500)), 1_500);
    assert_eq!(duration_ms(Duration::MAX), u64::MAX);
}

#[test]
fn test_seeded_random_sequences_differ_by_seed() {
    let a = SeededRandom::new(1);
    let b = SeededRandom::new(2);
    let xs: Vec<u64> = (0..16).map(|_| a.next_in_range(0, 1 << 32)).collect();
    let ys: Vec<u64> = (0..16).map(|_| b.next_in_range(0, 1 << 32)).collect();
    assert_ne!(xs, ys);
}

#[test]
fn test_busy_task_generation_is_reproducible() {
    let r1: Arc<dyn RandomSource> = Arc::new(SeededRandom::new(99));
    let r2: Arc<dyn RandomSource> = Arc::new(SeededRandom::new(99));
    let a: Vec<Duration> = BusyTask::generate(20, &r1).iter().map(|t| t.interval()).collect();
    let b: Vec<Duration> = BusyTask::generate(20, &r2).iter().map(|t| t.interval()).collect();
    assert_eq!(a, b);
}

#[test]
fn test_init_tracing_is_idempotent() {
    init_tracing();
    init_tracing();
}

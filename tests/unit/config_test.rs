//! Tests for configuration validation and loading

use std::collections::HashMap;
use std::time::Duration;

use prometheus_cadence::config::scheduler::{
    ENV_CONCURRENCY, ENV_EVENT_BUFFER, ENV_JITTER_MARGIN_MS, ENV_SERIALIZE_PER_TASK,
    ENV_SHUTDOWN_GRACE_MS,
};
use prometheus_cadence::config::SchedulerConfig;

fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn test_default_config_is_valid() {
    let config = SchedulerConfig::default();
    assert!(config.validate().is_ok());
    assert_eq!(config.jitter_margin(), Duration::from_millis(100));
    assert_eq!(config.shutdown_grace(), Duration::from_secs(5));
    assert!(!config.serialize_per_task);
}

#[test]
fn test_zero_capacity_invalid() {
    assert!(SchedulerConfig::with_capacity(0).validate().is_err());
}

#[test]
fn test_detect_uses_cpu_count() {
    let config = SchedulerConfig::detect();
    assert_eq!(config.concurrency_capacity, num_cpus::get());
    assert!(config.validate().is_ok());
}

#[test]
fn test_from_json_fills_defaults() {
    let json = r#"{ "concurrency_capacity": 4, "serialize_per_task": true }"#;
    let config = SchedulerConfig::from_json_str(json).unwrap();
    assert_eq!(config.concurrency_capacity, 4);
    assert!(config.serialize_per_task);
    assert_eq!(config.jitter_margin_ms, 100);
    assert_eq!(config.event_buffer, 1_024);
}

#[test]
fn test_from_json_rejects_zero_capacity() {
    let err = SchedulerConfig::from_json_str(r#"{ "concurrency_capacity": 0 }"#).unwrap_err();
    assert!(err.contains("concurrency_capacity"));
}

#[test]
fn test_from_json_rejects_garbage() {
    let err = SchedulerConfig::from_json_str("not json").unwrap_err();
    assert!(err.starts_with("parse error"));
}

#[test]
fn test_from_lookup_reads_every_variable() {
    let config = SchedulerConfig::from_lookup(lookup(&[
        (ENV_CONCURRENCY, "12"),
        (ENV_JITTER_MARGIN_MS, " 25 "),
        (ENV_SERIALIZE_PER_TASK, "true"),
        (ENV_EVENT_BUFFER, "0"),
        (ENV_SHUTDOWN_GRACE_MS, "750"),
    ]))
    .unwrap();

    assert_eq!(config.concurrency_capacity, 12);
    assert_eq!(config.jitter_margin_ms, 25);
    assert!(config.serialize_per_task);
    assert_eq!(config.event_buffer, 0);
    assert_eq!(config.shutdown_grace(), Duration::from_millis(750));
}

#[test]
fn test_from_lookup_empty_keeps_defaults() {
    let config = SchedulerConfig::from_lookup(|_| None).unwrap();
    assert_eq!(config, SchedulerConfig::default());
}

#[test]
fn test_from_lookup_reports_unparsable_value() {
    let err = SchedulerConfig::from_lookup(lookup(&[(ENV_CONCURRENCY, "many")])).unwrap_err();
    assert!(err.contains(ENV_CONCURRENCY));
    assert!(err.contains("many"));
}

#[test]
fn test_from_lookup_validates() {
    assert!(SchedulerConfig::from_lookup(lookup(&[(ENV_CONCURRENCY, "0")])).is_err());
}

//! Tests for execution event sinks

use prometheus_cadence::core::{build_event, EventKind, EventSink, InMemoryEventSink};

#[test]
fn test_in_memory_sink_stores_events() {
    let mut sink = InMemoryEventSink::new(10);
    sink.record(build_event(1, EventKind::Completed, None));
    sink.record(build_event(2, EventKind::Failed, Some("bad input".into())));

    let events = sink.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].task_id, 1);
    assert_eq!(events[1].detail.as_deref(), Some("bad input"));
    assert_eq!(sink.count(EventKind::Failed), 1);
}

#[test]
fn test_in_memory_sink_drops_oldest_when_full() {
    let mut sink = InMemoryEventSink::new(3);
    for id in 0..5 {
        sink.record(build_event(id, EventKind::Completed, None));
    }
    let ids: Vec<u64> = sink.events().iter().map(|e| e.task_id).collect();
    assert_eq!(ids, vec![2, 3, 4]);
}

#[test]
fn test_zero_capacity_sink_stores_nothing() {
    let mut sink = InMemoryEventSink::new(0);
    sink.record(build_event(1, EventKind::Abandoned, None));
    assert!(sink.events().is_empty());
}

#[test]
fn test_event_serializes_kind_snake_case() {
    let event = build_event(5, EventKind::Abandoned, Some("admission".into()));
    let json = serde_json::to_value(&event).unwrap();
    assert_eq!(json["kind"], "abandoned");
    assert_eq!(json["task_id"], 5);
    assert_eq!(json["detail"], "admission");
}

#[test]
fn test_event_ids_are_unique() {
    let a = build_event(1, EventKind::Completed, None);
    let b = build_event(1, EventKind::Completed, None);
    assert_ne!(a.event_id, b.event_id);
}

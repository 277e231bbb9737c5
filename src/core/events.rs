//! Execution event sinks.
//!
//! Work outcomes that must not propagate out of the execution wrapper are
//! surfaced here. The in-memory sink is a bounded ring buffer for tests and
//! local diagnostics; callers plug in their own `EventSink` for anything else.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::core::task::TaskId;
use crate::util::clock::now_ms;

/// Outcome recorded for one firing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Work returned `Ok`.
    Completed,
    /// Work returned an error or panicked.
    Failed,
    /// The firing was dropped before work because the scheduler stopped.
    Abandoned,
    /// The firing was skipped because the previous one was still in flight.
    Skipped,
}

/// Execution event structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionEvent {
    /// Event identifier.
    pub event_id: String,
    /// Related task identifier.
    pub task_id: TaskId,
    /// What happened.
    pub kind: EventKind,
    /// Timestamp milliseconds.
    pub created_at_ms: u128,
    /// Error message or other context.
    pub detail: Option<String>,
}

/// Event sink abstraction.
pub trait EventSink: Send {
    /// Record an execution event.
    fn record(&mut self, event: ExecutionEvent);
}

/// In-memory event sink for testing and dev.
#[derive(Debug)]
pub struct InMemoryEventSink {
    events: VecDeque<ExecutionEvent>,
    max_events: usize,
}

impl InMemoryEventSink {
    /// Create a new in-memory sink with a bounded buffer.
    #[must_use]
    pub fn new(max_events: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(max_events.min(4_096)),
            max_events,
        }
    }

    /// Retrieve a snapshot of stored events.
    #[must_use]
    pub fn events(&self) -> Vec<ExecutionEvent> {
        self.events.iter().cloned().collect()
    }

    /// Number of stored events of the given kind.
    #[must_use]
    pub fn count(&self, kind: EventKind) -> usize {
        self.events.iter().filter(|e| e.kind == kind).count()
    }
}

impl EventSink for InMemoryEventSink {
    fn record(&mut self, event: ExecutionEvent) {
        if self.max_events == 0 {
            return;
        }
        if self.events.len() >= self.max_events {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }
}

/// Sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn record(&mut self, _event: ExecutionEvent) {}
}

/// Shared sink: lets the caller keep a handle to read events back.
impl<S: EventSink> EventSink for Arc<Mutex<S>> {
    fn record(&mut self, event: ExecutionEvent) {
        self.lock().record(event);
    }
}

/// Helper to build an execution event stamped with the current time.
pub fn build_event(task_id: TaskId, kind: EventKind, detail: Option<String>) -> ExecutionEvent {
    ExecutionEvent {
        event_id: uuid::Uuid::new_v4().to_string(),
        task_id,
        kind,
        created_at_ms: now_ms(),
        detail,
    }
}

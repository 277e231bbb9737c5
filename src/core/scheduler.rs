//! Scheduler lifecycle.
//!
//! `start` validates the configuration, computes each task's effective period
//! and phase offset, arms one trigger per task and spawns the dispatcher.
//! `stop` disposes every trigger and signals shutdown; work already executing is
//! left to finish and its admission unit comes back when it does.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::SchedulerConfig;
use crate::core::degradation::{effective_period, oversubscription_factor, phase_offset};
use crate::core::dispatcher;
use crate::core::error::SchedulerError;
use crate::core::events::{EventSink, ExecutionEvent, InMemoryEventSink};
use crate::core::execution::ExecutionContext;
use crate::core::limiter::AdmissionLimiter;
use crate::core::stats::{SchedulerCounters, SchedulerStats};
use crate::core::task::PeriodicTask;
use crate::core::trigger::{TriggerHandle, TriggerSnapshot, TriggerState};
use crate::runtime::{Spawn, TokioSpawner};
use crate::util::clock::duration_ms;
use crate::util::random::{RandomSource, ThreadRandom};

/// Where the scheduler is in its single start/stop cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Constructed, not started.
    Created,
    /// Triggers armed and firing.
    Running,
    /// Stopped. Cannot be restarted.
    Stopped,
}

/// State created by `start`.
struct Armed {
    triggers: Vec<Arc<TriggerHandle>>,
    limiter: Arc<AdmissionLimiter>,
    factor: u32,
}

struct Lifecycle {
    phase: Phase,
    armed: Option<Armed>,
}

/// Periodic scheduler bounding concurrent work to the configured capacity.
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use std::time::Duration;
/// use prometheus_cadence::config::SchedulerConfig;
/// use prometheus_cadence::core::{PeriodicTask, Scheduler, TaskDescriptor};
///
/// let tasks: Vec<Arc<dyn PeriodicTask>> = (0..1000)
///     .map(|id| Arc::new(TaskDescriptor::new(id, Duration::from_secs(5), || Ok(()))) as _)
///     .collect();
///
/// let scheduler = Scheduler::new(tasks, SchedulerConfig::with_capacity(8));
/// scheduler.start()?;
/// // ...
/// scheduler.shutdown(Duration::from_secs(5)).await?;
/// ```
pub struct Scheduler<S = TokioSpawner>
where
    S: Spawn + Clone + Send + Sync + 'static,
{
    id: Uuid,
    tasks: Vec<Arc<dyn PeriodicTask>>,
    config: SchedulerConfig,
    random: Arc<dyn RandomSource>,
    events: Arc<Mutex<Box<dyn EventSink>>>,
    recent: Option<Arc<Mutex<InMemoryEventSink>>>,
    counters: Arc<SchedulerCounters>,
    spawner: S,
    shutdown_tx: watch::Sender<bool>,
    lifecycle: Mutex<Lifecycle>,
}

impl Scheduler<TokioSpawner> {
    /// Create a scheduler on the ambient tokio runtime with thread-local randomness
    /// and an in-memory event buffer of `config.event_buffer` entries.
    ///
    /// Nothing is validated until `start`.
    #[must_use]
    pub fn new(tasks: Vec<Arc<dyn PeriodicTask>>, config: SchedulerConfig) -> Self {
        Self::from_parts(tasks, config, Arc::new(ThreadRandom), None, TokioSpawner::ambient())
    }
}

impl<S> Scheduler<S>
where
    S: Spawn + Clone + Send + Sync + 'static,
{
    /// Assemble a scheduler. A `None` sink installs the in-memory buffer.
    pub(crate) fn from_parts(
        tasks: Vec<Arc<dyn PeriodicTask>>,
        config: SchedulerConfig,
        random: Arc<dyn RandomSource>,
        sink: Option<Box<dyn EventSink>>,
        spawner: S,
    ) -> Self {
        let (events, recent): (Box<dyn EventSink>, _) = match sink {
            Some(sink) => (sink, None),
            None => {
                let buffer = Arc::new(Mutex::new(InMemoryEventSink::new(config.event_buffer)));
                (Box::new(Arc::clone(&buffer)) as Box<dyn EventSink>, Some(buffer))
            }
        };
        let (shutdown_tx, _) = watch::channel(false);

        Self {
            id: Uuid::new_v4(),
            tasks,
            config,
            random,
            events: Arc::new(Mutex::new(events)),
            recent,
            counters: Arc::new(SchedulerCounters::default()),
            spawner,
            shutdown_tx,
            lifecycle: Mutex::new(Lifecycle {
                phase: Phase::Created,
                armed: None,
            }),
        }
    }

    /// Validate the configuration and arm every task.
    ///
    /// # Errors
    ///
    /// - `InvalidConcurrency` if the capacity is below one
    /// - `NoTasks` if the task list is empty
    /// - `ZeroInterval` / `DuplicateTaskId` for malformed tasks
    /// - `InvalidConfig` for other configuration failures
    /// - `AlreadyStarted` if called more than once
    /// - `Runtime` if no tokio runtime is available to the spawner
    pub fn start(&self) -> Result<(), SchedulerError> {
        let mut lifecycle = self.lifecycle.lock();
        if lifecycle.phase != Phase::Created {
            return Err(SchedulerError::AlreadyStarted);
        }
        self.validate()?;
        if !self.spawner.is_available() {
            return Err(SchedulerError::Runtime(
                "no tokio runtime available to drive triggers".into(),
            ));
        }

        let cores = self.config.concurrency_capacity;
        let limiter = Arc::new(AdmissionLimiter::new(cores)?);
        let factor = oversubscription_factor(self.tasks.len(), cores);

        let triggers: Vec<Arc<TriggerHandle>> = self
            .tasks
            .iter()
            .map(|task| {
                let period = effective_period(task.interval(), factor);
                let offset = phase_offset(self.random.as_ref(), period);
                let trigger = TriggerHandle::new(Arc::clone(task), period, offset);
                trigger.transition(TriggerState::Armed);
                debug!(
                    scheduler_id = %self.id,
                    task_id = trigger.task_id(),
                    nominal_ms = duration_ms(trigger.nominal_interval()),
                    effective_period_ms = duration_ms(period),
                    phase_offset_ms = duration_ms(offset),
                    "trigger armed"
                );
                Arc::new(trigger)
            })
            .collect();

        let ctx = ExecutionContext {
            limiter: Arc::clone(&limiter),
            random: Arc::clone(&self.random),
            events: Arc::clone(&self.events),
            counters: Arc::clone(&self.counters),
            jitter_margin: self.config.jitter_margin(),
            serialize_per_task: self.config.serialize_per_task,
            shutdown: self.shutdown_tx.subscribe(),
        };
        self.spawner.spawn(dispatcher::run(
            triggers.clone(),
            tokio::time::Instant::now(),
            ctx,
            self.spawner.clone(),
        ));

        info!(
            scheduler_id = %self.id,
            tasks = self.tasks.len(),
            cores,
            oversubscription_factor = factor,
            "scheduler started"
        );

        lifecycle.phase = Phase::Running;
        lifecycle.armed = Some(Armed {
            triggers,
            limiter,
            factor,
        });
        Ok(())
    }

    fn validate(&self) -> Result<(), SchedulerError> {
        if self.config.concurrency_capacity < 1 {
            return Err(SchedulerError::InvalidConcurrency(
                self.config.concurrency_capacity,
            ));
        }
        if self.tasks.is_empty() {
            return Err(SchedulerError::NoTasks);
        }
        self.config
            .validate()
            .map_err(SchedulerError::InvalidConfig)?;

        let mut seen = HashSet::with_capacity(self.tasks.len());
        for task in &self.tasks {
            if task.interval().is_zero() {
                return Err(SchedulerError::ZeroInterval(task.id()));
            }
            if !seen.insert(task.id()) {
                return Err(SchedulerError::DuplicateTaskId(task.id()));
            }
        }
        Ok(())
    }

    /// Dispose every trigger and signal shutdown. No new work starts after this
    /// returns; work already executing is not interrupted.
    ///
    /// Calling `stop` before `start`, or more than once, is a no-op.
    pub fn stop(&self) {
        let mut lifecycle = self.lifecycle.lock();
        match lifecycle.phase {
            Phase::Created => {
                debug!(scheduler_id = %self.id, "stop before start, nothing to do");
                return;
            }
            Phase::Stopped => return,
            Phase::Running => {}
        }

        let disposed = lifecycle.armed.as_ref().map_or(0, |armed| {
            armed.triggers.iter().filter(|t| t.dispose()).count()
        });
        self.shutdown_tx.send_replace(true);
        lifecycle.phase = Phase::Stopped;

        info!(scheduler_id = %self.id, disposed, "scheduler stopped");
    }

    /// Stop, then wait up to `grace` for every admission unit to come back.
    ///
    /// Returns `true` if all in-flight work finished within the grace period.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::Limiter` if the limiter failed while draining.
    pub async fn shutdown(&self, grace: Duration) -> Result<bool, SchedulerError> {
        self.stop();
        let Some(limiter) = self.limiter() else {
            return Ok(true);
        };
        if let Ok(drained) = tokio::time::timeout(grace, limiter.wait_idle()).await {
            drained?;
            Ok(true)
        } else {
            warn!(
                scheduler_id = %self.id,
                still_running = limiter.granted(),
                "shutdown grace expired with work in flight"
            );
            Ok(false)
        }
    }

    /// `shutdown` with the configured `shutdown_grace_ms`.
    ///
    /// # Errors
    ///
    /// See [`Scheduler::shutdown`].
    pub async fn shutdown_default(&self) -> Result<bool, SchedulerError> {
        self.shutdown(self.config.shutdown_grace()).await
    }

    /// Unique id of this scheduler instance, attached to its log lines.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Current lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.lifecycle.lock().phase
    }

    /// Whether triggers are armed and firing.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.phase() == Phase::Running
    }

    /// Configuration in use.
    #[must_use]
    pub const fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Number of tasks handed to the scheduler.
    #[must_use]
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Oversubscription factor computed at start, `None` before.
    #[must_use]
    pub fn oversubscription_factor(&self) -> Option<u32> {
        self.lifecycle.lock().armed.as_ref().map(|a| a.factor)
    }

    /// Admission limiter, `None` before start.
    #[must_use]
    pub fn limiter(&self) -> Option<Arc<AdmissionLimiter>> {
        self.lifecycle
            .lock()
            .armed
            .as_ref()
            .map(|a| Arc::clone(&a.limiter))
    }

    /// Snapshots of every trigger, in task order. Empty before start.
    #[must_use]
    pub fn triggers(&self) -> Vec<TriggerSnapshot> {
        self.lifecycle
            .lock()
            .armed
            .as_ref()
            .map(|a| a.triggers.iter().map(|t| t.snapshot()).collect())
            .unwrap_or_default()
    }

    /// Current statistics.
    #[must_use]
    pub fn stats(&self) -> SchedulerStats {
        let lifecycle = self.lifecycle.lock();
        let (triggers, available) = lifecycle.armed.as_ref().map_or(
            (0, self.config.concurrency_capacity),
            |a| (a.triggers.len(), a.limiter.available()),
        );
        self.counters
            .snapshot(triggers, self.config.concurrency_capacity, available)
    }

    /// Events held by the default in-memory buffer. Empty when a custom sink
    /// was supplied.
    #[must_use]
    pub fn recent_events(&self) -> Vec<ExecutionEvent> {
        self.recent
            .as_ref()
            .map(|buffer| buffer.lock().events())
            .unwrap_or_default()
    }
}

impl<S> Drop for Scheduler<S>
where
    S: Spawn + Clone + Send + Sync + 'static,
{
    fn drop(&mut self) {
        self.stop();
    }
}

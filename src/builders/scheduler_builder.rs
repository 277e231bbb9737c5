//! Fluent construction of a [`Scheduler`].

use std::sync::Arc;

use crate::config::SchedulerConfig;
use crate::core::events::EventSink;
use crate::core::scheduler::Scheduler;
use crate::core::task::PeriodicTask;
use crate::runtime::{Spawn, TokioSpawner};
use crate::util::random::{RandomSource, ThreadRandom};

/// Builder for [`Scheduler`].
///
/// Nothing is validated here; `Scheduler::start` reports every configuration
/// error.
///
/// ```rust,ignore
/// let scheduler = SchedulerBuilder::new()
///     .with_capacity(num_cpus::get())
///     .with_task(my_task)
///     .with_random(Arc::new(SeededRandom::new(7)))
///     .build();
/// ```
pub struct SchedulerBuilder<S = TokioSpawner> {
    tasks: Vec<Arc<dyn PeriodicTask>>,
    config: SchedulerConfig,
    random: Arc<dyn RandomSource>,
    sink: Option<Box<dyn EventSink>>,
    spawner: S,
}

impl Default for SchedulerBuilder<TokioSpawner> {
    fn default() -> Self {
        Self::new()
    }
}

impl SchedulerBuilder<TokioSpawner> {
    /// Builder with default configuration on the ambient tokio runtime.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            config: SchedulerConfig::default(),
            random: Arc::new(ThreadRandom),
            sink: None,
            spawner: TokioSpawner::ambient(),
        }
    }
}

impl<S> SchedulerBuilder<S>
where
    S: Spawn + Clone + Send + Sync + 'static,
{
    /// Add one task.
    #[must_use]
    pub fn with_task<T: PeriodicTask>(mut self, task: T) -> Self {
        self.tasks.push(Arc::new(task));
        self
    }

    /// Add already shared tasks.
    #[must_use]
    pub fn with_tasks<I>(mut self, tasks: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn PeriodicTask>>,
    {
        self.tasks.extend(tasks);
        self
    }

    /// Replace the whole configuration.
    #[must_use]
    pub fn with_config(mut self, config: SchedulerConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the concurrency capacity.
    #[must_use]
    pub const fn with_capacity(mut self, capacity: usize) -> Self {
        self.config.concurrency_capacity = capacity;
        self
    }

    /// Use a specific randomness source for phase offsets and jitter.
    #[must_use]
    pub fn with_random(mut self, random: Arc<dyn RandomSource>) -> Self {
        self.random = random;
        self
    }

    /// Report execution events to `sink` instead of the in-memory buffer.
    #[must_use]
    pub fn with_event_sink<E: EventSink + 'static>(mut self, sink: E) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    /// Drive triggers on a different spawner.
    #[must_use]
    pub fn with_spawner<S2>(self, spawner: S2) -> SchedulerBuilder<S2>
    where
        S2: Spawn + Clone + Send + Sync + 'static,
    {
        SchedulerBuilder {
            tasks: self.tasks,
            config: self.config,
            random: self.random,
            sink: self.sink,
            spawner,
        }
    }

    /// Assemble the scheduler. It is not started.
    #[must_use]
    pub fn build(self) -> Scheduler<S> {
        Scheduler::from_parts(self.tasks, self.config, self.random, self.sink, self.spawner)
    }
}

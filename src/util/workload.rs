//! Simulated CPU-bound workload.
//!
//! `BusyTask` keeps one core busy for a random duration per invocation and logs a
//! progress line naming its id and nominal interval. It stands in for real
//! callers in benchmarks and tests.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::core::error::AppResult;
use crate::core::task::{PeriodicTask, TaskId};
use crate::util::clock::now_ms;
use crate::util::random::RandomSource;

/// Task that spins the calling thread for a random duration.
pub struct BusyTask {
    id: TaskId,
    interval: Duration,
    min_busy: Duration,
    max_busy: Duration,
    random: Arc<dyn RandomSource>,
}

impl BusyTask {
    /// Default lower bound of the busy period.
    pub const DEFAULT_MIN_BUSY: Duration = Duration::from_millis(500);
    /// Default upper bound (exclusive) of the busy period.
    pub const DEFAULT_MAX_BUSY: Duration = Duration::from_millis(1_500);

    /// Create a task busy for 500..1500 ms per run.
    pub fn new(id: TaskId, interval: Duration, random: Arc<dyn RandomSource>) -> Self {
        Self {
            id,
            interval,
            min_busy: Self::DEFAULT_MIN_BUSY,
            max_busy: Self::DEFAULT_MAX_BUSY,
            random,
        }
    }

    /// Override the busy period range.
    #[must_use]
    pub const fn with_busy_range(mut self, min: Duration, max: Duration) -> Self {
        self.min_busy = min;
        self.max_busy = max;
        self
    }

    /// Build `count` tasks with sequential ids and random 1..10 second intervals.
    pub fn generate(count: usize, random: &Arc<dyn RandomSource>) -> Vec<Self> {
        (0..count as u64)
            .map(|id| {
                let secs = random.next_in_range(1, 10);
                Self::new(id, Duration::from_secs(secs), Arc::clone(random))
            })
            .collect()
    }

    fn busy_for(&self) -> Duration {
        let min = crate::util::clock::duration_ms(self.min_busy);
        let max = crate::util::clock::duration_ms(self.max_busy);
        Duration::from_millis(self.random.next_in_range(min, max))
    }
}

impl PeriodicTask for BusyTask {
    fn id(&self) -> TaskId {
        self.id
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    fn run(&self) -> AppResult<()> {
        tracing::info!(
            started_at_ms = %now_ms(),
            task_id = self.id,
            interval_secs = self.interval.as_secs_f64(),
            "ID: {} - Interval: {}",
            self.id,
            self.interval.as_secs_f64()
        );

        let end = Instant::now() + self.busy_for();
        while Instant::now() < end {
            std::hint::spin_loop();
        }
        Ok(())
    }
}

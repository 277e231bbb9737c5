//! Interval degradation and jitter math.
//!
//! When the task population exceeds the core count, every task's trigger is
//! slowed by the same integer factor `k = max(1, tasks / cores)`. Floor division
//! makes the degradation a step function: it only changes when the task count
//! crosses a multiple of the core count.
//!
//! All random draws are in whole milliseconds.

use std::time::Duration;

use crate::util::clock::duration_ms;
use crate::util::random::RandomSource;

/// Smallest period a trigger may be armed with.
pub const MIN_EFFECTIVE_PERIOD: Duration = Duration::from_millis(1);

/// Default fixed margin added to the jitter range.
pub const DEFAULT_JITTER_MARGIN: Duration = Duration::from_millis(100);

/// Oversubscription factor `max(1, floor(task_count / cores))`.
///
/// `cores` must be at least one; the scheduler validates this before calling.
#[must_use]
pub fn oversubscription_factor(task_count: usize, cores: usize) -> u32 {
    let k = task_count / cores.max(1);
    u32::try_from(k).unwrap_or(u32::MAX).max(1)
}

/// Nominal interval stretched by the oversubscription factor.
///
/// The division is exact on `Duration`. A result of zero (only possible for
/// sub-nanosecond-per-factor intervals) is clamped to [`MIN_EFFECTIVE_PERIOD`].
#[must_use]
pub fn effective_period(nominal: Duration, factor: u32) -> Duration {
    let period = nominal / factor.max(1);
    if period.is_zero() {
        MIN_EFFECTIVE_PERIOD
    } else {
        period
    }
}

/// Random initial delay in `[0, period)`.
pub fn phase_offset(random: &dyn RandomSource, period: Duration) -> Duration {
    Duration::from_millis(random.next_in_range(0, duration_ms(period)))
}

/// Random jitter in `[0, period + margin)`.
pub fn jitter(random: &dyn RandomSource, period: Duration, margin: Duration) -> Duration {
    let high = duration_ms(period).saturating_add(duration_ms(margin));
    Duration::from_millis(random.next_in_range(0, high))
}

/// Settle delay slept before and after one invocation: `period + jitter`.
pub fn settle_delay(random: &dyn RandomSource, period: Duration, margin: Duration) -> Duration {
    period.saturating_add(jitter(random, period, margin))
}

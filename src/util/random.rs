//! Injectable randomness.
//!
//! Intervals, phase offsets and settle jitter all draw from a [`RandomSource`].
//! Production code uses [`ThreadRandom`]; tests hand in [`SeededRandom`] or their
//! own sequence to get reproducible schedules.

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of bounded random integers.
pub trait RandomSource: Send + Sync {
    /// Next integer in `[low, high)`. Returns `low` when the range is empty.
    fn next_in_range(&self, low: u64, high: u64) -> u64;
}

/// Thread-local generator backed by `rand::rng()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn next_in_range(&self, low: u64, high: u64) -> u64 {
        if high <= low {
            return low;
        }
        rand::rng().random_range(low..high)
    }
}

/// Reproducible generator seeded from a fixed value.
#[derive(Debug)]
pub struct SeededRandom {
    inner: Mutex<StdRng>,
}

impl SeededRandom {
    /// Create a generator with the given seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            inner: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl RandomSource for SeededRandom {
    fn next_in_range(&self, low: u64, high: u64) -> u64 {
        if high <= low {
            return low;
        }
        self.inner.lock().random_range(low..high)
    }
}

//! Admission limiter sized to the available cores.
//!
//! A counting gate over a `tokio::sync::Semaphore`. Capacity is only ever
//! returned by dropping an [`AdmissionPermit`], so every exit path out of an
//! execution (success, error, panic, cancellation) gives its unit back. There is
//! no public `release` that could run without a matching acquire.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::core::error::SchedulerError;

/// Bounded concurrency gate.
#[derive(Debug)]
pub struct AdmissionLimiter {
    semaphore: Arc<Semaphore>,
    capacity: usize,
    granted: Arc<AtomicUsize>,
}

/// One unit of admission capacity, returned on drop.
#[derive(Debug)]
#[must_use = "capacity is released as soon as the permit is dropped"]
pub struct AdmissionPermit {
    _permit: OwnedSemaphorePermit,
    granted: Arc<AtomicUsize>,
}

impl AdmissionLimiter {
    /// Create a limiter with `capacity` units.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::InvalidConcurrency` if `capacity` is zero or
    /// larger than the semaphore can represent.
    pub fn new(capacity: usize) -> Result<Self, SchedulerError> {
        if capacity == 0 || capacity > Semaphore::MAX_PERMITS || u32::try_from(capacity).is_err() {
            return Err(SchedulerError::InvalidConcurrency(capacity));
        }
        Ok(Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
            granted: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// Wait until a unit is available and take it.
    ///
    /// Dropping the returned future before it resolves takes nothing.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::Limiter` only if the underlying semaphore was
    /// closed, which this crate never does.
    pub async fn acquire(&self) -> Result<AdmissionPermit, SchedulerError> {
        let permit = Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .map_err(|e| SchedulerError::Limiter(e.to_string()))?;
        Ok(self.grant(permit))
    }

    /// Take a unit if one is free right now.
    pub fn try_acquire(&self) -> Option<AdmissionPermit> {
        Arc::clone(&self.semaphore)
            .try_acquire_owned()
            .ok()
            .map(|permit| self.grant(permit))
    }

    /// Wait until every unit has been returned.
    ///
    /// Holds the full capacity only momentarily; new acquisitions may proceed as
    /// soon as this resolves.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::Limiter` if the semaphore was closed.
    pub async fn wait_idle(&self) -> Result<(), SchedulerError> {
        let all = u32::try_from(self.capacity)
            .map_err(|e| SchedulerError::Limiter(e.to_string()))?;
        let permits = self
            .semaphore
            .acquire_many(all)
            .await
            .map_err(|e| SchedulerError::Limiter(e.to_string()))?;
        drop(permits);
        Ok(())
    }

    /// Total units.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Units free right now.
    #[must_use]
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Units currently held by permits.
    #[must_use]
    pub fn granted(&self) -> usize {
        self.granted.load(Ordering::Acquire)
    }

    /// Whether every unit is free.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.available() == self.capacity
    }

    fn grant(&self, permit: OwnedSemaphorePermit) -> AdmissionPermit {
        self.granted.fetch_add(1, Ordering::AcqRel);
        AdmissionPermit {
            _permit: permit,
            granted: Arc::clone(&self.granted),
        }
    }
}

impl AdmissionPermit {
    /// Return the unit now. Equivalent to dropping the permit.
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for AdmissionPermit {
    fn drop(&mut self) {
        self.granted.fetch_sub(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_zero_capacity_rejected() {
        let err = AdmissionLimiter::new(0).unwrap_err();
        assert!(matches!(err, SchedulerError::InvalidConcurrency(0)));
    }

    #[test]
    fn test_try_acquire_until_exhausted() {
        let limiter = AdmissionLimiter::new(2).unwrap();
        let a = limiter.try_acquire().unwrap();
        let b = limiter.try_acquire().unwrap();
        assert!(limiter.try_acquire().is_none());
        assert_eq!(limiter.granted(), 2);
        assert_eq!(limiter.available(), 0);

        a.release();
        assert_eq!(limiter.available(), 1);
        drop(b);
        assert!(limiter.is_idle());
        assert_eq!(limiter.granted(), 0);
    }

    #[tokio::test]
    async fn test_acquire_waits_for_release() {
        let limiter = Arc::new(AdmissionLimiter::new(1).unwrap());
        let held = limiter.acquire().await.unwrap();

        let waiter = {
            let limiter = Arc::clone(&limiter);
            tokio::spawn(async move {
                let _permit = limiter.acquire().await.unwrap();
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(held);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should be admitted")
            .unwrap();
        assert!(limiter.is_idle());
    }

    #[tokio::test]
    async fn test_cancelled_acquire_takes_nothing() {
        let limiter = AdmissionLimiter::new(1).unwrap();
        let held = limiter.acquire().await.unwrap();

        let res = tokio::time::timeout(Duration::from_millis(10), limiter.acquire()).await;
        assert!(res.is_err());

        drop(held);
        assert!(limiter.is_idle());
        assert_eq!(limiter.granted(), 0);
    }

    #[tokio::test]
    async fn test_wait_idle_resolves_after_all_released() {
        let limiter = Arc::new(AdmissionLimiter::new(3).unwrap());
        let permits: Vec<_> = (0..3).filter_map(|_| limiter.try_acquire()).collect();
        assert_eq!(permits.len(), 3);

        let idle = {
            let limiter = Arc::clone(&limiter);
            tokio::spawn(async move { limiter.wait_idle().await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!idle.is_finished());

        drop(permits);
        idle.await.unwrap().unwrap();
        assert!(limiter.is_idle());
    }
}

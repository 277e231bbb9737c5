//! # Prometheus Cadence
//!
//! A core-bounded periodic scheduler for CPU-bound tasks.
//!
//! Each task supplies an identifier, a nominal interval and a blocking unit of
//! work. The scheduler fires every task periodically while guaranteeing that no
//! more work invocations run at once than there are cores, so the machine never
//! oversubscribes.
//!
//! ## Core Problem Solved
//!
//! Firing a thousand CPU-heavy jobs on independent timers works until their
//! schedules line up and every core is fighting over the same cache. This crate
//! trades cadence for throughput:
//!
//! - **Admission Control**: A counting gate sized to the core count bounds concurrent work
//! - **Graceful Degradation**: With more tasks than cores, every interval is stretched by
//!   `k = max(1, tasks / cores)` so demand does not scale linearly with the population
//! - **De-synchronisation**: Random phase offsets and per-firing settle jitter keep
//!   firings from clustering
//! - **Leak-Proof Capacity**: Admission units are RAII permits, returned on success,
//!   error, panic and shutdown alike
//! - **Clean Stop**: After `stop` returns no new work starts; in-flight work may finish
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use prometheus_cadence::builders::SchedulerBuilder;
//! use prometheus_cadence::util::{BusyTask, RandomSource, ThreadRandom};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     prometheus_cadence::util::init_tracing();
//!
//!     let random: Arc<dyn RandomSource> = Arc::new(ThreadRandom);
//!     let scheduler = SchedulerBuilder::new()
//!         .with_capacity(num_cpus::get())
//!         .with_tasks(BusyTask::generate(1_000, &random).into_iter().map(|t| Arc::new(t) as _))
//!         .build();
//!
//!     scheduler.start()?;
//!     tokio::signal::ctrl_c().await?;
//!     scheduler.shutdown(Duration::from_secs(5)).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - `core`: task contract, admission limiter, triggers, degradation math, scheduler
//! - `config`: `SchedulerConfig` loaded from code, JSON or `CADENCE_*` environment
//! - `builders`: fluent `SchedulerBuilder`
//! - `runtime`: spawner abstraction and the tokio implementation
//! - `util`: clock, randomness, tracing setup and a synthetic busy workload

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core scheduling abstractions and capacity accounting.
pub mod core;
/// Configuration models for the scheduler.
pub mod config;
/// Builders to construct schedulers from configuration.
pub mod builders;
/// Runtime adapters for spawning the dispatcher and firings.
pub mod runtime;
/// Shared utilities.
pub mod util;

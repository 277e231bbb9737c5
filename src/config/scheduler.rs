//! Scheduler configuration structures.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Environment variable for `concurrency_capacity`.
pub const ENV_CONCURRENCY: &str = "CADENCE_CONCURRENCY";
/// Environment variable for `jitter_margin_ms`.
pub const ENV_JITTER_MARGIN_MS: &str = "CADENCE_JITTER_MARGIN_MS";
/// Environment variable for `serialize_per_task`.
pub const ENV_SERIALIZE_PER_TASK: &str = "CADENCE_SERIALIZE_PER_TASK";
/// Environment variable for `event_buffer`.
pub const ENV_EVENT_BUFFER: &str = "CADENCE_EVENT_BUFFER";
/// Environment variable for `shutdown_grace_ms`.
pub const ENV_SHUTDOWN_GRACE_MS: &str = "CADENCE_SHUTDOWN_GRACE_MS";

/// Root scheduler configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Maximum concurrent work invocations, normally the core count.
    pub concurrency_capacity: usize,
    /// Fixed margin added to the jitter range (ms).
    pub jitter_margin_ms: u64,
    /// Skip a firing while the previous firing of the same task is in flight.
    pub serialize_per_task: bool,
    /// Capacity of the default in-memory event buffer. Zero disables it.
    pub event_buffer: usize,
    /// Default grace period for `Scheduler::shutdown` (ms).
    pub shutdown_grace_ms: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            concurrency_capacity: 8,
            jitter_margin_ms: 100,
            serialize_per_task: false,
            event_buffer: 1_024,
            shutdown_grace_ms: 5_000,
        }
    }
}

impl SchedulerConfig {
    /// Defaults with `concurrency_capacity` set.
    #[must_use]
    pub fn with_capacity(concurrency_capacity: usize) -> Self {
        Self {
            concurrency_capacity,
            ..Self::default()
        }
    }

    /// Defaults with capacity equal to the logical CPU count.
    #[must_use]
    pub fn detect() -> Self {
        Self::with_capacity(num_cpus::get())
    }

    /// Jitter margin as a `Duration`.
    #[must_use]
    pub const fn jitter_margin(&self) -> Duration {
        Duration::from_millis(self.jitter_margin_ms)
    }

    /// Shutdown grace as a `Duration`.
    #[must_use]
    pub const fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if self.concurrency_capacity == 0 {
            return Err("concurrency_capacity must be greater than 0".into());
        }
        if u32::try_from(self.concurrency_capacity).is_err() {
            return Err(format!(
                "concurrency_capacity {} is too large",
                self.concurrency_capacity
            ));
        }
        Ok(())
    }

    /// Parse scheduler configuration from a JSON string and validate.
    ///
    /// Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns a description of the parse or validation failure.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load configuration from `CADENCE_*` environment variables, after reading
    /// a `.env` file if one is present. Unset variables keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns a description of the first unparsable variable or validation failure.
    pub fn from_env() -> Result<Self, String> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; `from_env` uses the process environment.
    ///
    /// # Errors
    ///
    /// Returns a description of the first unparsable value or validation failure.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        fn parse<T: std::str::FromStr>(key: &str, raw: Option<String>) -> Result<Option<T>, String>
        where
            T::Err: std::fmt::Display,
        {
            raw.map(|v| {
                v.trim()
                    .parse::<T>()
                    .map_err(|e| format!("{key}: cannot parse `{v}`: {e}"))
            })
            .transpose()
        }

        let mut cfg = Self::default();
        if let Some(v) = parse(ENV_CONCURRENCY, lookup(ENV_CONCURRENCY))? {
            cfg.concurrency_capacity = v;
        }
        if let Some(v) = parse(ENV_JITTER_MARGIN_MS, lookup(ENV_JITTER_MARGIN_MS))? {
            cfg.jitter_margin_ms = v;
        }
        if let Some(v) = parse(ENV_SERIALIZE_PER_TASK, lookup(ENV_SERIALIZE_PER_TASK))? {
            cfg.serialize_per_task = v;
        }
        if let Some(v) = parse(ENV_EVENT_BUFFER, lookup(ENV_EVENT_BUFFER))? {
            cfg.event_buffer = v;
        }
        if let Some(v) = parse(ENV_SHUTDOWN_GRACE_MS, lookup(ENV_SHUTDOWN_GRACE_MS))? {
            cfg.shutdown_grace_ms = v;
        }
        cfg.validate()?;
        Ok(cfg)
    }
}

//! Shared utilities.

pub mod clock;
pub mod random;
pub mod telemetry;
pub mod workload;

pub use clock::*;
pub use random::*;
pub use telemetry::*;
pub use workload::*;

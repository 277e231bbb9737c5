//! Spawning abstraction.

use std::future::Future;

/// Abstraction for spawning the dispatcher and its firings on a runtime.
///
/// Firings call `tokio::task::spawn_blocking` for the work itself, so spawned
/// futures must run inside a tokio runtime context.
pub trait Spawn {
    /// Spawn an async task that returns a future.
    fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static;

    /// Whether `spawn` can be called right now without panicking.
    fn is_available(&self) -> bool {
        true
    }
}

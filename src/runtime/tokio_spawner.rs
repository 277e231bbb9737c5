//! Tokio runtime spawner implementation.

use std::future::Future;
use std::sync::Arc;

use crate::runtime::Spawn;

/// Tokio-based spawner that executes tasks on a tokio runtime.
///
/// Either bound to an explicit handle, or ambient: resolved from the calling
/// context at spawn time.
#[derive(Debug, Clone, Default)]
pub struct TokioSpawner {
    handle: Option<Arc<tokio::runtime::Handle>>,
}

impl TokioSpawner {
    /// Create a new `TokioSpawner` from a tokio runtime handle.
    #[must_use]
    pub fn new(handle: tokio::runtime::Handle) -> Self {
        Self {
            handle: Some(Arc::new(handle)),
        }
    }

    /// Spawner that uses whichever runtime is current when it spawns.
    #[must_use]
    pub const fn ambient() -> Self {
        Self { handle: None }
    }

    /// Bind to the runtime of the calling context, if there is one.
    #[must_use]
    pub fn try_current() -> Option<Self> {
        tokio::runtime::Handle::try_current().ok().map(Self::new)
    }
}

impl Spawn for TokioSpawner {
    fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        match &self.handle {
            Some(handle) => {
                handle.spawn(fut);
            }
            None => {
                tokio::spawn(fut);
            }
        }
    }

    fn is_available(&self) -> bool {
        self.handle.is_some() || tokio::runtime::Handle::try_current().is_ok()
    }
}

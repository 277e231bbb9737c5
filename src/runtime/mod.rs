//! Runtime adapters for driving triggers and firings.

pub mod spawn;
pub mod tokio_spawner;

pub use spawn::Spawn;
pub use tokio_spawner::TokioSpawner;

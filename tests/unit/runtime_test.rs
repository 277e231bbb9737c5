//! Tests for tokio spawner utilities

use prometheus_cadence::runtime::{Spawn, TokioSpawner};

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_tokio_spawner_spawn() {
    let spawner = TokioSpawner::new(tokio::runtime::Handle::current());

    let (tx, rx) = tokio::sync::oneshot::channel();
    spawner.spawn(async move {
        tx.send(123).unwrap();
    });

    let result = rx.await.expect("oneshot result");
    assert_eq!(result, 123);
}

#[tokio::test]
async fn test_ambient_spawner_uses_current_runtime() {
    let spawner = TokioSpawner::ambient();
    assert!(spawner.is_available());

    let (tx, rx) = tokio::sync::oneshot::channel();
    spawner.spawn(async move {
        tx.send("ambient").unwrap();
    });
    assert_eq!(rx.await.unwrap(), "ambient");
}

#[test]
fn test_ambient_spawner_unavailable_outside_runtime() {
    assert!(!TokioSpawner::ambient().is_available());
    assert!(TokioSpawner::try_current().is_none());
}

#[test]
fn test_bound_spawner_available_from_any_thread() {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    let spawner = TokioSpawner::new(runtime.handle().clone());
    assert!(spawner.is_available());
}

//! End-to-end close flow against the mock control plane.
//!
//! These tests drive the worker the way proxy units and the control plane
//! would: connections are registered, cancelled locally, swept, and finally
//! closed on shutdown.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use gatehouse_core::{
    CloseConnectionResponse, CloseInfo, CloseResponseData, ConnectionStatus, ReconcileError,
    SessionRegistry, SessionStatus,
};
use gatehouse_worker::{ConnectionCloser, MockControlPlane, Worker, WorkerConfig};

fn ids(ids: &[&str]) -> HashSet<String> {
    ids.iter().map(|id| id.to_string()).collect()
}

fn close_time_set(registry: &SessionRegistry, session_id: &str, connection_id: &str) -> bool {
    registry
        .get(session_id)
        .and_then(|s| s.with_connection(connection_id, |c| c.close_time().is_some()))
        .unwrap_or(false)
}

#[tokio::test]
async fn mixed_verdicts_with_stale_session() {
    let registry = Arc::new(SessionRegistry::new());
    registry.insert_session("one").unwrap();
    registry.insert_session("three").unwrap();
    registry.add_connection("one", "foo").unwrap();
    registry.add_connection("one", "qux").unwrap();
    registry.add_connection("three", "baz").unwrap();

    let mock = Arc::new(MockControlPlane::new());
    mock.queue_response(CloseConnectionResponse {
        close_response_data: vec![
            CloseResponseData::new("foo", ConnectionStatus::Closed),
            CloseResponseData::new("qux", ConnectionStatus::Connected),
            CloseResponseData::new("bar", ConnectionStatus::Closed),
            CloseResponseData::new("unrequested", ConnectionStatus::Closed),
        ],
    });
    let closer = ConnectionCloser::new(Arc::clone(&registry), mock, &WorkerConfig::default());

    // "two" was torn down locally after the close index was built
    let close_info = CloseInfo::from([
        ("foo".to_string(), "one".to_string()),
        ("qux".to_string(), "one".to_string()),
        ("bar".to_string(), "two".to_string()),
    ]);
    let outcome = closer.close_connections(&close_info).await.unwrap();

    assert_eq!(outcome.closed, ids(&["foo"]));
    assert_eq!(
        outcome.errors,
        vec![ReconcileError::SessionNotFound {
            session_id: "two".to_string()
        }]
    );
    assert!(close_time_set(&registry, "one", "foo"));
    assert!(!close_time_set(&registry, "one", "qux"));
    assert!(!close_time_set(&registry, "three", "baz"));
}

#[tokio::test(start_paused = true)]
async fn proxy_units_stop_and_shutdown_confirms_everything() {
    let registry = Arc::new(SessionRegistry::new());
    let mock = Arc::new(MockControlPlane::new());
    let config = WorkerConfig::default().with_close_sweep_interval(Duration::from_secs(1));
    let worker = Worker::start(&config, Arc::clone(&registry), mock.clone());

    worker.registry().insert_session("one").unwrap();
    worker.registry().insert_session("two").unwrap();

    // Each proxy unit runs until its connection is cancelled
    let mut proxies = vec![];
    for (session_id, connection_id) in [("one", "foo"), ("one", "bar"), ("two", "baz")] {
        let token = worker
            .registry()
            .add_connection(session_id, connection_id)
            .unwrap();
        worker
            .registry()
            .mark_connected(session_id, connection_id)
            .unwrap();
        proxies.push(tokio::spawn(async move { token.cancelled().await }));
    }
    let status = registry
        .get("two")
        .and_then(|s| s.with_connection("baz", |c| c.status()));
    assert_eq!(status, Some(ConnectionStatus::Connected));

    // Session "one" is cancelled upstream; the sweeper confirms its closes
    worker.registry().cancel_session("one").unwrap();
    tokio::time::sleep(Duration::from_millis(1500)).await;

    assert!(close_time_set(&registry, "one", "foo"));
    assert!(close_time_set(&registry, "one", "bar"));
    assert!(!close_time_set(&registry, "two", "baz"));
    assert_eq!(
        registry.get("one").unwrap().status(),
        SessionStatus::Canceling
    );

    let outcome = worker.shutdown().await.unwrap();

    assert_eq!(outcome.closed, ids(&["baz"]));
    assert!(close_time_set(&registry, "two", "baz"));
    let status = registry
        .get("two")
        .and_then(|s| s.with_connection("baz", |c| c.status()));
    assert_eq!(status, Some(ConnectionStatus::Closed));
    for proxy in proxies {
        proxy.await.unwrap();
    }
    assert!(registry.pending_closes().is_empty());
}

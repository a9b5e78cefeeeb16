//! Close rounds against the control plane
//!
//! A close round sends one close request, waits for the verdicts, and
//! applies them to the local [`SessionRegistry`]. If the RPC fails or times
//! out nothing is applied; the connections stay pending and the next round
//! asks again.

use std::sync::Arc;
use std::time::Duration;

use gatehouse_core::{
    CloseInfo, Reconciliation, SessionRegistry, build_close_request, group_by_session, reconcile,
};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::config::WorkerConfig;
use crate::control_plane::ControlPlane;
use crate::error::{Error, Result};

/// Drives close rounds for one worker
pub struct ConnectionCloser {
    registry: Arc<SessionRegistry>,
    control_plane: Arc<dyn ControlPlane>,
    rpc_timeout: Duration,
}

impl ConnectionCloser {
    pub fn new(
        registry: Arc<SessionRegistry>,
        control_plane: Arc<dyn ControlPlane>,
        config: &WorkerConfig,
    ) -> Self {
        Self {
            registry,
            control_plane,
            rpc_timeout: config.rpc_timeout,
        }
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// Run one close round for the connections in `close_info`
    ///
    /// Returns the connections confirmed closed and any local inconsistencies
    /// found while applying the response. Those inconsistencies are logged
    /// here and never fail the round.
    #[instrument(
        name = "close_round",
        skip_all,
        fields(round_id = %Uuid::now_v7(), connections = close_info.len())
    )]
    pub async fn close_connections(&self, close_info: &CloseInfo) -> Result<Reconciliation> {
        if close_info.is_empty() {
            return Ok(Reconciliation::default());
        }

        let request = build_close_request(close_info);
        let response = match tokio::time::timeout(
            self.rpc_timeout,
            self.control_plane.close_connection(request),
        )
        .await
        {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                error!(error = %e, "error marking connections closed");
                return Err(Error::Rpc(e));
            }
            Err(_) => {
                error!(timeout = ?self.rpc_timeout, "close connection RPC timed out");
                return Err(Error::RpcTimeout(self.rpc_timeout));
            }
        };

        let grouped = group_by_session(Some(close_info), Some(&response));
        let outcome = reconcile(&self.registry, &grouped);

        for e in &outcome.errors {
            warn!(error = %e, "error marking connection closed in local state");
        }
        debug!(
            closed = outcome.closed.len(),
            errors = outcome.errors.len(),
            "close round complete"
        );

        Ok(outcome)
    }

    /// Run a close round for every locally cancelled, unconfirmed connection
    pub async fn close_pending(&self) -> Result<Reconciliation> {
        let pending = self.registry.pending_closes();
        self.close_connections(&pending).await
    }

    /// Cancel one session's connections and close them with the control plane
    pub async fn close_session(&self, session_id: &str) -> Result<Reconciliation> {
        let Some(session) = self.registry.get(session_id) else {
            warn!(session_id, "cannot close unknown session");
            return Ok(Reconciliation::default());
        };
        if let Err(e) = self.registry.cancel_session(session_id) {
            warn!(session_id, error = %e, "cannot cancel session");
            return Ok(Reconciliation::default());
        }

        let close_info: CloseInfo = session.with_connections(|connections| {
            connections
                .values()
                .filter(|conn| conn.is_pending_close())
                .map(|conn| (conn.id().to_string(), session_id.to_string()))
                .collect()
        });
        self.close_connections(&close_info).await
    }

    /// Cancel every session and close all of their connections
    ///
    /// Used when the worker shuts down.
    pub async fn close_all(&self) -> Result<Reconciliation> {
        let mut cancelled = 0;
        for session_id in self.registry.session_ids() {
            // Sessions removed since the ID snapshot have nothing left to cancel.
            cancelled += self.registry.cancel_session(&session_id).unwrap_or(0);
        }
        info!(cancelled, "closing all connections");
        self.close_pending().await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use gatehouse_core::{
        CloseConnectionResponse, CloseResponseData, ConnectionStatus, ReconcileError,
        RegistryError, SessionStatus,
    };

    use super::*;
    use crate::mock::MockControlPlane;

    fn setup(mock: MockControlPlane) -> (ConnectionCloser, Arc<SessionRegistry>, Arc<MockControlPlane>) {
        let registry = Arc::new(SessionRegistry::new());
        let mock = Arc::new(mock);
        let config = WorkerConfig::default().with_rpc_timeout(Duration::from_secs(1));
        let closer = ConnectionCloser::new(Arc::clone(&registry), mock.clone(), &config);
        (closer, registry, mock)
    }

    fn close_time_set(registry: &SessionRegistry, session_id: &str, connection_id: &str) -> bool {
        registry
            .get(session_id)
            .and_then(|s| s.with_connection(connection_id, |c| c.close_time().is_some()))
            .unwrap_or(false)
    }

    fn ids(ids: &[&str]) -> HashSet<String> {
        ids.iter().map(|id| id.to_string()).collect()
    }

    #[tokio::test]
    async fn empty_close_info_skips_rpc() {
        let (closer, _registry, mock) = setup(MockControlPlane::new());

        let outcome = closer.close_connections(&CloseInfo::new()).await.unwrap();

        assert_eq!(outcome, Reconciliation::default());
        assert_eq!(mock.request_count(), 0);
    }

    #[tokio::test]
    async fn confirmed_connections_are_stamped() {
        let (closer, registry, mock) = setup(MockControlPlane::new());
        registry.insert_session("one").unwrap();
        registry.add_connection("one", "foo").unwrap();
        registry.add_connection("one", "bar").unwrap();

        let close_info = CloseInfo::from([("foo".to_string(), "one".to_string())]);
        let outcome = closer.close_connections(&close_info).await.unwrap();

        assert_eq!(outcome.closed, ids(&["foo"]));
        assert!(close_time_set(&registry, "one", "foo"));
        assert!(!close_time_set(&registry, "one", "bar"));
        assert_eq!(mock.request_count(), 1);
    }

    #[tokio::test]
    async fn local_inconsistencies_do_not_fail_the_round() {
        let (closer, registry, _mock) = setup(MockControlPlane::new());
        registry.insert_session("one").unwrap();
        registry.add_connection("one", "foo").unwrap();

        let close_info = CloseInfo::from([
            ("foo".to_string(), "one".to_string()),
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
    }

    #[tokio::test]
    async fn rpc_failure_leaves_registry_untouched() {
        let (closer, registry, mock) = setup(MockControlPlane::new());
        mock.queue_error("controller unavailable");
        registry.insert_session("one").unwrap();
        registry.add_connection("one", "foo").unwrap();

        let close_info = CloseInfo::from([("foo".to_string(), "one".to_string())]);
        let result = closer.close_connections(&close_info).await;

        assert!(matches!(result, Err(Error::Rpc(_))));
        assert!(!close_time_set(&registry, "one", "foo"));
    }

    #[tokio::test(start_paused = true)]
    async fn rpc_timeout_leaves_registry_untouched() {
        let (closer, registry, _mock) =
            setup(MockControlPlane::new().with_delay(Duration::from_secs(30)));
        registry.insert_session("one").unwrap();
        registry.add_connection("one", "foo").unwrap();

        let close_info = CloseInfo::from([("foo".to_string(), "one".to_string())]);
        let result = closer.close_connections(&close_info).await;

        assert!(matches!(result, Err(Error::RpcTimeout(d)) if d == Duration::from_secs(1)));
        assert!(!close_time_set(&registry, "one", "foo"));
    }

    #[tokio::test]
    async fn connected_verdicts_stay_pending() {
        let (closer, registry, mock) = setup(MockControlPlane::new());
        mock.queue_response(CloseConnectionResponse {
            close_response_data: vec![CloseResponseData::new("foo", ConnectionStatus::Connected)],
        });
        registry.insert_session("one").unwrap();
        registry.add_connection("one", "foo").unwrap();
        registry.cancel_session("one").unwrap();

        let outcome = closer.close_pending().await.unwrap();

        assert!(outcome.closed.is_empty());
        assert_eq!(registry.pending_closes().len(), 1);

        // Next round uses the default mock reply and confirms the close
        let outcome = closer.close_pending().await.unwrap();
        assert_eq!(outcome.closed, ids(&["foo"]));
        assert!(registry.pending_closes().is_empty());
    }

    #[tokio::test]
    async fn close_session_only_touches_that_session() {
        let (closer, registry, mock) = setup(MockControlPlane::new());
        registry.insert_session("one").unwrap();
        registry.insert_session("two").unwrap();
        registry.add_connection("one", "foo").unwrap();
        let other = registry.add_connection("two", "bar").unwrap();
        registry.cancel_session("two").unwrap();

        let outcome = closer.close_session("one").await.unwrap();

        assert_eq!(outcome.closed, ids(&["foo"]));
        assert!(other.is_cancelled());
        assert!(!close_time_set(&registry, "two", "bar"));
        let requested: Vec<String> = mock.requests()[0]
            .connection_ids()
            .map(str::to_string)
            .collect();
        assert_eq!(requested, vec!["foo".to_string()]);
    }

    #[tokio::test]
    async fn close_session_ignores_pending_closes_of_other_sessions() {
        let (closer, registry, mock) = setup(MockControlPlane::new());
        registry.insert_session("one").unwrap();
        registry.insert_session("two").unwrap();
        registry.add_connection("one", "foo").unwrap();
        registry.add_connection("one", "qux").unwrap();
        registry.add_connection("two", "bar").unwrap();
        registry.add_connection("two", "baz").unwrap();
        registry.cancel_session("two").unwrap();

        closer.close_session("one").await.unwrap();

        let requested: HashSet<String> = mock.requests()[0]
            .connection_ids()
            .map(str::to_string)
            .collect();
        assert_eq!(requested, ids(&["foo", "qux"]));
        assert_eq!(registry.pending_closes().len(), 2);
    }

    #[tokio::test]
    async fn closed_session_rejects_new_connections() {
        let (closer, registry, _mock) = setup(MockControlPlane::new());
        registry.insert_session("one").unwrap();
        registry.add_connection("one", "foo").unwrap();

        closer.close_session("one").await.unwrap();

        assert_eq!(
            registry.add_connection("one", "late").unwrap_err(),
            RegistryError::SessionClosing {
                session_id: "one".to_string(),
                status: SessionStatus::Canceling,
            }
        );
        assert!(registry.owner_of("late").is_none());
    }

    #[tokio::test]
    async fn close_session_for_unknown_session_is_a_no_op() {
        let (closer, _registry, mock) = setup(MockControlPlane::new());

        let outcome = closer.close_session("ghost").await.unwrap();

        assert_eq!(outcome, Reconciliation::default());
        assert_eq!(mock.request_count(), 0);
    }

    #[tokio::test]
    async fn close_all_closes_every_session() {
        let (closer, registry, _mock) = setup(MockControlPlane::new());
        registry.insert_session("one").unwrap();
        registry.insert_session("two").unwrap();
        let foo = registry.add_connection("one", "foo").unwrap();
        let bar = registry.add_connection("two", "bar").unwrap();

        let outcome = closer.close_all().await.unwrap();

        assert_eq!(outcome.closed, ids(&["foo", "bar"]));
        assert!(foo.is_cancelled());
        assert!(bar.is_cancelled());
        assert!(close_time_set(&registry, "one", "foo"));
        assert!(close_time_set(&registry, "two", "bar"));
    }
}

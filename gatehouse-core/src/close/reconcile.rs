//! Applying close verdicts to local session state

use std::collections::HashSet;

use chrono::Utc;
use tracing::{debug, instrument};

use crate::error::ReconcileError;
use crate::protocol::{ConnectionStatus, SessionCloseInfo};
use crate::session::SessionRegistry;

/// Outcome of applying one close response
///
/// Both fields are always fully populated: an error for one session or
/// connection never stops the rest of the response from being applied.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    /// Connection IDs confirmed closed by this call
    pub closed: HashSet<String>,
    /// Sessions or connections named in the response but missing locally
    pub errors: Vec<ReconcileError>,
}

impl Reconciliation {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Stamp every connection the control plane confirmed closed
///
/// Only `Closed` verdicts mutate state. A connection that was already stamped
/// keeps its original close time but is still reported as closed. Each
/// session's connection lock is held only while its own verdicts are applied.
#[instrument(skip_all, fields(sessions = session_close_info.len()))]
pub fn reconcile(
    registry: &SessionRegistry,
    session_close_info: &SessionCloseInfo,
) -> Reconciliation {
    let now = Utc::now();
    let mut outcome = Reconciliation::default();

    for (session_id, verdicts) in session_close_info {
        let Some(session) = registry.get(session_id) else {
            outcome.errors.push(ReconcileError::SessionNotFound {
                session_id: session_id.clone(),
            });
            continue;
        };

        session.with_connections_mut(|connections| {
            for verdict in verdicts {
                if verdict.status != ConnectionStatus::Closed {
                    continue;
                }

                match connections.get_mut(&verdict.connection_id) {
                    Some(conn) => {
                        conn.mark_closed(now);
                        outcome.closed.insert(verdict.connection_id.clone());
                    }
                    None => outcome.errors.push(ReconcileError::ConnectionNotFound {
                        session_id: session_id.clone(),
                        connection_id: verdict.connection_id.clone(),
                    }),
                }
            }
        });
    }

    debug!(
        closed = outcome.closed.len(),
        errors = outcome.errors.len(),
        "close response applied"
    );
    outcome
}

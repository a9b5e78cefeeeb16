//! Grouping of close verdicts by owning session

use tracing::trace;

use crate::protocol::{CloseConnectionResponse, CloseInfo, SessionCloseInfo};

/// Attribute each verdict in `response` to the session that owns it
///
/// `close_info` must be the index the request was built from. Verdicts for
/// connections missing from it are dropped; this round never asked about
/// them. An absent response yields an empty grouping.
///
/// # Panics
///
/// Panics if `close_info` is `None`. Grouping without the index is a caller
/// bug, not a round with nothing to reconcile.
pub fn group_by_session(
    close_info: Option<&CloseInfo>,
    response: Option<&CloseConnectionResponse>,
) -> SessionCloseInfo {
    let Some(close_info) = close_info else {
        panic!("close response grouped without the connection close index it was requested for");
    };

    let mut grouped = SessionCloseInfo::new();
    let Some(response) = response else {
        return grouped;
    };

    for verdict in &response.close_response_data {
        match close_info.get(&verdict.connection_id) {
            Some(session_id) => grouped
                .entry(session_id.clone())
                .or_default()
                .push(verdict.clone()),
            None => trace!(
                connection_id = %verdict.connection_id,
                status = %verdict.status,
                "dropping close verdict for connection outside this round"
            ),
        }
    }

    grouped
}

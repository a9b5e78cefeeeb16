//! Per-connection bookkeeping

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

use crate::protocol::ConnectionStatus;

/// A single proxied connection belonging to one session
///
/// The proxy unit carrying the connection's traffic holds a clone of
/// `cancel` and stops when it fires. `close_time` is only ever set once,
/// when the control plane first confirms the connection closed.
#[derive(Debug)]
pub struct ConnInfo {
    id: String,
    status: ConnectionStatus,
    close_time: Option<DateTime<Utc>>,
    cancel: CancellationToken,
}

impl ConnInfo {
    /// Create a record for a newly authorized connection
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: ConnectionStatus::Authorized,
            close_time: None,
            cancel: CancellationToken::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    pub fn set_status(&mut self, status: ConnectionStatus) {
        self.status = status;
    }

    /// When the control plane confirmed this connection closed, if it has
    pub fn close_time(&self) -> Option<DateTime<Utc>> {
        self.close_time
    }

    /// Token the proxy unit watches for local cancellation
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Stop the connection locally
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Cancelled locally but not yet confirmed closed by the control plane
    pub fn is_pending_close(&self) -> bool {
        self.is_cancelled() && self.close_time.is_none()
    }

    /// Record the control plane's close confirmation
    ///
    /// The first confirmation wins: an existing `close_time` is kept. Returns
    /// `true` if this call stamped the time.
    pub fn mark_closed(&mut self, at: DateTime<Utc>) -> bool {
        self.status = ConnectionStatus::Closed;
        if self.close_time.is_some() {
            return false;
        }
        self.close_time = Some(at);
        true
    }
}

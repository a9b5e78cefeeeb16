//! Per-session record and status

use std::collections::HashMap;
use std::fmt;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use super::conn::ConnInfo;

/// Lifecycle status of a session as tracked by the worker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Accepted from the control plane, no connection yet
    #[default]
    Pending,
    /// At least one connection has been established
    Active,
    /// Connections are being torn down; no new connections are accepted
    Canceling,
    /// Removed from the registry; no new connections are accepted
    Terminated,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Active => write!(f, "active"),
            Self::Canceling => write!(f, "canceling"),
            Self::Terminated => write!(f, "terminated"),
        }
    }
}

/// A session and the connections it owns
///
/// Connections are guarded by a per-session lock so that work on one
/// session never blocks work on another.
#[derive(Debug)]
pub struct SessionInfo {
    id: String,
    status: RwLock<SessionStatus>,
    connections: RwLock<HashMap<String, ConnInfo>>,
}

impl SessionInfo {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: RwLock::new(SessionStatus::Pending),
            connections: RwLock::new(HashMap::new()),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn status(&self) -> SessionStatus {
        *self.status.read()
    }

    pub fn set_status(&self, status: SessionStatus) {
        *self.status.write() = status;
    }

    /// Read access to the connection map
    ///
    /// Uses the callback pattern so the lock is never held across an await.
    pub fn with_connections<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&HashMap<String, ConnInfo>) -> R,
    {
        f(&*self.connections.read())
    }

    /// Write access to the connection map
    pub fn with_connections_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut HashMap<String, ConnInfo>) -> R,
    {
        f(&mut *self.connections.write())
    }

    /// Run `f` against one connection, if the session owns it
    pub fn with_connection<F, R>(&self, connection_id: &str, f: F) -> Option<R>
    where
        F: FnOnce(&ConnInfo) -> R,
    {
        self.connections.read().get(connection_id).map(f)
    }

    pub fn connection_ids(&self) -> Vec<String> {
        self.connections.read().keys().cloned().collect()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.read().len()
    }
}

//! Error types for gatehouse-core

use thiserror::Error;

use crate::session::SessionStatus;

/// Recoverable inconsistencies found while applying a close response
///
/// These never abort a reconciliation pass. They are collected and handed
/// back to the caller alongside the confirmed-closed set.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReconcileError {
    #[error("could not find session ID {session_id:?} in local state after closing connections")]
    SessionNotFound { session_id: String },

    #[error(
        "could not find connection ID {connection_id:?} for session ID {session_id:?} in local state after closing connections"
    )]
    ConnectionNotFound {
        session_id: String,
        connection_id: String,
    },
}

/// Errors from maintaining the session registry
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Session already registered: {0}")]
    SessionExists(String),

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Session {session_id} is {status} and accepts no new connections")]
    SessionClosing {
        session_id: String,
        status: SessionStatus,
    },

    #[error("Connection {connection_id} is already owned by session {session_id}")]
    ConnectionOwned {
        connection_id: String,
        session_id: String,
    },

    #[error("Connection {connection_id} not found in session {session_id}")]
    ConnectionNotFound {
        session_id: String,
        connection_id: String,
    },
}

//! SessionRegistry for tracking sessions and their connections
//!
//! The registry is shared by every proxy unit on the worker and by the close
//! reconciler. Lookups and mutations are point operations on a sharded map,
//! so unrelated sessions never contend on a registry-wide lock.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::RegistryError;
use crate::protocol::{CloseInfo, ConnectionStatus};

use super::conn::ConnInfo;
use super::info::{SessionInfo, SessionStatus};

/// Concurrent index of all sessions known to the worker
#[derive(Debug, Default)]
pub struct SessionRegistry {
    /// Sessions indexed by ID
    sessions: DashMap<String, Arc<SessionInfo>>,
    /// Owning session ID indexed by connection ID
    owners: DashMap<String, String>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session accepted from the control plane
    pub fn insert_session(&self, id: impl Into<String>) -> Result<Arc<SessionInfo>, RegistryError> {
        let id = id.into();
        match self.sessions.entry(id.clone()) {
            Entry::Occupied(_) => Err(RegistryError::SessionExists(id)),
            Entry::Vacant(vacant) => {
                let session = Arc::new(SessionInfo::new(id.clone()));
                vacant.insert(Arc::clone(&session));
                debug!(session_id = %id, "session registered");
                Ok(session)
            }
        }
    }

    /// Get a session by ID
    ///
    /// The returned handle stays valid after the session is removed from the
    /// registry; removal only stops new lookups from finding it.
    pub fn get(&self, id: &str) -> Option<Arc<SessionInfo>> {
        self.sessions.get(id).map(|entry| Arc::clone(entry.value()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.sessions.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn session_ids(&self) -> Vec<String> {
        self.sessions.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Session that currently owns a connection
    pub fn owner_of(&self, connection_id: &str) -> Option<String> {
        self.owners
            .get(connection_id)
            .map(|entry| entry.value().clone())
    }

    /// Remove a session and release its connection IDs
    ///
    /// The session is marked `Terminated` under its connection lock, so an
    /// `add_connection` racing this call either lands before the release or
    /// is rejected.
    pub fn remove_session(&self, id: &str) -> Result<Arc<SessionInfo>, RegistryError> {
        let (_, session) = self
            .sessions
            .remove(id)
            .ok_or_else(|| RegistryError::SessionNotFound(id.to_string()))?;

        session.with_connections_mut(|connections| {
            session.set_status(SessionStatus::Terminated);
            for connection_id in connections.keys() {
                self.owners
                    .remove_if(connection_id, |_, owner| owner.as_str() == id);
            }
        });

        debug!(session_id = %id, "session removed");
        Ok(session)
    }

    /// Register a new connection for a session
    ///
    /// Returns the token the proxy unit should watch for local cancellation.
    /// A connection ID may belong to only one session at a time, and sessions
    /// that are canceling or terminated accept no new connections.
    pub fn add_connection(
        &self,
        session_id: &str,
        connection_id: impl Into<String>,
    ) -> Result<CancellationToken, RegistryError> {
        let connection_id = connection_id.into();
        let session = self
            .get(session_id)
            .ok_or_else(|| RegistryError::SessionNotFound(session_id.to_string()))?;

        // Status check, owner claim and insert happen under one session lock.
        let token = session.with_connections_mut(|connections| {
            match session.status() {
                SessionStatus::Terminated => {
                    return Err(RegistryError::SessionNotFound(session_id.to_string()));
                }
                status @ SessionStatus::Canceling => {
                    return Err(RegistryError::SessionClosing {
                        session_id: session_id.to_string(),
                        status,
                    });
                }
                SessionStatus::Pending | SessionStatus::Active => {}
            }

            match self.owners.entry(connection_id.clone()) {
                Entry::Occupied(owner) => {
                    return Err(RegistryError::ConnectionOwned {
                        connection_id: connection_id.clone(),
                        session_id: owner.get().clone(),
                    });
                }
                Entry::Vacant(vacant) => {
                    vacant.insert(session_id.to_string());
                }
            }

            let conn = ConnInfo::new(connection_id.clone());
            let token = conn.cancel_token();
            connections.insert(connection_id.clone(), conn);
            if session.status() == SessionStatus::Pending {
                session.set_status(SessionStatus::Active);
            }
            Ok(token)
        })?;

        debug!(session_id, connection_id = %connection_id, "connection registered");
        Ok(token)
    }

    /// Record that a connection's proxy is now carrying traffic
    pub fn mark_connected(&self, session_id: &str, connection_id: &str) -> Result<(), RegistryError> {
        let session = self
            .get(session_id)
            .ok_or_else(|| RegistryError::SessionNotFound(session_id.to_string()))?;

        session.with_connections_mut(|connections| {
            let conn = connections
                .get_mut(connection_id)
                .ok_or_else(|| RegistryError::ConnectionNotFound {
                    session_id: session_id.to_string(),
                    connection_id: connection_id.to_string(),
                })?;
            if conn.close_time().is_none() {
                conn.set_status(ConnectionStatus::Connected);
            }
            Ok(())
        })
    }

    /// Remove a connection from its session
    pub fn remove_connection(
        &self,
        session_id: &str,
        connection_id: &str,
    ) -> Result<(), RegistryError> {
        let session = self
            .get(session_id)
            .ok_or_else(|| RegistryError::SessionNotFound(session_id.to_string()))?;

        session.with_connections_mut(|connections| {
            if connections.remove(connection_id).is_none() {
                return Err(RegistryError::ConnectionNotFound {
                    session_id: session_id.to_string(),
                    connection_id: connection_id.to_string(),
                });
            }
            self.owners
                .remove_if(connection_id, |_, owner| owner.as_str() == session_id);
            Ok(())
        })
    }

    /// Cancel every connection of a session that is not yet confirmed closed
    ///
    /// The session moves to `Canceling` and stops accepting connections.
    /// Returns the number of connections cancelled by this call.
    pub fn cancel_session(&self, session_id: &str) -> Result<usize, RegistryError> {
        let session = self
            .get(session_id)
            .ok_or_else(|| RegistryError::SessionNotFound(session_id.to_string()))?;

        let cancelled = session.with_connections_mut(|connections| {
            if session.status() != SessionStatus::Terminated {
                session.set_status(SessionStatus::Canceling);
            }
            connections
                .values()
                .filter(|conn| conn.close_time().is_none() && !conn.is_cancelled())
                .inspect(|conn| conn.cancel())
                .count()
        });

        debug!(session_id, cancelled, "session connections cancelled");
        Ok(cancelled)
    }

    /// Connections cancelled locally that the control plane has not yet
    /// confirmed closed, mapped to their owning session
    pub fn pending_closes(&self) -> CloseInfo {
        let sessions: Vec<Arc<SessionInfo>> = self
            .sessions
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();

        let mut close_info = CloseInfo::new();
        for session in sessions {
            session.with_connections(|connections| {
                for conn in connections.values().filter(|conn| conn.is_pending_close()) {
                    close_info.insert(conn.id().to_string(), session.id().to_string());
                }
            });
        }
        close_info
    }
}

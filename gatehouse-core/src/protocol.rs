//! Worker <-> control plane close messages
//!
//! These are the decoded forms of the close request and response. The
//! transport that frames and carries them lives outside this crate.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Connections a caller wants closed, keyed by connection ID with the owning
/// session ID as value.
pub type CloseInfo = HashMap<String, String>;

/// Close verdicts grouped by the session that owns each connection.
pub type SessionCloseInfo = HashMap<String, Vec<CloseResponseData>>;

/// Why a connection close was requested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReasonCode {
    #[default]
    Unknown,
    TimedOut,
    ClosedByUser,
    Canceled,
    NetworkError,
    SystemError,
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => write!(f, "unknown"),
            Self::TimedOut => write!(f, "timed out"),
            Self::ClosedByUser => write!(f, "closed by end-user"),
            Self::Canceled => write!(f, "canceled"),
            Self::NetworkError => write!(f, "network error"),
            Self::SystemError => write!(f, "system error"),
        }
    }
}

/// Status of a connection as seen by the control plane
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionStatus {
    #[default]
    Unspecified,
    Authorized,
    Connected,
    Closed,
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unspecified => write!(f, "unspecified"),
            Self::Authorized => write!(f, "authorized"),
            Self::Connected => write!(f, "connected"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

/// One connection the worker asks the control plane to close
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CloseRequestData {
    pub connection_id: String,
    pub reason: ReasonCode,
}

/// Close request sent to the control plane
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CloseConnectionRequest {
    #[serde(default)]
    pub close_request_data: Vec<CloseRequestData>,
}

impl CloseConnectionRequest {
    /// Connection IDs named in this request
    pub fn connection_ids(&self) -> impl Iterator<Item = &str> {
        self.close_request_data
            .iter()
            .map(|data| data.connection_id.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.close_request_data.is_empty()
    }
}

/// The control plane's verdict for one connection
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CloseResponseData {
    pub connection_id: String,
    pub status: ConnectionStatus,
}

impl CloseResponseData {
    pub fn new(connection_id: impl Into<String>, status: ConnectionStatus) -> Self {
        Self {
            connection_id: connection_id.into(),
            status,
        }
    }
}

/// Close response received from the control plane
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CloseConnectionResponse {
    #[serde(default)]
    pub close_response_data: Vec<CloseResponseData>,
}

//! Error types for gatehouse-worker.

use std::path::PathBuf;
use std::time::Duration;

/// Failure reported by the control plane RPC channel.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct RpcError {
    message: String,
}

impl RpcError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Error type for worker operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The close RPC returned an error.
    #[error("Close connection RPC failed: {0}")]
    Rpc(#[from] RpcError),

    /// The close RPC did not answer in time.
    #[error("Close connection RPC timed out after {0:?}")]
    RpcTimeout(Duration),

    /// The config file could not be read.
    #[error("Failed to read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML for [`WorkerConfig`](crate::WorkerConfig).
    #[error("Invalid config: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

/// Result type alias for worker operations.
pub type Result<T> = std::result::Result<T, Error>;

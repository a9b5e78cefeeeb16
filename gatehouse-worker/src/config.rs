//! Configuration for the close round driver.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Worker-side settings for closing connections with the control plane.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Interval between sweeps for locally cancelled connections.
    #[serde(default = "default_close_sweep_interval", with = "humantime_serde")]
    pub close_sweep_interval: Duration,

    /// Maximum time to wait for the control plane to answer a close request.
    #[serde(default = "default_rpc_timeout", with = "humantime_serde")]
    pub rpc_timeout: Duration,
}

fn default_close_sweep_interval() -> Duration {
    Duration::from_secs(2)
}

fn default_rpc_timeout() -> Duration {
    Duration::from_secs(10)
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            close_sweep_interval: default_close_sweep_interval(),
            rpc_timeout: default_rpc_timeout(),
        }
    }
}

impl WorkerConfig {
    /// Load configuration from a TOML file. Missing fields take defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Create a new config with a custom sweep interval.
    #[must_use]
    pub fn with_close_sweep_interval(mut self, interval: Duration) -> Self {
        self.close_sweep_interval = interval;
        self
    }

    /// Create a new config with a custom RPC timeout.
    #[must_use]
    pub fn with_rpc_timeout(mut self, timeout: Duration) -> Self {
        self.rpc_timeout = timeout;
        self
    }
}

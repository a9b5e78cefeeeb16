//! Worker-level wiring of the registry, close rounds and sweeper.

use std::sync::Arc;

use gatehouse_core::{Reconciliation, SessionRegistry};
use tracing::info;

use crate::closer::ConnectionCloser;
use crate::config::WorkerConfig;
use crate::control_plane::ControlPlane;
use crate::error::Result;
use crate::sweeper::CloseSweeper;

/// A running worker's close machinery.
///
/// Owns the background sweep and exposes the shared registry that proxy
/// units register sessions and connections in.
pub struct Worker {
    closer: Arc<ConnectionCloser>,
    sweeper: CloseSweeper,
}

impl Worker {
    /// Start the close sweep for `registry`.
    pub fn start(
        config: &WorkerConfig,
        registry: Arc<SessionRegistry>,
        control_plane: Arc<dyn ControlPlane>,
    ) -> Self {
        let closer = Arc::new(ConnectionCloser::new(registry, control_plane, config));
        let sweeper = CloseSweeper::spawn(Arc::clone(&closer), config.close_sweep_interval);
        info!("Worker close machinery started");
        Self { closer, sweeper }
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        self.closer.registry()
    }

    pub fn closer(&self) -> &Arc<ConnectionCloser> {
        &self.closer
    }

    /// Stop sweeping, then cancel and close every remaining connection.
    pub async fn shutdown(self) -> Result<Reconciliation> {
        self.sweeper.shutdown();
        self.sweeper.wait().await;
        self.closer.close_all().await
    }
}

//! Background sweep for locally cancelled connections.
//!
//! Proxy units cancel connections locally as soon as they stop carrying
//! traffic. The sweeper periodically collects those that the control plane
//! has not yet confirmed closed and runs a close round for them. A failed
//! round is logged and retried on the next tick.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::closer::ConnectionCloser;

/// Handle to a running close sweep task.
pub struct CloseSweeper {
    handle: JoinHandle<()>,
    shutdown: CancellationToken,
}

impl CloseSweeper {
    /// Spawn the sweep task. The first sweep runs immediately.
    pub fn spawn(closer: Arc<ConnectionCloser>, interval: Duration) -> Self {
        let shutdown = CancellationToken::new();
        let token = shutdown.clone();

        let handle = tokio::spawn(async move {
            info!(interval = ?interval, "Close sweeper started");

            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = token.cancelled() => {
                        info!("Close sweeper received shutdown signal");
                        break;
                    }
                    _ = ticker.tick() => {
                        match closer.close_pending().await {
                            Ok(outcome) if outcome.closed.is_empty() && outcome.errors.is_empty() => {
                                trace!("Nothing pending close");
                            }
                            Ok(outcome) => {
                                debug!(closed = outcome.closed.len(), errors = outcome.errors.len(), "Sweep complete");
                            }
                            Err(e) => {
                                warn!(error = %e, "Close sweep failed, retrying next tick");
                            }
                        }
                    }
                }
            }

            info!("Close sweeper stopped");
        });

        Self { handle, shutdown }
    }

    /// Signal the sweep task to stop after its current round.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Wait for the sweep task to finish.
    pub async fn wait(self) {
        if let Err(e) = self.handle.await {
            warn!(error = %e, "Close sweeper task panicked");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

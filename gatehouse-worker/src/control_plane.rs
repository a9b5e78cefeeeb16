//! The worker's view of the control plane RPC channel.

use async_trait::async_trait;
use gatehouse_core::{CloseConnectionRequest, CloseConnectionResponse};

use crate::error::RpcError;

/// Control plane calls used by the close round.
///
/// Framing, authentication and retries belong to the implementation; the
/// close round only sees a decoded response or an error.
#[async_trait]
pub trait ControlPlane: Send + Sync {
    /// Ask the control plane to close connections and report their status.
    async fn close_connection(
        &self,
        request: CloseConnectionRequest,
    ) -> Result<CloseConnectionResponse, RpcError>;
}

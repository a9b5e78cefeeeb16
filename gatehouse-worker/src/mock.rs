//! Mock control plane for testing
//!
//! MockControlPlane confirms every requested connection closed unless
//! responses are queued with `queue_response()` or `queue_error()`. Each
//! call consumes one queued entry.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use gatehouse_core::{
    CloseConnectionRequest, CloseConnectionResponse, CloseResponseData, ConnectionStatus,
};
use parking_lot::Mutex;

use crate::control_plane::ControlPlane;
use crate::error::RpcError;

/// Scriptable in-memory [`ControlPlane`]
#[derive(Default)]
pub struct MockControlPlane {
    /// Every request received, in order
    requests: Mutex<Vec<CloseConnectionRequest>>,
    /// Queued replies (each call consumes one)
    replies: Mutex<VecDeque<Result<CloseConnectionResponse, RpcError>>>,
    /// Artificial latency before replying
    delay: Option<Duration>,
}

impl MockControlPlane {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every reply, e.g. to exercise RPC timeouts
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Queue a response to be returned on the next call
    pub fn queue_response(&self, response: CloseConnectionResponse) {
        self.replies.lock().push_back(Ok(response));
    }

    /// Queue an RPC failure (convenience method)
    pub fn queue_error(&self, message: &str) {
        self.replies.lock().push_back(Err(RpcError::new(message)));
    }

    pub fn requests(&self) -> Vec<CloseConnectionRequest> {
        self.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl ControlPlane for MockControlPlane {
    async fn close_connection(
        &self,
        request: CloseConnectionRequest,
    ) -> Result<CloseConnectionResponse, RpcError> {
        self.requests.lock().push(request.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let queued = self.replies.lock().pop_front();
        match queued {
            Some(reply) => reply,
            None => Ok(CloseConnectionResponse {
                close_response_data: request
                    .connection_ids()
                    .map(|id| CloseResponseData::new(id, ConnectionStatus::Closed))
                    .collect(),
            }),
        }
    }
}

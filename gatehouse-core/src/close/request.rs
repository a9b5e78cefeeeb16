//! Close request construction

use crate::protocol::{CloseConnectionRequest, CloseInfo, CloseRequestData, ReasonCode};

/// Build the close request for every connection in `close_info`
///
/// Closes issued from the worker side carry no differentiated reason, so each
/// entry uses [`ReasonCode::Unknown`]. Session IDs are not consulted here;
/// they are kept in `close_info` to group the response later.
pub fn build_close_request(close_info: &CloseInfo) -> CloseConnectionRequest {
    CloseConnectionRequest {
        close_request_data: close_info
            .keys()
            .map(|connection_id| CloseRequestData {
                connection_id: connection_id.clone(),
                reason: ReasonCode::Unknown,
            })
            .collect(),
    }
}

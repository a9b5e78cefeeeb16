//! Connection close reconciliation
//!
//! A close round has three synchronous steps around one RPC:
//!
//! 1. [`build_close_request`] turns the close index into a wire request
//! 2. [`group_by_session`] attributes each verdict in the response to a session
//! 3. [`reconcile`] stamps confirmed closures into the [`SessionRegistry`]
//!
//! [`SessionRegistry`]: crate::session::SessionRegistry

pub mod group;
pub mod reconcile;
pub mod request;

pub use group::group_by_session;
pub use reconcile::{Reconciliation, reconcile};
pub use request::build_close_request;

//! gatehouse-core: Local session state for gatehouse workers
//!
//! A worker proxies sessions on behalf of the control plane. Each session owns
//! one or more connections, and the worker has to agree with the control plane
//! about which of them are closed. This crate provides:
//!
//! - **Session registry** - [`SessionRegistry`] holding [`SessionInfo`] and [`ConnInfo`] records
//! - **Wire types** - [`CloseConnectionRequest`] and [`CloseConnectionResponse`]
//! - **Close reconciliation** - [`build_close_request`], [`group_by_session`] and [`reconcile`]
//!
//! # Close round
//!
//! ```text
//!  CloseInfo (conn -> session)
//!        │
//!        ├──► build_close_request ──► control plane ──► CloseConnectionResponse
//!        │                                                      │
//!        └──────────────────────► group_by_session ◄────────────┘
//!                                        │
//!                                        ▼
//!                             reconcile(&SessionRegistry)
//!                                        │
//!                                        ▼
//!                       Reconciliation { closed, errors }
//! ```
//!
//! # Quick Start
//!
//! ```
//! use gatehouse_core::{
//!     CloseConnectionResponse, CloseInfo, CloseResponseData, ConnectionStatus, SessionRegistry,
//!     build_close_request, group_by_session, reconcile,
//! };
//!
//! let registry = SessionRegistry::new();
//! registry.insert_session("s_1").unwrap();
//! registry.add_connection("s_1", "sc_1").unwrap();
//!
//! let close_info = CloseInfo::from([("sc_1".to_string(), "s_1".to_string())]);
//! let request = build_close_request(&close_info);
//! assert_eq!(request.close_request_data.len(), 1);
//!
//! let response = CloseConnectionResponse {
//!     close_response_data: vec![CloseResponseData::new("sc_1", ConnectionStatus::Closed)],
//! };
//! let grouped = group_by_session(Some(&close_info), Some(&response));
//! let outcome = reconcile(&registry, &grouped);
//!
//! assert!(outcome.closed.contains("sc_1"));
//! assert!(outcome.errors.is_empty());
//! ```

pub mod close;
pub mod error;
pub mod protocol;
pub mod session;

// Re-export key types for convenience
pub use close::{Reconciliation, build_close_request, group_by_session, reconcile};
pub use error::{ReconcileError, RegistryError};
pub use protocol::{
    CloseConnectionRequest, CloseConnectionResponse, CloseInfo, CloseRequestData,
    CloseResponseData, ConnectionStatus, ReasonCode, SessionCloseInfo,
};
pub use session::{ConnInfo, SessionInfo, SessionRegistry, SessionStatus};

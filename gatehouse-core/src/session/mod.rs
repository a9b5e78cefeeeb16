//! Session and connection tracking

pub mod conn;
pub mod info;
pub mod registry;

// Re-export key types for convenience
pub use conn::ConnInfo;
pub use info::{SessionInfo, SessionStatus};
pub use registry::SessionRegistry;

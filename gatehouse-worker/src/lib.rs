//! Close round driver for gatehouse workers.
//!
//! This crate connects the session registry from `gatehouse-core` to the
//! control plane. It runs close rounds over an abstract RPC channel and
//! sweeps locally cancelled connections in the background.
//!
//! # Key Types
//!
//! - [`ControlPlane`] - Trait for the close connection RPC
//! - [`ConnectionCloser`] - Runs one close round end to end
//! - [`CloseSweeper`] - Periodic background close rounds
//! - [`Worker`] - Starts the sweeper and closes everything on shutdown
//! - [`WorkerConfig`] - TOML configuration

pub mod closer;
pub mod config;
pub mod control_plane;
pub mod error;
pub mod mock;
pub mod sweeper;
pub mod worker;

// Re-exports
pub use closer::ConnectionCloser;
pub use config::WorkerConfig;
pub use control_plane::ControlPlane;
pub use error::{Error, Result, RpcError};
pub use mock::MockControlPlane;
pub use sweeper::CloseSweeper;
pub use worker::Worker;

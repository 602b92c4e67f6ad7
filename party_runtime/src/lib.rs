#![forbid(unsafe_code)]

//! Party runtime
//!
//! Wraps the party kernel with a protobuf action log, snapshots, replay,
//! session management and configuration. Tracing setup is shared with the
//! kernel binary through `party_engine::telemetry`.
//!
//! No party rules live here; every transition and invariant is delegated
//! to the kernel.

pub mod errors;
pub mod config;
pub mod proto_types;
pub mod proto_bridge;
pub mod action_log;
pub mod replay;
pub mod snapshot;
pub mod session;

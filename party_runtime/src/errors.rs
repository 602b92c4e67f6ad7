//! Runtime failures. Domain rejections never show up here: they are part of
//! the action stream and reported through `TransitionResult`.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use party_engine::errors::{EngineError, InvariantViolation};

use crate::proto_bridge::BridgeError;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("protobuf decode error: {0}")]
    Decode(#[from] prost::DecodeError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("bridge error: {0}")]
    Bridge(#[from] BridgeError),

    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("restored state is inconsistent: {0}")]
    Invariant(#[from] InvariantViolation),

    #[error("action log sequence violation: expected {expected}, got {got}")]
    LogSequence { expected: u64, got: u64 },

    #[error("corrupt action log {path}: {detail}")]
    CorruptLog { path: PathBuf, detail: String },

    #[error("snapshot {sequence} hash mismatch")]
    SnapshotHash { sequence: u64 },

    #[error("snapshot written by kernel v{got}, this is kernel v{expected}")]
    KernelVersion { expected: u32, got: u32 },

    #[error("cannot read config {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("session lock poisoned")]
    LockPoisoned,
}

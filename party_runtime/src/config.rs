//! Runtime configuration, loaded from a JSON file.
//!
//! ```json
//! {
//!   "data_dir": "data/sessions",
//!   "snapshot_interval": 100,
//!   "constants": { "pz_locked_ms": 60000, "max_status_distance": 30 }
//! }
//! ```
//!
//! Every field is optional; missing ones take their defaults.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use party_engine::domain::PartyConstants;

use crate::errors::RuntimeError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Root under which each session gets its own directory.
    pub data_dir: PathBuf,
    /// Snapshot every N actions; 0 disables snapshots.
    pub snapshot_interval: u64,
    /// Constants injected as the first action of a new session.
    pub constants: PartyConstants,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data/sessions"),
            snapshot_interval: 100,
            constants: PartyConstants::default(),
        }
    }
}

/// Load from `path`, or defaults when no path is given.
pub fn load_config(path: Option<&Path>) -> Result<RuntimeConfig, RuntimeError> {
    let Some(path) = path else {
        return Ok(RuntimeConfig::default());
    };
    let text = fs::read_to_string(path).map_err(|source| RuntimeError::Config {
        path: path.to_path_buf(),
        source,
    })?;
    let config: RuntimeConfig = serde_json::from_str(&text)?;
    info!(path = %path.display(), data_dir = %config.data_dir.display(), "config loaded");
    Ok(config)
}

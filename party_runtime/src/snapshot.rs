//! Snapshot layer — deterministic world snapshots.
//!
//! A snapshot stores the full world (serde JSON, the form the kernel can
//! load back) next to its canonical hash. No timestamps in snapshot content.
//! Restoring recomputes the canonical hash and re-runs the invariant
//! checks; any mismatch means the caller falls back to full replay.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use party_engine::domain::WorldState;
use party_engine::hashing::canonical_hash;
use party_engine::invariants::check_invariants;
use party_engine::KERNEL_VERSION;

use crate::errors::RuntimeError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Sequence of the last action folded into `state`.
    pub sequence: u64,
    pub kernel_version: u32,
    /// Canonical hash of `state`.
    pub hash: String,
    pub state: WorldState,
}

fn snapshot_path(dir: &Path, sequence: u64) -> PathBuf {
    dir.join(format!("snapshot_{:06}.json", sequence))
}

pub fn save_snapshot(dir: &Path, sequence: u64, state: &WorldState) -> Result<PathBuf, RuntimeError> {
    fs::create_dir_all(dir)?;
    let snap = Snapshot {
        sequence,
        kernel_version: KERNEL_VERSION,
        hash: canonical_hash(state)?,
        state: state.clone(),
    };
    let path = snapshot_path(dir, sequence);
    let content = serde_json::to_vec(&snap)?;
    let mut file = File::create(&path)?;
    file.write_all(&content)?;
    file.sync_all()?;
    debug!(sequence, hash = %snap.hash, "snapshot saved");
    Ok(path)
}

/// `None` when no snapshot exists at `sequence`.
pub fn load_snapshot(dir: &Path, sequence: u64) -> Result<Option<Snapshot>, RuntimeError> {
    let path = snapshot_path(dir, sequence);
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read(&path)?;
    Ok(Some(serde_json::from_slice(&content)?))
}

/// Highest-sequence snapshot in `dir`, if any.
pub fn load_latest_snapshot(dir: &Path) -> Result<Option<Snapshot>, RuntimeError> {
    if !dir.exists() {
        return Ok(None);
    }
    let mut best: Option<u64> = None;
    for entry in fs::read_dir(dir)? {
        let name = entry?.file_name();
        let seq = name
            .to_string_lossy()
            .strip_prefix("snapshot_")
            .and_then(|s| s.strip_suffix(".json"))
            .and_then(|s| s.parse::<u64>().ok());
        if let Some(seq) = seq {
            best = Some(best.map_or(seq, |b| b.max(seq)));
        }
    }
    match best {
        Some(seq) => load_snapshot(dir, seq),
        None => Ok(None),
    }
}

/// True when the stored hash matches the state it was stored with.
pub fn verify_snapshot_hash(snap: &Snapshot) -> Result<bool, RuntimeError> {
    Ok(canonical_hash(&snap.state)? == snap.hash)
}

/// Validate a snapshot and hand back its world for `PartyEngine::resume`.
pub fn restore(snap: Snapshot) -> Result<WorldState, RuntimeError> {
    if snap.kernel_version != KERNEL_VERSION {
        return Err(RuntimeError::KernelVersion {
            expected: KERNEL_VERSION,
            got: snap.kernel_version,
        });
    }
    if !verify_snapshot_hash(&snap)? {
        warn!(sequence = snap.sequence, "snapshot hash mismatch");
        return Err(RuntimeError::SnapshotHash {
            sequence: snap.sequence,
        });
    }
    check_invariants(&snap.state)?;
    Ok(snap.state)
}

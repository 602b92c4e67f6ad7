//! Session manager — isolated sessions with persist-after-apply semantics.
//!
//! Each session gets its own directory:
//!   <data_dir>/<session_id>/actions.log
//!   <data_dir>/<session_id>/snapshots/
//!
//! Apply-before-persist order:
//!   1. engine.apply(envelope): a fault leaves engine and log untouched
//!   2. action_log.append(): rejected party actions are logged too
//!   3. snapshot if the interval is reached
//!
//! Concurrency: `SharedSession` serialises writers behind a Mutex.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use tracing::{debug, info, warn};

use party_engine::domain::{TransitionResult, WorldState};
use party_engine::engine::PartyEngine;
use party_engine::events::{ActionEnvelope, PartyAction};
use party_engine::hashing::canonical_hash;
use party_engine::hooks::{AllowAll, PartyHooks};

use crate::action_log::ActionLog;
use crate::config::RuntimeConfig;
use crate::errors::RuntimeError;
use crate::proto_bridge::{kernel_to_proto, proto_to_kernel};
use crate::proto_types::ProtoActionEnvelope;
use crate::snapshot;

pub struct Session {
    session_id: String,
    dir: PathBuf,
    engine: PartyEngine,
    log: ActionLog,
    snapshot_interval: u64,
}

impl Session {
    pub fn open(config: &RuntimeConfig, session_id: &str) -> Result<Self, RuntimeError> {
        Self::open_with_hooks(config, session_id, Box::new(AllowAll))
    }

    /// Open or create a session. A new session starts with the configured
    /// constants as action 1. An existing one resumes from its newest valid
    /// snapshot and replays the log tail, or replays the whole log.
    pub fn open_with_hooks(
        config: &RuntimeConfig,
        session_id: &str,
        hooks: Box<dyn PartyHooks>,
    ) -> Result<Self, RuntimeError> {
        let dir = config.data_dir.join(session_id);
        let log = ActionLog::open(&dir.join("actions.log"))?;
        let frames = log.load_all()?;

        let resumed = Self::usable_snapshot(&dir.join("snapshots"), log.last_sequence());
        let (mut engine, tail) = match resumed {
            Some((state, seq)) => {
                info!(session = session_id, sequence = seq, "resuming from snapshot");
                let tail: Vec<&ProtoActionEnvelope> =
                    frames.iter().filter(|f| f.sequence > seq).collect();
                (PartyEngine::resume(state, seq, hooks), tail)
            }
            None => (PartyEngine::with_hooks(hooks), frames.iter().collect()),
        };
        for frame in tail {
            engine.apply(&proto_to_kernel(frame)?)?;
        }

        let mut session = Self {
            session_id: session_id.to_string(),
            dir,
            engine,
            log,
            snapshot_interval: config.snapshot_interval,
        };
        if session.log.last_sequence() == 0 {
            session.submit(
                0,
                PartyAction::InitializeConstants {
                    constants: config.constants.clone(),
                },
            )?;
        }
        info!(
            session = session_id,
            sequence = session.current_sequence(),
            parties = session.state().parties.len(),
            "session open"
        );
        Ok(session)
    }

    /// Newest snapshot not ahead of the log that passes restore checks.
    fn usable_snapshot(dir: &Path, log_sequence: u64) -> Option<(WorldState, u64)> {
        let snap = match snapshot::load_latest_snapshot(dir) {
            Ok(Some(snap)) if snap.sequence <= log_sequence => snap,
            Ok(Some(snap)) => {
                warn!(sequence = snap.sequence, log_sequence, "snapshot is ahead of the log; full replay");
                return None;
            }
            Ok(None) => return None,
            Err(e) => {
                warn!(error = %e, "unreadable snapshot; full replay");
                return None;
            }
        };
        let seq = snap.sequence;
        match snapshot::restore(snap) {
            Ok(state) => Some((state, seq)),
            Err(e) => {
                warn!(sequence = seq, error = %e, "snapshot rejected; full replay");
                None
            }
        }
    }

    /// Apply to the kernel, then persist.
    pub fn apply(&mut self, envelope: &ActionEnvelope) -> Result<TransitionResult, RuntimeError> {
        let result = self.engine.apply(envelope)?;
        self.log.append(&kernel_to_proto(envelope))?;
        if !result.success {
            debug!(sequence = envelope.sequence, action = %result.action, reason = %result.reason, "rejected action logged");
        }

        if self.snapshot_interval > 0 && envelope.sequence % self.snapshot_interval == 0 {
            snapshot::save_snapshot(&self.dir.join("snapshots"), envelope.sequence, self.engine.state())?;
        }
        Ok(result)
    }

    /// Wrap `action` in the next envelope and apply it.
    pub fn submit(&mut self, logical_time: u64, action: PartyAction) -> Result<TransitionResult, RuntimeError> {
        let envelope = ActionEnvelope::new(self.current_sequence() + 1, logical_time, action);
        self.apply(&envelope)
    }

    /// Rebuild from the full log on the same engine and return the hash.
    pub fn replay_full(&mut self) -> Result<String, RuntimeError> {
        let actions = self
            .log
            .load_all()?
            .iter()
            .map(proto_to_kernel)
            .collect::<Result<Vec<_>, _>>()?;
        let state = self.engine.replay(&actions)?;
        Ok(canonical_hash(state)?)
    }

    pub fn state(&self) -> &WorldState {
        self.engine.state()
    }

    pub fn engine(&self) -> &PartyEngine {
        &self.engine
    }

    pub fn current_hash(&self) -> Result<String, RuntimeError> {
        Ok(canonical_hash(self.engine.state())?)
    }

    pub fn current_sequence(&self) -> u64 {
        self.engine.last_sequence()
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}

/// Thread-safe session handle.
pub struct SharedSession {
    inner: Mutex<Session>,
}

impl SharedSession {
    pub fn new(session: Session) -> Self {
        Self {
            inner: Mutex::new(session),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Session>, RuntimeError> {
        self.inner.lock().map_err(|_| RuntimeError::LockPoisoned)
    }

    pub fn apply(&self, envelope: &ActionEnvelope) -> Result<TransitionResult, RuntimeError> {
        self.lock()?.apply(envelope)
    }

    /// Sequence assignment and apply happen under one lock.
    pub fn submit(&self, logical_time: u64, action: PartyAction) -> Result<TransitionResult, RuntimeError> {
        self.lock()?.submit(logical_time, action)
    }

    pub fn current_hash(&self) -> Result<String, RuntimeError> {
        self.lock()?.current_hash()
    }

    pub fn current_sequence(&self) -> Result<u64, RuntimeError> {
        Ok(self.lock()?.current_sequence())
    }
}

//! Replay orchestrator — rebuild the world from an action stream.
//!
//! All domain logic stays in the kernel; this only drives it.

use party_engine::domain::WorldState;
use party_engine::engine::PartyEngine;
use party_engine::events::ActionEnvelope;
use party_engine::hashing::canonical_hash;
use party_engine::hooks::PartyHooks;

use crate::errors::RuntimeError;

/// Replay `actions` on a fresh engine and return the final state with its
/// canonical hash.
pub fn rebuild_state(actions: &[ActionEnvelope]) -> Result<(WorldState, String), RuntimeError> {
    rebuild_with(PartyEngine::new(), actions)
}

/// Replay on top of a restored state (`resume` semantics).
pub fn rebuild_from(
    state: WorldState,
    last_sequence: u64,
    hooks: Box<dyn PartyHooks>,
    actions: &[ActionEnvelope],
) -> Result<(WorldState, String), RuntimeError> {
    rebuild_with(PartyEngine::resume(state, last_sequence, hooks), actions)
}

fn rebuild_with(
    mut engine: PartyEngine,
    actions: &[ActionEnvelope],
) -> Result<(WorldState, String), RuntimeError> {
    engine.apply_sequence(actions)?;
    let state = engine.state().clone();
    let hash = canonical_hash(&state)?;
    Ok((state, hash))
}

pub fn rebuild_hash(actions: &[ActionEnvelope]) -> Result<String, RuntimeError> {
    rebuild_state(actions).map(|(_, hash)| hash)
}

/// Replay twice on independent engines; true when both hashes agree.
pub fn verify_determinism(actions: &[ActionEnvelope]) -> Result<bool, RuntimeError> {
    Ok(rebuild_hash(actions)? == rebuild_hash(actions)?)
}

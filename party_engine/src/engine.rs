/// Party kernel — Engine
///
/// Top-level orchestrator. Delegates mutation to transitions,
/// validates via invariants.
///
/// Strict sequence enforcement, constants-first validation, monotonic
/// logical time. Protocol faults are returned as `EngineError` and leave
/// the engine exactly as it was.

use tracing::warn;

use crate::corpse::may_open_corpse;
use crate::domain::{PartyId, PlayerId, TransitionResult, WorldState};
use crate::eligibility::{can_enable_shared_experience, can_use_shared_experience};
use crate::errors::EngineError;
use crate::events::{ActionEnvelope, PartyAction, SCHEMA_VERSION};
use crate::hooks::{AllowAll, PartyHooks};
use crate::invariants::check_invariants;
use crate::notify::Shield;
use crate::state::create_initial_state;
use crate::transitions::apply_action as transition_apply;
use crate::visibility::party_shield;

/// Stateful engine wrapping the pure functional transition layer.
pub struct PartyEngine {
    state: WorldState,
    hooks: Box<dyn PartyHooks>,
    last_sequence: u64,
    constants_initialized: bool,
}

impl Default for PartyEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl PartyEngine {
    /// A fresh engine with the stock hooks.
    pub fn new() -> Self {
        Self::with_hooks(Box::new(AllowAll))
    }

    pub fn with_hooks(hooks: Box<dyn PartyHooks>) -> Self {
        Self {
            state: create_initial_state(None),
            hooks,
            last_sequence: 0,
            constants_initialized: false,
        }
    }

    /// Resume from a restored state. The next accepted sequence is
    /// `last_sequence + 1`; constants are considered initialised.
    pub fn resume(state: WorldState, last_sequence: u64, hooks: Box<dyn PartyHooks>) -> Self {
        Self {
            state,
            hooks,
            last_sequence,
            constants_initialized: last_sequence > 0,
        }
    }

    pub fn state(&self) -> &WorldState {
        &self.state
    }

    pub fn last_sequence(&self) -> u64 {
        self.last_sequence
    }

    /// Reset to a fresh initial state.
    pub fn initialize_state(&mut self) -> &WorldState {
        self.state = create_initial_state(None);
        self.last_sequence = 0;
        self.constants_initialized = false;
        &self.state
    }

    /// Apply a single action:
    ///   1. Validate schema version
    ///   2. Validate sequence (strictly increasing, no gaps)
    ///   3. Validate constants-first rule
    ///   4. Validate logical time does not go backwards
    ///   5. Delegate to transitions::apply_action
    ///   6. Validate invariants on the new state
    ///   7. Store and return
    ///
    /// A rejected party action is not an error: it is recorded in the
    /// sequence and reported through `TransitionResult::success`.
    pub fn apply(&mut self, envelope: &ActionEnvelope) -> Result<TransitionResult, EngineError> {
        self.validate(envelope).inspect_err(|e| {
            warn!(sequence = envelope.sequence, error = %e, "action refused by engine");
        })?;

        let (new_state, result) = transition_apply(&self.state, envelope, self.hooks.as_ref());
        if let Err(violation) = check_invariants(&new_state) {
            warn!(sequence = envelope.sequence, action = %result.action, error = %violation, "invariant violated; transition discarded");
            return Err(violation.into());
        }

        self.state = new_state;
        self.last_sequence = envelope.sequence;
        if matches!(envelope.action, PartyAction::InitializeConstants { .. }) {
            self.constants_initialized = true;
        }
        Ok(result)
    }

    fn validate(&self, envelope: &ActionEnvelope) -> Result<(), EngineError> {
        if envelope.schema_version != SCHEMA_VERSION {
            return Err(EngineError::SchemaVersion {
                expected: SCHEMA_VERSION,
                got: envelope.schema_version,
            });
        }

        let expected = self.last_sequence + 1;
        if envelope.sequence != expected {
            return Err(EngineError::Sequence {
                expected,
                got: envelope.sequence,
            });
        }

        let is_constants = matches!(envelope.action, PartyAction::InitializeConstants { .. });
        if !self.constants_initialized && !is_constants {
            return Err(EngineError::ConstantsFirst(
                envelope.action.name().to_string(),
            ));
        }
        if self.constants_initialized && is_constants {
            return Err(EngineError::ConstantsRepeated);
        }

        if envelope.logical_time < self.state.clock_ms {
            return Err(EngineError::ClockRewind {
                last: self.state.clock_ms,
                got: envelope.logical_time,
            });
        }
        Ok(())
    }

    /// Apply an ordered sequence of actions, stopping at the first fault.
    pub fn apply_sequence(
        &mut self,
        actions: &[ActionEnvelope],
    ) -> Result<Vec<TransitionResult>, EngineError> {
        actions.iter().map(|a| self.apply(a)).collect()
    }

    /// Event-sourced reconstruction: reset and replay.
    pub fn replay(&mut self, actions: &[ActionEnvelope]) -> Result<&WorldState, EngineError> {
        self.initialize_state();
        self.apply_sequence(actions)?;
        Ok(&self.state)
    }

    // -- queries --

    pub fn party_of(&self, player: PlayerId) -> Option<PartyId> {
        self.state.party_of(player)
    }

    pub fn party_shield(&self, viewer: PlayerId, subject: PlayerId) -> Shield {
        party_shield(&self.state, viewer, subject)
    }

    pub fn can_open_corpse(&self, opener: PlayerId, owner: PlayerId) -> bool {
        may_open_corpse(&self.state, opener, owner)
    }

    pub fn can_use_shared_experience(&self, player: PlayerId) -> bool {
        self.state
            .party_of(player)
            .and_then(|id| self.state.parties.get(&id))
            .is_some_and(|party| can_use_shared_experience(&self.state, party, player))
    }

    pub fn can_enable_shared_experience(&self, party: PartyId) -> bool {
        self.state
            .parties
            .get(&party)
            .is_some_and(|p| can_enable_shared_experience(&self.state, p))
    }
}

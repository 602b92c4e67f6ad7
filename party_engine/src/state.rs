/// Party kernel — State Construction and Party Registry
///
/// Parties are owned by the registry in `WorldState::parties` and addressed
/// by `PartyId`. Creating a party sets the leader's back-reference; removing
/// one hands back the last roster so the caller can finish notifications.

use tracing::info;

use crate::domain::{Party, PartyConstants, PartyId, PlayerId, WorldState};

/// Create a fresh, empty world with the given constants.
pub fn create_initial_state(constants: Option<PartyConstants>) -> WorldState {
    WorldState {
        constants: constants.unwrap_or_default(),
        ..WorldState::default()
    }
}

/// Register a new party led by `leader` and point the leader at it.
pub fn create_party(state: &mut WorldState, leader: PlayerId) -> PartyId {
    let id = PartyId(state.next_party_id);
    state.next_party_id += 1;
    state.parties.insert(id, Party::new(id, leader));
    state.set_party_ref(leader, Some(id));
    info!(party = %id, leader = %leader, "party created");
    id
}

/// Drop a party from the registry. Its handle is invalid afterwards.
pub(crate) fn destroy_party(state: &mut WorldState, id: PartyId) -> Option<Party> {
    let party = state.parties.remove(&id);
    if party.is_some() {
        info!(party = %id, "party disbanded");
    }
    party
}

//! Corpse ownership.

use crate::domain::{PartyId, PlayerId, WorldState};

/// Whether participants of `party_id` may open a corpse owned by `owner`.
///
/// The owner must still be in the world. Membership is read from the
/// owner's own back-reference rather than the roster.
pub fn can_open_corpse(state: &WorldState, party_id: PartyId, owner: PlayerId) -> bool {
    let Some(party) = state.parties.get(&party_id) else {
        return false;
    };
    let Some(owner_player) = state.players.get(&owner) else {
        return false;
    };
    owner == party.leader || owner_player.party == Some(party_id)
}

/// Whether `opener` may open a corpse owned by `owner`: their own, or one
/// belonging to someone in their party.
pub fn may_open_corpse(state: &WorldState, opener: PlayerId, owner: PlayerId) -> bool {
    if opener == owner {
        return true;
    }
    state
        .party_of(opener)
        .is_some_and(|party| can_open_corpse(state, party, owner))
}

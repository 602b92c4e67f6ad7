//! Shared-experience eligibility.
//!
//! Eligibility is always evaluated live: the level bar follows the current
//! highest level among leader and members, and activity is measured against
//! the world clock of the action being applied.

use tracing::debug;

use crate::arithmetic::{elapsed_ms, min_shared_level};
use crate::domain::{Party, PartyId, PlayerId, WorldState};
use crate::errors::PartyError;
use crate::hooks::PartyHooks;
use crate::notify::{Notification, Outbox};
use crate::proximity::in_shared_exp_range;
use crate::visibility::update_all_party_icons;

pub const MSG_SHARED_ACTIVE: &str = "Shared Experience is now active.";
pub const MSG_SHARED_INACTIVE_MEMBERS: &str =
    "Shared Experience has been activated, but some members of your party are inactive.";
pub const MSG_SHARED_DEACTIVATED: &str = "Shared Experience has been deactivated.";

/// Whether `player` currently qualifies for the shared-experience bonus.
pub fn can_use_shared_experience(state: &WorldState, party: &Party, player: PlayerId) -> bool {
    if party.members.is_empty() {
        return false;
    }
    let (Some(subject), Some(leader)) = (state.players.get(&player), state.players.get(&party.leader))
    else {
        return false;
    };

    let highest = party
        .members
        .iter()
        .filter_map(|m| state.players.get(m))
        .map(|p| p.level)
        .fold(leader.level, u32::max);
    if subject.level < min_shared_level(highest) {
        return false;
    }

    if !in_shared_exp_range(&leader.position, &subject.position, &state.constants) {
        return false;
    }

    if !subject.exempt_from_activity {
        let Some(&last) = party.last_action_ms.get(&player) else {
            return false;
        };
        if elapsed_ms(state.clock_ms, last) > state.constants.pz_locked_ms {
            return false;
        }
    }
    true
}

/// Leader and every member qualify.
pub fn can_enable_shared_experience(state: &WorldState, party: &Party) -> bool {
    party
        .participants()
        .into_iter()
        .all(|p| can_use_shared_experience(state, party, p))
}

/// Recompute the derived flag; refresh every icon when it flips.
pub fn update_shared_experience(state: &mut WorldState, out: &mut Outbox, party_id: PartyId) {
    let Some(party) = state.parties.get(&party_id) else {
        return;
    };
    if !party.shared_exp_active {
        return;
    }
    let enabled = can_enable_shared_experience(state, party);
    if enabled == party.shared_exp_enabled {
        return;
    }
    if let Some(party) = state.parties.get_mut(&party_id) {
        party.shared_exp_enabled = enabled;
    }
    debug!(party = %party_id, enabled, "shared experience eligibility changed");
    update_all_party_icons(state, out, party_id);
}

/// Leader toggles shared experience. Requesting the current state is a
/// silent success.
pub fn set_shared_experience(
    state: &mut WorldState,
    out: &mut Outbox,
    party_id: PartyId,
    requestor: PlayerId,
    active: bool,
) -> Result<(), PartyError> {
    let party = state.party(party_id)?;
    if party.leader != requestor {
        return Err(PartyError::NotLeader {
            party: party_id,
            player: requestor,
        });
    }
    if party.shared_exp_active == active {
        return Ok(());
    }

    let enabled = active && can_enable_shared_experience(state, party);
    let party = state.party_mut(party_id)?;
    party.shared_exp_active = active;
    party.shared_exp_enabled = enabled;
    let leader = party.leader;

    let text = match (active, enabled) {
        (true, true) => MSG_SHARED_ACTIVE,
        (true, false) => MSG_SHARED_INACTIVE_MEMBERS,
        (false, _) => MSG_SHARED_DEACTIVATED,
    };
    out.text(leader, text);
    debug!(party = %party_id, active, enabled, "shared experience toggled");

    update_all_party_icons(state, out, party_id);
    Ok(())
}

/// Stamp a combat action for a participant. Zero points and exempt players
/// are ignored.
pub fn record_action(
    state: &mut WorldState,
    out: &mut Outbox,
    party_id: PartyId,
    player: PlayerId,
    points: u32,
) {
    if points == 0 {
        return;
    }
    let exempt = match state.players.get(&player) {
        Some(p) => p.exempt_from_activity,
        None => return,
    };
    if exempt {
        return;
    }
    let now = state.clock_ms;
    match state.parties.get_mut(&party_id) {
        Some(party) if party.is_participant(player) => {
            party.last_action_ms.insert(player, now);
        }
        _ => return,
    }
    update_shared_experience(state, out, party_id);
}

/// Forget a player's activity stamp.
pub fn clear_action(state: &mut WorldState, out: &mut Outbox, party_id: PartyId, player: PlayerId) {
    let removed = state
        .parties
        .get_mut(&party_id)
        .and_then(|party| party.last_action_ms.remove(&player))
        .is_some();
    if removed {
        update_shared_experience(state, out, party_id);
    }
}

/// Give `amount` (after the share hook) to every participant, members first.
/// Returns the per-participant amount.
pub fn share_experience(
    state: &mut WorldState,
    out: &mut Outbox,
    hooks: &dyn PartyHooks,
    party_id: PartyId,
    amount: u64,
) -> Result<u64, PartyError> {
    let party = state.party(party_id)?;
    let mut share = amount;
    hooks.on_share_experience(party, &mut share);

    let mut receivers = party.members.clone();
    receivers.push(party.leader);
    for id in receivers {
        if let Some(p) = state.players.get_mut(&id) {
            p.experience = p.experience.saturating_add(share);
            out.push(Notification::SharedExperience { to: id, amount: share });
        }
    }
    Ok(share)
}

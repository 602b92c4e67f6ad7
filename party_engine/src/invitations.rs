//! Invitation registry.
//!
//! Pending invitations are recorded twice: in `Party::invitees` and in the
//! invitee's `Player::invitations`. Every function here updates both sides.

use tracing::{info, warn};

use crate::domain::{PartyId, PlayerId, WorldState};
use crate::errors::PartyError;
use crate::membership::teardown;
use crate::notify::Outbox;
use crate::state::create_party;

pub fn is_invited(state: &WorldState, party_id: PartyId, player: PlayerId) -> bool {
    state
        .parties
        .get(&party_id)
        .is_some_and(|p| p.is_invited(player))
}

/// Extend an invitation from an existing party to `candidate`.
pub fn invite(
    state: &mut WorldState,
    out: &mut Outbox,
    party_id: PartyId,
    candidate: PlayerId,
) -> Result<(), PartyError> {
    let party = state.party(party_id)?;
    if party.is_invited(candidate) {
        return Err(PartyError::AlreadyInvited {
            party: party_id,
            player: candidate,
        });
    }
    let leader = party.leader;
    let was_empty = party.is_empty();
    let candidate_name = state.player(candidate)?.name.clone();
    let (leader_name, pronoun) = {
        let l = state.player(leader)?;
        (l.name.clone(), l.gender.possessive())
    };

    let mut text = format!("{} has been invited.", candidate_name);
    if was_empty {
        text.push_str(" Open the party channel to communicate with your members.");
        out.icons(state, leader, leader);
    }
    out.text(leader, text);

    let party = state.party_mut(party_id)?;
    party.invitees.push(candidate);
    let members = party.members.clone();
    for member in members {
        out.helpers(member);
    }
    out.helpers(leader);

    state.player_mut(candidate)?.invitations.insert(party_id);

    out.creature_shield(state, leader, candidate);
    out.creature_shield(state, candidate, leader);
    out.text(
        candidate,
        format!("{} has invited you to {} party.", leader_name, pronoun),
    );
    info!(party = %party_id, invitee = %candidate, "invitation sent");
    Ok(())
}

/// Player-level invite: creates the party on the inviter's first invitation.
pub fn invite_player(
    state: &mut WorldState,
    out: &mut Outbox,
    inviter: PlayerId,
    invitee: PlayerId,
) -> Result<PartyId, PartyError> {
    if inviter == invitee {
        return Err(PartyError::SelfTarget(inviter));
    }
    let current = state.player(inviter)?.party;
    if state.player(invitee)?.party.is_some() {
        return Err(PartyError::AlreadyInParty(invitee));
    }

    let party_id = match current {
        Some(id) => {
            if state.party(id)?.leader != inviter {
                return Err(PartyError::NotLeader {
                    party: id,
                    player: inviter,
                });
            }
            id
        }
        None => create_party(state, inviter),
    };
    invite(state, out, party_id, invitee)?;
    Ok(party_id)
}

/// Withdraw a pending invitation. Tears the party down when nothing is left.
pub fn remove_invite(
    state: &mut WorldState,
    out: &mut Outbox,
    party_id: PartyId,
    candidate: PlayerId,
    notify_candidate: bool,
) -> Result<(), PartyError> {
    let party = state.party_mut(party_id)?;
    let Some(pos) = party.invitees.iter().position(|&p| p == candidate) else {
        return Err(PartyError::NotInvited {
            party: party_id,
            player: candidate,
        });
    };
    party.invitees.remove(pos);
    let leader = party.leader;
    let empty = party.is_empty();
    let members = party.members.clone();

    if let Some(p) = state.players.get_mut(&candidate) {
        p.invitations.remove(&party_id);
    }

    out.creature_shield(state, leader, candidate);
    if notify_candidate {
        out.creature_shield(state, candidate, leader);
    }

    if empty {
        teardown(state, out, party_id);
    } else {
        for member in members {
            out.helpers(member);
        }
        out.helpers(leader);
    }
    Ok(())
}

/// Leader takes an invitation back, with notice texts on both sides.
pub fn revoke_invitation(
    state: &mut WorldState,
    out: &mut Outbox,
    party_id: PartyId,
    requestor: PlayerId,
    candidate: PlayerId,
) -> Result<(), PartyError> {
    let party = state.party(party_id)?;
    if party.leader != requestor {
        return Err(PartyError::NotLeader {
            party: party_id,
            player: requestor,
        });
    }
    if !party.is_invited(candidate) {
        return Err(PartyError::NotInvited {
            party: party_id,
            player: candidate,
        });
    }

    let leader = state.player(requestor)?;
    let (leader_name, pronoun) = (leader.name.clone(), leader.gender.possessive());
    let candidate_name = state.name_of(candidate).to_string();
    out.text(
        candidate,
        format!("{} has revoked {} invitation.", leader_name, pronoun),
    );
    out.text(
        requestor,
        format!("Invitation for {} has been revoked.", candidate_name),
    );

    remove_invite(state, out, party_id, candidate, true)?;
    info!(party = %party_id, invitee = %candidate, "invitation revoked");
    Ok(())
}

/// Drop every invitation `player` holds, without telling them. Used when
/// the player leaves the world.
pub fn withdraw_all(state: &mut WorldState, out: &mut Outbox, player: PlayerId) {
    let pending: Vec<PartyId> = state
        .players
        .get(&player)
        .map(|p| p.invitations.iter().copied().collect())
        .unwrap_or_default();
    for party_id in pending {
        if let Err(err) = remove_invite(state, out, party_id, player, false) {
            warn!(party = %party_id, player = %player, error = %err, "stale invitation on withdraw");
        }
    }
}

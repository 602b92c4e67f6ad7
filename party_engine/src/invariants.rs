/// Party kernel — Invariant Checks
///
/// Run by the engine after every applied action and by snapshot restore.
/// Returns the first violation found.

use std::collections::BTreeSet;

use crate::domain::{Party, PartyId, WorldState};
use crate::errors::InvariantViolation;

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

pub fn check_invariants(state: &WorldState) -> Result<(), InvariantViolation> {
    for (id, party) in &state.parties {
        check_handle(state, *id)?;
        check_roster(state, party)?;
        check_invitees(state, party)?;
        check_activity(party)?;
        if party.is_empty() {
            return Err(InvariantViolation::EmptyParty(party.id));
        }
        if party.shared_exp_enabled && !party.shared_exp_active {
            return Err(InvariantViolation::SharedExpFlag(party.id));
        }
    }
    check_player_side(state)
}

// ---------------------------------------------------------------------------
// Individual checks (private)
// ---------------------------------------------------------------------------

fn check_handle(state: &WorldState, id: PartyId) -> Result<(), InvariantViolation> {
    if id.0 >= state.next_party_id {
        return Err(InvariantViolation::HandleOrder {
            party: id,
            next: state.next_party_id,
        });
    }
    Ok(())
}

/// Leader and members exist and point back at the party.
fn check_roster(state: &WorldState, party: &Party) -> Result<(), InvariantViolation> {
    if party.is_member(party.leader) {
        return Err(InvariantViolation::LeaderIsMember {
            party: party.id,
            leader: party.leader,
        });
    }
    let mut seen = BTreeSet::new();
    for id in party.participants() {
        if !seen.insert(id) {
            return Err(InvariantViolation::DuplicateMember {
                party: party.id,
                player: id,
            });
        }
        let Some(player) = state.players.get(&id) else {
            return Err(InvariantViolation::MissingPlayer {
                party: party.id,
                player: id,
            });
        };
        if player.party != Some(party.id) {
            return Err(InvariantViolation::BackReference {
                player: id,
                expected: Some(party.id),
                found: player.party,
            });
        }
    }
    Ok(())
}

fn check_invitees(state: &WorldState, party: &Party) -> Result<(), InvariantViolation> {
    let mut seen = BTreeSet::new();
    for &id in &party.invitees {
        if party.is_participant(id) {
            return Err(InvariantViolation::InviteeOverlap {
                party: party.id,
                player: id,
            });
        }
        let Some(player) = state.players.get(&id) else {
            return Err(InvariantViolation::MissingPlayer {
                party: party.id,
                player: id,
            });
        };
        if !seen.insert(id) || !player.invitations.contains(&party.id) {
            return Err(InvariantViolation::InvitationBookkeeping {
                party: party.id,
                player: id,
            });
        }
    }
    Ok(())
}

fn check_activity(party: &Party) -> Result<(), InvariantViolation> {
    match party.last_action_ms.keys().find(|p| !party.is_participant(**p)) {
        Some(&player) => Err(InvariantViolation::StaleActivity {
            party: party.id,
            player,
        }),
        None => Ok(()),
    }
}

/// Every back-reference and pending invitation a player holds is mirrored
/// by the party it names.
fn check_player_side(state: &WorldState) -> Result<(), InvariantViolation> {
    for player in state.players.values() {
        if let Some(pid) = player.party {
            let ok = state
                .parties
                .get(&pid)
                .is_some_and(|p| p.is_participant(player.id));
            if !ok {
                return Err(InvariantViolation::BackReference {
                    player: player.id,
                    expected: None,
                    found: Some(pid),
                });
            }
        }
        for &pid in &player.invitations {
            let ok = state.parties.get(&pid).is_some_and(|p| p.is_invited(player.id));
            if !ok {
                return Err(InvariantViolation::InvitationBookkeeping {
                    party: pid,
                    player: player.id,
                });
            }
        }
    }
    Ok(())
}

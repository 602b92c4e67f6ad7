/// Party kernel — Centralized Transition Logic
///
/// Every action enters here. The incoming state is never mutated: a clone
/// is taken, the action is applied to it, and on rejection the clone is
/// dropped so the caller keeps a byte-identical world.

use std::collections::BTreeSet;

use tracing::{debug, info};

use crate::arithmetic::percent;
use crate::domain::{PartyId, Player, PlayerId, Position, TransitionResult, WorldState};
use crate::eligibility::{
    clear_action, record_action, set_shared_experience, share_experience, update_shared_experience,
};
use crate::errors::PartyError;
use crate::events::{ActionEnvelope, PartyAction};
use crate::hooks::PartyHooks;
use crate::invitations::{invite_player, revoke_invitation, withdraw_all};
use crate::membership::{disband, join, leave, pass_leadership};
use crate::notify::{CreatureRef, Outbox};
use crate::visibility::{
    update_player_health, update_player_mana, update_player_status, update_player_status_moved,
    update_player_vocation,
};

// ---------------------------------------------------------------------------
// Public dispatcher
// ---------------------------------------------------------------------------

/// Apply `envelope` to `state` and return `(new_state, result)`.
pub fn apply_action(
    state: &WorldState,
    envelope: &ActionEnvelope,
    hooks: &dyn PartyHooks,
) -> (WorldState, TransitionResult) {
    let action = &envelope.action;
    let mut next = state.clone();
    next.clock_ms = envelope.logical_time;
    if let PartyAction::InitializeConstants { constants } = action {
        next.constants = constants.clone();
    }

    let before: BTreeSet<PartyId> = next.parties.keys().copied().collect();
    let mut out = Outbox::new(next.constants.protocol);

    match dispatch(&mut next, &mut out, hooks, action) {
        Ok(touched) => {
            let disbanded = before
                .into_iter()
                .filter(|id| !next.parties.contains_key(id))
                .collect();
            let result = TransitionResult {
                action: action.name().to_string(),
                party: touched.filter(|id| next.parties.contains_key(id)),
                disbanded,
                notifications: out.into_items(),
                ..Default::default()
            };
            (next, result)
        }
        Err(err) => {
            debug!(action = action.name(), error = %err, "action rejected");
            let mut out = Outbox::new(state.constants.protocol);
            if let Some(actor) = action.actor().filter(|a| state.players.contains_key(a)) {
                out.failure(actor, err.user_message());
            }
            let result = TransitionResult {
                action: action.name().to_string(),
                success: false,
                reason: err.to_string(),
                party: None,
                disbanded: Vec::new(),
                notifications: out.into_items(),
            };
            (state.clone(), result)
        }
    }
}

// ---------------------------------------------------------------------------
// Individual handlers (private)
// ---------------------------------------------------------------------------

/// Returns the party the action touched, if any.
fn dispatch(
    state: &mut WorldState,
    out: &mut Outbox,
    hooks: &dyn PartyHooks,
    action: &PartyAction,
) -> Result<Option<PartyId>, PartyError> {
    match action {
        PartyAction::InitializeConstants { .. } => Ok(None),
        PartyAction::PlayerEnter { profile } => {
            if state.players.contains_key(&profile.id) {
                return Err(PartyError::DuplicatePlayer(profile.id));
            }
            let player: Player = profile.clone().into();
            info!(player = %player.id, name = %player.name, "player entered");
            state.players.insert(player.id, player);
            Ok(None)
        }
        PartyAction::PlayerExit { player } => apply_player_exit(state, out, hooks, *player),
        PartyAction::Invite { inviter, invitee } => {
            invite_player(state, out, *inviter, *invitee).map(Some)
        }
        PartyAction::RevokeInvitation { leader, invitee } => {
            let party = led_party(state, *leader)?;
            revoke_invitation(state, out, party, *leader, *invitee)?;
            Ok(Some(party))
        }
        PartyAction::Join { player, leader } => {
            state.player(*player)?;
            let party = invited_by(state, *leader, *player)?;
            if state.party_of(*player).is_some() {
                return Err(PartyError::AlreadyInParty(*player));
            }
            join(state, out, hooks, party, *player)?;
            Ok(Some(party))
        }
        PartyAction::Leave { player } => {
            let party = party_of(state, *player)?;
            leave(state, out, hooks, party, *player, false)?;
            Ok(Some(party))
        }
        PartyAction::PassLeadership { leader, candidate } => {
            let party = party_of(state, *leader)?;
            pass_leadership(state, out, party, *leader, *candidate)?;
            Ok(Some(party))
        }
        PartyAction::Disband { leader } => {
            let party = party_of(state, *leader)?;
            disband(state, out, hooks, party, *leader)?;
            Ok(Some(party))
        }
        PartyAction::SetSharedExperience { player, active } => {
            let party = party_of(state, *player)?;
            set_shared_experience(state, out, party, *player, *active)?;
            Ok(Some(party))
        }
        PartyAction::ShareExperience { source, amount } => {
            apply_gain_experience(state, out, hooks, *source, *amount)
        }
        PartyAction::CombatAction { player, points } => {
            state.player(*player)?;
            let party = state.party_of(*player);
            if let Some(id) = party {
                record_action(state, out, id, *player, *points);
            }
            Ok(party)
        }
        PartyAction::PlayerMove { player, to } => apply_move(state, out, *player, *to),
        PartyAction::HealthChanged {
            player,
            health,
            max_health,
        } => {
            let p = state.player_mut(*player)?;
            p.health = *health;
            p.max_health = *max_health;
            let party = p.party;
            if let Some(id) = party {
                let pct = percent(*health, *max_health);
                update_player_health(state, out, id, *player, CreatureRef::Player(*player), pct);
            }
            Ok(party)
        }
        PartyAction::SummonHealthChanged {
            player,
            summon,
            health,
            max_health,
        } => {
            let p = state.player_mut(*player)?;
            let party = p.party;
            let s = p
                .summons
                .iter_mut()
                .find(|s| s.id == *summon)
                .ok_or(PartyError::UnknownSummon {
                    player: *player,
                    summon: *summon,
                })?;
            s.health = *health;
            s.max_health = *max_health;
            if let Some(id) = party {
                let pct = percent(*health, *max_health);
                update_player_health(state, out, id, *player, CreatureRef::Summon(*summon), pct);
            }
            Ok(party)
        }
        PartyAction::ManaChanged {
            player,
            mana,
            max_mana,
        } => {
            let p = state.player_mut(*player)?;
            p.mana = *mana;
            p.max_mana = *max_mana;
            let party = p.party;
            if let Some(id) = party {
                update_player_mana(state, out, id, *player, percent(*mana, *max_mana));
            }
            Ok(party)
        }
        PartyAction::VocationChanged { player, vocation } => {
            let p = state.player_mut(*player)?;
            p.vocation = *vocation;
            let party = p.party;
            if let Some(id) = party {
                update_player_vocation(state, out, id, *player);
            }
            Ok(party)
        }
        PartyAction::LevelChanged { player, level } => {
            let p = state.player_mut(*player)?;
            p.level = *level;
            let party = p.party;
            if let Some(id) = party {
                update_shared_experience(state, out, id);
            }
            Ok(party)
        }
        PartyAction::SetInFight { player, in_fight } => {
            let p = state.player_mut(*player)?;
            p.in_fight = *in_fight;
            let party = p.party;
            if let Some(id) = party.filter(|_| !*in_fight) {
                clear_action(state, out, id, *player);
            }
            Ok(party)
        }
        PartyAction::RefreshStatus { player } => {
            let party = party_of(state, *player)?;
            update_player_status(state, out, party, *player);
            Ok(Some(party))
        }
    }
}

fn party_of(state: &WorldState, player: PlayerId) -> Result<PartyId, PartyError> {
    state.player(player)?;
    state.party_of(player).ok_or(PartyError::NotInParty(player))
}

/// The party `leader` currently leads.
fn led_party(state: &WorldState, leader: PlayerId) -> Result<PartyId, PartyError> {
    let party = party_of(state, leader)?;
    if state.party(party)?.leader != leader {
        return Err(PartyError::NotLeader {
            party,
            player: leader,
        });
    }
    Ok(party)
}

/// The party through which `leader` has invited `player`.
fn invited_by(state: &WorldState, leader: PlayerId, player: PlayerId) -> Result<PartyId, PartyError> {
    state.player(leader)?;
    let party = state.party_of(leader).ok_or(PartyError::NotInParty(leader))?;
    let p = state.party(party)?;
    if p.leader != leader || !p.is_invited(player) {
        return Err(PartyError::NotInvited { party, player });
    }
    Ok(party)
}

/// The player leaves the world: out of the party, invitations withdrawn,
/// then removed from the registry.
fn apply_player_exit(
    state: &mut WorldState,
    out: &mut Outbox,
    hooks: &dyn PartyHooks,
    player: PlayerId,
) -> Result<Option<PartyId>, PartyError> {
    let party = state.player(player)?.party;
    if let Some(id) = party {
        leave(state, out, hooks, id, player, true)?;
    }
    withdraw_all(state, out, player);
    state.players.remove(&player);
    info!(player = %player, "player exited");
    Ok(party)
}

fn apply_gain_experience(
    state: &mut WorldState,
    out: &mut Outbox,
    hooks: &dyn PartyHooks,
    source: PlayerId,
    amount: u64,
) -> Result<Option<PartyId>, PartyError> {
    let party = state.player(source)?.party;
    if let Some(id) = party {
        update_shared_experience(state, out, id);
    }
    let shared = party
        .and_then(|id| state.parties.get(&id))
        .is_some_and(|p| p.shared_exp_active && p.shared_exp_enabled);

    match party {
        Some(id) if shared => {
            share_experience(state, out, hooks, id, amount)?;
        }
        _ => {
            let p = state.player_mut(source)?;
            p.experience = p.experience.saturating_add(amount);
        }
    }
    Ok(party)
}

fn apply_move(
    state: &mut WorldState,
    out: &mut Outbox,
    player: PlayerId,
    to: Position,
) -> Result<Option<PartyId>, PartyError> {
    let p = state.player_mut(player)?;
    let from = p.position;
    p.position = to;
    let party = p.party;
    if let Some(id) = party {
        update_shared_experience(state, out, id);
        update_player_status_moved(state, out, id, player, &from, &to);
    }
    Ok(party)
}

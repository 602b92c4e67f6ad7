//! Shared fixtures for unit tests.

use crate::domain::{Gender, PartyId, Player, PlayerId, PlayerProfile, Position, WorldState};
use crate::hooks::AllowAll;
use crate::invitations::invite_player;
use crate::membership::join;
use crate::notify::{MessageClass, Notification, Outbox};
use crate::state::create_initial_state;

pub fn profile(id: u32, name: &str, level: u32) -> PlayerProfile {
    PlayerProfile {
        id: PlayerId(id),
        name: name.to_string(),
        level,
        health: 100,
        max_health: 100,
        mana: 50,
        max_mana: 100,
        position: Position::new(100, 100, 7),
        gender: Gender::Male,
        vocation: 1,
        exempt_from_activity: false,
        summons: Vec::new(),
    }
}

/// World with the given `(id, name, level)` players, all on the same tile.
pub fn world(players: &[(u32, &str, u32)]) -> WorldState {
    let mut state = create_initial_state(None);
    for &(id, name, level) in players {
        let player: Player = profile(id, name, level).into();
        state.players.insert(player.id, player);
    }
    state
}

pub fn outbox(state: &WorldState) -> Outbox {
    Outbox::new(state.constants.protocol)
}

/// Leader invites and seats every member, in order.
pub fn party_of(state: &mut WorldState, leader: u32, members: &[u32]) -> PartyId {
    let mut out = outbox(state);
    let mut party = None;
    for &m in members {
        let id = invite_player(state, &mut out, PlayerId(leader), PlayerId(m))
            .expect("invite in fixture");
        join(state, &mut out, &AllowAll, id, PlayerId(m)).expect("join in fixture");
        party = Some(id);
    }
    party.expect("fixture party needs at least one member")
}

pub fn move_to(state: &mut WorldState, player: u32, x: i32, y: i32, z: i32) {
    if let Some(p) = state.players.get_mut(&PlayerId(player)) {
        p.position = Position::new(x, y, z);
    }
}

/// Informational texts delivered to `to`, in order.
pub fn texts_to(out: &Outbox, to: PlayerId) -> Vec<String> {
    out.items()
        .iter()
        .filter_map(|n| match n {
            Notification::TextMessage {
                to: t,
                class: MessageClass::InfoDescr,
                text,
            } if *t == to => Some(text.clone()),
            _ => None,
        })
        .collect()
}

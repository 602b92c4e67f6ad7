//! Party shields and proximity-gated status broadcasts.
//!
//! Nothing here mutates the world. Every function reads the current state
//! and pushes notifications into the outbox.

use tracing::debug;

use crate::arithmetic::percent;
use crate::domain::{Party, PartyId, Player, PlayerId, Position, WorldState};
use crate::eligibility::can_use_shared_experience;
use crate::notify::{CreatureRef, Notification, Outbox, Shield};
use crate::proximity::{range_transition, within_status_distance, RangeTransition};

// ---------------------------------------------------------------------------
// Shields
// ---------------------------------------------------------------------------

/// The shield `viewer` should see on `subject`.
pub fn party_shield(state: &WorldState, viewer: PlayerId, subject: PlayerId) -> Shield {
    let (Some(v), Some(s)) = (state.players.get(&viewer), state.players.get(&subject)) else {
        return Shield::None;
    };

    if let Some(party) = v.party.and_then(|id| state.parties.get(&id)) {
        if party.leader == subject {
            return shared_variant(state, party, subject, true);
        }
        if s.party == Some(party.id) {
            return shared_variant(state, party, subject, false);
        }
        if party.leader == viewer && party.is_invited(subject) {
            return Shield::WhiteBlue;
        }
    }

    if let Some(their) = s.party.and_then(|id| state.parties.get(&id)) {
        if their.leader == subject && their.is_invited(viewer) {
            return Shield::WhiteYellow;
        }
        return Shield::Gray;
    }
    Shield::None
}

fn shared_variant(state: &WorldState, party: &Party, subject: PlayerId, leader: bool) -> Shield {
    if !party.shared_exp_active {
        return if leader { Shield::Yellow } else { Shield::Blue };
    }
    if party.shared_exp_enabled {
        return if leader {
            Shield::YellowSharedExp
        } else {
            Shield::BlueSharedExp
        };
    }
    if can_use_shared_experience(state, party, subject) {
        if leader {
            Shield::YellowNoSharedExp
        } else {
            Shield::BlueNoSharedExp
        }
    } else if leader {
        Shield::YellowNoSharedExpBlink
    } else {
        Shield::BlueNoSharedExpBlink
    }
}

/// Every participant re-learns every participant's shield.
pub fn update_all_party_icons(state: &WorldState, out: &mut Outbox, party_id: PartyId) {
    let Some(party) = state.parties.get(&party_id) else {
        return;
    };
    for &member in &party.members {
        for &other in &party.members {
            out.member_shield(state, member, other);
        }
        out.member_shield(state, member, party.leader);
        out.member_shield(state, party.leader, member);
    }
    out.member_shield(state, party.leader, party.leader);
}

// ---------------------------------------------------------------------------
// Status (party list)
// ---------------------------------------------------------------------------

/// Show or hide `a` and `b` to each other, summons included. Showing also
/// pushes the current health and mana.
pub fn show_player_status(state: &WorldState, out: &mut Outbox, a: PlayerId, b: PlayerId, show: bool) {
    let (Some(pa), Some(pb)) = (state.players.get(&a), state.players.get(&b)) else {
        return;
    };
    out.push(Notification::ShowStatus {
        to: a,
        subject: CreatureRef::Player(b),
        show,
    });
    out.push(Notification::ShowStatus {
        to: b,
        subject: CreatureRef::Player(a),
        show,
    });

    if show {
        show_summons_to(out, a, pb);
        show_summons_to(out, b, pa);
        push_vitals(out, a, pb);
        push_vitals(out, b, pa);
    } else {
        for summon in &pa.summons {
            out.push(Notification::ShowStatus {
                to: b,
                subject: CreatureRef::Summon(summon.id),
                show: false,
            });
        }
        for summon in &pb.summons {
            out.push(Notification::ShowStatus {
                to: a,
                subject: CreatureRef::Summon(summon.id),
                show: false,
            });
        }
    }
    debug!(a = %a, b = %b, show, "party status toggled");
}

fn show_summons_to(out: &mut Outbox, to: PlayerId, owner: &Player) {
    for summon in &owner.summons {
        out.push(Notification::ShowStatus {
            to,
            subject: CreatureRef::Summon(summon.id),
            show: true,
        });
        out.push(Notification::HealthPercent {
            to,
            subject: CreatureRef::Summon(summon.id),
            percent: percent(summon.health, summon.max_health),
        });
    }
}

fn push_vitals(out: &mut Outbox, to: PlayerId, subject: &Player) {
    out.push(Notification::HealthPercent {
        to,
        subject: CreatureRef::Player(subject.id),
        percent: percent(subject.health, subject.max_health),
    });
    out.push(Notification::ManaPercent {
        to,
        subject: subject.id,
        percent: percent(subject.mana, subject.max_mana),
    });
}

/// Participants other than `player`, with their positions.
fn others(state: &WorldState, party_id: PartyId, player: PlayerId) -> Vec<(PlayerId, Position)> {
    let Some(party) = state.parties.get(&party_id) else {
        return Vec::new();
    };
    party
        .participants()
        .into_iter()
        .filter(|&p| p != player)
        .filter_map(|p| state.players.get(&p).map(|pl| (p, pl.position)))
        .collect()
}

/// Full refresh: evaluate `player` against every other participant.
pub fn update_player_status(state: &WorldState, out: &mut Outbox, party_id: PartyId, player: PlayerId) {
    if !out.caps().party_list {
        return;
    }
    let Some(pos) = state.players.get(&player).map(|p| p.position) else {
        return;
    };
    let max = state.constants.max_status_distance;
    for (other, other_pos) in others(state, party_id, player) {
        let show = within_status_distance(&pos, &other_pos, max);
        show_player_status(state, out, player, other, show);
    }
}

/// Delta refresh after `player` moved: only pairs whose range state changed.
pub fn update_player_status_moved(
    state: &WorldState,
    out: &mut Outbox,
    party_id: PartyId,
    player: PlayerId,
    old_pos: &Position,
    new_pos: &Position,
) {
    let max = state.constants.max_status_distance;
    if !out.caps().party_list || max == 0 {
        return;
    }
    for (other, other_pos) in others(state, party_id, player) {
        match range_transition(old_pos, new_pos, &other_pos, max) {
            RangeTransition::Left => show_player_status(state, out, player, other, false),
            RangeTransition::Entered => show_player_status(state, out, player, other, true),
            RangeTransition::Unchanged => {}
        }
    }
}

/// Recipients within status distance of `player`.
fn observers_in_range(state: &WorldState, party_id: PartyId, player: PlayerId) -> Vec<PlayerId> {
    let Some(pos) = state.players.get(&player).map(|p| p.position) else {
        return Vec::new();
    };
    let max = state.constants.max_status_distance;
    others(state, party_id, player)
        .into_iter()
        .filter(|(_, other_pos)| within_status_distance(&pos, other_pos, max))
        .map(|(id, _)| id)
        .collect()
}

/// Health of `target` (the player or one of its summons) changed.
pub fn update_player_health(
    state: &WorldState,
    out: &mut Outbox,
    party_id: PartyId,
    player: PlayerId,
    target: CreatureRef,
    health_percent: u8,
) {
    if !out.caps().party_list {
        return;
    }
    for to in observers_in_range(state, party_id, player) {
        out.push(Notification::HealthPercent {
            to,
            subject: target,
            percent: health_percent,
        });
    }
}

pub fn update_player_mana(
    state: &WorldState,
    out: &mut Outbox,
    party_id: PartyId,
    player: PlayerId,
    mana_percent: u8,
) {
    if !out.caps().party_list {
        return;
    }
    for to in observers_in_range(state, party_id, player) {
        out.push(Notification::ManaPercent {
            to,
            subject: player,
            percent: mana_percent,
        });
    }
}

pub fn update_player_vocation(state: &WorldState, out: &mut Outbox, party_id: PartyId, player: PlayerId) {
    let caps = out.caps();
    if !caps.party_list || !caps.player_vocations {
        return;
    }
    let Some(vocation) = state.players.get(&player).map(|p| p.vocation) else {
        return;
    };
    for to in observers_in_range(state, party_id, player) {
        out.push(Notification::Vocation {
            to,
            subject: player,
            vocation,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ProtocolCaps, Summon, SummonId};
    use crate::eligibility::{record_action, set_shared_experience};
    use crate::invitations::invite_player;
    use crate::testkit::{move_to, outbox, party_of, world};

    fn status_events(out: &Outbox) -> Vec<(PlayerId, CreatureRef, bool)> {
        out.items()
            .iter()
            .filter_map(|n| match n {
                Notification::ShowStatus { to, subject, show } => Some((*to, *subject, *show)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn shields_follow_party_relations() {
        let mut state = world(&[(1, "Lars", 30), (2, "Ann", 25), (3, "Bo", 25), (4, "Cid", 25)]);
        let party = party_of(&mut state, 1, &[2]);
        let mut out = outbox(&state);
        invite_player(&mut state, &mut out, PlayerId(1), PlayerId(3)).unwrap();
        assert!(state.parties.contains_key(&party));

        let s = |v: u32, t: u32| party_shield(&state, PlayerId(v), PlayerId(t));
        assert_eq!(s(1, 1), Shield::Yellow);
        assert_eq!(s(2, 1), Shield::Yellow);
        assert_eq!(s(1, 2), Shield::Blue);
        assert_eq!(s(1, 3), Shield::WhiteBlue);
        assert_eq!(s(3, 1), Shield::WhiteYellow);
        assert_eq!(s(3, 2), Shield::Gray);
        assert_eq!(s(4, 2), Shield::Gray);
        assert_eq!(s(4, 3), Shield::None);
        assert_eq!(s(2, 3), Shield::None);
    }

    #[test]
    fn shared_exp_shields() {
        let mut state = world(&[(1, "Lars", 30), (2, "Ann", 25), (3, "Bo", 10)]);
        let party = party_of(&mut state, 1, &[2, 3]);
        let mut out = outbox(&state);
        for id in 1..=3 {
            record_action(&mut state, &mut out, party, PlayerId(id), 1);
        }
        set_shared_experience(&mut state, &mut out, party, PlayerId(1), true).unwrap();

        assert_eq!(party_shield(&state, PlayerId(2), PlayerId(1)), Shield::YellowNoSharedExp);
        assert_eq!(party_shield(&state, PlayerId(1), PlayerId(2)), Shield::BlueNoSharedExp);
        assert_eq!(party_shield(&state, PlayerId(1), PlayerId(3)), Shield::BlueNoSharedExpBlink);

        state.players.get_mut(&PlayerId(3)).unwrap().level = 25;
        crate::eligibility::update_shared_experience(&mut state, &mut out, party);
        assert_eq!(party_shield(&state, PlayerId(2), PlayerId(1)), Shield::YellowSharedExp);
        assert_eq!(party_shield(&state, PlayerId(1), PlayerId(3)), Shield::BlueSharedExp);
    }

    #[test]
    fn icon_refresh_covers_every_ordered_pair() {
        let mut state = world(&[(1, "Lars", 30), (2, "Ann", 25), (3, "Bo", 25)]);
        let party = party_of(&mut state, 1, &[2, 3]);
        let mut out = outbox(&state);
        update_all_party_icons(&state, &mut out, party);
        assert_eq!(out.len(), 9);
        assert!(out
            .items()
            .iter()
            .all(|n| matches!(n, Notification::PartyCreatureShield { .. })));

        let mut legacy = Outbox::new(ProtocolCaps {
            party_list: false,
            ..ProtocolCaps::default()
        });
        update_all_party_icons(&state, &mut legacy, party);
        assert!(legacy
            .items()
            .iter()
            .all(|n| matches!(n, Notification::CreatureShield { .. })));
    }

    #[test]
    fn moving_out_of_range_hides_exactly_one_pair() {
        let mut state = world(&[(1, "Lars", 30), (2, "Mia", 25), (3, "Ned", 25)]);
        state.constants.max_status_distance = 10;
        let party = party_of(&mut state, 1, &[2, 3]);
        move_to(&mut state, 2, 108, 100, 7);
        move_to(&mut state, 3, 115, 100, 7);

        let old = Position::new(108, 100, 7);
        let new = Position::new(112, 100, 7);
        move_to(&mut state, 2, 112, 100, 7);
        let mut out = outbox(&state);
        update_player_status_moved(&state, &mut out, party, PlayerId(2), &old, &new);

        let events = status_events(&out);
        assert_eq!(
            events,
            vec![
                (PlayerId(2), CreatureRef::Player(PlayerId(1)), false),
                (PlayerId(1), CreatureRef::Player(PlayerId(2)), false),
            ]
        );
    }

    #[test]
    fn moving_into_range_shows_with_vitals_and_summons() {
        let mut state = world(&[(1, "Lars", 30), (2, "Mia", 25)]);
        state.constants.max_status_distance = 10;
        let party = party_of(&mut state, 1, &[2]);
        state.players.get_mut(&PlayerId(1)).unwrap().summons.push(Summon {
            id: SummonId(500),
            health: 30,
            max_health: 60,
        });
        state.players.get_mut(&PlayerId(2)).unwrap().health = 33;

        let old = Position::new(120, 100, 7);
        let new = Position::new(105, 100, 7);
        move_to(&mut state, 2, 105, 100, 7);
        let mut out = outbox(&state);
        update_player_status_moved(&state, &mut out, party, PlayerId(2), &old, &new);

        assert!(out.items().contains(&Notification::ShowStatus {
            to: PlayerId(2),
            subject: CreatureRef::Summon(SummonId(500)),
            show: true,
        }));
        assert!(out.items().contains(&Notification::HealthPercent {
            to: PlayerId(2),
            subject: CreatureRef::Summon(SummonId(500)),
            percent: 50,
        }));
        assert!(out.items().contains(&Notification::HealthPercent {
            to: PlayerId(1),
            subject: CreatureRef::Player(PlayerId(2)),
            percent: 33,
        }));
        assert!(out.items().contains(&Notification::ManaPercent {
            to: PlayerId(1),
            subject: PlayerId(2),
            percent: 50,
        }));
    }

    #[test]
    fn unlimited_distance_never_emits_deltas() {
        let mut state = world(&[(1, "Lars", 30), (2, "Mia", 25)]);
        let party = party_of(&mut state, 1, &[2]);
        let mut out = outbox(&state);
        update_player_status_moved(
            &state,
            &mut out,
            party,
            PlayerId(2),
            &Position::new(0, 0, 7),
            &Position::new(5_000, 0, 7),
        );
        assert!(out.is_empty());

        update_player_status(&state, &mut out, party, PlayerId(2));
        assert!(status_events(&out).iter().all(|(_, _, show)| *show));
        assert_eq!(status_events(&out).len(), 2);
    }

    #[test]
    fn narrow_broadcasts_apply_range_and_caps() {
        let mut state = world(&[(1, "Lars", 30), (2, "Mia", 25), (3, "Ned", 25)]);
        state.constants.max_status_distance = 10;
        let party = party_of(&mut state, 1, &[2, 3]);
        move_to(&mut state, 3, 150, 100, 7);

        let mut out = outbox(&state);
        update_player_health(&state, &mut out, party, PlayerId(1), CreatureRef::Player(PlayerId(1)), 40);
        update_player_mana(&state, &mut out, party, PlayerId(1), 70);
        update_player_vocation(&state, &mut out, party, PlayerId(1));
        let recipients: Vec<PlayerId> = out.items().iter().map(Notification::recipient).collect();
        assert_eq!(recipients, vec![PlayerId(2), PlayerId(2), PlayerId(2)]);

        let mut no_vocations = Outbox::new(ProtocolCaps {
            player_vocations: false,
            ..ProtocolCaps::default()
        });
        update_player_vocation(&state, &mut no_vocations, party, PlayerId(1));
        assert!(no_vocations.is_empty());

        let mut legacy = Outbox::new(ProtocolCaps {
            party_list: false,
            player_vocations: true,
            player_helpers: true,
        });
        update_player_health(&state, &mut legacy, party, PlayerId(1), CreatureRef::Player(PlayerId(1)), 40);
        update_player_status(&state, &mut legacy, party, PlayerId(1));
        assert!(legacy.is_empty());
    }
}

//! Membership and leadership controller.
//!
//! Join, leave, leadership transfer and disband. Every roster change updates
//! the affected player's back-reference in the same call, and any change that
//! leaves a party without a leader or without prospects tears it down before
//! returning. Callers must re-validate their `PartyId` afterwards.

use tracing::info;

use crate::domain::{Party, PartyId, PlayerId, WorldState};
use crate::eligibility::{clear_action, update_shared_experience};
use crate::errors::{HookKind, PartyError};
use crate::hooks::PartyHooks;
use crate::notify::Outbox;
use crate::state::destroy_party;
use crate::visibility::{show_player_status, update_player_status};

pub const MSG_DISBANDED: &str = "Your party has been disbanded.";
pub const MSG_LEFT: &str = "You have left the party.";
pub const MSG_NEW_LEADER_SELF: &str = "You are now the leader of the party.";

/// Text to every participant, and to pending invitees when asked.
pub fn broadcast(
    state: &WorldState,
    out: &mut Outbox,
    party_id: PartyId,
    text: &str,
    include_invitees: bool,
) {
    let Some(party) = state.parties.get(&party_id) else {
        return;
    };
    for &member in &party.members {
        out.text(member, text);
    }
    out.text(party.leader, text);
    if include_invitees {
        for &invitee in &party.invitees {
            out.text(invitee, text);
        }
    }
}

/// "Name'" for names ending in s, "Name's" otherwise.
fn possessive_name(name: &str) -> String {
    if name.ends_with('s') {
        format!("{}'", name)
    } else {
        format!("{}'s", name)
    }
}

/// Accept a pending invitation.
pub fn join(
    state: &mut WorldState,
    out: &mut Outbox,
    hooks: &dyn PartyHooks,
    party_id: PartyId,
    candidate: PlayerId,
) -> Result<(), PartyError> {
    let party = state.party(party_id)?;
    let player = state.player(candidate)?;
    if !party.is_invited(candidate) {
        return Err(PartyError::NotInvited {
            party: party_id,
            player: candidate,
        });
    }
    if player.party.is_some() {
        return Err(PartyError::AlreadyInParty(candidate));
    }
    if !hooks.on_join(party, player) {
        return Err(PartyError::Vetoed(HookKind::Join));
    }
    let name = player.name.clone();

    let party = state.party_mut(party_id)?;
    party.invitees.retain(|&p| p != candidate);
    let leader = party.leader;
    let members = party.members.clone();

    broadcast(state, out, party_id, &format!("{} has joined the party.", name), false);
    state.set_party_ref(candidate, Some(party_id));

    for &member in &members {
        out.icons(state, member, candidate);
        out.icons(state, candidate, member);
    }
    out.icons(state, candidate, candidate);
    out.icons(state, leader, candidate);
    out.icons(state, candidate, leader);

    state.party_mut(party_id)?.members.push(candidate);
    out.helpers(candidate);
    update_player_status(state, out, party_id, candidate);

    state.player_mut(candidate)?.invitations.remove(&party_id);
    update_shared_experience(state, out, party_id);

    out.text(
        candidate,
        format!(
            "You have joined {} party. Open the party channel to communicate with your companions.",
            possessive_name(state.name_of(leader))
        ),
    );
    info!(party = %party_id, player = %candidate, "joined party");
    Ok(())
}

/// Leave a party. A voluntary leave can be refused by the fight flag or the
/// leave hook; a forced one (logout) cannot.
pub fn leave(
    state: &mut WorldState,
    out: &mut Outbox,
    hooks: &dyn PartyHooks,
    party_id: PartyId,
    player: PlayerId,
    forced: bool,
) -> Result<(), PartyError> {
    let party = state.party(party_id)?;
    if !party.is_participant(player) {
        return Err(PartyError::NotParticipant {
            party: party_id,
            player,
        });
    }
    if !forced {
        let p = state.player(player)?;
        if p.in_fight {
            return Err(PartyError::InFight(player));
        }
        if !hooks.on_leave(party, p) {
            return Err(PartyError::Vetoed(HookKind::Leave));
        }
    }

    let was_leader = party.leader == player;
    let successor = party.members.first().copied();
    let lone_member = party.members.len() == 1 && party.invitees.is_empty();

    let mut missing_leader = false;
    if was_leader {
        match successor {
            Some(next) if !lone_member => transfer_leadership(state, out, party_id, next)?,
            _ => missing_leader = true,
        }
    }

    let party = state.party_mut(party_id)?;
    party.members.retain(|&m| m != player);
    let leader = party.leader;
    let members = party.members.clone();
    let name = state.name_of(player).to_string();

    state.set_party_ref(player, None);
    out.close_channel(player);
    out.helpers(player);

    for &member in &members {
        out.icons(state, member, player);
        out.icons(state, player, member);
        out.helpers(member);
    }
    out.icons(state, leader, player);
    out.icons(state, player, player);
    out.icons(state, player, leader);

    if out.caps().party_list {
        for other in std::iter::once(leader).chain(members.iter().copied()) {
            if other != player {
                show_player_status(state, out, player, other, false);
            }
        }
    }

    out.text(player, MSG_LEFT);
    update_shared_experience(state, out, party_id);
    clear_action(state, out, party_id, player);
    broadcast(state, out, party_id, &format!("{} has left the party.", name), false);
    info!(party = %party_id, player = %player, forced, "left party");

    let empty = state.party(party_id)?.is_empty();
    if missing_leader || empty {
        teardown(state, out, party_id);
    }
    Ok(())
}

/// Leader hands leadership to one of its members.
pub fn pass_leadership(
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
    transfer_leadership(state, out, party_id, candidate)
}

/// Make `candidate` leader. The old leader becomes first in line.
fn transfer_leadership(
    state: &mut WorldState,
    out: &mut Outbox,
    party_id: PartyId,
    candidate: PlayerId,
) -> Result<(), PartyError> {
    let party = state.party_mut(party_id)?;
    if party.leader == candidate {
        return Err(PartyError::AlreadyLeader {
            party: party_id,
            player: candidate,
        });
    }
    if !party.is_member(candidate) {
        return Err(PartyError::NotParticipant {
            party: party_id,
            player: candidate,
        });
    }
    party.members.retain(|&m| m != candidate);

    let text = format!("{} is now the leader of the party.", state.name_of(candidate));
    broadcast(state, out, party_id, &text, true);

    let party = state.party_mut(party_id)?;
    let old_leader = party.leader;
    party.leader = candidate;
    party.members.insert(0, old_leader);
    let members = party.members.clone();
    let invitees = party.invitees.clone();

    update_shared_experience(state, out, party_id);

    for &member in &members {
        out.member_shield(state, member, old_leader);
        out.member_shield(state, member, candidate);
    }
    for &invitee in &invitees {
        out.creature_shield(state, invitee, old_leader);
        out.creature_shield(state, invitee, candidate);
    }
    out.member_shield(state, candidate, old_leader);
    out.member_shield(state, candidate, candidate);

    out.text(candidate, MSG_NEW_LEADER_SELF);
    info!(party = %party_id, from = %old_leader, to = %candidate, "leadership passed");
    Ok(())
}

/// Explicit disband request by the leader; the disband hook may veto it.
pub fn disband(
    state: &mut WorldState,
    out: &mut Outbox,
    hooks: &dyn PartyHooks,
    party_id: PartyId,
    requestor: PlayerId,
) -> Result<(), PartyError> {
    let party = state.party(party_id)?;
    if party.leader != requestor {
        return Err(PartyError::NotLeader {
            party: party_id,
            player: requestor,
        });
    }
    if !hooks.on_disband(party) {
        return Err(PartyError::Vetoed(HookKind::Disband));
    }
    teardown(state, out, party_id);
    Ok(())
}

/// Remove the party from the registry and release everyone it referenced.
/// The handle is invalid once this returns.
pub(crate) fn teardown(state: &mut WorldState, out: &mut Outbox, party_id: PartyId) -> Option<Party> {
    let party = destroy_party(state, party_id)?;
    let leader = party.leader;

    state.set_party_ref(leader, None);
    out.close_channel(leader);
    out.helpers(leader);
    out.icons(state, leader, leader);
    out.text(leader, MSG_DISBANDED);

    for &invitee in &party.invitees {
        if let Some(p) = state.players.get_mut(&invitee) {
            p.invitations.remove(&party_id);
        }
        out.creature_shield(state, leader, invitee);
    }

    for &member in &party.members {
        state.set_party_ref(member, None);
        out.close_channel(member);
        out.text(member, MSG_DISBANDED);
    }

    for &member in &party.members {
        for &other in &party.members {
            out.icons(state, other, member);
        }
        out.icons(state, member, leader);
        out.icons(state, leader, member);
        out.helpers(member);
    }

    if out.caps().party_list {
        let all = party.participants();
        for (i, &a) in all.iter().enumerate() {
            for &b in &all[i + 1..] {
                show_player_status(state, out, a, b, false);
            }
        }
    }
    Some(party)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::AllowAll;
    use crate::invitations::invite_player;
    use crate::notify::{Notification, Shield};
    use crate::testkit::{outbox, party_of, texts_to, world};

    struct DenyAll;

    impl PartyHooks for DenyAll {
        fn on_disband(&self, _party: &Party) -> bool {
            false
        }
        fn on_leave(&self, _party: &Party, _player: &crate::domain::Player) -> bool {
            false
        }
        fn on_join(&self, _party: &Party, _player: &crate::domain::Player) -> bool {
            false
        }
    }

    fn lab() -> WorldState {
        world(&[(1, "Lars", 30), (2, "Ann", 25), (3, "Bo", 25), (4, "Cid", 25)])
    }

    #[test]
    fn join_appends_and_removes_invitation() {
        let mut state = lab();
        let party = party_of(&mut state, 1, &[2, 3]);
        let p = &state.parties[&party];
        assert_eq!(p.members, vec![PlayerId(2), PlayerId(3)]);
        assert!(p.invitees.is_empty());
        assert_eq!(state.party_of(PlayerId(3)), Some(party));
        assert!(state.players[&PlayerId(3)].invitations.is_empty());
    }

    #[test]
    fn join_message_handles_trailing_s() {
        let mut state = lab();
        let mut out = outbox(&state);
        let party = invite_player(&mut state, &mut out, PlayerId(1), PlayerId(2)).unwrap();
        let mut out = outbox(&state);
        join(&mut state, &mut out, &AllowAll, party, PlayerId(2)).unwrap();

        assert_eq!(
            texts_to(&out, PlayerId(2)),
            vec!["You have joined Lars' party. Open the party channel to communicate with your companions."]
        );
        assert_eq!(texts_to(&out, PlayerId(1)), vec!["Ann has joined the party."]);
        assert!(out.items().contains(&Notification::PartyIcons {
            to: PlayerId(1),
            subject: PlayerId(2),
            shield: Shield::Blue,
        }));
        assert_eq!(possessive_name("Ann"), "Ann's");
    }

    #[test]
    fn join_requires_invitation_and_respects_hook() {
        let mut state = lab();
        let mut out = outbox(&state);
        let party = invite_player(&mut state, &mut out, PlayerId(1), PlayerId(2)).unwrap();
        assert!(matches!(
            join(&mut state, &mut out, &AllowAll, party, PlayerId(3)),
            Err(PartyError::NotInvited { .. })
        ));
        assert_eq!(
            join(&mut state, &mut out, &DenyAll, party, PlayerId(2)),
            Err(PartyError::Vetoed(HookKind::Join))
        );
        assert!(state.parties[&party].is_invited(PlayerId(2)));
    }

    #[test]
    fn members_leaving_one_by_one_disbands_at_the_end() {
        let mut state = lab();
        let party = party_of(&mut state, 1, &[2, 3]);
        let mut out = outbox(&state);

        leave(&mut state, &mut out, &AllowAll, party, PlayerId(2), false).unwrap();
        assert_eq!(state.parties[&party].members, vec![PlayerId(3)]);
        assert_eq!(state.parties[&party].leader, PlayerId(1));
        assert_eq!(state.party_of(PlayerId(2)), None);

        leave(&mut state, &mut out, &AllowAll, party, PlayerId(3), false).unwrap();
        assert!(!state.parties.contains_key(&party));
        for id in 1..=3 {
            assert_eq!(state.party_of(PlayerId(id)), None);
        }
    }

    #[test]
    fn leader_leaving_with_single_member_disbands() {
        let mut state = lab();
        let party = party_of(&mut state, 1, &[2]);
        let mut out = outbox(&state);
        leave(&mut state, &mut out, &AllowAll, party, PlayerId(1), false).unwrap();

        assert!(state.parties.is_empty());
        assert_eq!(state.party_of(PlayerId(1)), None);
        assert_eq!(state.party_of(PlayerId(2)), None);
        assert!(texts_to(&out, PlayerId(2)).contains(&MSG_DISBANDED.to_string()));
    }

    #[test]
    fn leader_leaving_passes_to_front_member() {
        let mut state = lab();
        let party = party_of(&mut state, 1, &[2, 3]);
        let mut out = outbox(&state);
        leave(&mut state, &mut out, &AllowAll, party, PlayerId(1), false).unwrap();

        let p = &state.parties[&party];
        assert_eq!(p.leader, PlayerId(2));
        assert_eq!(p.members, vec![PlayerId(3)]);
        assert_eq!(state.party_of(PlayerId(1)), None);
        assert!(texts_to(&out, PlayerId(2)).contains(&MSG_NEW_LEADER_SELF.to_string()));
        assert!(texts_to(&out, PlayerId(3)).contains(&"Lars has left the party.".to_string()));
    }

    #[test]
    fn leader_leaving_with_member_and_invitee_keeps_party() {
        let mut state = lab();
        let party = party_of(&mut state, 1, &[2]);
        let mut out = outbox(&state);
        invite_player(&mut state, &mut out, PlayerId(1), PlayerId(4)).unwrap();
        leave(&mut state, &mut out, &AllowAll, party, PlayerId(1), false).unwrap();

        let p = &state.parties[&party];
        assert_eq!(p.leader, PlayerId(2));
        assert!(p.members.is_empty());
        assert_eq!(p.invitees, vec![PlayerId(4)]);
    }

    #[test]
    fn leave_refused_in_fight_unless_forced() {
        let mut state = lab();
        let party = party_of(&mut state, 1, &[2, 3]);
        state.players.get_mut(&PlayerId(2)).unwrap().in_fight = true;
        let mut out = outbox(&state);

        assert_eq!(
            leave(&mut state, &mut out, &AllowAll, party, PlayerId(2), false),
            Err(PartyError::InFight(PlayerId(2)))
        );
        assert_eq!(
            leave(&mut state, &mut out, &DenyAll, party, PlayerId(3), false),
            Err(PartyError::Vetoed(HookKind::Leave))
        );
        leave(&mut state, &mut out, &DenyAll, party, PlayerId(2), true).unwrap();
        assert_eq!(state.parties[&party].members, vec![PlayerId(3)]);
    }

    #[test]
    fn leave_by_outsider_fails() {
        let mut state = lab();
        let party = party_of(&mut state, 1, &[2]);
        let mut out = outbox(&state);
        assert!(matches!(
            leave(&mut state, &mut out, &AllowAll, party, PlayerId(4), false),
            Err(PartyError::NotParticipant { .. })
        ));
    }

    #[test]
    fn pass_leadership_reinserts_old_leader_at_front() {
        let mut state = lab();
        let party = party_of(&mut state, 1, &[2, 3, 4]);
        let mut out = outbox(&state);
        pass_leadership(&mut state, &mut out, party, PlayerId(1), PlayerId(3)).unwrap();

        let p = &state.parties[&party];
        assert_eq!(p.leader, PlayerId(3));
        assert_eq!(p.members, vec![PlayerId(1), PlayerId(2), PlayerId(4)]);
        assert_eq!(texts_to(&out, PlayerId(3)), vec![MSG_NEW_LEADER_SELF]);
        assert_eq!(
            texts_to(&out, PlayerId(2)),
            vec!["Bo is now the leader of the party."]
        );
    }

    #[test]
    fn pass_leadership_rejections() {
        let mut state = lab();
        let party = party_of(&mut state, 1, &[2]);
        let mut out = outbox(&state);
        assert!(matches!(
            pass_leadership(&mut state, &mut out, party, PlayerId(1), PlayerId(1)),
            Err(PartyError::AlreadyLeader { .. })
        ));
        assert!(matches!(
            pass_leadership(&mut state, &mut out, party, PlayerId(1), PlayerId(4)),
            Err(PartyError::NotParticipant { .. })
        ));
        assert!(matches!(
            pass_leadership(&mut state, &mut out, party, PlayerId(2), PlayerId(1)),
            Err(PartyError::NotLeader { .. })
        ));
    }

    #[test]
    fn leadership_announcement_reaches_invitees() {
        let mut state = lab();
        let party = party_of(&mut state, 1, &[2]);
        let mut out = outbox(&state);
        invite_player(&mut state, &mut out, PlayerId(1), PlayerId(4)).unwrap();
        let mut out = outbox(&state);
        pass_leadership(&mut state, &mut out, party, PlayerId(1), PlayerId(2)).unwrap();
        assert_eq!(
            texts_to(&out, PlayerId(4)),
            vec!["Ann is now the leader of the party."]
        );
    }

    #[test]
    fn disband_clears_everyone() {
        let mut state = lab();
        let party = party_of(&mut state, 1, &[2, 3]);
        let mut out = outbox(&state);
        invite_player(&mut state, &mut out, PlayerId(1), PlayerId(4)).unwrap();

        assert_eq!(
            disband(&mut state, &mut out, &DenyAll, party, PlayerId(1)),
            Err(PartyError::Vetoed(HookKind::Disband))
        );
        assert!(matches!(
            disband(&mut state, &mut out, &AllowAll, party, PlayerId(2)),
            Err(PartyError::NotLeader { .. })
        ));

        let mut out = outbox(&state);
        disband(&mut state, &mut out, &AllowAll, party, PlayerId(1)).unwrap();
        assert!(state.parties.is_empty());
        for id in 1..=4 {
            let p = &state.players[&PlayerId(id)];
            assert_eq!(p.party, None);
            assert!(p.invitations.is_empty());
        }
        for id in 1..=3 {
            assert_eq!(texts_to(&out, PlayerId(id)), vec![MSG_DISBANDED]);
        }
        assert!(out
            .items()
            .iter()
            .filter(|n| matches!(n, Notification::PartyIcons { .. } | Notification::CreatureShield { .. }))
            .all(|n| matches!(
                n,
                Notification::PartyIcons { shield: Shield::None, .. }
                    | Notification::CreatureShield { shield: Shield::None, .. }
            )));
    }

    #[test]
    fn stale_handle_is_rejected_after_disband() {
        let mut state = lab();
        let party = party_of(&mut state, 1, &[2]);
        let mut out = outbox(&state);
        disband(&mut state, &mut out, &AllowAll, party, PlayerId(1)).unwrap();
        assert_eq!(
            leave(&mut state, &mut out, &AllowAll, party, PlayerId(2), false),
            Err(PartyError::UnknownParty(party))
        );
        assert!(teardown(&mut state, &mut out, party).is_none());
    }
}

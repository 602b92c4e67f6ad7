//! Proto ↔ Kernel conversion bridge.
//!
//! Converts between the protobuf wire types (proto_types.rs) and the
//! kernel's typed `ActionEnvelope`. Kernel → proto is total; proto → kernel
//! fails on frames that are missing a required message or carry values the
//! kernel types cannot hold.

use thiserror::Error;

use party_engine::domain::{
    Gender, PartyConstants, PlayerId, PlayerProfile, Position, ProtocolCaps, Summon, SummonId,
};
use party_engine::events::{ActionEnvelope, PartyAction};

use crate::proto_types::*;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BridgeError {
    #[error("envelope {0} carries no action")]
    MissingAction(u64),

    #[error("{action} is missing its {field} message")]
    MissingField {
        action: &'static str,
        field: &'static str,
    },

    #[error("unknown gender value {0}")]
    UnknownGender(i32),

    #[error("vocation {0} does not fit in 16 bits")]
    VocationRange(u32),
}

fn required<T>(value: Option<T>, action: &'static str, field: &'static str) -> Result<T, BridgeError> {
    value.ok_or(BridgeError::MissingField { action, field })
}

fn vocation(v: u32) -> Result<u16, BridgeError> {
    u16::try_from(v).map_err(|_| BridgeError::VocationRange(v))
}

// ── proto → kernel ─────────────────────────────────────────────

pub fn proto_to_kernel(proto: &ProtoActionEnvelope) -> Result<ActionEnvelope, BridgeError> {
    let kind = proto
        .action
        .as_ref()
        .and_then(|a| a.kind.as_ref())
        .ok_or(BridgeError::MissingAction(proto.sequence))?;

    let action = match kind {
        ActionKind::InitializeConstants(ic) => PartyAction::InitializeConstants {
            constants: required(ic.constants.as_ref(), "initialize_constants", "constants")
                .map(constants_from_proto)?,
        },
        ActionKind::PlayerEnter(pe) => PartyAction::PlayerEnter {
            profile: profile_from_proto(required(pe.profile.as_ref(), "player_enter", "profile")?)?,
        },
        ActionKind::PlayerExit(r) => PartyAction::PlayerExit {
            player: PlayerId(r.player),
        },
        ActionKind::Invite(i) => PartyAction::Invite {
            inviter: PlayerId(i.inviter),
            invitee: PlayerId(i.invitee),
        },
        ActionKind::RevokeInvitation(t) => PartyAction::RevokeInvitation {
            leader: PlayerId(t.leader),
            invitee: PlayerId(t.target),
        },
        ActionKind::Join(j) => PartyAction::Join {
            player: PlayerId(j.player),
            leader: PlayerId(j.leader),
        },
        ActionKind::Leave(r) => PartyAction::Leave {
            player: PlayerId(r.player),
        },
        ActionKind::PassLeadership(t) => PartyAction::PassLeadership {
            leader: PlayerId(t.leader),
            candidate: PlayerId(t.target),
        },
        ActionKind::Disband(r) => PartyAction::Disband {
            leader: PlayerId(r.player),
        },
        ActionKind::SetSharedExperience(s) => PartyAction::SetSharedExperience {
            player: PlayerId(s.player),
            active: s.active,
        },
        ActionKind::ShareExperience(s) => PartyAction::ShareExperience {
            source: PlayerId(s.source),
            amount: s.amount,
        },
        ActionKind::CombatAction(c) => PartyAction::CombatAction {
            player: PlayerId(c.player),
            points: c.points,
        },
        ActionKind::PlayerMove(m) => PartyAction::PlayerMove {
            player: PlayerId(m.player),
            to: position_from_proto(required(m.to.as_ref(), "player_move", "to")?),
        },
        ActionKind::HealthChanged(v) => PartyAction::HealthChanged {
            player: PlayerId(v.player),
            health: v.current,
            max_health: v.maximum,
        },
        ActionKind::SummonHealthChanged(s) => PartyAction::SummonHealthChanged {
            player: PlayerId(s.player),
            summon: SummonId(s.summon),
            health: s.health,
            max_health: s.max_health,
        },
        ActionKind::ManaChanged(v) => PartyAction::ManaChanged {
            player: PlayerId(v.player),
            mana: v.current,
            max_mana: v.maximum,
        },
        ActionKind::VocationChanged(v) => PartyAction::VocationChanged {
            player: PlayerId(v.player),
            vocation: vocation(v.vocation)?,
        },
        ActionKind::LevelChanged(l) => PartyAction::LevelChanged {
            player: PlayerId(l.player),
            level: l.level,
        },
        ActionKind::SetInFight(f) => PartyAction::SetInFight {
            player: PlayerId(f.player),
            in_fight: f.in_fight,
        },
        ActionKind::RefreshStatus(r) => PartyAction::RefreshStatus {
            player: PlayerId(r.player),
        },
    };

    Ok(ActionEnvelope {
        sequence: proto.sequence,
        logical_time: proto.logical_time,
        schema_version: proto.schema_version,
        action,
    })
}

fn position_from_proto(p: &ProtoPosition) -> Position {
    Position::new(p.x, p.y, p.z)
}

fn constants_from_proto(c: &ProtoConstants) -> PartyConstants {
    let protocol = c
        .protocol
        .as_ref()
        .map(|p| ProtocolCaps {
            party_list: p.party_list,
            player_vocations: p.player_vocations,
            player_helpers: p.player_helpers,
        })
        .unwrap_or_default();
    PartyConstants {
        pz_locked_ms: c.pz_locked_ms,
        max_status_distance: c.max_status_distance,
        shared_exp_range_xy: c.shared_exp_range_xy,
        shared_exp_range_z: c.shared_exp_range_z,
        protocol,
    }
}

fn profile_from_proto(p: &ProtoProfile) -> Result<PlayerProfile, BridgeError> {
    let gender = match ProtoGender::try_from(p.gender) {
        Ok(ProtoGender::Female) => Gender::Female,
        Ok(ProtoGender::Male) => Gender::Male,
        Ok(ProtoGender::Unspecified) | Err(_) => return Err(BridgeError::UnknownGender(p.gender)),
    };
    Ok(PlayerProfile {
        id: PlayerId(p.id),
        name: p.name.clone(),
        level: p.level,
        health: p.health,
        max_health: p.max_health,
        mana: p.mana,
        max_mana: p.max_mana,
        position: position_from_proto(required(p.position.as_ref(), "player_enter", "position")?),
        gender,
        vocation: vocation(p.vocation)?,
        exempt_from_activity: p.exempt_from_activity,
        summons: p
            .summons
            .iter()
            .map(|s| Summon {
                id: SummonId(s.id),
                health: s.health,
                max_health: s.max_health,
            })
            .collect(),
    })
}

// ── kernel → proto ─────────────────────────────────────────────

pub fn kernel_to_proto(envelope: &ActionEnvelope) -> ProtoActionEnvelope {
    let kind = match &envelope.action {
        PartyAction::InitializeConstants { constants } => {
            ActionKind::InitializeConstants(InitializeConstants {
                constants: Some(constants_to_proto(constants)),
            })
        }
        PartyAction::PlayerEnter { profile } => ActionKind::PlayerEnter(PlayerEnter {
            profile: Some(profile_to_proto(profile)),
        }),
        PartyAction::PlayerExit { player } => ActionKind::PlayerExit(PlayerRef { player: player.0 }),
        PartyAction::Invite { inviter, invitee } => ActionKind::Invite(Invite {
            inviter: inviter.0,
            invitee: invitee.0,
        }),
        PartyAction::RevokeInvitation { leader, invitee } => {
            ActionKind::RevokeInvitation(LeaderTarget {
                leader: leader.0,
                target: invitee.0,
            })
        }
        PartyAction::Join { player, leader } => ActionKind::Join(Join {
            player: player.0,
            leader: leader.0,
        }),
        PartyAction::Leave { player } => ActionKind::Leave(PlayerRef { player: player.0 }),
        PartyAction::PassLeadership { leader, candidate } => {
            ActionKind::PassLeadership(LeaderTarget {
                leader: leader.0,
                target: candidate.0,
            })
        }
        PartyAction::Disband { leader } => ActionKind::Disband(PlayerRef { player: leader.0 }),
        PartyAction::SetSharedExperience { player, active } => {
            ActionKind::SetSharedExperience(SetSharedExperience {
                player: player.0,
                active: *active,
            })
        }
        PartyAction::ShareExperience { source, amount } => {
            ActionKind::ShareExperience(ShareExperience {
                source: source.0,
                amount: *amount,
            })
        }
        PartyAction::CombatAction { player, points } => ActionKind::CombatAction(CombatAction {
            player: player.0,
            points: *points,
        }),
        PartyAction::PlayerMove { player, to } => ActionKind::PlayerMove(PlayerMove {
            player: player.0,
            to: Some(position_to_proto(to)),
        }),
        PartyAction::HealthChanged {
            player,
            health,
            max_health,
        } => ActionKind::HealthChanged(Vitals {
            player: player.0,
            current: *health,
            maximum: *max_health,
        }),
        PartyAction::SummonHealthChanged {
            player,
            summon,
            health,
            max_health,
        } => ActionKind::SummonHealthChanged(SummonHealthChanged {
            player: player.0,
            summon: summon.0,
            health: *health,
            max_health: *max_health,
        }),
        PartyAction::ManaChanged {
            player,
            mana,
            max_mana,
        } => ActionKind::ManaChanged(Vitals {
            player: player.0,
            current: *mana,
            maximum: *max_mana,
        }),
        PartyAction::VocationChanged { player, vocation } => {
            ActionKind::VocationChanged(VocationChanged {
                player: player.0,
                vocation: u32::from(*vocation),
            })
        }
        PartyAction::LevelChanged { player, level } => ActionKind::LevelChanged(LevelChanged {
            player: player.0,
            level: *level,
        }),
        PartyAction::SetInFight { player, in_fight } => ActionKind::SetInFight(SetInFight {
            player: player.0,
            in_fight: *in_fight,
        }),
        PartyAction::RefreshStatus { player } => {
            ActionKind::RefreshStatus(PlayerRef { player: player.0 })
        }
    };

    ProtoActionEnvelope {
        sequence: envelope.sequence,
        logical_time: envelope.logical_time,
        schema_version: envelope.schema_version,
        action: Some(ProtoAction { kind: Some(kind) }),
    }
}

fn position_to_proto(p: &Position) -> ProtoPosition {
    ProtoPosition {
        x: p.x,
        y: p.y,
        z: p.z,
    }
}

fn constants_to_proto(c: &PartyConstants) -> ProtoConstants {
    ProtoConstants {
        pz_locked_ms: c.pz_locked_ms,
        max_status_distance: c.max_status_distance,
        shared_exp_range_xy: c.shared_exp_range_xy,
        shared_exp_range_z: c.shared_exp_range_z,
        protocol: Some(ProtoProtocolCaps {
            party_list: c.protocol.party_list,
            player_vocations: c.protocol.player_vocations,
            player_helpers: c.protocol.player_helpers,
        }),
    }
}

fn profile_to_proto(p: &PlayerProfile) -> ProtoProfile {
    let gender = match p.gender {
        Gender::Female => ProtoGender::Female,
        Gender::Male => ProtoGender::Male,
    };
    ProtoProfile {
        id: p.id.0,
        name: p.name.clone(),
        level: p.level,
        health: p.health,
        max_health: p.max_health,
        mana: p.mana,
        max_mana: p.max_mana,
        position: Some(position_to_proto(&p.position)),
        gender: gender as i32,
        vocation: u32::from(p.vocation),
        exempt_from_activity: p.exempt_from_activity,
        summons: p
            .summons
            .iter()
            .map(|s| ProtoSummon {
                id: s.id.0,
                health: s.health,
                max_health: s.max_health,
            })
            .collect(),
    }
}

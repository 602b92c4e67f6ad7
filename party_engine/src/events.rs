/// Party kernel — Action Definitions
///
/// Actions are pure data. They carry intent and payload only.
/// They contain ZERO transition logic.
///
/// Schema version is locked at 1. Envelopes with another schema_version
/// are rejected by the engine.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{PartyConstants, PlayerId, PlayerProfile, Position, SummonId};

/// Schema version for v1 kernel actions.
pub const SCHEMA_VERSION: u32 = 1;

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PartyAction {
    InitializeConstants {
        #[serde(default)]
        constants: PartyConstants,
    },
    PlayerEnter {
        profile: PlayerProfile,
    },
    PlayerExit {
        player: PlayerId,
    },
    Invite {
        inviter: PlayerId,
        invitee: PlayerId,
    },
    RevokeInvitation {
        leader: PlayerId,
        invitee: PlayerId,
    },
    Join {
        player: PlayerId,
        leader: PlayerId,
    },
    Leave {
        player: PlayerId,
    },
    PassLeadership {
        leader: PlayerId,
        candidate: PlayerId,
    },
    Disband {
        leader: PlayerId,
    },
    SetSharedExperience {
        player: PlayerId,
        active: bool,
    },
    /// Experience earned by `source`; split across the party when shared
    /// experience is enabled, kept by `source` otherwise.
    ShareExperience {
        source: PlayerId,
        amount: u64,
    },
    CombatAction {
        player: PlayerId,
        points: u32,
    },
    PlayerMove {
        player: PlayerId,
        to: Position,
    },
    HealthChanged {
        player: PlayerId,
        health: i32,
        max_health: i32,
    },
    SummonHealthChanged {
        player: PlayerId,
        summon: SummonId,
        health: i32,
        max_health: i32,
    },
    ManaChanged {
        player: PlayerId,
        mana: i32,
        max_mana: i32,
    },
    VocationChanged {
        player: PlayerId,
        vocation: u16,
    },
    LevelChanged {
        player: PlayerId,
        level: u32,
    },
    SetInFight {
        player: PlayerId,
        in_fight: bool,
    },
    /// Full status refresh for `player` against every other participant,
    /// e.g. after login or teleport.
    RefreshStatus {
        player: PlayerId,
    },
}

impl PartyAction {
    /// Wire name, identical to the serde tag.
    pub fn name(&self) -> &'static str {
        match self {
            PartyAction::InitializeConstants { .. } => "initialize_constants",
            PartyAction::PlayerEnter { .. } => "player_enter",
            PartyAction::PlayerExit { .. } => "player_exit",
            PartyAction::Invite { .. } => "invite",
            PartyAction::RevokeInvitation { .. } => "revoke_invitation",
            PartyAction::Join { .. } => "join",
            PartyAction::Leave { .. } => "leave",
            PartyAction::PassLeadership { .. } => "pass_leadership",
            PartyAction::Disband { .. } => "disband",
            PartyAction::SetSharedExperience { .. } => "set_shared_experience",
            PartyAction::ShareExperience { .. } => "share_experience",
            PartyAction::CombatAction { .. } => "combat_action",
            PartyAction::PlayerMove { .. } => "player_move",
            PartyAction::HealthChanged { .. } => "health_changed",
            PartyAction::SummonHealthChanged { .. } => "summon_health_changed",
            PartyAction::ManaChanged { .. } => "mana_changed",
            PartyAction::VocationChanged { .. } => "vocation_changed",
            PartyAction::LevelChanged { .. } => "level_changed",
            PartyAction::SetInFight { .. } => "set_in_fight",
            PartyAction::RefreshStatus { .. } => "refresh_status",
        }
    }

    /// The player whose request this is, if any. Refusals are reported to them.
    pub fn actor(&self) -> Option<PlayerId> {
        match self {
            PartyAction::InitializeConstants { .. } => None,
            PartyAction::PlayerEnter { profile } => Some(profile.id),
            PartyAction::Invite { inviter, .. } => Some(*inviter),
            PartyAction::RevokeInvitation { leader, .. }
            | PartyAction::PassLeadership { leader, .. }
            | PartyAction::Disband { leader } => Some(*leader),
            PartyAction::ShareExperience { source, .. } => Some(*source),
            PartyAction::PlayerExit { player }
            | PartyAction::Join { player, .. }
            | PartyAction::Leave { player }
            | PartyAction::SetSharedExperience { player, .. }
            | PartyAction::CombatAction { player, .. }
            | PartyAction::PlayerMove { player, .. }
            | PartyAction::HealthChanged { player, .. }
            | PartyAction::SummonHealthChanged { player, .. }
            | PartyAction::ManaChanged { player, .. }
            | PartyAction::VocationChanged { player, .. }
            | PartyAction::LevelChanged { player, .. }
            | PartyAction::SetInFight { player, .. }
            | PartyAction::RefreshStatus { player } => Some(*player),
        }
    }
}

/// One sequenced action. `logical_time` is the world clock in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionEnvelope {
    pub sequence: u64,
    pub logical_time: u64,
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub action: PartyAction,
}

impl ActionEnvelope {
    pub fn new(sequence: u64, logical_time: u64, action: PartyAction) -> Self {
        Self {
            sequence,
            logical_time,
            schema_version: SCHEMA_VERSION,
            action,
        }
    }

    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    /// Parse an envelope from JSON (script files, fixtures).
    pub fn from_value(v: &Value) -> Result<Self, serde_json::Error> {
        Self::deserialize(v)
    }
}

//! Hand-written protobuf types for the action log.
//!
//! Uses prost derive macros for encode/decode without prost-build.
//! Field numbers are part of the on-disk format: never renumber.

use prost::Message;

// ── Action Envelope ────────────────────────────────────────────

#[derive(Clone, PartialEq, Message)]
pub struct ProtoActionEnvelope {
    #[prost(uint64, tag = "1")]
    pub sequence: u64,
    #[prost(uint64, tag = "2")]
    pub logical_time: u64,
    #[prost(uint32, tag = "3")]
    pub schema_version: u32,
    #[prost(message, optional, tag = "4")]
    pub action: Option<ProtoAction>,
}

#[derive(Clone, PartialEq, Message)]
pub struct ProtoAction {
    #[prost(
        oneof = "ActionKind",
        tags = "1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20"
    )]
    pub kind: Option<ActionKind>,
}

#[derive(Clone, PartialEq, prost::Oneof)]
pub enum ActionKind {
    #[prost(message, tag = "1")]
    InitializeConstants(InitializeConstants),
    #[prost(message, tag = "2")]
    PlayerEnter(PlayerEnter),
    #[prost(message, tag = "3")]
    PlayerExit(PlayerRef),
    #[prost(message, tag = "4")]
    Invite(Invite),
    #[prost(message, tag = "5")]
    RevokeInvitation(LeaderTarget),
    #[prost(message, tag = "6")]
    Join(Join),
    #[prost(message, tag = "7")]
    Leave(PlayerRef),
    #[prost(message, tag = "8")]
    PassLeadership(LeaderTarget),
    #[prost(message, tag = "9")]
    Disband(PlayerRef),
    #[prost(message, tag = "10")]
    SetSharedExperience(SetSharedExperience),
    #[prost(message, tag = "11")]
    ShareExperience(ShareExperience),
    #[prost(message, tag = "12")]
    CombatAction(CombatAction),
    #[prost(message, tag = "13")]
    PlayerMove(PlayerMove),
    #[prost(message, tag = "14")]
    HealthChanged(Vitals),
    #[prost(message, tag = "15")]
    SummonHealthChanged(SummonHealthChanged),
    #[prost(message, tag = "16")]
    ManaChanged(Vitals),
    #[prost(message, tag = "17")]
    VocationChanged(VocationChanged),
    #[prost(message, tag = "18")]
    LevelChanged(LevelChanged),
    #[prost(message, tag = "19")]
    SetInFight(SetInFight),
    #[prost(message, tag = "20")]
    RefreshStatus(PlayerRef),
}

// ── Shared value types ─────────────────────────────────────────

#[derive(Clone, PartialEq, Message)]
pub struct ProtoPosition {
    #[prost(sint32, tag = "1")]
    pub x: i32,
    #[prost(sint32, tag = "2")]
    pub y: i32,
    #[prost(sint32, tag = "3")]
    pub z: i32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum ProtoGender {
    Unspecified = 0,
    Female = 1,
    Male = 2,
}

#[derive(Clone, PartialEq, Message)]
pub struct ProtoSummon {
    #[prost(uint32, tag = "1")]
    pub id: u32,
    #[prost(sint32, tag = "2")]
    pub health: i32,
    #[prost(sint32, tag = "3")]
    pub max_health: i32,
}

#[derive(Clone, PartialEq, Message)]
pub struct ProtoProfile {
    #[prost(uint32, tag = "1")]
    pub id: u32,
    #[prost(string, tag = "2")]
    pub name: String,
    #[prost(uint32, tag = "3")]
    pub level: u32,
    #[prost(sint32, tag = "4")]
    pub health: i32,
    #[prost(sint32, tag = "5")]
    pub max_health: i32,
    #[prost(sint32, tag = "6")]
    pub mana: i32,
    #[prost(sint32, tag = "7")]
    pub max_mana: i32,
    #[prost(message, optional, tag = "8")]
    pub position: Option<ProtoPosition>,
    #[prost(enumeration = "ProtoGender", tag = "9")]
    pub gender: i32,
    #[prost(uint32, tag = "10")]
    pub vocation: u32,
    #[prost(bool, tag = "11")]
    pub exempt_from_activity: bool,
    #[prost(message, repeated, tag = "12")]
    pub summons: Vec<ProtoSummon>,
}

#[derive(Clone, PartialEq, Message)]
pub struct ProtoProtocolCaps {
    #[prost(bool, tag = "1")]
    pub party_list: bool,
    #[prost(bool, tag = "2")]
    pub player_vocations: bool,
    #[prost(bool, tag = "3")]
    pub player_helpers: bool,
}

#[derive(Clone, PartialEq, Message)]
pub struct ProtoConstants {
    #[prost(uint64, tag = "1")]
    pub pz_locked_ms: u64,
    #[prost(uint32, tag = "2")]
    pub max_status_distance: u32,
    #[prost(uint32, tag = "3")]
    pub shared_exp_range_xy: u32,
    #[prost(uint32, tag = "4")]
    pub shared_exp_range_z: u32,
    #[prost(message, optional, tag = "5")]
    pub protocol: Option<ProtoProtocolCaps>,
}

// ── Action payloads ────────────────────────────────────────────

#[derive(Clone, PartialEq, Message)]
pub struct InitializeConstants {
    #[prost(message, optional, tag = "1")]
    pub constants: Option<ProtoConstants>,
}

#[derive(Clone, PartialEq, Message)]
pub struct PlayerEnter {
    #[prost(message, optional, tag = "1")]
    pub profile: Option<ProtoProfile>,
}

/// Payload for actions that name a single player (exit, leave, disband,
/// status refresh).
#[derive(Clone, PartialEq, Message)]
pub struct PlayerRef {
    #[prost(uint32, tag = "1")]
    pub player: u32,
}

#[derive(Clone, PartialEq, Message)]
pub struct Invite {
    #[prost(uint32, tag = "1")]
    pub inviter: u32,
    #[prost(uint32, tag = "2")]
    pub invitee: u32,
}

/// Payload for leader-issued actions aimed at another player.
#[derive(Clone, PartialEq, Message)]
pub struct LeaderTarget {
    #[prost(uint32, tag = "1")]
    pub leader: u32,
    #[prost(uint32, tag = "2")]
    pub target: u32,
}

#[derive(Clone, PartialEq, Message)]
pub struct Join {
    #[prost(uint32, tag = "1")]
    pub player: u32,
    #[prost(uint32, tag = "2")]
    pub leader: u32,
}

#[derive(Clone, PartialEq, Message)]
pub struct SetSharedExperience {
    #[prost(uint32, tag = "1")]
    pub player: u32,
    #[prost(bool, tag = "2")]
    pub active: bool,
}

#[derive(Clone, PartialEq, Message)]
pub struct ShareExperience {
    #[prost(uint32, tag = "1")]
    pub source: u32,
    #[prost(uint64, tag = "2")]
    pub amount: u64,
}

#[derive(Clone, PartialEq, Message)]
pub struct CombatAction {
    #[prost(uint32, tag = "1")]
    pub player: u32,
    #[prost(uint32, tag = "2")]
    pub points: u32,
}

#[derive(Clone, PartialEq, Message)]
pub struct PlayerMove {
    #[prost(uint32, tag = "1")]
    pub player: u32,
    #[prost(message, optional, tag = "2")]
    pub to: Option<ProtoPosition>,
}

/// Health or mana; the oneof tag tells which.
#[derive(Clone, PartialEq, Message)]
pub struct Vitals {
    #[prost(uint32, tag = "1")]
    pub player: u32,
    #[prost(sint32, tag = "2")]
    pub current: i32,
    #[prost(sint32, tag = "3")]
    pub maximum: i32,
}

#[derive(Clone, PartialEq, Message)]
pub struct SummonHealthChanged {
    #[prost(uint32, tag = "1")]
    pub player: u32,
    #[prost(uint32, tag = "2")]
    pub summon: u32,
    #[prost(sint32, tag = "3")]
    pub health: i32,
    #[prost(sint32, tag = "4")]
    pub max_health: i32,
}

#[derive(Clone, PartialEq, Message)]
pub struct VocationChanged {
    #[prost(uint32, tag = "1")]
    pub player: u32,
    #[prost(uint32, tag = "2")]
    pub vocation: u32,
}

#[derive(Clone, PartialEq, Message)]
pub struct LevelChanged {
    #[prost(uint32, tag = "1")]
    pub player: u32,
    #[prost(uint32, tag = "2")]
    pub level: u32,
}

#[derive(Clone, PartialEq, Message)]
pub struct SetInFight {
    #[prost(uint32, tag = "1")]
    pub player: u32,
    #[prost(bool, tag = "2")]
    pub in_fight: bool,
}

/// Party kernel — Core Domain Types
///
/// Pure data plus small accessors. Mutation lives in the controller
/// modules (membership, invitations, eligibility, visibility).

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::PartyError;
use crate::notify::Notification;

// ── Identities ─────────────────────────────────────────────────────

/// Unique id of a live player entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u32);

/// Opaque handle of a party in the registry. Stale once the party disbands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartyId(pub u32);

/// Id of a summoned companion owned by a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SummonId(pub u32);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "player#{}", self.0)
    }
}

impl fmt::Display for PartyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "party#{}", self.0)
    }
}

// ── Spatial ────────────────────────────────────────────────────────

/// Tile coordinates. `z` is the floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Position {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Position {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    pub fn distance_x(&self, other: &Position) -> u32 {
        self.x.abs_diff(other.x)
    }

    pub fn distance_y(&self, other: &Position) -> u32 {
        self.y.abs_diff(other.y)
    }

    pub fn distance_z(&self, other: &Position) -> u32 {
        self.z.abs_diff(other.z)
    }
}

// ── Players ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Female,
    Male,
}

impl Gender {
    /// Possessive pronoun used in invitation texts.
    pub fn possessive(self) -> &'static str {
        match self {
            Gender::Female => "her",
            Gender::Male => "his",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Summon {
    pub id: SummonId,
    pub health: i32,
    pub max_health: i32,
}

/// What the session layer knows about a player when it enters the world.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlayerProfile {
    pub id: PlayerId,
    pub name: String,
    pub level: u32,
    pub health: i32,
    pub max_health: i32,
    pub mana: i32,
    pub max_mana: i32,
    pub position: Position,
    pub gender: Gender,
    #[serde(default)]
    pub vocation: u16,
    #[serde(default)]
    pub exempt_from_activity: bool,
    #[serde(default)]
    pub summons: Vec<Summon>,
}

/// A live player as seen by the party kernel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub level: u32,
    pub experience: u64,
    pub health: i32,
    pub max_health: i32,
    pub mana: i32,
    pub max_mana: i32,
    pub position: Position,
    pub gender: Gender,
    pub vocation: u16,
    pub exempt_from_activity: bool,
    pub in_fight: bool,
    pub summons: Vec<Summon>,
    /// Back-reference to the party this player participates in.
    pub party: Option<PartyId>,
    /// Parties with a pending invitation for this player.
    pub invitations: BTreeSet<PartyId>,
}

impl From<PlayerProfile> for Player {
    fn from(p: PlayerProfile) -> Self {
        Self {
            id: p.id,
            name: p.name,
            level: p.level,
            experience: 0,
            health: p.health,
            max_health: p.max_health,
            mana: p.mana,
            max_mana: p.max_mana,
            position: p.position,
            gender: p.gender,
            vocation: p.vocation,
            exempt_from_activity: p.exempt_from_activity,
            in_fight: false,
            summons: p.summons,
            party: None,
            invitations: BTreeSet::new(),
        }
    }
}

// ── Party ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartyPhase {
    /// Leader only; invitations may be pending.
    Forming,
    /// At least one member besides the leader.
    Active,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Party {
    pub id: PartyId,
    pub leader: PlayerId,
    /// Join order; the front is next in line for leadership.
    pub members: Vec<PlayerId>,
    pub invitees: Vec<PlayerId>,
    pub shared_exp_active: bool,
    pub shared_exp_enabled: bool,
    /// Last combat action per participant, in logical milliseconds.
    pub last_action_ms: BTreeMap<PlayerId, u64>,
}

impl Party {
    pub fn new(id: PartyId, leader: PlayerId) -> Self {
        Self {
            id,
            leader,
            members: Vec::new(),
            invitees: Vec::new(),
            shared_exp_active: false,
            shared_exp_enabled: false,
            last_action_ms: BTreeMap::new(),
        }
    }

    pub fn phase(&self) -> PartyPhase {
        if self.members.is_empty() {
            PartyPhase::Forming
        } else {
            PartyPhase::Active
        }
    }

    /// Leader first, then members in succession order.
    pub fn participants(&self) -> Vec<PlayerId> {
        let mut out = Vec::with_capacity(self.members.len() + 1);
        out.push(self.leader);
        out.extend(self.members.iter().copied());
        out
    }

    pub fn is_participant(&self, player: PlayerId) -> bool {
        self.leader == player || self.is_member(player)
    }

    pub fn is_member(&self, player: PlayerId) -> bool {
        self.members.contains(&player)
    }

    pub fn is_invited(&self, player: PlayerId) -> bool {
        self.invitees.contains(&player)
    }

    /// No members and no pending invitations.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty() && self.invitees.is_empty()
    }
}

// ── Constants ──────────────────────────────────────────────────────

/// Client protocol capabilities, resolved once per transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProtocolCaps {
    /// Party-list shields and status/health/mana broadcasts.
    pub party_list: bool,
    /// Vocation updates in the party list.
    pub player_vocations: bool,
    /// Helper refresh signals for older clients.
    pub player_helpers: bool,
}

impl Default for ProtocolCaps {
    fn default() -> Self {
        Self {
            party_list: true,
            player_vocations: true,
            player_helpers: false,
        }
    }
}

/// Numeric configuration injected via the initialize_constants action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PartyConstants {
    /// Window after a combat action during which a player counts as active.
    pub pz_locked_ms: u64,
    /// Status visibility distance in tiles; 0 means unlimited.
    pub max_status_distance: u32,
    pub shared_exp_range_xy: u32,
    pub shared_exp_range_z: u32,
    pub protocol: ProtocolCaps,
}

impl Default for PartyConstants {
    fn default() -> Self {
        Self {
            pz_locked_ms: 60_000,
            max_status_distance: 0,
            shared_exp_range_xy: 30,
            shared_exp_range_z: 1,
            protocol: ProtocolCaps::default(),
        }
    }
}

// ── World ──────────────────────────────────────────────────────────

/// Everything the kernel mutates: the player registry and the party registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorldState {
    pub players: BTreeMap<PlayerId, Player>,
    pub parties: BTreeMap<PartyId, Party>,
    pub next_party_id: u32,
    pub constants: PartyConstants,
    /// Logical time of the last applied action.
    pub clock_ms: u64,
}

impl Default for WorldState {
    fn default() -> Self {
        Self {
            players: BTreeMap::new(),
            parties: BTreeMap::new(),
            next_party_id: 1,
            constants: PartyConstants::default(),
            clock_ms: 0,
        }
    }
}

impl WorldState {
    pub fn player(&self, id: PlayerId) -> Result<&Player, PartyError> {
        self.players.get(&id).ok_or(PartyError::UnknownPlayer(id))
    }

    pub fn player_mut(&mut self, id: PlayerId) -> Result<&mut Player, PartyError> {
        self.players.get_mut(&id).ok_or(PartyError::UnknownPlayer(id))
    }

    pub fn party(&self, id: PartyId) -> Result<&Party, PartyError> {
        self.parties.get(&id).ok_or(PartyError::UnknownParty(id))
    }

    pub fn party_mut(&mut self, id: PartyId) -> Result<&mut Party, PartyError> {
        self.parties.get_mut(&id).ok_or(PartyError::UnknownParty(id))
    }

    /// The party a player currently participates in, if any.
    pub fn party_of(&self, player: PlayerId) -> Option<PartyId> {
        self.players.get(&player).and_then(|p| p.party)
    }

    pub fn name_of(&self, player: PlayerId) -> &str {
        self.players
            .get(&player)
            .map(|p| p.name.as_str())
            .unwrap_or("")
    }

    /// Set or clear a player's back-reference. Unknown players are ignored
    /// (a player that already left the world has nothing to clear).
    pub(crate) fn set_party_ref(&mut self, player: PlayerId, party: Option<PartyId>) {
        if let Some(p) = self.players.get_mut(&player) {
            p.party = party;
        }
    }
}

// ── Transition outcome ─────────────────────────────────────────────

/// Structured outcome of one applied action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionResult {
    pub action: String,
    pub success: bool,
    pub reason: String,
    /// Party the action touched, when it still exists.
    pub party: Option<PartyId>,
    /// Parties removed from the registry by this action.
    pub disbanded: Vec<PartyId>,
    pub notifications: Vec<Notification>,
}

impl Default for TransitionResult {
    fn default() -> Self {
        Self {
            action: String::new(),
            success: true,
            reason: String::new(),
            party: None,
            disbanded: Vec::new(),
            notifications: Vec::new(),
        }
    }
}

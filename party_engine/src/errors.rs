//! Error types for the party kernel.
//!
//! `PartyError` is an ordinary rejection: the action is refused and the
//! world is left untouched. `EngineError` means the action stream itself is
//! malformed. `InvariantViolation` means the kernel produced an inconsistent
//! state and the transition was discarded.

use thiserror::Error;

use crate::domain::{PartyId, PlayerId, SummonId};

/// Policy hook that can veto an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookKind {
    Disband,
    Leave,
    Join,
}

impl HookKind {
    pub fn as_str(self) -> &'static str {
        match self {
            HookKind::Disband => "on_disband",
            HookKind::Leave => "on_leave",
            HookKind::Join => "on_join",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PartyError {
    #[error("unknown player {0}")]
    UnknownPlayer(PlayerId),

    #[error("unknown or disbanded party {0}")]
    UnknownParty(PartyId),

    #[error("{player} is not a participant of {party}")]
    NotParticipant { party: PartyId, player: PlayerId },

    #[error("{player} has no pending invitation from {party}")]
    NotInvited { party: PartyId, player: PlayerId },

    #[error("{player} is already invited to {party}")]
    AlreadyInvited { party: PartyId, player: PlayerId },

    #[error("{0} is already in a party")]
    AlreadyInParty(PlayerId),

    #[error("{0} is not in a party")]
    NotInParty(PlayerId),

    #[error("{player} is not the leader of {party}")]
    NotLeader { party: PartyId, player: PlayerId },

    #[error("{player} is already the leader of {party}")]
    AlreadyLeader { party: PartyId, player: PlayerId },

    #[error("{player} has no summon {summon:?}")]
    UnknownSummon { player: PlayerId, summon: SummonId },

    #[error("{0} cannot target itself")]
    SelfTarget(PlayerId),

    #[error("{0} is in a fight")]
    InFight(PlayerId),

    #[error("{0} is already in the world")]
    DuplicatePlayer(PlayerId),

    #[error("vetoed by {}", .0.as_str())]
    Vetoed(HookKind),
}

impl PartyError {
    /// Text shown to the acting player when the action is refused.
    pub fn user_message(&self) -> &'static str {
        match self {
            PartyError::UnknownPlayer(_) => "A player with this name is not online.",
            PartyError::AlreadyInParty(_) => "This player is already in a party.",
            PartyError::NotInParty(_) => "You are not in a party.",
            PartyError::NotLeader { .. } => "You are not the leader of the party.",
            PartyError::InFight(_) => "You cannot leave the party during a fight.",
            PartyError::NotInvited { .. } => "You have not been invited to this party.",
            PartyError::AlreadyInvited { .. } => "This player has already been invited.",
            _ => "Sorry, not possible.",
        }
    }
}

/// Structural inconsistency detected after a transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("[INVARIANT:back_reference] {player} points at {found:?}, expected {expected:?}")]
    BackReference {
        player: PlayerId,
        expected: Option<PartyId>,
        found: Option<PartyId>,
    },

    #[error("[INVARIANT:leader_is_member] leader {leader} of {party} is listed as a member")]
    LeaderIsMember { party: PartyId, leader: PlayerId },

    #[error("[INVARIANT:duplicate_member] {player} appears twice in {party}")]
    DuplicateMember { party: PartyId, player: PlayerId },

    #[error("[INVARIANT:invitee_overlap] {player} is both invited to and participating in {party}")]
    InviteeOverlap { party: PartyId, player: PlayerId },

    #[error("[INVARIANT:invitation_bookkeeping] {player} and {party} disagree about a pending invitation")]
    InvitationBookkeeping { party: PartyId, player: PlayerId },

    #[error("[INVARIANT:missing_player] {party} references {player}, who is not in the world")]
    MissingPlayer { party: PartyId, player: PlayerId },

    #[error("[INVARIANT:empty_party] {0} has no members and no pending invitations")]
    EmptyParty(PartyId),

    #[error("[INVARIANT:stale_activity] {party} tracks activity for non-participant {player}")]
    StaleActivity { party: PartyId, player: PlayerId },

    #[error("[INVARIANT:handle_order] {party} is not below next_party_id {next}")]
    HandleOrder { party: PartyId, next: u32 },

    #[error("[INVARIANT:shared_exp_flag] {0} has shared experience enabled while inactive")]
    SharedExpFlag(PartyId),
}

/// The action stream violated the kernel protocol.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("schema version mismatch: expected {expected}, got {got}")]
    SchemaVersion { expected: u32, got: u32 },

    #[error("sequence violation: expected {expected}, got {got}")]
    Sequence { expected: u64, got: u64 },

    #[error("first action must be initialize_constants, got {0}")]
    ConstantsFirst(String),

    #[error("initialize_constants can only be the first action")]
    ConstantsRepeated,

    #[error("logical time went backwards: {got} < {last}")]
    ClockRewind { last: u64, got: u64 },

    #[error("invariant violation: {0}")]
    Invariant(#[from] InvariantViolation),
}

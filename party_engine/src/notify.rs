//! Outbound party notifications.
//!
//! The kernel never talks to a client directly. Every signal a player
//! should receive is pushed into an `Outbox` and handed back with the
//! transition result; the session layer delivers them.
//!
//! Message shapes that depend on the client generation are selected by
//! the `ProtocolCaps` captured when the outbox is built.

use serde::{Deserialize, Serialize};

use crate::domain::{PlayerId, ProtocolCaps, SummonId, WorldState};
use crate::visibility::party_shield;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageClass {
    /// Regular informational text.
    InfoDescr,
    /// Refusal of a player's own request.
    Failure,
}

/// Party shield a viewer sees on a subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shield {
    None,
    /// Subject leads a party that invited the viewer.
    WhiteYellow,
    /// Viewer leads a party that invited the subject.
    WhiteBlue,
    Blue,
    Yellow,
    BlueSharedExp,
    YellowSharedExp,
    BlueNoSharedExpBlink,
    YellowNoSharedExpBlink,
    BlueNoSharedExp,
    YellowNoSharedExp,
    /// Subject is in a party the viewer has nothing to do with.
    Gray,
}

/// A creature shown in the party list: a player or one of its summons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum CreatureRef {
    Player(PlayerId),
    Summon(SummonId),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notification {
    TextMessage {
        to: PlayerId,
        class: MessageClass,
        text: String,
    },
    ClosePartyChannel {
        to: PlayerId,
    },
    /// Full icon refresh (shield and skull) of `subject`.
    PartyIcons {
        to: PlayerId,
        subject: PlayerId,
        shield: Shield,
    },
    CreatureShield {
        to: PlayerId,
        subject: PlayerId,
        shield: Shield,
    },
    PartyCreatureShield {
        to: PlayerId,
        subject: PlayerId,
        shield: Shield,
    },
    ShowStatus {
        to: PlayerId,
        subject: CreatureRef,
        show: bool,
    },
    HealthPercent {
        to: PlayerId,
        subject: CreatureRef,
        percent: u8,
    },
    ManaPercent {
        to: PlayerId,
        subject: PlayerId,
        percent: u8,
    },
    Vocation {
        to: PlayerId,
        subject: PlayerId,
        vocation: u16,
    },
    HelpersRefresh {
        to: PlayerId,
    },
    SharedExperience {
        to: PlayerId,
        amount: u64,
    },
}

impl Notification {
    pub fn recipient(&self) -> PlayerId {
        match self {
            Notification::TextMessage { to, .. }
            | Notification::ClosePartyChannel { to }
            | Notification::PartyIcons { to, .. }
            | Notification::CreatureShield { to, .. }
            | Notification::PartyCreatureShield { to, .. }
            | Notification::ShowStatus { to, .. }
            | Notification::HealthPercent { to, .. }
            | Notification::ManaPercent { to, .. }
            | Notification::Vocation { to, .. }
            | Notification::HelpersRefresh { to }
            | Notification::SharedExperience { to, .. } => *to,
        }
    }
}

/// Collects notifications for one transition.
#[derive(Debug, Clone)]
pub struct Outbox {
    caps: ProtocolCaps,
    items: Vec<Notification>,
}

impl Outbox {
    pub fn new(caps: ProtocolCaps) -> Self {
        Self {
            caps,
            items: Vec::new(),
        }
    }

    pub fn caps(&self) -> ProtocolCaps {
        self.caps
    }

    pub fn push(&mut self, n: Notification) {
        self.items.push(n);
    }

    pub fn text(&mut self, to: PlayerId, text: impl Into<String>) {
        self.push(Notification::TextMessage {
            to,
            class: MessageClass::InfoDescr,
            text: text.into(),
        });
    }

    pub fn failure(&mut self, to: PlayerId, text: impl Into<String>) {
        self.push(Notification::TextMessage {
            to,
            class: MessageClass::Failure,
            text: text.into(),
        });
    }

    pub fn close_channel(&mut self, to: PlayerId) {
        self.push(Notification::ClosePartyChannel { to });
    }

    /// Icon refresh of `subject` for `to`, evaluated against the current world.
    pub fn icons(&mut self, state: &WorldState, to: PlayerId, subject: PlayerId) {
        let shield = party_shield(state, to, subject);
        self.push(Notification::PartyIcons { to, subject, shield });
    }

    /// Plain creature shield, understood by every client generation.
    pub fn creature_shield(&mut self, state: &WorldState, to: PlayerId, subject: PlayerId) {
        let shield = party_shield(state, to, subject);
        self.push(Notification::CreatureShield { to, subject, shield });
    }

    /// Party-list shield when the client has a party list, plain shield otherwise.
    pub fn member_shield(&mut self, state: &WorldState, to: PlayerId, subject: PlayerId) {
        let shield = party_shield(state, to, subject);
        if self.caps.party_list {
            self.push(Notification::PartyCreatureShield { to, subject, shield });
        } else {
            self.push(Notification::CreatureShield { to, subject, shield });
        }
    }

    pub fn helpers(&mut self, to: PlayerId) {
        if self.caps.player_helpers {
            self.push(Notification::HelpersRefresh { to });
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[Notification] {
        &self.items
    }

    pub fn into_items(self) -> Vec<Notification> {
        self.items
    }
}

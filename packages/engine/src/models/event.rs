use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tokio::sync::mpsc;
use tracing::debug;

use super::role::{Faction, Role};
use super::state::PlayerId;
use crate::correlator::Token;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "player", rename_all = "snake_case")]
pub enum Recipient {
    All,
    Player(PlayerId),
}

impl Recipient {
    pub fn includes(&self, player: PlayerId) -> bool {
        match self {
            Recipient::All => true,
            Recipient::Player(p) => *p == player,
        }
    }
}

/// Everything the orchestrator tells the outside world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GameEvent {
    /// Starting role, sent privately once the deal is made.
    Dealt { role: Role },
    /// A wake slot has begun. Sent to everyone, even when nobody holds the role.
    RoleTurn { role: Role },
    Wake { role: Role },
    Sleep,
    Message { text: String },
    PromptCenters { token: Token, count: usize },
    PromptPlayers {
        token: Token,
        count: usize,
        banned: BTreeMap<PlayerId, String>,
    },
    PromptChoice { token: Token, options: Vec<String> },
    Timeout { token: Token },
    Board { board: BTreeMap<PlayerId, String> },
    DayStarted { board: BTreeMap<PlayerId, String> },
    TimeRemaining { seconds: u64 },
    PlayerReady { player: PlayerId },
    VoteStarted,
    VoteAcknowledged { player: PlayerId },
    FinalResult {
        votes: Vec<Option<PlayerId>>,
        roles: Vec<Role>,
        winners: BTreeSet<Faction>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outbound {
    pub to: Recipient,
    pub event: GameEvent,
}

/// Fan-out side of the orchestrator. A closed receiver is not an error:
/// the game keeps running and events are dropped.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::UnboundedSender<Outbound>,
}

impl EventSink {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Outbound>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (EventSink { tx }, rx)
    }

    pub fn send_to(&self, player: PlayerId, event: GameEvent) {
        self.emit(Recipient::Player(player), event);
    }

    pub fn broadcast(&self, event: GameEvent) {
        self.emit(Recipient::All, event);
    }

    fn emit(&self, to: Recipient, event: GameEvent) {
        if self.tx.send(Outbound { to, event }).is_err() {
            debug!("event receiver dropped, discarding event");
        }
    }
}

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::{mpsc, watch, Mutex};
use tracing::{debug, info};

use crate::clock::{Clock, TokioClock};
use crate::correlator::{ResponseCorrelator, Token};
use crate::error::GameError;
use crate::models::{
    EventSink, Faction, GameConfig, GameEvent, GameState, PlayerId, Role, RoleCatalog,
};
use crate::night::{wake_groups, NightContext};
use crate::win;

pub const MIN_PLAYERS: usize = 3;
pub const MAX_PLAYERS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Night,
    Day,
    Vote,
    Done,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameOutcome {
    pub votes: Vec<Option<PlayerId>>,
    /// Roles held at the end of the night, by player.
    pub roles: Vec<Role>,
    pub center: Vec<Role>,
    pub winners: BTreeSet<Faction>,
}

#[derive(Debug)]
enum Inbound {
    Ready(PlayerId),
    Vote { voter: PlayerId, target: PlayerId },
}

#[derive(Debug)]
struct Shared {
    correlators: Vec<ResponseCorrelator>,
    phase: watch::Sender<Phase>,
    inbound: mpsc::UnboundedSender<Inbound>,
    num_players: usize,
}

/// One game from deal to result. Drive it with [`Game::play`]; talk to it
/// from outside through a [`GameHandle`].
#[derive(Debug)]
pub struct Game {
    state: Arc<Mutex<GameState>>,
    catalog: Arc<RoleCatalog>,
    config: GameConfig,
    clock: Arc<dyn Clock>,
    events: EventSink,
    shared: Arc<Shared>,
    inbound: mpsc::UnboundedReceiver<Inbound>,
}

impl Game {
    /// Shuffle `roles` and deal them to `names` with the standard catalog.
    pub fn new(
        roles: Vec<Role>,
        names: Vec<String>,
        config: GameConfig,
        events: EventSink,
    ) -> Result<Self, GameError> {
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&names.len()) {
            return Err(GameError::PlayerCount {
                got: names.len(),
                min: MIN_PLAYERS,
                max: MAX_PLAYERS,
            });
        }
        let state = GameState::deal(roles, names, &mut rand::thread_rng())?;
        Ok(Self::from_state(
            state,
            Arc::new(RoleCatalog::standard()),
            config,
            Arc::new(TokioClock),
            events,
        ))
    }

    /// Start from an already dealt table. Each player is told their role.
    pub fn from_state(
        state: GameState,
        catalog: Arc<RoleCatalog>,
        config: GameConfig,
        clock: Arc<dyn Clock>,
        events: EventSink,
    ) -> Self {
        let num_players = state.num_players();
        for (id, player) in state.players().iter().enumerate() {
            events.send_to(
                id,
                GameEvent::Dealt {
                    role: player.starting_role,
                },
            );
        }

        let (phase, _) = watch::channel(Phase::Night);
        let (inbound_tx, inbound) = mpsc::unbounded_channel();
        let shared = Arc::new(Shared {
            correlators: (0..num_players)
                .map(|_| ResponseCorrelator::new(clock.clone()))
                .collect(),
            phase,
            inbound: inbound_tx,
            num_players,
        });

        Self {
            state: Arc::new(Mutex::new(state)),
            catalog,
            config,
            clock,
            events,
            shared,
            inbound,
        }
    }

    pub fn handle(&self) -> GameHandle {
        GameHandle {
            shared: self.shared.clone(),
        }
    }

    /// Run night, day and vote, then report the result.
    pub async fn play(mut self) -> GameOutcome {
        self.night().await;
        self.day().await;
        let votes = self.vote().await;
        self.finish(votes).await
    }

    fn enter(&self, phase: Phase) {
        info!(?phase, "entering phase");
        self.shared.phase.send_if_modified(|current| {
            let changed = *current != phase;
            *current = phase;
            changed
        });
    }

    async fn night(&self) {
        self.enter(Phase::Night);
        let groups = wake_groups(&self.catalog, &*self.state.lock().await);

        for group in groups {
            debug!(key = %group.key, members = ?group.members, "wake slot");
            for role in &group.roles {
                self.events.broadcast(GameEvent::RoleTurn { role: *role });
            }
            let deadline = self.clock.now() + self.config.role_time;

            let mut scripts = Vec::with_capacity(group.members.len());
            for &player in &group.members {
                let role = self.state.lock().await.starting_role(player);
                let Some(script) = self.catalog.script(role) else {
                    continue;
                };
                self.events.send_to(player, GameEvent::Wake { role });
                let ctx = NightContext::new(
                    player,
                    self.state.clone(),
                    self.shared.correlators[player].clone(),
                    self.events.clone(),
                    self.clock.clone(),
                    deadline,
                );
                scripts.push(script(ctx));
            }
            join_all(scripts).await;

            // The slot lasts the full role time even when nobody is awake.
            self.clock.sleep_until(deadline).await;
            for &player in &group.members {
                self.events.send_to(player, GameEvent::Sleep);
            }
        }

        let board = self.state.lock().await.board_annotations();
        self.events.broadcast(GameEvent::Board { board });
    }

    async fn day(&mut self) {
        self.enter(Phase::Day);
        let board = self.state.lock().await.board_annotations();
        self.events.broadcast(GameEvent::DayStarted { board });

        let num_players = self.shared.num_players;
        let deadline = self.clock.now() + self.config.talk_time;
        let mut ready = BTreeSet::new();

        loop {
            let remaining = deadline.saturating_duration_since(self.clock.now());
            if remaining.is_zero() {
                info!("discussion time is up");
                return;
            }
            self.events.broadcast(GameEvent::TimeRemaining {
                seconds: remaining.as_secs(),
            });
            let step = if self.config.tick_interval.is_zero() {
                remaining
            } else {
                self.config.tick_interval.min(remaining)
            };
            let tick = self.clock.now() + step;

            loop {
                tokio::select! {
                    msg = self.inbound.recv() => match msg {
                        Some(Inbound::Ready(player)) => {
                            if ready.insert(player) {
                                self.events.broadcast(GameEvent::PlayerReady { player });
                            }
                            if ready.len() == num_players {
                                info!("every player is ready");
                                return;
                            }
                        }
                        Some(Inbound::Vote { .. }) => {}
                        None => {
                            self.clock.sleep_until(tick).await;
                            break;
                        }
                    },
                    _ = self.clock.sleep_until(tick) => break,
                }
            }
        }
    }

    async fn vote(&mut self) -> Vec<Option<PlayerId>> {
        self.enter(Phase::Vote);
        self.events.broadcast(GameEvent::VoteStarted);

        let mut votes = vec![None; self.shared.num_players];
        let mut cast = 0;
        let deadline = self.config.vote_timeout.map(|t| self.clock.now() + t);

        while cast < votes.len() {
            let msg = match deadline {
                Some(deadline) => tokio::select! {
                    msg = self.inbound.recv() => msg,
                    _ = self.clock.sleep_until(deadline) => {
                        info!(missing = votes.len() - cast, "vote timed out, the rest abstain");
                        break;
                    }
                },
                None => self.inbound.recv().await,
            };
            match msg {
                Some(Inbound::Vote { voter, target }) if votes[voter].is_none() => {
                    votes[voter] = Some(target);
                    cast += 1;
                    self.events
                        .broadcast(GameEvent::VoteAcknowledged { player: voter });
                }
                Some(_) => {}
                None => break,
            }
        }
        votes
    }

    async fn finish(self, votes: Vec<Option<PlayerId>>) -> GameOutcome {
        let (roles, center) = {
            let state = self.state.lock().await;
            (state.current_roles(), state.center().to_vec())
        };
        let winners = win::compute(&roles, &votes);
        info!(?winners, "game over");
        self.events.broadcast(GameEvent::FinalResult {
            votes: votes.clone(),
            roles: roles.clone(),
            winners: winners.clone(),
        });
        self.enter(Phase::Done);
        GameOutcome {
            votes,
            roles,
            center,
            winners,
        }
    }
}

/// Inbound side of a running game. Cheap to clone; every method is safe to
/// call from any task at any time. Input that does not fit the current
/// phase is dropped.
#[derive(Debug, Clone)]
pub struct GameHandle {
    shared: Arc<Shared>,
}

impl GameHandle {
    pub fn phase(&self) -> Phase {
        *self.shared.phase.borrow()
    }

    pub fn subscribe_phase(&self) -> watch::Receiver<Phase> {
        self.shared.phase.subscribe()
    }

    pub fn num_players(&self) -> usize {
        self.shared.num_players
    }

    /// Answer a night prompt. Returns whether the answer was taken.
    pub async fn submit_selection(
        &self,
        token: Token,
        indices: Vec<usize>,
    ) -> Result<bool, GameError> {
        match self.phase() {
            Phase::Done => return Err(GameError::Finished),
            Phase::Night => {}
            phase => {
                debug!(?phase, %token, "selection outside the night");
                return Ok(false);
            }
        }
        for correlator in &self.shared.correlators {
            if correlator.submit(token, indices.clone()).await {
                return Ok(true);
            }
        }
        Ok(false)
    }

    pub fn submit_readiness(&self, player: PlayerId) -> Result<(), GameError> {
        self.check_player(player)?;
        match self.phase() {
            Phase::Done => Err(GameError::Finished),
            Phase::Day => self.send(Inbound::Ready(player)),
            phase => {
                debug!(?phase, player, "readiness outside the day");
                Ok(())
            }
        }
    }

    pub fn submit_vote(&self, voter: PlayerId, target: PlayerId) -> Result<(), GameError> {
        self.check_player(voter)?;
        self.check_player(target)?;
        match self.phase() {
            Phase::Done => Err(GameError::Finished),
            Phase::Vote => self.send(Inbound::Vote { voter, target }),
            phase => {
                debug!(?phase, voter, "vote outside the vote");
                Ok(())
            }
        }
    }

    fn check_player(&self, player: PlayerId) -> Result<(), GameError> {
        if player < self.shared.num_players {
            Ok(())
        } else {
            Err(GameError::UnknownPlayer(player))
        }
    }

    fn send(&self, msg: Inbound) -> Result<(), GameError> {
        self.shared
            .inbound
            .send(msg)
            .map_err(|_| GameError::Finished)
    }
}

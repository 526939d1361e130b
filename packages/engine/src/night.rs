use futures::future::BoxFuture;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::clock::Clock;
use crate::correlator::{Answer, Cardinality, ResponseCorrelator, Token};
use crate::models::{EventSink, GameEvent, GameState, PlayerId, Role, RoleCatalog, WakeKey};

/// A role's night action. Looked up in the [`RoleCatalog`] by starting role.
pub type ScriptFn = fn(NightContext) -> BoxFuture<'static, ()>;

pub const PROTECTED_REASON: &str = "This player's role is being protected by the sentinel";
pub const SELF_REASON: &str = "You may not select yourself";
pub const ALREADY_VIEWED_REASON: &str = "You have already looked at this player";

/// Everything a script may touch while its player is awake.
///
/// Every ask spends the player's own budget, which runs out at `deadline`.
/// Once it has, asks return the empty answer straight away so the script
/// still runs to completion.
#[derive(Debug, Clone)]
pub struct NightContext {
    player: PlayerId,
    state: Arc<Mutex<GameState>>,
    correlator: ResponseCorrelator,
    events: EventSink,
    clock: Arc<dyn Clock>,
    deadline: Instant,
}

impl NightContext {
    pub fn new(
        player: PlayerId,
        state: Arc<Mutex<GameState>>,
        correlator: ResponseCorrelator,
        events: EventSink,
        clock: Arc<dyn Clock>,
        deadline: Instant,
    ) -> Self {
        Self {
            player,
            state,
            correlator,
            events,
            clock,
            deadline,
        }
    }

    pub fn player(&self) -> PlayerId {
        self.player
    }

    /// Lock the shared state. Never hold the guard across an ask.
    pub async fn state(&self) -> MutexGuard<'_, GameState> {
        self.state.lock().await
    }

    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(self.clock.now())
    }

    pub fn tell(&self, text: impl Into<String>) {
        self.events.send_to(
            self.player,
            GameEvent::Message { text: text.into() },
        );
    }

    pub async fn ask_players(&self, count: usize, allow_self: bool) -> Vec<PlayerId> {
        self.ask_players_except(count, allow_self, &[]).await
    }

    /// Like [`ask_players`](Self::ask_players), with `except` banned as
    /// already viewed.
    pub async fn ask_players_except(
        &self,
        count: usize,
        allow_self: bool,
        except: &[PlayerId],
    ) -> Vec<PlayerId> {
        let (num_players, banned) = {
            let state = self.state.lock().await;
            let mut banned = BTreeMap::new();
            for id in 0..state.num_players() {
                if state.is_protected(id) {
                    banned.insert(id, PROTECTED_REASON.to_string());
                } else if !allow_self && id == self.player {
                    banned.insert(id, SELF_REASON.to_string());
                } else if except.contains(&id) {
                    banned.insert(id, ALREADY_VIEWED_REASON.to_string());
                }
            }
            (state.num_players(), banned)
        };
        let valid: BTreeSet<usize> = (0..num_players)
            .filter(|id| !banned.contains_key(id))
            .collect();

        self.ask(Cardinality::Exactly(count), valid, move |token| {
            GameEvent::PromptPlayers {
                token,
                count,
                banned,
            }
        })
        .await
    }

    pub async fn ask_center(&self, count: usize) -> Vec<usize> {
        let size = self.state.lock().await.center().len();
        self.ask(Cardinality::Exactly(count), (0..size).collect(), |token| {
            GameEvent::PromptCenters { token, count }
        })
        .await
    }

    /// Pick one of `options`. `None` if the player ran out of time.
    pub async fn ask_choice(&self, options: &[&str]) -> Option<usize> {
        let options: Vec<String> = options.iter().map(|o| o.to_string()).collect();
        let valid = (0..options.len()).collect();
        self.ask(Cardinality::OneChoice, valid, |token| GameEvent::PromptChoice {
            token,
            options,
        })
        .await
        .first()
        .copied()
    }

    async fn ask<F>(&self, cardinality: Cardinality, valid: BTreeSet<usize>, prompt: F) -> Vec<usize>
    where
        F: FnOnce(Token) -> GameEvent,
    {
        let budget = self.remaining();
        if budget.is_zero() {
            debug!(player = self.player, "out of time, skipping ask");
            return Vec::new();
        }
        if valid.len() < cardinality.count() {
            debug!(player = self.player, "not enough eligible answers, skipping ask");
            return Vec::new();
        }

        let request = match self.correlator.request(cardinality, valid, budget).await {
            Ok(request) => request,
            Err(err) => {
                warn!(player = self.player, %err, "ask refused");
                return Vec::new();
            }
        };
        let token = request.token();
        self.events.send_to(self.player, prompt(token));

        match request.answer().await {
            Answer::Selected(indices) => indices,
            Answer::TimedOut => {
                self.events.send_to(self.player, GameEvent::Timeout { token });
                Vec::new()
            }
        }
    }
}

/// Players whose starting roles share one wake key. Acts as a unit: every
/// member's script runs concurrently and the slot lasts one role time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WakeGroup {
    pub key: WakeKey,
    /// Every role in the deal with this key, whether dealt or in the center.
    pub roles: BTreeSet<Role>,
    pub members: Vec<PlayerId>,
}

/// Wake slots for every waking role in the deal, in night order. Roles
/// left in the center still get a slot, with no members.
pub fn wake_groups(catalog: &RoleCatalog, state: &GameState) -> Vec<WakeGroup> {
    let mut groups: BTreeMap<WakeKey, WakeGroup> = BTreeMap::new();
    let dealt = state.players().iter().map(|p| p.starting_role);
    for role in state.center().iter().copied().chain(dealt) {
        if let Some(key) = catalog.wake_key(role) {
            groups
                .entry(key.clone())
                .or_insert_with(|| WakeGroup {
                    key: key.clone(),
                    roles: BTreeSet::new(),
                    members: Vec::new(),
                })
                .roles
                .insert(role);
        }
    }
    for (id, player) in state.players().iter().enumerate() {
        if let Some(group) = catalog
            .wake_key(player.starting_role)
            .and_then(|key| groups.get_mut(key))
        {
            group.members.push(id);
        }
    }
    groups.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::TokioClock;
    use crate::models::{Modifier, Outbound, Recipient};
    use tokio::sync::mpsc::UnboundedReceiver;

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("P{}", i)).collect()
    }

    fn context(
        roles: Vec<Role>,
        player: PlayerId,
        budget: Duration,
    ) -> (NightContext, UnboundedReceiver<Outbound>) {
        let n = roles.len() - 3;
        let state = GameState::new(roles, names(n)).unwrap();
        let clock: Arc<dyn Clock> = Arc::new(TokioClock);
        let (events, rx) = EventSink::channel();
        let ctx = NightContext::new(
            player,
            Arc::new(Mutex::new(state)),
            ResponseCorrelator::new(clock.clone()),
            events,
            clock.clone(),
            clock.now() + budget,
        );
        (ctx, rx)
    }

    #[test]
    fn groups_follow_wake_order_and_include_center_roles() {
        use Role::*;
        let state = GameState::new(
            vec![Robber, Villager, Werewolf, Seer, Insomniac, Werewolf, Villager],
            names(4),
        )
        .unwrap();
        let groups = wake_groups(&RoleCatalog::standard(), &state);
        let keys: Vec<Vec<u8>> = groups.iter().map(|g| g.key.parts().to_vec()).collect();
        assert_eq!(keys, vec![vec![2, 0], vec![5, 1], vec![6, 1], vec![9]]);
        assert_eq!(groups[0].members, vec![2]);
        assert_eq!(groups[1].members, vec![0]);
        assert!(groups[2].members.is_empty());
        assert_eq!(groups[3].members, vec![1]);
    }

    #[tokio::test(start_paused = true)]
    async fn banned_map_marks_protected_and_self() {
        use Role::*;
        let (ctx, mut rx) = context(
            vec![Villager, Villager, Villager, Robber, Seer, Mason, Mason],
            0,
            Duration::from_secs(10),
        );
        ctx.state().await.add_modifier(2, Modifier::Protected);

        let asker = ctx.clone();
        let task = tokio::spawn(async move { asker.ask_players_except(1, false, &[3]).await });

        let outbound = rx.recv().await.unwrap();
        assert_eq!(outbound.to, Recipient::Player(0));
        let token = match outbound.event {
            GameEvent::PromptPlayers { token, count, banned } => {
                assert_eq!(count, 1);
                assert_eq!(banned[&0], SELF_REASON);
                assert_eq!(banned[&2], PROTECTED_REASON);
                assert_eq!(banned[&3], ALREADY_VIEWED_REASON);
                assert!(!banned.contains_key(&1));
                token
            }
            other => panic!("unexpected event {:?}", other),
        };
        assert!(!ctx.correlator.submit(token, vec![2]).await);
        assert!(ctx.correlator.submit(token, vec![1]).await);
        assert_eq!(task.await.unwrap(), vec![1]);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_sends_notice_and_returns_empty() {
        use Role::*;
        let (ctx, mut rx) = context(
            vec![Villager, Villager, Villager, Seer, Mason, Mason],
            0,
            Duration::from_secs(3),
        );
        assert_eq!(ctx.ask_choice(&["a", "b"]).await, None);
        let prompt = rx.recv().await.unwrap().event;
        let token = match prompt {
            GameEvent::PromptChoice { token, options } => {
                assert_eq!(options, vec!["a".to_string(), "b".to_string()]);
                token
            }
            other => panic!("unexpected event {:?}", other),
        };
        assert_eq!(rx.recv().await.unwrap().event, GameEvent::Timeout { token });
        assert_eq!(ctx.remaining(), Duration::ZERO);

        // Budget spent: the next ask does not prompt at all.
        assert!(ctx.ask_center(1).await.is_empty());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn too_few_targets_skips_the_prompt() {
        use Role::*;
        let (ctx, mut rx) = context(
            vec![Villager, Villager, Villager, Troublemaker, Mason, Mason],
            0,
            Duration::from_secs(10),
        );
        ctx.state().await.add_modifier(1, Modifier::Protected);
        assert!(ctx.ask_players(2, false).await.is_empty());
        assert!(rx.try_recv().is_err());
    }
}

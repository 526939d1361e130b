use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use onuw_engine::{
    EventSink, Faction, Game, GameConfig, GameEvent, GameHandle, GameOutcome, GameState,
    Outbound, PlayerId, Recipient, Role, RoleCatalog, TokioClock,
};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use Role::*;

fn config() -> GameConfig {
    GameConfig {
        role_time: Duration::from_secs(10),
        talk_time: Duration::from_secs(300),
        tick_interval: Duration::from_secs(15),
        vote_timeout: Some(Duration::from_secs(20)),
    }
}

struct Table {
    rx: UnboundedReceiver<Outbound>,
    handle: GameHandle,
    runner: JoinHandle<GameOutcome>,
    start: Instant,
}

/// Deal without shuffling: three center roles first, then one per player.
fn start(roles: Vec<Role>, config: GameConfig) -> Table {
    let names = (0..roles.len() - 3).map(|i| format!("P{}", i)).collect();
    let state = GameState::new(roles, names).unwrap();
    let (events, rx) = EventSink::channel();
    let game = Game::from_state(
        state,
        Arc::new(RoleCatalog::standard()),
        config,
        Arc::new(TokioClock),
        events,
    );
    let handle = game.handle();
    let start = Instant::now();
    let runner = tokio::spawn(game.play());
    Table {
        rx,
        handle,
        runner,
        start,
    }
}

#[derive(Default)]
struct Script {
    /// Answers to night prompts, per player, in order.
    answers: HashMap<PlayerId, VecDeque<Vec<usize>>>,
    ready: bool,
    votes: Vec<(PlayerId, PlayerId)>,
}

/// Play the game out, answering as `script` says. Returns every event with
/// the whole seconds elapsed when it arrived.
async fn drive(mut table: Table, mut script: Script) -> (Vec<(u64, Outbound)>, GameOutcome) {
    let mut log = Vec::new();
    while let Some(out) = table.rx.recv().await {
        let at = table.start.elapsed().as_secs();
        let token = match &out.event {
            GameEvent::PromptCenters { token, .. }
            | GameEvent::PromptPlayers { token, .. }
            | GameEvent::PromptChoice { token, .. } => Some(*token),
            _ => None,
        };
        if let (Some(token), Recipient::Player(player)) = (token, out.to) {
            if let Some(answer) = script
                .answers
                .get_mut(&player)
                .and_then(|queue| queue.pop_front())
            {
                assert!(table.handle.submit_selection(token, answer).await.unwrap());
            }
        }
        match &out.event {
            GameEvent::DayStarted { .. } if script.ready => {
                for player in 0..table.handle.num_players() {
                    table.handle.submit_readiness(player).unwrap();
                }
            }
            GameEvent::VoteStarted => {
                for (voter, target) in script.votes.drain(..) {
                    table.handle.submit_vote(voter, target).unwrap();
                }
            }
            _ => {}
        }
        let done = matches!(out.event, GameEvent::FinalResult { .. });
        log.push((at, out));
        if done {
            break;
        }
    }
    let outcome = table.runner.await.unwrap();
    (log, outcome)
}

fn when<F>(log: &[(u64, Outbound)], pred: F) -> Vec<(u64, Recipient)>
where
    F: Fn(&GameEvent) -> bool,
{
    log.iter()
        .filter(|(_, out)| pred(&out.event))
        .map(|(at, out)| (*at, out.to))
        .collect()
}

#[tokio::test(start_paused = true)]
async fn night_wakes_only_the_holder_and_waits_out_empty_slots() {
    let table = start(
        vec![Robber, Villager, Villager, Insomniac, Villager, Tanner],
        config(),
    );
    let script = Script {
        ready: true,
        ..Script::default()
    };
    let (log, _) = drive(table, script).await;

    let turns: Vec<(u64, Role)> = log
        .iter()
        .filter_map(|(at, out)| match out.event {
            GameEvent::RoleTurn { role } => Some((*at, role)),
            _ => None,
        })
        .collect();
    assert_eq!(turns, vec![(0, Robber), (10, Insomniac)]);

    assert_eq!(
        when(&log, |e| matches!(e, GameEvent::Wake { .. })),
        vec![(10, Recipient::Player(0))]
    );
    assert_eq!(
        when(&log, |e| matches!(e, GameEvent::Sleep)),
        vec![(20, Recipient::Player(0))]
    );
    assert_eq!(
        when(&log, |e| matches!(e, GameEvent::DayStarted { .. })),
        vec![(20, Recipient::All)]
    );
    assert!(log.iter().any(|(_, out)| out.to == Recipient::Player(0)
        && out.event
            == GameEvent::Message {
                text: "Your current role is Insomniac".to_string()
            }));
}

#[tokio::test(start_paused = true)]
async fn wake_groups_run_in_key_order_and_share_a_slot() {
    let table = start(
        vec![
            Villager, Villager, Villager, Troublemaker, Robber, Seer, Werewolf, Werewolf,
        ],
        config(),
    );
    let script = Script {
        ready: true,
        ..Script::default()
    };
    let (log, _) = drive(table, script).await;

    let turns: Vec<(u64, Role)> = log
        .iter()
        .filter_map(|(at, out)| match out.event {
            GameEvent::RoleTurn { role } => Some((*at, role)),
            _ => None,
        })
        .collect();
    assert_eq!(
        turns,
        vec![(0, Werewolf), (10, Seer), (20, Robber), (30, Troublemaker)]
    );

    let wolves_woken = when(&log, |e| *e == GameEvent::Wake { role: Werewolf });
    assert_eq!(
        wolves_woken,
        vec![(0, Recipient::Player(3)), (0, Recipient::Player(4))]
    );
    let sleeps = when(&log, |e| matches!(e, GameEvent::Sleep));
    assert_eq!(&sleeps[..2], &[(10, Recipient::Player(3)), (10, Recipient::Player(4))]);

    // Nobody answered: each waking villager role timed out once.
    assert_eq!(when(&log, |e| matches!(e, GameEvent::Timeout { .. })).len(), 3);
}

#[tokio::test(start_paused = true)]
async fn day_ends_as_soon_as_everyone_is_ready() {
    let mut table = start(vec![Villager; 6], config());
    let handle = table.handle.clone();

    let day_started = loop {
        let out = table.rx.recv().await.unwrap();
        if matches!(out.event, GameEvent::DayStarted { .. }) {
            break table.start.elapsed();
        }
    };
    handle.submit_readiness(0).unwrap();
    handle.submit_readiness(0).unwrap();
    handle.submit_readiness(2).unwrap();
    handle.submit_readiness(1).unwrap();

    let mut ready = Vec::new();
    loop {
        let out = table.rx.recv().await.unwrap();
        match out.event {
            GameEvent::TimeRemaining { seconds } => assert_eq!(seconds, 300),
            GameEvent::PlayerReady { player } => ready.push(player),
            GameEvent::VoteStarted => {
                assert_eq!(table.start.elapsed(), day_started);
                break;
            }
            other => panic!("unexpected event {:?}", other),
        }
    }
    assert_eq!(ready, vec![0, 2, 1]);
    table.runner.abort();
}

#[tokio::test(start_paused = true)]
async fn discussion_time_counts_down_then_voting_starts() {
    let table = start(
        vec![Villager; 6],
        GameConfig {
            talk_time: Duration::from_secs(40),
            ..config()
        },
    );
    let (log, _) = drive(table, Script::default()).await;

    let ticks: Vec<(u64, u64)> = log
        .iter()
        .filter_map(|(at, out)| match out.event {
            GameEvent::TimeRemaining { seconds } => Some((*at, seconds)),
            _ => None,
        })
        .collect();
    assert_eq!(ticks, vec![(0, 40), (15, 25), (30, 10)]);
    assert_eq!(
        when(&log, |e| matches!(e, GameEvent::VoteStarted)),
        vec![(40, Recipient::All)]
    );
}

#[tokio::test(start_paused = true)]
async fn missing_votes_abstain_after_the_timeout() {
    let table = start(vec![Villager; 6], config());
    let script = Script {
        ready: true,
        votes: vec![(0, 1), (0, 2)],
        ..Script::default()
    };
    let (log, outcome) = drive(table, script).await;

    assert_eq!(
        when(&log, |e| matches!(e, GameEvent::VoteAcknowledged { .. })).len(),
        1
    );
    let (at, result) = log.last().unwrap();
    assert_eq!(*at, 20);
    assert_eq!(outcome.votes, vec![Some(1), None, None]);
    assert_eq!(
        result.event,
        GameEvent::FinalResult {
            votes: vec![Some(1), None, None],
            roles: vec![Villager; 3],
            winners: [Faction::Villager].into_iter().collect(),
        }
    );
}

#[tokio::test(start_paused = true)]
async fn robber_steals_the_werewolf_and_is_voted_out() {
    let table = start(
        vec![Villager, Tanner, Hunter, Robber, Werewolf, Seer],
        config(),
    );
    let mut answers = HashMap::new();
    // Seer looks at P1; Robber takes P1's role.
    answers.insert(2, VecDeque::from(vec![vec![1], vec![1]]));
    answers.insert(0, VecDeque::from(vec![vec![1]]));
    let script = Script {
        answers,
        ready: true,
        votes: vec![(0, 1), (1, 0), (2, 0)],
    };
    let (log, outcome) = drive(table, script).await;

    let seer_saw = GameEvent::Message {
        text: "The role that P1 has is Werewolf".to_string(),
    };
    assert!(log.iter().any(|(_, out)| out.event == seer_saw));
    let robber_saw = GameEvent::Message {
        text: "Your new role is Werewolf".to_string(),
    };
    assert!(log
        .iter()
        .any(|(_, out)| out.to == Recipient::Player(0) && out.event == robber_saw));

    assert_eq!(outcome.roles, vec![Werewolf, Robber, Seer]);
    assert_eq!(outcome.center, vec![Villager, Tanner, Hunter]);
    let expected: BTreeSet<Faction> = [Faction::Villager].into_iter().collect();
    assert_eq!(outcome.winners, expected);
}

#[tokio::test(start_paused = true)]
async fn sentinel_protection_shows_on_the_board() {
    let table = start(
        vec![Villager, Villager, Villager, Sentinel, Robber, Revealer],
        config(),
    );
    let mut answers = HashMap::new();
    answers.insert(0, VecDeque::from(vec![vec![1]]));
    answers.insert(2, VecDeque::from(vec![vec![0]]));
    let script = Script {
        answers,
        ready: true,
        ..Script::default()
    };
    let (log, _) = drive(table, script).await;

    // The robber was guarded so could not act.
    let guarded = GameEvent::Message {
        text: "Your role has been guarded by the sentinel. You will not be swapping roles tonight."
            .to_string(),
    };
    assert!(log.iter().any(|(_, out)| out.event == guarded));

    let board = log
        .iter()
        .find_map(|(_, out)| match &out.event {
            GameEvent::DayStarted { board } => Some(board.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(board[&1], "This player's role was guarded by the sentinel");
    assert_eq!(board[&0], "This player has been revealed to be a Sentinel");
    assert!(!board.contains_key(&2));
}

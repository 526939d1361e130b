use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, Mutex};
use tokio::time::Instant;
use tracing::debug;
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::GameError;

/// Opaque handle tying a player's answer to the prompt it answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Token(Uuid);

impl Token {
    pub fn new() -> Self {
        Token(Uuid::new_v4())
    }
}

impl Default for Token {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// Exactly this many indices.
    Exactly(usize),
    /// A single option out of a list.
    OneChoice,
}

impl Cardinality {
    pub fn count(self) -> usize {
        match self {
            Cardinality::Exactly(n) => n,
            Cardinality::OneChoice => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Selected(Vec<usize>),
    TimedOut,
}

impl Answer {
    /// The selection, or nothing if the player ran out of time.
    pub fn into_indices(self) -> Vec<usize> {
        match self {
            Answer::Selected(indices) => indices,
            Answer::TimedOut => Vec::new(),
        }
    }
}

#[derive(Debug)]
struct Pending {
    token: Token,
    valid: BTreeSet<usize>,
    cardinality: Cardinality,
    tx: oneshot::Sender<Vec<usize>>,
}

impl Pending {
    fn accepts(&self, indices: &[usize]) -> bool {
        indices.len() == self.cardinality.count() && indices.iter().all(|i| self.valid.contains(i))
    }
}

/// Holds at most one outstanding prompt for one player. Whichever of the
/// answer or the deadline takes the pending slot first resolves the
/// request; the other path then finds nothing to do.
#[derive(Debug, Clone)]
pub struct ResponseCorrelator {
    slot: Arc<Mutex<Option<Pending>>>,
    clock: Arc<dyn Clock>,
}

impl ResponseCorrelator {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            slot: Arc::new(Mutex::new(None)),
            clock,
        }
    }

    /// Arm a new request. Fails if one is already outstanding.
    pub async fn request(
        &self,
        cardinality: Cardinality,
        valid: BTreeSet<usize>,
        timeout: Duration,
    ) -> Result<Request, GameError> {
        let mut slot = self.slot.lock().await;
        if slot.is_some() {
            return Err(GameError::RequestPending);
        }
        let token = Token::new();
        let (tx, rx) = oneshot::channel();
        *slot = Some(Pending {
            token,
            valid,
            cardinality,
            tx,
        });
        Ok(Request {
            token,
            rx,
            deadline: self.clock.now() + timeout,
            slot: self.slot.clone(),
            clock: self.clock.clone(),
        })
    }

    /// Offer an answer. Stale tokens and malformed selections are dropped
    /// without complaint; returns whether the answer resolved the request.
    pub async fn submit(&self, token: Token, indices: Vec<usize>) -> bool {
        let mut slot = self.slot.lock().await;
        match slot.as_ref() {
            Some(pending) if pending.token == token => {
                if !pending.accepts(&indices) {
                    debug!(%token, ?indices, "dropping malformed selection");
                    return false;
                }
            }
            _ => {
                debug!(%token, "dropping selection for a request that is not pending");
                return false;
            }
        }
        match slot.take() {
            Some(pending) => pending.tx.send(indices).is_ok(),
            None => false,
        }
    }

    pub async fn pending_token(&self) -> Option<Token> {
        self.slot.lock().await.as_ref().map(|p| p.token)
    }
}

/// An armed request. Await [`Request::answer`] to get the outcome.
#[derive(Debug)]
pub struct Request {
    token: Token,
    rx: oneshot::Receiver<Vec<usize>>,
    deadline: Instant,
    slot: Arc<Mutex<Option<Pending>>>,
    clock: Arc<dyn Clock>,
}

impl Request {
    pub fn token(&self) -> Token {
        self.token
    }

    pub async fn answer(self) -> Answer {
        let Request {
            token,
            mut rx,
            deadline,
            slot,
            clock,
        } = self;

        tokio::select! {
            biased;
            answer = &mut rx => match answer {
                Ok(indices) => Answer::Selected(indices),
                Err(_) => Answer::TimedOut,
            },
            _ = clock.sleep_until(deadline) => {
                let mut guard = slot.lock().await;
                if guard.as_ref().map(|p| p.token) == Some(token) {
                    *guard = None;
                    return Answer::TimedOut;
                }
                drop(guard);
                // An answer took the slot just before the deadline.
                match rx.await {
                    Ok(indices) => Answer::Selected(indices),
                    Err(_) => Answer::TimedOut,
                }
            }
        }
    }
}

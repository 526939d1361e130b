use thiserror::Error;

use crate::models::PlayerId;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GameError {
    #[error("expected {players} players + 3 center roles, got {roles} roles")]
    RoleCountMismatch { roles: usize, players: usize },
    #[error("a game needs between {min} and {max} players, got {got}")]
    PlayerCount { got: usize, min: usize, max: usize },
    #[error("player {0} is not in this game")]
    UnknownPlayer(PlayerId),
    #[error("the game has already finished")]
    Finished,
    #[error("a request is already pending for this player")]
    RequestPending,
}

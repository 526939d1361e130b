//! Game core for One Night Ultimate Werewolf: the deal, the night's wake
//! order and role scripts, the day and vote phases, and who wins.
//!
//! Nothing here knows about sockets. A [`Game`] emits [`Outbound`] events
//! through an [`EventSink`] and takes answers, readiness and votes through a
//! [`GameHandle`].

pub mod clock;
pub mod correlator;
pub mod error;
pub mod game;
pub mod models;
pub mod night;
pub mod scripts;
pub mod utils;
pub mod win;

pub use clock::{Clock, TokioClock};
pub use correlator::{Answer, Cardinality, ResponseCorrelator, Token};
pub use error::GameError;
pub use game::{Game, GameHandle, GameOutcome, Phase, MAX_PLAYERS, MIN_PLAYERS};
pub use models::*;
pub use night::{wake_groups, NightContext, ScriptFn, WakeGroup};

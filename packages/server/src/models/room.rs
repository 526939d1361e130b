use onuw_engine::{PlayerId, Role, RoleCatalog, CENTER_SIZE, MAX_PLAYERS, MIN_PLAYERS};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

pub const ROOM_ID_LEN: usize = 5;
pub const ROOM_ID_ATTEMPTS: usize = 50;
const ROOM_ID_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RoomError {
    #[error("This game code does not exist")]
    NotFound,
    #[error("This game is full")]
    Full,
    #[error("Someone else already has that name")]
    DuplicateName,
    #[error("This game is no longer accepting more players")]
    Closed,
    #[error("Unable to assign a room ID. Please try again later.")]
    NoFreeId,
    #[error("The game is not being set up")]
    NotInSetup,
    #[error("You are not in a room")]
    NotInRoom,
    #[error("You are already in a room")]
    AlreadyInRoom,
    #[error("Only the host can set up the game")]
    NotHost,
    #[error("The game has not started")]
    NoGame,
    #[error("At most {max} {role} allowed")]
    TooManyCopies { role: Role, max: usize },
    #[error("{role} needs exactly 0 or {count} copies")]
    IncompleteSet { role: Role, count: usize },
    #[error("{players} players need {needed} roles, {roles} chosen")]
    RoleCount {
        roles: usize,
        players: usize,
        needed: usize,
    },
    #[error("A game needs between {min} and {max} players, got {got}")]
    PlayerCount { got: usize, min: usize, max: usize },
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub enum RoomStatus {
    /// Accepting players.
    Open,
    /// Roster locked; roles and timings being chosen.
    Setup,
    InProgress,
}

/// Everything a game needs to start.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct GameSetup {
    pub roles: Vec<Role>,
    pub names: Vec<String>,
    pub role_seconds: u64,
    pub talk_seconds: u64,
}

/// Pre-game lobby. Players join while it is open; once setup starts the
/// roster is fixed and the role pool is assembled.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Room {
    pub room_id: String,
    /// Player names in seat order. Seat 0 created the room.
    pub players: Vec<String>,
    pub roles: BTreeMap<Role, usize>,
    pub role_seconds: u64,
    pub talk_seconds: u64,
    pub status: RoomStatus,
}

impl Room {
    pub fn new(room_id: String, host: String, role_seconds: u64, talk_seconds: u64) -> Self {
        Room {
            room_id,
            players: vec![host],
            roles: BTreeMap::new(),
            role_seconds,
            talk_seconds,
            status: RoomStatus::Open,
        }
    }

    pub fn add_player(&mut self, name: String) -> Result<PlayerId, RoomError> {
        if self.status != RoomStatus::Open {
            return Err(RoomError::Closed);
        }
        if self.players.len() >= MAX_PLAYERS {
            return Err(RoomError::Full);
        }
        if self.players.iter().any(|p| *p == name) {
            return Err(RoomError::DuplicateName);
        }
        self.players.push(name);
        Ok(self.players.len() - 1)
    }

    pub fn start_setup(&mut self) -> Result<(), RoomError> {
        match self.status {
            RoomStatus::Open | RoomStatus::Setup => {
                self.status = RoomStatus::Setup;
                Ok(())
            }
            _ => Err(RoomError::NotInSetup),
        }
    }

    pub fn add_role(&mut self, catalog: &RoleCatalog, role: Role) -> Result<(), RoomError> {
        self.ensure_setup()?;
        let max = catalog.copy_limit(role).max();
        let count = self.roles.entry(role).or_insert(0);
        if *count >= max {
            return Err(RoomError::TooManyCopies { role, max });
        }
        *count += 1;
        Ok(())
    }

    /// Take one copy of `role` out of the pool. Absent roles are ignored.
    pub fn remove_role(&mut self, role: Role) -> Result<(), RoomError> {
        self.ensure_setup()?;
        if let Some(count) = self.roles.get_mut(&role) {
            *count -= 1;
            if *count == 0 {
                self.roles.remove(&role);
            }
        }
        Ok(())
    }

    pub fn set_times(&mut self, role_seconds: Option<u64>, talk_seconds: Option<u64>) {
        if let Some(seconds) = role_seconds {
            self.role_seconds = seconds;
        }
        if let Some(seconds) = talk_seconds {
            self.talk_seconds = seconds;
        }
    }

    pub fn num_roles(&self) -> usize {
        self.roles.values().sum()
    }

    pub fn role_list(&self) -> Vec<Role> {
        self.roles
            .iter()
            .flat_map(|(role, count)| std::iter::repeat(*role).take(*count))
            .collect()
    }

    /// Check the pool against the roster and lock the room.
    pub fn finalize(&mut self, catalog: &RoleCatalog) -> Result<GameSetup, RoomError> {
        self.ensure_setup()?;
        let players = self.players.len();
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&players) {
            return Err(RoomError::PlayerCount {
                got: players,
                min: MIN_PLAYERS,
                max: MAX_PLAYERS,
            });
        }
        let needed = players + CENTER_SIZE;
        if self.num_roles() != needed {
            return Err(RoomError::RoleCount {
                roles: self.num_roles(),
                players,
                needed,
            });
        }
        for (&role, &count) in &self.roles {
            let limit = catalog.copy_limit(role);
            if !limit.allows(count) {
                return Err(RoomError::IncompleteSet {
                    role,
                    count: limit.max(),
                });
            }
        }

        self.status = RoomStatus::InProgress;
        Ok(GameSetup {
            roles: self.role_list(),
            names: self.players.clone(),
            role_seconds: self.role_seconds,
            talk_seconds: self.talk_seconds,
        })
    }

    fn ensure_setup(&self) -> Result<(), RoomError> {
        if self.status == RoomStatus::Setup {
            Ok(())
        } else {
            Err(RoomError::NotInSetup)
        }
    }
}

pub fn generate_room_id<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..ROOM_ID_LEN)
        .map(|_| ROOM_ID_ALPHABET[rng.gen_range(0..ROOM_ID_ALPHABET.len())] as char)
        .collect()
}

/// Catalog entry as shown to a host choosing roles.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RoleInfo {
    pub role: Role,
    pub name: String,
    pub description: String,
    pub instructions: String,
    pub wake_key: Option<Vec<u8>>,
    pub max_copies: usize,
}

impl RoleInfo {
    pub fn list(catalog: &RoleCatalog) -> Vec<RoleInfo> {
        catalog
            .roles()
            .map(|role| RoleInfo {
                role,
                name: role.name().to_string(),
                description: role.description().to_string(),
                instructions: role.instructions().to_string(),
                wake_key: catalog.wake_key(role).map(|k| k.parts().to_vec()),
                max_copies: catalog.copy_limit(role).max(),
            })
            .collect()
    }
}

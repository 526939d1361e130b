use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::role::{Modifier, Role};
use crate::error::GameError;

/// Number of roles left face down in the middle of the table.
pub const CENTER_SIZE: usize = 3;

pub type PlayerId = usize;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Player {
    pub name: String,
    /// Role dealt at the start. Decides which script runs; never changes.
    pub starting_role: Role,
    /// Role physically held right now.
    pub current_role: Role,
    pub modifiers: BTreeSet<Modifier>,
}

impl Player {
    pub fn new(name: String, role: Role) -> Self {
        Self {
            name,
            starting_role: role,
            current_role: role,
            modifiers: BTreeSet::new(),
        }
    }

    pub fn is_protected(&self) -> bool {
        self.modifiers.contains(&Modifier::Protected)
    }
}

/// Who holds what. Swaps only ever exchange roles, so the multiset of
/// center and current player roles always equals the deal.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GameState {
    center: Vec<Role>,
    players: Vec<Player>,
}

impl GameState {
    /// Deal without shuffling: the first `CENTER_SIZE` roles go to the
    /// center, the rest to the players in order.
    pub fn new(roles: Vec<Role>, names: Vec<String>) -> Result<Self, GameError> {
        if roles.len() != names.len() + CENTER_SIZE {
            return Err(GameError::RoleCountMismatch {
                roles: roles.len(),
                players: names.len(),
            });
        }
        let mut roles = roles;
        let player_roles = roles.split_off(CENTER_SIZE);
        let players = names
            .into_iter()
            .zip(player_roles)
            .map(|(name, role)| Player::new(name, role))
            .collect();
        Ok(GameState {
            center: roles,
            players,
        })
    }

    /// Shuffle the roles and deal them.
    pub fn deal<R: Rng + ?Sized>(
        roles: Vec<Role>,
        names: Vec<String>,
        rng: &mut R,
    ) -> Result<Self, GameError> {
        let mut roles = roles;
        roles.shuffle(rng);
        Self::new(roles, names)
    }

    /// Exchange the current roles of two players. Callers keep `a != b`.
    pub fn swap(&mut self, a: PlayerId, b: PlayerId) {
        let role_a = self.players[a].current_role;
        self.players[a].current_role = self.players[b].current_role;
        self.players[b].current_role = role_a;
    }

    /// Exchange a player's current role with one center slot.
    pub fn swap_center(&mut self, player: PlayerId, center: usize) {
        std::mem::swap(
            &mut self.players[player].current_role,
            &mut self.center[center],
        );
    }

    pub fn current_role(&self, player: PlayerId) -> Role {
        self.players[player].current_role
    }

    pub fn starting_role(&self, player: PlayerId) -> Role {
        self.players[player].starting_role
    }

    pub fn center_role(&self, index: usize) -> Role {
        self.center[index]
    }

    pub fn name(&self, player: PlayerId) -> &str {
        &self.players[player].name
    }

    pub fn player(&self, player: PlayerId) -> &Player {
        &self.players[player]
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn center(&self) -> &[Role] {
        &self.center
    }

    pub fn num_players(&self) -> usize {
        self.players.len()
    }

    pub fn add_modifier(&mut self, player: PlayerId, modifier: Modifier) {
        self.players[player].modifiers.insert(modifier);
    }

    pub fn is_protected(&self, player: PlayerId) -> bool {
        self.players[player].is_protected()
    }

    pub fn names(&self) -> Vec<String> {
        self.players.iter().map(|p| p.name.clone()).collect()
    }

    pub fn current_roles(&self) -> Vec<Role> {
        self.players.iter().map(|p| p.current_role).collect()
    }

    /// Names of every player whose current role is `role`.
    pub fn holders_of(&self, role: Role) -> Vec<String> {
        self.players
            .iter()
            .filter(|p| p.current_role == role)
            .map(|p| p.name.clone())
            .collect()
    }

    /// Public notes shown next to each player when day breaks.
    pub fn board_annotations(&self) -> BTreeMap<PlayerId, String> {
        let mut board = BTreeMap::new();
        for (id, player) in self.players.iter().enumerate() {
            if player.modifiers.contains(&Modifier::Protected) {
                board.insert(
                    id,
                    "This player's role was guarded by the sentinel".to_string(),
                );
            } else if player.modifiers.contains(&Modifier::Revealed) {
                board.insert(
                    id,
                    format!(
                        "This player has been revealed to be a {}",
                        player.current_role
                    ),
                );
            }
        }
        board
    }
}

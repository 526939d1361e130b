use serde::{Deserialize, Serialize};
use std::fmt;

/// Team a role wins (or loses) with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Faction {
    Villager,
    Werewolf,
    Tanner,
}

impl fmt::Display for Faction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Faction::Villager => write!(f, "Villagers"),
            Faction::Werewolf => write!(f, "Werewolves"),
            Faction::Tanner => write!(f, "Tanner"),
        }
    }
}

/// Runtime marker attached to a player by a night action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Modifier {
    /// Guarded by the sentinel: the role may not be viewed, moved or swapped.
    Protected,
    /// Flipped face up by the revealer.
    Revealed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    // Werewolf team
    Werewolf,
    MysticWolf,
    DreamWolf,
    Minion,
    // Villager team
    Sentinel,
    Mason,
    Seer,
    ApprenticeSeer,
    ParanormalInvestigator,
    Robber,
    Witch,
    Troublemaker,
    VillageIdiot,
    Drunk,
    Insomniac,
    Revealer,
    Hunter,
    Villager,
    // On its own
    Tanner,
}

impl Role {
    pub const ALL: [Role; 19] = [
        Role::Werewolf,
        Role::MysticWolf,
        Role::DreamWolf,
        Role::Minion,
        Role::Sentinel,
        Role::Mason,
        Role::Seer,
        Role::ApprenticeSeer,
        Role::ParanormalInvestigator,
        Role::Robber,
        Role::Witch,
        Role::Troublemaker,
        Role::VillageIdiot,
        Role::Drunk,
        Role::Insomniac,
        Role::Revealer,
        Role::Hunter,
        Role::Villager,
        Role::Tanner,
    ];

    /// The faction this role wins with. A minion wins with the werewolves.
    pub fn win_faction(self) -> Faction {
        match self {
            Role::Werewolf | Role::MysticWolf | Role::DreamWolf | Role::Minion => {
                Faction::Werewolf
            }
            Role::Tanner => Faction::Tanner,
            _ => Faction::Villager,
        }
    }

    /// The faction that loses if this role's holder is killed.
    /// A minion counts as a villager here.
    pub fn kill_faction(self) -> Faction {
        match self {
            Role::Minion => Faction::Villager,
            other => other.win_faction(),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Role::Werewolf => "Werewolf",
            Role::MysticWolf => "Mystic Wolf",
            Role::DreamWolf => "Dream Wolf",
            Role::Minion => "Minion",
            Role::Sentinel => "Sentinel",
            Role::Mason => "Mason",
            Role::Seer => "Seer",
            Role::ApprenticeSeer => "Apprentice Seer",
            Role::ParanormalInvestigator => "Paranormal Investigator",
            Role::Robber => "Robber",
            Role::Witch => "Witch",
            Role::Troublemaker => "Troublemaker",
            Role::VillageIdiot => "Village Idiot",
            Role::Drunk => "Drunk",
            Role::Insomniac => "Insomniac",
            Role::Revealer => "Revealer",
            Role::Hunter => "Hunter",
            Role::Villager => "Villager",
            Role::Tanner => "Tanner",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Role::Werewolf => "The bad guy",
            Role::MysticWolf => "The transcendent bad guy",
            Role::DreamWolf => "The sleepy bad guy",
            Role::Minion => "A huge werewolf fan",
            Role::Sentinel => "Protector",
            Role::Mason => "Twins",
            Role::Seer => "Transcendent, or just a cheater",
            Role::ApprenticeSeer => "Transcendent, but only kinda",
            Role::ParanormalInvestigator => "Something about curiosity and cats",
            Role::Robber => "Stealer of roles",
            Role::Witch => "Does some magic",
            Role::Troublemaker => "Screws with people",
            Role::VillageIdiot => "Big dumb",
            Role::Drunk => "Has no idea what is going on",
            Role::Insomniac => "Can't fall asleep",
            Role::Revealer => "Never learned to keep their hands to themselves",
            Role::Hunter => "Brings others down with them",
            Role::Villager => "Just a villager",
            Role::Tanner => "Hates their job",
        }
    }

    pub fn instructions(self) -> &'static str {
        match self {
            Role::Werewolf => {
                "You will see who else started as a werewolf. Work together to fool the villagers."
            }
            Role::MysticWolf => {
                "You will see the other werewolves. You may also look at another player's role."
            }
            Role::DreamWolf => {
                "You did not wake up in time for the werewolf roll call. The other werewolves know you, but you do not know them."
            }
            Role::Minion => {
                "You will see the werewolves. Protect them, even if it costs you your life."
            }
            Role::Sentinel => {
                "You may choose one other player to guard. That player's role may not be viewed, moved or swapped for the rest of the night."
            }
            Role::Mason => {
                "There are exactly two masons. If you do not see the other mason, they started in the center."
            }
            Role::Seer => {
                "You may view either two roles from the center or one other player's role."
            }
            Role::ApprenticeSeer => "You may view one role from the center.",
            Role::ParanormalInvestigator => {
                "You may look at up to two other players' roles. If you see a werewolf or tanner, you stop and join their side."
            }
            Role::Robber => {
                "You may steal another player's role, giving them yours, and view your new role."
            }
            Role::Witch => {
                "You may view one role from the center. If you do, you must swap it with any player's role."
            }
            Role::Troublemaker => "You may exchange the roles of two other players.",
            Role::VillageIdiot => {
                "You may rotate the roles of all other players one seat left or right."
            }
            Role::Drunk => {
                "You must exchange your role with one from the center without looking at it."
            }
            Role::Insomniac => "You wake at the end of the night and see your own role.",
            Role::Revealer => {
                "You may flip another player's role. If it is on the villager team, everyone sees it."
            }
            Role::Hunter => {
                "If you die, the player you voted for dies too. You do not wake up during the night."
            }
            Role::Villager => "You have no night action.",
            Role::Tanner => {
                "You win if and only if you are killed. You do not wake up during the night."
            }
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

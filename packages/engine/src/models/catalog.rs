use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::role::Role;
use crate::night::ScriptFn;
use crate::scripts;

/// Lexicographic night ordering. A key sorts before any longer key it is a
/// prefix of, so `[2]` wakes before `[2, 0]`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WakeKey(Vec<u8>);

impl WakeKey {
    pub fn new(parts: impl Into<Vec<u8>>) -> Self {
        WakeKey(parts.into())
    }

    pub fn parts(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for WakeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(u8::to_string).collect();
        write!(f, "[{}]", parts.join(", "))
    }
}

/// How many copies of a role a deal may contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "number", rename_all = "snake_case")]
pub enum CopyLimit {
    UpTo(usize),
    /// Either none or exactly this many.
    All(usize),
}

impl CopyLimit {
    pub fn max(self) -> usize {
        match self {
            CopyLimit::UpTo(n) | CopyLimit::All(n) => n,
        }
    }

    pub fn allows(self, count: usize) -> bool {
        match self {
            CopyLimit::UpTo(n) => count <= n,
            CopyLimit::All(n) => count == 0 || count == n,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NightAction {
    pub key: WakeKey,
    pub script: ScriptFn,
}

#[derive(Debug, Clone)]
struct CatalogEntry {
    night: Option<NightAction>,
    limit: CopyLimit,
}

/// Immutable lookup from role to its night behaviour. Built once and handed
/// to every game; nothing here changes while a game is running.
#[derive(Debug, Clone)]
pub struct RoleCatalog {
    entries: BTreeMap<Role, CatalogEntry>,
}

impl RoleCatalog {
    pub fn standard() -> Self {
        let mut entries = BTreeMap::new();
        for role in Role::ALL {
            let night = standard_night_action(role);
            entries.insert(
                role,
                CatalogEntry {
                    night,
                    limit: standard_limit(role),
                },
            );
        }
        RoleCatalog { entries }
    }

    /// Replace (or add) the night action for a role.
    pub fn with_night_action(mut self, role: Role, key: WakeKey, script: ScriptFn) -> Self {
        if let Some(entry) = self.entries.get_mut(&role) {
            entry.night = Some(NightAction { key, script });
        }
        self
    }

    /// Make a role passive at night.
    pub fn without_night_action(mut self, role: Role) -> Self {
        if let Some(entry) = self.entries.get_mut(&role) {
            entry.night = None;
        }
        self
    }

    pub fn night_action(&self, role: Role) -> Option<&NightAction> {
        self.entries.get(&role).and_then(|e| e.night.as_ref())
    }

    pub fn wake_key(&self, role: Role) -> Option<&WakeKey> {
        self.night_action(role).map(|n| &n.key)
    }

    pub fn script(&self, role: Role) -> Option<ScriptFn> {
        self.night_action(role).map(|n| n.script)
    }

    pub fn wakes(&self, role: Role) -> bool {
        self.night_action(role).is_some()
    }

    pub fn copy_limit(&self, role: Role) -> CopyLimit {
        self.entries
            .get(&role)
            .map(|e| e.limit)
            .unwrap_or(CopyLimit::UpTo(1))
    }

    /// Largest deal this catalog can produce.
    pub fn max_roles(&self) -> usize {
        self.entries.values().map(|e| e.limit.max()).sum()
    }

    pub fn roles(&self) -> impl Iterator<Item = Role> + '_ {
        self.entries.keys().copied()
    }
}

impl Default for RoleCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

fn standard_limit(role: Role) -> CopyLimit {
    match role {
        Role::Werewolf => CopyLimit::UpTo(2),
        Role::Mason => CopyLimit::All(2),
        Role::Villager => CopyLimit::UpTo(3),
        _ => CopyLimit::UpTo(1),
    }
}

fn standard_night_action(role: Role) -> Option<NightAction> {
    let (key, script): (&[u8], ScriptFn) = match role {
        Role::Sentinel => (&[0], scripts::sentinel),
        Role::Werewolf => (&[2, 0], scripts::werewolf),
        Role::MysticWolf => (&[2, 1], scripts::mystic_wolf),
        Role::Minion => (&[3], scripts::minion),
        Role::Mason => (&[4], scripts::mason),
        Role::Seer => (&[5, 1], scripts::seer),
        Role::ApprenticeSeer => (&[5, 2], scripts::apprentice_seer),
        Role::ParanormalInvestigator => (&[5, 3], scripts::paranormal_investigator),
        Role::Robber => (&[6, 1], scripts::robber),
        Role::Witch => (&[6, 2], scripts::witch),
        Role::Troublemaker => (&[7], scripts::troublemaker),
        Role::VillageIdiot => (&[7, 1], scripts::village_idiot),
        Role::Drunk => (&[8], scripts::drunk),
        Role::Insomniac => (&[9], scripts::insomniac),
        Role::Revealer => (&[10], scripts::revealer),
        Role::DreamWolf | Role::Hunter | Role::Villager | Role::Tanner => return None,
    };
    Some(NightAction {
        key: WakeKey::new(key),
        script,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_key_sorts_first() {
        assert!(WakeKey::new([2]) < WakeKey::new([2, 0]));
        assert!(WakeKey::new([2, 1]) < WakeKey::new([3]));
        assert!(WakeKey::new([7]) < WakeKey::new([7, 1]));
        assert!(WakeKey::new([9]) < WakeKey::new([10]));
    }

    #[test]
    fn standard_night_order() {
        let catalog = RoleCatalog::standard();
        let mut waking: Vec<Role> = catalog.roles().filter(|r| catalog.wakes(*r)).collect();
        waking.sort_by(|a, b| catalog.wake_key(*a).cmp(&catalog.wake_key(*b)));
        assert_eq!(waking.first(), Some(&Role::Sentinel));
        assert_eq!(waking.last(), Some(&Role::Revealer));
        let robber = waking.iter().position(|r| *r == Role::Robber);
        let troublemaker = waking.iter().position(|r| *r == Role::Troublemaker);
        assert!(robber < troublemaker);
    }

    #[test]
    fn passive_roles_have_no_script() {
        let catalog = RoleCatalog::standard();
        for role in [Role::DreamWolf, Role::Hunter, Role::Villager, Role::Tanner] {
            assert!(!catalog.wakes(role));
            assert!(catalog.script(role).is_none());
        }
    }

    #[test]
    fn mason_limit_is_all_or_nothing() {
        let limit = RoleCatalog::standard().copy_limit(Role::Mason);
        assert!(limit.allows(0));
        assert!(!limit.allows(1));
        assert!(limit.allows(2));
        assert_eq!(RoleCatalog::standard().max_roles(), 23);
    }
}

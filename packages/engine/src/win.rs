use std::collections::BTreeSet;

use crate::models::{Faction, PlayerId, Role};

/// Decide who won.
///
/// `roles[i]` is the role player `i` holds at the end of the night and
/// `votes[i]` is the player they voted to kill (`None` for an abstention).
/// A player dies when they share the highest vote count and that count is
/// above one. A dying hunter takes their own vote target along.
pub fn compute(roles: &[Role], votes: &[Option<PlayerId>]) -> BTreeSet<Faction> {
    let killed = killed_players(roles, votes);
    let killed_roles: Vec<Role> = killed.iter().map(|&p| roles[p]).collect();

    let has_active_werewolf = roles
        .iter()
        .any(|r| r.kill_faction() == Faction::Werewolf);
    let werewolf_killed = killed_roles
        .iter()
        .any(|r| r.kill_faction() == Faction::Werewolf);

    if roles.contains(&Role::Tanner) {
        if killed.is_empty() {
            return if has_active_werewolf {
                winners([Faction::Werewolf])
            } else {
                winners([Faction::Villager])
            };
        }
        if killed_roles
            .iter()
            .any(|r| r.win_faction() == Faction::Tanner)
        {
            // Werewolves never win alongside a dead tanner.
            return if werewolf_killed {
                winners([Faction::Tanner, Faction::Villager])
            } else {
                winners([Faction::Tanner])
            };
        }
    }

    if werewolf_killed {
        return winners([Faction::Villager]);
    }
    if killed.is_empty() && !has_active_werewolf {
        return winners([Faction::Villager]);
    }
    if has_active_werewolf {
        return winners([Faction::Werewolf]);
    }

    // No werewolves at all, yet somebody died.
    if !roles.contains(&Role::Minion) {
        return BTreeSet::new();
    }
    match killed_roles.as_slice() {
        [Role::Minion] => winners([Faction::Villager]),
        killed if killed.iter().all(|r| *r != Role::Minion) => winners([Faction::Werewolf]),
        _ => BTreeSet::new(),
    }
}

/// Everyone with the maximum vote count (when above one), closed under
/// hunter retaliation.
pub fn killed_players(roles: &[Role], votes: &[Option<PlayerId>]) -> BTreeSet<PlayerId> {
    let mut tally = vec![0usize; roles.len()];
    for target in votes.iter().flatten() {
        tally[*target] += 1;
    }
    let max_votes = tally.iter().copied().max().unwrap_or(0);

    let mut killed: BTreeSet<PlayerId> = if max_votes > 1 {
        (0..roles.len()).filter(|&p| tally[p] == max_votes).collect()
    } else {
        BTreeSet::new()
    };

    let mut frontier: Vec<PlayerId> = killed.iter().copied().collect();
    while let Some(dead) = frontier.pop() {
        if roles[dead] != Role::Hunter {
            continue;
        }
        if let Some(Some(target)) = votes.get(dead) {
            if killed.insert(*target) {
                frontier.push(*target);
            }
        }
    }
    killed
}

fn winners<const N: usize>(factions: [Faction; N]) -> BTreeSet<Faction> {
    factions.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use Faction::{Tanner as T, Villager as V, Werewolf as W};

    fn check(roles: &[Role], votes: &[usize], expected: &[Faction]) {
        let votes: Vec<Option<PlayerId>> = votes.iter().copied().map(Some).collect();
        let result = compute(roles, &votes);
        let expected: BTreeSet<Faction> = expected.iter().copied().collect();
        assert_eq!(result, expected, "roles {:?} votes {:?}", roles, votes);
    }

    #[test]
    fn basic_games() {
        use Role::*;
        check(&[Werewolf, Mason, Mason], &[0, 0, 1], &[V]);
        check(&[Werewolf, Mason, Mason], &[1, 1, 0], &[W]);
        check(&[Werewolf, Tanner, Mason], &[1, 1, 0], &[T]);
        check(&[Minion, Mason, Mason], &[1, 0, 1], &[W]);
    }

    #[test]
    fn nobody_dies() {
        use Role::*;
        check(&[Mason, Mason, Insomniac], &[1, 2, 0], &[V]);
        check(&[DreamWolf, Mason, Insomniac], &[1, 2, 0], &[W]);
    }

    #[test]
    fn multiple_deaths() {
        use Role::*;
        let deal = [Werewolf, MysticWolf, Mason, Mason, Insomniac];
        check(&deal, &[2, 2, 1, 1, 0], &[V]);
        check(&deal, &[2, 2, 3, 3, 0], &[W]);
    }

    #[test]
    fn tanner_games() {
        use Role::*;
        let deal = [Werewolf, MysticWolf, Mason, Mason, Tanner];
        check(&deal, &[4, 4, 3, 3, 0], &[T]);
        check(&deal, &[4, 4, 0, 3, 0], &[T, V]);

        let no_wolves = [Insomniac, ApprenticeSeer, Mason, Mason, Tanner];
        check(&no_wolves, &[4, 4, 0, 0, 3], &[T]);
        check(&no_wolves, &[4, 4, 0, 4, 0], &[T]);
    }

    #[test]
    fn no_werewolves_and_a_villager_dies() {
        use Role::*;
        check(&[Insomniac, ApprenticeSeer, Mason, Mason], &[3, 3, 0, 3], &[]);
    }

    #[test]
    fn minion_games() {
        use Role::*;
        check(&[Werewolf, Minion, Mason], &[1, 1, 0], &[W]);
        check(&[Werewolf, Minion, Mason, Mason], &[1, 2, 0, 0], &[V]);
        check(&[Werewolf, Minion, Mason, Mason], &[1, 1, 0, 0], &[V]);
        check(&[Minion, Mason, Mason], &[1, 0, 0], &[V]);
        check(&[Minion, Mason, Mason, Insomniac], &[1, 0, 0, 1], &[]);
    }

    #[test]
    fn minion_with_tanner() {
        use Role::*;
        let deal = [Minion, Mason, Mason, Insomniac, Tanner];
        check(&deal, &[1, 0, 0, 1, 2], &[]);
        check(&deal, &[1, 0, 2, 1, 2], &[W]);
        check(&deal, &[1, 0, 0, 1, 0], &[V]);
        check(&deal, &[4, 0, 4, 4, 1], &[T]);
        check(
            &[Minion, Mason, Mason, Insomniac, Tanner, Witch],
            &[4, 0, 4, 4, 0, 0],
            &[T],
        );
    }

    #[test]
    fn hunter_takes_their_target() {
        use Role::*;
        check(&[Werewolf, Mason, Mason, Hunter], &[3, 3, 3, 0], &[V]);
        check(&[Werewolf, Mason, Mason, Hunter], &[3, 3, 3, 1], &[W]);
    }

    #[test]
    fn abstentions_count_for_nobody() {
        use Role::*;
        let roles = [Werewolf, Mason, Mason];
        assert_eq!(compute(&roles, &[None, None, None]), winners([W]));
        assert_eq!(compute(&roles, &[Some(0), None, Some(0)]), winners([V]));
    }

    #[test]
    fn killed_set_includes_every_tied_leader() {
        use Role::*;
        let roles = [Villager, Villager, Villager, Villager];
        let votes = [Some(1), Some(0), Some(0), Some(1)];
        let killed = killed_players(&roles, &votes);
        assert_eq!(killed.into_iter().collect::<Vec<_>>(), vec![0, 1]);
    }

    #[test]
    fn deterministic() {
        use Role::*;
        let roles = [Werewolf, Tanner, Mason, Minion];
        let votes = [Some(1), Some(1), Some(0), Some(0)];
        assert_eq!(compute(&roles, &votes), compute(&roles, &votes));
    }
}

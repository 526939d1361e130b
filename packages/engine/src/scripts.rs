//! Night actions, one per waking role.
//!
//! Scripts never hold the state lock across an ask, and every one of them
//! copes with an empty answer by skipping whatever it would have done.

use futures::future::BoxFuture;
use futures::FutureExt;
use rand::seq::IteratorRandom;
use rand::Rng;

use crate::models::{Faction, GameState, Modifier, Role, CENTER_SIZE};
use crate::night::NightContext;
use crate::utils::make_list;

fn werewolf_names(state: &GameState) -> Vec<String> {
    state
        .players()
        .iter()
        .filter(|p| p.current_role.kill_faction() == Faction::Werewolf)
        .map(|p| p.name.clone())
        .collect()
}

/// Tell the actor who the werewolves are. Returns how many there are.
async fn tell_werewolves(ctx: &NightContext) -> usize {
    let (wolves, dreamers) = {
        let state = ctx.state().await;
        (werewolf_names(&state), state.holders_of(Role::DreamWolf))
    };
    ctx.tell(format!("The werewolves are: {}", make_list(&wolves)));
    for name in dreamers {
        ctx.tell(format!("However, {} is a dream wolf", name));
    }
    wolves.len()
}

fn random_center_slot() -> usize {
    rand::thread_rng().gen_range(0..CENTER_SIZE)
}

async fn is_protected(ctx: &NightContext) -> bool {
    ctx.state().await.is_protected(ctx.player())
}

pub fn sentinel(ctx: NightContext) -> BoxFuture<'static, ()> {
    async move {
        ctx.tell("You may pick one other player to protect");
        if let [target] = ctx.ask_players(1, false).await[..] {
            ctx.state().await.add_modifier(target, Modifier::Protected);
        }
    }
    .boxed()
}

/// A werewolf who wakes alone may look at one center card.
async fn lone_wolf_view(ctx: &NightContext) {
    ctx.tell("Since you are the only werewolf, you may view a role from the center");
    if let [slot] = ctx.ask_center(1).await[..] {
        let role = ctx.state().await.center_role(slot);
        ctx.tell(format!("The center role you picked was {}", role));
    }
}

pub fn werewolf(ctx: NightContext) -> BoxFuture<'static, ()> {
    async move {
        if tell_werewolves(&ctx).await == 1 {
            lone_wolf_view(&ctx).await;
        }
    }
    .boxed()
}

pub fn mystic_wolf(ctx: NightContext) -> BoxFuture<'static, ()> {
    async move {
        if tell_werewolves(&ctx).await == 1 {
            lone_wolf_view(&ctx).await;
        }
        ctx.tell("You may view one other player's role");
        if let [target] = ctx.ask_players(1, false).await[..] {
            let (name, role) = {
                let state = ctx.state().await;
                (state.name(target).to_string(), state.current_role(target))
            };
            ctx.tell(format!("The role {} has is {}", name, role));
        }
    }
    .boxed()
}

pub fn minion(ctx: NightContext) -> BoxFuture<'static, ()> {
    async move {
        let wolves = werewolf_names(&*ctx.state().await);
        if wolves.is_empty() {
            ctx.tell("There are no werewolves.");
            ctx.tell(
                "If there are still no werewolves by the end of the night, you must convince the villagers to kill a villager besides yourself to win.",
            );
        } else {
            ctx.tell(format!("The werewolves are: {}", make_list(&wolves)));
        }
    }
    .boxed()
}

pub fn mason(ctx: NightContext) -> BoxFuture<'static, ()> {
    async move {
        let masons = ctx.state().await.holders_of(Role::Mason);
        if masons.len() == 1 {
            ctx.tell("You are the only mason. The other mason started in the center.");
        } else {
            ctx.tell(format!("The masons are {}", make_list(&masons)));
        }
    }
    .boxed()
}

pub fn seer(ctx: NightContext) -> BoxFuture<'static, ()> {
    async move {
        let choice = ctx
            .ask_choice(&["View two center roles", "View one other player's role"])
            .await;
        match choice {
            Some(0) => {
                let slots = ctx.ask_center(2).await;
                if slots.is_empty() {
                    return;
                }
                let roles: Vec<String> = {
                    let state = ctx.state().await;
                    slots
                        .iter()
                        .map(|&slot| state.center_role(slot).to_string())
                        .collect()
                };
                ctx.tell(format!(
                    "The roles you selected in the center were {}",
                    make_list(&roles)
                ));
            }
            Some(1) => {
                if let [target] = ctx.ask_players(1, false).await[..] {
                    let (name, role) = {
                        let state = ctx.state().await;
                        (state.name(target).to_string(), state.current_role(target))
                    };
                    ctx.tell(format!("The role that {} has is {}", name, role));
                }
            }
            _ => {}
        }
    }
    .boxed()
}

pub fn apprentice_seer(ctx: NightContext) -> BoxFuture<'static, ()> {
    async move {
        ctx.tell("You may view one role from the center");
        if let [slot] = ctx.ask_center(1).await[..] {
            let role = ctx.state().await.center_role(slot);
            ctx.tell(format!("The role you selected in the center was {}", role));
        }
    }
    .boxed()
}

pub fn paranormal_investigator(ctx: NightContext) -> BoxFuture<'static, ()> {
    async move {
        ctx.tell("You may view up to two other players' roles, one at a time");
        let mut viewed = Vec::new();
        while viewed.len() < 2 {
            let picked = ctx.ask_players_except(1, false, &viewed).await;
            let Some(&target) = picked.first() else {
                break;
            };
            viewed.push(target);
            let (name, role) = {
                let state = ctx.state().await;
                (state.name(target).to_string(), state.current_role(target))
            };
            ctx.tell(format!("The role {} has is {}", name, role));
            match role.win_faction() {
                Faction::Werewolf => {
                    ctx.tell("You saw a werewolf. You are now on the werewolf team.");
                    break;
                }
                Faction::Tanner => {
                    ctx.tell("You saw the tanner. You now win only if you are killed.");
                    break;
                }
                Faction::Villager => {}
            }
        }
    }
    .boxed()
}

pub fn robber(ctx: NightContext) -> BoxFuture<'static, ()> {
    async move {
        if is_protected(&ctx).await {
            ctx.tell(
                "Your role has been guarded by the sentinel. You will not be swapping roles tonight.",
            );
            return;
        }
        ctx.tell("You may choose to steal another player's role");
        if let [target] = ctx.ask_players(1, false).await[..] {
            let role = {
                let mut state = ctx.state().await;
                state.swap(ctx.player(), target);
                state.current_role(ctx.player())
            };
            ctx.tell(format!("Your new role is {}", role));
        }
    }
    .boxed()
}

pub fn witch(ctx: NightContext) -> BoxFuture<'static, ()> {
    async move {
        ctx.tell(
            "You may choose to view a center role. If you do, you must swap it with a player.",
        );
        let [slot] = ctx.ask_center(1).await[..] else {
            return;
        };
        let (role, fallback) = {
            let state = ctx.state().await;
            let fallback = (0..state.num_players())
                .filter(|&p| !state.is_protected(p))
                .choose(&mut rand::thread_rng())
                .map(|p| (p, state.name(p).to_string()));
            (state.center_role(slot), fallback)
        };
        match &fallback {
            Some((_, name)) => ctx.tell(format!(
                "The center role was {}. You must swap it with a player. If you do not select in time, it will be swapped with {}",
                role, name
            )),
            None => ctx.tell(format!(
                "The center role was {}. You must swap it with a player.",
                role
            )),
        }
        let target = match ctx.ask_players(1, true).await[..] {
            [chosen] => Some(chosen),
            _ => fallback.map(|(p, _)| p),
        };
        if let Some(target) = target {
            ctx.state().await.swap_center(target, slot);
        }
    }
    .boxed()
}

pub fn troublemaker(ctx: NightContext) -> BoxFuture<'static, ()> {
    async move {
        ctx.tell("You may swap the roles of two other players");
        if let [a, b] = ctx.ask_players(2, false).await[..] {
            if a == b {
                ctx.tell("You picked the same player twice, so no roles were swapped");
            } else {
                ctx.state().await.swap(a, b);
            }
        }
    }
    .boxed()
}

pub fn village_idiot(ctx: NightContext) -> BoxFuture<'static, ()> {
    async move {
        let choice = ctx
            .ask_choice(&["Rotate left", "Rotate right", "Do nothing"])
            .await;
        let left = match choice {
            Some(0) => true,
            Some(1) => false,
            _ => return,
        };
        let mut state = ctx.state().await;
        let seats: Vec<usize> = (0..state.num_players())
            .filter(|&p| p != ctx.player() && !state.is_protected(p))
            .collect();
        // Adjacent swaps carry every role one seat along.
        if left {
            for pair in seats.windows(2) {
                state.swap(pair[0], pair[1]);
            }
        } else {
            for pair in seats.windows(2).rev() {
                state.swap(pair[0], pair[1]);
            }
        }
    }
    .boxed()
}

pub fn drunk(ctx: NightContext) -> BoxFuture<'static, ()> {
    async move {
        if is_protected(&ctx).await {
            ctx.tell(
                "Your role has been guarded by the sentinel. You will not be swapping roles tonight.",
            );
            return;
        }
        ctx.tell(
            "You must select a center role to swap with your own. If you do not select in time, one will be selected for you.",
        );
        let slot = match ctx.ask_center(1).await[..] {
            [slot] => slot,
            _ => random_center_slot(),
        };
        ctx.state().await.swap_center(ctx.player(), slot);
    }
    .boxed()
}

pub fn insomniac(ctx: NightContext) -> BoxFuture<'static, ()> {
    async move {
        let (protected, role) = {
            let state = ctx.state().await;
            (
                state.is_protected(ctx.player()),
                state.current_role(ctx.player()),
            )
        };
        if protected {
            ctx.tell(
                "Your role has been guarded by the sentinel. You will not see your current role tonight.",
            );
        } else {
            ctx.tell(format!("Your current role is {}", role));
        }
    }
    .boxed()
}

pub fn revealer(ctx: NightContext) -> BoxFuture<'static, ()> {
    async move {
        ctx.tell("You may select one other player's role to reveal.");
        let [target] = ctx.ask_players(1, false).await[..] else {
            return;
        };
        let (name, role) = {
            let mut state = ctx.state().await;
            let role = state.current_role(target);
            if role.win_faction() == Faction::Villager {
                state.add_modifier(target, Modifier::Revealed);
            }
            (state.name(target).to_string(), role)
        };
        ctx.tell(format!("The role {} has is {}", name, role));
        if role.win_faction() != Faction::Villager {
            ctx.tell(
                "Because this role is not on the villager team, it will not be shown to other players",
            );
        }
    }
    .boxed()
}

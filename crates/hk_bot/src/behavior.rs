//! Unit behavior chain.
//!
//! Each unit walks a fixed list of behaviors and stops at the first one
//! whose order is accepted:
//!
//! 1. Heal a damaged ally (healers only)
//! 2. Attack a visible enemy in range, with an area special if it pays off
//! 3. Turn toward the nearest enemy unit
//! 4. Turn away from a wall straight ahead
//! 5. Follow the cached route
//! 6. Plan a route to the nearest enemy structure
//! 7. Make a random legal move
//!
//! A behavior that has nothing to propose, or whose order is rejected,
//! hands over to the next one. Running out of behaviors is not an error.

use hk_core::entity::{EntityId, SpecialAbility, Unit};
use hk_core::map::MapLocation;
use hk_core::order::OrderKind;
use hk_core::rules::RulesEngine;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::commit::TurnContext;
use crate::path_cache::PathCache;

/// Mutable per-bot state the chain reads and writes.
pub struct ChainState<'a, G: Rng + ?Sized> {
    /// Cross-turn routes.
    pub cache: &'a mut PathCache,
    /// Source for random choices.
    pub rng: &'a mut G,
    /// Area specials must catch more enemy units than this.
    pub special_attack_baseline: usize,
}

/// Run the behavior chain for `unit`. Returns `true` if an order was committed.
pub fn run_chain<R, G>(
    ctx: &mut TurnContext<'_, R>,
    unit: EntityId,
    chain: &mut ChainState<'_, G>,
) -> bool
where
    R: RulesEngine + ?Sized,
    G: Rng + ?Sized,
{
    // Units can die during the turn, e.g. to an infection spawned earlier.
    let Some(actor) = ctx.working.unit(unit).cloned() else {
        return false;
    };

    try_heal(ctx, &actor)
        || try_offense(ctx, &actor, chain.special_attack_baseline)
        || try_face_enemy(ctx, &actor)
        || try_avoid_wall(ctx, &actor, chain.rng)
        || try_follow_path(ctx, &actor, chain.cache)
        || try_plan_path(ctx, &actor, chain.cache)
        || try_random_move(ctx, &actor, chain.rng)
}

/// Turn `actor` toward `target`. `false` if already facing it or no turn is needed.
fn rotate_toward<R: RulesEngine + ?Sized>(
    ctx: &mut TurnContext<'_, R>,
    actor: &Unit,
    target: MapLocation,
) -> bool {
    let Some(wanted) = actor.location.direction_to(target) else {
        return false;
    };
    let Some(clockwise) = actor.orientation.rotation_towards(wanted) else {
        return false;
    };
    ctx.try_commit(OrderKind::Rotate {
        unit: actor.id,
        clockwise,
    })
}

/// Heal the closest damaged ally in range, or turn toward it if it is out of sight.
pub fn try_heal<R: RulesEngine + ?Sized>(ctx: &mut TurnContext<'_, R>, actor: &Unit) -> bool {
    if !actor.unit_type.is_healer() || !actor.can_use_special_attack() {
        return false;
    }
    let Some(patient) = ctx
        .working
        .units_of(ctx.player)
        .filter(|ally| ally.is_damaged() && actor.is_in_attack_range(ally.location))
        .min_by_key(|ally| actor.location.manhattan_distance(ally.location))
        .map(|ally| ally.location)
    else {
        return false;
    };

    if ctx.working.is_in_field_of_view(actor, patient) {
        ctx.try_commit(OrderKind::Attack {
            unit: actor.id,
            target: patient,
            special: true,
        })
    } else {
        rotate_toward(ctx, actor, patient)
    }
}

/// Enemy units, then enemy structures, that `actor` can hit right now.
fn attack_candidates<R: RulesEngine + ?Sized>(
    ctx: &TurnContext<'_, R>,
    actor: &Unit,
) -> Vec<MapLocation> {
    let state = &ctx.working;
    let reachable = |location: MapLocation| {
        actor.is_in_attack_range(location) && state.is_in_field_of_view(actor, location)
    };

    state
        .enemy_units(ctx.player)
        .map(|enemy| enemy.location)
        .filter(|&location| reachable(location))
        .chain(
            state
                .enemy_structures(ctx.player)
                .map(|structure| structure.location)
                .filter(|&location| reachable(location)),
        )
        .collect()
}

/// The candidate whose blast catches the most enemy units without touching
/// a friendly unit, if that count beats `baseline`.
fn best_blast<R: RulesEngine + ?Sized>(
    ctx: &TurnContext<'_, R>,
    candidates: &[MapLocation],
    radius: u32,
    baseline: usize,
) -> Option<MapLocation> {
    let state = &ctx.working;
    let mut best: Option<(MapLocation, usize)> = None;

    for &candidate in candidates {
        let mut caught = 0;
        let mut hits_friend = false;
        for location in state.map().area_within(candidate, radius, true) {
            match state.unit_at(location) {
                Some(unit) if unit.owner == ctx.player => hits_friend = true,
                Some(_) => caught += 1,
                None => {}
            }
        }
        if hits_friend || caught <= baseline {
            continue;
        }
        if best.map_or(true, |(_, most)| caught > most) {
            best = Some((candidate, caught));
        }
    }

    best.map(|(location, _)| location)
}

/// Attack something in range: an area special when it pays off, else a basic attack.
pub fn try_offense<R: RulesEngine + ?Sized>(
    ctx: &mut TurnContext<'_, R>,
    actor: &Unit,
    baseline: usize,
) -> bool {
    let candidates = attack_candidates(ctx, actor);
    let Some(&first) = candidates.first() else {
        return false;
    };

    if let SpecialAbility::Grenade { radius, .. } = actor.stats().special {
        if actor.can_use_special_attack() {
            if let Some(target) = best_blast(ctx, &candidates, radius, baseline) {
                if ctx.try_commit(OrderKind::Attack {
                    unit: actor.id,
                    target,
                    special: true,
                }) {
                    return true;
                }
            }
        }
    }

    ctx.try_commit(OrderKind::Attack {
        unit: actor.id,
        target: first,
        special: false,
    })
}

/// Turn toward the nearest enemy unit, seen or not.
pub fn try_face_enemy<R: RulesEngine + ?Sized>(ctx: &mut TurnContext<'_, R>, actor: &Unit) -> bool {
    let Some(nearest) = ctx
        .working
        .enemy_units(ctx.player)
        .min_by_key(|enemy| actor.location.manhattan_distance(enemy.location))
        .map(|enemy| enemy.location)
    else {
        return false;
    };
    rotate_toward(ctx, actor, nearest)
}

/// If a wall is straight ahead, turn left or right at random.
pub fn try_avoid_wall<R, G>(ctx: &mut TurnContext<'_, R>, actor: &Unit, rng: &mut G) -> bool
where
    R: RulesEngine + ?Sized,
    G: Rng + ?Sized,
{
    if !ctx.working.map().is_wall(actor.location_ahead()) {
        return false;
    }
    ctx.try_commit(OrderKind::Rotate {
        unit: actor.id,
        clockwise: rng.gen_bool(0.5),
    })
}

fn move_toward<R: RulesEngine + ?Sized>(
    ctx: &mut TurnContext<'_, R>,
    actor: &Unit,
    next: MapLocation,
) -> bool {
    let Some(direction) = actor.location.adjacent_direction(next) else {
        return false;
    };
    ctx.try_commit(OrderKind::Move {
        unit: actor.id,
        direction,
    })
}

/// Take the next step of the cached route, after syncing it with the unit's location.
pub fn try_follow_path<R: RulesEngine + ?Sized>(
    ctx: &mut TurnContext<'_, R>,
    actor: &Unit,
    cache: &mut PathCache,
) -> bool {
    let Some(next) = cache
        .advance(actor.id, actor.location)
        .and_then(|route| route.front().copied())
    else {
        return false;
    };
    move_toward(ctx, actor, next)
}

/// Plan a route next to the nearest enemy structure and take its first step.
pub fn try_plan_path<R: RulesEngine + ?Sized>(
    ctx: &mut TurnContext<'_, R>,
    actor: &Unit,
    cache: &mut PathCache,
) -> bool {
    let state = &ctx.working;
    let Some(target) = state
        .enemy_structures(ctx.player)
        .min_by_key(|structure| actor.location.manhattan_distance(structure.location))
        .map(|structure| structure.location)
    else {
        return false;
    };
    let Some(destination) = state
        .map()
        .area_around(target, false)
        .into_iter()
        .filter(|&location| state.is_walkable(location))
        .min_by_key(|&location| actor.location.manhattan_distance(location))
    else {
        return false;
    };

    let route = state.find_path(actor.location, destination);
    let Some(&first) = route.first() else {
        return false;
    };
    tracing::trace!(
        "Unit {} planned {} steps toward {}",
        actor.id,
        route.len(),
        destination
    );
    cache.set(actor.id, route);
    move_toward(ctx, actor, first)
}

/// Pick any legal move at random.
pub fn try_random_move<R, G>(ctx: &mut TurnContext<'_, R>, actor: &Unit, rng: &mut G) -> bool
where
    R: RulesEngine + ?Sized,
    G: Rng + ?Sized,
{
    let moves = ctx.rules.legal_move_orders(&ctx.working, actor.id);
    let Some(order) = moves.choose(rng) else {
        return false;
    };
    ctx.try_commit(order.kind)
}

//! Baseline opponents that play random legal orders.

use hk_core::entity::{EntityId, UnitType};
use hk_core::order::{Action, Order, OrderKind};
use hk_core::rules::{RulesEngine, StandardRules};
use hk_core::state::GameState;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::bot::Bot;
use crate::commit::TurnContext;

/// Chance a structure is left idle.
pub const STRUCTURE_IDLE_CHANCE: f64 = 0.1;

/// Chance a unit is left idle.
pub const UNIT_IDLE_CHANCE: f64 = 0.2;

/// Roll below which an active unit rotates.
pub const ROTATE_THRESHOLD: f64 = 0.2;

/// Roll below which an active unit moves (if it did not rotate).
pub const MOVE_THRESHOLD: f64 = 0.7;

fn own_entities(state: &GameState) -> (Vec<EntityId>, Vec<EntityId>) {
    let player = state.active_player();
    let structures = state.structures_of(player).map(|s| s.id).collect();
    let units = state.units_of(player).map(|u| u.id).collect();
    (structures, units)
}

/// Commits one uniformly random legal order per structure and unit.
#[derive(Debug, Clone)]
pub struct RandomBot<R = StandardRules, G = ChaCha8Rng> {
    rules: R,
    rng: G,
}

impl RandomBot {
    /// Create a bot on the standard rules.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self::with_parts(StandardRules, ChaCha8Rng::seed_from_u64(seed))
    }
}

impl<R: RulesEngine, G: Rng> RandomBot<R, G> {
    /// Create a bot from explicit rules and random source.
    #[must_use]
    pub fn with_parts(rules: R, rng: G) -> Self {
        Self { rules, rng }
    }
}

impl<R: RulesEngine, G: Rng> Bot for RandomBot<R, G> {
    fn name(&self) -> &str {
        "RandomBot"
    }

    fn handle(&mut self, state: &GameState) -> Action {
        let mut ctx = TurnContext::new(&self.rules, state);
        let (structures, units) = own_entities(&ctx.working);

        for entity in structures.into_iter().chain(units) {
            let legal = self.rules.legal_orders(&ctx.working, entity);
            if let Some(order) = legal.choose(&mut self.rng) {
                ctx.try_commit(order.kind);
            }
        }
        ctx.into_action()
    }
}

/// Random play with a little sense.
///
/// Entities sometimes idle. Units otherwise rotate, move or attack at fixed
/// odds, and never attack empty tiles or their own side, except for a
/// healer's special on an ally.
#[derive(Debug, Clone)]
pub struct SlightlyRandomBot<R = StandardRules, G = ChaCha8Rng> {
    rules: R,
    rng: G,
}

impl SlightlyRandomBot {
    /// Create a bot on the standard rules.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self::with_parts(StandardRules, ChaCha8Rng::seed_from_u64(seed))
    }
}

impl<R: RulesEngine, G: Rng> SlightlyRandomBot<R, G> {
    /// Create a bot from explicit rules and random source.
    #[must_use]
    pub fn with_parts(rules: R, rng: G) -> Self {
        Self { rules, rng }
    }
}

/// True if an attack order is worth considering for `state`'s active player.
fn is_sensible_attack(state: &GameState, order: &Order) -> bool {
    let OrderKind::Attack {
        unit,
        target,
        special,
    } = order.kind
    else {
        return false;
    };
    let player = state.active_player();
    let is_heal =
        special && state.unit(unit).is_some_and(|actor| actor.unit_type == UnitType::Medic);

    if let Some(victim) = state.unit_at(target) {
        return victim.owner != player || is_heal;
    }
    state
        .structure_at(target)
        .is_some_and(|structure| structure.owner != player)
}

impl<R: RulesEngine, G: Rng> Bot for SlightlyRandomBot<R, G> {
    fn name(&self) -> &str {
        "SlightlyRandomBot"
    }

    fn handle(&mut self, state: &GameState) -> Action {
        let mut ctx = TurnContext::new(&self.rules, state);
        let (structures, units) = own_entities(&ctx.working);

        for structure in structures {
            if self.rng.gen::<f64>() <= STRUCTURE_IDLE_CHANCE {
                continue;
            }
            let legal = self.rules.legal_orders(&ctx.working, structure);
            if let Some(order) = legal.choose(&mut self.rng) {
                ctx.try_commit(order.kind);
            }
        }

        for unit in units {
            if self.rng.gen::<f64>() <= UNIT_IDLE_CHANCE {
                continue;
            }
            let legal = self.rules.legal_orders(&ctx.working, unit);
            let (rotations, moves, attacks) = legal.into_iter().fold(
                (Vec::new(), Vec::new(), Vec::new()),
                |(mut rotations, mut moves, mut attacks), order| {
                    match order.kind {
                        OrderKind::Rotate { .. } => rotations.push(order),
                        OrderKind::Move { .. } => moves.push(order),
                        OrderKind::Attack { .. } if is_sensible_attack(&ctx.working, &order) => {
                            attacks.push(order);
                        }
                        _ => {}
                    }
                    (rotations, moves, attacks)
                },
            );

            let roll = self.rng.gen::<f64>();
            let pool = if roll <= ROTATE_THRESHOLD && !rotations.is_empty() {
                rotations
            } else if roll <= MOVE_THRESHOLD && !moves.is_empty() {
                moves
            } else {
                attacks
            };
            if let Some(order) = pool.choose(&mut self.rng) {
                ctx.try_commit(order.kind);
            }
        }
        ctx.into_action()
    }
}

//! The bot interface and the rule-priority policy bot.

use hk_core::entity::EntityId;
use hk_core::order::Action;
use hk_core::rules::{RulesEngine, StandardRules};
use hk_core::state::GameState;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::behavior::{run_chain, ChainState};
use crate::commit::TurnContext;
use crate::config::BotConfig;
use crate::path_cache::PathCache;
use crate::spawn::spawn_policy;

/// Anything that can play a seat.
///
/// A bot receives the full state for the turn of the player it controls and
/// returns that player's action. It must not assume it sees every turn of a
/// match: seats can be handed to a bot mid-game.
pub trait Bot {
    /// Display name for logs and reports.
    fn name(&self) -> &str;

    /// Decide the active player's action for this turn.
    fn handle(&mut self, state: &GameState) -> Action;
}

/// Greedy, rule-priority bot.
///
/// Structures run the spawn policy and units run the behavior chain, in
/// entity id order, each against a working copy that reflects every order
/// committed earlier in the turn.
#[derive(Debug, Clone)]
pub struct RulesBot<R = StandardRules, G = ChaCha8Rng> {
    rules: R,
    config: BotConfig,
    cache: PathCache,
    rng: G,
}

impl RulesBot {
    /// Create a bot on the standard rules, seeded from `config`.
    #[must_use]
    pub fn new(config: BotConfig) -> Self {
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        Self::with_parts(StandardRules, config, rng)
    }
}

impl Default for RulesBot {
    fn default() -> Self {
        Self::new(BotConfig::default())
    }
}

impl<R: RulesEngine, G: Rng> RulesBot<R, G> {
    /// Create a bot from explicit rules and random source.
    #[must_use]
    pub fn with_parts(rules: R, config: BotConfig, rng: G) -> Self {
        Self {
            rules,
            config,
            cache: PathCache::new(),
            rng,
        }
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &BotConfig {
        &self.config
    }

    /// Routes kept between turns.
    #[must_use]
    pub fn path_cache(&self) -> &PathCache {
        &self.cache
    }

    /// Mutable access to the routes, e.g. to seed or reset them.
    pub fn path_cache_mut(&mut self) -> &mut PathCache {
        &mut self.cache
    }

    /// Decide one turn for the state's active player.
    ///
    /// `state` is never modified. Entities with no acceptable order simply
    /// get none.
    pub fn decide(&mut self, state: &GameState) -> Action {
        let mut ctx = TurnContext::new(&self.rules, state);
        let player = ctx.player;

        let structures: Vec<EntityId> = ctx
            .working
            .structures_of(player)
            .map(|structure| structure.id)
            .collect();
        // Units spawned this turn cannot act, so enumerate before spawning.
        let units: Vec<EntityId> = ctx.working.units_of(player).map(|unit| unit.id).collect();

        for structure in structures {
            spawn_policy(&mut ctx, structure, &self.config.spawn_priority);
        }

        let mut chain = ChainState {
            cache: &mut self.cache,
            rng: &mut self.rng,
            special_attack_baseline: self.config.special_attack_baseline,
        };
        for unit in units {
            run_chain(&mut ctx, unit, &mut chain);
        }

        let action = ctx.into_action();
        tracing::debug!(
            "Player {} round {}: {} orders",
            player,
            state.round(),
            action.len()
        );
        action
    }
}

impl<R: RulesEngine, G: Rng> Bot for RulesBot<R, G> {
    fn name(&self) -> &str {
        "RulesBot"
    }

    fn handle(&mut self, state: &GameState) -> Action {
        self.decide(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hk_core::entity::{StructureType, UnitType};
    use hk_core::map::{Direction, Map, MapLocation};
    use hk_core::order::OrderKind;

    #[test]
    fn test_decides_for_active_player_only() {
        let mut state = GameState::new(Map::new(8, 8).unwrap(), &["A", "B"]).unwrap();
        state
            .add_unit(0, UnitType::Soldier, MapLocation::new(1, 1), Direction::South)
            .unwrap();
        state
            .add_unit(1, UnitType::Soldier, MapLocation::new(6, 6), Direction::North)
            .unwrap();
        state.set_active_player(1).unwrap();

        let action = RulesBot::default().decide(&state);
        assert_eq!(action.player, 1);
        assert!(action
            .orders()
            .iter()
            .all(|order| state.unit(order.entity()).is_some_and(|unit| unit.owner == 1)));
    }

    #[test]
    fn test_spawned_unit_is_not_ordered() {
        let mut state = GameState::new(Map::new(8, 8).unwrap(), &["A", "B"]).unwrap();
        state
            .add_structure(0, StructureType::Base, MapLocation::new(0, 0), Direction::East)
            .unwrap();
        state
            .add_structure(1, StructureType::Base, MapLocation::new(7, 7), Direction::West)
            .unwrap();

        let action = RulesBot::default().decide(&state);
        assert_eq!(action.len(), 1);
        assert!(matches!(
            action.orders()[0].kind,
            OrderKind::Spawn {
                unit_type: UnitType::Infected,
                ..
            }
        ));
    }

    #[test]
    fn test_name() {
        assert_eq!(RulesBot::default().name(), "RulesBot");
    }
}

//! Property tests: bot output on arbitrary positions.

use hk_bot::{Bot, BotConfig, RandomBot, RulesBot, SlightlyRandomBot};
use hk_core::entity::EntityId;
use hk_core::map_generation::{generate_match, MapConfig};
use hk_core::order::Action;
use hk_core::rules::{Diagnostics, RulesEngine, StandardRules};
use hk_core::state::GameState;
use hk_test_utils::determinism::strategies::arb_scenario;
use hk_test_utils::determinism::{fingerprint, verify_determinism};
use proptest::prelude::*;

fn replays_legally(state: &GameState, action: &Action) -> bool {
    let mut replay = state.clone();
    action.orders().iter().all(|order| {
        let mut diagnostics = Diagnostics::new();
        let legal = StandardRules.is_order_possible(&replay, order, &mut diagnostics);
        StandardRules.execute_order(&mut replay, order, &mut diagnostics);
        legal
    })
}

fn one_order_per_entity(action: &Action) -> bool {
    let mut entities: Vec<EntityId> = action.orders().iter().map(|order| order.entity()).collect();
    let total = entities.len();
    entities.sort_unstable();
    entities.dedup();
    entities.len() == total
}

fn indices_are_sequential(action: &Action) -> bool {
    action
        .orders()
        .iter()
        .enumerate()
        .all(|(position, order)| order.index == position)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn rules_bot_output_is_always_legal(params in arb_scenario(10), seed in any::<u64>()) {
        let state = params.build();
        let before = state.clone();
        let action = RulesBot::new(BotConfig::default().with_seed(seed)).decide(&state);

        prop_assert_eq!(action.player, state.active_player());
        prop_assert!(replays_legally(&state, &action));
        prop_assert!(one_order_per_entity(&action));
        prop_assert!(indices_are_sequential(&action));
        prop_assert_eq!(state, before);
    }

    #[test]
    fn random_bots_output_is_always_legal(params in arb_scenario(10), seed in any::<u64>()) {
        let state = params.build();
        let random = RandomBot::new(seed).handle(&state);
        let slightly = SlightlyRandomBot::new(seed).handle(&state);

        prop_assert!(replays_legally(&state, &random));
        prop_assert!(one_order_per_entity(&random));
        prop_assert!(replays_legally(&state, &slightly));
        prop_assert!(indices_are_sequential(&slightly));
    }

    #[test]
    fn same_seed_same_decision(params in arb_scenario(10), seed in any::<u64>()) {
        let state = params.build();
        let config = BotConfig::default().with_seed(seed);
        let first = RulesBot::new(config.clone()).decide(&state);
        let second = RulesBot::new(config).decide(&state);
        prop_assert_eq!(first, second);
    }
}

#[test]
fn seeded_matches_are_reproducible() {
    let config = MapConfig::small().with_seed(8);
    let result = verify_determinism(
        3,
        30,
        || {
            let state = generate_match(&config).unwrap();
            let bots = [
                RulesBot::new(BotConfig::default().with_seed(1)),
                RulesBot::new(BotConfig::default().with_seed(2)),
            ];
            (state, bots)
        },
        |(state, bots)| {
            if state.is_finished() {
                return;
            }
            let seat = state.active_player() as usize;
            let action = bots[seat].handle(state);
            StandardRules.handle(state, &action).unwrap();
        },
        |(state, _)| fingerprint(state),
    );
    result.assert_deterministic();
}

//! Determinism testing utilities.
//!
//! Provides a harness for verifying that bots and matches produce identical
//! results given identical inputs.
//!
//! # Testing Strategy
//!
//! A seeded bot must make the same decisions every time it sees the same
//! state. Sources of non-determinism include:
//!
//! - **HashMap iteration order**: Rust's default hasher is randomized.
//!   Entities are always iterated in ascending id order.
//!
//! - **System randomness**: No entropy-seeded generators. Every random
//!   choice goes through an explicitly seeded PRNG.
//!
//! - **Shared state between matches**: Each match owns its bots and state,
//!   so parallel runs cannot influence each other.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;

use serde::Serialize;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of turns played per run.
    pub turns: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for a deterministic run).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that every run matched, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Match is non-deterministic!\n\
                 Runs: {}\n\
                 Turns: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.turns,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a scenario multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run the scenario
/// * `turns` - Number of steps per run
/// * `setup` - Function to create the initial state
/// * `step` - Function to advance the state by one turn
/// * `hash` - Function to compute the state hash
///
/// # Example
///
/// ```ignore
/// use hk_test_utils::determinism::{fingerprint, verify_determinism};
///
/// let result = verify_determinism(
///     3,  // Run 3 times
///     50, // 50 turns each
///     || MatchRunner::new(&config).unwrap(),
///     |runner| { runner.play_turn().ok(); },
///     |runner| fingerprint(runner.state()),
/// );
/// result.assert_deterministic();
/// ```
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    turns: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for _ in 0..turns {
            step(&mut state);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        turns,
    }
}

/// Run the same scenario on `runs` scoped threads and verify the results match.
///
/// Catches state accidentally shared between runs.
pub fn verify_parallel_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    turns: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S + Sync,
    Step: Fn(&mut S) + Sync,
    HashFn: Fn(&S) -> u64 + Sync,
{
    let hashes: Vec<u64> = thread::scope(|s| {
        let handles: Vec<_> = (0..runs)
            .map(|_| {
                s.spawn(|| {
                    let mut state = setup();
                    for _ in 0..turns {
                        step(&mut state);
                    }
                    hash(&state)
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().unwrap_or_else(|_| panic!("Determinism run panicked")))
            .collect()
    });

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        turns,
    }
}

/// Step two copies of a scenario side by side, finding the first divergence.
///
/// # Returns
///
/// `None` if both copies matched throughout, `Some(turn)` for the first
/// turn after which they differ (`0` for the initial state).
pub fn find_first_divergence<S, Setup, Step, HashFn>(
    turns: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> Option<u64>
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut first = setup();
    let mut second = setup();

    if hash(&first) != hash(&second) {
        return Some(0);
    }

    for turn in 1..=turns {
        step(&mut first);
        step(&mut second);

        if hash(&first) != hash(&second) {
            return Some(turn);
        }
    }

    None
}

/// Hash the bincode encoding of a value.
///
/// Works for anything serializable, including values that do not
/// implement `Hash`.
///
/// # Panics
///
/// Panics if the value cannot be encoded.
pub fn fingerprint<T: Serialize>(value: &T) -> u64 {
    let bytes = bincode::serialize(value)
        .unwrap_or_else(|err| panic!("Value cannot be fingerprinted: {err}"));
    compute_hash(&bytes)
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Proptest strategies for bot testing.
///
/// These strategies generate random but reproducible scenarios: small maps
/// with scattered walls and both players' forces in arbitrary condition.
pub mod strategies {
    use hk_core::entity::{StructureType, UnitType};
    use hk_core::map::{Direction, Map, MapLocation, Tile};
    use hk_core::state::GameState;
    use proptest::prelude::*;

    use crate::fixtures::PLAYER_NAMES;

    /// Generate any unit type.
    pub fn arb_unit_type() -> impl Strategy<Value = UnitType> {
        prop_oneof![
            Just(UnitType::Soldier),
            Just(UnitType::Medic),
            Just(UnitType::Infected),
        ]
    }

    /// Generate any facing.
    pub fn arb_direction() -> impl Strategy<Value = Direction> {
        prop_oneof![
            Just(Direction::North),
            Just(Direction::East),
            Just(Direction::South),
            Just(Direction::West),
        ]
    }

    /// Parameters for placing a test unit.
    #[derive(Debug, Clone)]
    pub struct TestUnitParams {
        /// Owning seat, 0 or 1.
        pub owner: u32,
        /// Kind.
        pub unit_type: UnitType,
        /// Column.
        pub x: i32,
        /// Row.
        pub y: i32,
        /// Facing.
        pub facing: Direction,
        /// Damage already taken, clamped below max hp.
        pub wounds: u32,
        /// Remaining special cooldown.
        pub cooldown: u32,
    }

    /// Generate parameters for a test unit on a `size` x `size` map.
    pub fn arb_unit_params(size: i32) -> impl Strategy<Value = TestUnitParams> {
        (
            0u32..2,
            arb_unit_type(),
            0..size,
            0..size,
            arb_direction(),
            0u32..10,
            0u32..3,
        )
            .prop_map(|(owner, unit_type, x, y, facing, wounds, cooldown)| {
                TestUnitParams {
                    owner,
                    unit_type,
                    x,
                    y,
                    facing,
                    wounds,
                    cooldown,
                }
            })
    }

    /// Parameters for a whole scenario.
    #[derive(Debug, Clone)]
    pub struct ScenarioParams {
        /// Side length of the square map.
        pub size: i32,
        /// Wall flags in row-major order.
        pub walls: Vec<bool>,
        /// Units to place; ones landing on taken tiles are skipped.
        pub units: Vec<TestUnitParams>,
        /// Resources for the active player.
        pub resources: u32,
        /// Player whose turn it is.
        pub active: u32,
    }

    impl ScenarioParams {
        /// Build the described state.
        ///
        /// Each player gets a base in opposite corners before units are placed.
        #[must_use]
        pub fn build(&self) -> GameState {
            let mut map = Map::new(self.size, self.size)
                .unwrap_or_else(|err| panic!("Invalid scenario size {}: {err}", self.size));
            for (index, &wall) in self.walls.iter().enumerate() {
                let location =
                    MapLocation::new(index as i32 % self.size, index as i32 / self.size);
                if wall {
                    map.set_tile(location, Tile::Wall);
                }
            }
            let far = self.size - 1;
            for corner in [MapLocation::new(0, 0), MapLocation::new(far, far)] {
                for location in map.area_around(corner, true) {
                    map.set_tile(location, Tile::Floor);
                }
            }

            let mut state = GameState::new(map, &PLAYER_NAMES)
                .unwrap_or_else(|err| panic!("Invalid scenario: {err}"));
            // Corners were cleared above, so the bases always fit.
            let bases = [
                (0, MapLocation::new(0, 0), Direction::East),
                (1, MapLocation::new(far, far), Direction::West),
            ];
            for (owner, location, facing) in bases {
                let _ = state.add_structure(owner, StructureType::Base, location, facing);
            }

            for params in &self.units {
                let location = MapLocation::new(params.x, params.y);
                let Ok(id) = state.add_unit(params.owner, params.unit_type, location, params.facing)
                else {
                    continue;
                };
                if let Some(unit) = state.unit_mut(id) {
                    let max_hp = unit.max_hp();
                    unit.hp = max_hp - params.wounds.min(max_hp - 1);
                    unit.special_cooldown = params.cooldown;
                }
            }
            if let Some(player) = state.player_mut(self.active) {
                player.resources = self.resources;
            }
            let _ = state.set_active_player(self.active);
            state
        }
    }

    /// Generate a small scenario with up to `max_units` units.
    pub fn arb_scenario(max_units: usize) -> impl Strategy<Value = ScenarioParams> {
        (5i32..10).prop_flat_map(move |size| {
            let cells = (size * size) as usize;
            (
                Just(size),
                proptest::collection::vec(proptest::bool::weighted(0.15), cells),
                proptest::collection::vec(arb_unit_params(size), 1..max_units),
                0u32..40,
                0u32..2,
            )
                .prop_map(|(size, walls, units, resources, active)| ScenarioParams {
                    size,
                    walls,
                    units,
                    resources,
                    active,
                })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_verify_determinism_simple() {
        let result = verify_determinism(3, 100, || 0u64, |n| *n += 1, |n| *n);

        assert!(result.is_deterministic);
        assert_eq!(result.hashes, vec![100, 100, 100]);
    }

    #[test]
    fn test_detects_non_determinism() {
        use std::sync::atomic::{AtomicU64, Ordering};

        let counter = AtomicU64::new(0);
        let result = verify_determinism(
            2,
            1,
            || counter.fetch_add(1, Ordering::SeqCst),
            |_| {},
            |n| *n,
        );
        assert!(!result.is_deterministic);
        assert_eq!(result.unique_hashes().len(), 2);
    }

    #[test]
    fn test_parallel_runs_match() {
        let result = verify_parallel_determinism(
            4,
            10,
            || vec![1u32],
            |v| v.push(v.len() as u32),
            |v| compute_hash(v),
        );
        result.assert_deterministic();
    }

    #[test]
    fn test_first_divergence() {
        use std::cell::Cell;

        let runs = Cell::new(0u64);
        let divergence = find_first_divergence(
            10,
            || {
                runs.set(runs.get() + 1);
                (0u64, runs.get())
            },
            |(n, seed)| *n += if *seed == 2 && *n >= 3 { 2 } else { 1 },
            |(n, _)| *n,
        );
        assert_eq!(divergence, Some(4));
        assert_eq!(find_first_divergence(10, || 0u64, |n| *n += 1, |n| *n), None);
    }

    #[test]
    fn test_fingerprint_tracks_state() {
        let a = crate::fixtures::duel();
        let mut b = a.clone();
        assert_eq!(fingerprint(&a), fingerprint(&b));
        b.player_mut(0).unwrap().resources += 1;
        assert_ne!(fingerprint(&a), fingerprint(&b));
    }

    proptest! {
        #[test]
        fn prop_scenarios_build_valid_states(params in strategies::arb_scenario(12)) {
            let state = params.build();
            prop_assert_eq!(state.structures().count(), 2);
            for unit in state.units() {
                prop_assert!(state.map().is_floor(unit.location));
                prop_assert!(unit.hp >= 1 && unit.hp <= unit.max_hp());
            }
        }
    }
}

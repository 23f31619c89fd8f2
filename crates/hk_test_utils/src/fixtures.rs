//! Test fixtures and helpers.
//!
//! Hand-made game states for consistent testing. Placement failures panic,
//! since a fixture that cannot be built is a broken test.

use hk_core::entity::{EntityId, PlayerId, StructureType, UnitType};
use hk_core::map::{Direction, Map, MapLocation};
use hk_core::state::GameState;

/// Player names used by every fixture.
pub const PLAYER_NAMES: [&str; 2] = ["Hunters", "Killers"];

/// Shorthand for a map location.
#[must_use]
pub const fn loc(x: i32, y: i32) -> MapLocation {
    MapLocation::new(x, y)
}

/// Builder for two-player scenarios.
///
/// ```ignore
/// let state = ScenarioBuilder::open(8, 8)
///     .unit(0, UnitType::Medic, (2, 2), Direction::North)
///     .unit_with_hp(0, UnitType::Soldier, (2, 1), Direction::North, 4)
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct ScenarioBuilder {
    state: GameState,
}

impl ScenarioBuilder {
    /// Start from an open map without walls.
    #[must_use]
    pub fn open(width: i32, height: i32) -> Self {
        let map = Map::new(width, height)
            .unwrap_or_else(|err| panic!("Invalid fixture map {width}x{height}: {err}"));
        Self::from_map(map)
    }

    /// Start from ASCII rows where `#` is a wall and anything else is floor.
    #[must_use]
    pub fn from_rows(rows: &[&str]) -> Self {
        let map = Map::from_rows(rows).unwrap_or_else(|err| panic!("Invalid fixture rows: {err}"));
        Self::from_map(map)
    }

    fn from_map(map: Map) -> Self {
        let state = GameState::new(map, &PLAYER_NAMES)
            .unwrap_or_else(|err| panic!("Invalid fixture state: {err}"));
        Self { state }
    }

    /// Place a unit at full health.
    #[must_use]
    pub fn unit(
        mut self,
        owner: PlayerId,
        unit_type: UnitType,
        (x, y): (i32, i32),
        facing: Direction,
    ) -> Self {
        self.state
            .add_unit(owner, unit_type, loc(x, y), facing)
            .unwrap_or_else(|err| panic!("Cannot place {unit_type:?} at ({x}, {y}): {err}"));
        self
    }

    /// Place a unit with the given hit points.
    #[must_use]
    pub fn unit_with_hp(
        mut self,
        owner: PlayerId,
        unit_type: UnitType,
        at: (i32, i32),
        facing: Direction,
        hp: u32,
    ) -> Self {
        self = self.unit(owner, unit_type, at, facing);
        let id = unit_id_at(&self.state, at.0, at.1);
        if let Some(unit) = self.state.unit_mut(id) {
            unit.hp = hp;
        }
        self
    }

    /// Place a unit whose special is recharging.
    #[must_use]
    pub fn unit_on_cooldown(
        mut self,
        owner: PlayerId,
        unit_type: UnitType,
        at: (i32, i32),
        facing: Direction,
        cooldown: u32,
    ) -> Self {
        self = self.unit(owner, unit_type, at, facing);
        let id = unit_id_at(&self.state, at.0, at.1);
        if let Some(unit) = self.state.unit_mut(id) {
            unit.special_cooldown = cooldown;
        }
        self
    }

    /// Place a structure.
    #[must_use]
    pub fn structure(
        mut self,
        owner: PlayerId,
        structure_type: StructureType,
        (x, y): (i32, i32),
        spawn_direction: Direction,
    ) -> Self {
        self.state
            .add_structure(owner, structure_type, loc(x, y), spawn_direction)
            .unwrap_or_else(|err| panic!("Cannot place {structure_type:?} at ({x}, {y}): {err}"));
        self
    }

    /// Set a player's resources.
    #[must_use]
    pub fn resources(mut self, player: PlayerId, amount: u32) -> Self {
        if let Some(player) = self.state.player_mut(player) {
            player.resources = amount;
        }
        self
    }

    /// Hand the turn to `player`.
    #[must_use]
    pub fn active(mut self, player: PlayerId) -> Self {
        self.state
            .set_active_player(player)
            .unwrap_or_else(|err| panic!("Cannot activate player {player}: {err}"));
        self
    }

    /// Finish building.
    #[must_use]
    pub fn build(self) -> GameState {
        self.state
    }
}

/// Id of the unit standing on `(x, y)`.
///
/// # Panics
///
/// Panics if no unit is there.
#[must_use]
pub fn unit_id_at(state: &GameState, x: i32, y: i32) -> EntityId {
    state
        .unit_at(loc(x, y))
        .map(|unit| unit.id)
        .unwrap_or_else(|| panic!("No unit at ({x}, {y})"))
}

/// Id of the structure on `(x, y)`.
///
/// # Panics
///
/// Panics if no structure is there.
#[must_use]
pub fn structure_id_at(state: &GameState, x: i32, y: i32) -> EntityId {
    state
        .structure_at(loc(x, y))
        .map(|structure| structure.id)
        .unwrap_or_else(|| panic!("No structure at ({x}, {y})"))
}

/// A 12x12 open duel: one base, one outpost and one soldier per side.
#[must_use]
pub fn duel() -> GameState {
    ScenarioBuilder::open(12, 12)
        .structure(0, StructureType::Base, (1, 1), Direction::East)
        .structure(0, StructureType::Outpost, (1, 4), Direction::East)
        .unit(0, UnitType::Soldier, (2, 2), Direction::East)
        .structure(1, StructureType::Base, (10, 10), Direction::West)
        .structure(1, StructureType::Outpost, (10, 7), Direction::West)
        .unit(1, UnitType::Soldier, (9, 9), Direction::West)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_places_entities() {
        let state = ScenarioBuilder::open(6, 6)
            .unit_with_hp(0, UnitType::Medic, (1, 1), Direction::North, 2)
            .unit_on_cooldown(1, UnitType::Soldier, (4, 4), Direction::South, 3)
            .structure(1, StructureType::Outpost, (5, 5), Direction::West)
            .resources(1, 99)
            .active(1)
            .build();

        assert_eq!(state.unit(unit_id_at(&state, 1, 1)).unwrap().hp, 2);
        assert_eq!(state.unit(unit_id_at(&state, 4, 4)).unwrap().special_cooldown, 3);
        assert_eq!(state.structure(structure_id_at(&state, 5, 5)).unwrap().owner, 1);
        assert_eq!(state.player(1).unwrap().resources, 99);
        assert_eq!(state.active_player(), 1);
    }

    #[test]
    fn test_rows_fixture() {
        let state = ScenarioBuilder::from_rows(&["..#", "...", "#.."]).build();
        assert!(state.map().is_wall(loc(2, 0)));
        assert!(state.map().is_floor(loc(1, 1)));
    }

    #[test]
    #[should_panic(expected = "Cannot place")]
    fn test_builder_panics_on_wall() {
        let _ =
            ScenarioBuilder::from_rows(&["#"]).unit(0, UnitType::Soldier, (0, 0), Direction::North);
    }

    #[test]
    fn test_duel_is_symmetric() {
        let state = duel();
        assert_eq!(state.units_of(0).count(), state.units_of(1).count());
        assert_eq!(state.structures_of(0).count(), state.structures_of(1).count());
    }
}

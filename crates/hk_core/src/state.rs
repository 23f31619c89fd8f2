//! Complete match state.
//!
//! [`GameState`] owns the map, every player, unit and structure. It is a
//! plain value: `clone()` produces an independent deep copy, which is what
//! decision makers use as a scratch world.
//!
//! # Determinism
//!
//! Entities are stored in `BTreeMap`s keyed by id, so every iteration over
//! units or structures happens in ascending id order.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::entity::{EntityId, PlayerId, Structure, StructureType, Unit, UnitType};
use crate::error::{GameError, Result};
use crate::map::{Direction, Map, MapLocation};
use crate::pathfinding::{find_path, NavGrid};

/// Resources every player starts with.
pub const STARTING_RESOURCES: u32 = 20;

/// Default number of rounds before a match is called.
pub const DEFAULT_ROUND_LIMIT: u32 = 200;

/// A seat in the match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Player {
    /// Seat index.
    pub id: PlayerId,
    /// Display name.
    pub name: String,
    /// Spendable resources.
    pub resources: u32,
    /// Points from kills.
    pub score: u32,
    /// Set once the player has lost every base.
    pub eliminated: bool,
}

/// Everything needed to decide and resolve a turn.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GameState {
    round: u32,
    round_limit: u32,
    active_player: PlayerId,
    players: Vec<Player>,
    map: Map,
    units: BTreeMap<EntityId, Unit>,
    structures: BTreeMap<EntityId, Structure>,
    next_entity_id: EntityId,
    /// Entities that already received an order this turn.
    acted: BTreeSet<EntityId>,
    winner: Option<PlayerId>,
    finished: bool,
}

impl GameState {
    /// Create a state with the given seats and no entities. Player 0 moves first.
    pub fn new(map: Map, player_names: &[&str]) -> Result<Self> {
        if player_names.is_empty() {
            return Err(GameError::InvalidMap("a match needs at least one player".into()));
        }
        let players = player_names
            .iter()
            .enumerate()
            .map(|(id, name)| Player {
                id: id as PlayerId,
                name: (*name).to_string(),
                resources: STARTING_RESOURCES,
                score: 0,
                eliminated: false,
            })
            .collect();
        Ok(Self {
            round: 1,
            round_limit: DEFAULT_ROUND_LIMIT,
            active_player: 0,
            players,
            map,
            units: BTreeMap::new(),
            structures: BTreeMap::new(),
            next_entity_id: 0,
            acted: BTreeSet::new(),
            winner: None,
            finished: false,
        })
    }

    /// Set the round after which the match is called.
    #[must_use]
    pub const fn with_round_limit(mut self, round_limit: u32) -> Self {
        self.round_limit = round_limit;
        self
    }

    // ------------------------------------------------------------------------
    // Match bookkeeping
    // ------------------------------------------------------------------------

    /// Current round, starting at 1.
    #[must_use]
    pub const fn round(&self) -> u32 {
        self.round
    }

    /// Last round that will be played.
    #[must_use]
    pub const fn round_limit(&self) -> u32 {
        self.round_limit
    }

    /// Player whose turn it is.
    #[must_use]
    pub const fn active_player(&self) -> PlayerId {
        self.active_player
    }

    /// Hand the turn to `player`.
    pub fn set_active_player(&mut self, player: PlayerId) -> Result<()> {
        if self.player(player).is_none() {
            return Err(GameError::UnknownPlayer(player));
        }
        self.active_player = player;
        Ok(())
    }

    pub(crate) fn advance_round(&mut self) {
        self.round += 1;
    }

    /// Winner, once decided.
    #[must_use]
    pub const fn winner(&self) -> Option<PlayerId> {
        self.winner
    }

    /// True once the match is over.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.finished
    }

    pub(crate) fn finish(&mut self, winner: Option<PlayerId>) {
        self.finished = true;
        self.winner = winner;
    }

    /// All seats.
    #[must_use]
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// Seat by id.
    #[must_use]
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(id as usize)
    }

    /// Mutable seat by id.
    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.get_mut(id as usize)
    }

    /// Static terrain.
    #[must_use]
    pub const fn map(&self) -> &Map {
        &self.map
    }

    // ------------------------------------------------------------------------
    // Entities
    // ------------------------------------------------------------------------

    fn check_free(&self, location: MapLocation) -> Result<()> {
        if !self.map.in_bounds(location) {
            return Err(GameError::OutOfBounds {
                x: location.x,
                y: location.y,
            });
        }
        if !self.map.is_floor(location) || self.is_occupied(location) {
            return Err(GameError::Occupied {
                x: location.x,
                y: location.y,
            });
        }
        Ok(())
    }

    fn allocate_id(&mut self) -> EntityId {
        let id = self.next_entity_id;
        self.next_entity_id += 1;
        id
    }

    /// Place a structure on a free floor tile.
    pub fn add_structure(
        &mut self,
        owner: PlayerId,
        structure_type: StructureType,
        location: MapLocation,
        spawn_direction: Direction,
    ) -> Result<EntityId> {
        if self.player(owner).is_none() {
            return Err(GameError::UnknownPlayer(owner));
        }
        self.check_free(location)?;
        let id = self.allocate_id();
        self.structures.insert(
            id,
            Structure::new(id, owner, structure_type, location, spawn_direction),
        );
        Ok(id)
    }

    /// Place a unit on a free floor tile.
    pub fn add_unit(
        &mut self,
        owner: PlayerId,
        unit_type: UnitType,
        location: MapLocation,
        orientation: Direction,
    ) -> Result<EntityId> {
        if self.player(owner).is_none() {
            return Err(GameError::UnknownPlayer(owner));
        }
        self.check_free(location)?;
        let id = self.allocate_id();
        self.units.insert(
            id,
            Unit::new(id, owner, unit_type, location, orientation),
        );
        Ok(id)
    }

    pub(crate) fn remove_unit(&mut self, id: EntityId) -> Option<Unit> {
        self.units.remove(&id)
    }

    pub(crate) fn remove_structure(&mut self, id: EntityId) -> Option<Structure> {
        self.structures.remove(&id)
    }

    /// All units in id order.
    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.units.values()
    }

    /// All structures in id order.
    pub fn structures(&self) -> impl Iterator<Item = &Structure> {
        self.structures.values()
    }

    /// Unit by id.
    #[must_use]
    pub fn unit(&self, id: EntityId) -> Option<&Unit> {
        self.units.get(&id)
    }

    /// Mutable unit by id.
    pub fn unit_mut(&mut self, id: EntityId) -> Option<&mut Unit> {
        self.units.get_mut(&id)
    }

    /// Structure by id.
    #[must_use]
    pub fn structure(&self, id: EntityId) -> Option<&Structure> {
        self.structures.get(&id)
    }

    /// Mutable structure by id.
    pub fn structure_mut(&mut self, id: EntityId) -> Option<&mut Structure> {
        self.structures.get_mut(&id)
    }

    /// Unit standing on `location`.
    #[must_use]
    pub fn unit_at(&self, location: MapLocation) -> Option<&Unit> {
        self.units.values().find(|unit| unit.location == location)
    }

    /// Structure on `location`.
    #[must_use]
    pub fn structure_at(&self, location: MapLocation) -> Option<&Structure> {
        self.structures
            .values()
            .find(|structure| structure.location == location)
    }

    /// Units controlled by `player`.
    pub fn units_of(&self, player: PlayerId) -> impl Iterator<Item = &Unit> {
        self.units.values().filter(move |unit| unit.owner == player)
    }

    /// Structures controlled by `player`.
    pub fn structures_of(&self, player: PlayerId) -> impl Iterator<Item = &Structure> {
        self.structures
            .values()
            .filter(move |structure| structure.owner == player)
    }

    /// Units not controlled by `player`.
    pub fn enemy_units(&self, player: PlayerId) -> impl Iterator<Item = &Unit> {
        self.units.values().filter(move |unit| unit.owner != player)
    }

    /// Structures not controlled by `player`.
    pub fn enemy_structures(&self, player: PlayerId) -> impl Iterator<Item = &Structure> {
        self.structures
            .values()
            .filter(move |structure| structure.owner != player)
    }

    /// Number of `player`'s units of `unit_type`.
    #[must_use]
    pub fn count_units(&self, player: PlayerId, unit_type: UnitType) -> usize {
        self.units_of(player)
            .filter(|unit| unit.unit_type == unit_type)
            .count()
    }

    /// True if a unit or structure stands on `location`.
    #[must_use]
    pub fn is_occupied(&self, location: MapLocation) -> bool {
        self.unit_at(location).is_some() || self.structure_at(location).is_some()
    }

    /// True if a unit could stand on `location` (floor, no structure), ignoring units.
    #[must_use]
    pub fn is_walkable(&self, location: MapLocation) -> bool {
        self.map.is_floor(location) && self.structure_at(location).is_none()
    }

    // ------------------------------------------------------------------------
    // Turn bookkeeping
    // ------------------------------------------------------------------------

    /// True if `entity` already received an order this turn.
    #[must_use]
    pub fn has_acted(&self, entity: EntityId) -> bool {
        self.acted.contains(&entity)
    }

    pub(crate) fn mark_acted(&mut self, entity: EntityId) {
        self.acted.insert(entity);
    }

    pub(crate) fn clear_acted(&mut self) {
        self.acted.clear();
    }

    pub(crate) fn place_unit(
        &mut self,
        owner: PlayerId,
        unit_type: UnitType,
        location: MapLocation,
        orientation: Direction,
    ) -> EntityId {
        let id = self.allocate_id();
        self.units.insert(
            id,
            Unit::new(id, owner, unit_type, location, orientation),
        );
        id
    }

    // ------------------------------------------------------------------------
    // Spatial queries
    // ------------------------------------------------------------------------

    /// True if `location` is inside `unit`'s vision cone and not hidden behind a wall.
    ///
    /// The cone opens 90 degrees in the facing direction and reaches
    /// `fov_range` tiles forward. The unit's own tile is always visible.
    #[must_use]
    pub fn is_in_field_of_view(&self, unit: &Unit, location: MapLocation) -> bool {
        if location == unit.location {
            return true;
        }
        if !self.map.in_bounds(location) {
            return false;
        }
        let dx = location.x - unit.location.x;
        let dy = location.y - unit.location.y;
        let (forward, lateral) = match unit.orientation {
            Direction::North => (-dy, dx),
            Direction::South => (dy, dx),
            Direction::East => (dx, dy),
            Direction::West => (-dx, dy),
        };
        let range = unit.stats().fov_range as i32;
        if forward < 1 || forward > range || lateral.abs() > forward {
            return false;
        }
        self.has_line_of_sight(unit.location, location)
    }

    /// Every location `unit` can currently see.
    #[must_use]
    pub fn field_of_view(&self, unit: &Unit) -> BTreeSet<MapLocation> {
        self.map
            .area_within(unit.location, unit.stats().fov_range, true)
            .into_iter()
            .filter(|&location| self.is_in_field_of_view(unit, location))
            .collect()
    }

    /// Check that no wall lies strictly between `from` and `to`.
    ///
    /// Uses Bresenham stepping through grid cells.
    #[must_use]
    pub fn has_line_of_sight(&self, from: MapLocation, to: MapLocation) -> bool {
        let dx = (to.x - from.x).abs();
        let dy = (to.y - from.y).abs();
        let sx = if from.x < to.x { 1 } else { -1 };
        let sy = if from.y < to.y { 1 } else { -1 };
        let mut err = dx - dy;
        let mut x = from.x;
        let mut y = from.y;

        loop {
            let current = MapLocation::new(x, y);
            if current == to {
                return true;
            }
            if current != from && self.map.is_wall(current) {
                return false;
            }
            let e2 = 2 * err;
            if e2 > -dy {
                err -= dy;
                x += sx;
            }
            if e2 < dx {
                err += dx;
                y += sy;
            }
        }
    }

    /// Shortest walkable route from `from` to `to`, excluding `from`.
    ///
    /// Walls and structures block, units do not. Empty when unreachable or
    /// when `from == to`.
    #[must_use]
    pub fn find_path(&self, from: MapLocation, to: MapLocation) -> Vec<MapLocation> {
        let grid = NavGrid::from_state(self);
        find_path(&grid, from, to)
    }
}

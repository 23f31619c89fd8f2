//! Seeded match setup: terrain, bases, outposts and starting units.
//!
//! Generates balanced starting positions with:
//! - Symmetric wall scattering
//! - One base per player in a corner, spawning toward the map centre
//! - One outpost per player between its base and the centre
//! - Cleared spawn zones and corridors so every base can reach the centre

use std::path::Path;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::entity::{PlayerId, StructureType, UnitType};
use crate::error::{GameError, Result};
use crate::map::{Direction, Map, MapLocation, Tile};
use crate::state::{GameState, DEFAULT_ROUND_LIMIT};

/// Chebyshev radius kept free of walls around each base.
const SPAWN_SAFE_RADIUS: u32 = 3;

/// Smallest supported side length.
const MIN_SIDE: u32 = 10;

/// Symmetry mode for wall placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SymmetryMode {
    /// 180-degree rotational symmetry (standard for 1v1).
    #[default]
    Rotational,
    /// Mirrored on both axes (for 3-4 players).
    FourWay,
}

/// Configuration for match generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Map width in tiles.
    pub width: u32,
    /// Map height in tiles.
    pub height: u32,
    /// Number of seats, 1 to 4.
    pub players: u32,
    /// Chance for each tile to become a wall (0.0 = open).
    pub wall_density: f32,
    /// Symmetry mode for fair starts.
    pub symmetry: SymmetryMode,
    /// Last round before the match is called.
    pub round_limit: u32,
    /// Random seed for deterministic generation.
    pub seed: u64,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            width: 16,
            height: 16,
            players: 2,
            wall_density: 0.12,
            symmetry: SymmetryMode::Rotational,
            round_limit: DEFAULT_ROUND_LIMIT,
            seed: 12345,
        }
    }
}

impl MapConfig {
    /// Create a small 1v1 map.
    #[must_use]
    pub fn small() -> Self {
        Self {
            width: 12,
            height: 12,
            ..Default::default()
        }
    }

    /// Create a medium 1v1 map.
    #[must_use]
    pub fn medium() -> Self {
        Self {
            width: 24,
            height: 24,
            ..Default::default()
        }
    }

    /// Set the random seed.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the number of seats. Four-way symmetry is used above two.
    #[must_use]
    pub const fn with_players(mut self, players: u32) -> Self {
        self.players = players;
        self.symmetry = if players > 2 {
            SymmetryMode::FourWay
        } else {
            SymmetryMode::Rotational
        };
        self
    }

    /// Set wall density.
    #[must_use]
    pub fn with_wall_density(mut self, density: f32) -> Self {
        self.wall_density = density.clamp(0.0, 1.0);
        self
    }

    /// Set the round limit.
    #[must_use]
    pub const fn with_round_limit(mut self, round_limit: u32) -> Self {
        self.round_limit = round_limit;
        self
    }

    /// Load a configuration from a RON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        Self::from_ron_str(&content).map_err(|err| match err {
            GameError::DataParseError { message, .. } => GameError::DataParseError {
                path: path.display().to_string(),
                message,
            },
            other => other,
        })
    }

    /// Parse a configuration from a RON string.
    pub fn from_ron_str(content: &str) -> Result<Self> {
        let config: Self = ron::from_str(content).map_err(|err| GameError::DataParseError {
            path: "<inline>".to_string(),
            message: err.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check that a match can be generated from this configuration.
    pub fn validate(&self) -> Result<()> {
        if self.width < MIN_SIDE || self.height < MIN_SIDE {
            return Err(GameError::InvalidMap(format!(
                "map must be at least {MIN_SIDE}x{MIN_SIDE}, got {}x{}",
                self.width, self.height
            )));
        }
        if !(1..=4).contains(&self.players) {
            return Err(GameError::InvalidMap(format!(
                "player count must be 1-4, got {}",
                self.players
            )));
        }
        if !(0.0..=1.0).contains(&self.wall_density) {
            return Err(GameError::InvalidMap(format!(
                "wall density must be within 0.0-1.0, got {}",
                self.wall_density
            )));
        }
        Ok(())
    }
}

/// Base corners in seat order: top-left, bottom-right, top-right, bottom-left.
fn base_corner(config: &MapConfig, player: PlayerId) -> MapLocation {
    let right = config.width as i32 - 2;
    let bottom = config.height as i32 - 2;
    match player {
        0 => MapLocation::new(1, 1),
        1 => MapLocation::new(right, bottom),
        2 => MapLocation::new(right, 1),
        _ => MapLocation::new(1, bottom),
    }
}

fn centre(config: &MapConfig) -> MapLocation {
    MapLocation::new(config.width as i32 / 2, config.height as i32 / 2)
}

/// Images of `location` under the configured symmetry, including itself.
fn symmetric_images(config: &MapConfig, location: MapLocation) -> Vec<MapLocation> {
    let mirror_x = config.width as i32 - 1 - location.x;
    let mirror_y = config.height as i32 - 1 - location.y;
    match config.symmetry {
        SymmetryMode::Rotational => vec![location, MapLocation::new(mirror_x, mirror_y)],
        SymmetryMode::FourWay => vec![
            location,
            MapLocation::new(mirror_x, location.y),
            MapLocation::new(location.x, mirror_y),
            MapLocation::new(mirror_x, mirror_y),
        ],
    }
}

fn scatter_walls(config: &MapConfig, map: &mut Map, rng: &mut ChaCha8Rng) {
    let locations: Vec<MapLocation> = map.locations().collect();
    for location in locations {
        // Only roll for the first image of each symmetric group.
        let images = symmetric_images(config, location);
        if images.iter().any(|image| *image < location) {
            continue;
        }
        if rng.gen::<f32>() < config.wall_density {
            for image in images {
                map.set_tile(image, Tile::Wall);
            }
        }
    }
}

/// Turn `location` and its symmetric images into floor.
fn clear_tile(config: &MapConfig, map: &mut Map, location: MapLocation) {
    for image in symmetric_images(config, location) {
        map.set_tile(image, Tile::Floor);
    }
}

fn clear_area(config: &MapConfig, map: &mut Map, center: MapLocation, radius: u32) {
    for location in map.area_within(center, radius, true) {
        clear_tile(config, map, location);
    }
}

/// Clear an L-shaped corridor from `from` to `to`: along the row, then the column.
fn clear_corridor(config: &MapConfig, map: &mut Map, from: MapLocation, to: MapLocation) {
    let (x0, x1) = (from.x.min(to.x), from.x.max(to.x));
    for x in x0..=x1 {
        clear_tile(config, map, MapLocation::new(x, from.y));
    }
    let (y0, y1) = (from.y.min(to.y), from.y.max(to.y));
    for y in y0..=y1 {
        clear_tile(config, map, MapLocation::new(to.x, y));
    }
}

/// Generate a ready-to-play match from `config`.
///
/// The same configuration always produces the same state.
pub fn generate_match(config: &MapConfig) -> Result<GameState> {
    config.validate()?;
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let mut map = Map::new(config.width as i32, config.height as i32)?;

    scatter_walls(config, &mut map, &mut rng);

    let centre = centre(config);
    let seats: Vec<PlayerId> = (0..config.players).collect();
    for &player in &seats {
        let base = base_corner(config, player);
        clear_area(config, &mut map, base, SPAWN_SAFE_RADIUS);
        clear_corridor(config, &mut map, base, centre);
        let outpost = outpost_location(base, centre);
        clear_area(config, &mut map, outpost, 1);
    }

    let names: Vec<String> = seats.iter().map(|seat| format!("Player {seat}")).collect();
    let name_refs: Vec<&str> = names.iter().map(String::as_str).collect();
    let mut state = GameState::new(map, &name_refs)?.with_round_limit(config.round_limit);

    for &player in &seats {
        let base = base_corner(config, player);
        let facing = base.direction_to(centre).unwrap_or(Direction::South);
        state.add_structure(player, StructureType::Base, base, facing)?;

        let outpost = outpost_location(base, centre);
        let outpost_facing = outpost.direction_to(centre).unwrap_or(facing);
        state.add_structure(player, StructureType::Outpost, outpost, outpost_facing)?;

        let step_x = (centre.x - base.x).signum();
        let step_y = (centre.y - base.y).signum();
        let soldier = MapLocation::new(base.x + step_x, base.y + step_y);
        state.add_unit(player, UnitType::Soldier, soldier, facing)?;
    }

    tracing::debug!(
        "Generated {}x{} match for {} players (seed {})",
        config.width,
        config.height,
        config.players,
        config.seed
    );
    Ok(state)
}

/// Outposts sit three rows from their base, toward the centre.
fn outpost_location(base: MapLocation, centre: MapLocation) -> MapLocation {
    let step_y = (centre.y - base.y).signum();
    MapLocation::new(base.x, base.y + 3 * step_y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_match() {
        let config = MapConfig::small().with_seed(7);
        let a = generate_match(&config).unwrap();
        let b = generate_match(&config).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_seeds_differ() {
        let config = MapConfig::medium().with_wall_density(0.3);
        let a = generate_match(&config.clone().with_seed(1)).unwrap();
        let b = generate_match(&config.with_seed(2)).unwrap();
        assert_ne!(a.map(), b.map());
    }

    #[test]
    fn test_every_player_has_base_outpost_and_soldier() {
        let state = generate_match(&MapConfig::small().with_players(4)).unwrap();
        assert_eq!(state.players().len(), 4);
        for player in 0..4 {
            let kinds: Vec<StructureType> = state
                .structures_of(player)
                .map(|structure| structure.structure_type)
                .collect();
            assert_eq!(kinds, vec![StructureType::Base, StructureType::Outpost]);
            assert_eq!(state.count_units(player, UnitType::Soldier), 1);
        }
    }

    #[test]
    fn test_spawn_tiles_are_free() {
        let state = generate_match(&MapConfig::medium().with_wall_density(0.4)).unwrap();
        for structure in state.structures() {
            let spawn = structure.spawn_location();
            assert!(state.is_walkable(spawn), "spawn tile {spawn} blocked");
            assert!(state.unit_at(spawn).is_none());
        }
    }

    #[test]
    fn test_walls_are_rotationally_symmetric() {
        let config = MapConfig::medium().with_wall_density(0.3).with_seed(99);
        let state = generate_match(&config).unwrap();
        let map = state.map();
        for location in map.locations() {
            let image =
                MapLocation::new(map.width() - 1 - location.x, map.height() - 1 - location.y);
            assert_eq!(map.tile(location), map.tile(image));
        }
    }

    #[test]
    fn test_bases_are_connected() {
        let state = generate_match(&MapConfig::medium().with_wall_density(0.5)).unwrap();
        let soldier = state.units_of(0).next().unwrap().location;
        let enemy_spawn = state.structures_of(1).next().unwrap().spawn_location();
        assert!(!state.find_path(soldier, enemy_spawn).is_empty());
    }

    #[test]
    fn test_rejects_tiny_maps() {
        let config = MapConfig {
            width: 4,
            ..MapConfig::default()
        };
        assert!(matches!(generate_match(&config), Err(GameError::InvalidMap(_))));
    }

    #[test]
    fn test_config_from_ron() {
        let config = MapConfig::from_ron_str("(width: 20, players: 3, seed: 5)").unwrap();
        assert_eq!(config.width, 20);
        assert_eq!(config.height, 16);
        assert_eq!(config.players, 3);
        assert!(MapConfig::from_ron_str("(players: 9)").is_err());
        assert!(MapConfig::from_ron_str("(width: ").is_err());
    }
}

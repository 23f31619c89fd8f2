//! Tile map, locations and facing directions.
//!
//! The map is a fixed grid of [`Tile`]s addressed by [`MapLocation`]. Units
//! and structures live in [`crate::state::GameState`], not in the map, so a
//! map never changes during a match.

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};

/// A tile coordinate. `x` grows to the east, `y` grows to the south.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct MapLocation {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
}

impl MapLocation {
    /// Create a new location.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Manhattan distance between two locations.
    #[must_use]
    pub const fn manhattan_distance(self, other: Self) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// The neighbouring location one step in `direction`.
    #[must_use]
    pub const fn step(self, direction: Direction) -> Self {
        let (dx, dy) = direction.offset();
        Self::new(self.x + dx, self.y + dy)
    }

    /// The direction that best points from `self` towards `other`.
    ///
    /// The axis with the larger offset wins; equal offsets prefer the
    /// horizontal axis. Returns `None` when both locations are equal.
    #[must_use]
    pub fn direction_to(self, other: Self) -> Option<Direction> {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        if dx == 0 && dy == 0 {
            return None;
        }
        if dx.abs() >= dy.abs() {
            Some(if dx > 0 {
                Direction::East
            } else {
                Direction::West
            })
        } else {
            Some(if dy > 0 {
                Direction::South
            } else {
                Direction::North
            })
        }
    }

    /// Returns the direction of `other` if it is exactly one orthogonal step away.
    #[must_use]
    pub fn adjacent_direction(self, other: Self) -> Option<Direction> {
        Direction::ALL
            .into_iter()
            .find(|&direction| self.step(direction) == other)
    }
}

impl std::fmt::Display for MapLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Orthogonal facing / movement directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Direction {
    /// Towards negative `y`.
    #[default]
    North,
    /// Towards positive `x`.
    East,
    /// Towards positive `y`.
    South,
    /// Towards negative `x`.
    West,
}

impl Direction {
    /// All directions in clockwise order starting at north.
    pub const ALL: [Self; 4] = [Self::North, Self::East, Self::South, Self::West];

    /// Unit offset `(dx, dy)` for this direction.
    #[must_use]
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Self::North => (0, -1),
            Self::East => (1, 0),
            Self::South => (0, 1),
            Self::West => (-1, 0),
        }
    }

    /// The direction after a quarter turn.
    #[must_use]
    pub const fn rotated(self, clockwise: bool) -> Self {
        match (self, clockwise) {
            (Self::North, true) | (Self::South, false) => Self::East,
            (Self::East, true) | (Self::West, false) => Self::South,
            (Self::South, true) | (Self::North, false) => Self::West,
            (Self::West, true) | (Self::East, false) => Self::North,
        }
    }

    /// The quarter turn that brings `self` closest to `target`.
    ///
    /// Returns `None` if already facing `target`, `Some(true)` for a
    /// clockwise turn and `Some(false)` for a counter-clockwise turn. A
    /// half turn starts clockwise.
    #[must_use]
    pub fn rotation_towards(self, target: Self) -> Option<bool> {
        if self == target {
            None
        } else if self.rotated(false) == target {
            Some(false)
        } else {
            Some(true)
        }
    }
}

/// Static terrain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Tile {
    /// Open ground.
    #[default]
    Floor,
    /// Impassable, blocks line of sight.
    Wall,
}

/// Rectangular tile grid.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Map {
    width: i32,
    height: i32,
    /// Row-major tile data.
    tiles: Vec<Tile>,
}

impl Map {
    /// Create an all-floor map.
    pub fn new(width: i32, height: i32) -> Result<Self> {
        if width <= 0 || height <= 0 {
            return Err(GameError::InvalidMap(format!(
                "dimensions must be positive, got {width}x{height}"
            )));
        }
        Ok(Self {
            width,
            height,
            tiles: vec![Tile::Floor; (width * height) as usize],
        })
    }

    /// Parse a map from text rows, `#` for walls and anything else for floor.
    ///
    /// All rows must have the same length.
    pub fn from_rows(rows: &[&str]) -> Result<Self> {
        let height = rows.len() as i32;
        let width = rows.first().map_or(0, |row| row.chars().count()) as i32;
        let mut map = Self::new(width, height)?;
        for (y, row) in rows.iter().enumerate() {
            if row.chars().count() as i32 != width {
                return Err(GameError::InvalidMap(format!(
                    "row {y} has {} tiles, expected {width}",
                    row.chars().count()
                )));
            }
            for (x, c) in row.chars().enumerate() {
                if c == '#' {
                    map.set_tile(MapLocation::new(x as i32, y as i32), Tile::Wall);
                }
            }
        }
        Ok(map)
    }

    /// Map width in tiles.
    #[must_use]
    pub const fn width(&self) -> i32 {
        self.width
    }

    /// Map height in tiles.
    #[must_use]
    pub const fn height(&self) -> i32 {
        self.height
    }

    #[inline]
    fn index(&self, location: MapLocation) -> usize {
        (location.y * self.width + location.x) as usize
    }

    /// Check if a location is on the map.
    #[must_use]
    pub const fn in_bounds(&self, location: MapLocation) -> bool {
        location.x >= 0 && location.y >= 0 && location.x < self.width && location.y < self.height
    }

    /// Tile at `location`, or `None` if out of bounds.
    #[must_use]
    pub fn tile(&self, location: MapLocation) -> Option<Tile> {
        self.in_bounds(location)
            .then(|| self.tiles[self.index(location)])
    }

    /// Replace the tile at `location`. Returns `false` if out of bounds.
    pub fn set_tile(&mut self, location: MapLocation, tile: Tile) -> bool {
        if self.in_bounds(location) {
            let index = self.index(location);
            self.tiles[index] = tile;
            true
        } else {
            false
        }
    }

    /// True if the tile at `location` is a wall.
    #[must_use]
    pub fn is_wall(&self, location: MapLocation) -> bool {
        self.tile(location) == Some(Tile::Wall)
    }

    /// True if the location is on the map and is floor.
    #[must_use]
    pub fn is_floor(&self, location: MapLocation) -> bool {
        self.tile(location) == Some(Tile::Floor)
    }

    /// The 3x3 neighbourhood of `center`, clipped to the map.
    #[must_use]
    pub fn area_around(&self, center: MapLocation, include_center: bool) -> Vec<MapLocation> {
        self.area_within(center, 1, include_center)
    }

    /// All locations within Chebyshev distance `radius` of `center`, clipped
    /// to the map, in row-major order.
    #[must_use]
    pub fn area_within(
        &self,
        center: MapLocation,
        radius: u32,
        include_center: bool,
    ) -> Vec<MapLocation> {
        let r = radius as i32;
        let mut area = Vec::with_capacity(((2 * r + 1) * (2 * r + 1)) as usize);
        for y in (center.y - r)..=(center.y + r) {
            for x in (center.x - r)..=(center.x + r) {
                let location = MapLocation::new(x, y);
                if !self.in_bounds(location) || (!include_center && location == center) {
                    continue;
                }
                area.push(location);
            }
        }
        area
    }

    /// Iterate every location in row-major order.
    pub fn locations(&self) -> impl Iterator<Item = MapLocation> + '_ {
        (0..self.height).flat_map(move |y| (0..self.width).map(move |x| MapLocation::new(x, y)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manhattan_distance() {
        let a = MapLocation::new(1, 1);
        assert_eq!(a.manhattan_distance(MapLocation::new(4, 3)), 5);
        assert_eq!(a.manhattan_distance(a), 0);
        assert_eq!(a.manhattan_distance(MapLocation::new(-1, 0)), 3);
    }

    #[test]
    fn test_direction_to_prefers_dominant_axis() {
        let origin = MapLocation::new(5, 5);
        assert_eq!(origin.direction_to(MapLocation::new(9, 6)), Some(Direction::East));
        assert_eq!(origin.direction_to(MapLocation::new(4, 1)), Some(Direction::North));
        assert_eq!(origin.direction_to(MapLocation::new(2, 2)), Some(Direction::West));
        assert_eq!(origin.direction_to(origin), None);
    }

    #[test]
    fn test_rotation_towards_takes_shortest_turn() {
        assert_eq!(Direction::North.rotation_towards(Direction::North), None);
        assert_eq!(Direction::North.rotation_towards(Direction::East), Some(true));
        assert_eq!(Direction::North.rotation_towards(Direction::West), Some(false));
        assert_eq!(Direction::North.rotation_towards(Direction::South), Some(true));
    }

    #[test]
    fn test_rotated_cycles() {
        for direction in Direction::ALL {
            let mut d = direction;
            for _ in 0..4 {
                d = d.rotated(true);
            }
            assert_eq!(d, direction);
            assert_eq!(direction.rotated(true).rotated(false), direction);
        }
    }

    #[test]
    fn test_from_rows() {
        let map = Map::from_rows(&["..#", "#..", "..."]).unwrap();
        assert_eq!(map.width(), 3);
        assert_eq!(map.height(), 3);
        assert!(map.is_wall(MapLocation::new(2, 0)));
        assert!(map.is_wall(MapLocation::new(0, 1)));
        assert!(map.is_floor(MapLocation::new(1, 1)));
        assert!(!map.is_floor(MapLocation::new(3, 0)));
    }

    #[test]
    fn test_from_rows_rejects_ragged_rows() {
        assert!(Map::from_rows(&["...", ".."]).is_err());
        assert!(Map::from_rows(&[]).is_err());
    }

    #[test]
    fn test_area_around_clips_to_bounds() {
        let map = Map::new(5, 5).unwrap();
        assert_eq!(map.area_around(MapLocation::new(2, 2), true).len(), 9);
        assert_eq!(map.area_around(MapLocation::new(2, 2), false).len(), 8);
        let corner = map.area_around(MapLocation::new(0, 0), false);
        assert_eq!(corner.len(), 3);
        assert!(!corner.contains(&MapLocation::new(0, 0)));
    }

    #[test]
    fn test_adjacent_direction() {
        let a = MapLocation::new(3, 3);
        assert_eq!(a.adjacent_direction(MapLocation::new(3, 2)), Some(Direction::North));
        assert_eq!(a.adjacent_direction(MapLocation::new(4, 4)), None);
        assert_eq!(a.adjacent_direction(a), None);
    }
}

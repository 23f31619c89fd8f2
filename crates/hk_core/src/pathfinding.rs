//! Grid-based pathfinding using the A* algorithm.
//!
//! Movement is 4-connected with unit cost per step, so the Manhattan
//! distance is an exact lower bound. Ties in the open set are broken on
//! coordinates to keep routes identical across runs.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use serde::{Deserialize, Serialize};

use crate::map::{Direction, MapLocation};
use crate::state::GameState;

/// Cell types for the navigation grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CellType {
    /// Open floor.
    #[default]
    Walkable,
    /// Wall or structure.
    Blocked,
}

/// Navigation grid for pathfinding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavGrid {
    width: i32,
    height: i32,
    /// Cell data stored in row-major order.
    cells: Vec<CellType>,
}

impl NavGrid {
    /// Create a grid with every cell walkable.
    ///
    /// # Panics
    ///
    /// Panics if `width` or `height` is not positive.
    #[must_use]
    pub fn new(width: i32, height: i32) -> Self {
        assert!(width > 0, "NavGrid width must be positive");
        assert!(height > 0, "NavGrid height must be positive");
        Self {
            width,
            height,
            cells: vec![CellType::Walkable; (width * height) as usize],
        }
    }

    /// Build a grid from a state: walls and structures are blocked, units are ignored.
    #[must_use]
    pub fn from_state(state: &GameState) -> Self {
        let map = state.map();
        let mut grid = Self::new(map.width(), map.height());
        for location in map.locations() {
            if map.is_wall(location) {
                grid.set_cell(location, CellType::Blocked);
            }
        }
        for structure in state.structures() {
            grid.set_cell(structure.location, CellType::Blocked);
        }
        grid
    }

    #[inline]
    fn index(&self, location: MapLocation) -> usize {
        (location.y * self.width + location.x) as usize
    }

    /// Check if a location is within grid bounds.
    #[must_use]
    pub const fn in_bounds(&self, location: MapLocation) -> bool {
        location.x >= 0 && location.y >= 0 && location.x < self.width && location.y < self.height
    }

    /// Set the cell type. Returns `false` if out of bounds.
    pub fn set_cell(&mut self, location: MapLocation, cell_type: CellType) -> bool {
        if self.in_bounds(location) {
            let index = self.index(location);
            self.cells[index] = cell_type;
            true
        } else {
            false
        }
    }

    /// Check if a cell is walkable. Out-of-bounds cells are not.
    #[must_use]
    pub fn is_walkable(&self, location: MapLocation) -> bool {
        self.in_bounds(location) && self.cells[self.index(location)] == CellType::Walkable
    }
}

/// A node in the A* open set priority queue.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
struct AStarNode {
    location: MapLocation,
    /// g_score + heuristic.
    f_score: u32,
    /// Tie-breaker for determinism: lower coordinates first.
    tie_breaker: u64,
}

impl Ord for AStarNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap, reverse for min-heap behavior.
        match other.f_score.cmp(&self.f_score) {
            Ordering::Equal => other.tie_breaker.cmp(&self.tie_breaker),
            ord => ord,
        }
    }
}

impl PartialOrd for AStarNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[inline]
fn coords_to_tie_breaker(location: MapLocation) -> u64 {
    ((location.y as u64) << 32) | (location.x as u32 as u64)
}

/// Find a route from `start` to `goal`.
///
/// The returned route excludes `start` and ends at `goal`. It is empty if
/// either end is off the grid, the goal is blocked, no route exists, or
/// `start == goal`. The start cell itself may be blocked.
#[must_use]
pub fn find_path(grid: &NavGrid, start: MapLocation, goal: MapLocation) -> Vec<MapLocation> {
    if start == goal || !grid.in_bounds(start) || !grid.is_walkable(goal) {
        return Vec::new();
    }

    let mut open_set: BinaryHeap<AStarNode> = BinaryHeap::new();
    let mut came_from: HashMap<MapLocation, MapLocation> = HashMap::new();
    let mut g_score: HashMap<MapLocation, u32> = HashMap::new();

    g_score.insert(start, 0);
    open_set.push(AStarNode {
        location: start,
        f_score: start.manhattan_distance(goal),
        tie_breaker: coords_to_tie_breaker(start),
    });

    while let Some(current) = open_set.pop() {
        if current.location == goal {
            return reconstruct_path(&came_from, start, goal);
        }

        let current_g = g_score.get(&current.location).copied().unwrap_or(u32::MAX);

        for direction in Direction::ALL {
            let neighbor = current.location.step(direction);
            if !grid.is_walkable(neighbor) {
                continue;
            }

            let tentative_g = current_g + 1;
            let neighbor_g = g_score.get(&neighbor).copied().unwrap_or(u32::MAX);

            if tentative_g < neighbor_g {
                came_from.insert(neighbor, current.location);
                g_score.insert(neighbor, tentative_g);
                open_set.push(AStarNode {
                    location: neighbor,
                    f_score: tentative_g + neighbor.manhattan_distance(goal),
                    tie_breaker: coords_to_tie_breaker(neighbor),
                });
            }
        }
    }

    Vec::new()
}

/// Reconstruct the route from the came_from map, dropping the start.
fn reconstruct_path(
    came_from: &HashMap<MapLocation, MapLocation>,
    start: MapLocation,
    goal: MapLocation,
) -> Vec<MapLocation> {
    let mut path = vec![goal];
    let mut current = goal;

    while let Some(&prev) = came_from.get(&current) {
        if prev == start {
            break;
        }
        path.push(prev);
        current = prev;
    }

    path.reverse();
    path
}

//! # HunterKiller Core
//!
//! Game model and reference rules engine for HunterKiller matches.
//!
//! This crate contains **only** game logic:
//! - No rendering
//! - No network transport
//! - No system randomness (map generation takes an explicit seed)
//!
//! Decision makers depend on the [`rules::RulesEngine`] contract and on
//! [`state::GameState`] being a cloneable value, so any alternative rules
//! implementation or test double can stand in for [`rules::StandardRules`].
//!
//! ## Crate Structure
//!
//! - [`map`] - Tiles, locations and directions
//! - [`entity`] - Units, structures and their stats
//! - [`order`] - Orders and per-turn actions
//! - [`state`] - Complete match state, field of view and line of sight
//! - [`rules`] - Order legality, effects and turn resolution
//! - [`pathfinding`] - A* on the tile grid
//! - [`map_generation`] - Seeded match setup

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod entity;
pub mod error;
pub mod map;
pub mod map_generation;
pub mod order;
pub mod pathfinding;
pub mod rules;
pub mod state;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::entity::{
        EntityId, PlayerId, SpecialAbility, Structure, StructureType, Unit, UnitStats, UnitType,
    };
    pub use crate::error::{GameError, Result};
    pub use crate::map::{Direction, Map, MapLocation, Tile};
    pub use crate::map_generation::{generate_match, MapConfig};
    pub use crate::order::{Action, Order, OrderKind};
    pub use crate::rules::{Diagnostics, OrderError, RulesEngine, StandardRules, TurnReport};
    pub use crate::state::{GameState, Player};
}

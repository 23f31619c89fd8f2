//! Orders and the per-turn action that carries them.

use serde::{Deserialize, Serialize};

use crate::entity::{EntityId, PlayerId, UnitType};
use crate::map::{Direction, MapLocation};

/// What an order asks an entity to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderKind {
    /// A structure produces a unit on its spawn tile.
    Spawn {
        /// Producing structure.
        structure: EntityId,
        /// Unit to produce.
        unit_type: UnitType,
    },
    /// A unit steps one tile.
    Move {
        /// Moving unit.
        unit: EntityId,
        /// Step direction.
        direction: Direction,
    },
    /// A unit turns a quarter.
    Rotate {
        /// Turning unit.
        unit: EntityId,
        /// `true` for clockwise.
        clockwise: bool,
    },
    /// A unit attacks a location, optionally with its special.
    Attack {
        /// Attacking unit.
        unit: EntityId,
        /// Target tile.
        target: MapLocation,
        /// Use the special attack instead of the basic one.
        special: bool,
    },
}

impl OrderKind {
    /// The entity this order is for.
    #[must_use]
    pub const fn entity(&self) -> EntityId {
        match *self {
            Self::Spawn { structure, .. } => structure,
            Self::Move { unit, .. } | Self::Rotate { unit, .. } | Self::Attack { unit, .. } => {
                unit
            }
        }
    }
}

/// A single instruction with its position in the turn's action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Order {
    /// Position in the action; assigned when the order is committed.
    pub index: usize,
    /// The instruction.
    pub kind: OrderKind,
}

impl Order {
    /// Create an order that has not been committed yet.
    #[must_use]
    pub const fn new(kind: OrderKind) -> Self {
        Self { index: 0, kind }
    }

    /// The entity this order is for.
    #[must_use]
    pub const fn entity(&self) -> EntityId {
        self.kind.entity()
    }
}

/// One player's full submission for one turn.
///
/// Orders are replayed in insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Action {
    /// Submitting player.
    pub player: PlayerId,
    /// Round the action was made for.
    pub round: u32,
    orders: Vec<Order>,
}

impl Action {
    /// Create an empty action.
    #[must_use]
    pub const fn new(player: PlayerId, round: u32) -> Self {
        Self {
            player,
            round,
            orders: Vec::new(),
        }
    }

    /// Append an order.
    pub fn add_order(&mut self, order: Order) {
        self.orders.push(order);
    }

    /// Committed orders in execution order.
    #[must_use]
    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    /// Number of orders.
    #[must_use]
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    /// True if no orders were committed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// True if some order already targets `entity`.
    #[must_use]
    pub fn has_order_for(&self, entity: EntityId) -> bool {
        self.orders.iter().any(|order| order.entity() == entity)
    }
}

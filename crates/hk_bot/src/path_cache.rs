//! Per-unit routes that survive between turns.
//!
//! A unit with no entry has never planned or its route went stale. An entry
//! holding an empty route is a different state from no entry at all.

use std::collections::{HashMap, VecDeque};

use hk_core::entity::EntityId;
use hk_core::map::MapLocation;

/// Cached routes keyed by unit id.
#[derive(Debug, Clone, Default)]
pub struct PathCache {
    routes: HashMap<EntityId, VecDeque<MapLocation>>,
}

impl PathCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached route for `unit`, if any.
    #[must_use]
    pub fn get(&self, unit: EntityId) -> Option<&VecDeque<MapLocation>> {
        self.routes.get(&unit)
    }

    /// Store a route, replacing any previous one.
    pub fn set(&mut self, unit: EntityId, route: impl IntoIterator<Item = MapLocation>) {
        self.routes.insert(unit, route.into_iter().collect());
    }

    /// Forget the route of `unit`.
    pub fn clear(&mut self, unit: EntityId) {
        self.routes.remove(&unit);
    }

    /// Number of units with a cached route.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// True if no unit has a cached route.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Bring the route of `unit` in line with where the unit actually stands.
    ///
    /// If the route's first step is `current` it is consumed. If `current`
    /// appears further along, everything up to and including it is dropped.
    /// Otherwise the unit has left its route and the entry is cleared.
    /// Returns the remaining route, if the entry survived.
    pub fn advance(
        &mut self,
        unit: EntityId,
        current: MapLocation,
    ) -> Option<&VecDeque<MapLocation>> {
        let route = self.routes.get_mut(&unit)?;
        match route.iter().position(|&step| step == current) {
            Some(index) => {
                route.drain(..=index);
            }
            None => {
                tracing::trace!("Route of unit {} is stale at {}, clearing", unit, current);
                self.routes.remove(&unit);
                return None;
            }
        }
        self.routes.get(&unit)
    }
}

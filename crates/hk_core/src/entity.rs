//! Structures, units and their static stats.

use serde::{Deserialize, Serialize};

use crate::map::{Direction, MapLocation};

/// Identifier of a seat in the match.
pub type PlayerId = u32;

/// Stable identifier of a unit or structure. Never reused within a match.
pub type EntityId = u64;

// ============================================================================
// Units
// ============================================================================

/// Playable unit kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum UnitType {
    /// Ranged attacker with a grenade special.
    Soldier,
    /// Healer; its special restores a unit's hit points.
    Medic,
    /// Cheap melee unit whose kills rise again as infected.
    Infected,
}

/// What a unit's special attack does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialAbility {
    /// Damages every unit in a square blast around the target.
    Grenade {
        /// Damage dealt to each unit in the blast.
        damage: u32,
        /// Chebyshev radius of the blast.
        radius: u32,
    },
    /// Restores hit points of the unit at the target.
    Heal {
        /// Hit points restored, capped at the target's maximum.
        amount: u32,
    },
    /// Passive: units killed by this unit's attack become infected.
    Infection,
}

/// Static per-type numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitStats {
    /// Maximum hit points.
    pub max_hp: u32,
    /// Manhattan attack range.
    pub attack_range: u32,
    /// Forward reach of the field-of-view cone.
    pub fov_range: u32,
    /// Basic attack damage.
    pub damage: u32,
    /// Special attack.
    pub special: SpecialAbility,
    /// Rounds before the special can be used again.
    pub special_cooldown: u32,
    /// Resources required to spawn.
    pub cost: u32,
}

impl UnitType {
    /// All unit types.
    pub const ALL: [Self; 3] = [Self::Soldier, Self::Medic, Self::Infected];

    /// Stats table.
    #[must_use]
    pub const fn stats(self) -> UnitStats {
        match self {
            Self::Soldier => UnitStats {
                max_hp: 10,
                attack_range: 4,
                fov_range: 5,
                damage: 3,
                special: SpecialAbility::Grenade {
                    damage: 4,
                    radius: 1,
                },
                special_cooldown: 5,
                cost: 10,
            },
            Self::Medic => UnitStats {
                max_hp: 6,
                attack_range: 3,
                fov_range: 4,
                damage: 1,
                special: SpecialAbility::Heal { amount: 3 },
                special_cooldown: 3,
                cost: 10,
            },
            Self::Infected => UnitStats {
                max_hp: 8,
                attack_range: 1,
                fov_range: 3,
                damage: 4,
                special: SpecialAbility::Infection,
                special_cooldown: 0,
                cost: 5,
            },
        }
    }

    /// True if this type's special can be ordered (it is not passive).
    #[must_use]
    pub const fn has_active_special(self) -> bool {
        !matches!(self.stats().special, SpecialAbility::Infection)
    }

    /// True for the healer role.
    #[must_use]
    pub const fn is_healer(self) -> bool {
        matches!(self.stats().special, SpecialAbility::Heal { .. })
    }
}

/// A mobile unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Unit {
    /// Stable id.
    pub id: EntityId,
    /// Controlling player.
    pub owner: PlayerId,
    /// Kind.
    pub unit_type: UnitType,
    /// Current tile.
    pub location: MapLocation,
    /// Facing.
    pub orientation: Direction,
    /// Current hit points.
    pub hp: u32,
    /// Rounds until the special can be used; `0` means ready.
    pub special_cooldown: u32,
}

impl Unit {
    /// Create a unit at full health with its special ready.
    #[must_use]
    pub const fn new(
        id: EntityId,
        owner: PlayerId,
        unit_type: UnitType,
        location: MapLocation,
        orientation: Direction,
    ) -> Self {
        Self {
            id,
            owner,
            unit_type,
            location,
            orientation,
            hp: unit_type.stats().max_hp,
            special_cooldown: 0,
        }
    }

    /// Static stats of this unit's type.
    #[must_use]
    pub const fn stats(&self) -> UnitStats {
        self.unit_type.stats()
    }

    /// Maximum hit points.
    #[must_use]
    pub const fn max_hp(&self) -> u32 {
        self.stats().max_hp
    }

    /// True if below maximum hit points.
    #[must_use]
    pub const fn is_damaged(&self) -> bool {
        self.hp < self.max_hp()
    }

    /// True if the unit has an active special that is off cooldown.
    #[must_use]
    pub const fn can_use_special_attack(&self) -> bool {
        self.unit_type.has_active_special() && self.special_cooldown == 0
    }

    /// True if `location` is within Manhattan attack range.
    #[must_use]
    pub const fn is_in_attack_range(&self, location: MapLocation) -> bool {
        self.location.manhattan_distance(location) <= self.stats().attack_range
    }

    /// The tile directly ahead.
    #[must_use]
    pub const fn location_ahead(&self) -> MapLocation {
        self.location.step(self.orientation)
    }
}

// ============================================================================
// Structures
// ============================================================================

/// Structure kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StructureType {
    /// Headquarters. Losing every base eliminates a player.
    Base,
    /// Secondary spawn point with a smaller income.
    Outpost,
}

impl StructureType {
    /// Maximum hit points.
    #[must_use]
    pub const fn max_hp(self) -> u32 {
        match self {
            Self::Base => 50,
            Self::Outpost => 25,
        }
    }

    /// Resources paid to the owner at the end of each of their turns.
    #[must_use]
    pub const fn income(self) -> u32 {
        match self {
            Self::Base => 5,
            Self::Outpost => 2,
        }
    }

    /// True if this structure can produce units.
    #[must_use]
    pub const fn allows_spawning(self) -> bool {
        match self {
            Self::Base | Self::Outpost => true,
        }
    }
}

/// A static, owned map feature.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Structure {
    /// Stable id.
    pub id: EntityId,
    /// Controlling player.
    pub owner: PlayerId,
    /// Kind.
    pub structure_type: StructureType,
    /// Occupied tile.
    pub location: MapLocation,
    /// Side on which spawned units appear.
    pub spawn_direction: Direction,
    /// Current hit points.
    pub hp: u32,
}

impl Structure {
    /// Create a structure at full health.
    #[must_use]
    pub const fn new(
        id: EntityId,
        owner: PlayerId,
        structure_type: StructureType,
        location: MapLocation,
        spawn_direction: Direction,
    ) -> Self {
        Self {
            id,
            owner,
            structure_type,
            location,
            spawn_direction,
            hp: structure_type.max_hp(),
        }
    }

    /// The tile where spawned units appear.
    #[must_use]
    pub const fn spawn_location(&self) -> MapLocation {
        self.location.step(self.spawn_direction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roles() {
        assert!(UnitType::Medic.is_healer());
        assert!(!UnitType::Soldier.is_healer());
        assert!(!UnitType::Infected.has_active_special());
    }

    #[test]
    fn test_new_unit_is_ready() {
        let unit = Unit::new(
            1,
            0,
            UnitType::Medic,
            MapLocation::new(2, 2),
            Direction::East,
        );
        assert_eq!(unit.hp, unit.max_hp());
        assert!(!unit.is_damaged());
        assert!(unit.can_use_special_attack());
        assert_eq!(unit.location_ahead(), MapLocation::new(3, 2));
    }

    #[test]
    fn test_passive_special_never_usable() {
        let unit = Unit::new(
            1,
            0,
            UnitType::Infected,
            MapLocation::new(0, 0),
            Direction::North,
        );
        assert!(!unit.can_use_special_attack());
    }

    #[test]
    fn test_attack_range_is_manhattan() {
        let unit = Unit::new(
            1,
            0,
            UnitType::Medic,
            MapLocation::new(5, 5),
            Direction::North,
        );
        assert!(unit.is_in_attack_range(MapLocation::new(6, 3)));
        assert!(!unit.is_in_attack_range(MapLocation::new(7, 3)));
    }

    #[test]
    fn test_spawn_location() {
        let base = Structure::new(
            7,
            1,
            StructureType::Base,
            MapLocation::new(4, 4),
            Direction::West,
        );
        assert_eq!(base.spawn_location(), MapLocation::new(3, 4));
        assert_eq!(base.hp, 50);
    }
}

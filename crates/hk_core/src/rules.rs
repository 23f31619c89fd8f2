//! The rules engine: order legality, order effects and turn resolution.
//!
//! [`RulesEngine`] is the seam between decision makers and the game. Bots
//! only ever ask whether an order is possible and apply it to their own
//! copy of the state; the match driver calls [`RulesEngine::handle`] with a
//! whole [`Action`] on the authoritative state.
//!
//! Rule violations are collected in a [`Diagnostics`] sink instead of being
//! returned as errors: a rejected order is an expected outcome, not a fault.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::entity::{EntityId, PlayerId, SpecialAbility, StructureType, UnitType};
use crate::error::{GameError, Result};
use crate::map::{Direction, MapLocation};
use crate::order::{Action, Order, OrderKind};
use crate::state::GameState;

/// Score for destroying a unit.
pub const UNIT_KILL_SCORE: u32 = 10;

/// Score for destroying a structure.
pub const STRUCTURE_KILL_SCORE: u32 = 25;

/// Why an order cannot be carried out.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    /// The match is over.
    #[error("Match is finished")]
    MatchFinished,

    /// No entity with this id exists.
    #[error("Entity {0} not found")]
    UnknownEntity(EntityId),

    /// The entity belongs to someone other than the active player.
    #[error("Entity {entity} is owned by player {owner}, active player is {active}")]
    NotOwned {
        /// Ordered entity.
        entity: EntityId,
        /// Its controller.
        owner: PlayerId,
        /// Player whose turn it is.
        active: PlayerId,
    },

    /// The entity already received an order this turn.
    #[error("Entity {0} already acted this turn")]
    AlreadyActed(EntityId),

    /// A spawn order for something that cannot spawn.
    #[error("Entity {0} cannot spawn units")]
    NotASpawner(EntityId),

    /// A unit order for something that is not a unit.
    #[error("Entity {0} is not a unit")]
    NotAUnit(EntityId),

    /// Not enough resources to pay for a unit.
    #[error("Insufficient resources: need {required}, have {available}")]
    InsufficientResources {
        /// Cost of the unit.
        required: u32,
        /// Player's resources.
        available: u32,
    },

    /// The spawn tile is off the map, a wall, or occupied.
    #[error("Spawn location {0} is blocked")]
    SpawnBlocked(MapLocation),

    /// The destination tile is off the map, a wall, or occupied.
    #[error("Move destination {0} is blocked")]
    MoveBlocked(MapLocation),

    /// The target is farther than the attack range.
    #[error("Target {0} is out of attack range")]
    OutOfRange(MapLocation),

    /// The target is not in the unit's field of view.
    #[error("Target {0} is not in field of view")]
    NotInView(MapLocation),

    /// The unit type has no special that can be ordered.
    #[error("{0:?} has no active special attack")]
    NoSpecial(UnitType),

    /// The special attack is still recharging.
    #[error("Special attack of unit {unit} is on cooldown for {rounds} more rounds")]
    SpecialOnCooldown {
        /// Ordered unit.
        unit: EntityId,
        /// Remaining cooldown.
        rounds: u32,
    },

    /// A heal targeted a tile without a unit.
    #[error("No unit to heal at {0}")]
    NoHealTarget(MapLocation),

    /// An attack resolved on a tile with nothing to hit.
    #[error("Attack on {0} hit nothing")]
    NoTarget(MapLocation),
}

/// Collects rule violations reported by the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    entries: Vec<OrderError>,
}

impl Diagnostics {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a violation.
    pub fn push(&mut self, error: OrderError) {
        self.entries.push(error);
    }

    /// True if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Recorded violations in order.
    pub fn iter(&self) -> impl Iterator<Item = &OrderError> {
        self.entries.iter()
    }

    /// Forget everything recorded so far.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// All violations joined into one line for logging.
    #[must_use]
    pub fn summary(&self) -> String {
        self.entries
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// An order the match driver refused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedOrder {
    /// Index of the order in its action.
    pub index: usize,
    /// Reason reported by the engine.
    pub reason: String,
}

/// Outcome of resolving one action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnReport {
    /// Orders that were executed.
    pub accepted: usize,
    /// Orders that were skipped.
    pub rejected: Vec<RejectedOrder>,
    /// Problems reported while executing accepted orders.
    pub warnings: Vec<String>,
    /// True if the match ended with this turn.
    pub finished: bool,
}

/// Authority on what orders are legal and what they do.
pub trait RulesEngine {
    /// Check an order against `state` without changing it.
    ///
    /// Reasons for rejection are appended to `diagnostics`.
    fn is_order_possible(
        &self,
        state: &GameState,
        order: &Order,
        diagnostics: &mut Diagnostics,
    ) -> bool;

    /// Apply an order's effects to `state`.
    ///
    /// Problems found while executing are appended to `diagnostics`; nothing
    /// already applied is reverted.
    fn execute_order(&self, state: &mut GameState, order: &Order, diagnostics: &mut Diagnostics);

    /// Close the active player's turn and hand over to the next player.
    fn end_turn(&self, state: &mut GameState);

    /// Every legal order for `entity` in `state`.
    fn legal_orders(&self, state: &GameState, entity: EntityId) -> Vec<Order> {
        let mut scratch = Diagnostics::new();
        candidate_orders(state, entity)
            .into_iter()
            .filter(|order| {
                scratch.clear();
                self.is_order_possible(state, order, &mut scratch)
            })
            .collect()
    }

    /// Every legal move order for `unit` in `state`.
    fn legal_move_orders(&self, state: &GameState, unit: EntityId) -> Vec<Order> {
        let mut scratch = Diagnostics::new();
        Direction::ALL
            .into_iter()
            .map(|direction| Order::new(OrderKind::Move { unit, direction }))
            .filter(|order| {
                scratch.clear();
                self.is_order_possible(state, order, &mut scratch)
            })
            .collect()
    }

    /// Resolve a full action on the authoritative state and end the turn.
    ///
    /// Illegal orders are skipped and reported; the rest execute in order.
    fn handle(&self, state: &mut GameState, action: &Action) -> Result<TurnReport> {
        if state.is_finished() {
            return Err(GameError::MatchFinished);
        }
        if action.player != state.active_player() {
            return Err(GameError::WrongPlayer {
                submitted: action.player,
                active: state.active_player(),
            });
        }

        let mut report = TurnReport::default();
        let mut diagnostics = Diagnostics::new();
        for order in action.orders() {
            diagnostics.clear();
            if self.is_order_possible(state, order, &mut diagnostics) {
                diagnostics.clear();
                self.execute_order(state, order, &mut diagnostics);
                report.accepted += 1;
                report
                    .warnings
                    .extend(diagnostics.iter().map(ToString::to_string));
            } else {
                report.rejected.push(RejectedOrder {
                    index: order.index,
                    reason: diagnostics.summary(),
                });
            }
        }

        self.end_turn(state);
        report.finished = state.is_finished();
        Ok(report)
    }
}

/// Every order kind that could make sense for `entity`, legal or not.
#[must_use]
pub fn candidate_orders(state: &GameState, entity: EntityId) -> Vec<Order> {
    if state.structure(entity).is_some() {
        return UnitType::ALL
            .into_iter()
            .map(|unit_type| {
                Order::new(OrderKind::Spawn {
                    structure: entity,
                    unit_type,
                })
            })
            .collect();
    }
    let Some(unit) = state.unit(entity) else {
        return Vec::new();
    };

    let mut orders = Vec::new();
    for clockwise in [true, false] {
        orders.push(Order::new(OrderKind::Rotate {
            unit: entity,
            clockwise,
        }));
    }
    for direction in Direction::ALL {
        orders.push(Order::new(OrderKind::Move {
            unit: entity,
            direction,
        }));
    }
    for target in state
        .map()
        .area_within(unit.location, unit.stats().attack_range, true)
    {
        if !unit.is_in_attack_range(target) {
            continue;
        }
        for special in [false, true] {
            orders.push(Order::new(OrderKind::Attack {
                unit: entity,
                target,
                special,
            }));
        }
    }
    orders
}

/// The standard HunterKiller rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardRules;

impl StandardRules {
    /// Create the rules.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Check an order, returning the first violated rule.
    pub fn validate(
        &self,
        state: &GameState,
        order: &Order,
    ) -> std::result::Result<(), OrderError> {
        if state.is_finished() {
            return Err(OrderError::MatchFinished);
        }
        let entity = order.entity();
        if state.has_acted(entity) {
            return Err(OrderError::AlreadyActed(entity));
        }
        let active = state.active_player();

        match order.kind {
            OrderKind::Spawn {
                structure,
                unit_type,
            } => {
                let Some(spawner) = state.structure(structure) else {
                    return Err(if state.unit(structure).is_some() {
                        OrderError::NotASpawner(structure)
                    } else {
                        OrderError::UnknownEntity(structure)
                    });
                };
                if spawner.owner != active {
                    return Err(OrderError::NotOwned {
                        entity: structure,
                        owner: spawner.owner,
                        active,
                    });
                }
                if !spawner.structure_type.allows_spawning() {
                    return Err(OrderError::NotASpawner(structure));
                }
                let required = unit_type.stats().cost;
                let available = state.player(active).map_or(0, |player| player.resources);
                if available < required {
                    return Err(OrderError::InsufficientResources {
                        required,
                        available,
                    });
                }
                let spawn_at = spawner.spawn_location();
                if !state.is_walkable(spawn_at) || state.unit_at(spawn_at).is_some() {
                    return Err(OrderError::SpawnBlocked(spawn_at));
                }
                Ok(())
            }
            OrderKind::Move { unit, .. }
            | OrderKind::Rotate { unit, .. }
            | OrderKind::Attack { unit, .. } => {
                let Some(actor) = state.unit(unit) else {
                    return Err(if state.structure(unit).is_some() {
                        OrderError::NotAUnit(unit)
                    } else {
                        OrderError::UnknownEntity(unit)
                    });
                };
                if actor.owner != active {
                    return Err(OrderError::NotOwned {
                        entity: unit,
                        owner: actor.owner,
                        active,
                    });
                }
                match order.kind {
                    OrderKind::Move { direction, .. } => {
                        let destination = actor.location.step(direction);
                        if !state.is_walkable(destination) || state.unit_at(destination).is_some()
                        {
                            return Err(OrderError::MoveBlocked(destination));
                        }
                        Ok(())
                    }
                    OrderKind::Attack {
                        target, special, ..
                    } => {
                        if !actor.is_in_attack_range(target) {
                            return Err(OrderError::OutOfRange(target));
                        }
                        if !state.is_in_field_of_view(actor, target) {
                            return Err(OrderError::NotInView(target));
                        }
                        if special {
                            if !actor.unit_type.has_active_special() {
                                return Err(OrderError::NoSpecial(actor.unit_type));
                            }
                            if actor.special_cooldown > 0 {
                                return Err(OrderError::SpecialOnCooldown {
                                    unit,
                                    rounds: actor.special_cooldown,
                                });
                            }
                            if actor.unit_type.is_healer() && state.unit_at(target).is_none() {
                                return Err(OrderError::NoHealTarget(target));
                            }
                        }
                        Ok(())
                    }
                    _ => Ok(()),
                }
            }
        }
    }

    fn execute_spawn(
        state: &mut GameState,
        structure: EntityId,
        unit_type: UnitType,
        diagnostics: &mut Diagnostics,
    ) {
        let Some(spawner) = state.structure(structure).cloned() else {
            diagnostics.push(OrderError::UnknownEntity(structure));
            return;
        };
        let spawn_at = spawner.spawn_location();
        if !state.is_walkable(spawn_at) || state.unit_at(spawn_at).is_some() {
            diagnostics.push(OrderError::SpawnBlocked(spawn_at));
            return;
        }
        if let Some(player) = state.player_mut(spawner.owner) {
            player.resources = player.resources.saturating_sub(unit_type.stats().cost);
        }
        let spawned = state.place_unit(spawner.owner, unit_type, spawn_at, spawner.spawn_direction);
        // Fresh units wait for their owner's next turn.
        state.mark_acted(spawned);
        tracing::debug!(
            "Structure {} spawned {:?} {} at {}",
            structure,
            unit_type,
            spawned,
            spawn_at
        );
    }

    fn execute_attack(
        state: &mut GameState,
        unit: EntityId,
        target: MapLocation,
        special: bool,
        diagnostics: &mut Diagnostics,
    ) {
        let Some(attacker) = state.unit(unit).cloned() else {
            diagnostics.push(OrderError::UnknownEntity(unit));
            return;
        };
        let stats = attacker.stats();
        let infects = matches!(stats.special, SpecialAbility::Infection);

        if !special {
            if !apply_damage(state, attacker.owner, infects, target, stats.damage) {
                diagnostics.push(OrderError::NoTarget(target));
            }
            return;
        }

        match stats.special {
            SpecialAbility::Grenade { damage, radius } => {
                let mut hit_any = false;
                for location in state.map().area_within(target, radius, true) {
                    hit_any |= apply_damage(state, attacker.owner, false, location, damage);
                }
                if !hit_any {
                    diagnostics.push(OrderError::NoTarget(target));
                }
            }
            SpecialAbility::Heal { amount } => {
                let healed = state.unit_at(target).map(|patient| patient.id);
                match healed.and_then(|id| state.unit_mut(id)) {
                    Some(patient) => {
                        patient.hp = (patient.hp + amount).min(patient.max_hp());
                    }
                    None => diagnostics.push(OrderError::NoHealTarget(target)),
                }
            }
            SpecialAbility::Infection => {
                diagnostics.push(OrderError::NoSpecial(attacker.unit_type));
                return;
            }
        }
        if let Some(attacker) = state.unit_mut(unit) {
            attacker.special_cooldown = stats.special_cooldown;
        }
    }
}

/// Damage whatever stands on `target`. Returns `false` if nothing was there.
fn apply_damage(
    state: &mut GameState,
    attacker_owner: PlayerId,
    infects: bool,
    target: MapLocation,
    damage: u32,
) -> bool {
    if let Some(victim) = state.unit_at(target).map(|unit| unit.id) {
        let Some(unit) = state.unit_mut(victim) else {
            return false;
        };
        unit.hp = unit.hp.saturating_sub(damage);
        if unit.hp == 0 {
            let dead = state.remove_unit(victim);
            if let Some(dead) = dead {
                if dead.owner != attacker_owner {
                    award(state, attacker_owner, UNIT_KILL_SCORE);
                }
                if infects {
                    let risen = state.place_unit(
                        attacker_owner,
                        UnitType::Infected,
                        dead.location,
                        dead.orientation,
                    );
                    state.mark_acted(risen);
                }
                tracing::debug!("Unit {} destroyed at {}", victim, target);
            }
        }
        return true;
    }

    if let Some(building) = state.structure_at(target).map(|structure| structure.id) {
        let Some(structure) = state.structure_mut(building) else {
            return false;
        };
        structure.hp = structure.hp.saturating_sub(damage);
        if structure.hp == 0 {
            if let Some(destroyed) = state.remove_structure(building) {
                if destroyed.owner != attacker_owner {
                    award(state, attacker_owner, STRUCTURE_KILL_SCORE);
                }
                tracing::info!(
                    "{:?} {} of player {} destroyed",
                    destroyed.structure_type,
                    building,
                    destroyed.owner
                );
                if destroyed.structure_type == StructureType::Base {
                    check_elimination(state, destroyed.owner);
                }
            }
        }
        return true;
    }

    false
}

fn award(state: &mut GameState, player: PlayerId, points: u32) {
    if let Some(player) = state.player_mut(player) {
        player.score += points;
    }
}

/// Eliminate `player` if they have no base left, removing their forces.
fn check_elimination(state: &mut GameState, player: PlayerId) {
    let has_base = state
        .structures_of(player)
        .any(|structure| structure.structure_type == StructureType::Base);
    if has_base {
        return;
    }
    let units: Vec<EntityId> = state.units_of(player).map(|unit| unit.id).collect();
    for id in units {
        state.remove_unit(id);
    }
    let structures: Vec<EntityId> = state.structures_of(player).map(|s| s.id).collect();
    for id in structures {
        state.remove_structure(id);
    }
    if let Some(seat) = state.player_mut(player) {
        seat.eliminated = true;
    }
    tracing::info!("Player {} eliminated", player);
}

impl RulesEngine for StandardRules {
    fn is_order_possible(
        &self,
        state: &GameState,
        order: &Order,
        diagnostics: &mut Diagnostics,
    ) -> bool {
        match self.validate(state, order) {
            Ok(()) => true,
            Err(error) => {
                diagnostics.push(error);
                false
            }
        }
    }

    fn execute_order(&self, state: &mut GameState, order: &Order, diagnostics: &mut Diagnostics) {
        let entity = order.entity();
        state.mark_acted(entity);

        match order.kind {
            OrderKind::Spawn {
                structure,
                unit_type,
            } => Self::execute_spawn(state, structure, unit_type, diagnostics),
            OrderKind::Move { unit, direction } => {
                let destination = match state.unit(unit) {
                    Some(actor) => actor.location.step(direction),
                    None => {
                        diagnostics.push(OrderError::UnknownEntity(unit));
                        return;
                    }
                };
                if !state.is_walkable(destination) || state.unit_at(destination).is_some() {
                    diagnostics.push(OrderError::MoveBlocked(destination));
                    return;
                }
                if let Some(actor) = state.unit_mut(unit) {
                    actor.location = destination;
                    actor.orientation = direction;
                }
            }
            OrderKind::Rotate { unit, clockwise } => match state.unit_mut(unit) {
                Some(actor) => actor.orientation = actor.orientation.rotated(clockwise),
                None => diagnostics.push(OrderError::UnknownEntity(unit)),
            },
            OrderKind::Attack {
                unit,
                target,
                special,
            } => Self::execute_attack(state, unit, target, special, diagnostics),
        }
    }

    fn end_turn(&self, state: &mut GameState) {
        let active = state.active_player();

        let own_units: Vec<EntityId> = state.units_of(active).map(|unit| unit.id).collect();
        for id in own_units {
            if let Some(unit) = state.unit_mut(id) {
                unit.special_cooldown = unit.special_cooldown.saturating_sub(1);
            }
        }
        let income: u32 = state
            .structures_of(active)
            .map(|structure| structure.structure_type.income())
            .sum();
        if let Some(player) = state.player_mut(active) {
            player.resources += income;
        }
        state.clear_acted();

        let alive: Vec<PlayerId> = state
            .players()
            .iter()
            .filter(|player| !player.eliminated)
            .map(|player| player.id)
            .collect();
        if alive.len() <= 1 && state.players().len() > 1 {
            state.finish(alive.first().copied());
            return;
        }

        let seats = state.players().len() as PlayerId;
        let mut next = active;
        for _ in 0..seats {
            next = (next + 1) % seats;
            if state.player(next).is_some_and(|player| !player.eliminated) {
                break;
            }
        }
        if next <= active {
            state.advance_round();
        }
        // `next` is always a valid seat index.
        let _ = state.set_active_player(next);

        if state.round() > state.round_limit() {
            let winner = leader_by_score(state);
            state.finish(winner);
        }
    }
}

/// The player with the strictly highest score among those still in the match.
fn leader_by_score(state: &GameState) -> Option<PlayerId> {
    let mut best: Option<(PlayerId, u32)> = None;
    let mut tied = false;
    for player in state.players().iter().filter(|player| !player.eliminated) {
        match best {
            Some((_, score)) if player.score == score => tied = true,
            Some((_, score)) if player.score < score => {}
            _ => {
                best = Some((player.id, player.score));
                tied = false;
            }
        }
    }
    if tied {
        None
    } else {
        best.map(|(id, _)| id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::Map;

    fn duel() -> (GameState, EntityId, EntityId) {
        let mut state = GameState::new(Map::new(8, 8).unwrap(), &["A", "B"]).unwrap();
        state
            .add_structure(0, StructureType::Base, MapLocation::new(0, 0), Direction::South)
            .unwrap();
        state
            .add_structure(1, StructureType::Base, MapLocation::new(7, 7), Direction::North)
            .unwrap();
        let soldier = state
            .add_unit(0, UnitType::Soldier, MapLocation::new(3, 5), Direction::North)
            .unwrap();
        let enemy = state
            .add_unit(1, UnitType::Infected, MapLocation::new(3, 2), Direction::South)
            .unwrap();
        (state, soldier, enemy)
    }

    fn possible(state: &GameState, kind: OrderKind) -> std::result::Result<(), OrderError> {
        StandardRules.validate(state, &Order::new(kind))
    }

    #[test]
    fn test_move_and_rotate() {
        let (mut state, soldier, _) = duel();
        let order = Order::new(OrderKind::Move {
            unit: soldier,
            direction: Direction::East,
        });
        let mut diagnostics = Diagnostics::new();
        assert!(StandardRules.is_order_possible(&state, &order, &mut diagnostics));
        StandardRules.execute_order(&mut state, &order, &mut diagnostics);
        assert!(diagnostics.is_empty());

        let unit = state.unit(soldier).unwrap();
        assert_eq!(unit.location, MapLocation::new(4, 5));
        assert_eq!(unit.orientation, Direction::East);
    }

    #[test]
    fn test_entity_acts_once_per_turn() {
        let (mut state, soldier, _) = duel();
        let rotate = Order::new(OrderKind::Rotate {
            unit: soldier,
            clockwise: true,
        });
        let mut diagnostics = Diagnostics::new();
        StandardRules.execute_order(&mut state, &rotate, &mut diagnostics);
        assert_eq!(
            StandardRules.validate(&state, &rotate),
            Err(OrderError::AlreadyActed(soldier))
        );
    }

    #[test]
    fn test_cannot_order_enemy_units() {
        let (state, _, enemy) = duel();
        assert!(matches!(
            possible(&state, OrderKind::Rotate { unit: enemy, clockwise: true }),
            Err(OrderError::NotOwned { .. })
        ));
    }

    #[test]
    fn test_move_blocked_by_unit_structure_and_edge() {
        let (mut state, soldier, _) = duel();
        state
            .add_unit(0, UnitType::Medic, MapLocation::new(3, 4), Direction::North)
            .unwrap();
        assert_eq!(
            possible(&state, OrderKind::Move { unit: soldier, direction: Direction::North }),
            Err(OrderError::MoveBlocked(MapLocation::new(3, 4)))
        );
        state.unit_mut(soldier).unwrap().location = MapLocation::new(1, 0);
        for direction in [Direction::West, Direction::North] {
            assert!(possible(&state, OrderKind::Move { unit: soldier, direction }).is_err());
        }
    }

    #[test]
    fn test_attack_requires_range_and_view() {
        let (mut state, soldier, enemy) = duel();
        let target = state.unit(enemy).unwrap().location;
        let basic = OrderKind::Attack {
            unit: soldier,
            target,
            special: false,
        };
        assert!(possible(&state, basic).is_ok());

        state.unit_mut(soldier).unwrap().orientation = Direction::South;
        assert_eq!(
            possible(&state, OrderKind::Attack { unit: soldier, target, special: false }),
            Err(OrderError::NotInView(target))
        );

        let far = MapLocation::new(3, 0);
        state.unit_mut(soldier).unwrap().orientation = Direction::North;
        assert_eq!(
            possible(&state, OrderKind::Attack { unit: soldier, target: far, special: false }),
            Err(OrderError::OutOfRange(far))
        );
    }

    #[test]
    fn test_basic_attack_damages_target() {
        let (mut state, soldier, enemy) = duel();
        let target = state.unit(enemy).unwrap().location;
        let mut diagnostics = Diagnostics::new();
        StandardRules.execute_order(
            &mut state,
            &Order::new(OrderKind::Attack { unit: soldier, target, special: false }),
            &mut diagnostics,
        );
        assert_eq!(state.unit(enemy).unwrap().hp, 5);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_attack_on_empty_tile_reports_diagnostic() {
        let (mut state, soldier, _) = duel();
        let mut diagnostics = Diagnostics::new();
        StandardRules.execute_order(
            &mut state,
            &Order::new(OrderKind::Attack {
                unit: soldier,
                target: MapLocation::new(3, 3),
                special: false,
            }),
            &mut diagnostics,
        );
        assert_eq!(
            diagnostics.iter().next(),
            Some(&OrderError::NoTarget(MapLocation::new(3, 3)))
        );
    }

    #[test]
    fn test_grenade_sets_cooldown_and_hits_area() {
        let (mut state, soldier, enemy) = duel();
        let second = state
            .add_unit(1, UnitType::Medic, MapLocation::new(4, 2), Direction::South)
            .unwrap();
        let mut diagnostics = Diagnostics::new();
        StandardRules.execute_order(
            &mut state,
            &Order::new(OrderKind::Attack {
                unit: soldier,
                target: MapLocation::new(3, 2),
                special: true,
            }),
            &mut diagnostics,
        );
        assert_eq!(state.unit(enemy).unwrap().hp, 4);
        assert_eq!(state.unit(second).unwrap().hp, 2);
        assert_eq!(state.unit(soldier).unwrap().special_cooldown, 5);
    }

    #[test]
    fn test_heal_restores_up_to_max() {
        let mut state = GameState::new(Map::new(5, 5).unwrap(), &["A"]).unwrap();
        let medic = state
            .add_unit(0, UnitType::Medic, MapLocation::new(2, 4), Direction::North)
            .unwrap();
        let patient = state
            .add_unit(0, UnitType::Soldier, MapLocation::new(2, 2), Direction::North)
            .unwrap();
        state.unit_mut(patient).unwrap().hp = 9;

        let heal = Order::new(OrderKind::Attack {
            unit: medic,
            target: MapLocation::new(2, 2),
            special: true,
        });
        let mut diagnostics = Diagnostics::new();
        assert!(StandardRules.is_order_possible(&state, &heal, &mut diagnostics));
        StandardRules.execute_order(&mut state, &heal, &mut diagnostics);
        assert_eq!(state.unit(patient).unwrap().hp, 10);

        assert!(matches!(
            StandardRules.validate(&state, &Order::new(OrderKind::Attack {
                unit: medic,
                target: MapLocation::new(2, 3),
                special: true,
            })),
            Err(OrderError::AlreadyActed(_))
        ));
    }

    #[test]
    fn test_spawn_costs_resources_and_blocks_new_unit() {
        let (mut state, _, _) = duel();
        let base = state.structures_of(0).next().unwrap().id;
        let spawn = Order::new(OrderKind::Spawn {
            structure: base,
            unit_type: UnitType::Soldier,
        });
        let mut diagnostics = Diagnostics::new();
        assert!(StandardRules.is_order_possible(&state, &spawn, &mut diagnostics));
        StandardRules.execute_order(&mut state, &spawn, &mut diagnostics);

        assert_eq!(state.player(0).unwrap().resources, 10);
        let spawned = state.unit_at(MapLocation::new(0, 1)).unwrap();
        assert_eq!(spawned.unit_type, UnitType::Soldier);
        assert!(state.has_acted(spawned.id));
    }

    #[test]
    fn test_spawn_requires_resources() {
        let (mut state, _, _) = duel();
        state.player_mut(0).unwrap().resources = 4;
        let base = state.structures_of(0).next().unwrap().id;
        assert_eq!(
            possible(&state, OrderKind::Spawn { structure: base, unit_type: UnitType::Infected }),
            Err(OrderError::InsufficientResources { required: 5, available: 4 })
        );
    }

    #[test]
    fn test_infected_kill_rises_as_infected() {
        let mut state = GameState::new(Map::new(4, 4).unwrap(), &["A", "B"]).unwrap();
        let infected = state
            .add_unit(0, UnitType::Infected, MapLocation::new(1, 2), Direction::North)
            .unwrap();
        let victim = state
            .add_unit(1, UnitType::Medic, MapLocation::new(1, 1), Direction::South)
            .unwrap();
        state.unit_mut(victim).unwrap().hp = 2;

        let mut diagnostics = Diagnostics::new();
        StandardRules.execute_order(
            &mut state,
            &Order::new(OrderKind::Attack {
                unit: infected,
                target: MapLocation::new(1, 1),
                special: false,
            }),
            &mut diagnostics,
        );
        let risen = state.unit_at(MapLocation::new(1, 1)).unwrap();
        assert_eq!(risen.owner, 0);
        assert_eq!(risen.unit_type, UnitType::Infected);
        assert_eq!(state.player(0).unwrap().score, UNIT_KILL_SCORE);
    }

    #[test]
    fn test_legal_move_orders() {
        let map = Map::from_rows(&["...", ".#.", "..."]).unwrap();
        let mut state = GameState::new(map, &["A"]).unwrap();
        let unit = state
            .add_unit(0, UnitType::Soldier, MapLocation::new(1, 0), Direction::South)
            .unwrap();
        let moves = StandardRules.legal_move_orders(&state, unit);
        let directions: Vec<Direction> = moves
            .iter()
            .map(|order| match order.kind {
                OrderKind::Move { direction, .. } => direction,
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(directions, vec![Direction::East, Direction::West]);
    }

    #[test]
    fn test_handle_rejects_wrong_player() {
        let (mut state, _, _) = duel();
        let result = StandardRules.handle(&mut state, &Action::new(1, 1));
        assert!(matches!(result, Err(GameError::WrongPlayer { .. })));
    }

    #[test]
    fn test_handle_ends_turn() {
        let (mut state, soldier, _) = duel();
        state.unit_mut(soldier).unwrap().special_cooldown = 2;
        let mut action = Action::new(0, 1);
        action.add_order(Order::new(OrderKind::Rotate {
            unit: soldier,
            clockwise: false,
        }));
        action.add_order(Order {
            index: 1,
            kind: OrderKind::Rotate {
                unit: soldier,
                clockwise: false,
            },
        });

        let report = StandardRules.handle(&mut state, &action).unwrap();
        assert_eq!(report.accepted, 1);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].index, 1);
        assert_eq!(state.active_player(), 1);
        assert_eq!(state.round(), 1);
        assert_eq!(state.unit(soldier).unwrap().special_cooldown, 1);
        assert_eq!(state.player(0).unwrap().resources, 25);
        assert!(!state.has_acted(soldier));

        StandardRules.handle(&mut state, &Action::new(1, 1)).unwrap();
        assert_eq!(state.active_player(), 0);
        assert_eq!(state.round(), 2);
    }

    #[test]
    fn test_destroying_last_base_finishes_match() {
        let (mut state, soldier, _) = duel();
        let enemy_base = state.structures_of(1).next().unwrap().id;
        state.structure_mut(enemy_base).unwrap().hp = 1;
        state.unit_mut(soldier).unwrap().location = MapLocation::new(7, 4);
        state.unit_mut(soldier).unwrap().orientation = Direction::South;

        let mut action = Action::new(0, 1);
        action.add_order(Order::new(OrderKind::Attack {
            unit: soldier,
            target: MapLocation::new(7, 7),
            special: false,
        }));
        let report = StandardRules.handle(&mut state, &action).unwrap();

        assert!(report.finished);
        assert_eq!(state.winner(), Some(0));
        assert!(state.player(1).unwrap().eliminated);
        assert_eq!(state.units_of(1).count(), 0);
        assert!(StandardRules.handle(&mut state, &Action::new(0, 1)).is_err());
    }

    #[test]
    fn test_round_limit_calls_match() {
        let (state, _, _) = duel();
        let mut state = state.with_round_limit(1);
        state.player_mut(1).unwrap().score = 5;
        StandardRules.handle(&mut state, &Action::new(0, 1)).unwrap();
        assert!(!state.is_finished());
        StandardRules.handle(&mut state, &Action::new(1, 1)).unwrap();
        assert!(state.is_finished());
        assert_eq!(state.winner(), Some(1));
    }
}

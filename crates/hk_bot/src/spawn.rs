//! Structure spawn policy: keep the army's unit types balanced.

use hk_core::entity::{EntityId, PlayerId, UnitType};
use hk_core::order::OrderKind;
use hk_core::rules::RulesEngine;
use hk_core::state::GameState;

use crate::commit::TurnContext;

/// True if `structure` could produce a unit right now, ignoring cost.
#[must_use]
pub fn can_spawn(state: &GameState, structure: EntityId) -> bool {
    let Some(structure) = state.structure(structure) else {
        return false;
    };
    let spawn_at = structure.spawn_location();
    structure.structure_type.allows_spawning()
        && state.is_walkable(spawn_at)
        && state.unit_at(spawn_at).is_none()
}

/// The unit type `player` is shortest of.
///
/// Walks `priority` and returns the first type whose count is no greater
/// than every other type's count.
#[must_use]
pub fn choose_unit_type(
    state: &GameState,
    player: PlayerId,
    priority: &[UnitType],
) -> Option<UnitType> {
    let counts: Vec<(UnitType, usize)> = UnitType::ALL
        .into_iter()
        .map(|unit_type| (unit_type, state.count_units(player, unit_type)))
        .collect();

    priority.iter().copied().find(|&candidate| {
        let own = state.count_units(player, candidate);
        counts.iter().all(|&(_, count)| own <= count)
    })
}

/// Try to spawn the most needed unit type from `structure`.
///
/// If that type cannot be afforded nothing is spawned; cheaper types are
/// deliberately not tried.
pub fn spawn_policy<R: RulesEngine + ?Sized>(
    ctx: &mut TurnContext<'_, R>,
    structure: EntityId,
    priority: &[UnitType],
) -> bool {
    if !can_spawn(&ctx.working, structure) {
        return false;
    }
    let Some(unit_type) = choose_unit_type(&ctx.working, ctx.player, priority) else {
        return false;
    };
    ctx.try_commit(OrderKind::Spawn {
        structure,
        unit_type,
    })
}

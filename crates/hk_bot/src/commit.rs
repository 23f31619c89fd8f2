//! The single path by which a bot turns a candidate into a committed order.
//!
//! Every candidate is checked against the working copy first. Accepted
//! orders are appended to the action and applied to the working copy right
//! away, so later decisions in the same turn see their effects.

use hk_core::entity::PlayerId;
use hk_core::order::{Action, Order, OrderKind};
use hk_core::rules::{Diagnostics, RulesEngine};
use hk_core::state::GameState;

/// Validate `order` on `working` and, if legal, commit it.
///
/// The order's index is set to its position in `action`. Returns `false`
/// and leaves everything untouched when the rules reject the order.
/// Problems reported while executing are logged; the order stays committed.
pub fn try_commit<R: RulesEngine + ?Sized>(
    rules: &R,
    action: &mut Action,
    working: &mut GameState,
    mut order: Order,
) -> bool {
    order.index = action.len();
    let mut diagnostics = Diagnostics::new();

    if !rules.is_order_possible(working, &order, &mut diagnostics) {
        tracing::trace!("Rejected {:?}: {}", order.kind, diagnostics.summary());
        return false;
    }

    action.add_order(order);
    diagnostics.clear();
    rules.execute_order(working, &order, &mut diagnostics);
    if !diagnostics.is_empty() {
        tracing::warn!(
            "Order {} {:?} executed with problems: {}",
            order.index,
            order.kind,
            diagnostics.summary()
        );
    }
    tracing::debug!("Committed order {} {:?}", order.index, order.kind);
    true
}

/// Everything a policy needs while deciding one turn.
///
/// Owns the working copy and the action under construction; both are
/// discarded or handed out when the turn is decided.
pub struct TurnContext<'a, R: ?Sized> {
    /// Rules used to validate and apply candidates.
    pub rules: &'a R,
    /// Scratch copy of the true state, mutated by committed orders.
    pub working: GameState,
    /// Orders committed so far.
    pub action: Action,
    /// Player being decided for.
    pub player: PlayerId,
}

impl<'a, R: RulesEngine + ?Sized> TurnContext<'a, R> {
    /// Snapshot `state` for a decision on behalf of its active player.
    #[must_use]
    pub fn new(rules: &'a R, state: &GameState) -> Self {
        let player = state.active_player();
        Self {
            rules,
            working: state.clone(),
            action: Action::new(player, state.round()),
            player,
        }
    }

    /// Commit an order through [`try_commit`].
    pub fn try_commit(&mut self, kind: OrderKind) -> bool {
        try_commit(self.rules, &mut self.action, &mut self.working, Order::new(kind))
    }

    /// Finish the turn, dropping the working copy.
    #[must_use]
    pub fn into_action(self) -> Action {
        self.action
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hk_core::entity::UnitType;
    use hk_core::map::{Direction, Map, MapLocation};
    use hk_core::rules::{OrderError, StandardRules};

    /// Standard rules that complain after every executed order.
    struct NoisyRules;

    impl RulesEngine for NoisyRules {
        fn is_order_possible(
            &self,
            state: &GameState,
            order: &Order,
            diagnostics: &mut Diagnostics,
        ) -> bool {
            StandardRules.is_order_possible(state, order, diagnostics)
        }

        fn execute_order(
            &self,
            state: &mut GameState,
            order: &Order,
            diagnostics: &mut Diagnostics,
        ) {
            StandardRules.execute_order(state, order, diagnostics);
            diagnostics.push(OrderError::NoTarget(MapLocation::new(0, 0)));
        }

        fn end_turn(&self, state: &mut GameState) {
            StandardRules.end_turn(state);
        }
    }

    fn lone_soldier() -> (GameState, u64) {
        let mut state = GameState::new(Map::new(4, 4).unwrap(), &["A", "B"]).unwrap();
        let id = state
            .add_unit(0, UnitType::Soldier, MapLocation::new(1, 1), Direction::North)
            .unwrap();
        (state, id)
    }

    #[test]
    fn test_commit_applies_to_working_copy() {
        let (state, id) = lone_soldier();
        let mut ctx = TurnContext::new(&StandardRules, &state);

        assert!(ctx.try_commit(OrderKind::Move {
            unit: id,
            direction: Direction::East
        }));
        assert_eq!(ctx.working.unit(id).unwrap().location, MapLocation::new(2, 1));
        assert_eq!(state.unit(id).unwrap().location, MapLocation::new(1, 1));

        let action = ctx.into_action();
        assert_eq!(action.len(), 1);
        assert_eq!(action.orders()[0].index, 0);
    }

    #[test]
    fn test_rejected_order_leaves_no_trace() {
        let (state, id) = lone_soldier();
        let mut working = state.clone();
        let mut action = Action::new(0, 1);
        let order = Order::new(OrderKind::Move {
            unit: id,
            direction: Direction::North,
        });
        assert!(try_commit(&StandardRules, &mut action, &mut working, order));

        let again = Order::new(OrderKind::Rotate {
            unit: id,
            clockwise: true,
        });
        assert!(!try_commit(&StandardRules, &mut action, &mut working, again));
        assert_eq!(action.len(), 1);
        assert_eq!(working.unit(id).unwrap().orientation, Direction::North);
    }

    #[test]
    fn test_execution_problems_keep_order_committed() {
        let (state, id) = lone_soldier();
        let mut ctx = TurnContext::new(&NoisyRules, &state);

        assert!(ctx.try_commit(OrderKind::Move {
            unit: id,
            direction: Direction::South
        }));
        assert_eq!(ctx.working.unit(id).unwrap().location, MapLocation::new(1, 2));

        let action = ctx.into_action();
        assert_eq!(action.len(), 1);
        assert_eq!(action.orders()[0].index, 0);
        assert!(matches!(action.orders()[0].kind, OrderKind::Move { .. }));
    }

    #[test]
    fn test_indices_follow_commit_order() {
        let mut state = GameState::new(Map::new(4, 4).unwrap(), &["A"]).unwrap();
        let a = state
            .add_unit(0, UnitType::Medic, MapLocation::new(0, 0), Direction::South)
            .unwrap();
        let b = state
            .add_unit(0, UnitType::Medic, MapLocation::new(3, 3), Direction::North)
            .unwrap();
        let mut ctx = TurnContext::new(&StandardRules, &state);
        assert!(ctx.try_commit(OrderKind::Rotate { unit: b, clockwise: true }));
        assert!(!ctx.try_commit(OrderKind::Rotate { unit: b, clockwise: true }));
        assert!(ctx.try_commit(OrderKind::Rotate { unit: a, clockwise: false }));

        let indices: Vec<usize> = ctx.action.orders().iter().map(|o| o.index).collect();
        assert_eq!(indices, vec![0, 1]);
    }
}

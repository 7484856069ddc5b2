use crate::types::Pos;

pub const DEFAULT_ACTION_COST: i32 = 100;
pub const DIAGONAL_MOVE_COST: i32 = 140;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActionKind {
    Wait,
    Move { target: Pos },
    Attack { target: Pos },
}

/// An intent produced by a planner or by player input.
/// `expected_cost` of zero or less lets resolution derive the cost.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Action {
    pub kind: ActionKind,
    pub expected_cost: i32,
}

impl Action {
    pub fn wait() -> Self {
        Self { kind: ActionKind::Wait, expected_cost: DEFAULT_ACTION_COST }
    }

    /// A move whose cost is derived from the step geometry when resolved.
    pub fn move_to(target: Pos) -> Self {
        Self { kind: ActionKind::Move { target }, expected_cost: 0 }
    }

    pub fn attack(target: Pos) -> Self {
        Self { kind: ActionKind::Attack { target }, expected_cost: DEFAULT_ACTION_COST }
    }

    pub fn with_cost(mut self, cost: i32) -> Self {
        self.expected_cost = cost;
        self
    }
}

/// Turn cost of stepping from `from` to `to` when no cost was requested.
pub fn step_cost(from: Pos, to: Pos) -> i32 {
    if from.distance_squared(to) > 1 { DIAGONAL_MOVE_COST } else { DEFAULT_ACTION_COST }
}

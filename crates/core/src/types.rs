use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    pub struct OccupantId;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Pos {
    pub y: i32,
    pub x: i32,
}

impl Pos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { y, x }
    }

    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self { y: self.y + dy, x: self.x + dx }
    }

    pub fn manhattan(self, other: Pos) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    pub fn distance_squared(self, other: Pos) -> i32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TileKind {
    Void,
    Node,
    Wall,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Room,
    Corridor,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Allegiance {
    None,
    Player,
    Dungeon,
}

impl Allegiance {
    pub fn foe(self) -> Option<Allegiance> {
        match self {
            Allegiance::None => None,
            Allegiance::Player => Some(Allegiance::Dungeon),
            Allegiance::Dungeon => Some(Allegiance::Player),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentState {
    Asleep,
    Idle,
    Wandering,
    Alerted,
    Fleeing,
    Hunting,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogEvent {
    Waited { occupant: OccupantId },
    Moved { occupant: OccupantId, from: Pos, to: Pos },
    MoveRejected { occupant: OccupantId, target: Pos },
    Attacked { attacker: OccupantId, target: Pos, defender: Option<OccupantId> },
    TargetAcquired { agent: OccupantId, target: OccupantId },
    TargetLost { agent: OccupantId },
    DoorToggled { door: OccupantId, closed: bool },
    Died { occupant: OccupantId },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchedulerStop {
    /// The head of the queue needs an action from outside the simulation.
    AwaitingInput(OccupantId),
    Drained,
    BudgetExhausted,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunResult {
    pub resolved_actions: u32,
    pub stop_reason: SchedulerStop,
}

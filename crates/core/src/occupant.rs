//! Everything that takes turns on a level.
//! An occupant's behaviour comes from its [`Role`]; the rest of the record is shared
//! bookkeeping the scheduler and the visibility refresh read and write.

use std::collections::BTreeSet;

use crate::action::Action;
use crate::planner::AgentPlanner;
use crate::status::Status;
use crate::types::{AgentState, Allegiance, OccupantId, Pos};

pub const DEFAULT_VISION_RANGE: i32 = 10;
pub const DEFAULT_HEALTH: i32 = 10;

/// Action slot filled from outside the simulation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InputSlot {
    pub pending: Option<Action>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DoorState {
    pub closed: bool,
}

#[derive(Clone, Debug)]
pub enum Role {
    Avatar(InputSlot),
    Agent(AgentPlanner),
    Door(DoorState),
}

#[derive(Clone, Debug)]
pub struct Occupant {
    /// Assigned by the level on insertion.
    pub id: OccupantId,
    pub role: Role,
    pub allegiance: Allegiance,
    pub pos: Pos,
    pub turns: i32,
    pub vision_range: i32,
    pub visible_tiles: BTreeSet<Pos>,
    pub known_tiles: BTreeSet<Pos>,
    pub visible_occupants: BTreeSet<OccupantId>,
    pub status: Status,
}

impl Occupant {
    fn with_role(role: Role, pos: Pos, allegiance: Allegiance) -> Self {
        Self {
            id: OccupantId::default(),
            role,
            allegiance,
            pos,
            turns: 0,
            vision_range: DEFAULT_VISION_RANGE,
            visible_tiles: BTreeSet::new(),
            known_tiles: BTreeSet::new(),
            visible_occupants: BTreeSet::new(),
            status: Status::new(DEFAULT_HEALTH),
        }
    }

    pub fn avatar(pos: Pos) -> Self {
        Self::with_role(Role::Avatar(InputSlot::default()), pos, Allegiance::Player)
    }

    pub fn agent(pos: Pos, allegiance: Allegiance, state: AgentState) -> Self {
        Self::with_role(Role::Agent(AgentPlanner::new(state)), pos, allegiance)
    }

    /// Doors start open and never see anything.
    pub fn door(pos: Pos) -> Self {
        let mut door = Self::with_role(Role::Door(DoorState { closed: false }), pos, Allegiance::None);
        door.vision_range = 0;
        door
    }

    pub fn with_status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }

    pub fn with_vision_range(mut self, range: i32) -> Self {
        self.vision_range = range;
        self
    }

    pub fn blocks_sight(&self) -> bool {
        matches!(self.role, Role::Door(DoorState { closed: true }))
    }

    pub fn blocks_pathing(&self) -> bool {
        matches!(self.role, Role::Avatar(_) | Role::Agent(_))
    }

    pub fn requires_input(&self) -> bool {
        matches!(self.role, Role::Avatar(_))
    }

    pub fn is_door(&self) -> bool {
        matches!(self.role, Role::Door(_))
    }

    pub fn agent_state(&self) -> Option<AgentState> {
        match &self.role {
            Role::Agent(planner) => Some(planner.state()),
            _ => None,
        }
    }

    pub fn planner(&self) -> Option<&AgentPlanner> {
        match &self.role {
            Role::Agent(planner) => Some(planner),
            _ => None,
        }
    }

    /// Replaces the visible set with `tiles` and folds it into the known set.
    pub fn remember_visible(&mut self, tiles: BTreeSet<Pos>) {
        self.known_tiles.extend(tiles.iter().copied());
        self.visible_tiles = tiles;
    }

    pub fn sees_tile(&self, pos: Pos) -> bool {
        self.visible_tiles.contains(&pos)
    }

    pub fn knows_tile(&self, pos: Pos) -> bool {
        self.known_tiles.contains(&pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capabilities_follow_the_role() {
        let avatar = Occupant::avatar(Pos::new(1, 1));
        assert!(avatar.requires_input() && avatar.blocks_pathing() && !avatar.blocks_sight());
        assert_eq!(avatar.allegiance, Allegiance::Player);

        let agent = Occupant::agent(Pos::new(2, 2), Allegiance::Dungeon, AgentState::Idle);
        assert!(!agent.requires_input() && agent.blocks_pathing());
        assert_eq!(agent.agent_state(), Some(AgentState::Idle));

        let mut door = Occupant::door(Pos::new(3, 3));
        assert!(!door.blocks_sight() && !door.blocks_pathing() && door.is_door());
        door.role = Role::Door(DoorState { closed: true });
        assert!(door.blocks_sight());
    }

    #[test]
    fn known_tiles_only_grow() {
        let mut occupant = Occupant::avatar(Pos::new(0, 0));
        occupant.remember_visible(BTreeSet::from([Pos::new(0, 0), Pos::new(1, 0)]));
        occupant.remember_visible(BTreeSet::from([Pos::new(5, 5)]));

        assert!(!occupant.sees_tile(Pos::new(1, 0)));
        assert!(occupant.knows_tile(Pos::new(1, 0)));
        assert!(occupant.sees_tile(Pos::new(5, 5)));
        assert_eq!(occupant.known_tiles.len(), 3);
    }
}

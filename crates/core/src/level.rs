//! This module exists to own a generated level at runtime: the map, the occupant arena, the
//! seeded random stream, the event log and the turn queue.
//!
//! It does not decide what occupants want to do (that is [`crate::planner`]) and it does not
//! order turns (that is [`crate::scheduler`]). It resolves actions against the map, keeps
//! every occupant's sight current and exposes the player input boundary.

use std::collections::BTreeSet;
use std::mem;

use rand_chacha::ChaCha8Rng;
use slotmap::SlotMap;
use tracing::{debug, trace};

use crate::action::{Action, ActionKind, DEFAULT_ACTION_COST, step_cost};
use crate::mapgen::LevelMap;
use crate::mapgen::model::tile_glyph;
use crate::occupant::{Occupant, Role};
use crate::planner::{PlanContext, Planner, Sighting};
use crate::scheduler::{TurnQueue, TurnWorld};
use crate::types::{LogEvent, OccupantId, Pos, RunResult};
use crate::visibility::compute_fov;

pub struct Level {
    world: World,
    queue: TurnQueue,
}

struct World {
    map: LevelMap,
    occupants: SlotMap<OccupantId, Occupant>,
    rng: ChaCha8Rng,
    log: Vec<LogEvent>,
    avatar: Option<OccupantId>,
}

impl Level {
    pub fn new(map: LevelMap, rng: ChaCha8Rng) -> Self {
        Self {
            world: World { map, occupants: SlotMap::with_key(), rng, log: Vec::new(), avatar: None },
            queue: TurnQueue::new(),
        }
    }

    pub fn map(&self) -> &LevelMap {
        &self.world.map
    }

    pub fn occupants(&self) -> impl Iterator<Item = &Occupant> {
        self.world.occupants.values()
    }

    pub fn occupant(&self, id: OccupantId) -> Option<&Occupant> {
        self.world.occupants.get(id)
    }

    pub fn occupant_at(&self, pos: Pos) -> Option<&Occupant> {
        self.world.occupant_at(pos, None)
    }

    pub fn avatar(&self) -> Option<OccupantId> {
        self.world.avatar
    }

    pub fn log(&self) -> &[LogEvent] {
        &self.world.log
    }

    pub fn drain_log(&mut self) -> Vec<LogEvent> {
        mem::take(&mut self.world.log)
    }

    pub fn rng_mut(&mut self) -> &mut ChaCha8Rng {
        &mut self.world.rng
    }

    pub fn queue(&self) -> &TurnQueue {
        &self.queue
    }

    /// Game time elapsed since the level was created.
    pub fn elapsed(&self) -> u64 {
        self.queue.elapsed()
    }

    /// Adds the occupant to the arena and queues it at delay zero, behind anyone already
    /// waiting at zero. The first input-driven occupant becomes the level's avatar.
    pub fn insert_occupant(&mut self, occupant: Occupant) -> OccupantId {
        let id = self.world.occupants.insert_with_key(|id| Occupant { id, ..occupant });
        if self.world.avatar.is_none() && self.world.occupants[id].requires_input() {
            self.world.avatar = Some(id);
        }
        self.world.refresh_sight(id);
        self.queue.enqueue(&mut self.world, id, 0);
        debug!(?id, pos = ?self.world.occupants[id].pos, "occupant inserted");
        id
    }

    /// Takes the occupant out of the turn order, the arena and everyone's sight.
    pub fn remove_occupant(&mut self, id: OccupantId) -> Option<Occupant> {
        self.queue.remove(id);
        self.world.remove(id)
    }

    /// Places a player avatar in the middle of the entry room.
    pub fn spawn_avatar_at_entry(&mut self) -> Option<OccupantId> {
        let room = self.world.map.entry_room()?.rect;
        let pos = Pos::new(room.x + room.width / 2, room.y + room.height / 2);
        Some(self.insert_occupant(Occupant::avatar(pos)))
    }

    /// Runs the turn queue until the avatar needs input, nobody is left, or `max_actions`
    /// actions resolved.
    pub fn run_until_blocked(&mut self, max_actions: u32) -> RunResult {
        self.queue.run_until_blocked(&mut self.world, max_actions)
    }

    /// Fills the avatar's input slot. Returns false without an avatar.
    pub fn submit_action(&mut self, action: Action) -> bool {
        let Some(avatar) = self.world.avatar else {
            return false;
        };
        match self.world.occupants.get_mut(avatar).map(|occupant| &mut occupant.role) {
            Some(Role::Avatar(slot)) => {
                slot.pending = Some(action);
                true
            }
            _ => false,
        }
    }

    /// Turns a directional step into a move along the shortest path to the neighbouring cell.
    /// Returns false when the neighbour is not walkable or cannot be reached.
    pub fn submit_step(&mut self, dx: i32, dy: i32) -> bool {
        let Some(pos) = self.world.avatar.and_then(|id| self.world.occupants.get(id)).map(|a| a.pos)
        else {
            return false;
        };
        let target = pos.offset(dx, dy);
        if !self.world.map.is_walkable(target) {
            return false;
        }
        let path = self.world.map.shortest_path(pos, target);
        match path.get(1) {
            Some(&next) => self.submit_action(Action::move_to(next)),
            None => false,
        }
    }

    /// Opens a closed door or closes an open one and refreshes everyone's sight.
    /// Returns the new closed state, or `None` if `id` is not a door.
    pub fn toggle_door(&mut self, id: OccupantId) -> Option<bool> {
        let Role::Door(door) = &mut self.world.occupants.get_mut(id)?.role else {
            return None;
        };
        door.closed = !door.closed;
        let closed = door.closed;
        self.world.log.push(LogEvent::DoorToggled { door: id, closed });
        let sighted: Vec<OccupantId> = self
            .world
            .occupants
            .iter()
            .filter(|(_, occupant)| occupant.vision_range > 0)
            .map(|(id, _)| id)
            .collect();
        for viewer in sighted {
            self.world.refresh_sight(viewer);
        }
        Some(closed)
    }

    /// The map with occupants drawn over it: `@` avatar, `a` agent, `+` closed and `'` open door.
    pub fn render_ascii(&self) -> String {
        let map = &self.world.map;
        let mut text = String::with_capacity((map.width() + 1) * map.height());
        for y in 0..map.height() as i32 {
            for x in 0..map.width() as i32 {
                let pos = Pos { y, x };
                let glyph = match self.occupant_at(pos).map(|occupant| &occupant.role) {
                    Some(Role::Avatar(_)) => '@',
                    Some(Role::Agent(_)) => 'a',
                    Some(Role::Door(door)) if door.closed => '+',
                    Some(Role::Door(_)) => '\'',
                    None => tile_glyph(map.grid().kind(pos)),
                };
                text.push(glyph);
            }
            text.push('\n');
        }
        text
    }
}

impl World {
    /// Prefers occupants that block pathing so a creature standing in a doorway wins over the
    /// door.
    fn occupant_at(&self, pos: Pos, except: Option<OccupantId>) -> Option<&Occupant> {
        let mut found = None;
        for (id, occupant) in &self.occupants {
            if occupant.pos != pos || Some(id) == except {
                continue;
            }
            if occupant.blocks_pathing() {
                return Some(occupant);
            }
            found.get_or_insert(occupant);
        }
        found
    }

    fn is_blocking_tile(&self, pos: Pos) -> bool {
        !self.map.grid().is_node(pos)
            || self.occupants.values().any(|occupant| occupant.pos == pos && occupant.blocks_sight())
    }

    fn is_held(&self, pos: Pos, except: OccupantId) -> bool {
        self.occupants
            .iter()
            .any(|(id, occupant)| id != except && occupant.pos == pos && occupant.blocks_pathing())
    }

    fn update_line_of_sight(&mut self, id: OccupantId) {
        let Some(occupant) = self.occupants.get(id) else {
            return;
        };
        let mut visible = BTreeSet::new();
        compute_fov(
            occupant.pos,
            occupant.vision_range,
            |pos| self.is_blocking_tile(pos),
            |pos| {
                visible.insert(pos);
            },
        );
        if let Some(occupant) = self.occupants.get_mut(id) {
            occupant.remember_visible(visible);
        }
    }

    fn update_visible_occupants(&mut self, id: OccupantId) {
        let Some(viewer) = self.occupants.get(id) else {
            return;
        };
        let seen: BTreeSet<OccupantId> = self
            .occupants
            .iter()
            .filter(|&(other, occupant)| other != id && viewer.sees_tile(occupant.pos))
            .map(|(other, _)| other)
            .collect();
        if let Some(viewer) = self.occupants.get_mut(id) {
            viewer.visible_occupants = seen;
        }
    }

    fn refresh_sight(&mut self, id: OccupantId) {
        self.update_line_of_sight(id);
        self.update_visible_occupants(id);
    }

    fn sightings(&self, id: OccupantId) -> Vec<Sighting> {
        let Some(viewer) = self.occupants.get(id) else {
            return Vec::new();
        };
        viewer
            .visible_occupants
            .iter()
            .filter_map(|&other| {
                self.occupants.get(other).map(|occupant| Sighting {
                    id: other,
                    pos: occupant.pos,
                    allegiance: occupant.allegiance,
                })
            })
            .collect()
    }

    fn remove(&mut self, id: OccupantId) -> Option<Occupant> {
        let removed = self.occupants.remove(id)?;
        if self.avatar == Some(id) {
            self.avatar = None;
        }
        for occupant in self.occupants.values_mut() {
            occupant.visible_occupants.remove(&id);
        }
        Some(removed)
    }

    fn resolve_move(&mut self, id: OccupantId, action: Action, target: Pos) -> i32 {
        let Some(from) = self.occupants.get(id).map(|occupant| occupant.pos) else {
            return DEFAULT_ACTION_COST;
        };
        if !self.map.grid().is_node(target) || self.is_held(target, id) {
            trace!(?id, ?target, "move rejected");
            self.log.push(LogEvent::MoveRejected { occupant: id, target });
            return DEFAULT_ACTION_COST;
        }

        if let Some(occupant) = self.occupants.get_mut(id) {
            occupant.pos = target;
        }
        self.log.push(LogEvent::Moved { occupant: id, from, to: target });
        self.refresh_sight(id);

        let sightings = self.sightings(id);
        if let Some(Role::Agent(planner)) = self.occupants.get_mut(id).map(|o| &mut o.role) {
            planner.observe_after_move(&sightings);
        }
        if action.expected_cost > 0 { action.expected_cost } else { step_cost(from, target) }
    }
}

impl TurnWorld for World {
    fn turns(&self, id: OccupantId) -> i32 {
        self.occupants.get(id).map_or(0, |occupant| occupant.turns)
    }

    fn set_turns(&mut self, id: OccupantId, turns: i32) {
        if let Some(occupant) = self.occupants.get_mut(id) {
            occupant.turns = turns;
        }
    }

    fn flow_turns(&mut self, id: OccupantId, turns: i32) {
        let Some(occupant) = self.occupants.get_mut(id) else {
            return;
        };
        occupant.status.flow_turns(turns);
        if occupant.status.is_dead() {
            debug!(?id, "occupant died");
            self.remove(id);
            self.log.push(LogEvent::Died { occupant: id });
        }
    }

    fn plan_action(&mut self, id: OccupantId) -> Option<Action> {
        self.update_visible_occupants(id);
        let sightings = self.sightings(id);
        let World { map, occupants, rng, log, .. } = self;
        let occupant = occupants.get_mut(id)?;
        match &mut occupant.role {
            Role::Avatar(slot) => slot.pending.take(),
            Role::Agent(planner) => {
                let mut ctx = PlanContext {
                    id,
                    pos: occupant.pos,
                    allegiance: occupant.allegiance,
                    sightings: &sightings,
                    map,
                    rng,
                    events: log,
                };
                planner.plan(&mut ctx)
            }
            Role::Door(_) => None,
        }
    }

    fn resolve_action(&mut self, id: OccupantId, action: Option<Action>) -> i32 {
        let Some(action) = action else {
            self.log.push(LogEvent::Waited { occupant: id });
            return DEFAULT_ACTION_COST;
        };
        let requested =
            if action.expected_cost > 0 { action.expected_cost } else { DEFAULT_ACTION_COST };
        match action.kind {
            ActionKind::Wait => {
                self.log.push(LogEvent::Waited { occupant: id });
                requested
            }
            ActionKind::Move { target } => self.resolve_move(id, action, target),
            ActionKind::Attack { target } => {
                let defender = self.occupant_at(target, Some(id)).map(|occupant| occupant.id);
                self.log.push(LogEvent::Attacked { attacker: id, target, defender });
                requested
            }
        }
    }

    fn refresh_visibility(&mut self, id: OccupantId) {
        self.refresh_sight(id);
    }

    fn requires_input(&self, id: OccupantId) -> bool {
        self.occupants.get(id).is_some_and(Occupant::requires_input)
    }

    fn is_active(&self, id: OccupantId) -> bool {
        self.occupants.contains_key(id)
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;
    use crate::status::{Effect, EffectKind, Status};
    use crate::test_support::map_from_ascii;
    use crate::types::{AgentState, Allegiance, SchedulerStop};

    const HALL: &[&str] = &[
        "###########",
        "#.........#",
        "#.........#",
        "#####.#####",
        "    #.#    ",
        "    ###    ",
    ];

    fn level(rows: &[&str]) -> Level {
        Level::new(map_from_ascii(rows), ChaCha8Rng::seed_from_u64(5))
    }

    #[test]
    fn avatar_blocks_scheduler_until_input_arrives() {
        let mut level = level(HALL);
        let avatar = level.insert_occupant(Occupant::avatar(Pos::new(2, 1)));
        assert_eq!(level.avatar(), Some(avatar));

        let blocked = level.run_until_blocked(10);
        assert_eq!(blocked.stop_reason, SchedulerStop::AwaitingInput(avatar));

        assert!(level.submit_step(1, 0));
        let resumed = level.run_until_blocked(10);
        assert_eq!(resumed.resolved_actions, 1);
        assert_eq!(level.occupant(avatar).map(|o| o.pos), Some(Pos::new(3, 1)));
        assert_eq!(level.elapsed(), 100);
        assert!(level.log().contains(&LogEvent::Moved {
            occupant: avatar,
            from: Pos::new(2, 1),
            to: Pos::new(3, 1),
        }));
    }

    #[test]
    fn diagonal_step_costs_more_time() {
        let mut level = level(HALL);
        let avatar = level.insert_occupant(Occupant::avatar(Pos::new(2, 1)));
        level.run_until_blocked(1);
        assert!(level.submit_step(1, 1));
        level.run_until_blocked(10);
        assert_eq!(level.occupant(avatar).map(|o| o.pos), Some(Pos::new(3, 2)));
        assert_eq!(level.elapsed(), 140);
    }

    #[test]
    fn steps_into_walls_are_refused_at_the_input_boundary() {
        let mut level = level(HALL);
        level.insert_occupant(Occupant::avatar(Pos::new(1, 1)));
        assert!(!level.submit_step(-1, 0));
        assert!(!level.submit_step(0, -1));
    }

    #[test]
    fn moves_into_held_cells_are_rejected_at_wait_cost() {
        let mut level = level(HALL);
        let avatar = level.insert_occupant(Occupant::avatar(Pos::new(2, 1)));
        level.insert_occupant(Occupant::agent(Pos::new(3, 1), Allegiance::None, AgentState::Idle));
        level.run_until_blocked(1);

        assert!(level.submit_action(Action::move_to(Pos::new(3, 1))));
        level.run_until_blocked(1);
        assert_eq!(level.occupant(avatar).map(|o| o.pos), Some(Pos::new(2, 1)));
        let rejected = LogEvent::MoveRejected { occupant: avatar, target: Pos::new(3, 1) };
        assert!(level.log().contains(&rejected));
        assert_eq!(level.occupant(avatar).map(|o| o.turns), Some(100));
    }

    #[test]
    fn sight_is_cut_by_walls_and_closed_doors() {
        let mut level = level(HALL);
        let avatar = level.insert_occupant(Occupant::avatar(Pos::new(5, 1)));
        let door = level.insert_occupant(Occupant::door(Pos::new(5, 3)));
        let below = Pos::new(5, 4);
        let sees = |level: &Level, pos| level.occupant(avatar).is_some_and(|o| o.sees_tile(pos));

        assert!(sees(&level, below));
        assert_eq!(level.toggle_door(door), Some(true));
        assert!(!sees(&level, below));
        assert!(sees(&level, Pos::new(5, 3)));
        assert!(level.occupant(avatar).is_some_and(|o| o.knows_tile(below)));
        assert_eq!(level.toggle_door(door), Some(false));
        assert!(sees(&level, below));
        assert_eq!(level.toggle_door(avatar), None);
    }

    #[test]
    fn hunting_agent_closes_in_and_attacks() {
        let mut level = level(HALL);
        let avatar = level.insert_occupant(Occupant::avatar(Pos::new(1, 1)));
        let agent = level.insert_occupant(Occupant::agent(
            Pos::new(5, 1),
            Allegiance::Dungeon,
            AgentState::Idle,
        ));

        for _ in 0..5 {
            level.run_until_blocked(10);
            level.submit_action(Action::wait());
        }
        level.run_until_blocked(10);

        let state = level.occupant(agent).and_then(Occupant::agent_state);
        assert_eq!(state, Some(AgentState::Hunting));
        assert_eq!(level.occupant(agent).map(|o| o.pos), Some(Pos::new(2, 1)));
        assert!(level.log().iter().any(|event| matches!(
            event,
            LogEvent::Attacked { attacker, defender: Some(defender), .. }
                if *attacker == agent && *defender == avatar
        )));
    }

    #[test]
    fn lethal_effects_remove_the_occupant() {
        let mut level = level(HALL);
        let status = Status::new(3);
        let mut poisoned = Occupant::agent(Pos::new(7, 1), Allegiance::Dungeon, AgentState::Idle)
            .with_status(status);
        poisoned.status.add_effect(Effect::new("poison", EffectKind::Poison, 2.0, 300));
        let victim = level.insert_occupant(poisoned);
        let bystander =
            level.insert_occupant(Occupant::agent(Pos::new(1, 2), Allegiance::None, AgentState::Idle));

        level.run_until_blocked(6);
        assert!(level.occupant(victim).is_none());
        assert!(level.occupant(bystander).is_some());
        assert!(level.log().contains(&LogEvent::Died { occupant: victim }));
        assert!(!level.queue().contains(victim));
    }

    #[test]
    fn removed_occupants_leave_the_queue_and_everyones_sight() {
        let mut level = level(HALL);
        let avatar = level.insert_occupant(Occupant::avatar(Pos::new(1, 1)).with_vision_range(3));
        let idle = Occupant::agent(Pos::new(3, 1), Allegiance::None, AgentState::Idle);
        let agent = level.insert_occupant(idle);
        assert_eq!(level.queue().len(), 2);
        let sees = |level: &Level, pos| level.occupant(avatar).is_some_and(|o| o.sees_tile(pos));
        assert!(sees(&level, Pos::new(2, 1)));
        assert!(!sees(&level, Pos::new(9, 1)));

        level.run_until_blocked(1);
        assert!(level.occupant(avatar).is_some_and(|o| o.visible_occupants.contains(&agent)));

        let removed = level.remove_occupant(agent).expect("agent was present");
        assert_eq!(removed.planner().map(|planner| planner.state()), Some(AgentState::Idle));
        assert_eq!(level.queue().len(), 1);
        assert!(!level.queue().contains(agent));
        assert!(level.occupant_at(Pos::new(3, 1)).is_none());
        assert!(level.occupant(avatar).is_some_and(|o| o.visible_occupants.is_empty()));
        assert!(level.remove_occupant(agent).is_none());

        level.remove_occupant(avatar);
        assert_eq!(level.avatar(), None);
        assert_eq!(level.run_until_blocked(5).stop_reason, SchedulerStop::Drained);
    }

    #[test]
    fn ascii_overlay_marks_occupants() {
        let mut level = level(HALL);
        level.insert_occupant(Occupant::avatar(Pos::new(1, 1)));
        level.insert_occupant(Occupant::agent(Pos::new(3, 1), Allegiance::Dungeon, AgentState::Idle));
        let door = level.insert_occupant(Occupant::door(Pos::new(5, 3)));
        level.toggle_door(door);

        let text = level.render_ascii();
        let rows: Vec<&str> = text.lines().collect();
        assert_eq!(rows[1], "#@.a......#");
        assert_eq!(rows[3], "#####+#####");
    }
}

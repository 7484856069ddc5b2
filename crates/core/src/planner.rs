//! This module exists to turn what an agent can see into its next action.
//!
//! It does not own occupants or resolve actions: it reads a [`PlanContext`] snapshot built by
//! the level and returns an optional [`Action`]. `None` means the agent passes its turn.

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use tracing::trace;

use crate::action::{Action, DEFAULT_ACTION_COST, DIAGONAL_MOVE_COST};
use crate::mapgen::LevelMap;
use crate::types::{AgentState, Allegiance, LogEvent, OccupantId, Pos};

/// A visible occupant as seen at planning time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Sighting {
    pub id: OccupantId,
    pub pos: Pos,
    pub allegiance: Allegiance,
}

pub struct PlanContext<'a> {
    pub id: OccupantId,
    pub pos: Pos,
    pub allegiance: Allegiance,
    pub sightings: &'a [Sighting],
    pub map: &'a LevelMap,
    pub rng: &'a mut ChaCha8Rng,
    pub events: &'a mut Vec<LogEvent>,
}

impl PlanContext<'_> {
    fn sighting(&self, id: OccupantId) -> Option<Sighting> {
        self.sightings.iter().copied().find(|sighting| sighting.id == id)
    }
}

pub trait Planner {
    fn plan(&mut self, ctx: &mut PlanContext<'_>) -> Option<Action>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AgentPlanner {
    state: AgentState,
    target: Option<OccupantId>,
    target_last_known: Pos,
}

impl AgentPlanner {
    pub fn new(state: AgentState) -> Self {
        Self { state, target: None, target_last_known: Pos::new(0, 0) }
    }

    pub fn state(&self) -> AgentState {
        self.state
    }

    pub fn target(&self) -> Option<OccupantId> {
        self.target
    }

    pub fn target_last_known(&self) -> Pos {
        self.target_last_known
    }

    /// Called after the agent's own move resolved and its sight was refreshed.
    pub fn observe_after_move(&mut self, sightings: &[Sighting]) {
        let Some(target) = self.target else {
            return;
        };
        if let Some(seen) = sightings.iter().find(|sighting| sighting.id == target) {
            self.target_last_known = seen.pos;
            trace!(?target, pos = ?seen.pos, "target still in sight after move");
        }
    }

    fn transition(&mut self, next: AgentState) {
        if self.state != next {
            trace!(from = ?self.state, to = ?next, "agent state change");
            self.state = next;
        }
    }

    /// Closest visible foe by Manhattan distance; ties keep sighting order.
    fn acquire_target(&mut self, ctx: &mut PlanContext<'_>) -> bool {
        let Some(foe) = ctx.allegiance.foe() else {
            return false;
        };
        let Some(closest) = ctx
            .sightings
            .iter()
            .filter(|sighting| sighting.allegiance == foe)
            .min_by_key(|sighting| sighting.pos.manhattan(ctx.pos))
        else {
            return false;
        };
        self.target = Some(closest.id);
        self.target_last_known = closest.pos;
        ctx.events.push(LogEvent::TargetAcquired { agent: ctx.id, target: closest.id });
        true
    }

    /// No agent ever raises an alert for others yet.
    fn check_alert_status(&self) -> bool {
        false
    }

    fn wandering(&mut self, ctx: &mut PlanContext<'_>) -> Option<Action> {
        if !ctx.rng.gen_bool(0.5) {
            return None;
        }
        let dx = ctx.rng.gen_range(-1..=1);
        let dy = ctx.rng.gen_range(-1..=1);
        let cost = if dx * dx + dy * dy > 1 { DIAGONAL_MOVE_COST } else { DEFAULT_ACTION_COST };
        Some(Action::move_to(ctx.pos.offset(dx, dy)).with_cost(cost))
    }

    fn hunting(&mut self, ctx: &mut PlanContext<'_>) -> Option<Action> {
        let target = self.target?;
        let seen = ctx.sighting(target);
        match seen {
            Some(sighting) => self.target_last_known = sighting.pos,
            None if ctx.pos == self.target_last_known => {
                trace!(?target, "lost target");
                self.target = None;
                ctx.events.push(LogEvent::TargetLost { agent: ctx.id });
                self.transition(AgentState::Alerted);
                return None;
            }
            None => {}
        }

        // Two cells means melee range; one means we stand on the last known position.
        let path = ctx.map.shortest_path(ctx.pos, self.target_last_known);
        let next = *path.get(1)?;
        match seen {
            Some(sighting) if sighting.pos == next => Some(Action::attack(next)),
            _ => Some(Action::move_to(next)),
        }
    }
}

impl Planner for AgentPlanner {
    fn plan(&mut self, ctx: &mut PlanContext<'_>) -> Option<Action> {
        if self.target.is_none() {
            if self.acquire_target(ctx) {
                trace!(target = ?self.target, at = ?self.target_last_known, "saw target");
                self.transition(AgentState::Hunting);
            } else if self.check_alert_status() {
                self.transition(AgentState::Alerted);
            }
        }

        match self.state {
            AgentState::Asleep | AgentState::Idle | AgentState::Alerted | AgentState::Fleeing => {
                None
            }
            AgentState::Wandering => self.wandering(ctx),
            AgentState::Hunting => self.hunting(ctx),
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use slotmap::SlotMap;

    use super::*;
    use crate::action::ActionKind;
    use crate::test_support::map_from_ascii;

    struct Fixture {
        map: LevelMap,
        rng: ChaCha8Rng,
        events: Vec<LogEvent>,
        ids: Vec<OccupantId>,
    }

    impl Fixture {
        fn new(rows: &[&str]) -> Self {
            let mut arena: SlotMap<OccupantId, ()> = SlotMap::with_key();
            let ids = (0..4).map(|_| arena.insert(())).collect();
            Self {
                map: map_from_ascii(rows),
                rng: ChaCha8Rng::seed_from_u64(17),
                events: Vec::new(),
                ids,
            }
        }

        fn plan(
            &mut self,
            planner: &mut AgentPlanner,
            pos: Pos,
            allegiance: Allegiance,
            sightings: &[Sighting],
        ) -> Option<Action> {
            let mut ctx = PlanContext {
                id: self.ids[0],
                pos,
                allegiance,
                sightings,
                map: &self.map,
                rng: &mut self.rng,
                events: &mut self.events,
            };
            planner.plan(&mut ctx)
        }
    }

    const CORRIDOR: &[&str] = &["#########", "#.......#", "#########"];

    #[test]
    fn acquires_closest_foe_and_ignores_friends() {
        let mut fx = Fixture::new(CORRIDOR);
        let (friend, far, near) = (fx.ids[1], fx.ids[2], fx.ids[3]);
        let sightings = [
            Sighting { id: friend, pos: Pos::new(2, 1), allegiance: Allegiance::Dungeon },
            Sighting { id: far, pos: Pos::new(7, 1), allegiance: Allegiance::Player },
            Sighting { id: near, pos: Pos::new(5, 1), allegiance: Allegiance::Player },
        ];
        let mut planner = AgentPlanner::new(AgentState::Idle);
        let action = fx.plan(&mut planner, Pos::new(1, 1), Allegiance::Dungeon, &sightings);

        assert_eq!(planner.state(), AgentState::Hunting);
        assert_eq!(planner.target(), Some(near));
        assert_eq!(action, Some(Action::move_to(Pos::new(2, 1))));
        assert_eq!(fx.events, vec![LogEvent::TargetAcquired { agent: fx.ids[0], target: near }]);
    }

    #[test]
    fn neutral_agents_never_acquire() {
        let mut fx = Fixture::new(CORRIDOR);
        let sightings =
            [Sighting { id: fx.ids[1], pos: Pos::new(2, 1), allegiance: Allegiance::Player }];
        let mut planner = AgentPlanner::new(AgentState::Idle);
        assert_eq!(fx.plan(&mut planner, Pos::new(1, 1), Allegiance::None, &sightings), None);
        assert_eq!(planner.state(), AgentState::Idle);
    }

    #[test]
    fn adjacent_visible_target_is_attacked() {
        let mut fx = Fixture::new(CORRIDOR);
        let sightings =
            [Sighting { id: fx.ids[1], pos: Pos::new(4, 1), allegiance: Allegiance::Player }];
        let mut planner = AgentPlanner::new(AgentState::Idle);
        let action = fx.plan(&mut planner, Pos::new(3, 1), Allegiance::Dungeon, &sightings);
        assert_eq!(
            action.map(|action| action.kind),
            Some(ActionKind::Attack { target: Pos::new(4, 1) })
        );
    }

    #[test]
    fn hunting_walks_to_last_known_position_then_alerts() {
        let mut fx = Fixture::new(CORRIDOR);
        let target = fx.ids[1];
        let mut planner = AgentPlanner::new(AgentState::Idle);
        let mut pos = Pos::new(1, 1);
        let seen = [Sighting { id: target, pos: Pos::new(4, 1), allegiance: Allegiance::Player }];
        let first = fx.plan(&mut planner, pos, Allegiance::Dungeon, &seen);
        assert_eq!(first, Some(Action::move_to(Pos::new(2, 1))));
        pos = Pos::new(2, 1);

        let mut steps = 1;
        while let Some(action) = fx.plan(&mut planner, pos, Allegiance::Dungeon, &[]) {
            let ActionKind::Move { target } = action.kind else {
                panic!("unexpected action {action:?}");
            };
            pos = target;
            steps += 1;
        }
        assert_eq!(steps, 3);
        assert_eq!(pos, Pos::new(4, 1));
        assert_eq!(planner.state(), AgentState::Alerted);
        assert_eq!(planner.target(), None);
        assert_eq!(fx.events.last(), Some(&LogEvent::TargetLost { agent: fx.ids[0] }));
    }

    #[test]
    fn unreachable_last_known_position_yields_no_action() {
        let mut fx = Fixture::new(&["#####", "#.#.#", "#####"]);
        let seen = [Sighting { id: fx.ids[1], pos: Pos::new(3, 1), allegiance: Allegiance::Player }];
        let mut planner = AgentPlanner::new(AgentState::Idle);
        assert_eq!(fx.plan(&mut planner, Pos::new(1, 1), Allegiance::Dungeon, &seen), None);
        assert_eq!(planner.state(), AgentState::Hunting);
    }

    #[test]
    fn wandering_moves_at_most_one_cell_with_matching_cost() {
        let mut fx = Fixture::new(CORRIDOR);
        let mut planner = AgentPlanner::new(AgentState::Wandering);
        let origin = Pos::new(4, 1);
        let mut moved = 0;
        for _ in 0..64 {
            if let Some(action) = fx.plan(&mut planner, origin, Allegiance::Dungeon, &[]) {
                let ActionKind::Move { target } = action.kind else {
                    panic!("wandering only moves");
                };
                assert!(origin.distance_squared(target) <= 2);
                let expected = if origin.distance_squared(target) > 1 { 140 } else { 100 };
                assert_eq!(action.expected_cost, expected);
                moved += 1;
            }
        }
        assert!(moved > 0 && moved < 64);
        assert_eq!(planner.state(), AgentState::Wandering);
    }

    #[test]
    fn observe_after_move_tracks_visible_target() {
        let mut fx = Fixture::new(CORRIDOR);
        let target = fx.ids[1];
        let mut planner = AgentPlanner::new(AgentState::Idle);
        let seen = [Sighting { id: target, pos: Pos::new(6, 1), allegiance: Allegiance::Player }];
        fx.plan(&mut planner, Pos::new(1, 1), Allegiance::Dungeon, &seen);

        let moved = Sighting { id: target, pos: Pos::new(7, 1), allegiance: Allegiance::Player };
        planner.observe_after_move(&[moved]);
        assert_eq!(planner.target_last_known(), Pos::new(7, 1));
        planner.observe_after_move(&[]);
        assert_eq!(planner.target_last_known(), Pos::new(7, 1));
    }
}

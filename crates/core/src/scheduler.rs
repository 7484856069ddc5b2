//! Time-ordered turn queue.
//!
//! This module exists to decide who acts next and to let game time flow between actions.
//! It does not own occupants: every read and write of an occupant goes through [`TurnWorld`],
//! so the queue holds nothing but ids.

use std::collections::VecDeque;

use tracing::{debug, trace};

use crate::action::Action;
use crate::types::{OccupantId, RunResult, SchedulerStop};

/// What the queue needs from whoever owns the occupants.
pub trait TurnWorld {
    /// Remaining delay before the occupant acts.
    fn turns(&self, id: OccupantId) -> i32;
    fn set_turns(&mut self, id: OccupantId, turns: i32);
    /// Lets status effects advance by `turns` of game time.
    fn flow_turns(&mut self, id: OccupantId, turns: i32);
    /// Refreshes what the occupant sees of other occupants, then asks it for an action.
    fn plan_action(&mut self, id: OccupantId) -> Option<Action>;
    /// Applies the action and returns its turn cost.
    fn resolve_action(&mut self, id: OccupantId, action: Option<Action>) -> i32;
    fn refresh_visibility(&mut self, id: OccupantId);
    fn requires_input(&self, id: OccupantId) -> bool;
    fn is_active(&self, id: OccupantId) -> bool;
}

#[derive(Clone, Debug, Default)]
pub struct TurnQueue {
    queue: VecDeque<OccupantId>,
    elapsed: u64,
}

impl TurnQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn contains(&self, id: OccupantId) -> bool {
        self.queue.contains(&id)
    }

    /// Queue order, next to act first.
    pub fn iter(&self) -> impl Iterator<Item = OccupantId> + '_ {
        self.queue.iter().copied()
    }

    pub fn peek(&self) -> Option<OccupantId> {
        self.queue.front().copied()
    }

    /// Total game time that has flowed through the queue.
    pub fn elapsed(&self) -> u64 {
        self.elapsed
    }

    /// Sets the occupant's delay and slots it in before the first entry with a strictly
    /// larger delay. Equal delays queue behind the ones already waiting.
    pub fn enqueue<W: TurnWorld + ?Sized>(&mut self, world: &mut W, id: OccupantId, delay: i32) {
        world.set_turns(id, delay);
        let at = self.queue.iter().position(|&other| world.turns(other) > delay);
        match at {
            Some(index) => self.queue.insert(index, id),
            None => self.queue.push_back(id),
        }
    }

    pub fn remove(&mut self, id: OccupantId) -> bool {
        let before = self.queue.len();
        self.queue.retain(|&other| other != id);
        self.queue.len() != before
    }

    /// Resolves actions in time order until the head needs input, the queue empties or
    /// `max_actions` actions have resolved.
    pub fn run_until_blocked<W: TurnWorld + ?Sized>(
        &mut self,
        world: &mut W,
        max_actions: u32,
    ) -> RunResult {
        let mut resolved = 0;
        while resolved < max_actions {
            let Some(head) = self.queue.front().copied() else {
                return RunResult { resolved_actions: resolved, stop_reason: SchedulerStop::Drained };
            };
            if !world.is_active(head) {
                self.queue.pop_front();
                trace!(?head, "dropped inactive occupant");
                continue;
            }

            let delay = world.turns(head);
            if delay > 0 {
                self.flow(world, delay);
                if !world.is_active(head) {
                    continue;
                }
            }

            let action = world.plan_action(head);
            if action.is_none() && world.requires_input(head) {
                debug!(?head, resolved, "awaiting input");
                return RunResult {
                    resolved_actions: resolved,
                    stop_reason: SchedulerStop::AwaitingInput(head),
                };
            }

            let cost = world.resolve_action(head, action);
            world.refresh_visibility(head);
            self.queue.pop_front();
            if world.is_active(head) {
                self.enqueue(world, head, cost);
            }
            resolved += 1;
        }
        RunResult { resolved_actions: resolved, stop_reason: SchedulerStop::BudgetExhausted }
    }

    fn flow<W: TurnWorld + ?Sized>(&mut self, world: &mut W, delay: i32) {
        for &id in &self.queue {
            let remaining = world.turns(id) - delay;
            world.set_turns(id, remaining);
            world.flow_turns(id, delay);
        }
        self.elapsed += delay as u64;
    }
}

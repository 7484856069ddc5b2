//! Health and timed effects carried by occupants.
//! Effects advance only through [`Status::flow_turns`], which the scheduler drives whenever
//! game time passes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EffectKind {
    Pure,
    Physical,
    Wet,
    Fire,
    Frost,
    Poison,
    Electric,
}

pub const DEFAULT_EFFECT_INTERVAL: i32 = 100;

#[derive(Clone, Debug, PartialEq)]
pub struct Effect {
    pub name: String,
    pub kind: EffectKind,
    /// Damage dealt per full interval.
    pub strength: f32,
    pub initial_turns: i32,
    pub turns: i32,
    interval: i32,
    pub partial_interval: i32,
}

impl Effect {
    pub fn new(name: impl Into<String>, kind: EffectKind, strength: f32, turns: i32) -> Self {
        Self {
            name: name.into(),
            kind,
            strength,
            initial_turns: turns,
            turns,
            interval: DEFAULT_EFFECT_INTERVAL,
            partial_interval: 0,
        }
    }

    pub fn with_interval(mut self, interval: i32) -> Self {
        self.interval = interval.max(1);
        self
    }

    pub fn interval(&self) -> i32 {
        self.interval
    }

    fn is_spent(&self) -> bool {
        self.initial_turns > 0 && self.turns <= 0
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Status {
    max_health: i32,
    health: i32,
    factors: BTreeMap<EffectKind, f32>,
    effects: Vec<Effect>,
}

impl Status {
    pub fn new(health: i32) -> Self {
        Self { max_health: health, health, factors: BTreeMap::new(), effects: Vec::new() }
    }

    pub fn with_factor(mut self, kind: EffectKind, factor: f32) -> Self {
        self.factors.insert(kind, factor);
        self
    }

    pub fn health(&self) -> i32 {
        self.health
    }

    pub fn max_health(&self) -> i32 {
        self.max_health
    }

    pub fn is_dead(&self) -> bool {
        self.health == 0
    }

    pub fn effects(&self) -> &[Effect] {
        &self.effects
    }

    pub fn effect_of_kind(&self, kind: EffectKind) -> Option<&Effect> {
        self.effects.iter().find(|effect| effect.kind == kind)
    }

    /// Applies `strength` scaled by the kind's factor, truncated and clamped to `[0, max]`.
    pub fn damage(&mut self, strength: f32, kind: EffectKind) {
        let factor = self.factors.get(&kind).copied().unwrap_or(1.0);
        let dealt = ((strength * factor) as i32).max(0);
        self.health = (self.health - dealt).clamp(0, self.max_health);
    }

    pub fn add_effect(&mut self, effect: Effect) {
        self.effects.push(effect);
    }

    /// Advances every effect by `turns`, in chunks no larger than its interval.
    /// Each chunk deals `strength * chunk / interval`. Finite effects whose turns ran out are
    /// dropped; effects created with zero turns are passive and stay.
    pub fn flow_turns(&mut self, turns: i32) {
        let mut damage = Vec::new();
        for effect in &mut self.effects {
            let interval = effect.interval.max(1);
            let mut remaining = turns + effect.partial_interval;
            while remaining > 0 && effect.turns > 0 {
                let chunk = remaining.min(interval).min(effect.turns);
                remaining -= chunk;
                effect.turns -= chunk;
                damage.push((effect.strength * chunk as f32 / interval as f32, effect.kind));
            }
            effect.partial_interval = remaining;
        }
        self.effects.retain(|effect| !effect.is_spent());
        for (strength, kind) in damage {
            self.damage(strength, kind);
        }
    }
}

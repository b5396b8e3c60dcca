//! RelicInstance - An owned relic with its runtime counters

use super::{RelicDef, RelicEffect, RelicTriggers};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// A relic the player owns
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelicInstance {
    def: Arc<RelicDef>,
    /// Disabled relics fire no hooks and modify nothing
    pub enabled: bool,
    pub counter: i32,
    /// Number of times a hook produced effects
    pub uses: u32,
    #[serde(default)]
    pub data: HashMap<String, serde_json::Value>,
}

impl RelicInstance {
    pub fn new(def: Arc<RelicDef>) -> Self {
        RelicInstance {
            def,
            enabled: true,
            counter: 0,
            uses: 0,
            data: HashMap::new(),
        }
    }

    pub fn def(&self) -> &RelicDef {
        &self.def
    }

    pub fn id(&self) -> &str {
        &self.def.id
    }

    /// Advance the counter; true when it reaches `counter_max` (counter resets to 0)
    pub fn increment_counter(&mut self) -> bool {
        if self.def.counter_max <= 0 {
            return false;
        }
        self.counter += 1;
        if self.counter >= self.def.counter_max {
            self.counter = 0;
            true
        } else {
            false
        }
    }

    /// Whether a hook for `trigger` should run
    pub fn responds_to(&self, trigger: RelicTriggers) -> bool {
        self.enabled && self.def.listens_to(trigger)
    }

    /// Run a hook if this relic responds to `trigger`
    ///
    /// `AdvanceCounter` entries are consumed here; when the counter wraps the
    /// def's `on_counter_reached` effects are appended in their place.
    pub fn fire<F>(&mut self, trigger: RelicTriggers, hook: F) -> Vec<RelicEffect>
    where
        F: FnOnce(&RelicDef) -> Vec<RelicEffect>,
    {
        if !self.responds_to(trigger) {
            return Vec::new();
        }

        let def = Arc::clone(&self.def);
        let mut effects = Vec::new();
        for effect in hook(&def) {
            match effect {
                RelicEffect::AdvanceCounter => {
                    if self.increment_counter() {
                        tracing::debug!(relic = %def.id, "counter reached");
                        effects.extend(def.on_counter_reached());
                    }
                }
                other => effects.push(other),
            }
        }

        if !effects.is_empty() {
            self.uses += 1;
        }
        effects
    }

    /// Run a modifier if this relic responds to `trigger`, otherwise pass `value` through
    pub fn modify<F>(&self, trigger: RelicTriggers, value: i32, modifier: F) -> i32
    where
        F: FnOnce(&RelicDef, i32) -> i32,
    {
        if self.responds_to(trigger) {
            modifier(&self.def, value)
        } else {
            value
        }
    }
}

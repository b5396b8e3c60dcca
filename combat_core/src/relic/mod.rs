//! Relic system - Passive items that react to combat events

mod def;
mod instance;

pub use def::{RelicDef, RelicEffect, RelicKind, RelicRarity, RelicTriggers};
pub use instance::RelicInstance;

use crate::combatant::{Combatant, PlayerCombatant};
use crate::error::{CombatError, CombatResult};
use std::collections::HashMap;
use std::sync::Arc;

/// Relic catalog
#[derive(Debug, Clone, Default)]
pub struct RelicRegistry {
    defs: HashMap<String, Arc<RelicDef>>,
}

impl RelicRegistry {
    pub fn new() -> Self {
        RelicRegistry {
            defs: HashMap::new(),
        }
    }

    /// Register a relic; duplicates are rejected
    pub fn register(&mut self, def: RelicDef) -> CombatResult<()> {
        if self.defs.contains_key(&def.id) {
            return Err(CombatError::AlreadyExists(def.id));
        }
        self.defs.insert(def.id.clone(), Arc::new(def));
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Arc<RelicDef>> {
        self.defs.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.defs.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    /// Sorted ids
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.defs.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn create_instance(&self, id: &str) -> CombatResult<RelicInstance> {
        self.get(id)
            .map(|def| RelicInstance::new(Arc::clone(def)))
            .ok_or_else(|| CombatError::NotFound(id.to_string()))
    }

    /// Registered, and not a unique relic the player already owns
    pub fn can_obtain(&self, id: &str, owned: &[RelicInstance]) -> bool {
        match self.get(id) {
            Some(def) => !def.unique || owned.iter().all(|r| r.id() != id),
            None => false,
        }
    }

    /// Add a relic to `owned` and apply its pickup effects to the player
    ///
    /// Pickup happens outside combat, so only persistent effects (gold, heal,
    /// max health) are applied; anything else is logged and dropped.
    pub fn obtain(
        &self,
        id: &str,
        player: &mut PlayerCombatant,
        owned: &mut Vec<RelicInstance>,
    ) -> CombatResult<()> {
        if !self.contains(id) {
            return Err(CombatError::NotFound(id.to_string()));
        }
        if !self.can_obtain(id, owned) {
            return Err(CombatError::AlreadyExists(id.to_string()));
        }

        let mut relic = self.create_instance(id)?;
        let effects = relic.fire(RelicTriggers::OBTAIN, |def| def.on_obtain());
        apply_persistent_effects(id, player, effects);
        tracing::info!(relic = %id, "relic obtained");
        owned.push(relic);
        Ok(())
    }

    /// Remove the first owned relic with `id`, running its removal hook
    pub fn remove(
        &self,
        id: &str,
        player: &mut PlayerCombatant,
        owned: &mut Vec<RelicInstance>,
    ) -> CombatResult<RelicInstance> {
        let pos = owned
            .iter()
            .position(|r| r.id() == id)
            .ok_or_else(|| CombatError::NotFound(id.to_string()))?;
        let mut relic = owned.remove(pos);
        let effects = relic.fire(RelicTriggers::REMOVE, |def| def.on_remove());
        apply_persistent_effects(id, player, effects);
        Ok(relic)
    }

    /// Registry with the bundled relic catalog
    pub fn with_defaults() -> Self {
        crate::config::default_relics()
    }
}

fn apply_persistent_effects(relic_id: &str, player: &mut PlayerCombatant, effects: Vec<RelicEffect>) {
    for effect in effects {
        match effect {
            RelicEffect::GainGold { amount } => {
                player.add_gold(amount);
            }
            RelicEffect::Heal { amount } => {
                player.heal(amount);
            }
            RelicEffect::GainMaxHealth { amount } => {
                let max = player.max_health() + amount;
                player.set_max_health(max);
                player.heal(amount);
            }
            other => tracing::warn!(relic = %relic_id, effect = ?other, "effect ignored outside combat"),
        }
    }
}

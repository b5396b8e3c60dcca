//! Enemy system - Intents, archetypes, AI behavior, and live instances

mod def;
mod instance;
mod intent;

pub use def::{EnemyBehavior, EnemyDef, IntentAction, IntentPattern, PassiveBehavior, StandardBehavior};
pub use instance::EnemyInstance;
pub use intent::{EnemyIntent, IntentType};

use crate::error::{CombatError, CombatResult};
use rand::Rng;
use std::collections::HashMap;
use std::sync::Arc;

/// Enemy archetype registry
#[derive(Debug, Clone, Default)]
pub struct EnemyRegistry {
    defs: HashMap<String, Arc<EnemyDef>>,
}

impl EnemyRegistry {
    pub fn new() -> Self {
        EnemyRegistry {
            defs: HashMap::new(),
        }
    }

    /// Register an archetype; duplicates are rejected
    pub fn register(&mut self, def: EnemyDef) -> CombatResult<()> {
        if self.defs.contains_key(&def.id) {
            return Err(CombatError::AlreadyExists(def.id));
        }
        self.defs.insert(def.id.clone(), Arc::new(def));
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Arc<EnemyDef>> {
        self.defs.get(id)
    }

    /// Mutable access for pre-combat tuning (difficulty scaling)
    ///
    /// Instances already spawned keep the archetype they were created from.
    pub fn get_mut(&mut self, id: &str) -> Option<&mut EnemyDef> {
        self.defs.get_mut(id).map(Arc::make_mut)
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    /// Spawn an instance of a registered archetype
    pub fn spawn<R: Rng + ?Sized>(
        &self,
        id: &str,
        instance_id: impl Into<String>,
        rng: &mut R,
    ) -> CombatResult<EnemyInstance> {
        let def = self
            .get(id)
            .ok_or_else(|| CombatError::NotFound(id.to_string()))?;
        Ok(EnemyDef::spawn(def, instance_id, rng))
    }

    /// Registry with the bundled enemy catalog
    pub fn with_defaults() -> Self {
        crate::config::default_enemies()
    }
}

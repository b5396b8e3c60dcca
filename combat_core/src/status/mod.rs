//! Status effect system - Catalog, per-owner stacks, and hook dispatch

mod def;
mod instance;

pub use def::{StatusAction, StatusEffectDef, StatusKind};
pub use instance::{StackChange, StatusEffectInstance, StatusMap};

use crate::error::{CombatError, CombatResult};
use std::collections::HashMap;
use std::sync::Arc;

/// Ids of the statuses the rules formulas read directly
pub mod ids {
    pub const STRENGTH: &str = "strength";
    pub const DEXTERITY: &str = "dexterity";
    pub const WEAK: &str = "weak";
    pub const VULNERABLE: &str = "vulnerable";
    pub const FRAIL: &str = "frail";
    pub const INTANGIBLE: &str = "intangible";
    pub const ARTIFACT: &str = "artifact";
    pub const POISON: &str = "poison";
}

/// Status type registry
///
/// Owned by the run and borrowed by each combat. Definitions are immutable
/// once registered.
#[derive(Debug, Clone, Default)]
pub struct StatusRegistry {
    defs: HashMap<String, Arc<StatusEffectDef>>,
}

impl StatusRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        StatusRegistry {
            defs: HashMap::new(),
        }
    }

    /// Register a status type; duplicates are rejected and the existing entry kept
    pub fn register(&mut self, def: StatusEffectDef) -> CombatResult<()> {
        if self.defs.contains_key(&def.id) {
            return Err(CombatError::AlreadyExists(def.id));
        }
        self.defs.insert(def.id.clone(), Arc::new(def));
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Arc<StatusEffectDef>> {
        self.defs.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.defs.contains_key(id)
    }

    /// Whether `id` is registered as a debuff (unknown ids are not)
    pub fn is_debuff(&self, id: &str) -> bool {
        self.get(id).map(|d| d.is_debuff()).unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    /// Registered ids in sorted order
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.defs.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Registry with the bundled status catalog
    pub fn with_defaults() -> Self {
        crate::config::default_statuses()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StatusEffectType;

    #[test]
    fn test_register_duplicate_rejected() {
        let mut registry = StatusRegistry::new();
        registry
            .register(StatusEffectDef::new("weak", "Weak").with_type(StatusEffectType::Debuff))
            .unwrap();

        let result = registry.register(StatusEffectDef::new("weak", "Not Weak"));
        assert_eq!(result, Err(CombatError::AlreadyExists("weak".to_string())));
        assert_eq!(registry.get("weak").unwrap().name, "Weak");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_lookup_miss() {
        let registry = StatusRegistry::new();
        assert!(registry.get("nothing").is_none());
        assert!(!registry.is_debuff("nothing"));
    }

    #[test]
    fn test_defaults_cover_rule_statuses() {
        let registry = StatusRegistry::with_defaults();
        for id in [
            ids::STRENGTH,
            ids::DEXTERITY,
            ids::WEAK,
            ids::VULNERABLE,
            ids::FRAIL,
            ids::INTANGIBLE,
            ids::ARTIFACT,
            ids::POISON,
        ] {
            assert!(registry.contains(id), "missing {id}");
        }
        assert!(registry.is_debuff(ids::WEAK));
        assert!(!registry.is_debuff(ids::STRENGTH));
        assert_eq!(registry.get(ids::ARTIFACT).unwrap().kind, StatusKind::Artifact);
    }
}

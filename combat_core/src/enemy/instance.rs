//! EnemyInstance - A live enemy inside one combat

use super::{EnemyDef, EnemyIntent};
use crate::combatant::{Combatant, CombatantCore};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Runtime state of one enemy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnemyInstance {
    core: CombatantCore,
    def: Arc<EnemyDef>,
    /// Planned action shown to the player
    pub intent: Option<EnemyIntent>,
    /// Number of turns this enemy has taken
    pub turn_count: u32,
    /// Free-form AI bookkeeping
    #[serde(default)]
    pub data: HashMap<String, serde_json::Value>,
    /// Left the fight without dying
    #[serde(default)]
    pub escaped: bool,
}

impl EnemyInstance {
    pub fn new(instance_id: impl Into<String>, def: Arc<EnemyDef>, max_health: i32) -> Self {
        let name = def.name.clone();
        EnemyInstance {
            core: CombatantCore::new(instance_id, name, max_health),
            def,
            intent: None,
            turn_count: 0,
            data: HashMap::new(),
            escaped: false,
        }
    }

    pub fn def(&self) -> &EnemyDef {
        &self.def
    }

    /// Shared handle to the archetype (for calling into its behavior while mutating self)
    pub fn def_arc(&self) -> Arc<EnemyDef> {
        Arc::clone(&self.def)
    }

    /// Alive and still part of the fight
    pub fn in_combat(&self) -> bool {
        self.is_alive() && !self.escaped
    }

    /// Read an integer from the AI data slot
    pub fn data_i64(&self, key: &str) -> Option<i64> {
        self.data.get(key).and_then(|v| v.as_i64())
    }

    pub fn set_data(&mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.data.insert(key.into(), value.into());
    }
}

impl Combatant for EnemyInstance {
    fn core(&self) -> &CombatantCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut CombatantCore {
        &mut self.core
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DamageFlags;

    #[test]
    fn test_instances_are_independent() {
        let def = Arc::new(EnemyDef::new("louse", "Louse", 12));
        let mut a = EnemyInstance::new("louse_0", Arc::clone(&def), 12);
        let b = EnemyInstance::new("louse_1", Arc::clone(&def), 12);

        a.set_block(5);
        a.take_damage(9, DamageFlags::NONE);
        assert_eq!(a.current_health(), 8);
        assert_eq!(b.current_health(), 12);
        assert_eq!(b.block(), 0);
        assert_eq!(a.name(), "Louse");
        assert_eq!(a.id(), "louse_0");
    }

    #[test]
    fn test_data_slot() {
        let def = Arc::new(EnemyDef::new("louse", "Louse", 12));
        let mut enemy = EnemyInstance::new("louse_0", def, 12);
        assert_eq!(enemy.data_i64("curl_up"), None);
        enemy.set_data("curl_up", 3);
        assert_eq!(enemy.data_i64("curl_up"), Some(3));
    }

    #[test]
    fn test_in_combat() {
        let def = Arc::new(EnemyDef::new("thief", "Thief", 10));
        let mut enemy = EnemyInstance::new("thief_0", def, 10);
        assert!(enemy.in_combat());
        enemy.escaped = true;
        assert!(enemy.is_alive());
        assert!(!enemy.in_combat());
    }
}

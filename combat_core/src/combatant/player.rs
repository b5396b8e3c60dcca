//! PlayerCombatant - The run's persistent player

use super::{Combatant, CombatantCore};
use crate::error::{CombatError, CombatResult};
use serde::{Deserialize, Serialize};

/// The player; owned by the run and lent to each combat
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerCombatant {
    core: CombatantCore,
    gold: i32,
}

impl PlayerCombatant {
    pub fn new(id: impl Into<String>, name: impl Into<String>, max_health: i32) -> Self {
        PlayerCombatant {
            core: CombatantCore::new(id, name, max_health),
            gold: 0,
        }
    }

    pub fn with_gold(mut self, gold: i32) -> Self {
        self.gold = gold.max(0);
        self
    }

    pub fn gold(&self) -> i32 {
        self.gold
    }

    /// Add gold (already modified by relics); returns the amount added
    pub fn add_gold(&mut self, amount: i32) -> i32 {
        if amount <= 0 {
            return 0;
        }
        self.gold = self.gold.saturating_add(amount);
        amount
    }

    pub fn spend_gold(&mut self, amount: i32) -> CombatResult<()> {
        if amount <= 0 {
            return Err(CombatError::InvalidAmount(amount));
        }
        if amount > self.gold {
            return Err(CombatError::InvalidAmount(amount));
        }
        self.gold -= amount;
        Ok(())
    }
}

impl Combatant for PlayerCombatant {
    fn core(&self) -> &CombatantCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut CombatantCore {
        &mut self.core
    }
}

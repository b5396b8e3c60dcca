//! Combatant - Uniform health/block/status operations for players and enemies

mod player;

pub use player::PlayerCombatant;

use crate::error::{CombatError, CombatResult};
use crate::rules::CombatRules;
use crate::status::{StackChange, StatusEffectInstance, StatusMap, StatusRegistry};
use crate::types::DamageFlags;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// State every combatant carries
///
/// Invariants: `0 <= current_health <= max_health`, `block >= 0`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombatantCore {
    pub id: String,
    pub name: String,
    max_health: i32,
    current_health: i32,
    block: i32,
    #[serde(default)]
    statuses: StatusMap,
}

impl CombatantCore {
    /// Create a combatant at full health
    pub fn new(id: impl Into<String>, name: impl Into<String>, max_health: i32) -> Self {
        let max_health = max_health.max(0);
        CombatantCore {
            id: id.into(),
            name: name.into(),
            max_health,
            current_health: max_health,
            block: 0,
            statuses: StatusMap::new(),
        }
    }
}

/// Outcome of a single damage application
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageTaken {
    /// Amount absorbed by block
    pub blocked: i32,
    /// Amount actually subtracted from health
    pub health_lost: i32,
    /// True only for the hit that took health from above zero to zero
    pub killed: bool,
}

/// Anything that can take damage, gain block, and hold statuses
///
/// Implementors only expose their [`CombatantCore`]; every operation is a
/// provided method so players and enemies behave identically.
pub trait Combatant {
    fn core(&self) -> &CombatantCore;

    fn core_mut(&mut self) -> &mut CombatantCore;

    fn id(&self) -> &str {
        &self.core().id
    }

    fn name(&self) -> &str {
        &self.core().name
    }

    // === Health ===

    fn max_health(&self) -> i32 {
        self.core().max_health
    }

    /// Set max health, pulling current health down if it now exceeds it
    fn set_max_health(&mut self, value: i32) {
        let core = self.core_mut();
        core.max_health = value.max(0);
        core.current_health = core.current_health.min(core.max_health);
    }

    fn current_health(&self) -> i32 {
        self.core().current_health
    }

    fn set_current_health(&mut self, value: i32) {
        let core = self.core_mut();
        core.current_health = value.clamp(0, core.max_health);
    }

    fn is_alive(&self) -> bool {
        self.core().current_health > 0
    }

    /// Apply damage and return the health actually lost
    fn take_damage(&mut self, amount: i32, flags: DamageFlags) -> i32 {
        self.take_damage_detailed(amount, flags).health_lost
    }

    /// Apply damage: block absorbs first unless bypassed, then health
    fn take_damage_detailed(&mut self, amount: i32, flags: DamageFlags) -> DamageTaken {
        if amount <= 0 {
            return DamageTaken::default();
        }

        let core = self.core_mut();
        let mut remaining = amount;
        let mut blocked = 0;

        let bypass = flags.intersects(DamageFlags::HP_LOSS | DamageFlags::UNBLOCKABLE);
        if !bypass && core.block > 0 {
            blocked = core.block.min(remaining);
            core.block -= blocked;
            remaining -= blocked;
        }

        let before = core.current_health;
        core.current_health = before.saturating_sub(remaining).max(0);
        let health_lost = before - core.current_health;
        let killed = before > 0 && core.current_health == 0;

        if killed {
            debug!(combatant = %core.id, "combatant died");
        }

        DamageTaken {
            blocked,
            health_lost,
            killed,
        }
    }

    /// Restore health up to max; returns the amount gained. Dead combatants stay dead.
    fn heal(&mut self, amount: i32) -> i32 {
        if amount <= 0 || !self.is_alive() {
            return 0;
        }
        let core = self.core_mut();
        let before = core.current_health;
        core.current_health = before.saturating_add(amount).min(core.max_health);
        core.current_health - before
    }

    // === Block ===

    fn block(&self) -> i32 {
        self.core().block
    }

    fn set_block(&mut self, value: i32) {
        self.core_mut().block = value.max(0);
    }

    /// Gain block resolved through the rules' block formula (dexterity, frail)
    fn add_block(&mut self, amount: i32, rules: &dyn CombatRules) -> i32 {
        if amount <= 0 {
            return 0;
        }
        let actual = rules.calculate_block(amount, self.core());
        self.gain_block_exact(actual)
    }

    /// Gain an already-resolved amount of block
    fn gain_block_exact(&mut self, amount: i32) -> i32 {
        if amount <= 0 {
            return 0;
        }
        let core = self.core_mut();
        core.block = core.block.saturating_add(amount);
        amount
    }

    fn clear_block(&mut self) {
        self.core_mut().block = 0;
    }

    // === Statuses ===

    fn statuses(&self) -> &StatusMap {
        &self.core().statuses
    }

    /// Stack count for a status, 0 when absent
    fn status_stacks(&self, id: &str) -> i32 {
        self.core().statuses.stacks(id)
    }

    fn has_status(&self, id: &str) -> bool {
        self.core().statuses.contains(id)
    }

    /// Apply stacks of a registered status
    ///
    /// Debuffs are negated if any held status refuses them (Artifact); the
    /// refusing status then loses exactly one stack and the call fails with
    /// [`CombatError::Blocked`].
    fn apply_status(
        &mut self,
        registry: &StatusRegistry,
        id: &str,
        stacks: i32,
    ) -> CombatResult<StackChange> {
        if stacks <= 0 {
            return Err(CombatError::InvalidAmount(stacks));
        }
        let def = registry
            .get(id)
            .ok_or_else(|| CombatError::NotFound(id.to_string()))?;

        if def.is_debuff() {
            let blocker = self
                .statuses()
                .iter()
                .find(|s| !s.def.can_apply_debuff(s.stacks, def, stacks))
                .map(|s| s.def.id.clone());

            if let Some(blocker) = blocker {
                self.core_mut().statuses.reduce(&blocker, 1);
                debug!(
                    combatant = %self.id(),
                    status = id,
                    blocked_by = %blocker,
                    "debuff negated"
                );
                return Err(CombatError::Blocked(id.to_string()));
            }
        }

        Ok(self.core_mut().statuses.add(def, stacks))
    }

    fn remove_status(&mut self, id: &str) -> Option<StatusEffectInstance> {
        self.core_mut().statuses.remove(id)
    }

    fn remove_status_stacks(&mut self, id: &str, stacks: i32) -> Option<StackChange> {
        if stacks <= 0 {
            return None;
        }
        self.core_mut().statuses.reduce(id, stacks)
    }

    fn clear_statuses(&mut self) {
        self.core_mut().statuses.clear();
    }

    /// Clear statuses that do not survive combat end
    fn clear_combat_statuses(&mut self) {
        self.core_mut().statuses.retain_permanent();
    }
}

impl Combatant for CombatantCore {
    fn core(&self) -> &CombatantCore {
        self
    }

    fn core_mut(&mut self) -> &mut CombatantCore {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::StandardRules;
    use crate::status::ids;

    fn fighter(health: i32) -> CombatantCore {
        CombatantCore::new("dummy", "Dummy", health)
    }

    #[test]
    fn test_block_absorbs_first() {
        let mut c = fighter(20);
        c.set_block(6);

        let lost = c.take_damage(10, DamageFlags::NONE);
        assert_eq!(lost, 4);
        assert_eq!(c.block(), 0);
        assert_eq!(c.current_health(), 16);
    }

    #[test]
    fn test_unblockable_ignores_block() {
        let mut c = fighter(20);
        c.set_block(6);

        let lost = c.take_damage(10, DamageFlags::UNBLOCKABLE);
        assert_eq!(lost, 10);
        assert_eq!(c.block(), 6);
        assert_eq!(c.current_health(), 10);
    }

    #[test]
    fn test_hp_loss_bypasses_block() {
        let mut c = fighter(10);
        c.set_block(100);

        c.take_damage(5, DamageFlags::HP_LOSS);
        assert_eq!(c.block(), 100);
        assert_eq!(c.current_health(), 5);
    }

    #[test]
    fn test_non_positive_damage_is_noop() {
        let mut c = fighter(10);
        c.set_block(3);
        assert_eq!(c.take_damage(0, DamageFlags::NONE), 0);
        assert_eq!(c.take_damage(-4, DamageFlags::NONE), 0);
        assert_eq!(c.block(), 3);
        assert_eq!(c.current_health(), 10);
    }

    #[test]
    fn test_killed_reported_once() {
        let mut c = fighter(5);
        let first = c.take_damage_detailed(8, DamageFlags::NONE);
        assert!(first.killed);
        assert_eq!(first.health_lost, 5);
        assert_eq!(c.current_health(), 0);

        let second = c.take_damage_detailed(8, DamageFlags::NONE);
        assert!(!second.killed);
        assert_eq!(second.health_lost, 0);
    }

    #[test]
    fn test_heal_capped() {
        let mut c = fighter(10);
        c.set_current_health(5);
        assert_eq!(c.heal(1000), 5);
        assert_eq!(c.current_health(), 10);
    }

    #[test]
    fn test_heal_dead_is_noop() {
        let mut c = fighter(10);
        c.set_current_health(0);
        assert_eq!(c.heal(5), 0);
        assert!(!c.is_alive());
    }

    #[test]
    fn test_set_health_clamps() {
        let mut c = fighter(10);
        c.set_current_health(50);
        assert_eq!(c.current_health(), 10);
        c.set_current_health(-3);
        assert_eq!(c.current_health(), 0);
        c.set_block(-2);
        assert_eq!(c.block(), 0);
    }

    #[test]
    fn test_add_block_with_dexterity_and_frail() {
        let registry = StatusRegistry::with_defaults();
        let rules = StandardRules::default();
        let mut c = fighter(10);

        assert_eq!(c.add_block(0, &rules), 0);
        c.apply_status(&registry, ids::DEXTERITY, 2).unwrap();
        assert_eq!(c.add_block(5, &rules), 7);

        c.apply_status(&registry, ids::FRAIL, 1).unwrap();
        // floor((5 + 2) * 0.75) = 5
        assert_eq!(c.add_block(5, &rules), 5);
        assert_eq!(c.block(), 12);
    }

    #[test]
    fn test_status_stacking() {
        let registry = StatusRegistry::with_defaults();
        let mut c = fighter(10);

        c.apply_status(&registry, ids::STRENGTH, 3).unwrap();
        c.apply_status(&registry, ids::STRENGTH, 2).unwrap();
        assert_eq!(c.statuses().len(), 1);
        assert_eq!(c.status_stacks(ids::STRENGTH), 5);
    }

    #[test]
    fn test_apply_status_rejects_bad_input() {
        let registry = StatusRegistry::with_defaults();
        let mut c = fighter(10);

        assert_eq!(
            c.apply_status(&registry, ids::STRENGTH, 0),
            Err(CombatError::InvalidAmount(0))
        );
        assert_eq!(
            c.apply_status(&registry, "unheard_of", 1),
            Err(CombatError::NotFound("unheard_of".to_string()))
        );
        assert!(c.statuses().is_empty());
    }

    #[test]
    fn test_artifact_blocks_one_debuff_per_stack() {
        let registry = StatusRegistry::with_defaults();
        let mut c = fighter(10);
        c.apply_status(&registry, ids::ARTIFACT, 2).unwrap();

        assert_eq!(
            c.apply_status(&registry, ids::WEAK, 1),
            Err(CombatError::Blocked(ids::WEAK.to_string()))
        );
        assert_eq!(c.status_stacks(ids::ARTIFACT), 1);

        assert!(c.apply_status(&registry, ids::WEAK, 1).is_err());
        assert_eq!(c.status_stacks(ids::ARTIFACT), 0);
        assert!(!c.has_status(ids::ARTIFACT));

        assert!(c.apply_status(&registry, ids::WEAK, 1).is_ok());
        assert_eq!(c.status_stacks(ids::WEAK), 1);
    }

    #[test]
    fn test_artifact_ignores_buffs() {
        let registry = StatusRegistry::with_defaults();
        let mut c = fighter(10);
        c.apply_status(&registry, ids::ARTIFACT, 1).unwrap();
        c.apply_status(&registry, ids::STRENGTH, 2).unwrap();
        assert_eq!(c.status_stacks(ids::ARTIFACT), 1);
        assert_eq!(c.status_stacks(ids::STRENGTH), 2);
    }

    #[test]
    fn test_remove_status_stacks() {
        let registry = StatusRegistry::with_defaults();
        let mut c = fighter(10);
        c.apply_status(&registry, ids::VULNERABLE, 3).unwrap();

        assert_eq!(c.remove_status_stacks(ids::VULNERABLE, 0), None);
        c.remove_status_stacks(ids::VULNERABLE, 2);
        assert_eq!(c.status_stacks(ids::VULNERABLE), 1);
        c.remove_status_stacks(ids::VULNERABLE, 2);
        assert!(!c.has_status(ids::VULNERABLE));

        c.apply_status(&registry, ids::WEAK, 1).unwrap();
        assert!(c.remove_status(ids::WEAK).is_some());
        assert!(c.remove_status(ids::WEAK).is_none());
    }
}

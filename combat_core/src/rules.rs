//! CombatRules - Pluggable damage/block/heal formulas and turn structure
//!
//! The game loop consults the rules object; combatants only store state. The
//! default formulas follow the usual deckbuilder layering:
//!
//! - Damage: `(base + strength) × weak × vulnerable`, floored, intangible caps at 1
//! - Block: `(base + dexterity) × frail`, floored
//! - Healing: passthrough

use crate::combatant::Combatant;
use crate::status::ids;
use serde::{Deserialize, Serialize};

/// Tunable rule constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RulesConfig {
    #[serde(default = "default_energy_per_turn")]
    pub energy_per_turn: i32,
    #[serde(default = "default_cards_per_turn")]
    pub cards_per_turn: usize,
    #[serde(default = "default_hand_size_limit")]
    pub hand_size_limit: usize,
    #[serde(default)]
    pub can_escape: bool,
    /// Damage multiplier while the attacker is weak
    #[serde(default = "default_three_quarters")]
    pub weak_multiplier: f64,
    /// Damage multiplier while the defender is vulnerable
    #[serde(default = "default_vulnerable_multiplier")]
    pub vulnerable_multiplier: f64,
    /// Block multiplier while the blocker is frail
    #[serde(default = "default_three_quarters")]
    pub frail_multiplier: f64,
}

fn default_energy_per_turn() -> i32 {
    3
}

fn default_cards_per_turn() -> usize {
    5
}

fn default_hand_size_limit() -> usize {
    10
}

fn default_three_quarters() -> f64 {
    0.75
}

fn default_vulnerable_multiplier() -> f64 {
    1.5
}

impl Default for RulesConfig {
    fn default() -> Self {
        RulesConfig {
            energy_per_turn: default_energy_per_turn(),
            cards_per_turn: default_cards_per_turn(),
            hand_size_limit: default_hand_size_limit(),
            can_escape: false,
            weak_multiplier: default_three_quarters(),
            vulnerable_multiplier: default_vulnerable_multiplier(),
            frail_multiplier: default_three_quarters(),
        }
    }
}

/// Formula provider consulted by the combat loop
///
/// Every method has the standard behavior as a default, so a game only
/// overrides what it changes.
pub trait CombatRules: Send + Sync {
    /// Resolve attack damage before modifiers and block
    fn calculate_damage(&self, base: i32, attacker: Option<&dyn Combatant>, defender: &dyn Combatant) -> i32 {
        damage_formula(base, attacker, defender, &RulesConfig::default())
    }

    fn calculate_block(&self, base: i32, blocker: &dyn Combatant) -> i32 {
        block_formula(base, blocker, &RulesConfig::default())
    }

    fn calculate_healing(&self, base: i32, _target: &dyn Combatant) -> i32 {
        base.max(0)
    }

    fn energy_per_turn(&self) -> i32 {
        default_energy_per_turn()
    }

    fn cards_per_turn(&self) -> usize {
        default_cards_per_turn()
    }

    fn hand_size_limit(&self) -> usize {
        default_hand_size_limit()
    }

    fn can_escape(&self) -> bool {
        false
    }
}

/// Rules driven by a [`RulesConfig`]
#[derive(Debug, Clone, Default)]
pub struct StandardRules {
    pub config: RulesConfig,
}

impl StandardRules {
    pub fn new(config: RulesConfig) -> Self {
        StandardRules { config }
    }
}

impl CombatRules for StandardRules {
    fn calculate_damage(&self, base: i32, attacker: Option<&dyn Combatant>, defender: &dyn Combatant) -> i32 {
        damage_formula(base, attacker, defender, &self.config)
    }

    fn calculate_block(&self, base: i32, blocker: &dyn Combatant) -> i32 {
        block_formula(base, blocker, &self.config)
    }

    fn energy_per_turn(&self) -> i32 {
        self.config.energy_per_turn
    }

    fn cards_per_turn(&self) -> usize {
        self.config.cards_per_turn
    }

    fn hand_size_limit(&self) -> usize {
        self.config.hand_size_limit
    }

    fn can_escape(&self) -> bool {
        self.config.can_escape
    }
}

fn damage_formula(
    base: i32,
    attacker: Option<&dyn Combatant>,
    defender: &dyn Combatant,
    config: &RulesConfig,
) -> i32 {
    let mut damage = base as f64;

    if let Some(attacker) = attacker {
        damage += attacker.status_stacks(ids::STRENGTH) as f64;
        if attacker.has_status(ids::WEAK) {
            damage *= config.weak_multiplier;
        }
    }

    if defender.has_status(ids::VULNERABLE) {
        damage *= config.vulnerable_multiplier;
    }

    let mut damage = damage.floor();
    if defender.has_status(ids::INTANGIBLE) && damage > 1.0 {
        damage = 1.0;
    }

    (damage as i32).max(0)
}

fn block_formula(base: i32, blocker: &dyn Combatant, config: &RulesConfig) -> i32 {
    let mut block = (base + blocker.status_stacks(ids::DEXTERITY)) as f64;
    if blocker.has_status(ids::FRAIL) {
        block *= config.frail_multiplier;
    }
    (block.floor() as i32).max(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combatant::CombatantCore;
    use crate::status::StatusRegistry;
    use proptest::prelude::*;

    fn with_statuses(statuses: &[(&str, i32)]) -> CombatantCore {
        let registry = StatusRegistry::with_defaults();
        let mut c = CombatantCore::new("c", "C", 50);
        for (id, stacks) in statuses {
            c.apply_status(&registry, id, *stacks).unwrap();
        }
        c
    }

    #[test]
    fn test_plain_damage() {
        let rules = StandardRules::default();
        let a = with_statuses(&[]);
        let d = with_statuses(&[]);
        assert_eq!(rules.calculate_damage(6, Some(&a), &d), 6);
        assert_eq!(rules.calculate_damage(6, None, &d), 6);
    }

    #[test]
    fn test_strength_weak_vulnerable_layering() {
        let rules = StandardRules::default();
        let a = with_statuses(&[(ids::STRENGTH, 2), (ids::WEAK, 1)]);
        let d = with_statuses(&[(ids::VULNERABLE, 1)]);
        // (6 + 2) * 0.75 * 1.5 = 9
        assert_eq!(rules.calculate_damage(6, Some(&a), &d), 9);
    }

    #[test]
    fn test_strength_ignored_without_attacker() {
        let rules = StandardRules::default();
        let d = with_statuses(&[(ids::VULNERABLE, 1)]);
        // 5 * 1.5 = 7.5 -> 7
        assert_eq!(rules.calculate_damage(5, None, &d), 7);
    }

    #[test]
    fn test_intangible_caps_at_one() {
        let rules = StandardRules::default();
        let a = with_statuses(&[]);
        let d = with_statuses(&[(ids::INTANGIBLE, 1)]);
        assert_eq!(rules.calculate_damage(30, Some(&a), &d), 1);
        assert_eq!(rules.calculate_damage(1, Some(&a), &d), 1);
        assert_eq!(rules.calculate_damage(0, Some(&a), &d), 0);
    }

    #[test]
    fn test_block_formula() {
        let rules = StandardRules::default();
        assert_eq!(rules.calculate_block(5, &with_statuses(&[(ids::DEXTERITY, 1)])), 6);
        assert_eq!(rules.calculate_block(5, &with_statuses(&[(ids::FRAIL, 1)])), 3);
    }

    #[test]
    fn test_healing_passthrough() {
        let rules = StandardRules::default();
        let t = with_statuses(&[]);
        assert_eq!(rules.calculate_healing(7, &t), 7);
        assert_eq!(rules.calculate_healing(-3, &t), 0);
    }

    #[test]
    fn test_turn_structure_defaults() {
        struct Bare;
        impl CombatRules for Bare {}

        let rules = Bare;
        assert_eq!(rules.energy_per_turn(), 3);
        assert_eq!(rules.cards_per_turn(), 5);
        assert_eq!(rules.hand_size_limit(), 10);
        assert!(!rules.can_escape());
        assert_eq!(StandardRules::default().config, RulesConfig::default());
    }

    #[test]
    fn test_config_overrides() {
        let rules = StandardRules::new(RulesConfig {
            energy_per_turn: 4,
            can_escape: true,
            vulnerable_multiplier: 2.0,
            ..Default::default()
        });
        let d = with_statuses(&[(ids::VULNERABLE, 1)]);
        assert_eq!(rules.energy_per_turn(), 4);
        assert!(rules.can_escape());
        assert_eq!(rules.calculate_damage(5, None, &d), 10);
    }

    proptest! {
        #[test]
        fn prop_damage_non_negative_and_monotonic(
            base in 0i32..500,
            extra in 0i32..50,
            strength in -10i32..10,
            weak in any::<bool>(),
            vulnerable in any::<bool>(),
            intangible in any::<bool>(),
        ) {
            let rules = StandardRules::default();
            let mut attacker_statuses = Vec::new();
            if strength > 0 {
                attacker_statuses.push((ids::STRENGTH, strength));
            }
            if weak {
                attacker_statuses.push((ids::WEAK, 1));
            }
            let mut defender_statuses = Vec::new();
            if vulnerable {
                defender_statuses.push((ids::VULNERABLE, 1));
            }
            if intangible {
                defender_statuses.push((ids::INTANGIBLE, 1));
            }
            let a = with_statuses(&attacker_statuses);
            let d = with_statuses(&defender_statuses);

            let low = rules.calculate_damage(base, Some(&a), &d);
            let high = rules.calculate_damage(base + extra, Some(&a), &d);
            prop_assert!(low >= 0);
            prop_assert!(high >= low);
        }

        #[test]
        fn prop_block_non_negative_and_monotonic(
            base in 0i32..500,
            extra in 0i32..50,
            dexterity in 0i32..10,
            frail in any::<bool>(),
        ) {
            let rules = StandardRules::default();
            let mut statuses = Vec::new();
            if dexterity > 0 {
                statuses.push((ids::DEXTERITY, dexterity));
            }
            if frail {
                statuses.push((ids::FRAIL, 1));
            }
            let b = with_statuses(&statuses);
            let low = rules.calculate_block(base, &b);
            prop_assert!(low >= 0);
            prop_assert!(rules.calculate_block(base + extra, &b) >= low);
        }
    }
}

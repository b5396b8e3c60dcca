//! Core types shared across the combat engine

use bitflags::bitflags;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Deterministic RNG owned by each combat
pub type CombatRng = ChaCha8Rng;

bitflags! {
    /// Modifiers on a single damage application
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct DamageFlags: u8 {
        /// Ignores block but is still treated as a hit
        const UNBLOCKABLE = 1 << 0;
        /// Direct health loss: bypasses block and hit reactions
        const HP_LOSS     = 1 << 1;
        /// Retaliation damage; never triggers further retaliation
        const THORNS      = 1 << 2;
        /// Damage that comes from an attack (card or enemy intent)
        const ATTACK      = 1 << 3;
    }
}

impl DamageFlags {
    /// No modifiers: a normal blockable hit
    pub const NONE: DamageFlags = DamageFlags::empty();
}

/// Phase of a combat encounter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombatPhase {
    #[default]
    Setup,
    PlayerTurn,
    EnemyTurn,
    End,
}

/// Result of the terminal check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombatOutcome {
    #[default]
    InProgress,
    Victory,
    Defeat,
    /// Player left the fight (escape or forfeit)
    Escaped,
}

impl CombatOutcome {
    /// Whether this outcome ends the combat
    pub fn is_terminal(self) -> bool {
        !matches!(self, CombatOutcome::InProgress)
    }
}

/// Addresses a combatant inside a combat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    Player,
    /// Index into the context's enemy list
    Enemy(usize),
}

/// Read-only snapshot of where the combat is, passed to status and relic hooks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HookContext {
    pub turn: u32,
    pub phase: CombatPhase,
}

/// Buff/debuff classification of a status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusEffectType {
    Buff,
    Debuff,
    #[default]
    Neutral,
}

/// What the stack count of a status means
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StackBehavior {
    /// Stacks are an amount (Strength 3 = +3 damage)
    #[default]
    Intensity,
    /// Stacks are turns remaining
    Duration,
    /// Stacks are a trigger budget (Artifact)
    Counter,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_terminal() {
        assert!(!CombatOutcome::InProgress.is_terminal());
        assert!(CombatOutcome::Victory.is_terminal());
        assert!(CombatOutcome::Defeat.is_terminal());
        assert!(CombatOutcome::Escaped.is_terminal());
    }

    #[test]
    fn test_damage_flags_compose() {
        let flags = DamageFlags::ATTACK | DamageFlags::UNBLOCKABLE;
        assert!(flags.contains(DamageFlags::UNBLOCKABLE));
        assert!(!flags.contains(DamageFlags::HP_LOSS));
        assert!(DamageFlags::NONE.is_empty());
    }
}

//! StatusEffectDef - Status catalog entries and their hook table

use super::ids;
use crate::combatant::Combatant;
use crate::types::{DamageFlags, HookContext, StackBehavior, StatusEffectType};
use serde::{Deserialize, Serialize};

/// Built-in status behaviors
///
/// Every hook on [`StatusEffectDef`] dispatches on this enum, so adding a
/// kind means extending the matches below. `Generic` statuses only use the
/// turn-end bookkeeping flags of their def.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    #[default]
    Generic,
    Strength,
    Dexterity,
    Weak,
    Vulnerable,
    Frail,
    Artifact,
    Intangible,
    Poison,
    Regeneration,
    Metallicize,
    PlatedArmor,
    Ritual,
    Thorns,
    DoubleDamage,
}

/// A state change requested by a status hook
///
/// Hooks never mutate combat state directly; the combat context applies these
/// to the status owner in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StatusAction {
    /// Direct health loss on the owner (bypasses block)
    LoseHp { amount: i32 },
    /// Flat block on the owner, not modified by dexterity or frail
    GainBlock { amount: i32 },
    Heal { amount: i32 },
    ApplyStatus { status_id: String, stacks: i32 },
    ReduceStacks { status_id: String, stacks: i32 },
    /// Damage dealt back to whoever caused the triggering hit
    DamageSource { amount: i32 },
}

/// Configuration of a status effect
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusEffectDef {
    /// Unique identifier (e.g., "strength", "weak")
    pub id: String,
    /// Display name
    pub name: String,
    /// Tooltip template, `{stacks}` is replaced by the current stack count
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub effect_type: StatusEffectType,
    #[serde(default)]
    pub stack_behavior: StackBehavior,
    /// Maximum stacks, 0 = unlimited
    #[serde(default)]
    pub max_stacks: i32,
    /// Survives the end of combat
    #[serde(default)]
    pub permanent: bool,
    #[serde(default)]
    pub clears_at_turn_end: bool,
    #[serde(default)]
    pub decrements_at_turn_end: bool,
    #[serde(default)]
    pub kind: StatusKind,
}

impl StatusEffectDef {
    /// Create a neutral, intensity-stacking status with no behavior
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        StatusEffectDef {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            effect_type: StatusEffectType::Neutral,
            stack_behavior: StackBehavior::Intensity,
            max_stacks: 0,
            permanent: false,
            clears_at_turn_end: false,
            decrements_at_turn_end: false,
            kind: StatusKind::Generic,
        }
    }

    pub fn with_kind(mut self, kind: StatusKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_type(mut self, effect_type: StatusEffectType) -> Self {
        self.effect_type = effect_type;
        self
    }

    pub fn with_stack_behavior(mut self, behavior: StackBehavior) -> Self {
        self.stack_behavior = behavior;
        self
    }

    pub fn with_max_stacks(mut self, max_stacks: i32) -> Self {
        self.max_stacks = max_stacks;
        self
    }

    pub fn decrementing(mut self) -> Self {
        self.decrements_at_turn_end = true;
        self
    }

    pub fn clearing(mut self) -> Self {
        self.clears_at_turn_end = true;
        self
    }

    pub fn is_debuff(&self) -> bool {
        self.effect_type == StatusEffectType::Debuff
    }

    pub fn is_buff(&self) -> bool {
        self.effect_type == StatusEffectType::Buff
    }

    /// Clamp a stack total to this status's limit
    pub fn clamp_stacks(&self, stacks: i32) -> i32 {
        if self.max_stacks > 0 {
            stacks.min(self.max_stacks)
        } else {
            stacks
        }
    }

    // === Lifecycle hooks ===

    pub fn on_apply(&self, _owner: &dyn Combatant, _stacks: i32, _cx: &HookContext) -> Vec<StatusAction> {
        Vec::new()
    }

    pub fn on_remove(&self, _owner: &dyn Combatant, _cx: &HookContext) -> Vec<StatusAction> {
        Vec::new()
    }

    pub fn on_stack_change(
        &self,
        _owner: &dyn Combatant,
        _old: i32,
        _new: i32,
        _cx: &HookContext,
    ) -> Vec<StatusAction> {
        Vec::new()
    }

    // === Turn hooks ===

    /// Fired at the start of the owner's turn
    pub fn on_turn_start(&self, _owner: &dyn Combatant, stacks: i32, _cx: &HookContext) -> Vec<StatusAction> {
        match self.kind {
            StatusKind::Poison => vec![
                StatusAction::LoseHp { amount: stacks },
                self.reduce_self(1),
            ],
            _ => Vec::new(),
        }
    }

    /// Fired at the end of the owner's turn, before the decrement/clear bookkeeping
    pub fn on_turn_end(&self, _owner: &dyn Combatant, stacks: i32, _cx: &HookContext) -> Vec<StatusAction> {
        match self.kind {
            StatusKind::Regeneration => vec![
                StatusAction::Heal { amount: stacks },
                self.reduce_self(1),
            ],
            StatusKind::Metallicize | StatusKind::PlatedArmor => {
                vec![StatusAction::GainBlock { amount: stacks }]
            }
            StatusKind::Ritual => vec![StatusAction::ApplyStatus {
                status_id: ids::STRENGTH.to_string(),
                stacks,
            }],
            _ => Vec::new(),
        }
    }

    // === Damage/block event hooks ===

    /// Fired on the attacker after each ATTACK hit it lands
    pub fn on_damage_dealt(
        &self,
        _owner: &dyn Combatant,
        _amount: i32,
        stacks: i32,
        _cx: &HookContext,
    ) -> Vec<StatusAction> {
        match self.kind {
            StatusKind::DoubleDamage if stacks > 0 => vec![self.reduce_self(1)],
            _ => Vec::new(),
        }
    }

    /// Fired after the owner was hit; `health_lost` excludes block-absorbed damage
    pub fn on_damage_received(
        &self,
        _owner: &dyn Combatant,
        health_lost: i32,
        flags: DamageFlags,
        stacks: i32,
        _cx: &HookContext,
    ) -> Vec<StatusAction> {
        let is_attack = flags.contains(DamageFlags::ATTACK) && !flags.contains(DamageFlags::THORNS);
        match self.kind {
            StatusKind::Thorns if is_attack => vec![StatusAction::DamageSource { amount: stacks }],
            StatusKind::PlatedArmor if is_attack && health_lost > 0 => vec![self.reduce_self(1)],
            _ => Vec::new(),
        }
    }

    pub fn on_block_gained(
        &self,
        _owner: &dyn Combatant,
        _amount: i32,
        _stacks: i32,
        _cx: &HookContext,
    ) -> Vec<StatusAction> {
        Vec::new()
    }

    // === Modifier hooks ===

    pub fn modify_damage_dealt(&self, _owner: &dyn Combatant, base: i32, stacks: i32, _cx: &HookContext) -> i32 {
        match self.kind {
            StatusKind::DoubleDamage if stacks > 0 => base.saturating_mul(2),
            _ => base,
        }
    }

    pub fn modify_damage_received(&self, _owner: &dyn Combatant, base: i32, stacks: i32, _cx: &HookContext) -> i32 {
        match self.kind {
            StatusKind::Intangible if stacks > 0 => base.min(1),
            _ => base,
        }
    }

    pub fn modify_block_gained(&self, _owner: &dyn Combatant, base: i32, _stacks: i32, _cx: &HookContext) -> i32 {
        base
    }

    /// Whether this status lets `debuff` land on its owner
    ///
    /// A `false` answer negates the application and costs this status one stack.
    pub fn can_apply_debuff(&self, stacks: i32, _debuff: &StatusEffectDef, _incoming: i32) -> bool {
        !(self.kind == StatusKind::Artifact && stacks > 0)
    }

    /// Tooltip text for the given stack count
    pub fn tooltip(&self, stacks: i32) -> String {
        if self.description.is_empty() {
            format!("{} ({})", self.name, stacks)
        } else {
            self.description.replace("{stacks}", &stacks.to_string())
        }
    }

    fn reduce_self(&self, stacks: i32) -> StatusAction {
        StatusAction::ReduceStacks {
            status_id: self.id.clone(),
            stacks,
        }
    }
}

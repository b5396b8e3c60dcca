//! EnemyDef - Enemy archetypes, AI pattern pools, and pluggable behavior

use super::{EnemyInstance, EnemyIntent, IntentType};
use crate::types::CombatRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// A state change requested by enemy AI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IntentAction {
    /// Hit the player `times` times for `damage` each (rules formula applies per hit)
    Attack { damage: i32, times: i32 },
    /// Block on the acting enemy (dexterity/frail apply)
    GainBlock { amount: i32 },
    ApplyStatusToSelf { status_id: String, stacks: i32 },
    ApplyStatusToPlayer { status_id: String, stacks: i32 },
    Heal { amount: i32 },
    /// Add a new enemy from the catalog to the fight
    Summon { enemy_id: String },
    /// Gold awarded to the player
    DropGold { amount: i32 },
    /// Leave the fight
    Escape,
}

/// Game-specific enemy AI
///
/// The defaults are the bare hook points: weighted intent selection over the
/// def's pattern pool and no effect for everything else. Implement this to
/// script an enemy; [`StandardBehavior`] turns intents into actions directly.
pub trait EnemyBehavior: Send + Sync + fmt::Debug {
    /// Choose the next intent
    fn decide_intent(&self, instance: &mut EnemyInstance, rng: &mut CombatRng) -> EnemyIntent {
        instance.def().weighted_intent(rng)
    }

    /// Resolve an intent into actions
    fn execute_intent(&self, _instance: &mut EnemyInstance, _intent: &EnemyIntent) -> Vec<IntentAction> {
        Vec::new()
    }

    fn on_spawn(&self, _instance: &mut EnemyInstance) -> Vec<IntentAction> {
        Vec::new()
    }

    fn on_death(&self, _instance: &mut EnemyInstance) -> Vec<IntentAction> {
        Vec::new()
    }
}

/// Behavior that does nothing beyond choosing intents
#[derive(Debug, Clone, Copy, Default)]
pub struct PassiveBehavior;

impl EnemyBehavior for PassiveBehavior {}

/// Behavior that executes exactly what the intent telegraphs
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardBehavior;

impl EnemyBehavior for StandardBehavior {
    fn execute_intent(&self, _instance: &mut EnemyInstance, intent: &EnemyIntent) -> Vec<IntentAction> {
        let mut actions = Vec::new();

        if intent.intent_type.is_attack() && intent.times > 0 {
            actions.push(IntentAction::Attack {
                damage: intent.damage,
                times: intent.times,
            });
        }

        if intent.intent_type.is_defend() && intent.block > 0 {
            actions.push(IntentAction::GainBlock { amount: intent.block });
        }

        if let Some(status_id) = &intent.status_id {
            match intent.intent_type {
                IntentType::Buff | IntentType::AttackBuff => actions.push(IntentAction::ApplyStatusToSelf {
                    status_id: status_id.clone(),
                    stacks: intent.stacks,
                }),
                IntentType::Debuff | IntentType::AttackDebuff => {
                    actions.push(IntentAction::ApplyStatusToPlayer {
                        status_id: status_id.clone(),
                        stacks: intent.stacks,
                    })
                }
                _ => {}
            }
        }

        if intent.intent_type == IntentType::Escape {
            actions.push(IntentAction::Escape);
        }

        actions
    }

    fn on_death(&self, instance: &mut EnemyInstance) -> Vec<IntentAction> {
        let gold = instance.def().gold_reward;
        if gold > 0 {
            vec![IntentAction::DropGold { amount: gold }]
        } else {
            Vec::new()
        }
    }
}

fn standard_behavior() -> Arc<dyn EnemyBehavior> {
    Arc::new(StandardBehavior)
}

/// A weighted entry in an enemy's move pool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentPattern {
    pub intent: EnemyIntent,
    pub weight: f64,
}

impl IntentPattern {
    pub fn new(intent: EnemyIntent, weight: f64) -> Self {
        IntentPattern { intent, weight }
    }
}

/// Enemy archetype
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnemyDef {
    pub id: String,
    pub name: String,
    pub base_health: i32,
    /// Spawned health is rolled in `base_health ± health_variance`
    #[serde(default)]
    pub health_variance: i32,
    #[serde(default)]
    pub patterns: Vec<IntentPattern>,
    /// Gold dropped on death by [`StandardBehavior`]
    #[serde(default)]
    pub gold_reward: i32,
    #[serde(skip, default = "standard_behavior")]
    pub behavior: Arc<dyn EnemyBehavior>,
}

impl EnemyDef {
    pub fn new(id: impl Into<String>, name: impl Into<String>, base_health: i32) -> Self {
        EnemyDef {
            id: id.into(),
            name: name.into(),
            base_health,
            health_variance: 0,
            patterns: Vec::new(),
            gold_reward: 0,
            behavior: standard_behavior(),
        }
    }

    pub fn with_pattern(mut self, intent: EnemyIntent, weight: f64) -> Self {
        self.patterns.push(IntentPattern::new(intent, weight));
        self
    }

    pub fn with_variance(mut self, variance: i32) -> Self {
        self.health_variance = variance.max(0);
        self
    }

    pub fn with_behavior(mut self, behavior: Arc<dyn EnemyBehavior>) -> Self {
        self.behavior = behavior;
        self
    }

    /// Sum of all positive pattern weights
    pub fn total_weight(&self) -> f64 {
        self.patterns
            .iter()
            .map(|p| p.weight)
            .filter(|w| *w > 0.0)
            .sum()
    }

    /// Weighted pick from the pattern pool
    ///
    /// Each entry owns the half-open slice `[offset, offset + weight)` of
    /// `[0, total)` in list order, so a fixed RNG stream always picks the same
    /// entries. The chosen template is copied, never mutated. An empty pool or
    /// a non-positive total yields `Unknown`.
    pub fn weighted_intent<R: Rng + ?Sized>(&self, rng: &mut R) -> EnemyIntent {
        let total = self.total_weight();
        if self.patterns.is_empty() || total <= 0.0 {
            return EnemyIntent::unknown();
        }

        let mut roll = rng.gen_range(0.0..total);
        let mut last_positive = None;
        for pattern in self.patterns.iter().filter(|p| p.weight > 0.0) {
            roll -= pattern.weight;
            if roll < 0.0 {
                return pattern.intent.clone();
            }
            last_positive = Some(pattern);
        }

        // Float residue can leave roll at exactly 0 after the last entry
        last_positive
            .map(|p| p.intent.clone())
            .unwrap_or_else(EnemyIntent::unknown)
    }

    /// Multiply health numbers (difficulty scaling before a combat)
    pub fn scale_health(&mut self, factor: f64) {
        if factor <= 0.0 {
            return;
        }
        self.base_health = ((self.base_health as f64) * factor).round() as i32;
        self.health_variance = ((self.health_variance as f64) * factor).round() as i32;
    }

    /// Roll a spawn health value
    pub fn roll_health<R: Rng + ?Sized>(&self, rng: &mut R) -> i32 {
        let variance = self.health_variance.max(0);
        let offset = if variance > 0 {
            rng.gen_range(-variance..=variance)
        } else {
            0
        };
        (self.base_health + offset).max(1)
    }

    /// Create a runtime instance of this archetype
    pub fn spawn<R: Rng + ?Sized>(def: &Arc<EnemyDef>, instance_id: impl Into<String>, rng: &mut R) -> EnemyInstance {
        let health = def.roll_health(rng);
        EnemyInstance::new(instance_id, Arc::clone(def), health)
    }
}

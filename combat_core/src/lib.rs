//! combat_core - Turn-based deckbuilder combat resolution
//!
//! This library provides:
//! - Combatant: Shared health/block/status behavior for the player and enemies
//! - Status effects: Data-driven buffs and debuffs with lifecycle hooks
//! - Relics: Passive items reacting to combat events through trigger flags
//! - Enemy AI: Weighted intent selection and scriptable behaviors
//! - CombatContext: The turn state machine and damage/block/heal pipeline
//!
//! Catalogs (statuses, relics, enemies, rules) load from TOML; bundled
//! defaults live under `config/`.

pub mod cards;
pub mod combatant;
pub mod config;
pub mod context;
pub mod enemy;
pub mod error;
pub mod prelude;
pub mod relic;
pub mod rules;
pub mod status;
pub mod types;

// Re-export core types for convenience
pub use cards::{Card, CardKind, CardPiles, X_COST};
pub use combatant::{Combatant, CombatantCore, DamageTaken, PlayerCombatant};
pub use context::{CombatContext, CombatEvent, EnemyStep, X_VARIABLE};
pub use enemy::{EnemyBehavior, EnemyDef, EnemyInstance, EnemyIntent, EnemyRegistry, IntentAction, IntentType};
pub use error::{CombatError, CombatResult};
pub use relic::{RelicDef, RelicEffect, RelicInstance, RelicKind, RelicRarity, RelicRegistry, RelicTriggers};
pub use rules::{CombatRules, RulesConfig, StandardRules};
pub use status::{StatusAction, StatusEffectDef, StatusEffectInstance, StatusKind, StatusRegistry};
pub use types::{CombatOutcome, CombatPhase, CombatRng, DamageFlags, HookContext, StackBehavior, StatusEffectType, Target};
pub use config::{default_enemies, default_relics, default_rules_config, default_statuses};

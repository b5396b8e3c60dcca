//! Prelude module for convenient imports
//!
//! ```rust
//! use combat_core::prelude::*;
//! ```

// Core types
pub use crate::types::{CombatOutcome, CombatPhase, DamageFlags, HookContext, Target};
pub use crate::combatant::{Combatant, DamageTaken, PlayerCombatant};
pub use crate::error::{CombatError, CombatResult};

// Combat loop
pub use crate::context::{CombatContext, CombatEvent, EnemyStep};
pub use crate::cards::{Card, CardKind};
pub use crate::rules::{CombatRules, StandardRules};

// Catalogs
pub use crate::status::{ids, StatusRegistry};
pub use crate::relic::{RelicInstance, RelicRegistry};
pub use crate::enemy::{EnemyInstance, EnemyIntent, EnemyRegistry};

// Config
pub use crate::config::{default_enemies, default_relics, default_rules_config, default_statuses};

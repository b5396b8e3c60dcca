//! EnemyIntent - An enemy's telegraphed next action

use serde::{Deserialize, Serialize};

/// Category of a planned enemy action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentType {
    Attack,
    Defend,
    Buff,
    Debuff,
    AttackBuff,
    AttackDebuff,
    AttackDefend,
    Escape,
    Sleep,
    Stun,
    #[default]
    Unknown,
}

impl IntentType {
    /// Whether the intent deals damage
    pub fn is_attack(self) -> bool {
        matches!(
            self,
            IntentType::Attack | IntentType::AttackBuff | IntentType::AttackDebuff | IntentType::AttackDefend
        )
    }

    /// Whether the intent grants the enemy block
    pub fn is_defend(self) -> bool {
        matches!(self, IntentType::Defend | IntentType::AttackDefend)
    }
}

/// A planned action; only the fields relevant to `intent_type` are meaningful
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EnemyIntent {
    pub intent_type: IntentType,
    /// Damage per hit, before the rules formula
    #[serde(default)]
    pub damage: i32,
    /// Hit count
    #[serde(default = "default_times")]
    pub times: i32,
    #[serde(default)]
    pub block: i32,
    #[serde(default)]
    pub status_id: Option<String>,
    #[serde(default)]
    pub stacks: i32,
}

fn default_times() -> i32 {
    1
}

impl EnemyIntent {
    pub fn new(intent_type: IntentType) -> Self {
        EnemyIntent {
            intent_type,
            times: 1,
            ..Default::default()
        }
    }

    pub fn unknown() -> Self {
        Self::new(IntentType::Unknown)
    }

    pub fn attack(damage: i32, times: i32) -> Self {
        EnemyIntent {
            damage,
            times,
            ..Self::new(IntentType::Attack)
        }
    }

    pub fn defend(block: i32) -> Self {
        EnemyIntent {
            block,
            ..Self::new(IntentType::Defend)
        }
    }

    pub fn buff(status_id: impl Into<String>, stacks: i32) -> Self {
        EnemyIntent {
            status_id: Some(status_id.into()),
            stacks,
            ..Self::new(IntentType::Buff)
        }
    }

    pub fn debuff(status_id: impl Into<String>, stacks: i32) -> Self {
        EnemyIntent {
            status_id: Some(status_id.into()),
            stacks,
            ..Self::new(IntentType::Debuff)
        }
    }

    /// Add a block component (turns an attack into AttackDefend)
    pub fn with_block(mut self, block: i32) -> Self {
        self.block = block;
        if self.intent_type == IntentType::Attack {
            self.intent_type = IntentType::AttackDefend;
        }
        self
    }

    /// Add a status component (turns an attack into AttackBuff or AttackDebuff)
    pub fn with_status(mut self, status_id: impl Into<String>, stacks: i32, debuff: bool) -> Self {
        self.status_id = Some(status_id.into());
        self.stacks = stacks;
        if self.intent_type == IntentType::Attack {
            self.intent_type = if debuff {
                IntentType::AttackDebuff
            } else {
                IntentType::AttackBuff
            };
        }
        self
    }

    /// `damage × times` for attacks, 0 otherwise
    pub fn total_damage(&self) -> i32 {
        if self.intent_type.is_attack() {
            self.damage.saturating_mul(self.times)
        } else {
            0
        }
    }

    /// Short telegraph text for presentation layers
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();
        if self.intent_type.is_attack() {
            if self.times > 1 {
                parts.push(format!("attack {}x{}", self.damage, self.times));
            } else {
                parts.push(format!("attack {}", self.damage));
            }
        }
        if self.intent_type.is_defend() {
            parts.push(format!("block {}", self.block));
        }
        if let Some(status) = &self.status_id {
            if matches!(
                self.intent_type,
                IntentType::Buff | IntentType::Debuff | IntentType::AttackBuff | IntentType::AttackDebuff
            ) {
                parts.push(format!("{} {}", status, self.stacks));
            }
        }
        match self.intent_type {
            IntentType::Escape => parts.push("escape".to_string()),
            IntentType::Sleep => parts.push("sleeping".to_string()),
            IntentType::Stun => parts.push("stunned".to_string()),
            IntentType::Unknown => parts.push("?".to_string()),
            _ => {}
        }
        parts.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_damage_only_for_attacks() {
        assert_eq!(EnemyIntent::attack(6, 3).total_damage(), 18);
        let mut defend = EnemyIntent::defend(8);
        defend.damage = 10;
        assert_eq!(defend.total_damage(), 0);
        assert_eq!(EnemyIntent::attack(5, 1).with_block(5).total_damage(), 5);
    }

    #[test]
    fn test_combination_builders() {
        let intent = EnemyIntent::attack(7, 1).with_status("weak", 1, true);
        assert_eq!(intent.intent_type, IntentType::AttackDebuff);
        let intent = EnemyIntent::attack(7, 1).with_status("strength", 2, false);
        assert_eq!(intent.intent_type, IntentType::AttackBuff);
        let intent = EnemyIntent::attack(7, 1).with_block(4);
        assert_eq!(intent.intent_type, IntentType::AttackDefend);
    }

    #[test]
    fn test_summary() {
        assert_eq!(EnemyIntent::attack(5, 2).summary(), "attack 5x2");
        assert_eq!(EnemyIntent::attack(11, 1).with_block(6).summary(), "attack 11, block 6");
        assert_eq!(EnemyIntent::buff("strength", 3).summary(), "strength 3");
        assert_eq!(EnemyIntent::unknown().summary(), "?");
    }

    #[test]
    fn test_intent_toml_defaults() {
        let intent: EnemyIntent = toml::from_str(r#"intent_type = "attack"
damage = 6"#)
        .unwrap();
        assert_eq!(intent.times, 1);
        assert_eq!(intent.total_damage(), 6);
    }
}

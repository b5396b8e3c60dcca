//! Status catalog loading

use super::ConfigError;
use crate::status::{StatusEffectDef, StatusRegistry};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Container for status configurations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusesConfig {
    #[serde(rename = "statuses")]
    pub statuses: Vec<StatusEffectDef>,
}

/// Load status configurations from a TOML file
pub fn load_status_configs(path: &Path) -> Result<StatusRegistry, ConfigError> {
    let config: StatusesConfig = super::load_toml(path)?;
    build_registry(config)
}

/// Load status configurations from a TOML string
pub fn parse_status_configs(content: &str) -> Result<StatusRegistry, ConfigError> {
    let config: StatusesConfig = super::parse_toml(content)?;
    build_registry(config)
}

/// Get the bundled status catalog
pub fn default_statuses() -> StatusRegistry {
    let toml = include_str!("../../config/statuses.toml");
    parse_status_configs(toml).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "bundled status catalog failed to load");
        StatusRegistry::new()
    })
}

fn build_registry(config: StatusesConfig) -> Result<StatusRegistry, ConfigError> {
    let mut registry = StatusRegistry::new();
    for def in config.statuses {
        if def.id.is_empty() {
            return Err(ConfigError::ValidationError("status with empty id".to_string()));
        }
        if def.max_stacks < 0 {
            return Err(ConfigError::ValidationError(format!(
                "status '{}' has negative max_stacks",
                def.id
            )));
        }
        registry
            .register(def)
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;
    }
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::{ids, StatusKind};
    use crate::types::{StackBehavior, StatusEffectType};

    #[test]
    fn test_parse_statuses() {
        let toml = r#"
[[statuses]]
id = "weak"
name = "Weak"
description = "Deals 25% less attack damage for {stacks} turns."
effect_type = "debuff"
stack_behavior = "duration"
decrements_at_turn_end = true
kind = "weak"

[[statuses]]
id = "burn"
name = "Burn"
"#;

        let registry = parse_status_configs(toml).unwrap();
        let weak = registry.get("weak").unwrap();
        assert_eq!(weak.effect_type, StatusEffectType::Debuff);
        assert_eq!(weak.stack_behavior, StackBehavior::Duration);
        assert!(weak.decrements_at_turn_end);
        assert_eq!(weak.tooltip(2), "Deals 25% less attack damage for 2 turns.");

        let burn = registry.get("burn").unwrap();
        assert_eq!(burn.kind, StatusKind::Generic);
        assert_eq!(burn.effect_type, StatusEffectType::Neutral);
    }

    #[test]
    fn test_duplicate_status_rejected() {
        let toml = r#"
[[statuses]]
id = "weak"
name = "Weak"

[[statuses]]
id = "weak"
name = "Weak Again"
"#;
        assert!(matches!(
            parse_status_configs(toml),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_default_statuses_loads_all() {
        let registry = default_statuses();
        let expected = [
            ids::STRENGTH,
            ids::DEXTERITY,
            ids::WEAK,
            ids::VULNERABLE,
            ids::FRAIL,
            ids::ARTIFACT,
            ids::INTANGIBLE,
            ids::POISON,
            "regeneration",
            "metallicize",
            "plated_armor",
            "ritual",
            "thorns",
            "double_damage",
        ];
        for id in expected {
            assert!(registry.contains(id), "Missing status: {}", id);
        }
        assert_eq!(registry.get(ids::ARTIFACT).unwrap().stack_behavior, StackBehavior::Counter);
    }
}

//! Enemy catalog loading

use super::ConfigError;
use crate::enemy::{EnemyDef, EnemyRegistry};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Container for enemy configurations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnemiesConfig {
    #[serde(rename = "enemies")]
    pub enemies: Vec<EnemyDef>,
}

/// Load enemy configurations from a TOML file
pub fn load_enemy_configs(path: &Path) -> Result<EnemyRegistry, ConfigError> {
    let config: EnemiesConfig = super::load_toml(path)?;
    build_registry(config)
}

/// Load enemy configurations from a TOML string
pub fn parse_enemy_configs(content: &str) -> Result<EnemyRegistry, ConfigError> {
    let config: EnemiesConfig = super::parse_toml(content)?;
    build_registry(config)
}

/// Get the bundled enemy catalog
pub fn default_enemies() -> EnemyRegistry {
    let toml = include_str!("../../config/enemies.toml");
    parse_enemy_configs(toml).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "bundled enemy catalog failed to load");
        EnemyRegistry::new()
    })
}

fn build_registry(config: EnemiesConfig) -> Result<EnemyRegistry, ConfigError> {
    let mut registry = EnemyRegistry::new();
    for def in config.enemies {
        if def.base_health <= 0 {
            return Err(ConfigError::ValidationError(format!(
                "enemy '{}' needs positive base_health",
                def.id
            )));
        }
        if def.health_variance < 0 || def.health_variance >= def.base_health {
            return Err(ConfigError::ValidationError(format!(
                "enemy '{}' health_variance must be in [0, base_health)",
                def.id
            )));
        }
        registry
            .register(def)
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;
    }
    Ok(registry)
}

//! Relic catalog loading

use super::ConfigError;
use crate::relic::{RelicDef, RelicRegistry};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Container for relic configurations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelicsConfig {
    #[serde(rename = "relics")]
    pub relics: Vec<RelicDef>,
}

/// Load relic configurations from a TOML file
pub fn load_relic_configs(path: &Path) -> Result<RelicRegistry, ConfigError> {
    let config: RelicsConfig = super::load_toml(path)?;
    build_registry(config)
}

/// Load relic configurations from a TOML string
pub fn parse_relic_configs(content: &str) -> Result<RelicRegistry, ConfigError> {
    let config: RelicsConfig = super::parse_toml(content)?;
    build_registry(config)
}

/// Get the bundled relic catalog
pub fn default_relics() -> RelicRegistry {
    let toml = include_str!("../../config/relics.toml");
    parse_relic_configs(toml).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "bundled relic catalog failed to load");
        RelicRegistry::new()
    })
}

fn build_registry(config: RelicsConfig) -> Result<RelicRegistry, ConfigError> {
    let mut registry = RelicRegistry::new();
    for def in config.relics {
        if def.counter_max < 0 {
            return Err(ConfigError::ValidationError(format!(
                "relic '{}' has negative counter_max",
                def.id
            )));
        }
        registry
            .register(def.normalized())
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;
    }
    Ok(registry)
}

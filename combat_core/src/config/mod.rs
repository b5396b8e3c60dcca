//! Configuration loading from TOML files
//!
//! Every catalog ships a bundled default under `combat_core/config/` and can
//! be replaced by a user file through the matching `load_*` function.

mod enemies;
mod relics;
mod rules;
mod statuses;

pub use enemies::{default_enemies, load_enemy_configs, parse_enemy_configs, EnemiesConfig};
pub use relics::{default_relics, load_relic_configs, parse_relic_configs, RelicsConfig};
pub use rules::{default_rules_config, load_rules_config, parse_rules_config};
pub use statuses::{default_statuses, load_status_configs, parse_status_configs, StatusesConfig};

use std::fs;
use std::path::Path;
use thiserror::Error;

/// Configuration loading error
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Configuration validation error: {0}")]
    ValidationError(String),
}

/// Load a TOML file and deserialize it
pub fn load_toml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: T = toml::from_str(&content)?;
    Ok(config)
}

/// Load a TOML string and deserialize it
pub fn parse_toml<T: serde::de::DeserializeOwned>(content: &str) -> Result<T, ConfigError> {
    let config: T = toml::from_str(content)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RulesConfig;

    #[test]
    fn test_parse_error_is_reported() {
        let err = parse_toml::<RulesConfig>("energy_per_turn = \"three\"").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_toml::<RulesConfig>(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::IoError(_)));
    }
}

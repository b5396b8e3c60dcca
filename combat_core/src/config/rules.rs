//! Rule constant loading

use super::ConfigError;
use crate::rules::RulesConfig;
use std::path::Path;

/// Load rule constants from a TOML file
pub fn load_rules_config(path: &Path) -> Result<RulesConfig, ConfigError> {
    let config: RulesConfig = super::load_toml(path)?;
    validate(config)
}

/// Load rule constants from a TOML string
pub fn parse_rules_config(content: &str) -> Result<RulesConfig, ConfigError> {
    let config: RulesConfig = super::parse_toml(content)?;
    validate(config)
}

/// Get the bundled rule constants
pub fn default_rules_config() -> RulesConfig {
    let toml = include_str!("../../config/rules.toml");
    parse_rules_config(toml).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "bundled rules failed to load");
        RulesConfig::default()
    })
}

fn validate(config: RulesConfig) -> Result<RulesConfig, ConfigError> {
    if config.energy_per_turn < 0 {
        return Err(ConfigError::ValidationError(
            "energy_per_turn must not be negative".to_string(),
        ));
    }
    if config.hand_size_limit == 0 {
        return Err(ConfigError::ValidationError(
            "hand_size_limit must be positive".to_string(),
        ));
    }
    let multipliers = [
        ("weak_multiplier", config.weak_multiplier),
        ("vulnerable_multiplier", config.vulnerable_multiplier),
        ("frail_multiplier", config.frail_multiplier),
    ];
    for (name, value) in multipliers {
        if !value.is_finite() || value < 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "{name} must be a non-negative number"
            )));
        }
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_uses_defaults() {
        let config = parse_rules_config("energy_per_turn = 4\ncan_escape = true").unwrap();
        assert_eq!(config.energy_per_turn, 4);
        assert!(config.can_escape);
        assert_eq!(config.cards_per_turn, 5);
        assert!((config.weak_multiplier - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn test_validation() {
        assert!(matches!(
            parse_rules_config("hand_size_limit = 0"),
            Err(ConfigError::ValidationError(_))
        ));
        assert!(matches!(
            parse_rules_config("vulnerable_multiplier = -1.0"),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_default_rules_config() {
        let config = default_rules_config();
        assert_eq!(config.energy_per_turn, 3);
        assert_eq!(config.hand_size_limit, 10);
        assert!(!config.can_escape);
    }
}

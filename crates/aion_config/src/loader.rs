//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::RouterConfig;
use std::path::Path;

/// Loads and validates a `router.toml` configuration from a project directory.
///
/// If `<project_dir>/router.toml` does not exist, returns the all-defaults
/// [`RouterConfig`] rather than an error: a missing config file is not a
/// failure, it is the common case.
pub fn load_config(project_dir: &Path) -> Result<RouterConfig, ConfigError> {
    let config_path = project_dir.join("router.toml");
    match std::fs::read_to_string(&config_path) {
        Ok(content) => load_config_from_str(&content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(RouterConfig::default()),
        Err(e) => Err(ConfigError::IoError(e)),
    }
}

/// Parses and validates a `router.toml` configuration from a string.
///
/// Useful for testing without filesystem dependencies.
pub fn load_config_from_str(content: &str) -> Result<RouterConfig, ConfigError> {
    let config: RouterConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Validates that configuration values are internally consistent.
fn validate_config(config: &RouterConfig) -> Result<(), ConfigError> {
    if config.max_iterations == 0 {
        return Err(ConfigError::ValidationError(
            "max_iterations must be at least 1".to_string(),
        ));
    }
    if config.node_cost_cap <= 0.0 {
        return Err(ConfigError::ValidationError(
            "node_cost_cap must be positive".to_string(),
        ));
    }
    if config.rip_cost_clamp <= 0.0 {
        return Err(ConfigError::ValidationError(
            "rip_cost_clamp must be positive".to_string(),
        ));
    }
    if config.heuristic_multiplier <= 0.0 {
        return Err(ConfigError::ValidationError(
            "heuristic_multiplier must be positive".to_string(),
        ));
    }
    Ok(())
}

//! Keyline configuration file handling

use anyhow::{Context, Result};
use keyline_animation::EngineConfig;
use std::fs;
use std::path::Path;

/// Config file looked up in the working directory when `--config` is absent
pub const CONFIG_FILE: &str = "keyline.toml";

/// Load the engine configuration.
///
/// An explicit path must exist; without one, `keyline.toml` in the working
/// directory is used when present and built-in defaults otherwise.
pub fn load(explicit: Option<&Path>) -> Result<EngineConfig> {
    let config_path = match explicit {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("Config file {} not found", path.display());
            }
            path.to_path_buf()
        }
        None => {
            let default = Path::new(CONFIG_FILE);
            if !default.exists() {
                tracing::debug!("no {} found, using defaults", CONFIG_FILE);
                return Ok(EngineConfig::default());
            }
            default.to_path_buf()
        }
    };

    let content = fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read {}", config_path.display()))?;
    let config = parse(&content)
        .with_context(|| format!("Failed to parse {}", config_path.display()))?;

    tracing::debug!("loaded config from {}", config_path.display());
    Ok(config)
}

/// Parse and validate TOML config text
pub fn parse(content: &str) -> Result<EngineConfig> {
    let config: EngineConfig = toml::from_str(content)?;
    config.validate()?;
    Ok(config)
}

/// Serialize to TOML string
pub fn to_toml(config: &EngineConfig) -> Result<String> {
    toml::to_string_pretty(config).context("Failed to serialize config")
}

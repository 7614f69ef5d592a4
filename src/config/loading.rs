//! Configuration loading from TOML files

use std::path::Path;

use anyhow::{Context, Result};

use super::types::Config;

/// Where the running configuration came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    /// Read from a TOML file
    File,
    /// No file present, built-in defaults
    Defaults,
}

impl ConfigSource {
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::File => "configuration file",
            Self::Defaults => "built-in defaults",
        }
    }
}

/// Load and validate configuration from a TOML file
pub fn load_config(config_path: impl AsRef<Path>) -> Result<Config> {
    let path = config_path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))?;

    config.validate()?;
    Ok(config)
}

/// Load configuration from `config_path`, falling back to defaults when the
/// file does not exist
///
/// A file that exists but cannot be read or parsed is still an error.
pub fn load_config_with_fallback(config_path: impl AsRef<Path>) -> Result<(Config, ConfigSource)> {
    let path = config_path.as_ref();
    if !path.exists() {
        tracing::info!(
            "Config file '{}' not found, using built-in defaults",
            path.display()
        );
        return Ok((Config::default(), ConfigSource::Defaults));
    }

    load_config(path).map(|config| (config, ConfigSource::File))
}

//! Configuration file discovery, parsing and merging
//!
//! This module handles:
//! - Config file discovery (global, project, CLI-provided)
//! - TOML parsing with serde
//! - Additive merging across files
//! - Validation with the offending file named in errors

mod discovery;
mod merge;
mod types;
mod validation;

use std::path::Path;

use anyhow::Context;

pub use discovery::{ConfigDiscovery, ConfigFiles, GLOBAL_CONFIG_NAME, PROJECT_CONFIG_NAME};
pub use merge::ConfigMerger;
pub use types::Config;
pub use validation::ConfigValidator;

/// Coordinates discovery, merging and validation
pub struct ConfigManager;

impl ConfigManager {
    /// Load and merge configuration from all discovered sources
    ///
    /// `cli_config_path` must exist when given; discovered files are optional.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file is missing, unreadable or invalid.
    pub fn load(cli_config_path: Option<&Path>, source_root: &Path) -> anyhow::Result<Config> {
        if let Some(path) = cli_config_path {
            if !path.is_file() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
        }

        let files = ConfigDiscovery::discover(cli_config_path, source_root);
        let merged = ConfigMerger::merge(&files)?;
        ConfigValidator::validate(&merged).context("Invalid merged configuration")?;

        Ok(merged)
    }
}

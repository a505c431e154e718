//! Configuration merging
//!
//! Arrays are additive in precedence order (lowest first), booleans use OR
//! semantics: a lower-precedence file that enables `verbose` cannot be
//! overridden back to `false`.

use std::fs;
use std::path::Path;

use anyhow::Context;

use super::discovery::ConfigFiles;
use super::types::Config;
use super::validation::ConfigValidator;

/// Configuration merger
pub struct ConfigMerger;

impl ConfigMerger {
    /// Merge the discovered files, lowest precedence first
    ///
    /// # Errors
    ///
    /// Returns an error if a config file cannot be read, parsed or validated.
    pub fn merge(files: &ConfigFiles) -> anyhow::Result<Config> {
        let mut merged = Config::default();

        for path in [&files.global, &files.project, &files.cli].into_iter().flatten() {
            Self::merge_into(&mut merged, path)?;
        }

        Ok(merged)
    }

    /// Load, validate and merge a single config file into `base`
    fn merge_into(base: &mut Config, path: &Path) -> anyhow::Result<()> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        ConfigValidator::validate(&config)
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        base.exclude.extend(config.exclude);
        base.verbose |= config.verbose;

        Ok(())
    }
}

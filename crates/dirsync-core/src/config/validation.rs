//! Configuration validation

use super::types::Config;

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate a configuration
    ///
    /// # Errors
    ///
    /// Returns an error if an exclude pattern is empty or whitespace-only.
    pub fn validate(config: &Config) -> anyhow::Result<()> {
        for (idx, pattern) in config.exclude.iter().enumerate() {
            if pattern.trim().is_empty() {
                anyhow::bail!("Exclude pattern #{} cannot be empty", idx + 1);
            }
        }

        Ok(())
    }
}

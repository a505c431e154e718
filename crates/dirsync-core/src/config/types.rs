//! Configuration types

use serde::{Deserialize, Serialize};

/// Settings loaded from a configuration file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    /// Substring patterns excluded from syncing
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Enable verbose diagnostics
    #[serde(default)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(config.exclude.is_empty());
        assert!(!config.verbose);
    }

    #[test]
    fn test_config_parses_partial_toml() {
        let config: Config = toml::from_str(r#"exclude = ["node_modules"]"#).unwrap();
        assert_eq!(config.exclude, vec!["node_modules".to_string()]);
        assert!(!config.verbose);

        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
    }
}

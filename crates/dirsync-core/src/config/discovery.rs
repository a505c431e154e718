//! Configuration file discovery

use std::path::{Path, PathBuf};

/// Name of the per-project config file, looked up at the source root
pub const PROJECT_CONFIG_NAME: &str = ".dirsync.toml";

/// Name of the global config file inside `<config_dir>/dirsync/`
pub const GLOBAL_CONFIG_NAME: &str = "config.toml";

/// Configuration file locations in order of precedence
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConfigFiles {
    /// Config from CLI flag (highest precedence)
    pub cli: Option<PathBuf>,
    /// Project config at the source root
    pub project: Option<PathBuf>,
    /// Global XDG config
    pub global: Option<PathBuf>,
}

/// Config file discovery
pub struct ConfigDiscovery;

impl ConfigDiscovery {
    /// Discover all available configuration files
    #[must_use]
    pub fn discover(cli_path: Option<&Path>, source_root: &Path) -> ConfigFiles {
        let cli = cli_path.filter(|p| p.is_file()).map(Path::to_path_buf);
        let project = Some(source_root.join(PROJECT_CONFIG_NAME)).filter(|p| p.is_file());
        let global = Self::find_global_config();

        ConfigFiles {
            cli,
            project,
            global,
        }
    }

    /// Find global config in XDG config directory
    fn find_global_config() -> Option<PathBuf> {
        let global_config = dirs::config_dir()?.join("dirsync").join(GLOBAL_CONFIG_NAME);

        if global_config.is_file() {
            Some(global_config)
        } else {
            None
        }
    }
}

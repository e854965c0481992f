use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },
}

/// User configuration: where the saved editor blob lives.
#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    pub data_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_path: Self::default_data_path(),
        }
    }
}

impl Config {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let mut config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        // Expand shell variables and tilde in the loaded data path
        config.data_path = Self::expand_path(&config.data_path).unwrap_or(config.data_path);

        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    /// Load the config, falling back to defaults when none exists yet.
    pub fn load_or_default() -> Result<Self, ConfigError> {
        Ok(Self::load()?.unwrap_or_default())
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        self.save_to_path(&config_path)
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/blockpad");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    pub fn default_data_path() -> PathBuf {
        let data_dir = shellexpand::tilde("~/.local/share/blockpad");
        PathBuf::from(data_dir.as_ref())
    }

    fn expand_path(path: &Path) -> Option<PathBuf> {
        let path_str = path.to_string_lossy();
        match shellexpand::full(&path_str) {
            Ok(expanded) => Some(PathBuf::from(expanded.as_ref())),
            Err(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_paths_are_expanded_and_absolute() {
        for path in [Config::config_path(), Config::default_data_path()] {
            assert!(path.is_absolute(), "{} should be absolute", path.display());
            assert!(!path.to_string_lossy().contains('~'));
        }
        assert!(Config::config_path().ends_with("blockpad/config.toml"));
        assert_eq!(Config::default().data_path, Config::default_data_path());
    }

    #[test]
    fn test_missing_config_loads_as_none() {
        let dir = TempDir::new().unwrap();
        let absent = dir.path().join("absent.toml");
        assert!(Config::load_from_path(&absent).unwrap().is_none());
    }

    #[test]
    fn test_save_creates_parents_and_loads_back() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("nested").join("config.toml");
        let config = Config {
            data_path: PathBuf::from("/srv/blockpad-data"),
        };

        config.save_to_path(&file).unwrap();
        let loaded = Config::load_from_path(&file).unwrap().unwrap();
        assert_eq!(loaded.data_path, config.data_path);
    }

    #[test]
    fn test_loading_expands_tilde() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("config.toml");
        std::fs::write(&file, "data_path = \"~/blockpad-data\"\n").unwrap();

        let loaded = Config::load_from_path(&file).unwrap().unwrap();
        assert!(!loaded.data_path.to_string_lossy().starts_with('~'));
        assert!(loaded.data_path.ends_with("blockpad-data"));
    }

    #[test]
    fn test_loading_expands_env_vars() {
        unsafe {
            std::env::set_var("BLOCKPAD_CFG_TEST_DIR", "/var/tmp");
        }
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("config.toml");
        std::fs::write(&file, "data_path = \"$BLOCKPAD_CFG_TEST_DIR/bp\"\n").unwrap();

        let loaded = Config::load_from_path(&file).unwrap().unwrap();
        assert_eq!(loaded.data_path, PathBuf::from("/var/tmp/bp"));
        unsafe {
            std::env::remove_var("BLOCKPAD_CFG_TEST_DIR");
        }
    }

    #[test]
    fn test_malformed_config_is_a_parse_error() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("config.toml");
        std::fs::write(&file, "data_path = [not valid").unwrap();

        assert!(matches!(
            Config::load_from_path(&file),
            Err(ConfigError::ConfigParseError { .. })
        ));
    }
}

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::favorites::DEFAULT_FAVORITES;

/// Main configuration structure
///
/// Loaded from `config.toml` in the platform config dir; CLI flags are layered
/// on top by the binary. Every section and field has a default, so a partial
/// file is fine and a missing file means defaults.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub catalog: CatalogConfig,
    pub storage: StorageConfig,
    pub search: SearchConfig,
    pub favorites: FavoritesConfig,
    pub ui: UiConfig,
}

impl Config {
    /// Load config from default location, falling back to defaults
    pub fn load() -> crate::Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    /// Load from an explicit path. A missing file is not an error.
    pub fn load_from(path: &Path) -> crate::Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            let config: Config = toml::from_str(&contents).map_err(|e| {
                crate::Error::ConfigError(format!(
                    "Failed to parse {}: {}",
                    path.display(),
                    e
                ))
            })?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// `<config_dir>/mserv/config.toml`
    pub fn config_path() -> crate::Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| crate::Error::ConfigError("Could not find config directory".into()))?
            .join("mserv");

        Ok(config_dir.join("config.toml"))
    }

    /// `<data_dir>/mserv`, home of the storage database and the log file
    pub fn data_dir() -> crate::Result<PathBuf> {
        Ok(dirs::data_dir()
            .ok_or_else(|| crate::Error::ConfigError("Could not find data directory".into()))?
            .join("mserv"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CatalogConfig {
    /// Where the catalog JSON is served
    pub url: String,

    /// Local catalog file; takes precedence over `url` when set
    pub path: Option<PathBuf>,

    /// Request timeout. Unset means wait as long as the server takes.
    pub timeout_secs: Option<u64>,

    /// Extra attempts on transient failures
    pub retries: u32,
}

impl CatalogConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            url: mserv_api::DEFAULT_CATALOG_URL.to_string(),
            path: None,
            timeout_secs: None,
            retries: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite file holding favorites and preferences
    pub path: Option<PathBuf>,
}

impl StorageConfig {
    pub fn resolved_path(&self) -> crate::Result<PathBuf> {
        match &self.path {
            Some(path) => Ok(path.clone()),
            None => Ok(Config::data_dir()?.join("storage.db")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SearchConfig {
    /// Queries shorter than this show everything
    pub min_query_len: usize,

    /// Quiet period after the last keystroke before filtering
    pub debounce_ms: u64,
}

impl SearchConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            min_query_len: crate::filter::MIN_QUERY_LEN,
            debounce_ms: 300,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FavoritesConfig {
    /// Used when nothing (or garbage) is stored
    pub defaults: Vec<String>,
}

impl Default for FavoritesConfig {
    fn default() -> Self {
        Self {
            defaults: DEFAULT_FAVORITES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UiConfig {
    /// Enable mouse support in TUI (right click toggles a favorite)
    pub mouse_enabled: bool,

    /// How often the simulated system metrics move
    pub metrics_interval_secs: u64,

    /// Surface unexpected errors as notifications
    pub debug: bool,
}

impl UiConfig {
    pub fn metrics_interval(&self) -> Duration {
        Duration::from_secs(self.metrics_interval_secs.max(1))
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            mouse_enabled: true,
            metrics_interval_secs: 5,
            debug: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.search.min_query_len, 2);
        assert_eq!(config.search.debounce_ms, 300);
        assert_eq!(config.catalog.timeout_secs, None);
        assert_eq!(config.catalog.retries, 0);
        assert_eq!(
            config.favorites.defaults,
            vec!["jellyfin", "portainer", "gitea", "nextcloud"]
        );
        assert_eq!(config.ui.metrics_interval(), Duration::from_secs(5));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            [catalog]
            url = "https://home.lan/config/services.json"
            timeout_secs = 10
            "#,
        )
        .unwrap();

        assert_eq!(config.catalog.url, "https://home.lan/config/services.json");
        assert_eq!(config.catalog.timeout(), Some(Duration::from_secs(10)));
        assert_eq!(config.search.debounce_ms, 300);
        assert!(config.ui.mouse_enabled);
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_garbage_file_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[catalog\nurl = ").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(crate::Error::ConfigError(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[search]\ndebounce_ms = 150\n\n[storage]\npath = \"/tmp/mserv.db\"\n")
            .unwrap();

        let mut expected = Config::default();
        expected.search.debounce_ms = 150;
        expected.storage.path = Some(PathBuf::from("/tmp/mserv.db"));
        assert_eq!(Config::load_from(&path).unwrap(), expected);
    }
}

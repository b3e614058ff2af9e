use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming an alternative config file.
pub const CONFIG_ENV: &str = "SCHOOLSHOTS_CONFIG";

/// Hard ceiling on `server.max_page_size`.
pub const PAGE_SIZE_LIMIT: u32 = 50;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub events: EventsConfig,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseType {
    #[default]
    Sqlite,
    Postgresql,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub backend: DatabaseType,

    #[serde(default = "default_db_path")]
    pub sqlite_path: PathBuf,

    /// Only read when `backend = "postgresql"`.
    #[serde(default)]
    pub postgresql_url: Option<String>,

    #[serde(default)]
    pub pool_size: Option<u32>,
}

fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("schoolshots")
        .join("schoolshots.db")
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: DatabaseType::default(),
            sqlite_path: default_db_path(),
            postgresql_url: None,
            pool_size: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Page size used when a request does not name one.
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,

    /// Largest page size the HTTP API accepts.
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u32,
}

fn default_bind() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_page_size() -> u32 {
    12
}

fn default_max_page_size() -> u32 {
    50
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventsConfig {
    /// Events shooting within this many whole days count as "This Week".
    #[serde(default = "default_upcoming_window_days")]
    pub upcoming_window_days: i64,
}

fn default_upcoming_window_days() -> i64 {
    7
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            upcoming_window_days: default_upcoming_window_days(),
        }
    }
}

impl Config {
    /// Load the config, writing out defaults when no file exists yet.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            let config = Config::default();
            config.save_to(&config_path)?;
            Ok(config)
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        Ok(config)
    }

    /// Check settings that parse but cannot be served.
    pub fn validate(&self) -> Result<()> {
        let server = &self.server;
        if server.max_page_size < 1 || server.max_page_size > PAGE_SIZE_LIMIT {
            anyhow::bail!(
                "server.max_page_size must be between 1 and {}, got {}",
                PAGE_SIZE_LIMIT,
                server.max_page_size
            );
        }
        if server.default_page_size < 1 || server.default_page_size > server.max_page_size {
            anyhow::bail!(
                "server.default_page_size must be between 1 and max_page_size ({}), got {}",
                server.max_page_size,
                server.default_page_size
            );
        }
        if self.events.upcoming_window_days < 0 {
            anyhow::bail!(
                "events.upcoming_window_days must not be negative, got {}",
                self.events.upcoming_window_days
            );
        }
        Ok(())
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        Ok(())
    }

    /// `$SCHOOLSHOTS_CONFIG` if set, else the per-user config directory.
    pub fn config_path() -> PathBuf {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return PathBuf::from(path);
        }
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("schoolshots")
            .join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.database.backend, DatabaseType::Sqlite);
        assert!(config.database.sqlite_path.ends_with("schoolshots/schoolshots.db"));
        assert_eq!(config.server.bind, "127.0.0.1:3000");
        assert_eq!(config.server.default_page_size, 12);
        assert_eq!(config.server.max_page_size, 50);
        assert_eq!(config.events.upcoming_window_days, 7);
    }

    #[test]
    fn test_partial_file_fills_in_defaults() {
        let config: Config = toml::from_str(
            r#"
            [server]
            default_page_size = 24

            [database]
            sqlite_path = "/srv/schoolshots/catalog.db"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.default_page_size, 24);
        assert_eq!(config.server.max_page_size, 50);
        assert_eq!(config.database.sqlite_path, PathBuf::from("/srv/schoolshots/catalog.db"));
        assert_eq!(config.events.upcoming_window_days, 7);
    }

    #[test]
    fn test_backend_names_are_lowercase() {
        let config: Config = toml::from_str(
            r#"
            [database]
            backend = "postgresql"
            postgresql_url = "postgres://localhost/schoolshots"
            pool_size = 4
            "#,
        )
        .unwrap();

        assert_eq!(config.database.backend, DatabaseType::Postgresql);
        assert_eq!(config.database.pool_size, Some(4));
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.server.bind = "0.0.0.0:8080".to_string();
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.server.bind, "0.0.0.0:8080");
    }

    #[test]
    fn test_unservable_page_sizes_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        for server in [
            "default_page_size = 60",
            "default_page_size = 0",
            "max_page_size = 80",
            "max_page_size = 10\ndefault_page_size = 12",
        ] {
            std::fs::write(&path, format!("[server]\n{}\n", server)).unwrap();
            let err = Config::load_from(&path).unwrap_err();
            assert!(format!("{:#}", err).contains("page_size"), "{}", server);
        }

        std::fs::write(&path, "[server]\nmax_page_size = 20\ndefault_page_size = 20\n").unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.server.default_page_size, 20);
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_unparseable_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server\nbind = ").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}

//! # Service Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     BISTRO_DB_PATH=/var/lib/bistro/bistro.db                           │
//! │     BISTRO_DB_MAX_CONNECTIONS=8                                        │
//! │     BISTRO_LOG=info,bistro=trace                                       │
//! │     BISTRO_REJECT_OVERPAYMENT=true                                     │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/bistro-pos/service.toml (Linux)                          │
//! │     ~/Library/Application Support/com.bistro.pos/service.toml (macOS)  │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # service.toml
//! [database]
//! path = "/var/lib/bistro/bistro.db"
//! max_connections = 5
//!
//! [logging]
//! filter = "info,bistro=debug,sqlx=warn"
//!
//! [orders]
//! reject_overpayment = false
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info, warn};

use bistro_db::DbConfig;

use crate::error::ConfigError;

/// Default tracing filter.
pub const DEFAULT_LOG_FILTER: &str = "info,bistro=debug,sqlx=warn";

// =============================================================================
// Sections
// =============================================================================

/// Where the SQLite file lives and how many connections to keep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// Database file. `:memory:` keeps everything in memory.
    #[serde(default = "default_db_path")]
    pub path: PathBuf,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_db_path() -> PathBuf {
    directories::ProjectDirs::from("com", "bistro", "pos")
        .map(|dirs| dirs.data_dir().join("bistro.db"))
        .unwrap_or_else(|| PathBuf::from("bistro.db"))
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_db_path(),
            max_connections: default_max_connections(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// `EnvFilter` directives. `RUST_LOG` still wins when set.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

impl Default for LoggingSettings {
    fn default() -> Self {
        LoggingSettings {
            filter: default_log_filter(),
        }
    }
}

/// Order rules that vary between restaurants.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderSettings {
    /// Refuse a payment that would push the paid total over the payable
    /// total. Off by default: overpaying in cash is how change happens.
    #[serde(default)]
    pub reject_overpayment: bool,
}

// =============================================================================
// Service Config
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub logging: LoggingSettings,

    #[serde(default)]
    pub orders: OrderSettings,
}

impl ServiceConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (service.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading service config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load service config: {}. Using defaults.", e);
            Self::default()
        })
    }

    pub fn save(&self, config_path: Option<PathBuf>) -> Result<(), ConfigError> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or(ConfigError::NoPath)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Service config saved");
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("database.path must not be empty".into()));
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be greater than 0".into(),
            ));
        }

        if self.logging.filter.trim().is_empty() {
            return Err(ConfigError::Invalid("logging.filter must not be empty".into()));
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("BISTRO_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = PathBuf::from(path);
        }

        if let Ok(max) = std::env::var("BISTRO_DB_MAX_CONNECTIONS") {
            match max.parse::<u32>() {
                Ok(n) => self.database.max_connections = n,
                Err(_) => warn!(value = %max, "Ignoring invalid BISTRO_DB_MAX_CONNECTIONS"),
            }
        }

        if let Ok(filter) = std::env::var("BISTRO_LOG") {
            self.logging.filter = filter;
        }

        if let Ok(flag) = std::env::var("BISTRO_REJECT_OVERPAYMENT") {
            match flag.to_lowercase().as_str() {
                "1" | "true" | "yes" => self.orders.reject_overpayment = true,
                "0" | "false" | "no" => self.orders.reject_overpayment = false,
                _ => warn!(value = %flag, "Unknown BISTRO_REJECT_OVERPAYMENT value"),
            }
        }
    }

    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "bistro", "pos")
            .map(|dirs| dirs.config_dir().join("service.toml"))
    }

    /// Pool settings for [`bistro_db::Database::new`].
    pub fn db_config(&self) -> DbConfig {
        if self.database.path.as_os_str() == ":memory:" {
            return DbConfig::in_memory();
        }

        DbConfig::new(self.database.path.clone()).max_connections(self.database.max_connections)
    }
}

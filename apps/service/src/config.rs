//! # Service Configuration
//!
//! Loaded once at startup and read-only afterwards.
//!
//! ## Configuration Sources (Priority Order)
//! 1. Environment variables (`TIFFIN_*`)
//! 2. Config file (TOML)
//! 3. Defaults (this file)
//!
//! ## Example
//! ```toml
//! [database]
//! path = "/var/lib/tiffin/tiffin.db"
//! max_connections = 8
//! busy_timeout_ms = 5000
//!
//! [ordering]
//! kitchen_id = "0b6f3c1e-2d4a-4f7e-9c1a-5e8d2b7a9f10"
//! placement_timeout_ms = 10000
//! strict_status = true
//! ```
//!
//! ## Environment Overrides
//! | Variable                          | Field                                |
//! |-----------------------------------|--------------------------------------|
//! | `TIFFIN_DB_PATH`                  | `database.path`                      |
//! | `TIFFIN_DB_MAX_CONNECTIONS`       | `database.max_connections`           |
//! | `TIFFIN_DB_BUSY_TIMEOUT_MS`       | `database.busy_timeout_ms`           |
//! | `TIFFIN_KITCHEN_ID`               | `ordering.kitchen_id`                |
//! | `TIFFIN_REQUIRE_APPROVED_KITCHEN` | `ordering.require_approved_kitchen`  |
//! | `TIFFIN_PLACEMENT_TIMEOUT_MS`     | `ordering.placement_timeout_ms`      |
//! | `TIFFIN_STRICT_STATUS`            | `ordering.strict_status`             |

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tiffin_core::StatusPolicy;
use tiffin_db::{DbConfig, PlacementConfig};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {var}: '{value}'")]
    InvalidEnv { var: String, value: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level service configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceConfig {
    pub database: DatabaseSection,
    pub ordering: OrderingSection,
}

/// `[database]`
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseSection {
    /// SQLite file, created if missing.
    pub path: PathBuf,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_ms: u64,
    /// How long a writer waits for the SQLite write lock.
    pub busy_timeout_ms: u64,
    pub run_migrations: bool,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        DatabaseSection {
            path: PathBuf::from("./tiffin.db"),
            max_connections: 5,
            min_connections: 1,
            connect_timeout_ms: 30_000,
            busy_timeout_ms: 5_000,
            run_migrations: true,
        }
    }
}

/// `[ordering]`
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OrderingSection {
    /// The kitchen every order is routed to. Required.
    pub kitchen_id: Option<String>,
    pub require_approved_kitchen: bool,
    /// Upper bound on one placement, lock waits included.
    pub placement_timeout_ms: u64,
    /// Only allow the next status in fulfillment order.
    pub strict_status: bool,
}

impl Default for OrderingSection {
    fn default() -> Self {
        OrderingSection {
            kitchen_id: None,
            require_approved_kitchen: true,
            placement_timeout_ms: 10_000,
            strict_status: false,
        }
    }
}

impl ServiceConfig {
    /// Loads the file at `path` (if any), applies `TIFFIN_*` variables from
    /// the process environment and validates the result.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
                ServiceConfig::from_toml_str(&text)?
            }
            None => ServiceConfig::default(),
        };

        config.apply_overrides(std::env::vars())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Applies `TIFFIN_*` overrides from `vars`; other variables are ignored.
    pub fn apply_overrides<I>(&mut self, vars: I) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (var, value) in vars {
            match var.as_str() {
                "TIFFIN_DB_PATH" => self.database.path = PathBuf::from(value),
                "TIFFIN_DB_MAX_CONNECTIONS" => {
                    self.database.max_connections = parse_env(&var, &value)?
                }
                "TIFFIN_DB_BUSY_TIMEOUT_MS" => {
                    self.database.busy_timeout_ms = parse_env(&var, &value)?
                }
                "TIFFIN_KITCHEN_ID" => self.ordering.kitchen_id = Some(value),
                "TIFFIN_REQUIRE_APPROVED_KITCHEN" => {
                    self.ordering.require_approved_kitchen = parse_env(&var, &value)?
                }
                "TIFFIN_PLACEMENT_TIMEOUT_MS" => {
                    self.ordering.placement_timeout_ms = parse_env(&var, &value)?
                }
                "TIFFIN_STRICT_STATUS" => self.ordering.strict_status = parse_env(&var, &value)?,
                _ => {}
            }
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.kitchen_id()?;

        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be at least 1".to_string(),
            ));
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigError::Invalid(
                "database.min_connections exceeds max_connections".to_string(),
            ));
        }

        if self.ordering.placement_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "ordering.placement_timeout_ms must be positive".to_string(),
            ));
        }

        Ok(())
    }

    pub fn db_config(&self) -> DbConfig {
        let db = &self.database;
        DbConfig::new(&db.path)
            .max_connections(db.max_connections)
            .min_connections(db.min_connections)
            .connect_timeout(Duration::from_millis(db.connect_timeout_ms))
            .busy_timeout(Duration::from_millis(db.busy_timeout_ms))
            .run_migrations(db.run_migrations)
    }

    pub fn placement_config(&self) -> Result<PlacementConfig, ConfigError> {
        Ok(PlacementConfig::new(self.kitchen_id()?)
            .require_approved_kitchen(self.ordering.require_approved_kitchen)
            .timeout(Duration::from_millis(self.ordering.placement_timeout_ms)))
    }

    pub fn status_policy(&self) -> StatusPolicy {
        if self.ordering.strict_status {
            StatusPolicy::Linear
        } else {
            StatusPolicy::Unrestricted
        }
    }

    fn kitchen_id(&self) -> Result<&str, ConfigError> {
        match self.ordering.kitchen_id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => Ok(id),
            _ => Err(ConfigError::Invalid(
                "ordering.kitchen_id is required (or set TIFFIN_KITCHEN_ID)".to_string(),
            )),
        }
    }
}

fn parse_env<T: FromStr>(var: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        var: var.to_string(),
        value: value.to_string(),
    })
}

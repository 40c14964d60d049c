//! # Application State
//!
//! Shared by every command. Cheap to clone: the database handle shares one
//! pool and the settings are plain values.

use tiffin_core::StatusPolicy;
use tiffin_db::{Database, OrderPlacement, PlacementConfig};
use tracing::info;

use crate::config::{ConfigError, ServiceConfig};
use crate::error::StartupError;

#[derive(Debug, Clone)]
pub struct AppState {
    db: Database,
    placement: PlacementConfig,
    status_policy: StatusPolicy,
}

impl AppState {
    /// Wraps an open database with the ordering settings from `config`.
    pub fn new(db: Database, config: &ServiceConfig) -> Result<Self, ConfigError> {
        Ok(AppState {
            db,
            placement: config.placement_config()?,
            status_policy: config.status_policy(),
        })
    }

    /// Opens the database described by `config` and builds the state.
    pub async fn connect(config: &ServiceConfig) -> Result<Self, StartupError> {
        config.validate()?;

        let db = Database::new(config.db_config()).await?;
        let state = AppState::new(db, config)?;

        info!(
            kitchen_id = %state.placement.kitchen_id,
            status_policy = ?state.status_policy,
            "Service state initialized"
        );
        Ok(state)
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn placement(&self) -> OrderPlacement {
        self.db.placement(self.placement.clone())
    }

    pub fn kitchen_id(&self) -> &str {
        &self.placement.kitchen_id
    }

    pub fn status_policy(&self) -> StatusPolicy {
        self.status_policy
    }
}

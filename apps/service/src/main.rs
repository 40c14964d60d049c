//! Tiffin service process.
//!
//! Opens the database, checks the serving kitchen and keeps the pool
//! warm until Ctrl-C.
//!
//! ```bash
//! TIFFIN_KITCHEN_ID=... cargo run -p tiffin-service -- ./tiffin.toml
//! ```

use std::path::PathBuf;

use tiffin_service::{init_tracing, AppState, ServiceConfig};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("TIFFIN_CONFIG").ok())
        .map(PathBuf::from);

    info!(config = ?config_path, "Starting Tiffin service");

    let config = ServiceConfig::load(config_path.as_deref())?;
    let state = AppState::connect(&config).await?;

    match state.db().kitchens().get(state.kitchen_id()).await? {
        Some(kitchen) if kitchen.accepts_orders() => {
            info!(kitchen = %kitchen.name, "Serving kitchen is open");
        }
        Some(kitchen) => {
            warn!(kitchen = %kitchen.name, "Serving kitchen is not approved or inactive; orders will be refused");
        }
        None => {
            warn!(kitchen_id = %state.kitchen_id(), "Serving kitchen does not exist; run the seed binary first");
        }
    }

    tokio::signal::ctrl_c().await?;

    info!("Shutting down");
    state.db().close().await;
    Ok(())
}

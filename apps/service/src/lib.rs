//! # tiffin-service: Ordering Command Boundary
//!
//! Capability-checked async commands over [`tiffin_db`]. A transport in
//! front of this crate (HTTP, RPC, a job runner) resolves the session into
//! a [`Caller`], deserializes the request DTO and serializes the result or
//! the [`ApiError`].
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. init_tracing()              RUST_LOG or "info,tiffin=debug"        │
//! │  2. ServiceConfig::load(path)   TOML file, then TIFFIN_* overrides     │
//! │  3. AppState::connect(&config)  pool (WAL, busy_timeout), migrations   │
//! │  4. commands::*(&state, &caller, request)                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust,ignore
//! let config = ServiceConfig::load(Some(Path::new("tiffin.toml")))?;
//! let state = AppState::connect(&config).await?;
//!
//! let caller = Caller::customer("cust-42");
//! let order = commands::place_order(&state, &caller, PlaceOrderRequest {
//!     address_id,
//!     payment_mode: "COD".into(),
//! }).await?;
//! ```

pub mod auth;
pub mod commands;
pub mod config;
pub mod error;
pub mod state;

pub use auth::{Caller, Capability, Role};
pub use config::{ConfigError, ServiceConfig};
pub use error::{ApiError, ErrorCode, StartupError};
pub use state::AppState;

use tracing_subscriber::EnvFilter;

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=tiffin_db=trace` - Trace the database layer only
/// - Default: INFO, DEBUG for tiffin crates, WARN for sqlx
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tiffin_service=debug,tiffin_db=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

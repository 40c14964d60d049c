//! # tiffin-db: Database Layer for Tiffin
//!
//! SQLite persistence for carts, orders, payments, kitchens, menus and
//! addresses, and the order placement transaction.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tiffin Data Flow                                 │
//! │                                                                         │
//! │  tiffin-service command (place_order)                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     tiffin-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │  CartRepo     │    │  (embedded)  │  │   │
//! │  │   │               │◄───│  OrderRepo    │    │ 001_init.sql │  │   │
//! │  │   │  SqlitePool   │    │  Kitchen/Menu │    │ 002_catalog  │  │   │
//! │  │   │               │◄───│  OrderPlacement (checkout.rs)     │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database file (WAL)                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Cart Store, orders, catalog, addresses
//! - [`checkout`] - Order placement transaction
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tiffin_db::{Database, DbConfig, PlacementConfig};
//! use tiffin_core::PaymentMode;
//!
//! let db = Database::new(DbConfig::new("./tiffin.db")).await?;
//!
//! db.carts().add_line("cust-1", &menu_item_id, 2).await?;
//! let order = db
//!     .placement(PlacementConfig::new(kitchen_id))
//!     .place_order("cust-1", &address_id, PaymentMode::Cod)
//!     .await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod checkout;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use checkout::{OrderPlacement, PlacementConfig};
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::address::AddressRepository;
pub use repository::cart::CartRepository;
pub use repository::category::CategoryRepository;
pub use repository::kitchen::KitchenRepository;
pub use repository::menu::MenuRepository;
pub use repository::order::OrderRepository;

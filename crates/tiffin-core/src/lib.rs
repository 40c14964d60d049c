//! # tiffin-core: Pure Domain Logic for Tiffin
//!
//! This crate holds the domain model of the Tiffin food-ordering backend
//! as plain types and pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tiffin Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                tiffin-service (command boundary)                │   │
//! │  │    Caller + Capability checks, request DTOs, error codes        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ tiffin-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │  pricing  │  │ validation│  │   │
//! │  │   │   Order   │  │   Money   │  │OrderTotals│  │   rules   │  │   │
//! │  │   │  CartLine │  │  (paise)  │  │           │  │   checks  │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    tiffin-db (Database Layer)                   │   │
//! │  │      SQLite queries, migrations, Cart Store, Order Placement    │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Entities (Cart, Order, Payment, Kitchen, ...) and enums
//! - [`money`] - Money type with integer arithmetic in paise
//! - [`pricing`] - Order totals computed from frozen cart lines
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation rules
//!
//! ## Example Usage
//!
//! ```rust
//! use tiffin_core::money::Money;
//!
//! let price = Money::from_paise(12_050); // ₹120.50
//! let line_total = price.checked_mul(2);
//! assert_eq!(line_total, Some(Money::from_paise(24_100)));
//! ```

pub mod error;
pub mod money;
pub mod pricing;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use pricing::OrderTotals;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Smallest quantity a cart line may hold.
pub const MIN_LINE_QUANTITY: i64 = 1;

/// Largest quantity of a single menu item in a cart.
///
/// Applies to the combined quantity when the same item is added twice.
pub const MAX_LINE_QUANTITY: i64 = 10;

/// Largest menu price in paise (₹1,00,000).
pub const MAX_PRICE_PAISE: i64 = 10_000_000;

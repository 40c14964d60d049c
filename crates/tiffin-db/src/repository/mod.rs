//! # Repository Module
//!
//! Database repository implementations for Tiffin.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  tiffin-service command                                                │
//! │       │                                                                 │
//! │       │  db.carts().add_line("cust-1", item_id, 2)                     │
//! │       ▼                                                                 │
//! │  CartRepository                                                        │
//! │  ├── get_or_create_cart(&self, owner)                                  │
//! │  ├── add_line(&self, owner, item, qty)                                 │
//! │  ├── update_line(&self, owner, line, qty)                              │
//! │  └── remove_line(&self, owner, line)                                   │
//! │       │                                                                 │
//! │       │  SQL (sqlx runtime queries, FromRow rows)                       │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`CartRepository`](cart::CartRepository) - Cart Store
//! - [`OrderRepository`](order::OrderRepository) - Order reads, status, payment
//! - [`KitchenRepository`](kitchen::KitchenRepository) - The kitchen and its approval
//! - [`CategoryRepository`](category::CategoryRepository) - Menu sections
//! - [`MenuRepository`](menu::MenuRepository) - Menu items, nutrition, public menu
//! - [`AddressRepository`](address::AddressRepository) - Delivery addresses and defaults
//!
//! Order placement spans several of these tables in one transaction and
//! lives in [`crate::checkout`].

pub mod address;
pub mod cart;
pub mod category;
pub mod kitchen;
pub mod menu;
pub mod order;

//! # Service Commands
//!
//! Everything a client can ask the ordering backend to do.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs      ◄─── You are here (exports)
//! ├── cart.rs     ◄─── Cart manipulation (customer)
//! ├── order.rs    ◄─── Placement, history, status, payment
//! ├── address.rs  ◄─── Delivery addresses (customer)
//! └── catalog.rs  ◄─── Kitchen, categories and menu items (chef, admin),
//!                     public menu (anyone)
//! ```
//!
//! ## How Commands Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Command Flow                                         │
//! │                                                                         │
//! │  Transport (HTTP, RPC, ...) resolves the session into a Caller          │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  async fn place_order(                                                  │
//! │      state: &AppState,        ◄── shared pool + ordering settings      │
//! │      caller: &Caller,         ◄── user id + role                       │
//! │      request: PlaceOrderRequest,                                        │
//! │  ) -> Result<OrderResponse, ApiError>                                   │
//! │         │                                                               │
//! │         │ 1. caller.require(Capability::PlaceOrder)                    │
//! │         │ 2. parse / validate the request                              │
//! │         │ 3. one tiffin-db call                                        │
//! │         ▼                                                               │
//! │  camelCase DTO, or ApiError { code, message, retryable }               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod address;
pub mod cart;
pub mod catalog;
pub mod order;

pub use address::*;
pub use cart::*;
pub use catalog::*;
pub use order::*;

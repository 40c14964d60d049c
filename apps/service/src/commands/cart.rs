//! # Cart Commands
//!
//! Customer cart manipulation. Every command returns the whole cart so the
//! client can redraw it in one go.
//!
//! ## Cart Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ┌──────────┐     ┌──────────┐     ┌──────────┐                        │
//! │  │  Empty   │────►│ In Cart  │────►│  Order   │                        │
//! │  │  Cart    │     │          │     │  Placed  │                        │
//! │  └──────────┘     └──────────┘     └────┬─────┘                        │
//! │       ▲          add_to_cart            │                              │
//! │       │          update_cart_item       │ place_order (order.rs)       │
//! │       │          remove_cart_item       │ empties the cart             │
//! │       └─────────────────────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use tiffin_core::{CartLineView, CartView};
use tracing::debug;

use crate::auth::{Caller, Capability};
use crate::error::ApiError;
use crate::state::AppState;

/// One cart line with its current catalog state.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineDto {
    pub id: String,
    pub menu_item_id: String,
    /// `None` once the menu item has been deleted
    pub name: Option<String>,
    pub quantity: i64,
    /// Price captured when the item was added
    pub unit_price_paise: i64,
    pub line_total_paise: i64,
    /// Today's catalog price, for "price changed" hints
    pub current_price_paise: Option<i64>,
    pub is_available: bool,
}

impl TryFrom<CartLineView> for CartLineDto {
    type Error = ApiError;

    fn try_from(view: CartLineView) -> Result<Self, Self::Error> {
        let line_total_paise = view.line.line_total()?.paise();
        Ok(CartLineDto {
            id: view.line.id,
            menu_item_id: view.line.menu_item_id,
            is_available: view.is_available.unwrap_or(false),
            name: view.menu_item_name,
            quantity: view.line.quantity,
            unit_price_paise: view.line.unit_price_paise,
            line_total_paise,
            current_price_paise: view.current_price_paise,
        })
    }
}

/// Cart response including lines and totals.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartResponse {
    pub cart_id: String,
    pub lines: Vec<CartLineDto>,
    pub subtotal_paise: i64,
    pub total_quantity: i64,
}

impl TryFrom<CartView> for CartResponse {
    type Error = ApiError;

    fn try_from(view: CartView) -> Result<Self, Self::Error> {
        let subtotal_paise = view.subtotal()?.paise();
        let total_quantity = view.total_quantity();
        Ok(CartResponse {
            cart_id: view.cart.id,
            lines: view
                .lines
                .into_iter()
                .map(CartLineDto::try_from)
                .collect::<Result<_, _>>()?,
            subtotal_paise,
            total_quantity,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub menu_item_id: String,
    /// Defaults to 1
    pub quantity: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCartItemRequest {
    pub line_id: String,
    pub quantity: i64,
}

/// Gets the caller's cart, creating an empty one on first use.
pub async fn get_cart(state: &AppState, caller: &Caller) -> Result<CartResponse, ApiError> {
    let customer_id = caller.require(Capability::ManageCart)?;
    debug!(customer_id = %customer_id, "get_cart command");

    let view = state.db().carts().get_or_create_cart(customer_id).await?;
    CartResponse::try_from(view)
}

/// Adds a menu item to the cart.
///
/// ## Behavior
/// - If the item is already in the cart: quantities are summed (max 10)
/// - If not: added as a new line at today's price
/// - The captured price does not follow later catalog edits
pub async fn add_to_cart(
    state: &AppState,
    caller: &Caller,
    request: AddToCartRequest,
) -> Result<CartResponse, ApiError> {
    let customer_id = caller.require(Capability::ManageCart)?;
    let quantity = request.quantity.unwrap_or(1);
    debug!(customer_id = %customer_id, menu_item_id = %request.menu_item_id, quantity, "add_to_cart command");

    let carts = state.db().carts();
    carts
        .add_line(customer_id, &request.menu_item_id, quantity)
        .await?;

    CartResponse::try_from(carts.get_or_create_cart(customer_id).await?)
}

/// Sets a cart line's quantity (1..=10).
pub async fn update_cart_item(
    state: &AppState,
    caller: &Caller,
    request: UpdateCartItemRequest,
) -> Result<CartResponse, ApiError> {
    let customer_id = caller.require(Capability::ManageCart)?;
    debug!(customer_id = %customer_id, line_id = %request.line_id, quantity = request.quantity, "update_cart_item command");

    let carts = state.db().carts();
    carts
        .update_line(customer_id, &request.line_id, request.quantity)
        .await?;

    CartResponse::try_from(carts.get_or_create_cart(customer_id).await?)
}

/// Removes a line from the caller's cart.
pub async fn remove_cart_item(
    state: &AppState,
    caller: &Caller,
    line_id: &str,
) -> Result<CartResponse, ApiError> {
    let customer_id = caller.require(Capability::ManageCart)?;
    debug!(customer_id = %customer_id, line_id = %line_id, "remove_cart_item command");

    let carts = state.db().carts();
    carts.remove_line(customer_id, line_id).await?;

    CartResponse::try_from(carts.get_or_create_cart(customer_id).await?)
}

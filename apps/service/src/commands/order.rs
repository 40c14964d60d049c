//! # Order Commands
//!
//! Turning a cart into an order, order history, and the admin side of
//! fulfillment and payment.
//!
//! ## Order Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Customer                              Admin                            │
//! │  ────────                              ─────                            │
//! │  place_order ──► PLACED ──► update_order_status ──► ACCEPTED ──► ...   │
//! │       │                                              ──► DELIVERED      │
//! │       │                                                                 │
//! │       └─ payment: COD → PENDING ─┐                                      │
//! │                   UPI → INITIATED ┴──► mark_order_paid ──► PAID         │
//! │                                                                         │
//! │  my_orders (own, newest first)         list_orders (all, newest first)  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tiffin_core::{
    DeliveryAddress, OrderDetail, OrderLine, OrderStatus, Payment, PaymentMode, PaymentStatus,
};
use tracing::{debug, info};

use crate::auth::{Caller, Capability};
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineDto {
    pub menu_item_id: String,
    /// Item name as it was when the order was placed
    pub name: String,
    pub quantity: i64,
    pub price_paise: i64,
    pub line_total_paise: i64,
}

impl TryFrom<OrderLine> for OrderLineDto {
    type Error = ApiError;

    fn try_from(line: OrderLine) -> Result<Self, Self::Error> {
        let line_total_paise = line.line_total()?.paise();
        Ok(OrderLineDto {
            menu_item_id: line.menu_item_id,
            name: line.name_snapshot,
            quantity: line.quantity,
            price_paise: line.price_paise,
            line_total_paise,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDto {
    pub order_id: String,
    pub mode: PaymentMode,
    pub status: PaymentStatus,
    pub updated_at: DateTime<Utc>,
}

impl From<Payment> for PaymentDto {
    fn from(payment: Payment) -> Self {
        PaymentDto {
            order_id: payment.order_id,
            mode: payment.mode,
            status: payment.status,
            updated_at: payment.updated_at,
        }
    }
}

/// Where the order goes, as it was when the order was placed.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryAddressDto {
    pub receiver_name: String,
    pub contact_number: String,
    pub house_number: String,
    pub sector: String,
    pub landmark: Option<String>,
    pub postcode: String,
    pub map_url: Option<String>,
}

impl From<DeliveryAddress> for DeliveryAddressDto {
    fn from(address: DeliveryAddress) -> Self {
        DeliveryAddressDto {
            receiver_name: address.receiver_name,
            contact_number: address.contact_number,
            house_number: address.house_number,
            sector: address.sector,
            landmark: address.landmark,
            postcode: address.postcode,
            map_url: address.map_url,
        }
    }
}

/// An order with its lines, payment and delivery address.
///
/// Customer accounts live outside this service, so `customerId` is the
/// only customer field; the delivery receiver name and contact number are
/// what the kitchen calls.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub id: String,
    pub customer_id: String,
    pub kitchen_id: String,
    pub address_id: String,
    pub status: OrderStatus,
    pub payment_mode: PaymentMode,
    pub subtotal_paise: i64,
    pub total_amount_paise: i64,
    pub lines: Vec<OrderLineDto>,
    pub payment: Option<PaymentDto>,
    /// `None` only for orders placed before delivery snapshots existed
    pub delivery: Option<DeliveryAddressDto>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<OrderDetail> for OrderResponse {
    type Error = ApiError;

    fn try_from(detail: OrderDetail) -> Result<Self, Self::Error> {
        let order = detail.order;
        Ok(OrderResponse {
            id: order.id,
            customer_id: order.owner_id,
            kitchen_id: order.kitchen_id,
            address_id: order.address_id,
            status: order.status,
            payment_mode: order.payment_mode,
            subtotal_paise: order.subtotal_paise,
            total_amount_paise: order.total_amount_paise,
            lines: detail
                .lines
                .into_iter()
                .map(OrderLineDto::try_from)
                .collect::<Result<_, _>>()?,
            payment: detail.payment.map(PaymentDto::from),
            delivery: detail.delivery.map(DeliveryAddressDto::from),
            created_at: order.created_at,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderRequest {
    pub address_id: String,
    /// `UPI` or `COD`
    pub payment_mode: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderStatusRequest {
    pub order_id: String,
    /// `ACCEPTED`, `PREPARED`, `OUT_FOR_DELIVERY` or `DELIVERED`
    pub status: String,
}

/// Places an order from the caller's cart.
///
/// ## What Happens
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  invoke place_order { addressId, paymentMode: "COD" }                  │
/// │                    │                                                    │
/// │                    ▼                                                    │
/// │  ┌────────────────────────────────────────────────────────────────┐    │
/// │  │  One transaction (tiffin-db checkout):                         │    │
/// │  │  1. Address belongs to caller      else INVALID_ADDRESS        │    │
/// │  │  2. Cart has lines                 else EMPTY_CART             │    │
/// │  │  3. Serving kitchen open           else KITCHEN_UNAVAILABLE    │    │
/// │  │  4. Every item still on the menu   else ITEM_NOT_FOUND         │    │
/// │  │  5. Order + lines + payment inserted, cart emptied             │    │
/// │  └────────────────────────────────────────────────────────────────┘    │
/// │                    │                                                    │
/// │                    ▼                                                    │
/// │  OrderResponse (status PLACED)                                         │
/// │  or CONCURRENCY_CONFLICT / STORE_FAILURE with retryable = true         │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub async fn place_order(
    state: &AppState,
    caller: &Caller,
    request: PlaceOrderRequest,
) -> Result<OrderResponse, ApiError> {
    let customer_id = caller.require(Capability::PlaceOrder)?;
    let payment_mode: PaymentMode = request.payment_mode.parse()?;
    debug!(customer_id = %customer_id, address_id = %request.address_id, payment_mode = %payment_mode, "place_order command");

    let detail = state
        .placement()
        .place_order(customer_id, &request.address_id, payment_mode)
        .await?;

    OrderResponse::try_from(detail)
}

/// The caller's orders, newest first.
pub async fn my_orders(state: &AppState, caller: &Caller) -> Result<Vec<OrderResponse>, ApiError> {
    let customer_id = caller.require(Capability::ViewOwnOrders)?;
    debug!(customer_id = %customer_id, "my_orders command");

    let orders = state.db().orders().list_for_owner(customer_id).await?;
    orders.into_iter().map(OrderResponse::try_from).collect()
}

/// Every order, newest first.
pub async fn list_orders(state: &AppState, caller: &Caller) -> Result<Vec<OrderResponse>, ApiError> {
    caller.require(Capability::ViewAllOrders)?;
    debug!("list_orders command");

    let orders = state.db().orders().list_all().await?;
    orders.into_iter().map(OrderResponse::try_from).collect()
}

/// Moves an order to a new fulfillment status under the configured policy.
pub async fn update_order_status(
    state: &AppState,
    caller: &Caller,
    request: UpdateOrderStatusRequest,
) -> Result<OrderResponse, ApiError> {
    let admin_id = caller.require(Capability::UpdateOrderStatus)?;
    let status: OrderStatus = request.status.parse()?;
    debug!(admin_id = %admin_id, order_id = %request.order_id, status = %status, "update_order_status command");

    let orders = state.db().orders();
    orders
        .update_status(&request.order_id, status, state.status_policy())
        .await?;

    let detail = orders
        .get(&request.order_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Order", &request.order_id))?;

    OrderResponse::try_from(detail)
}

/// Records that an order has been paid.
pub async fn mark_order_paid(
    state: &AppState,
    caller: &Caller,
    order_id: &str,
) -> Result<PaymentDto, ApiError> {
    let admin_id = caller.require(Capability::MarkPaid)?;
    debug!(admin_id = %admin_id, order_id = %order_id, "mark_order_paid command");

    let payment = state.db().orders().mark_paid(order_id).await?;
    info!(admin_id = %admin_id, order_id = %order_id, "Order marked paid");

    Ok(PaymentDto::from(payment))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::address::{update_address, UpdateAddressRequest};
    use crate::commands::cart::{add_to_cart, get_cart, AddToCartRequest};
    use crate::commands::test_support::{customer, fixture, Fixture, CUSTOMER};
    use crate::config::ServiceConfig;
    use crate::error::ErrorCode;

    async fn fill_cart(fx: &Fixture) {
        for (item, quantity) in [(&fx.item_a, 2), (&fx.item_b, 1)] {
            add_to_cart(
                &fx.state,
                &customer(),
                AddToCartRequest {
                    menu_item_id: item.id.clone(),
                    quantity: Some(quantity),
                },
            )
            .await
            .unwrap();
        }
    }

    fn place(fx: &Fixture, mode: &str) -> PlaceOrderRequest {
        PlaceOrderRequest {
            address_id: fx.address_id.clone(),
            payment_mode: mode.to_string(),
        }
    }

    fn set_status(order_id: &str, status: &str) -> UpdateOrderStatusRequest {
        UpdateOrderStatusRequest {
            order_id: order_id.to_string(),
            status: status.to_string(),
        }
    }

    #[tokio::test]
    async fn test_place_cod_order() {
        let fx = fixture().await;
        fill_cart(&fx).await;

        let order = place_order(&fx.state, &customer(), place(&fx, "cod")).await.unwrap();

        assert_eq!(order.status, OrderStatus::Placed);
        assert_eq!(order.subtotal_paise, 250);
        assert_eq!(order.total_amount_paise, 250);
        assert_eq!(order.lines.len(), 2);
        assert_eq!(order.kitchen_id, fx.state.kitchen_id());

        let payment = order.payment.unwrap();
        assert_eq!(payment.mode, PaymentMode::Cod);
        assert_eq!(payment.status, PaymentStatus::Pending);

        let cart = get_cart(&fx.state, &customer()).await.unwrap();
        assert!(cart.lines.is_empty());

        let history = my_orders(&fx.state, &customer()).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].id, order.id);
    }

    #[tokio::test]
    async fn test_orders_carry_the_delivery_address() {
        let fx = fixture().await;
        fill_cart(&fx).await;
        let order = place_order(&fx.state, &customer(), place(&fx, "COD")).await.unwrap();

        update_address(
            &fx.state,
            &customer(),
            UpdateAddressRequest {
                address_id: fx.address_id.clone(),
                house_number: Some("99".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let history = my_orders(&fx.state, &customer()).await.unwrap();
        assert_eq!(history[0].id, order.id);
        let delivery = history[0].delivery.as_ref().expect("delivery address");
        assert_eq!(delivery.receiver_name, "Meera");
        assert_eq!(delivery.contact_number, "9811111111");
        assert_eq!(delivery.house_number, "7");
        assert_eq!(delivery.sector, "Sector 21");
        assert_eq!(delivery.postcode, "122001");

        let all = list_orders(&fx.state, &Caller::admin("admin-1")).await.unwrap();
        assert_eq!(all[0].customer_id, CUSTOMER);
        assert_eq!(all[0].delivery.as_ref().unwrap().receiver_name, "Meera");

        let json = serde_json::to_value(&history[0]).unwrap();
        assert_eq!(json["delivery"]["houseNumber"], "7");
    }

    #[tokio::test]
    async fn test_place_order_errors() {
        let fx = fixture().await;

        let err = place_order(&fx.state, &customer(), place(&fx, "UPI")).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::EmptyCart);
        assert!(!err.retryable);

        let err = place_order(&fx.state, &customer(), place(&fx, "CARD")).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        fill_cart(&fx).await;
        let request = PlaceOrderRequest {
            address_id: "someone-elses".to_string(),
            payment_mode: "UPI".to_string(),
        };
        let err = place_order(&fx.state, &customer(), request).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidAddress);

        let err = place_order(&fx.state, &Caller::admin("admin-1"), place(&fx, "UPI"))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);
    }

    #[tokio::test]
    async fn test_status_and_payment_by_admin() {
        let fx = fixture().await;
        fill_cart(&fx).await;
        let order = place_order(&fx.state, &customer(), place(&fx, "UPI")).await.unwrap();
        assert_eq!(order.payment.as_ref().unwrap().status, PaymentStatus::Initiated);

        let admin = Caller::admin("admin-1");

        // Unrestricted policy by default: skipping ahead is allowed.
        let updated = update_order_status(&fx.state, &admin, set_status(&order.id, "DELIVERED"))
            .await
            .unwrap();
        assert_eq!(updated.status, OrderStatus::Delivered);

        let err = update_order_status(&fx.state, &admin, set_status(&order.id, "PLACED"))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = update_order_status(&fx.state, &admin, set_status("missing", "ACCEPTED"))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);

        let payment = mark_order_paid(&fx.state, &admin, &order.id).await.unwrap();
        assert_eq!(payment.status, PaymentStatus::Paid);

        let err = mark_order_paid(&fx.state, &admin, &order.id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::BusinessLogic);

        let all = list_orders(&fx.state, &admin).await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn test_linear_policy_from_config() {
        let fx = fixture().await;
        fill_cart(&fx).await;
        let order = place_order(&fx.state, &customer(), place(&fx, "COD")).await.unwrap();

        let mut config = ServiceConfig::default();
        config.ordering.kitchen_id = Some(fx.state.kitchen_id().to_string());
        config.ordering.strict_status = true;
        let strict = AppState::new(fx.state.db().clone(), &config).unwrap();
        let admin = Caller::admin("admin-1");

        let err = update_order_status(&strict, &admin, set_status(&order.id, "PREPARED"))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidTransition);

        let accepted = update_order_status(&strict, &admin, set_status(&order.id, "ACCEPTED"))
            .await
            .unwrap();
        assert_eq!(accepted.status, OrderStatus::Accepted);
    }

    #[tokio::test]
    async fn test_customers_cannot_run_fulfillment() {
        let fx = fixture().await;

        let err = list_orders(&fx.state, &customer()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);

        let err = mark_order_paid(&fx.state, &customer(), "o-1").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);

        let err = update_order_status(&fx.state, &Caller::chef("chef-1"), set_status("o-1", "ACCEPTED"))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);
    }
}

//! # Order Placement
//!
//! Converts a customer's cart into an order, its payment record and an
//! emptied cart, all in one SQLite transaction.
//!
//! ## Transaction Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  place_order(customer, address, mode)        [tokio::time::timeout]     │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │   1. UPDATE carts SET version = version + 1   ← write lock taken here   │
//! │   2. address owned by customer?          ── no ──► InvalidAddress       │
//! │   3. cart has ≥ 1 line?                  ── no ──► EmptyCart            │
//! │   4. serving kitchen approved & active?  ── no ──► KitchenUnavailable   │
//! │   5. every line's menu item still there? ── no ──► ItemNotFound         │
//! │   6. totals = Σ captured price × qty     ── overflow ──► TotalOverflow  │
//! │   7. INSERT orders, order_items (price + name snapshot),                │
//! │      order_addresses (copy of the delivery address)                     │
//! │   8. INSERT payments (COD → PENDING, UPI → INITIATED)                   │
//! │   9. DELETE cart_items           rows ≠ lines read ──► Conflict         │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  Any early return drops the transaction: nothing from 1-9 persists.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Concurrency
//! SQLite has no row locks. Step 1 is a write, so a second placement for the
//! same cart queues on the database write lock (up to `busy_timeout`) and,
//! once the first commits, reads an empty cart and fails with `EmptyCart`.
//! Reading before writing would instead risk `SQLITE_BUSY_SNAPSHOT` when the
//! transaction tried to upgrade.

use std::time::Duration;

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::pool::duration_millis;
use crate::repository::cart::{bump_version, fetch_lines};
use crate::repository::order::load_detail;
use tiffin_core::{
    Cart, CartLine, CoreError, Kitchen, Order, OrderDetail, OrderStatus, OrderTotals, PaymentMode,
};

// =============================================================================
// Configuration
// =============================================================================

/// Settings for order placement.
#[derive(Debug, Clone)]
pub struct PlacementConfig {
    /// The kitchen every order is routed to.
    pub kitchen_id: String,

    /// Whether the kitchen must be approved and active to take orders.
    /// Default: true
    pub require_approved_kitchen: bool,

    /// Upper bound on one placement, lock waits included.
    /// Default: 10 seconds
    pub timeout: Duration,
}

impl PlacementConfig {
    /// Creates a configuration routing orders to `kitchen_id`.
    pub fn new(kitchen_id: impl Into<String>) -> Self {
        PlacementConfig {
            kitchen_id: kitchen_id.into(),
            require_approved_kitchen: true,
            timeout: Duration::from_secs(10),
        }
    }

    /// Sets whether the kitchen must be approved and active.
    pub fn require_approved_kitchen(mut self, required: bool) -> Self {
        self.require_approved_kitchen = required;
        self
    }

    /// Sets the placement deadline.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

// =============================================================================
// Order Placement
// =============================================================================

/// Places orders from carts.
#[derive(Debug, Clone)]
pub struct OrderPlacement {
    pool: SqlitePool,
    config: PlacementConfig,
}

impl OrderPlacement {
    /// Creates a new OrderPlacement.
    pub fn new(pool: SqlitePool, config: PlacementConfig) -> Self {
        OrderPlacement { pool, config }
    }

    /// Places an order from the customer's cart.
    ///
    /// ## Errors
    /// - [`CoreError::InvalidAddress`], [`CoreError::EmptyCart`],
    ///   [`CoreError::KitchenUnavailable`], [`CoreError::ItemNotFound`],
    ///   [`CoreError::TotalOverflow`] (as `DbError::Domain`), checked in
    ///   that order
    /// - [`DbError::Conflict`] if a concurrent writer changed the cart
    /// - [`DbError::Timeout`] if the deadline passed; nothing was written
    /// - any other `DbError` on store failure; nothing was written
    pub async fn place_order(
        &self,
        customer_id: &str,
        address_id: &str,
        payment_mode: PaymentMode,
    ) -> DbResult<OrderDetail> {
        let outcome = tokio::time::timeout(
            self.config.timeout,
            self.place_in_transaction(customer_id, address_id, payment_mode),
        )
        .await;

        match outcome {
            Ok(Ok(detail)) => {
                info!(
                    order_id = %detail.order.id,
                    customer_id = %customer_id,
                    lines = detail.lines.len(),
                    total = %detail.order.total_amount(),
                    payment_mode = %payment_mode,
                    "Order placed"
                );
                Ok(detail)
            }
            Ok(Err(err)) => {
                warn!(customer_id = %customer_id, error = %err, "Order placement rejected");
                Err(err)
            }
            Err(_) => {
                warn!(
                    customer_id = %customer_id,
                    timeout_ms = duration_millis(self.config.timeout),
                    "Order placement timed out"
                );
                Err(DbError::Timeout)
            }
        }
    }

    async fn place_in_transaction(
        &self,
        customer_id: &str,
        address_id: &str,
        payment_mode: PaymentMode,
    ) -> DbResult<OrderDetail> {
        let mut tx = self.pool.begin().await?;

        // 1. Lock
        let carts_touched = bump_version(&mut tx, customer_id).await?;

        // 2. Address
        let address_owned: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM addresses WHERE id = ?1 AND owner_id = ?2)",
        )
        .bind(address_id)
        .bind(customer_id)
        .fetch_one(&mut *tx)
        .await?;

        if !address_owned {
            return Err(CoreError::InvalidAddress(address_id.to_string()).into());
        }

        // 3. Cart
        if carts_touched == 0 {
            return Err(CoreError::EmptyCart.into());
        }

        let cart = sqlx::query_as::<_, Cart>(
            r#"
            SELECT id, owner_id, version, created_at, updated_at
            FROM carts
            WHERE owner_id = ?1
            "#,
        )
        .bind(customer_id)
        .fetch_one(&mut *tx)
        .await?;

        let lines = fetch_lines(&mut tx, &cart.id).await?;
        if lines.is_empty() {
            return Err(CoreError::EmptyCart.into());
        }

        // 4. Kitchen
        let kitchen = sqlx::query_as::<_, Kitchen>(
            r#"
            SELECT id, name, description, is_approved, is_active, created_at
            FROM kitchens
            WHERE id = ?1
            "#,
        )
        .bind(&self.config.kitchen_id)
        .fetch_optional(&mut *tx)
        .await?;

        let kitchen = match kitchen {
            Some(k) if !self.config.require_approved_kitchen || k.accepts_orders() => k,
            _ => return Err(CoreError::KitchenUnavailable(self.config.kitchen_id.clone()).into()),
        };

        // 5. Items still in the catalog
        if let Some(missing) = lines.iter().find(|l| l.menu_item_name.is_none()) {
            return Err(CoreError::ItemNotFound(missing.line.menu_item_id.clone()).into());
        }

        // 6. Totals from captured prices
        let cart_lines: Vec<CartLine> = lines.iter().map(|l| l.line.clone()).collect();
        let totals = OrderTotals::from_lines(&cart_lines)?;

        // 7. Order + lines
        let now = Utc::now();
        let order = Order {
            id: Uuid::new_v4().to_string(),
            owner_id: customer_id.to_string(),
            kitchen_id: kitchen.id.clone(),
            address_id: address_id.to_string(),
            status: OrderStatus::Placed,
            subtotal_paise: totals.subtotal.paise(),
            total_amount_paise: totals.total_amount.paise(),
            payment_mode,
            created_at: now,
            updated_at: now,
        };

        debug!(order_id = %order.id, cart_id = %cart.id, cart_version = cart.version, "Inserting order");

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, owner_id, kitchen_id, address_id, status,
                subtotal_paise, total_amount_paise, payment_mode,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&order.id)
        .bind(&order.owner_id)
        .bind(&order.kitchen_id)
        .bind(&order.address_id)
        .bind(order.status)
        .bind(order.subtotal_paise)
        .bind(order.total_amount_paise)
        .bind(order.payment_mode)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO order_addresses (
                order_id, receiver_name, contact_number, house_number,
                sector, landmark, postcode, map_url
            )
            SELECT ?1, receiver_name, contact_number, house_number,
                   sector, landmark, postcode, map_url
            FROM addresses
            WHERE id = ?2
            "#,
        )
        .bind(&order.id)
        .bind(address_id)
        .execute(&mut *tx)
        .await?;

        for view in &lines {
            let name = view.menu_item_name.as_deref().unwrap_or_default();

            sqlx::query(
                r#"
                INSERT INTO order_items (
                    id, order_id, menu_item_id, name_snapshot, quantity, price_paise
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&order.id)
            .bind(&view.line.menu_item_id)
            .bind(name)
            .bind(view.line.quantity)
            .bind(view.line.unit_price_paise)
            .execute(&mut *tx)
            .await?;
        }

        // 8. Payment
        sqlx::query(
            r#"
            INSERT INTO payments (id, order_id, mode, status, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?5)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&order.id)
        .bind(payment_mode)
        .bind(payment_mode.initial_status())
        .bind(now)
        .execute(&mut *tx)
        .await?;

        // 9. Clear cart
        let cleared = sqlx::query("DELETE FROM cart_items WHERE cart_id = ?1")
            .bind(&cart.id)
            .execute(&mut *tx)
            .await?;

        if cleared.rows_affected() != lines.len() as u64 {
            return Err(DbError::Conflict(format!(
                "cart {} changed during placement: read {} lines, cleared {}",
                cart.id,
                lines.len(),
                cleared.rows_affected()
            )));
        }

        let detail = load_detail(&mut tx, order).await?;

        tx.commit().await.map_err(|e| match DbError::from(e) {
            DbError::Conflict(msg) => DbError::Conflict(msg),
            other => DbError::TransactionFailed(other.to_string()),
        })?;

        Ok(detail)
    }
}

//! # Order Repository
//!
//! Reads of placed orders, fulfillment status updates and payment
//! settlement. Orders are created only by [`crate::checkout`].
//!
//! ## What Can Change After Placement
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  orders.status      PLACED → ACCEPTED → PREPARED → OUT_FOR_DELIVERY →   │
//! │                     DELIVERED   (rules: StatusPolicy)                   │
//! │  payments.status    INITIATED | PENDING → PAID   (once)                 │
//! │                                                                         │
//! │  Everything else (totals, lines, prices, delivery address) is frozen.  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::DbResult;
use tiffin_core::{
    CoreError, DeliveryAddress, Order, OrderDetail, OrderLine, OrderStatus, Payment, PaymentStatus,
    StatusPolicy,
};

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Gets an order with its lines, payment and delivery address.
    pub async fn get(&self, order_id: &str) -> DbResult<Option<OrderDetail>> {
        let mut conn = self.pool.acquire().await?;

        let order = sqlx::query_as::<_, Order>(
            r#"
            SELECT id, owner_id, kitchen_id, address_id, status,
                   subtotal_paise, total_amount_paise, payment_mode,
                   created_at, updated_at
            FROM orders
            WHERE id = ?1
            "#,
        )
        .bind(order_id)
        .fetch_optional(&mut *conn)
        .await?;

        match order {
            Some(order) => Ok(Some(load_detail(&mut conn, order).await?)),
            None => Ok(None),
        }
    }

    /// Lists a customer's orders, newest first.
    pub async fn list_for_owner(&self, owner_id: &str) -> DbResult<Vec<OrderDetail>> {
        let mut conn = self.pool.acquire().await?;

        let orders = sqlx::query_as::<_, Order>(
            r#"
            SELECT id, owner_id, kitchen_id, address_id, status,
                   subtotal_paise, total_amount_paise, payment_mode,
                   created_at, updated_at
            FROM orders
            WHERE owner_id = ?1
            ORDER BY created_at DESC, rowid DESC
            "#,
        )
        .bind(owner_id)
        .fetch_all(&mut *conn)
        .await?;

        let mut details = Vec::with_capacity(orders.len());
        for order in orders {
            details.push(load_detail(&mut conn, order).await?);
        }

        Ok(details)
    }

    /// Lists every order, newest first.
    pub async fn list_all(&self) -> DbResult<Vec<OrderDetail>> {
        let mut conn = self.pool.acquire().await?;

        let orders = sqlx::query_as::<_, Order>(
            r#"
            SELECT id, owner_id, kitchen_id, address_id, status,
                   subtotal_paise, total_amount_paise, payment_mode,
                   created_at, updated_at
            FROM orders
            ORDER BY created_at DESC, rowid DESC
            "#,
        )
        .fetch_all(&mut *conn)
        .await?;

        let mut details = Vec::with_capacity(orders.len());
        for order in orders {
            details.push(load_detail(&mut conn, order).await?);
        }

        Ok(details)
    }

    /// Counts all orders. Used by diagnostics and tests.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Moves an order to `status` under `policy`.
    ///
    /// ## Errors
    /// - [`CoreError::OrderNotFound`]
    /// - `Validation` if `status` is PLACED
    /// - [`CoreError::InvalidTransition`] when `policy` forbids the move
    pub async fn update_status(
        &self,
        order_id: &str,
        status: OrderStatus,
        policy: StatusPolicy,
    ) -> DbResult<Order> {
        let mut tx = self.pool.begin().await?;

        // Writing first takes the lock before the current status is read.
        let now = Utc::now();
        let touched = sqlx::query("UPDATE orders SET updated_at = ?2 WHERE id = ?1")
            .bind(order_id)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        if touched.rows_affected() == 0 {
            return Err(CoreError::OrderNotFound(order_id.to_string()).into());
        }

        let current: OrderStatus = sqlx::query_scalar("SELECT status FROM orders WHERE id = ?1")
            .bind(order_id)
            .fetch_one(&mut *tx)
            .await?;

        policy.check(current, status)?;

        debug!(order_id = %order_id, from = %current, to = %status, "Updating order status");

        sqlx::query("UPDATE orders SET status = ?2 WHERE id = ?1")
            .bind(order_id)
            .bind(status)
            .execute(&mut *tx)
            .await?;

        let order = sqlx::query_as::<_, Order>(
            r#"
            SELECT id, owner_id, kitchen_id, address_id, status,
                   subtotal_paise, total_amount_paise, payment_mode,
                   created_at, updated_at
            FROM orders
            WHERE id = ?1
            "#,
        )
        .bind(order_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(order_id = %order_id, status = %status, "Order status updated");
        Ok(order)
    }

    /// Marks an order's payment as settled.
    ///
    /// ## Errors
    /// - [`CoreError::PaymentNotFound`] if the order has no payment
    /// - [`CoreError::AlreadyPaid`] if it is already PAID
    pub async fn mark_paid(&self, order_id: &str) -> DbResult<Payment> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE payments SET status = ?2, updated_at = ?3
            WHERE order_id = ?1 AND status != ?2
            "#,
        )
        .bind(order_id)
        .bind(PaymentStatus::Paid)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        let payment = fetch_payment(&mut tx, order_id).await?;
        tx.commit().await?;

        match payment {
            None => Err(CoreError::PaymentNotFound(order_id.to_string()).into()),
            Some(_) if result.rows_affected() == 0 => {
                Err(CoreError::AlreadyPaid(order_id.to_string()).into())
            }
            Some(payment) => {
                info!(order_id = %order_id, mode = %payment.mode, "Payment marked as paid");
                Ok(payment)
            }
        }
    }
}

// =============================================================================
// Shared helpers (also used by order placement)
// =============================================================================

/// Loads the lines, payment and delivery address of `order`.
pub(crate) async fn load_detail(conn: &mut SqliteConnection, order: Order) -> DbResult<OrderDetail> {
    let lines = sqlx::query_as::<_, OrderLine>(
        r#"
        SELECT id, order_id, menu_item_id, name_snapshot, quantity, price_paise
        FROM order_items
        WHERE order_id = ?1
        ORDER BY rowid
        "#,
    )
    .bind(&order.id)
    .fetch_all(&mut *conn)
    .await?;

    let payment = fetch_payment(conn, &order.id).await?;

    let delivery = sqlx::query_as::<_, DeliveryAddress>(
        r#"
        SELECT receiver_name, contact_number, house_number, sector,
               landmark, postcode, map_url
        FROM order_addresses
        WHERE order_id = ?1
        "#,
    )
    .bind(&order.id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(OrderDetail {
        order,
        lines,
        payment,
        delivery,
    })
}

async fn fetch_payment(conn: &mut SqliteConnection, order_id: &str) -> DbResult<Option<Payment>> {
    let payment = sqlx::query_as::<_, Payment>(
        r#"
        SELECT id, order_id, mode, status, created_at, updated_at
        FROM payments
        WHERE order_id = ?1
        "#,
    )
    .bind(order_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(payment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::pool::{Database, DbConfig};
    use tiffin_core::PaymentMode;
    use uuid::Uuid;

    async fn kitchen_id(db: &Database) -> String {
        db.kitchens().create("Rasoi", None).await.unwrap().id
    }

    /// Inserts an order, its payment and delivery address directly,
    /// bypassing placement.
    async fn insert_order(db: &Database, kitchen_id: &str, owner_id: &str, mode: PaymentMode) -> String {
        let order_id = Uuid::new_v4().to_string();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO orders (id, owner_id, kitchen_id, address_id, status,
                                subtotal_paise, total_amount_paise, payment_mode,
                                created_at, updated_at)
            VALUES (?1, ?2, ?3, 'addr-1', 'PLACED', 500, 500, ?4, ?5, ?5)
            "#,
        )
        .bind(&order_id)
        .bind(owner_id)
        .bind(kitchen_id)
        .bind(mode)
        .bind(now)
        .execute(db.pool())
        .await
        .unwrap();

        sqlx::query(
            r#"
            INSERT INTO payments (id, order_id, mode, status, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?5)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&order_id)
        .bind(mode)
        .bind(mode.initial_status())
        .bind(now)
        .execute(db.pool())
        .await
        .unwrap();

        sqlx::query(
            r#"
            INSERT INTO order_addresses (order_id, receiver_name, contact_number,
                                         house_number, sector, postcode)
            VALUES (?1, ?2, '9876543210', 'C-7', 'Sector 18', '201301')
            "#,
        )
        .bind(&order_id)
        .bind(format!("Receiver of {}", owner_id))
        .execute(db.pool())
        .await
        .unwrap();

        order_id
    }

    #[tokio::test]
    async fn test_update_status_policies() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let orders = db.orders();
        let kitchen_id = kitchen_id(&db).await;
        let order_id = insert_order(&db, &kitchen_id, "cust-1", PaymentMode::Cod).await;

        let order = orders
            .update_status(&order_id, OrderStatus::Prepared, StatusPolicy::Unrestricted)
            .await
            .unwrap();
        assert_eq!(order.status, OrderStatus::Prepared);

        assert!(matches!(
            orders
                .update_status(&order_id, OrderStatus::Accepted, StatusPolicy::Linear)
                .await,
            Err(DbError::Domain(CoreError::InvalidTransition { .. }))
        ));
        assert!(matches!(
            orders
                .update_status(&order_id, OrderStatus::Placed, StatusPolicy::Unrestricted)
                .await,
            Err(DbError::Domain(CoreError::Validation(_)))
        ));
        assert!(matches!(
            orders
                .update_status("missing", OrderStatus::Accepted, StatusPolicy::Unrestricted)
                .await,
            Err(DbError::Domain(CoreError::OrderNotFound(_)))
        ));

        let order = orders
            .update_status(&order_id, OrderStatus::OutForDelivery, StatusPolicy::Linear)
            .await
            .unwrap();
        assert_eq!(order.status, OrderStatus::OutForDelivery);
    }

    #[tokio::test]
    async fn test_mark_paid_once() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let orders = db.orders();
        let kitchen_id = kitchen_id(&db).await;
        let order_id = insert_order(&db, &kitchen_id, "cust-1", PaymentMode::Upi).await;

        let payment = orders.mark_paid(&order_id).await.unwrap();
        assert_eq!(payment.status, PaymentStatus::Paid);

        assert!(matches!(
            orders.mark_paid(&order_id).await,
            Err(DbError::Domain(CoreError::AlreadyPaid(_)))
        ));
        assert!(matches!(
            orders.mark_paid("missing").await,
            Err(DbError::Domain(CoreError::PaymentNotFound(_)))
        ));

        // Settlement does not touch fulfillment status.
        let detail = orders.get(&order_id).await.unwrap().unwrap();
        assert_eq!(detail.order.status, OrderStatus::Placed);
    }

    #[tokio::test]
    async fn test_lists_are_scoped_and_newest_first() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let orders = db.orders();

        let kitchen_id = kitchen_id(&db).await;
        let first = insert_order(&db, &kitchen_id, "cust-1", PaymentMode::Cod).await;
        let second = insert_order(&db, &kitchen_id, "cust-1", PaymentMode::Upi).await;
        insert_order(&db, &kitchen_id, "cust-2", PaymentMode::Cod).await;

        let mine = orders.list_for_owner("cust-1").await.unwrap();
        assert_eq!(mine.len(), 2);
        assert_eq!(mine[0].order.id, second);
        assert_eq!(mine[1].order.id, first);
        assert!(mine.iter().all(|d| d.payment.is_some()));

        let delivery = mine[0].delivery.as_ref().unwrap();
        assert_eq!(delivery.receiver_name, "Receiver of cust-1");
        assert_eq!(delivery.house_number, "C-7");
        assert_eq!(delivery.landmark, None);

        let all = orders.list_all().await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].delivery.as_ref().unwrap().receiver_name, "Receiver of cust-2");
        assert_eq!(orders.count().await.unwrap(), 3);
    }
}

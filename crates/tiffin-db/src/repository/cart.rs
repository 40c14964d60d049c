//! # Cart Store
//!
//! One mutable cart per customer, holding (menu item, quantity, unit price)
//! lines.
//!
//! ## Line Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  add_line(item, 2)      item available?  ── no ──► NotAvailable         │
//! │       │                      │ yes                                      │
//! │       │                      ▼                                          │
//! │       │              line for item exists?                              │
//! │       │               │ no              │ yes                           │
//! │       │               ▼                 ▼                               │
//! │       │        INSERT, capture     qty + 2 > 10 ? ── yes ──► Exceeded   │
//! │       │        current price            │ no                            │
//! │       │                                 ▼                               │
//! │       │                         UPDATE quantity (price untouched)       │
//! │       ▼                                                                 │
//! │  carts.version += 1                                                     │
//! │                                                                         │
//! │  place_order → lines copied into the order, cart emptied (row kept)    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every mutation runs in its own transaction and opens with a write, so
//! SQLite hands out the write lock before anything is read.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use tiffin_core::validation::validate_quantity;
use tiffin_core::{Cart, CartLine, CartLineView, CartView, CoreError, MenuItem, MAX_LINE_QUANTITY};

/// Repository for cart database operations.
#[derive(Debug, Clone)]
pub struct CartRepository {
    pool: SqlitePool,
}

impl CartRepository {
    /// Creates a new CartRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CartRepository { pool }
    }

    /// Returns the customer's cart with its lines, creating an empty cart
    /// on first access.
    ///
    /// Lines carry the current catalog name, price and availability next to
    /// the captured price, so a client can show price drift.
    pub async fn get_or_create_cart(&self, owner_id: &str) -> DbResult<CartView> {
        let mut tx = self.pool.begin().await?;

        let cart = ensure_cart(&mut tx, owner_id).await?;
        let lines = fetch_lines(&mut tx, &cart.id).await?;

        tx.commit().await?;

        Ok(CartView { cart, lines })
    }

    /// Returns the customer's cart if one exists. Never creates.
    pub async fn find_by_owner(&self, owner_id: &str) -> DbResult<Option<Cart>> {
        let cart = sqlx::query_as::<_, Cart>(
            r#"
            SELECT id, owner_id, version, created_at, updated_at
            FROM carts
            WHERE owner_id = ?1
            "#,
        )
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(cart)
    }

    /// Adds `quantity` of a menu item to the customer's cart.
    ///
    /// ## Errors
    /// - `Validation` if `quantity` is outside 1..=10
    /// - [`CoreError::NotAvailable`] if the item is missing or switched off
    /// - [`CoreError::QuantityExceeded`] if the summed quantity passes 10
    pub async fn add_line(
        &self,
        owner_id: &str,
        menu_item_id: &str,
        quantity: i64,
    ) -> DbResult<CartLine> {
        validate_quantity(quantity)?;

        let mut tx = self.pool.begin().await?;
        let cart = ensure_cart(&mut tx, owner_id).await?;

        let item = sqlx::query_as::<_, MenuItem>(
            r#"
            SELECT id, kitchen_id, category_id, name, description, price_paise,
                   food_type, tiffin_size, image_url, is_available, created_at, updated_at
            FROM menu_items
            WHERE id = ?1
            "#,
        )
        .bind(menu_item_id)
        .fetch_optional(&mut *tx)
        .await?;

        let item = match item {
            Some(item) if item.is_available => item,
            _ => return Err(CoreError::NotAvailable(menu_item_id.to_string()).into()),
        };

        let existing = sqlx::query_as::<_, CartLine>(
            r#"
            SELECT id, cart_id, menu_item_id, quantity, unit_price_paise, created_at
            FROM cart_items
            WHERE cart_id = ?1 AND menu_item_id = ?2
            "#,
        )
        .bind(&cart.id)
        .bind(menu_item_id)
        .fetch_optional(&mut *tx)
        .await?;

        let line = match existing {
            Some(mut line) => {
                let combined = line.quantity + quantity;
                if combined > MAX_LINE_QUANTITY {
                    return Err(CoreError::QuantityExceeded {
                        requested: combined,
                        max: MAX_LINE_QUANTITY,
                    }
                    .into());
                }

                debug!(line_id = %line.id, quantity = combined, "Incrementing cart line");

                sqlx::query("UPDATE cart_items SET quantity = ?2 WHERE id = ?1")
                    .bind(&line.id)
                    .bind(combined)
                    .execute(&mut *tx)
                    .await?;

                line.quantity = combined;
                line
            }
            None => {
                let line = CartLine {
                    id: Uuid::new_v4().to_string(),
                    cart_id: cart.id.clone(),
                    menu_item_id: item.id.clone(),
                    quantity,
                    unit_price_paise: item.price_paise,
                    created_at: Utc::now(),
                };

                debug!(
                    line_id = %line.id,
                    menu_item_id = %line.menu_item_id,
                    unit_price = %line.unit_price(),
                    "Adding cart line"
                );

                sqlx::query(
                    r#"
                    INSERT INTO cart_items (
                        id, cart_id, menu_item_id, quantity, unit_price_paise, created_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                    "#,
                )
                .bind(&line.id)
                .bind(&line.cart_id)
                .bind(&line.menu_item_id)
                .bind(line.quantity)
                .bind(line.unit_price_paise)
                .bind(line.created_at)
                .execute(&mut *tx)
                .await?;

                line
            }
        };

        bump_version(&mut tx, owner_id).await?;
        tx.commit().await?;

        Ok(line)
    }

    /// Sets the quantity of one of the customer's cart lines.
    ///
    /// ## Errors
    /// - `Validation` if `quantity` is outside 1..=10
    /// - [`CoreError::CartLineNotFound`] if the line is not in the caller's cart
    pub async fn update_line(
        &self,
        owner_id: &str,
        line_id: &str,
        quantity: i64,
    ) -> DbResult<CartLine> {
        validate_quantity(quantity)?;

        debug!(line_id = %line_id, quantity, "Updating cart line");

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE cart_items SET quantity = ?3
            WHERE id = ?1
              AND cart_id IN (SELECT id FROM carts WHERE owner_id = ?2)
            "#,
        )
        .bind(line_id)
        .bind(owner_id)
        .bind(quantity)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::CartLineNotFound(line_id.to_string()).into());
        }

        bump_version(&mut tx, owner_id).await?;

        let line = sqlx::query_as::<_, CartLine>(
            r#"
            SELECT id, cart_id, menu_item_id, quantity, unit_price_paise, created_at
            FROM cart_items
            WHERE id = ?1
            "#,
        )
        .bind(line_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(line)
    }

    /// Removes one of the customer's cart lines.
    ///
    /// ## Errors
    /// - [`CoreError::CartLineNotFound`] if the line is not in the caller's cart
    pub async fn remove_line(&self, owner_id: &str, line_id: &str) -> DbResult<()> {
        debug!(line_id = %line_id, "Removing cart line");

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            DELETE FROM cart_items
            WHERE id = ?1
              AND cart_id IN (SELECT id FROM carts WHERE owner_id = ?2)
            "#,
        )
        .bind(line_id)
        .bind(owner_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::CartLineNotFound(line_id.to_string()).into());
        }

        bump_version(&mut tx, owner_id).await?;
        tx.commit().await?;

        Ok(())
    }
}

// =============================================================================
// Shared helpers (also used by order placement)
// =============================================================================

/// Creates the owner's cart if missing and returns it.
///
/// `ON CONFLICT DO NOTHING` keeps two first-time callers from racing into a
/// unique violation.
async fn ensure_cart(conn: &mut SqliteConnection, owner_id: &str) -> DbResult<Cart> {
    let now = Utc::now();

    let created = sqlx::query(
        r#"
        INSERT INTO carts (id, owner_id, version, created_at, updated_at)
        VALUES (?1, ?2, 0, ?3, ?3)
        ON CONFLICT(owner_id) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(owner_id)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    if created.rows_affected() > 0 {
        debug!(owner_id = %owner_id, "Created cart");
    }

    let cart = sqlx::query_as::<_, Cart>(
        r#"
        SELECT id, owner_id, version, created_at, updated_at
        FROM carts
        WHERE owner_id = ?1
        "#,
    )
    .bind(owner_id)
    .fetch_one(&mut *conn)
    .await?;

    Ok(cart)
}

/// Bumps the owner's cart version. Returns the number of carts touched
/// (0 when the owner has no cart yet).
pub(crate) async fn bump_version(conn: &mut SqliteConnection, owner_id: &str) -> DbResult<u64> {
    let result = sqlx::query(
        r#"
        UPDATE carts SET version = version + 1, updated_at = ?2
        WHERE owner_id = ?1
        "#,
    )
    .bind(owner_id)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected())
}

/// Loads a cart's lines joined with the current catalog state, oldest first.
///
/// Catalog columns come back `NULL` for lines whose menu item was deleted.
pub(crate) async fn fetch_lines(
    conn: &mut SqliteConnection,
    cart_id: &str,
) -> DbResult<Vec<CartLineView>> {
    let lines = sqlx::query_as::<_, CartLineView>(
        r#"
        SELECT
            ci.id,
            ci.cart_id,
            ci.menu_item_id,
            ci.quantity,
            ci.unit_price_paise,
            ci.created_at,
            mi.name         AS menu_item_name,
            mi.price_paise  AS current_price_paise,
            mi.is_available AS is_available
        FROM cart_items ci
        LEFT JOIN menu_items mi ON mi.id = ci.menu_item_id
        WHERE ci.cart_id = ?1
        ORDER BY ci.created_at, ci.rowid
        "#,
    )
    .bind(cart_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(lines)
}

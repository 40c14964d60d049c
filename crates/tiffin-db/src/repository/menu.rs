//! # Menu Repository
//!
//! Menu items owned by the kitchen, with their category and nutrition table.
//!
//! Price changes here only affect lines added afterwards: cart lines keep
//! the price captured at add time, order lines keep the cart's price.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use tiffin_core::validation::validate_price_paise;
use tiffin_core::{
    Category, CoreError, MenuFilter, MenuItem, MenuItemDetail, MenuItemUpdate, NutritionFact,
};

/// Repository for menu item database operations.
#[derive(Debug, Clone)]
pub struct MenuRepository {
    pool: SqlitePool,
}

impl MenuRepository {
    /// Creates a new MenuRepository.
    pub fn new(pool: SqlitePool) -> Self {
        MenuRepository { pool }
    }

    /// Inserts a menu item without nutrition rows.
    pub async fn insert(&self, item: &MenuItem) -> DbResult<()> {
        self.insert_with_nutrition(item, &[]).await
    }

    /// Inserts a menu item and its nutrition table.
    ///
    /// ## Errors
    /// - `Validation` if the price is not in `1..=MAX_PRICE_PAISE`
    /// - [`CoreError::KitchenNotFound`] if the kitchen does not exist
    /// - [`CoreError::CategoryNotFound`] if the category does not exist
    pub async fn insert_with_nutrition(
        &self,
        item: &MenuItem,
        nutrition: &[NutritionFact],
    ) -> DbResult<()> {
        validate_price_paise(item.price_paise)?;

        debug!(id = %item.id, kitchen_id = %item.kitchen_id, name = %item.name, "Inserting menu item");

        let mut tx = self.pool.begin().await?;

        let kitchen_exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM kitchens WHERE id = ?1)")
                .bind(&item.kitchen_id)
                .fetch_one(&mut *tx)
                .await?;

        if !kitchen_exists {
            return Err(CoreError::KitchenNotFound(item.kitchen_id.clone()).into());
        }

        if let Some(category_id) = &item.category_id {
            require_category(&mut tx, category_id).await?;
        }

        sqlx::query(
            r#"
            INSERT INTO menu_items (
                id, kitchen_id, category_id, name, description, price_paise,
                food_type, tiffin_size, image_url, is_available, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(&item.id)
        .bind(&item.kitchen_id)
        .bind(&item.category_id)
        .bind(&item.name)
        .bind(&item.description)
        .bind(item.price_paise)
        .bind(item.food_type)
        .bind(item.tiffin_size)
        .bind(&item.image_url)
        .bind(item.is_available)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&mut *tx)
        .await?;

        insert_nutrition(&mut tx, &item.id, nutrition).await?;

        tx.commit().await?;

        Ok(())
    }

    /// Gets a menu item by ID.
    pub async fn get(&self, id: &str) -> DbResult<Option<MenuItem>> {
        let item = sqlx::query_as::<_, MenuItem>(
            r#"
            SELECT id, kitchen_id, category_id, name, description, price_paise,
                   food_type, tiffin_size, image_url, is_available, created_at, updated_at
            FROM menu_items
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(item)
    }

    /// Gets a menu item with its category and nutrition table.
    pub async fn get_detail(&self, id: &str) -> DbResult<Option<MenuItemDetail>> {
        let mut conn = self.pool.acquire().await?;

        let item = sqlx::query_as::<_, MenuItem>(
            r#"
            SELECT id, kitchen_id, category_id, name, description, price_paise,
                   food_type, tiffin_size, image_url, is_available, created_at, updated_at
            FROM menu_items
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        match item {
            Some(item) => Ok(Some(load_detail(&mut conn, item).await?)),
            None => Ok(None),
        }
    }

    /// Changes the catalog price of an item.
    pub async fn update_price(&self, id: &str, price_paise: i64) -> DbResult<MenuItem> {
        validate_price_paise(price_paise)?;

        debug!(id = %id, price_paise, "Updating menu item price");

        let result = sqlx::query(
            "UPDATE menu_items SET price_paise = ?2, updated_at = ?3 WHERE id = ?1",
        )
        .bind(id)
        .bind(price_paise)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::MenuItemNotFound(id.to_string()).into());
        }

        self.require(id).await
    }

    /// Applies `update` to an item. Set fields overwrite, unset fields are
    /// kept, and a given nutrition list replaces the stored one.
    ///
    /// ## Errors
    /// - [`CoreError::MenuItemNotFound`]
    /// - [`CoreError::CategoryNotFound`] if the new category does not exist
    /// - `Validation` for an out-of-range price
    pub async fn update(&self, id: &str, update: &MenuItemUpdate) -> DbResult<MenuItemDetail> {
        if let Some(price_paise) = update.price_paise {
            validate_price_paise(price_paise)?;
        }

        debug!(id = %id, "Updating menu item");

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE menu_items
            SET name = COALESCE(?2, name),
                description = COALESCE(?3, description),
                price_paise = COALESCE(?4, price_paise),
                food_type = COALESCE(?5, food_type),
                tiffin_size = COALESCE(?6, tiffin_size),
                image_url = COALESCE(?7, image_url),
                is_available = COALESCE(?8, is_available),
                updated_at = ?9
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&update.name)
        .bind(&update.description)
        .bind(update.price_paise)
        .bind(update.food_type)
        .bind(update.tiffin_size)
        .bind(&update.image_url)
        .bind(update.is_available)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::MenuItemNotFound(id.to_string()).into());
        }

        if let Some(category_id) = &update.category_id {
            require_category(&mut tx, category_id).await?;

            sqlx::query("UPDATE menu_items SET category_id = ?2 WHERE id = ?1")
                .bind(id)
                .bind(category_id)
                .execute(&mut *tx)
                .await?;
        }

        if let Some(nutrition) = &update.nutrition {
            sqlx::query("DELETE FROM menu_item_nutrition WHERE menu_item_id = ?1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            insert_nutrition(&mut tx, id, nutrition).await?;
        }

        let item = sqlx::query_as::<_, MenuItem>(
            r#"
            SELECT id, kitchen_id, category_id, name, description, price_paise,
                   food_type, tiffin_size, image_url, is_available, created_at, updated_at
            FROM menu_items
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        let detail = load_detail(&mut tx, item).await?;
        tx.commit().await?;

        Ok(detail)
    }

    /// Flips the availability flag and returns the updated item.
    pub async fn toggle_availability(&self, id: &str) -> DbResult<MenuItem> {
        debug!(id = %id, "Toggling menu item availability");

        let result = sqlx::query(
            "UPDATE menu_items SET is_available = NOT is_available, updated_at = ?2 WHERE id = ?1",
        )
        .bind(id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::MenuItemNotFound(id.to_string()).into());
        }

        self.require(id).await
    }

    /// Deletes a menu item and its nutrition rows. Cart lines pointing at it
    /// are left in place.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting menu item");

        let result = sqlx::query("DELETE FROM menu_items WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::MenuItemNotFound(id.to_string()).into());
        }

        Ok(())
    }

    /// Lists a kitchen's whole menu, available or not, newest first.
    pub async fn list_for_kitchen(&self, kitchen_id: &str) -> DbResult<Vec<MenuItemDetail>> {
        let mut conn = self.pool.acquire().await?;

        let items = sqlx::query_as::<_, MenuItem>(
            r#"
            SELECT id, kitchen_id, category_id, name, description, price_paise,
                   food_type, tiffin_size, image_url, is_available, created_at, updated_at
            FROM menu_items
            WHERE kitchen_id = ?1
            ORDER BY created_at DESC, rowid DESC
            "#,
        )
        .bind(kitchen_id)
        .fetch_all(&mut *conn)
        .await?;

        let mut details = Vec::with_capacity(items.len());
        for item in items {
            details.push(load_detail(&mut conn, item).await?);
        }

        Ok(details)
    }

    /// Lists the available items customers can order, newest first,
    /// narrowed by category and food type when the filter sets them.
    pub async fn list_public(
        &self,
        kitchen_id: &str,
        filter: &MenuFilter,
    ) -> DbResult<Vec<MenuItemDetail>> {
        let mut conn = self.pool.acquire().await?;

        let items = sqlx::query_as::<_, MenuItem>(
            r#"
            SELECT id, kitchen_id, category_id, name, description, price_paise,
                   food_type, tiffin_size, image_url, is_available, created_at, updated_at
            FROM menu_items
            WHERE kitchen_id = ?1
              AND is_available = 1
              AND (?2 IS NULL OR category_id = ?2)
              AND (?3 IS NULL OR food_type = ?3)
            ORDER BY created_at DESC, rowid DESC
            "#,
        )
        .bind(kitchen_id)
        .bind(&filter.category_id)
        .bind(filter.food_type)
        .fetch_all(&mut *conn)
        .await?;

        let mut details = Vec::with_capacity(items.len());
        for item in items {
            details.push(load_detail(&mut conn, item).await?);
        }

        Ok(details)
    }

    async fn require(&self, id: &str) -> DbResult<MenuItem> {
        self.get(id)
            .await?
            .ok_or_else(|| CoreError::MenuItemNotFound(id.to_string()).into())
    }
}

async fn require_category(conn: &mut SqliteConnection, category_id: &str) -> DbResult<()> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM categories WHERE id = ?1)")
        .bind(category_id)
        .fetch_one(&mut *conn)
        .await?;

    if !exists {
        return Err(CoreError::CategoryNotFound(category_id.to_string()).into());
    }

    Ok(())
}

async fn insert_nutrition(
    conn: &mut SqliteConnection,
    menu_item_id: &str,
    nutrition: &[NutritionFact],
) -> DbResult<()> {
    for fact in nutrition {
        sqlx::query(
            "INSERT INTO menu_item_nutrition (menu_item_id, key, value, unit) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(menu_item_id)
        .bind(&fact.key)
        .bind(&fact.value)
        .bind(&fact.unit)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

async fn load_detail(conn: &mut SqliteConnection, item: MenuItem) -> DbResult<MenuItemDetail> {
    let category = match &item.category_id {
        Some(category_id) => {
            sqlx::query_as::<_, Category>(
                "SELECT id, name, image_url, created_at FROM categories WHERE id = ?1",
            )
            .bind(category_id)
            .fetch_optional(&mut *conn)
            .await?
        }
        None => None,
    };

    let nutrition = sqlx::query_as::<_, NutritionFact>(
        r#"
        SELECT key, value, unit
        FROM menu_item_nutrition
        WHERE menu_item_id = ?1
        ORDER BY rowid
        "#,
    )
    .bind(&item.id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(MenuItemDetail {
        item,
        category,
        nutrition,
    })
}

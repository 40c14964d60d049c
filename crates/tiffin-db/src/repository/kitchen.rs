//! # Kitchen Repository
//!
//! The serving kitchen and its approval state. A deployment has exactly one
//! kitchen; it takes orders only while it is both approved (by an
//! administrator) and active (by its operator).

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use tiffin_core::{CoreError, Kitchen, KitchenUpdate};

/// Repository for kitchen database operations.
#[derive(Debug, Clone)]
pub struct KitchenRepository {
    pool: SqlitePool,
}

impl KitchenRepository {
    /// Creates a new KitchenRepository.
    pub fn new(pool: SqlitePool) -> Self {
        KitchenRepository { pool }
    }

    /// Creates the unapproved, active kitchen.
    ///
    /// ## Errors
    /// - [`CoreError::KitchenExists`] if any kitchen already exists
    pub async fn create(&self, name: &str, description: Option<&str>) -> DbResult<Kitchen> {
        let kitchen = Kitchen {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            description: description.map(str::to_string),
            is_approved: false,
            is_active: true,
            created_at: Utc::now(),
        };

        debug!(id = %kitchen.id, name = %kitchen.name, "Creating kitchen");

        // One statement, so two concurrent creates cannot both pass the check.
        let result = sqlx::query(
            r#"
            INSERT INTO kitchens (id, name, description, is_approved, is_active, created_at)
            SELECT ?1, ?2, ?3, ?4, ?5, ?6
            WHERE NOT EXISTS (SELECT 1 FROM kitchens)
            "#,
        )
        .bind(&kitchen.id)
        .bind(&kitchen.name)
        .bind(&kitchen.description)
        .bind(kitchen.is_approved)
        .bind(kitchen.is_active)
        .bind(kitchen.created_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            let existing: String = sqlx::query_scalar("SELECT id FROM kitchens ORDER BY created_at LIMIT 1")
                .fetch_one(&self.pool)
                .await?;
            return Err(CoreError::KitchenExists(existing).into());
        }

        Ok(kitchen)
    }

    /// Updates the kitchen's name and description.
    ///
    /// ## Errors
    /// - [`CoreError::KitchenNotFound`]
    pub async fn update(&self, id: &str, update: &KitchenUpdate) -> DbResult<Kitchen> {
        debug!(id = %id, "Updating kitchen");

        let result = sqlx::query(
            r#"
            UPDATE kitchens
            SET name = COALESCE(?2, name),
                description = COALESCE(?3, description)
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&update.name)
        .bind(&update.description)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::KitchenNotFound(id.to_string()).into());
        }

        self.require(id).await
    }

    /// Gets a kitchen by ID.
    pub async fn get(&self, id: &str) -> DbResult<Option<Kitchen>> {
        let kitchen = sqlx::query_as::<_, Kitchen>(
            r#"
            SELECT id, name, description, is_approved, is_active, created_at
            FROM kitchens
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(kitchen)
    }

    /// Approves a kitchen.
    ///
    /// ## Errors
    /// - [`CoreError::KitchenNotFound`]
    /// - [`CoreError::AlreadyApproved`] if approval is requested twice
    pub async fn approve(&self, id: &str) -> DbResult<Kitchen> {
        debug!(id = %id, "Approving kitchen");

        let result = sqlx::query("UPDATE kitchens SET is_approved = 1 WHERE id = ?1 AND is_approved = 0")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return match self.get(id).await? {
                Some(_) => Err(CoreError::AlreadyApproved(id.to_string()).into()),
                None => Err(CoreError::KitchenNotFound(id.to_string()).into()),
            };
        }

        self.require(id).await
    }

    /// Opens or closes a kitchen for new orders.
    pub async fn set_active(&self, id: &str, active: bool) -> DbResult<Kitchen> {
        debug!(id = %id, active, "Setting kitchen active flag");

        let result = sqlx::query("UPDATE kitchens SET is_active = ?2 WHERE id = ?1")
            .bind(id)
            .bind(active)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::KitchenNotFound(id.to_string()).into());
        }

        self.require(id).await
    }

    /// Lists approved kitchens, oldest first.
    pub async fn list_approved(&self) -> DbResult<Vec<Kitchen>> {
        let kitchens = sqlx::query_as::<_, Kitchen>(
            r#"
            SELECT id, name, description, is_approved, is_active, created_at
            FROM kitchens
            WHERE is_approved = 1
            ORDER BY created_at
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(kitchens)
    }

    async fn require(&self, id: &str) -> DbResult<Kitchen> {
        self.get(id)
            .await?
            .ok_or_else(|| CoreError::KitchenNotFound(id.to_string()).into())
    }
}

//! # Address Repository
//!
//! Customer delivery addresses. At most one address per owner is marked
//! default; creating or updating an address as default clears the flag on
//! the others in the same transaction.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use tiffin_core::{Address, AddressUpdate, CoreError};

/// Repository for address database operations.
#[derive(Debug, Clone)]
pub struct AddressRepository {
    pool: SqlitePool,
}

impl AddressRepository {
    /// Creates a new AddressRepository.
    pub fn new(pool: SqlitePool) -> Self {
        AddressRepository { pool }
    }

    /// Inserts an address.
    pub async fn create(&self, address: &Address) -> DbResult<()> {
        debug!(id = %address.id, owner_id = %address.owner_id, is_default = address.is_default, "Creating address");

        let mut tx = self.pool.begin().await?;

        if address.is_default {
            sqlx::query("UPDATE addresses SET is_default = 0 WHERE owner_id = ?1 AND is_default = 1")
                .bind(&address.owner_id)
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query(
            r#"
            INSERT INTO addresses (
                id, owner_id, receiver_name, contact_number, house_number,
                sector, landmark, postcode, map_url, is_default, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&address.id)
        .bind(&address.owner_id)
        .bind(&address.receiver_name)
        .bind(&address.contact_number)
        .bind(&address.house_number)
        .bind(&address.sector)
        .bind(&address.landmark)
        .bind(&address.postcode)
        .bind(&address.map_url)
        .bind(address.is_default)
        .bind(address.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(())
    }

    /// Updates one of the owner's addresses.
    ///
    /// ## Errors
    /// - [`CoreError::AddressNotFound`] if missing or owned by someone else;
    ///   nothing is changed, including other addresses' default flags
    pub async fn update(&self, id: &str, owner_id: &str, update: &AddressUpdate) -> DbResult<Address> {
        debug!(id = %id, owner_id = %owner_id, is_default = ?update.is_default, "Updating address");

        let mut tx = self.pool.begin().await?;

        if update.is_default == Some(true) {
            sqlx::query(
                "UPDATE addresses SET is_default = 0 WHERE owner_id = ?1 AND id != ?2 AND is_default = 1",
            )
            .bind(owner_id)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        }

        let result = sqlx::query(
            r#"
            UPDATE addresses
            SET receiver_name = COALESCE(?3, receiver_name),
                contact_number = COALESCE(?4, contact_number),
                house_number = COALESCE(?5, house_number),
                sector = COALESCE(?6, sector),
                landmark = COALESCE(?7, landmark),
                postcode = COALESCE(?8, postcode),
                map_url = COALESCE(?9, map_url),
                is_default = COALESCE(?10, is_default)
            WHERE id = ?1 AND owner_id = ?2
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .bind(&update.receiver_name)
        .bind(&update.contact_number)
        .bind(&update.house_number)
        .bind(&update.sector)
        .bind(&update.landmark)
        .bind(&update.postcode)
        .bind(&update.map_url)
        .bind(update.is_default)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::AddressNotFound(id.to_string()).into());
        }

        let address = sqlx::query_as::<_, Address>(
            r#"
            SELECT id, owner_id, receiver_name, contact_number, house_number,
                   sector, landmark, postcode, map_url, is_default, created_at
            FROM addresses
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(address)
    }

    /// Lists the owner's addresses, newest first.
    pub async fn list_for_owner(&self, owner_id: &str) -> DbResult<Vec<Address>> {
        let addresses = sqlx::query_as::<_, Address>(
            r#"
            SELECT id, owner_id, receiver_name, contact_number, house_number,
                   sector, landmark, postcode, map_url, is_default, created_at
            FROM addresses
            WHERE owner_id = ?1
            ORDER BY created_at DESC, rowid DESC
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(addresses)
    }

    /// Gets an address only if it belongs to `owner_id`.
    pub async fn get_owned(&self, id: &str, owner_id: &str) -> DbResult<Option<Address>> {
        let address = sqlx::query_as::<_, Address>(
            r#"
            SELECT id, owner_id, receiver_name, contact_number, house_number,
                   sector, landmark, postcode, map_url, is_default, created_at
            FROM addresses
            WHERE id = ?1 AND owner_id = ?2
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(address)
    }

    /// Deletes one of the owner's addresses.
    ///
    /// ## Errors
    /// - [`CoreError::AddressNotFound`] if missing or owned by someone else
    pub async fn delete(&self, id: &str, owner_id: &str) -> DbResult<()> {
        debug!(id = %id, owner_id = %owner_id, "Deleting address");

        let result = sqlx::query("DELETE FROM addresses WHERE id = ?1 AND owner_id = ?2")
            .bind(id)
            .bind(owner_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::AddressNotFound(id.to_string()).into());
        }

        Ok(())
    }
}

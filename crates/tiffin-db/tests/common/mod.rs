//! Shared fixtures for tiffin-db integration tests.

#![allow(dead_code)]

use std::path::PathBuf;

use chrono::Utc;
use tiffin_core::{Address, MenuItem};
use tiffin_db::{Database, DbConfig, PlacementConfig};
use uuid::Uuid;

pub const CUSTOMER: &str = "cust-asha";
pub const OTHER_CUSTOMER: &str = "cust-vikram";

/// A seeded store: one approved kitchen, two menu items (A @ 100, B @ 50)
/// and one address per customer.
pub struct Store {
    pub db: Database,
    pub kitchen_id: String,
    pub item_a: MenuItem,
    pub item_b: MenuItem,
    pub address_id: String,
    pub other_address_id: String,
}

impl Store {
    pub fn placement(&self) -> PlacementConfig {
        PlacementConfig::new(&self.kitchen_id)
    }

    pub async fn order_count(&self) -> i64 {
        self.db.orders().count().await.unwrap()
    }

    pub async fn payment_count(&self) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM payments")
            .fetch_one(self.db.pool())
            .await
            .unwrap()
    }
}

pub async fn in_memory_store() -> Store {
    seed(Database::new(DbConfig::in_memory()).await.unwrap()).await
}

/// A file-backed store with several pooled connections, for tests where
/// transactions must really run side by side.
pub async fn file_store(path: &PathBuf) -> Store {
    let config = DbConfig::new(path).max_connections(4).min_connections(2);
    seed(Database::new(config).await.unwrap()).await
}

pub fn temp_db_path() -> PathBuf {
    std::env::temp_dir().join(format!("tiffin-test-{}.db", Uuid::new_v4()))
}

/// Removes a test database and its WAL side files.
pub fn remove_db_files(path: &PathBuf) {
    for suffix in ["", "-wal", "-shm"] {
        let mut file = path.clone().into_os_string();
        file.push(suffix);
        let _ = std::fs::remove_file(file);
    }
}

async fn seed(db: Database) -> Store {
    let kitchen = db.kitchens().create("Test Kitchen", None).await.unwrap();
    db.kitchens().approve(&kitchen.id).await.unwrap();

    let item_a = menu_item(&kitchen.id, "Item A", 100);
    let item_b = menu_item(&kitchen.id, "Item B", 50);
    db.menu().insert(&item_a).await.unwrap();
    db.menu().insert(&item_b).await.unwrap();

    let address = address(CUSTOMER);
    let other_address = self::address(OTHER_CUSTOMER);
    db.addresses().create(&address).await.unwrap();
    db.addresses().create(&other_address).await.unwrap();

    Store {
        db,
        kitchen_id: kitchen.id,
        item_a,
        item_b,
        address_id: address.id,
        other_address_id: other_address.id,
    }
}

pub fn menu_item(kitchen_id: &str, name: &str, price_paise: i64) -> MenuItem {
    MenuItem::new(kitchen_id, name, price_paise)
}

fn address(owner_id: &str) -> Address {
    Address {
        id: Uuid::new_v4().to_string(),
        owner_id: owner_id.to_string(),
        receiver_name: "Receiver".to_string(),
        contact_number: "9876543210".to_string(),
        house_number: "12".to_string(),
        sector: "Sector 5".to_string(),
        landmark: None,
        postcode: "110001".to_string(),
        map_url: None,
        is_default: true,
        created_at: Utc::now(),
    }
}

//! # Seed Data Generator
//!
//! Populates a development database with one approved kitchen, menu
//! categories, its menu and a demo customer address.
//!
//! ## Usage
//! ```bash
//! cargo run -p tiffin-db --bin seed
//!
//! # Specify database path and place a demo order
//! cargo run -p tiffin-db --bin seed -- --db ./data/tiffin.db --demo-order
//! ```
//!
//! Prints the kitchen id to export as `TIFFIN_KITCHEN_ID`.

use chrono::Utc;
use std::env;
use tiffin_core::{Address, FoodType, MenuItem, NutritionFact, PaymentMode, TiffinSize};
use tiffin_db::{Database, DbConfig, PlacementConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

const CATEGORIES: &[&str] = &["Thalis", "Mains", "Sides"];

/// (category index, name, description, price in paise, food type)
const MENU: &[(usize, &str, &str, i64, FoodType)] = &[
    (1, "Rajma Chawal", "Kidney beans curry with steamed rice", 14_000, FoodType::Veg),
    (0, "Dal Makhani Thali", "Dal, two rotis, rice, salad", 18_000, FoodType::Veg),
    (1, "Paneer Butter Masala", "With two butter naans", 22_000, FoodType::Veg),
    (1, "Aloo Paratha", "Two parathas with curd and pickle", 9_000, FoodType::Veg),
    (0, "Chicken Curry Thali", "Curry, rice, two rotis", 24_000, FoodType::NonVeg),
    (1, "Egg Bhurji Pav", "Two pavs", 10_000, FoodType::NonVeg),
    (2, "Masala Chaas", "Spiced buttermilk", 3_000, FoodType::Veg),
    (2, "Gulab Jamun", "Two pieces", 4_000, FoodType::Veg),
];

const DEMO_CUSTOMER: &str = "demo-customer";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./tiffin_dev.db");
    let mut demo_order = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--demo-order" => demo_order = true,
            "--help" | "-h" => {
                println!("Tiffin Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./tiffin_dev.db)");
                println!("      --demo-order   Fill the demo cart and place one order");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    info!(db = %db_path, "Seeding database");

    let db = Database::new(DbConfig::new(&db_path)).await?;

    let existing = db.kitchens().list_approved().await?;
    if let Some(kitchen) = existing.first() {
        println!("⚠ Database already has kitchen {} ({})", kitchen.name, kitchen.id);
        println!("  Skipping seed to avoid duplicates.");
        println!("  export TIFFIN_KITCHEN_ID={}", kitchen.id);
        return Ok(());
    }

    let kitchen = db
        .kitchens()
        .create("Ghar Ki Rasoi", Some("Home-style North Indian tiffins"))
        .await?;
    let kitchen = db.kitchens().approve(&kitchen.id).await?;
    println!("✓ Kitchen {} approved", kitchen.name);

    let mut categories = Vec::with_capacity(CATEGORIES.len());
    for name in CATEGORIES {
        categories.push(db.categories().create(name, None).await?);
    }
    println!("✓ {} categories", categories.len());

    let mut items = Vec::with_capacity(MENU.len());
    for (category, name, description, price_paise, food_type) in MENU {
        let mut item = MenuItem::new(&kitchen.id, *name, *price_paise);
        item.description = Some(description.to_string());
        item.category_id = categories.get(*category).map(|c| c.id.clone());
        item.food_type = *food_type;

        let nutrition = if *category == 0 {
            item.tiffin_size = Some(TiffinSize::Full);
            vec![NutritionFact {
                key: "Rotis".to_string(),
                value: "2".to_string(),
                unit: None,
            }]
        } else {
            Vec::new()
        };

        db.menu().insert_with_nutrition(&item, &nutrition).await?;
        items.push(item);
    }
    println!("✓ {} menu items", items.len());

    let address = Address {
        id: Uuid::new_v4().to_string(),
        owner_id: DEMO_CUSTOMER.to_string(),
        receiver_name: "Demo Customer".to_string(),
        contact_number: "9800000000".to_string(),
        house_number: "C-12".to_string(),
        sector: "Sector 18".to_string(),
        landmark: Some("Opposite the park".to_string()),
        postcode: "201301".to_string(),
        map_url: None,
        is_default: true,
        created_at: Utc::now(),
    };
    db.addresses().create(&address).await?;
    println!("✓ Address {} for {}", address.id, DEMO_CUSTOMER);

    if demo_order {
        let carts = db.carts();
        for (item, qty) in items.iter().zip([2, 1, 1]) {
            carts.add_line(DEMO_CUSTOMER, &item.id, qty).await?;
        }

        let detail = db
            .placement(PlacementConfig::new(&kitchen.id))
            .place_order(DEMO_CUSTOMER, &address.id, PaymentMode::Cod)
            .await?;

        println!("✓ Demo order placed:");
        println!("{}", serde_json::to_string_pretty(&detail)?);
    }

    println!();
    println!("✓ Seed complete!");
    println!("  export TIFFIN_KITCHEN_ID={}", kitchen.id);

    db.close().await;
    Ok(())
}

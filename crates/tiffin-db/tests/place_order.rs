//! Order placement against a real SQLite database.

mod common;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use common::{file_store, in_memory_store, menu_item, remove_db_files, temp_db_path, CUSTOMER};
use tiffin_core::{
    CoreError, OrderStatus, PaymentMode, PaymentStatus, MAX_LINE_QUANTITY, MAX_PRICE_PAISE,
};
use tiffin_db::DbError;
use uuid::Uuid;

#[tokio::test]
async fn test_cod_order_from_two_lines() {
    let store = in_memory_store().await;
    let carts = store.db.carts();

    carts.add_line(CUSTOMER, &store.item_a.id, 2).await.unwrap();
    carts.add_line(CUSTOMER, &store.item_b.id, 1).await.unwrap();

    let detail = store
        .db
        .placement(store.placement())
        .place_order(CUSTOMER, &store.address_id, PaymentMode::Cod)
        .await
        .unwrap();

    assert_eq!(detail.order.subtotal_paise, 250);
    assert_eq!(detail.order.total_amount_paise, 250);
    assert_eq!(detail.order.status, OrderStatus::Placed);
    assert_eq!(detail.order.payment_mode, PaymentMode::Cod);
    assert_eq!(detail.order.kitchen_id, store.kitchen_id);

    let line_sum: i64 = detail.lines.iter().map(|l| l.line_total().unwrap().paise()).sum();
    assert_eq!(line_sum, detail.order.total_amount_paise);

    let payment = detail.payment.expect("payment row");
    assert_eq!(payment.mode, PaymentMode::Cod);
    assert_eq!(payment.status, PaymentStatus::Pending);

    let delivery = detail.delivery.expect("delivery address");
    assert_eq!(delivery.receiver_name, "Receiver");
    assert_eq!(delivery.postcode, "110001");

    let cart = carts.get_or_create_cart(CUSTOMER).await.unwrap();
    assert!(cart.is_empty());

    let history = store.db.orders().list_for_owner(CUSTOMER).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].order.id, detail.order.id);
}

#[tokio::test]
async fn test_empty_cart_is_rejected_without_side_effects() {
    let store = in_memory_store().await;
    let placement = store.db.placement(store.placement());

    // No cart row at all, then an existing but empty cart.
    for _ in 0..2 {
        let err = placement
            .place_order(CUSTOMER, &store.address_id, PaymentMode::Cod)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::EmptyCart)));
        assert!(!err.is_retryable());
    }

    let view = store.db.carts().get_or_create_cart(CUSTOMER).await.unwrap();
    let version_before = view.cart.version;

    for _ in 0..2 {
        let err = placement
            .place_order(CUSTOMER, &store.address_id, PaymentMode::Upi)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::EmptyCart)));
    }

    assert_eq!(store.order_count().await, 0);
    assert_eq!(store.payment_count().await, 0);

    let view = store.db.carts().get_or_create_cart(CUSTOMER).await.unwrap();
    assert_eq!(view.cart.version, version_before);
}

#[tokio::test]
async fn test_foreign_address_is_rejected() {
    let store = in_memory_store().await;
    store
        .db
        .carts()
        .add_line(CUSTOMER, &store.item_a.id, 1)
        .await
        .unwrap();

    let placement = store.db.placement(store.placement());

    for address_id in [store.other_address_id.as_str(), "no-such-address"] {
        let err = placement
            .place_order(CUSTOMER, address_id, PaymentMode::Cod)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::InvalidAddress(_))));
    }

    assert_eq!(store.order_count().await, 0);
    let cart = store.db.carts().get_or_create_cart(CUSTOMER).await.unwrap();
    assert_eq!(cart.lines.len(), 1);
}

#[tokio::test]
async fn test_address_is_checked_before_cart() {
    let store = in_memory_store().await;

    let err = store
        .db
        .placement(store.placement())
        .place_order(CUSTOMER, &store.other_address_id, PaymentMode::Cod)
        .await
        .unwrap_err();

    assert!(matches!(err, DbError::Domain(CoreError::InvalidAddress(_))));
}

#[tokio::test]
async fn test_order_keeps_price_captured_by_cart() {
    let store = in_memory_store().await;
    let carts = store.db.carts();

    carts.add_line(CUSTOMER, &store.item_a.id, 3).await.unwrap();
    store.db.menu().update_price(&store.item_a.id, 175).await.unwrap();

    let detail = store
        .db
        .placement(store.placement())
        .place_order(CUSTOMER, &store.address_id, PaymentMode::Upi)
        .await
        .unwrap();

    assert_eq!(detail.lines[0].price_paise, 100);
    assert_eq!(detail.order.total_amount_paise, 300);

    // Later catalog changes never reach the stored order.
    store.db.menu().update_price(&store.item_a.id, 999).await.unwrap();
    let stored = store
        .db
        .orders()
        .get(&detail.order.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.lines[0].price_paise, 100);
    assert_eq!(stored.lines[0].name_snapshot, "Item A");
    assert_eq!(stored.order.total_amount_paise, 300);
}

#[tokio::test]
async fn test_deleted_menu_item_fails_with_item_not_found() {
    let store = in_memory_store().await;
    let carts = store.db.carts();

    carts.add_line(CUSTOMER, &store.item_a.id, 1).await.unwrap();
    carts.add_line(CUSTOMER, &store.item_b.id, 1).await.unwrap();
    store.db.menu().delete(&store.item_b.id).await.unwrap();

    let err = store
        .db
        .placement(store.placement())
        .place_order(CUSTOMER, &store.address_id, PaymentMode::Cod)
        .await
        .unwrap_err();

    match err {
        DbError::Domain(CoreError::ItemNotFound(id)) => assert_eq!(id, store.item_b.id),
        other => panic!("expected ItemNotFound, got {other:?}"),
    }

    assert_eq!(store.order_count().await, 0);
    assert_eq!(carts.get_or_create_cart(CUSTOMER).await.unwrap().lines.len(), 2);
}

#[tokio::test]
async fn test_closed_kitchen_is_unavailable() {
    let store = in_memory_store().await;
    store
        .db
        .carts()
        .add_line(CUSTOMER, &store.item_a.id, 1)
        .await
        .unwrap();
    store
        .db
        .kitchens()
        .set_active(&store.kitchen_id, false)
        .await
        .unwrap();

    let err = store
        .db
        .placement(store.placement())
        .place_order(CUSTOMER, &store.address_id, PaymentMode::Cod)
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::Domain(CoreError::KitchenUnavailable(_))));

    let missing = store
        .db
        .placement(tiffin_db::PlacementConfig::new("no-such-kitchen"))
        .place_order(CUSTOMER, &store.address_id, PaymentMode::Cod)
        .await
        .unwrap_err();
    assert!(matches!(missing, DbError::Domain(CoreError::KitchenUnavailable(_))));

    assert_eq!(store.order_count().await, 0);
}

#[tokio::test]
async fn test_failure_after_order_insert_rolls_everything_back() {
    let store = in_memory_store().await;
    let carts = store.db.carts();

    carts.add_line(CUSTOMER, &store.item_a.id, 2).await.unwrap();
    carts.add_line(CUSTOMER, &store.item_b.id, 1).await.unwrap();

    // Abort the cart clear, which runs after the order, lines and payment
    // have been inserted.
    sqlx::query(
        r#"
        CREATE TRIGGER fail_cart_clear BEFORE DELETE ON cart_items
        BEGIN
            SELECT RAISE(ABORT, 'injected failure');
        END
        "#,
    )
    .execute(store.db.pool())
    .await
    .unwrap();

    let err = store
        .db
        .placement(store.placement())
        .place_order(CUSTOMER, &store.address_id, PaymentMode::Cod)
        .await
        .unwrap_err();

    assert!(!matches!(err, DbError::Domain(_)));
    assert!(err.is_retryable());

    assert_eq!(store.order_count().await, 0);
    assert_eq!(store.payment_count().await, 0);
    let order_lines: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM order_items")
        .fetch_one(store.db.pool())
        .await
        .unwrap();
    assert_eq!(order_lines, 0);

    let cart = carts.get_or_create_cart(CUSTOMER).await.unwrap();
    assert_eq!(cart.lines.len(), 2);
    assert_eq!(cart.subtotal().unwrap().paise(), 250);

    // With the fault removed the same cart places normally.
    sqlx::query("DROP TRIGGER fail_cart_clear")
        .execute(store.db.pool())
        .await
        .unwrap();

    let detail = store
        .db
        .placement(store.placement())
        .place_order(CUSTOMER, &store.address_id, PaymentMode::Cod)
        .await
        .unwrap();
    assert_eq!(detail.order.total_amount_paise, 250);
}

#[tokio::test]
async fn test_each_success_creates_a_new_order() {
    let store = in_memory_store().await;
    let carts = store.db.carts();
    let placement = store.db.placement(store.placement());

    carts.add_line(CUSTOMER, &store.item_a.id, 1).await.unwrap();
    let first = placement
        .place_order(CUSTOMER, &store.address_id, PaymentMode::Cod)
        .await
        .unwrap();

    carts.add_line(CUSTOMER, &store.item_a.id, 1).await.unwrap();
    let second = placement
        .place_order(CUSTOMER, &store.address_id, PaymentMode::Cod)
        .await
        .unwrap();

    assert_ne!(first.order.id, second.order.id);
    assert_eq!(store.order_count().await, 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_placements_create_one_order() {
    let path = temp_db_path();
    let store = Arc::new(file_store(&path).await);

    store
        .db
        .carts()
        .add_line(CUSTOMER, &store.item_a.id, 2)
        .await
        .unwrap();
    store
        .db
        .carts()
        .add_line(CUSTOMER, &store.item_b.id, 1)
        .await
        .unwrap();

    let mut handles = Vec::new();
    for _ in 0..2 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            store
                .db
                .placement(store.placement())
                .place_order(CUSTOMER, &store.address_id, PaymentMode::Cod)
                .await
        }));
    }

    let mut placed = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(detail) => {
                assert_eq!(detail.order.total_amount_paise, 250);
                placed += 1;
            }
            Err(DbError::Domain(CoreError::EmptyCart)) | Err(DbError::Conflict(_)) => {}
            Err(other) => panic!("unexpected placement error: {other:?}"),
        }
    }

    assert_eq!(placed, 1);
    assert_eq!(store.order_count().await, 1);
    assert_eq!(store.payment_count().await, 1);
    assert!(store
        .db
        .carts()
        .get_or_create_cart(CUSTOMER)
        .await
        .unwrap()
        .is_empty());

    store.db.close().await;
    remove_db_files(&path);
}

#[tokio::test]
async fn test_most_expensive_allowed_line_places() {
    let store = in_memory_store().await;
    let feast = menu_item(&store.kitchen_id, "Wedding Feast", MAX_PRICE_PAISE);
    store.db.menu().insert(&feast).await.unwrap();
    store
        .db
        .carts()
        .add_line(CUSTOMER, &feast.id, MAX_LINE_QUANTITY)
        .await
        .unwrap();

    let detail = store
        .db
        .placement(store.placement())
        .place_order(CUSTOMER, &store.address_id, PaymentMode::Upi)
        .await
        .unwrap();

    assert_eq!(
        detail.order.total_amount_paise,
        MAX_PRICE_PAISE * MAX_LINE_QUANTITY
    );
}

#[tokio::test]
async fn test_overflowing_total_is_rejected_without_side_effects() {
    let store = in_memory_store().await;

    // Written straight to the table: the repository refuses prices this large.
    let item_id = Uuid::new_v4().to_string();
    let now = Utc::now();
    sqlx::query(
        r#"
        INSERT INTO menu_items (id, kitchen_id, name, price_paise, is_available, created_at, updated_at)
        VALUES (?1, ?2, 'Legacy Hamper', ?3, 1, ?4, ?4)
        "#,
    )
    .bind(&item_id)
    .bind(&store.kitchen_id)
    .bind(i64::MAX / 2 + 1)
    .bind(now)
    .execute(store.db.pool())
    .await
    .unwrap();

    let carts = store.db.carts();
    carts.add_line(CUSTOMER, &item_id, 2).await.unwrap();

    let err = store
        .db
        .placement(store.placement())
        .place_order(CUSTOMER, &store.address_id, PaymentMode::Cod)
        .await
        .unwrap_err();

    assert!(matches!(err, DbError::Domain(CoreError::TotalOverflow)));
    assert!(!err.is_retryable());
    assert_eq!(store.order_count().await, 0);
    assert_eq!(store.payment_count().await, 0);

    let cart = carts.get_or_create_cart(CUSTOMER).await.unwrap();
    assert_eq!(cart.lines.len(), 1);
    assert!(matches!(cart.subtotal(), Err(CoreError::TotalOverflow)));
}

#[tokio::test]
async fn test_deadline_while_write_lock_is_held_writes_nothing() {
    let path = temp_db_path();
    let store = file_store(&path).await;
    let carts = store.db.carts();
    carts.add_line(CUSTOMER, &store.item_a.id, 1).await.unwrap();
    let version_before = carts.get_or_create_cart(CUSTOMER).await.unwrap().cart.version;

    // Another connection holds the write lock past the deadline; busy_timeout
    // (5s) is longer, so placement is still waiting when the deadline passes.
    let mut holder = store.db.pool().acquire().await.unwrap();
    sqlx::query("BEGIN IMMEDIATE")
        .execute(&mut *holder)
        .await
        .unwrap();

    let err = store
        .db
        .placement(store.placement().timeout(Duration::from_millis(200)))
        .place_order(CUSTOMER, &store.address_id, PaymentMode::Cod)
        .await
        .unwrap_err();

    assert!(matches!(err, DbError::Timeout));
    assert!(err.is_retryable());

    sqlx::query("ROLLBACK").execute(&mut *holder).await.unwrap();
    drop(holder);

    assert_eq!(store.order_count().await, 0);
    assert_eq!(store.payment_count().await, 0);
    let cart = carts.get_or_create_cart(CUSTOMER).await.unwrap();
    assert_eq!(cart.lines.len(), 1);
    assert_eq!(cart.cart.version, version_before);

    // With the lock released the same placement goes through.
    let detail = store
        .db
        .placement(store.placement())
        .place_order(CUSTOMER, &store.address_id, PaymentMode::Cod)
        .await
        .unwrap();
    assert_eq!(detail.order.total_amount_paise, 100);

    store.db.close().await;
    remove_db_files(&path);
}

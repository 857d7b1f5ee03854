//! Management surfaces: tables, categories, menu items, waiters.

mod common;

use common::TestApp;
use rust_decimal_macros::dec;
use tableside_api::errors::ServiceError;
use tableside_api::services::menu_items::{CreateMenuItemRequest, UpdateMenuItemRequest};
use tableside_api::services::tables::CreateTableRequest;

#[tokio::test]
async fn menu_price_update_never_touches_captured_line_prices() {
    let app = TestApp::new().await;
    let (table_id, waiter_id, category_id) = app.seed_floor().await;
    let dish = app
        .seed_menu_item("Pad See Ew", dec!(10.00), 0, category_id)
        .await;

    let order = app.create_order(table_id, waiter_id).await;
    app.add_item(order.id, dish.id).await;

    // Price change lands on the menu only.
    let updated = app
        .services
        .menu_items
        .update_menu_item(
            dish.id,
            UpdateMenuItemRequest {
                description: None,
                price: Some(dec!(12.00)),
                prep_time_minutes: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.price, dec!(12.00));

    let detail = app.services.orders.get_order(order.id).await.unwrap();
    assert_eq!(detail.items[0].unit_price, dec!(10.00));

    app.services.orders.confirm(order.id).await.unwrap();
    let paid = app.services.orders.pay(order.id).await.unwrap();
    assert_eq!(paid.total_amount, dec!(10.00));
}

#[tokio::test]
async fn occupied_table_cannot_be_deactivated() {
    let app = TestApp::new().await;
    let (table_id, waiter_id, _) = app.seed_floor().await;

    let order = app.create_order(table_id, waiter_id).await;
    let err = app
        .services
        .tables
        .set_active(table_id, false)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::PreconditionFailed(_)));

    // Once the order is gone the table can be retired.
    app.services.orders.cancel(order.id).await.unwrap();
    let table = app
        .services
        .tables
        .set_active(table_id, false)
        .await
        .unwrap();
    assert!(!table.is_active);
}

#[tokio::test]
async fn table_creation_validates_seat_count() {
    let app = TestApp::new().await;
    let err = app
        .services
        .tables
        .create_table(CreateTableRequest { seats: 0 })
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::ValidationError(_)));

    let table = app.seed_table(6).await;
    assert!(table.is_free);
    assert!(table.is_active);
    assert_eq!(table.seats, 6);
}

#[tokio::test]
async fn menu_item_requires_an_active_category() {
    let app = TestApp::new().await;
    let category = app.seed_category("Desserts").await;
    app.services
        .categories
        .set_active(category.id, false)
        .await
        .unwrap();

    let err = app
        .services
        .menu_items
        .create_menu_item(CreateMenuItemRequest {
            name: "Mango Sticky Rice".into(),
            description: String::new(),
            price: dec!(6.50),
            prep_time_minutes: 5,
            category_id: category.id,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::PreconditionFailed(_)));

    let err = app
        .services
        .menu_items
        .create_menu_item(CreateMenuItemRequest {
            name: "Orphan Dish".into(),
            description: String::new(),
            price: dec!(5.00),
            prep_time_minutes: 0,
            category_id: 999,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidReference(_)));
}

#[tokio::test]
async fn menu_listing_filters_by_category_and_activity() {
    let app = TestApp::new().await;
    let mains = app.seed_category("Mains").await;
    let drinks = app.seed_category("Drinks").await;
    let curry = app
        .seed_menu_item("Green Curry", dec!(12.00), 20, mains.id)
        .await;
    let lemonade = app
        .seed_menu_item("Lemonade", dec!(3.50), 0, drinks.id)
        .await;
    app.services
        .menu_items
        .set_active(lemonade.id, false)
        .await
        .unwrap();

    let all = app
        .services
        .menu_items
        .list_menu_items(None, false)
        .await
        .unwrap();
    assert_eq!(all.len(), 2);

    let active = app
        .services
        .menu_items
        .list_menu_items(None, true)
        .await
        .unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, curry.id);

    let mains_only = app
        .services
        .menu_items
        .list_menu_items(Some(mains.id), false)
        .await
        .unwrap();
    assert_eq!(mains_only.len(), 1);
    assert_eq!(mains_only[0].id, curry.id);
}

#[tokio::test]
async fn waiters_are_created_and_listed() {
    let app = TestApp::new().await;
    app.seed_waiter("Dana").await;
    app.seed_waiter("Robin").await;

    let waiters = app.services.waiters.list_waiters().await.unwrap();
    assert_eq!(waiters.len(), 2);
    assert_eq!(waiters[0].name, "Dana");
}

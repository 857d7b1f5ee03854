//! End-to-end coverage of the order lifecycle: creation, item
//! mutation, confirmation into the kitchen, settlement, cancellation.

mod common;

use common::TestApp;
use rust_decimal_macros::dec;
use tableside_api::entities::order::OrderStatus;
use tableside_api::entities::order_item::OrderItemStatus;
use tableside_api::errors::ServiceError;
use tableside_api::services::orders::{AddItemRequest, OrderListFilter};

#[tokio::test]
async fn zero_prep_order_settles_without_touching_the_queue() {
    let app = TestApp::new().await;
    let (table_id, waiter_id, category_id) = app.seed_floor().await;
    let lemonade = app
        .seed_menu_item("Lemonade", dec!(3.50), 0, category_id)
        .await;

    let order = app.create_order(table_id, waiter_id).await;
    assert_eq!(order.status, OrderStatus::Created);
    assert!(order.completed_at.is_none());

    // Claiming the table flips it to occupied.
    let table = app.services.tables.get_table(table_id).await.unwrap();
    assert!(!table.is_free);

    // Two adds of the same menu item accumulate into one line.
    let first = app
        .services
        .orders
        .add_item(
            order.id,
            AddItemRequest {
                menu_item_id: lemonade.id,
                notes: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(first.quantity, 1);
    let second = app
        .services
        .orders
        .add_item(
            order.id,
            AddItemRequest {
                menu_item_id: lemonade.id,
                notes: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(second.id, first.id);
    assert_eq!(second.quantity, 2);

    app.services.orders.confirm(order.id).await.unwrap();

    // Zero prep time: both units Ready immediately, no queue entry.
    let detail = app.services.orders.get_order(order.id).await.unwrap();
    assert_eq!(detail.order.status, OrderStatus::Confirmed);
    assert_eq!(detail.items.len(), 1);
    assert_eq!(detail.items[0].status, OrderItemStatus::Ready);
    assert!(detail.items[0].started_at.is_some());
    assert!(detail.items[0].completed_at.is_some());
    assert!(app.queue.is_empty().await.unwrap());

    let paid = app.services.orders.pay(order.id).await.unwrap();
    assert_eq!(paid.status, OrderStatus::Paid);
    assert_eq!(paid.total_amount, dec!(7.00));
    assert_eq!(paid.discount_amount, dec!(0));
    assert!(paid.completed_at.is_some());

    let table = app.services.tables.get_table(table_id).await.unwrap();
    assert!(table.is_free);

    let detail = app.services.orders.get_order(order.id).await.unwrap();
    assert_eq!(detail.items[0].status, OrderItemStatus::Served);
}

#[tokio::test]
async fn prep_item_travels_through_the_kitchen() {
    let app = TestApp::new().await;
    let (table_id, waiter_id, category_id) = app.seed_floor().await;
    let curry = app
        .seed_menu_item("Green Curry", dec!(12.00), 20, category_id)
        .await;

    let order = app.create_order(table_id, waiter_id).await;
    let item_id = app.add_item(order.id, curry.id).await;
    app.services.orders.confirm(order.id).await.unwrap();

    // One snapshot appears for the started item.
    let queue = app.services.kitchen.get_queue().await.unwrap();
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0].id, item_id);
    let detail = app.services.orders.get_order(order.id).await.unwrap();
    assert_eq!(detail.items[0].status, OrderItemStatus::Started);

    // Payment is blocked while the kitchen holds the item.
    let err = app.services.orders.pay(order.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::PreconditionFailed(_)));

    app.services.kitchen.mark_ready(item_id).await.unwrap();
    assert!(app.queue.is_empty().await.unwrap());
    let detail = app.services.orders.get_order(order.id).await.unwrap();
    assert_eq!(detail.items[0].status, OrderItemStatus::Ready);
    assert!(detail.items[0].completed_at.is_some());

    app.services.orders.serve_item(item_id).await.unwrap();
    let detail = app.services.orders.get_order(order.id).await.unwrap();
    assert_eq!(detail.items[0].status, OrderItemStatus::Served);

    let paid = app.services.orders.pay(order.id).await.unwrap();
    assert_eq!(paid.total_amount, dec!(12.00));
}

#[tokio::test]
async fn confirm_is_idempotent_and_never_double_enqueues() {
    let app = TestApp::new().await;
    let (table_id, waiter_id, category_id) = app.seed_floor().await;
    let curry = app
        .seed_menu_item("Green Curry", dec!(12.00), 20, category_id)
        .await;

    let order = app.create_order(table_id, waiter_id).await;
    app.add_item(order.id, curry.id).await;

    app.services.orders.confirm(order.id).await.unwrap();
    app.services.orders.confirm(order.id).await.unwrap();

    assert_eq!(app.queue.len().await.unwrap(), 1);
    let detail = app.services.orders.get_order(order.id).await.unwrap();
    assert_eq!(detail.order.status, OrderStatus::Confirmed);
    assert_eq!(detail.items.len(), 1);
    assert_eq!(detail.items[0].status, OrderItemStatus::Started);
}

#[tokio::test]
async fn concurrent_confirms_do_not_double_enqueue() {
    let app = TestApp::new().await;
    let (table_id, waiter_id, category_id) = app.seed_floor().await;
    let curry = app
        .seed_menu_item("Green Curry", dec!(12.00), 20, category_id)
        .await;

    let order = app.create_order(table_id, waiter_id).await;
    app.add_item(order.id, curry.id).await;

    let (a, b) = tokio::join!(
        app.services.orders.confirm(order.id),
        app.services.orders.confirm(order.id),
    );
    a.unwrap();
    b.unwrap();

    assert_eq!(app.queue.len().await.unwrap(), 1);
}

#[tokio::test]
async fn started_item_gets_a_fresh_line_on_re_add() {
    let app = TestApp::new().await;
    let (table_id, waiter_id, category_id) = app.seed_floor().await;
    let curry = app
        .seed_menu_item("Green Curry", dec!(12.00), 20, category_id)
        .await;

    let order = app.create_order(table_id, waiter_id).await;
    let first_id = app.add_item(order.id, curry.id).await;
    app.services.orders.confirm(order.id).await.unwrap();

    // The existing line is Started now, so the add must not accumulate.
    let second = app
        .services
        .orders
        .add_item(
            order.id,
            AddItemRequest {
                menu_item_id: curry.id,
                notes: None,
            },
        )
        .await
        .unwrap();
    assert_ne!(second.id, first_id);
    assert_eq!(second.quantity, 1);
    assert_eq!(second.status, OrderItemStatus::New);
}

#[tokio::test]
async fn remove_item_is_limited_to_new_lines() {
    let app = TestApp::new().await;
    let (table_id, waiter_id, category_id) = app.seed_floor().await;
    let curry = app
        .seed_menu_item("Green Curry", dec!(12.00), 20, category_id)
        .await;

    let order = app.create_order(table_id, waiter_id).await;
    let item_id = app.add_item(order.id, curry.id).await;

    // Removable while New.
    app.services
        .orders
        .remove_item(order.id, item_id)
        .await
        .unwrap();
    let detail = app.services.orders.get_order(order.id).await.unwrap();
    assert!(detail.items.is_empty());

    // Once handed to the kitchen, removal is rejected.
    let item_id = app.add_item(order.id, curry.id).await;
    app.services.orders.confirm(order.id).await.unwrap();
    let err = app
        .services
        .orders
        .remove_item(order.id, item_id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidState(_)));

    // Unknown item and foreign item are reference errors.
    let err = app
        .services
        .orders
        .remove_item(order.id, 9999)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidReference(_)));

    let other_table = app.seed_table(2).await;
    let other_order = app.create_order(other_table.id, waiter_id).await;
    let err = app
        .services
        .orders
        .remove_item(other_order.id, item_id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidReference(_)));
}

#[tokio::test]
async fn cancellation_is_only_legal_from_created() {
    let app = TestApp::new().await;
    let (table_id, waiter_id, category_id) = app.seed_floor().await;
    let curry = app
        .seed_menu_item("Green Curry", dec!(12.00), 20, category_id)
        .await;

    let order = app.create_order(table_id, waiter_id).await;
    app.add_item(order.id, curry.id).await;

    app.services.orders.cancel(order.id).await.unwrap();

    // Table free again, all items cancelled.
    let table = app.services.tables.get_table(table_id).await.unwrap();
    assert!(table.is_free);
    let detail = app.services.orders.get_order(order.id).await.unwrap();
    assert_eq!(detail.order.status, OrderStatus::Cancelled);
    assert!(detail.items.is_empty());
    assert!(detail.order.completed_at.is_some());

    // Re-confirming or paying a cancelled order fails.
    let err = app.services.orders.confirm(order.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidState(_)));
    let err = app.services.orders.pay(order.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidState(_)));

    // A confirmed order cannot be cancelled.
    let order = app.create_order(table_id, waiter_id).await;
    app.services.orders.confirm(order.id).await.unwrap();
    let err = app.services.orders.cancel(order.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidState(_)));
}

#[tokio::test]
async fn payment_force_cancels_untouched_lines() {
    let app = TestApp::new().await;
    let (table_id, waiter_id, category_id) = app.seed_floor().await;
    let lemonade = app
        .seed_menu_item("Lemonade", dec!(3.50), 0, category_id)
        .await;
    let curry = app
        .seed_menu_item("Green Curry", dec!(12.00), 20, category_id)
        .await;

    let order = app.create_order(table_id, waiter_id).await;
    app.add_item(order.id, lemonade.id).await;
    app.services.orders.confirm(order.id).await.unwrap();

    // Added after confirmation, never re-confirmed: still New at pay.
    app.add_item(order.id, curry.id).await;

    let paid = app.services.orders.pay(order.id).await.unwrap();
    // Only the served lemonade is charged.
    assert_eq!(paid.total_amount, dec!(3.50));

    let detail = app.services.orders.get_order(order.id).await.unwrap();
    assert_eq!(detail.items.len(), 1);
    assert_eq!(detail.items[0].status, OrderItemStatus::Served);
}

#[tokio::test]
async fn terminal_orders_refuse_further_mutation() {
    let app = TestApp::new().await;
    let (table_id, waiter_id, category_id) = app.seed_floor().await;
    let lemonade = app
        .seed_menu_item("Lemonade", dec!(3.50), 0, category_id)
        .await;

    let order = app.create_order(table_id, waiter_id).await;
    app.add_item(order.id, lemonade.id).await;
    app.services.orders.confirm(order.id).await.unwrap();
    app.services.orders.pay(order.id).await.unwrap();

    let err = app
        .services
        .orders
        .add_item(
            order.id,
            AddItemRequest {
                menu_item_id: lemonade.id,
                notes: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidState(_)));

    let err = app.services.orders.pay(order.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidState(_)));
    let err = app.services.orders.cancel(order.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidState(_)));
}

#[tokio::test]
async fn order_creation_guards_table_and_references() {
    let app = TestApp::new().await;
    let (table_id, waiter_id, _) = app.seed_floor().await;

    // Unknown table / waiter.
    let err = app
        .services
        .orders
        .create_order(tableside_api::services::orders::CreateOrderRequest {
            table_id: 999,
            waiter_id,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidReference(_)));
    let err = app
        .services
        .orders
        .create_order(tableside_api::services::orders::CreateOrderRequest {
            table_id,
            waiter_id: 999,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidReference(_)));

    // Occupied table.
    app.create_order(table_id, waiter_id).await;
    let err = app
        .services
        .orders
        .create_order(tableside_api::services::orders::CreateOrderRequest {
            table_id,
            waiter_id,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::PreconditionFailed(_)));

    // Inactive table.
    let idle = app.seed_table(2).await;
    app.services
        .tables
        .set_active(idle.id, false)
        .await
        .unwrap();
    let err = app
        .services
        .orders
        .create_order(tableside_api::services::orders::CreateOrderRequest {
            table_id: idle.id,
            waiter_id,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::PreconditionFailed(_)));
}

#[tokio::test]
async fn order_listing_filters_by_status_and_table() {
    let app = TestApp::new().await;
    let (table_id, waiter_id, _) = app.seed_floor().await;
    let second_table = app.seed_table(2).await;

    let cancelled = app.create_order(table_id, waiter_id).await;
    app.services.orders.cancel(cancelled.id).await.unwrap();
    let open = app.create_order(table_id, waiter_id).await;
    let elsewhere = app.create_order(second_table.id, waiter_id).await;

    let page = app
        .services
        .orders
        .list_orders(OrderListFilter {
            status: Some(OrderStatus::Created),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(page.total, 2);
    let ids: Vec<i32> = page.orders.iter().map(|o| o.id).collect();
    assert!(ids.contains(&open.id));
    assert!(ids.contains(&elsewhere.id));

    let page = app
        .services
        .orders
        .list_orders(OrderListFilter {
            table_id: Some(second_table.id),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.orders[0].id, elsewhere.id);
}

#[tokio::test]
async fn inactive_menu_item_cannot_be_added() {
    let app = TestApp::new().await;
    let (table_id, waiter_id, category_id) = app.seed_floor().await;
    let special = app
        .seed_menu_item("Seasonal Special", dec!(18.00), 10, category_id)
        .await;
    app.services
        .menu_items
        .set_active(special.id, false)
        .await
        .unwrap();

    let order = app.create_order(table_id, waiter_id).await;
    let err = app
        .services
        .orders
        .add_item(
            order.id,
            AddItemRequest {
                menu_item_id: special.id,
                notes: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::PreconditionFailed(_)));
}

#[tokio::test]
async fn running_total_previews_without_discount() {
    let app = TestApp::new().await;
    let (table_id, waiter_id, category_id) = app.seed_floor().await;
    let lemonade = app
        .seed_menu_item("Lemonade", dec!(2.50), 0, category_id)
        .await;
    let curry = app
        .seed_menu_item("Green Curry", dec!(4.00), 20, category_id)
        .await;

    let order = app.create_order(table_id, waiter_id).await;
    app.add_item(order.id, lemonade.id).await;
    app.add_item(order.id, lemonade.id).await;
    app.add_item(order.id, curry.id).await;

    let total = app.services.orders.get_total(order.id).await.unwrap();
    assert_eq!(total, dec!(9.00));

    // Removed lines stop counting.
    let detail = app.services.orders.get_order(order.id).await.unwrap();
    let curry_line = detail
        .items
        .iter()
        .find(|i| i.menu_item_id == curry.id)
        .unwrap();
    app.services
        .orders
        .remove_item(order.id, curry_line.id)
        .await
        .unwrap();
    let total = app.services.orders.get_total(order.id).await.unwrap();
    assert_eq!(total, dec!(5.00));

    let err = app.services.orders.get_total(9999).await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidReference(_)));
}

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};
use sea_orm_migration::MigratorTrait;
use tempfile::TempDir;
use tokio::sync::mpsc;

use tableside_api::entities::discount;
use tableside_api::events::{self, EventSender};
use tableside_api::kitchen::PrepQueue;
use tableside_api::migrator::Migrator;
use tableside_api::services::categories::{CategoryView, CreateCategoryRequest};
use tableside_api::services::discounts::{CreateDiscountRequest, DiscountView};
use tableside_api::services::menu_items::{CreateMenuItemRequest, MenuItemView};
use tableside_api::services::orders::{AddItemRequest, CreateOrderRequest, OrderSummary};
use tableside_api::services::tables::{CreateTableRequest, TableView};
use tableside_api::services::waiters::{CreateWaiterRequest, WaiterView};
use tableside_api::services::AppServices;

/// Test harness: file-backed SQLite in a temp directory, in-memory
/// kitchen queue, full service container.
pub struct TestApp {
    pub db: Arc<DatabaseConnection>,
    pub services: AppServices,
    pub queue: PrepQueue,
    pub event_sender: EventSender,
    _event_task: tokio::task::JoinHandle<()>,
    _tmp: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        let tmp = TempDir::new().expect("temp dir");
        let db_path = tmp.path().join("tableside_test.db");
        let url = format!("sqlite://{}?mode=rwc", db_path.display());

        let db = Database::connect(&url).await.expect("sqlite connection");
        Migrator::up(&db, None).await.expect("migrations");
        let db = Arc::new(db);

        let (event_tx, event_rx) = mpsc::channel(64);
        let event_sender = EventSender::new(event_tx);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let queue = PrepQueue::in_memory();
        let services = AppServices::new(db.clone(), queue.clone(), event_sender.clone());

        Self {
            db,
            services,
            queue,
            event_sender,
            _event_task: event_task,
            _tmp: tmp,
        }
    }

    /// Full application router over this harness's state.
    pub fn router(&self) -> axum::Router {
        let state = tableside_api::AppState {
            db: self.db.clone(),
            config: tableside_api::config::AppConfig::default(),
            event_sender: self.event_sender.clone(),
            services: self.services.clone(),
        };
        tableside_api::app_router(state)
    }

    pub async fn seed_table(&self, seats: i32) -> TableView {
        self.services
            .tables
            .create_table(CreateTableRequest { seats })
            .await
            .expect("seed table")
    }

    pub async fn seed_waiter(&self, name: &str) -> WaiterView {
        self.services
            .waiters
            .create_waiter(CreateWaiterRequest { name: name.into() })
            .await
            .expect("seed waiter")
    }

    pub async fn seed_category(&self, name: &str) -> CategoryView {
        self.services
            .categories
            .create_category(CreateCategoryRequest { name: name.into() })
            .await
            .expect("seed category")
    }

    pub async fn seed_menu_item(
        &self,
        name: &str,
        price: Decimal,
        prep_time_minutes: i32,
        category_id: i32,
    ) -> MenuItemView {
        self.services
            .menu_items
            .create_menu_item(CreateMenuItemRequest {
                name: name.into(),
                description: String::new(),
                price,
                prep_time_minutes,
                category_id,
            })
            .await
            .expect("seed menu item")
    }

    pub async fn seed_discount(
        &self,
        percent: Decimal,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
    ) -> DiscountView {
        self.services
            .discounts
            .create_discount(CreateDiscountRequest {
                percent,
                starts_at,
                ends_at,
            })
            .await
            .expect("seed discount")
    }

    /// Inserts a discount row directly, bypassing the overlap check.
    pub async fn insert_discount_row(
        &self,
        percent: Decimal,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
        is_active: bool,
    ) -> discount::Model {
        discount::ActiveModel {
            percent: Set(percent),
            starts_at: Set(starts_at),
            ends_at: Set(ends_at),
            is_active: Set(is_active),
            ..Default::default()
        }
        .insert(&*self.db)
        .await
        .expect("insert discount row")
    }

    pub async fn create_order(&self, table_id: i32, waiter_id: i32) -> OrderSummary {
        self.services
            .orders
            .create_order(CreateOrderRequest {
                table_id,
                waiter_id,
            })
            .await
            .expect("create order")
    }

    pub async fn add_item(&self, order_id: i32, menu_item_id: i32) -> i32 {
        self.services
            .orders
            .add_item(
                order_id,
                AddItemRequest {
                    menu_item_id,
                    notes: None,
                },
            )
            .await
            .expect("add item")
            .id
    }

    /// Seeds a full floor: one table, one waiter, one category. Returns
    /// (table_id, waiter_id, category_id).
    pub async fn seed_floor(&self) -> (i32, i32, i32) {
        let table = self.seed_table(4).await;
        let waiter = self.seed_waiter("Dana").await;
        let category = self.seed_category("Mains").await;
        (table.id, waiter.id, category.id)
    }
}

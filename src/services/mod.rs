use std::sync::Arc;

use dashmap::DashMap;
use sea_orm::DatabaseConnection;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::events::EventSender;
use crate::kitchen::PrepQueue;

pub mod categories;
pub mod discounts;
pub mod kitchen;
pub mod menu_items;
pub mod orders;
pub mod tables;
pub mod waiters;

/// Per-id async mutexes. Every order lifecycle operation holds its
/// order's lock across the whole load-validate-mutate-persist window;
/// table claiming uses a second registry keyed by table id. Entries are
/// kept for the life of the process.
#[derive(Clone, Default)]
pub struct LockRegistry {
    locks: Arc<DashMap<i32, Arc<Mutex<()>>>>,
}

impl LockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, id: i32) -> OwnedMutexGuard<()> {
        let lock = self.locks.entry(id).or_default().value().clone();
        lock.lock_owned().await
    }
}

/// Service container wired once at startup and shared through
/// `AppState`.
#[derive(Clone)]
pub struct AppServices {
    pub orders: Arc<orders::OrderService>,
    pub kitchen: Arc<kitchen::KitchenService>,
    pub discounts: Arc<discounts::DiscountService>,
    pub tables: Arc<tables::TableService>,
    pub menu_items: Arc<menu_items::MenuItemService>,
    pub categories: Arc<categories::CategoryService>,
    pub waiters: Arc<waiters::WaiterService>,
}

impl AppServices {
    pub fn new(db: Arc<DatabaseConnection>, queue: PrepQueue, event_sender: EventSender) -> Self {
        let order_locks = LockRegistry::new();
        let table_locks = LockRegistry::new();

        let orders = Arc::new(orders::OrderService::new(
            db.clone(),
            queue.clone(),
            event_sender.clone(),
            order_locks.clone(),
            table_locks,
        ));
        let kitchen = Arc::new(kitchen::KitchenService::new(
            db.clone(),
            queue,
            event_sender.clone(),
            order_locks,
        ));
        let discounts = Arc::new(discounts::DiscountService::new(
            db.clone(),
            event_sender.clone(),
        ));
        let tables = Arc::new(tables::TableService::new(db.clone()));
        let menu_items = Arc::new(menu_items::MenuItemService::new(db.clone()));
        let categories = Arc::new(categories::CategoryService::new(db.clone()));
        let waiters = Arc::new(waiters::WaiterService::new(db));

        Self {
            orders,
            kitchen,
            discounts,
            tables,
            menu_items,
            categories,
            waiters,
        }
    }
}

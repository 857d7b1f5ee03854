use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

use crate::entities::{
    dining_table, discount, menu_item, order,
    order::OrderStatus,
    order_item,
    order_item::OrderItemStatus,
    waiter,
};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::kitchen::{PrepQueue, QueuedItem};
use crate::services::discounts;
use crate::services::LockRegistry;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub table_id: i32,
    pub waiter_id: i32,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    pub menu_item_id: i32,
    /// Applied when a new line is created; ignored on accumulation.
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub id: i32,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub total_amount: Decimal,
    pub discount_amount: Decimal,
    pub status: OrderStatus,
    pub table_id: i32,
    pub waiter_id: i32,
    pub discount_id: Option<i32>,
}

impl From<order::Model> for OrderSummary {
    fn from(model: order::Model) -> Self {
        Self {
            id: model.id,
            created_at: model.created_at,
            completed_at: model.completed_at,
            total_amount: model.total_amount,
            discount_amount: model.discount_amount,
            status: model.status,
            table_id: model.table_id,
            waiter_id: model.waiter_id,
            discount_id: model.discount_id,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemView {
    pub id: i32,
    pub order_id: i32,
    pub menu_item_id: i32,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub notes: String,
    pub status: OrderItemStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<order_item::Model> for OrderItemView {
    fn from(model: order_item::Model) -> Self {
        Self {
            id: model.id,
            order_id: model.order_id,
            menu_item_id: model.menu_item_id,
            quantity: model.quantity,
            unit_price: model.unit_price,
            notes: model.notes,
            status: model.status,
            started_at: model.started_at,
            completed_at: model.completed_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: OrderSummary,
    pub items: Vec<OrderItemView>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderListFilter {
    pub status: Option<OrderStatus>,
    pub table_id: Option<i32>,
    pub waiter_id: Option<i32>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_per_page")]
    pub per_page: u64,
}

impl Default for OrderListFilter {
    fn default() -> Self {
        Self {
            status: None,
            table_id: None,
            waiter_id: None,
            from: None,
            to: None,
            page: default_page(),
            per_page: default_per_page(),
        }
    }
}

fn default_page() -> u64 {
    1
}

fn default_per_page() -> u64 {
    20
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPage {
    pub orders: Vec<OrderSummary>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

/// Drives the order lifecycle: creation, item mutation, confirmation
/// into the kitchen queue, settlement, cancellation. Every mutating
/// operation holds the order's lock (tables have their own registry for
/// claiming) and runs inside a single transaction.
#[derive(Clone)]
pub struct OrderService {
    db: Arc<DatabaseConnection>,
    queue: PrepQueue,
    event_sender: EventSender,
    order_locks: LockRegistry,
    table_locks: LockRegistry,
}

impl OrderService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        queue: PrepQueue,
        event_sender: EventSender,
        order_locks: LockRegistry,
        table_locks: LockRegistry,
    ) -> Self {
        Self {
            db,
            queue,
            event_sender,
            order_locks,
            table_locks,
        }
    }

    async fn load_order<C: ConnectionTrait>(
        conn: &C,
        order_id: i32,
    ) -> Result<order::Model, ServiceError> {
        order::Entity::find_by_id(order_id)
            .one(conn)
            .await?
            .ok_or_else(|| ServiceError::InvalidReference(format!("Order {} not found", order_id)))
    }

    async fn load_items<C: ConnectionTrait>(
        conn: &C,
        order_id: i32,
    ) -> Result<Vec<order_item::Model>, ServiceError> {
        Ok(order_item::Entity::find()
            .filter(order_item::Column::OrderId.eq(order_id))
            .order_by_asc(order_item::Column::Id)
            .all(conn)
            .await?)
    }

    /// Opens an order on a free, active table and claims it. A discount
    /// valid right now is bound once; it is never re-resolved later.
    #[instrument(skip(self), fields(table_id = request.table_id, waiter_id = request.waiter_id))]
    pub async fn create_order(
        &self,
        request: CreateOrderRequest,
    ) -> Result<OrderSummary, ServiceError> {
        let _guard = self.table_locks.acquire(request.table_id).await;
        let txn = self.db.begin().await?;

        let table = dining_table::Entity::find_by_id(request.table_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::InvalidReference(format!("Table {} not found", request.table_id))
            })?;
        if !table.is_active {
            return Err(ServiceError::PreconditionFailed("Table is not active".into()));
        }
        if !table.is_free {
            return Err(ServiceError::PreconditionFailed("Table is not free".into()));
        }
        waiter::Entity::find_by_id(request.waiter_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::InvalidReference(format!("Waiter {} not found", request.waiter_id))
            })?;

        let now = Utc::now();
        let bound_discount = discounts::resolve_valid_at(&txn, now).await?;

        let created = order::ActiveModel {
            created_at: Set(now),
            completed_at: Set(None),
            total_amount: Set(Decimal::ZERO),
            discount_amount: Set(Decimal::ZERO),
            status: Set(OrderStatus::Created),
            table_id: Set(table.id),
            waiter_id: Set(request.waiter_id),
            discount_id: Set(bound_discount.as_ref().map(|d| d.id)),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let mut table_active: dining_table::ActiveModel = table.into();
        table_active.is_free = Set(false);
        table_active.update(&txn).await?;

        txn.commit().await?;

        info!(order_id = created.id, "order created, table claimed");
        self.event_sender.emit(Event::OrderCreated(created.id)).await;
        Ok(created.into())
    }

    /// Adds a menu item to an open order. A line for the same menu item
    /// still in New accumulates quantity instead of duplicating; a line
    /// already handed to the kitchen gets a fresh row.
    #[instrument(skip(self, request), fields(menu_item_id = request.menu_item_id))]
    pub async fn add_item(
        &self,
        order_id: i32,
        request: AddItemRequest,
    ) -> Result<OrderItemView, ServiceError> {
        let _guard = self.order_locks.acquire(order_id).await;
        let txn = self.db.begin().await?;

        let order = Self::load_order(&txn, order_id).await?;
        if !order.status.is_open() {
            return Err(ServiceError::InvalidState(format!(
                "items can only be added while the order is Created or Confirmed, not {}",
                order.status
            )));
        }

        let menu_item = menu_item::Entity::find_by_id(request.menu_item_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::InvalidReference(format!(
                    "MenuItem {} not found",
                    request.menu_item_id
                ))
            })?;
        if !menu_item.is_active {
            return Err(ServiceError::PreconditionFailed(
                "MenuItem is not active".into(),
            ));
        }

        let existing = order_item::Entity::find()
            .filter(order_item::Column::OrderId.eq(order_id))
            .filter(order_item::Column::MenuItemId.eq(menu_item.id))
            .filter(order_item::Column::Status.eq(OrderItemStatus::New))
            .one(&txn)
            .await?;

        let result = match existing {
            Some(item) => {
                let quantity = item.quantity + 1;
                let mut active: order_item::ActiveModel = item.into();
                active.quantity = Set(quantity);
                let updated = active.update(&txn).await?;
                info!(order_id, order_item_id = updated.id, quantity, "accumulated existing line");
                updated
            }
            None => {
                let inserted = order_item::ActiveModel {
                    order_id: Set(order_id),
                    menu_item_id: Set(menu_item.id),
                    quantity: Set(1),
                    unit_price: Set(menu_item.price),
                    notes: Set(request.notes.unwrap_or_default()),
                    status: Set(OrderItemStatus::New),
                    started_at: Set(None),
                    completed_at: Set(None),
                    ..Default::default()
                }
                .insert(&txn)
                .await?;
                info!(order_id, order_item_id = inserted.id, "added new line");
                inserted
            }
        };

        txn.commit().await?;
        Ok(result.into())
    }

    /// Removes a line that has not yet been handed to the kitchen.
    #[instrument(skip(self))]
    pub async fn remove_item(
        &self,
        order_id: i32,
        order_item_id: i32,
    ) -> Result<(), ServiceError> {
        let _guard = self.order_locks.acquire(order_id).await;
        let txn = self.db.begin().await?;

        Self::load_order(&txn, order_id).await?;
        let item = order_item::Entity::find_by_id(order_item_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::InvalidReference(format!("OrderItem {} not found", order_item_id))
            })?;
        if item.order_id != order_id {
            return Err(ServiceError::InvalidReference(format!(
                "OrderItem {} does not belong to order {}",
                order_item_id, order_id
            )));
        }
        if item.status != OrderItemStatus::New {
            return Err(ServiceError::InvalidState(format!(
                "only an item still New can be removed, current status is {}",
                item.status
            )));
        }

        order_item::Entity::delete_by_id(order_item_id)
            .exec(&txn)
            .await?;
        txn.commit().await?;

        info!(order_id, order_item_id, "line removed");
        Ok(())
    }

    /// Confirms an open order and hands its new items over: items whose
    /// menu entry requires preparation become Started and are pushed
    /// onto the kitchen queue; zero-prep items go straight to Ready and
    /// bypass the queue. Safe to call again on a Confirmed order —
    /// items already handed over are untouched.
    #[instrument(skip(self))]
    pub async fn confirm(&self, order_id: i32) -> Result<(), ServiceError> {
        let _guard = self.order_locks.acquire(order_id).await;
        let txn = self.db.begin().await?;

        let order = Self::load_order(&txn, order_id).await?;
        if !order.status.can_transition_to(OrderStatus::Confirmed) {
            return Err(ServiceError::InvalidState(format!(
                "order confirmation is only allowed for a Created or Confirmed order, not {}",
                order.status
            )));
        }

        let pending: Vec<order_item::Model> = Self::load_items(&txn, order_id)
            .await?
            .into_iter()
            .filter(|item| item.status == OrderItemStatus::New)
            .collect();

        let mut queued = Vec::new();
        if !pending.is_empty() {
            let menu_ids: Vec<i32> = pending.iter().map(|item| item.menu_item_id).collect();
            let menu_items: HashMap<i32, menu_item::Model> = menu_item::Entity::find()
                .filter(menu_item::Column::Id.is_in(menu_ids))
                .all(&txn)
                .await?
                .into_iter()
                .map(|m| (m.id, m))
                .collect();

            let now = Utc::now();
            for item in pending {
                let menu_item = menu_items.get(&item.menu_item_id).ok_or_else(|| {
                    ServiceError::InvalidReference(format!(
                        "MenuItem {} not found",
                        item.menu_item_id
                    ))
                })?;
                if menu_item.requires_preparation() {
                    let mut active: order_item::ActiveModel = item.into();
                    active.status = Set(OrderItemStatus::Started);
                    active.started_at = Set(Some(now));
                    let updated = active.update(&txn).await?;
                    self.queue
                        .push(&QueuedItem::from_parts(&updated, menu_item))
                        .await?;
                    queued.push(updated.id);
                } else {
                    let mut active: order_item::ActiveModel = item.into();
                    active.status = Set(OrderItemStatus::Ready);
                    active.started_at = Set(Some(now));
                    active.completed_at = Set(Some(now));
                    active.update(&txn).await?;
                }
            }
        }

        let mut order_active: order::ActiveModel = order.into();
        order_active.status = Set(OrderStatus::Confirmed);
        order_active.update(&txn).await?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, order_id, "failed to commit order confirmation");
            ServiceError::PersistenceFailure(e)
        })?;

        info!(order_id, queued = queued.len(), "order confirmed");
        for order_item_id in queued {
            self.event_sender
                .emit(Event::OrderItemQueued {
                    order_id,
                    order_item_id,
                })
                .await;
        }
        self.event_sender.emit(Event::OrderConfirmed(order_id)).await;
        Ok(())
    }

    /// Settles a confirmed order. Items still with the kitchen block
    /// payment; untouched New items are treated as never ordered and
    /// cancelled; Ready items are served on the spot. The charge is the
    /// sum over served lines minus the bound discount's share, with the
    /// percentage read from the discount row as it stands now.
    #[instrument(skip(self))]
    pub async fn pay(&self, order_id: i32) -> Result<OrderSummary, ServiceError> {
        let _guard = self.order_locks.acquire(order_id).await;
        let txn = self.db.begin().await?;

        let order = Self::load_order(&txn, order_id).await?;
        if !order.status.can_transition_to(OrderStatus::Paid) {
            return Err(ServiceError::InvalidState(format!(
                "payment is only allowed for a Confirmed order, not {}",
                order.status
            )));
        }

        let items = Self::load_items(&txn, order_id).await?;
        if items.iter().any(|item| item.status.in_preparation()) {
            return Err(ServiceError::PreconditionFailed(
                "items not yet served".into(),
            ));
        }

        let mut total = Decimal::ZERO;
        for item in items {
            match item.status {
                OrderItemStatus::New => {
                    // Never confirmed into the kitchen: treated as never
                    // ordered.
                    let mut active: order_item::ActiveModel = item.into();
                    active.status = Set(OrderItemStatus::Cancelled);
                    active.update(&txn).await?;
                }
                OrderItemStatus::Ready => {
                    total += item.line_total();
                    let mut active: order_item::ActiveModel = item.into();
                    active.status = Set(OrderItemStatus::Served);
                    active.update(&txn).await?;
                }
                OrderItemStatus::Served => {
                    total += item.line_total();
                }
                OrderItemStatus::Cancelled | OrderItemStatus::Started => {}
            }
        }

        let discount_amount = match order.discount_id {
            Some(discount_id) => {
                let bound = discount::Entity::find_by_id(discount_id)
                    .one(&txn)
                    .await?
                    .ok_or_else(|| {
                        ServiceError::InvalidReference(format!(
                            "Discount {} not found",
                            discount_id
                        ))
                    })?;
                // The percentage is honored even if the discount was
                // deactivated after this order bound it.
                discounts::discount_amount(total, bound.percent)
            }
            None => Decimal::ZERO,
        };

        let table = dining_table::Entity::find_by_id(order.table_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::InvalidReference(format!("Table {} not found", order.table_id))
            })?;
        let mut table_active: dining_table::ActiveModel = table.into();
        table_active.is_free = Set(true);
        table_active.update(&txn).await?;

        let mut order_active: order::ActiveModel = order.into();
        order_active.total_amount = Set(total - discount_amount);
        order_active.discount_amount = Set(discount_amount);
        order_active.completed_at = Set(Some(Utc::now()));
        order_active.status = Set(OrderStatus::Paid);
        let paid = order_active.update(&txn).await?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, order_id, "failed to commit order payment");
            ServiceError::PersistenceFailure(e)
        })?;

        info!(order_id, total = %paid.total_amount, "order paid, table released");
        self.event_sender
            .emit(Event::OrderPaid {
                order_id,
                total: paid.total_amount,
            })
            .await;
        Ok(paid.into())
    }

    /// Cancels an order that was never confirmed. All lines are
    /// cancelled and the table is released.
    #[instrument(skip(self))]
    pub async fn cancel(&self, order_id: i32) -> Result<(), ServiceError> {
        let _guard = self.order_locks.acquire(order_id).await;
        let txn = self.db.begin().await?;

        let order = Self::load_order(&txn, order_id).await?;
        if !order.status.can_transition_to(OrderStatus::Cancelled) {
            return Err(ServiceError::InvalidState(format!(
                "order cancellation is only allowed for a Created order, not {}",
                order.status
            )));
        }

        for item in Self::load_items(&txn, order_id).await? {
            if item.status.can_transition_to(OrderItemStatus::Cancelled) {
                let mut active: order_item::ActiveModel = item.into();
                active.status = Set(OrderItemStatus::Cancelled);
                active.update(&txn).await?;
            }
        }

        let table = dining_table::Entity::find_by_id(order.table_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::InvalidReference(format!("Table {} not found", order.table_id))
            })?;
        let mut table_active: dining_table::ActiveModel = table.into();
        table_active.is_free = Set(true);
        table_active.update(&txn).await?;

        let mut order_active: order::ActiveModel = order.into();
        order_active.status = Set(OrderStatus::Cancelled);
        order_active.completed_at = Set(Some(Utc::now()));
        order_active.update(&txn).await?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, order_id, "failed to commit order cancellation");
            ServiceError::PersistenceFailure(e)
        })?;

        info!(order_id, "order cancelled, table released");
        self.event_sender.emit(Event::OrderCancelled(order_id)).await;
        Ok(())
    }

    /// Marks a Ready item as handed to the guest. Not gated by order
    /// status: a Ready item can be served whenever it comes up.
    #[instrument(skip(self))]
    pub async fn serve_item(&self, order_item_id: i32) -> Result<(), ServiceError> {
        // Resolve the owning order first so its lock can be taken.
        let owning = order_item::Entity::find_by_id(order_item_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::InvalidReference(format!("OrderItem {} not found", order_item_id))
            })?;

        let _guard = self.order_locks.acquire(owning.order_id).await;
        let txn = self.db.begin().await?;

        let item = order_item::Entity::find_by_id(order_item_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::InvalidReference(format!("OrderItem {} not found", order_item_id))
            })?;
        if !item.status.can_transition_to(OrderItemStatus::Served) {
            return Err(ServiceError::InvalidState(format!(
                "only a Ready item can be served, current status is {}",
                item.status
            )));
        }

        let mut active: order_item::ActiveModel = item.into();
        active.status = Set(OrderItemStatus::Served);
        active.update(&txn).await?;
        txn.commit().await?;

        info!(order_item_id, "item served");
        self.event_sender
            .emit(Event::OrderItemServed(order_item_id))
            .await;
        Ok(())
    }

    /// Running total over all non-cancelled lines. This is the
    /// pre-payment preview shown at the table; settlement at `pay`
    /// additionally applies the bound discount.
    #[instrument(skip(self))]
    pub async fn get_total(&self, order_id: i32) -> Result<Decimal, ServiceError> {
        Self::load_order(&*self.db, order_id).await?;
        let items = Self::load_items(&*self.db, order_id).await?;
        Ok(items
            .iter()
            .filter(|item| item.status != OrderItemStatus::Cancelled)
            .map(order_item::Model::line_total)
            .sum())
    }

    /// Single order with its non-cancelled lines.
    #[instrument(skip(self))]
    pub async fn get_order(&self, order_id: i32) -> Result<OrderWithItems, ServiceError> {
        let order = Self::load_order(&*self.db, order_id).await?;
        let items = Self::load_items(&*self.db, order_id)
            .await?
            .into_iter()
            .filter(|item| item.status != OrderItemStatus::Cancelled)
            .map(Into::into)
            .collect();
        Ok(OrderWithItems {
            order: order.into(),
            items,
        })
    }

    #[instrument(skip(self, filter))]
    pub async fn list_orders(&self, filter: OrderListFilter) -> Result<OrderPage, ServiceError> {
        let mut query = order::Entity::find();
        if let Some(status) = filter.status {
            query = query.filter(order::Column::Status.eq(status));
        }
        if let Some(table_id) = filter.table_id {
            query = query.filter(order::Column::TableId.eq(table_id));
        }
        if let Some(waiter_id) = filter.waiter_id {
            query = query.filter(order::Column::WaiterId.eq(waiter_id));
        }
        if let Some(from) = filter.from {
            query = query.filter(order::Column::CreatedAt.gte(from));
        }
        if let Some(to) = filter.to {
            query = query.filter(order::Column::CreatedAt.lte(to));
        }

        let per_page = filter.per_page.clamp(1, 100);
        let page = filter.page.max(1);
        let paginator = query
            .order_by_desc(order::Column::CreatedAt)
            .paginate(&*self.db, per_page);
        let total = paginator.num_items().await?;
        let orders = paginator.fetch_page(page - 1).await?;

        Ok(OrderPage {
            orders: orders.into_iter().map(Into::into).collect(),
            total,
            page,
            per_page,
        })
    }
}

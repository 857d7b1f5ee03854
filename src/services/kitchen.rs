use std::sync::Arc;

use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use tracing::{info, instrument, warn};

use crate::entities::{order_item, order_item::OrderItemStatus};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::kitchen::{PrepQueue, QueuedItem};
use crate::services::LockRegistry;

/// Kitchen-facing surface: the pending-snapshot view and the
/// completion callback that flips an item to Ready.
#[derive(Clone)]
pub struct KitchenService {
    db: Arc<DatabaseConnection>,
    queue: PrepQueue,
    event_sender: EventSender,
    order_locks: LockRegistry,
}

impl KitchenService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        queue: PrepQueue,
        event_sender: EventSender,
        order_locks: LockRegistry,
    ) -> Self {
        Self {
            db,
            queue,
            event_sender,
            order_locks,
        }
    }

    /// Everything currently awaiting preparation. Snapshots, not live
    /// records: the record store remains authoritative.
    #[instrument(skip(self))]
    pub async fn get_queue(&self) -> Result<Vec<QueuedItem>, ServiceError> {
        Ok(self.queue.read().await?)
    }

    /// Completion callback from the kitchen. The record store is
    /// updated first; the snapshot is removed from the queue after, so
    /// a failure between the two leaves a stale snapshot but never an
    /// unstarted Ready item.
    #[instrument(skip(self))]
    pub async fn mark_ready(&self, order_item_id: i32) -> Result<(), ServiceError> {
        let owning = order_item::Entity::find_by_id(order_item_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::InvalidReference(format!("OrderItem {} not found", order_item_id))
            })?;

        let _guard = self.order_locks.acquire(owning.order_id).await;

        let item = order_item::Entity::find_by_id(order_item_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::InvalidReference(format!("OrderItem {} not found", order_item_id))
            })?;
        if !item.status.in_preparation() {
            return Err(ServiceError::InvalidState(format!(
                "only an item in preparation can be marked ready, current status is {}",
                item.status
            )));
        }

        let order_id = item.order_id;
        let mut active: order_item::ActiveModel = item.into();
        active.status = Set(OrderItemStatus::Ready);
        active.completed_at = Set(Some(Utc::now()));
        active.update(&*self.db).await?;

        if !self.queue.remove(order_item_id).await? {
            // Possible if the snapshot was orphaned by an aborted
            // confirmation or already cleaned up.
            warn!(order_item_id, "no matching snapshot found in kitchen queue");
        }

        info!(order_item_id, order_id, "item marked ready");
        self.event_sender
            .emit(Event::OrderItemReady(order_item_id))
            .await;
        Ok(())
    }
}

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Domain events emitted after a lifecycle operation commits. Delivery
/// is best-effort; a failed send is logged and never fails the
/// operation that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    OrderCreated(i32),
    OrderConfirmed(i32),
    OrderPaid { order_id: i32, total: Decimal },
    OrderCancelled(i32),
    OrderItemQueued { order_id: i32, order_item_id: i32 },
    OrderItemReady(i32),
    OrderItemServed(i32),
    DiscountCreated(i32),
    DiscountEnded(i32),
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Fire-and-forget emission used by services after commit.
    pub async fn emit(&self, event: Event) {
        if let Err(err) = self.send(event).await {
            warn!(error = %err, "dropping domain event");
        }
    }
}

/// Drains the event channel for the life of the process. Consumers
/// beyond structured logging (printers, dashboards) would hang off
/// this loop.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        match &event {
            Event::OrderCreated(id) => info!(order_id = id, "order created"),
            Event::OrderConfirmed(id) => info!(order_id = id, "order confirmed"),
            Event::OrderPaid { order_id, total } => {
                info!(order_id, total = %total, "order paid")
            }
            Event::OrderCancelled(id) => info!(order_id = id, "order cancelled"),
            Event::OrderItemQueued {
                order_id,
                order_item_id,
            } => info!(order_id, order_item_id, "item queued for preparation"),
            Event::OrderItemReady(id) => info!(order_item_id = id, "item ready"),
            Event::OrderItemServed(id) => info!(order_item_id = id, "item served"),
            Event::DiscountCreated(id) => info!(discount_id = id, "discount created"),
            Event::DiscountEnded(id) => info!(discount_id = id, "discount ended"),
        }
    }
}

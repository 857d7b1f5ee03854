//! Preparation queue protocol.
//!
//! Items entering preparation are serialized and appended to a single
//! shared list (`kitchen:queue` by default). The queue stores
//! snapshots, not live records: the kitchen's view is advisory and
//! completion is always reconciled back against the record store.
//!
//! Removal rewrites the whole list (read, filter by id, delete,
//! re-push). Within one process the lost-update window of that
//! read-modify-write is closed by routing every queue mutation through
//! one async mutex in [`PrepQueue`]; a multi-process deployment would
//! need a store-level primitive instead (see DESIGN.md).

use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::warn;

use crate::entities::{menu_item, order_item, order_item::OrderItemStatus};
use crate::errors::ServiceError;

/// Well-known queue name shared by all producers and the kitchen.
pub const DEFAULT_QUEUE_KEY: &str = "kitchen:queue";

/// Snapshot of an order item handed to the kitchen. Decoupled from the
/// live record on purpose; `startedAt` rides along as RFC 3339.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuedItem {
    pub id: i32,
    pub order_id: i32,
    pub menu_item_id: i32,
    pub menu_item_name: String,
    pub quantity: i32,
    pub notes: String,
    pub status: OrderItemStatus,
    pub started_at: Option<DateTime<Utc>>,
}

impl QueuedItem {
    pub fn from_parts(item: &order_item::Model, menu_item: &menu_item::Model) -> Self {
        Self {
            id: item.id,
            order_id: item.order_id,
            menu_item_id: item.menu_item_id,
            menu_item_name: menu_item.name.clone(),
            quantity: item.quantity,
            notes: item.notes.clone(),
            status: item.status,
            started_at: item.started_at,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("queue backend error: {0}")]
    Backend(String),
    #[error("snapshot serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<redis::RedisError> for QueueError {
    fn from(err: redis::RedisError) -> Self {
        QueueError::Backend(err.to_string())
    }
}

impl From<QueueError> for ServiceError {
    fn from(err: QueueError) -> Self {
        match err {
            QueueError::Backend(msg) => ServiceError::QueueFailure(msg),
            QueueError::Serialization(e) => ServiceError::SerializationFailure(e.to_string()),
        }
    }
}

/// Minimal list-store contract the protocol runs against. Entries are
/// raw serialized snapshots; interpretation stays in [`PrepQueue`].
#[async_trait]
pub trait QueueBackend: Send + Sync {
    async fn append(&self, entry: String) -> Result<(), QueueError>;
    async fn entries(&self) -> Result<Vec<String>, QueueError>;
    async fn replace(&self, entries: Vec<String>) -> Result<(), QueueError>;
}

/// Redis list backend: RPUSH / LRANGE / DEL+RPUSH.
pub struct RedisQueueBackend {
    client: Arc<redis::Client>,
    key: String,
}

impl RedisQueueBackend {
    pub fn new(client: Arc<redis::Client>, key: impl Into<String>) -> Self {
        Self {
            client,
            key: key.into(),
        }
    }
}

#[async_trait]
impl QueueBackend for RedisQueueBackend {
    async fn append(&self, entry: String) -> Result<(), QueueError> {
        let mut conn = self.client.get_async_connection().await?;
        let _: i64 = conn.rpush(&self.key, entry).await?;
        Ok(())
    }

    async fn entries(&self) -> Result<Vec<String>, QueueError> {
        let mut conn = self.client.get_async_connection().await?;
        let entries: Vec<String> = conn.lrange(&self.key, 0, -1).await?;
        Ok(entries)
    }

    async fn replace(&self, entries: Vec<String>) -> Result<(), QueueError> {
        let mut conn = self.client.get_async_connection().await?;
        let mut pipe = redis::pipe();
        pipe.atomic();
        pipe.del(&self.key).ignore();
        if !entries.is_empty() {
            pipe.rpush(&self.key, entries).ignore();
        }
        let _: () = pipe.query_async(&mut conn).await?;
        Ok(())
    }
}

/// In-memory backend for tests and redis-less development.
#[derive(Default)]
pub struct InMemoryQueueBackend {
    entries: StdMutex<Vec<String>>,
}

impl InMemoryQueueBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QueueBackend for InMemoryQueueBackend {
    async fn append(&self, entry: String) -> Result<(), QueueError> {
        self.entries.lock().unwrap().push(entry);
        Ok(())
    }

    async fn entries(&self) -> Result<Vec<String>, QueueError> {
        Ok(self.entries.lock().unwrap().clone())
    }

    async fn replace(&self, entries: Vec<String>) -> Result<(), QueueError> {
        *self.entries.lock().unwrap() = entries;
        Ok(())
    }
}

/// Shared handle implementing the queue protocol over a backend. All
/// mutation (append and rewrite-removal) takes the same mutex, so an
/// enqueue cannot slip between removal's read and its re-push.
#[derive(Clone)]
pub struct PrepQueue {
    backend: Arc<dyn QueueBackend>,
    guard: Arc<Mutex<()>>,
}

impl PrepQueue {
    pub fn new(backend: Arc<dyn QueueBackend>) -> Self {
        Self {
            backend,
            guard: Arc::new(Mutex::new(())),
        }
    }

    pub fn redis(client: Arc<redis::Client>, key: impl Into<String>) -> Self {
        Self::new(Arc::new(RedisQueueBackend::new(client, key)))
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryQueueBackend::new()))
    }

    /// Appends a snapshot to the tail of the queue.
    pub async fn push(&self, item: &QueuedItem) -> Result<(), QueueError> {
        let entry = serde_json::to_string(item)?;
        let _lock = self.guard.lock().await;
        self.backend.append(entry).await
    }

    /// Full current snapshot list, deserialized best-effort: an entry
    /// that fails to parse is logged and skipped, never fatal.
    pub async fn read(&self) -> Result<Vec<QueuedItem>, QueueError> {
        let _lock = self.guard.lock().await;
        let raw = self.backend.entries().await?;
        let mut items = Vec::with_capacity(raw.len());
        for entry in raw {
            match serde_json::from_str::<QueuedItem>(&entry) {
                Ok(item) => items.push(item),
                Err(err) => {
                    warn!(error = %err, "skipping undecodable kitchen queue entry");
                }
            }
        }
        Ok(items)
    }

    /// Removes the snapshot matching `item_id` by rewriting the list.
    /// Entries that fail to parse are kept, mirroring the read path's
    /// tolerance. Returns whether a matching snapshot was found.
    pub async fn remove(&self, item_id: i32) -> Result<bool, QueueError> {
        let _lock = self.guard.lock().await;
        let raw = self.backend.entries().await?;
        let mut remaining = Vec::with_capacity(raw.len());
        let mut found = false;
        for entry in raw {
            match serde_json::from_str::<QueuedItem>(&entry) {
                Ok(item) if item.id == item_id => {
                    found = true;
                }
                Ok(_) => remaining.push(entry),
                Err(err) => {
                    warn!(error = %err, "keeping undecodable kitchen queue entry");
                    remaining.push(entry);
                }
            }
        }
        if found {
            self.backend.replace(remaining).await?;
        }
        Ok(found)
    }

    /// Number of entries currently stored, decodable or not.
    pub async fn len(&self) -> Result<usize, QueueError> {
        let _lock = self.guard.lock().await;
        Ok(self.backend.entries().await?.len())
    }

    pub async fn is_empty(&self) -> Result<bool, QueueError> {
        Ok(self.len().await? == 0)
    }
}

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::entities::discount;
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDiscountRequest {
    pub percent: Decimal,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountView {
    pub id: i32,
    pub percent: Decimal,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub is_active: bool,
}

impl From<discount::Model> for DiscountView {
    fn from(model: discount::Model) -> Self {
        Self {
            id: model.id,
            percent: model.percent,
            starts_at: model.starts_at,
            ends_at: model.ends_at,
            is_active: model.is_active,
        }
    }
}

/// Picks the discount bound to orders created at `at`: active, window
/// containing the instant, ties broken by earliest start then lowest
/// id so resolution is deterministic when windows overlap.
pub async fn resolve_valid_at<C: ConnectionTrait>(
    conn: &C,
    at: DateTime<Utc>,
) -> Result<Option<discount::Model>, ServiceError> {
    let candidate = discount::Entity::find()
        .filter(discount::Column::IsActive.eq(true))
        .filter(discount::Column::StartsAt.lte(at))
        .filter(discount::Column::EndsAt.gt(at))
        .order_by_asc(discount::Column::StartsAt)
        .order_by_asc(discount::Column::Id)
        .one(conn)
        .await?;
    Ok(candidate)
}

/// Discount share of a raw total, rounded to cents.
pub fn discount_amount(total: Decimal, percent: Decimal) -> Decimal {
    (total * percent / Decimal::ONE_HUNDRED).round_dp(2)
}

#[derive(Clone)]
pub struct DiscountService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl DiscountService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self, request), fields(starts_at = %request.starts_at, ends_at = %request.ends_at))]
    pub async fn create_discount(
        &self,
        request: CreateDiscountRequest,
    ) -> Result<DiscountView, ServiceError> {
        if request.percent <= Decimal::ZERO || request.percent > Decimal::ONE_HUNDRED {
            return Err(ServiceError::ValidationError(
                "percent must be greater than 0 and at most 100".into(),
            ));
        }
        if request.starts_at >= request.ends_at {
            return Err(ServiceError::ValidationError(
                "the validity window must start before it ends".into(),
            ));
        }

        // One discount per period: reject windows overlapping any active
        // discount that has not yet expired.
        let overlapping = discount::Entity::find()
            .filter(discount::Column::IsActive.eq(true))
            .filter(discount::Column::EndsAt.gt(Utc::now()))
            .filter(discount::Column::StartsAt.lt(request.ends_at))
            .filter(discount::Column::EndsAt.gt(request.starts_at))
            .count(&*self.db)
            .await?;
        if overlapping > 0 {
            return Err(ServiceError::PreconditionFailed(
                "a discount already covers part of that period".into(),
            ));
        }

        let created = discount::ActiveModel {
            percent: Set(request.percent),
            starts_at: Set(request.starts_at),
            ends_at: Set(request.ends_at),
            is_active: Set(true),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        info!(discount_id = created.id, "discount created");
        self.event_sender
            .emit(Event::DiscountCreated(created.id))
            .await;
        Ok(created.into())
    }

    /// Deactivates a discount. Orders that bound it while it was valid
    /// keep settling with its percentage.
    #[instrument(skip(self))]
    pub async fn end_discount(&self, discount_id: i32) -> Result<(), ServiceError> {
        let existing = discount::Entity::find_by_id(discount_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::InvalidReference(format!("Discount {} not found", discount_id))
            })?;

        if !existing.is_active {
            return Err(ServiceError::PreconditionFailed(
                "discount already ended".into(),
            ));
        }

        let mut active: discount::ActiveModel = existing.into();
        active.is_active = Set(false);
        active.update(&*self.db).await?;

        info!(discount_id, "discount ended");
        self.event_sender.emit(Event::DiscountEnded(discount_id)).await;
        Ok(())
    }

    /// Discounts currently inside their validity window.
    #[instrument(skip(self))]
    pub async fn list_active(&self) -> Result<Vec<DiscountView>, ServiceError> {
        let now = Utc::now();
        let discounts = discount::Entity::find()
            .filter(discount::Column::IsActive.eq(true))
            .filter(discount::Column::StartsAt.lte(now))
            .filter(discount::Column::EndsAt.gt(now))
            .order_by_asc(discount::Column::Id)
            .all(&*self.db)
            .await?;
        Ok(discounts.into_iter().map(Into::into).collect())
    }
}

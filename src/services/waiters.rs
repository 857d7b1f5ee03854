use std::sync::Arc;

use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use validator::Validate;

use crate::entities::waiter;
use crate::errors::ServiceError;

#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateWaiterRequest {
    #[validate(length(min = 1, max = 100, message = "name must be between 1 and 100 characters"))]
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaiterView {
    pub id: i32,
    pub name: String,
}

impl From<waiter::Model> for WaiterView {
    fn from(model: waiter::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
        }
    }
}

#[derive(Clone)]
pub struct WaiterService {
    db: Arc<DatabaseConnection>,
}

impl WaiterService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_waiter(
        &self,
        request: CreateWaiterRequest,
    ) -> Result<WaiterView, ServiceError> {
        request.validate()?;
        let created = waiter::ActiveModel {
            name: Set(request.name),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;
        info!(waiter_id = created.id, "waiter created");
        Ok(created.into())
    }

    #[instrument(skip(self))]
    pub async fn list_waiters(&self) -> Result<Vec<WaiterView>, ServiceError> {
        let waiters = waiter::Entity::find()
            .order_by_asc(waiter::Column::Id)
            .all(&*self.db)
            .await?;
        Ok(waiters.into_iter().map(Into::into).collect())
    }
}

use std::sync::Arc;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use validator::Validate;

use crate::entities::{dining_table, order, order::OrderStatus};
use crate::errors::ServiceError;

#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTableRequest {
    #[validate(range(min = 1, max = 64, message = "seats must be between 1 and 64"))]
    pub seats: i32,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableView {
    pub id: i32,
    pub is_free: bool,
    pub is_active: bool,
    pub seats: i32,
}

impl From<dining_table::Model> for TableView {
    fn from(model: dining_table::Model) -> Self {
        Self {
            id: model.id,
            is_free: model.is_free,
            is_active: model.is_active,
            seats: model.seats,
        }
    }
}

#[derive(Clone)]
pub struct TableService {
    db: Arc<DatabaseConnection>,
}

impl TableService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request))]
    pub async fn create_table(
        &self,
        request: CreateTableRequest,
    ) -> Result<TableView, ServiceError> {
        request.validate()?;
        let created = dining_table::ActiveModel {
            is_free: Set(true),
            is_active: Set(true),
            seats: Set(request.seats),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;
        info!(table_id = created.id, "table created");
        Ok(created.into())
    }

    #[instrument(skip(self))]
    pub async fn list_tables(&self) -> Result<Vec<TableView>, ServiceError> {
        let tables = dining_table::Entity::find()
            .order_by_asc(dining_table::Column::Id)
            .all(&*self.db)
            .await?;
        Ok(tables.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self))]
    pub async fn get_table(&self, table_id: i32) -> Result<TableView, ServiceError> {
        let table = self.load(table_id).await?;
        Ok(table.into())
    }

    /// Takes a table out of service. Refused while the table is
    /// occupied: its open order must settle or cancel first.
    #[instrument(skip(self))]
    pub async fn set_active(&self, table_id: i32, active: bool) -> Result<TableView, ServiceError> {
        let table = self.load(table_id).await?;

        if !active {
            let open_orders = order::Entity::find()
                .filter(order::Column::TableId.eq(table_id))
                .filter(
                    order::Column::Status
                        .is_in([OrderStatus::Created, OrderStatus::Confirmed]),
                )
                .one(&*self.db)
                .await?;
            if open_orders.is_some() || !table.is_free {
                return Err(ServiceError::PreconditionFailed(
                    "table has an open order and cannot be deactivated".into(),
                ));
            }
        }

        let mut active_model: dining_table::ActiveModel = table.into();
        active_model.is_active = Set(active);
        let updated = active_model.update(&*self.db).await?;
        info!(table_id, active, "table activity changed");
        Ok(updated.into())
    }

    async fn load(&self, table_id: i32) -> Result<dining_table::Model, ServiceError> {
        dining_table::Entity::find_by_id(table_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::InvalidReference(format!("Table {} not found", table_id)))
    }
}

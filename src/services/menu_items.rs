use std::sync::Arc;

use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use validator::Validate;

use crate::entities::{category, menu_item};
use crate::errors::ServiceError;

#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateMenuItemRequest {
    #[validate(length(min = 1, max = 100, message = "name must be between 1 and 100 characters"))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    #[validate(range(min = 0, max = 240, message = "prep time must be between 0 and 240 minutes"))]
    pub prep_time_minutes: i32,
    pub category_id: i32,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMenuItemRequest {
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub prep_time_minutes: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItemView {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub prep_time_minutes: i32,
    pub is_active: bool,
    pub category_id: i32,
}

impl From<menu_item::Model> for MenuItemView {
    fn from(model: menu_item::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            price: model.price,
            prep_time_minutes: model.prep_time_minutes,
            is_active: model.is_active,
            category_id: model.category_id,
        }
    }
}

#[derive(Clone)]
pub struct MenuItemService {
    db: Arc<DatabaseConnection>,
}

impl MenuItemService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(name = %request.name, category_id = request.category_id))]
    pub async fn create_menu_item(
        &self,
        request: CreateMenuItemRequest,
    ) -> Result<MenuItemView, ServiceError> {
        request.validate()?;
        if request.price <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "price must be greater than zero".into(),
            ));
        }

        let parent = category::Entity::find_by_id(request.category_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::InvalidReference(format!(
                    "Category {} not found",
                    request.category_id
                ))
            })?;
        if !parent.is_active {
            return Err(ServiceError::PreconditionFailed(
                "Category is not active".into(),
            ));
        }

        let created = menu_item::ActiveModel {
            name: Set(request.name),
            description: Set(request.description),
            price: Set(request.price),
            prep_time_minutes: Set(request.prep_time_minutes),
            is_active: Set(true),
            category_id: Set(request.category_id),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        info!(menu_item_id = created.id, "menu item created");
        Ok(created.into())
    }

    #[instrument(skip(self))]
    pub async fn list_menu_items(
        &self,
        category_id: Option<i32>,
        active_only: bool,
    ) -> Result<Vec<MenuItemView>, ServiceError> {
        let mut query = menu_item::Entity::find();
        if let Some(category_id) = category_id {
            query = query.filter(menu_item::Column::CategoryId.eq(category_id));
        }
        if active_only {
            query = query.filter(menu_item::Column::IsActive.eq(true));
        }
        let items = query
            .order_by_asc(menu_item::Column::Id)
            .all(&*self.db)
            .await?;
        Ok(items.into_iter().map(Into::into).collect())
    }

    /// Updates the live menu entry. Captured prices on existing order
    /// lines are snapshots and stay untouched.
    #[instrument(skip(self, request))]
    pub async fn update_menu_item(
        &self,
        menu_item_id: i32,
        request: UpdateMenuItemRequest,
    ) -> Result<MenuItemView, ServiceError> {
        if let Some(price) = request.price {
            if price <= Decimal::ZERO {
                return Err(ServiceError::ValidationError(
                    "price must be greater than zero".into(),
                ));
            }
        }
        if let Some(prep) = request.prep_time_minutes {
            if !(0..=240).contains(&prep) {
                return Err(ServiceError::ValidationError(
                    "prep time must be between 0 and 240 minutes".into(),
                ));
            }
        }

        let existing = self.load(menu_item_id).await?;
        let mut active: menu_item::ActiveModel = existing.into();
        if let Some(description) = request.description {
            active.description = Set(description);
        }
        if let Some(price) = request.price {
            active.price = Set(price);
        }
        if let Some(prep) = request.prep_time_minutes {
            active.prep_time_minutes = Set(prep);
        }
        let updated = active.update(&*self.db).await?;
        info!(menu_item_id, "menu item updated");
        Ok(updated.into())
    }

    #[instrument(skip(self))]
    pub async fn set_active(
        &self,
        menu_item_id: i32,
        active: bool,
    ) -> Result<MenuItemView, ServiceError> {
        let existing = self.load(menu_item_id).await?;
        let mut model: menu_item::ActiveModel = existing.into();
        model.is_active = Set(active);
        let updated = model.update(&*self.db).await?;
        info!(menu_item_id, active, "menu item activity changed");
        Ok(updated.into())
    }

    async fn load(&self, menu_item_id: i32) -> Result<menu_item::Model, ServiceError> {
        menu_item::Entity::find_by_id(menu_item_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::InvalidReference(format!("MenuItem {} not found", menu_item_id))
            })
    }
}

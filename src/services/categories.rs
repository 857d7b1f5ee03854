use std::sync::Arc;

use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use validator::Validate;

use crate::entities::category;
use crate::errors::ServiceError;

#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryRequest {
    #[validate(length(min = 1, max = 100, message = "name must be between 1 and 100 characters"))]
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryView {
    pub id: i32,
    pub name: String,
    pub is_active: bool,
}

impl From<category::Model> for CategoryView {
    fn from(model: category::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            is_active: model.is_active,
        }
    }
}

#[derive(Clone)]
pub struct CategoryService {
    db: Arc<DatabaseConnection>,
}

impl CategoryService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_category(
        &self,
        request: CreateCategoryRequest,
    ) -> Result<CategoryView, ServiceError> {
        request.validate()?;
        let created = category::ActiveModel {
            name: Set(request.name),
            is_active: Set(true),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;
        info!(category_id = created.id, "category created");
        Ok(created.into())
    }

    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<CategoryView>, ServiceError> {
        let categories = category::Entity::find()
            .order_by_asc(category::Column::Id)
            .all(&*self.db)
            .await?;
        Ok(categories.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self))]
    pub async fn rename_category(
        &self,
        category_id: i32,
        name: String,
    ) -> Result<CategoryView, ServiceError> {
        if name.is_empty() || name.len() > 100 {
            return Err(ServiceError::ValidationError(
                "name must be between 1 and 100 characters".into(),
            ));
        }
        let existing = self.load(category_id).await?;
        let mut active: category::ActiveModel = existing.into();
        active.name = Set(name);
        let updated = active.update(&*self.db).await?;
        Ok(updated.into())
    }

    #[instrument(skip(self))]
    pub async fn set_active(
        &self,
        category_id: i32,
        active: bool,
    ) -> Result<CategoryView, ServiceError> {
        let existing = self.load(category_id).await?;
        let mut model: category::ActiveModel = existing.into();
        model.is_active = Set(active);
        let updated = model.update(&*self.db).await?;
        info!(category_id, active, "category activity changed");
        Ok(updated.into())
    }

    async fn load(&self, category_id: i32) -> Result<category::Model, ServiceError> {
        category::Entity::find_by_id(category_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::InvalidReference(format!("Category {} not found", category_id))
            })
    }
}

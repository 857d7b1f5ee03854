use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A percentage discount with a validity window. Orders bind a discount
/// id at creation; the percentage is read from this row again at
/// payment, so deactivating a discount does not detach it from orders
/// created while it was valid.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "discounts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub percent: Decimal,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub is_active: bool,
}

impl Model {
    /// Whether the validity window contains the given instant.
    pub fn is_valid_at(&self, at: DateTime<Utc>) -> bool {
        self.is_active && self.starts_at <= at && at < self.ends_at
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::order::Entity")]
    Order,
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Order.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn discount(active: bool) -> Model {
        Model {
            id: 1,
            percent: dec!(10),
            starts_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            ends_at: Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap(),
            is_active: active,
        }
    }

    #[test]
    fn valid_inside_window() {
        let at = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();
        assert!(discount(true).is_valid_at(at));
        assert!(!discount(false).is_valid_at(at));
    }

    #[test]
    fn invalid_outside_window() {
        let before = Utc.with_ymd_and_hms(2023, 12, 31, 23, 59, 59).unwrap();
        let at_end = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        assert!(!discount(true).is_valid_at(before));
        assert!(!discount(true).is_valid_at(at_end));
    }
}

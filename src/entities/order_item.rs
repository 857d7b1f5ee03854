use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "order_items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub order_id: i32,
    pub menu_item_id: i32,
    pub quantity: i32,
    /// Price captured from the menu item at the moment the line was
    /// added; later menu price changes never touch it.
    pub unit_price: Decimal,
    pub notes: String,
    pub status: OrderItemStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Model {
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Item lifecycle states. Served and Cancelled are terminal; Cancelled
/// is reachable only through order cancellation or the forced
/// cancellation of untouched items at payment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum OrderItemStatus {
    #[sea_orm(string_value = "new")]
    New,
    #[sea_orm(string_value = "started")]
    Started,
    #[sea_orm(string_value = "ready")]
    Ready,
    #[sea_orm(string_value = "served")]
    Served,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl OrderItemStatus {
    /// Transition table for the item state machine. New -> Ready is the
    /// zero-prep-time fast path that bypasses the kitchen queue.
    pub fn can_transition_to(self, next: OrderItemStatus) -> bool {
        use OrderItemStatus::*;
        matches!(
            (self, next),
            (New, Started)
                | (New, Ready)
                | (New, Cancelled)
                | (Started, Ready)
                | (Started, Cancelled)
                | (Ready, Served)
                | (Ready, Cancelled)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, OrderItemStatus::Served | OrderItemStatus::Cancelled)
    }

    /// Whether the item currently sits with the kitchen.
    pub fn in_preparation(self) -> bool {
        matches!(self, OrderItemStatus::Started)
    }
}

impl std::fmt::Display for OrderItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OrderItemStatus::New => "New",
            OrderItemStatus::Started => "Started",
            OrderItemStatus::Ready => "Ready",
            OrderItemStatus::Served => "Served",
            OrderItemStatus::Cancelled => "Cancelled",
        };
        f.write_str(s)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::order::Entity",
        from = "Column::OrderId",
        to = "super::order::Column::Id"
    )]
    Order,
    #[sea_orm(
        belongs_to = "super::menu_item::Entity",
        from = "Column::MenuItemId",
        to = "super::menu_item::Column::Id"
    )]
    MenuItem,
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Order.def()
    }
}

impl Related<super::menu_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MenuItem.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {}

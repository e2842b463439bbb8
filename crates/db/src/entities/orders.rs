//! `SeaORM` Entity for orders table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use orderdesk_core::order::{LineItemError, OrderItems, OrderStatus, PaymentStatus, StatusParseError};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    /// Dated order number, e.g. `2025010007`.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Encoded line-item envelope.
    #[sea_orm(column_type = "Text")]
    pub order_items: String,
    pub customer_id: Uuid,
    pub order_date: DateTime,
    pub order_update_date: DateTime,
    pub order_status: String,
    pub payment_status: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
    pub total_price: Decimal,
    pub is_valid: bool,
}

impl Model {
    /// Decodes the stored line items.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored text is not a valid line-item mapping.
    pub fn items(&self) -> Result<OrderItems, LineItemError> {
        OrderItems::decode(&self.order_items)
    }

    /// Parses the stored order status.
    ///
    /// # Errors
    ///
    /// Returns an error if the column holds an unknown status.
    pub fn status(&self) -> Result<OrderStatus, StatusParseError> {
        self.order_status.parse()
    }

    /// Parses the stored payment status.
    ///
    /// # Errors
    ///
    /// Returns an error if the column holds an unknown status.
    pub fn payment(&self) -> Result<PaymentStatus, StatusParseError> {
        self.payment_status.parse()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::customers::Entity",
        from = "Column::CustomerId",
        to = "super::customers::Column::Id"
    )]
    Customers,
}

impl Related<super::customers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Customers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
